// build.rs

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Only the X11 driver links a native library at build time. Cocoa and
    // Win32 are reached through system frameworks/DLLs the toolchain knows.
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let target_family = std::env::var("CARGO_CFG_TARGET_FAMILY").unwrap_or_default();
    if target_family != "unix" || target_os == "macos" {
        return;
    }

    // pkg-config prints the link flags itself when it succeeds.
    if let Err(err) = pkg_config::probe_library("x11") {
        eprintln!(
            "pkg-config failed for library 'x11' ({}). Falling back to manual linking.",
            err
        );
        println!("cargo:rustc-link-lib=X11");
        println!("cargo:rustc-link-search=/usr/lib");
    }
}
