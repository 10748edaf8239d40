//! Drives the real binary on an X11 host without a display.

#![cfg(target_os = "linux")]

use rexpect::process::wait::WaitStatus;
use rexpect::session::spawn_command;
use std::process::Command;

#[test]
fn missing_display_exits_non_zero_with_a_diagnostic() {
    let mut command = Command::new(env!("CARGO_BIN_EXE_rgba-view"));
    command
        .env_remove("DISPLAY")
        .env_remove("RGBA_VIEW_CONFIG")
        .env("RUST_LOG", "off");

    let mut session = spawn_command(command, Some(10_000)).unwrap();
    session.exp_string("cannot open X display").unwrap();

    match session.process.wait().unwrap() {
        WaitStatus::Exited(_, code) => assert_ne!(code, 0),
        other => panic!("unexpected exit: {:?}", other),
    }
}
