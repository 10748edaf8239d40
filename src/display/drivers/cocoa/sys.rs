//! Raw Objective-C runtime and CoreGraphics bindings.
//!
//! Typed wrappers around `objc_msgSend`: the variadic symbol is transmuted to
//! the exact signature of each call site.
//!
//! # Safety
//!
//! Everything here is unsafe. Callers must pass live objects and the argument
//! types the selector expects.

#![allow(non_upper_case_globals)]

use std::ffi::c_void;

pub type Id = *mut c_void;
pub type Sel = *mut c_void;
pub type Class = *mut c_void;
pub type BOOL = i8;

pub type CFDataRef = *const c_void;
pub type CGDataProviderRef = *mut c_void;
pub type CGColorSpaceRef = *mut c_void;
pub type CGImageRef = *mut c_void;

pub const YES: BOOL = 1;
pub const NO: BOOL = 0;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CGPoint {
    pub x: f64,
    pub y: f64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CGSize {
    pub width: f64,
    pub height: f64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CGRect {
    pub origin: CGPoint,
    pub size: CGSize,
}

impl CGRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: CGPoint { x, y },
            size: CGSize { width, height },
        }
    }
}

// NSWindowStyleMask
pub const NS_WINDOW_STYLE_MASK_TITLED: u64 = 1 << 0;
pub const NS_WINDOW_STYLE_MASK_CLOSABLE: u64 = 1 << 1;
pub const NS_WINDOW_STYLE_MASK_MINIATURIZABLE: u64 = 1 << 2;
pub const NS_WINDOW_STYLE_MASK_RESIZABLE: u64 = 1 << 3;

// NSBackingStoreType
pub const NS_BACKING_STORE_BUFFERED: u64 = 2;

pub const NS_APPLICATION_ACTIVATION_POLICY_REGULAR: i64 = 0;

// NSTrackingAreaOptions
pub const NS_TRACKING_MOUSE_ENTERED_AND_EXITED: u64 = 0x01;
pub const NS_TRACKING_ACTIVE_ALWAYS: u64 = 0x80;
pub const NS_TRACKING_IN_VISIBLE_RECT: u64 = 0x200;

pub const NS_UTF8_STRING_ENCODING: u64 = 4;

/// `kCGImageAlphaPremultipliedLast` with the default (big-endian) byte order.
pub const K_CG_IMAGE_ALPHA_PREMULTIPLIED_LAST: u32 = 1;
pub const K_CG_RENDERING_INTENT_DEFAULT: i32 = 0;

#[link(name = "Cocoa", kind = "framework")]
extern "C" {
    pub fn objc_getClass(name: *const u8) -> Class;
    pub fn sel_registerName(name: *const u8) -> Sel;
    pub fn objc_msgSend(self_: Id, op: Sel, ...) -> Id;
    #[cfg(target_arch = "x86_64")]
    pub fn objc_msgSend_stret(self_: Id, op: Sel, ...);
    pub fn objc_autoreleasePoolPush() -> *mut c_void;
    pub fn objc_autoreleasePoolPop(pool: *mut c_void);
}

#[link(name = "Foundation", kind = "framework")]
extern "C" {
    pub static NSDefaultRunLoopMode: Id;
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    pub fn CFDataCreate(allocator: *const c_void, bytes: *const u8, length: isize) -> CFDataRef;
    pub fn CFRelease(cf: *const c_void);
}

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    pub fn CGDataProviderCreateWithCFData(data: CFDataRef) -> CGDataProviderRef;
    pub fn CGDataProviderRelease(provider: CGDataProviderRef);
    pub fn CGColorSpaceCreateDeviceRGB() -> CGColorSpaceRef;
    pub fn CGColorSpaceRelease(space: CGColorSpaceRef);
    pub fn CGImageCreate(
        width: usize,
        height: usize,
        bits_per_component: usize,
        bits_per_pixel: usize,
        bytes_per_row: usize,
        space: CGColorSpaceRef,
        bitmap_info: u32,
        provider: CGDataProviderRef,
        decode: *const f64,
        should_interpolate: bool,
        intent: i32,
    ) -> CGImageRef;
    pub fn CGImageRelease(image: CGImageRef);
}

/// Get a class by name. Use `b"ClassName\0"`.
#[inline(always)]
pub unsafe fn class(name: &[u8]) -> Class {
    objc_getClass(name.as_ptr())
}

/// Get a selector by name. Use `b"selectorName\0"`.
#[inline(always)]
pub unsafe fn sel(name: &[u8]) -> Sel {
    sel_registerName(name.as_ptr())
}

/// Message Send (0 args, return R)
#[inline(always)]
pub unsafe fn send<R>(obj: Id, sel: Sel) -> R {
    let fn_ptr: unsafe extern "C" fn(Id, Sel) -> R =
        std::mem::transmute(objc_msgSend as *const c_void);
    fn_ptr(obj, sel)
}

/// Message Send (1 arg)
#[inline(always)]
pub unsafe fn send_1<R, A>(obj: Id, sel: Sel, a: A) -> R {
    let fn_ptr: unsafe extern "C" fn(Id, Sel, A) -> R =
        std::mem::transmute(objc_msgSend as *const c_void);
    fn_ptr(obj, sel, a)
}

/// Message Send (3 args)
#[inline(always)]
pub unsafe fn send_3<R, A, B, C>(obj: Id, sel: Sel, a: A, b: B, c: C) -> R {
    let fn_ptr: unsafe extern "C" fn(Id, Sel, A, B, C) -> R =
        std::mem::transmute(objc_msgSend as *const c_void);
    fn_ptr(obj, sel, a, b, c)
}

/// Message Send (4 args)
#[inline(always)]
pub unsafe fn send_4<R, A, B, C, D>(obj: Id, sel: Sel, a: A, b: B, c: C, d: D) -> R {
    let fn_ptr: unsafe extern "C" fn(Id, Sel, A, B, C, D) -> R =
        std::mem::transmute(objc_msgSend as *const c_void);
    fn_ptr(obj, sel, a, b, c, d)
}

/// Message Send returning a `CGRect`.
///
/// x86_64 returns structs larger than 16 bytes through memory.
#[inline(always)]
pub unsafe fn send_rect(obj: Id, sel: Sel) -> CGRect {
    #[cfg(target_arch = "x86_64")]
    let fn_ptr: unsafe extern "C" fn(Id, Sel) -> CGRect =
        std::mem::transmute(objc_msgSend_stret as *const c_void);
    #[cfg(not(target_arch = "x86_64"))]
    let fn_ptr: unsafe extern "C" fn(Id, Sel) -> CGRect =
        std::mem::transmute(objc_msgSend as *const c_void);
    fn_ptr(obj, sel)
}

/// A retained `NSString`. The caller releases it.
pub unsafe fn ns_string(text: &str) -> Id {
    let alloc: Id = send(class(b"NSString\0"), sel(b"alloc\0"));
    send_3(
        alloc,
        sel(b"initWithBytes:length:encoding:\0"),
        text.as_ptr(),
        text.len(),
        NS_UTF8_STRING_ENCODING,
    )
}

pub unsafe fn release(obj: Id) {
    if !obj.is_null() {
        send::<()>(obj, sel(b"release\0"));
    }
}

/// Pops an autorelease pool when dropped.
pub struct AutoreleasePool(*mut c_void);

impl AutoreleasePool {
    pub fn push() -> Self {
        // SAFETY: push and pop are paired by Drop on the same thread.
        Self(unsafe { objc_autoreleasePoolPush() })
    }
}

impl Drop for AutoreleasePool {
    fn drop(&mut self) {
        // SAFETY: the token came from objc_autoreleasePoolPush.
        unsafe { objc_autoreleasePoolPop(self.0) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_matches_the_64_bit_abi() {
        assert_eq!(std::mem::size_of::<CGSize>(), 16);
        assert_eq!(std::mem::size_of::<CGRect>(), 32);
        assert_eq!(std::mem::align_of::<CGRect>(), 8);
    }
}
