// ── Win32 display driver ──────────────────────────────────────────────────────
//
// Responsibilities in this file (unsafe confined here):
//   • Register the window class once per process.
//   • Create the top-level window sized so its client area matches the request.
//   • Queue normalized events from the window procedure into per-window state.
//   • Stage frames as DIB sections and BitBlt them through a scoped memory DC.

use crate::config::WindowConfig;
use crate::convert::{ConvertedFrame, PixelLayout};
use crate::display::driver::{BlitRegion, DisplayDriver, WindowHandle};
use crate::display::events::{Event, EventMask};
use crate::display::normalize::win32::{messages, normalize, x_lparam, y_lparam};
use crate::error::{DisplayError, Result};
use log::{debug, info, trace, warn};
use std::ffi::c_void;
use std::sync::OnceLock;
use windows::{
    core::{w, HSTRING, PCWSTR},
    Win32::{
        Foundation::{
            GetLastError, COLORREF, FALSE, HANDLE, HINSTANCE, HWND, LPARAM, LRESULT, RECT,
            WPARAM,
        },
        Graphics::Gdi::{
            BeginPaint, BitBlt, CreateCompatibleDC, CreateDIBSection, CreateSolidBrush, DeleteDC,
            DeleteObject, EndPaint, FillRect, GetDC, ReleaseDC, SelectObject, BITMAPINFO,
            BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, HBITMAP, HBRUSH, HDC, HGDIOBJ, PAINTSTRUCT,
            SRCCOPY,
        },
        System::LibraryLoader::GetModuleHandleW,
        UI::{
            Input::KeyboardAndMouse::{TrackMouseEvent, TME_LEAVE, TRACKMOUSEEVENT},
            WindowsAndMessaging::{
                AdjustWindowRectEx, CreateWindowExW, DefWindowProcW, DestroyWindow,
                DispatchMessageW, GetClientRect, GetWindowLongPtrW, LoadCursorW, PeekMessageW,
                RegisterClassExW, SetWindowLongPtrW, ShowWindow, TranslateMessage, UpdateWindow,
                CREATESTRUCTW, CS_HREDRAW, CS_VREDRAW, GWLP_USERDATA, HMENU, IDC_ARROW, MSG,
                PM_REMOVE, SW_SHOW, WINDOW_EX_STYLE, WM_ERASEBKGND, WM_NCCREATE, WM_NCDESTROY,
                WNDCLASSEXW, WS_OVERLAPPEDWINDOW,
            },
        },
    },
};

const CLASS_NAME: PCWSTR = w!("RgbaViewWindow");

/// State the window procedure writes and the driver drains.
struct WindowShared {
    events: Vec<Event>,
    mask: EventMask,
    brush: HBRUSH,
    pointer: (i32, i32),
    tracking: bool,
}

impl WindowShared {
    fn push(&mut self, event: Event) {
        if self.mask.admits(&event) {
            self.events.push(event);
        }
    }
}

/// A DIB section holding one converted frame.
struct StagedBitmap {
    bitmap: HBITMAP,
}

impl Drop for StagedBitmap {
    fn drop(&mut self) {
        // SAFETY: the bitmap is not selected into any DC outside `present`.
        unsafe {
            let _ = DeleteObject(self.bitmap);
        }
    }
}

/// The window DC, released on every exit path.
struct WindowDc {
    hwnd: HWND,
    dc: HDC,
}

impl Drop for WindowDc {
    fn drop(&mut self) {
        // SAFETY: `dc` came from GetDC(hwnd).
        unsafe {
            ReleaseDC(self.hwnd, self.dc);
        }
    }
}

/// A memory DC with a bitmap selected, restored and deleted on drop.
struct MemoryDc {
    dc: HDC,
    previous: HGDIOBJ,
}

impl MemoryDc {
    fn select(target: HDC, bitmap: HBITMAP) -> Result<Self> {
        // SAFETY: `target` is a live DC; the bitmap outlives the guard.
        unsafe {
            let dc = CreateCompatibleDC(target);
            if dc.is_invalid() {
                return Err(last_error("CreateCompatibleDC"));
            }
            let previous = SelectObject(dc, bitmap);
            Ok(Self { dc, previous })
        }
    }
}

impl Drop for MemoryDc {
    fn drop(&mut self) {
        // SAFETY: restores the DC's original bitmap before deleting it.
        unsafe {
            SelectObject(self.dc, self.previous);
            let _ = DeleteDC(self.dc);
        }
    }
}

pub struct Win32DisplayDriver {
    hinstance: HINSTANCE,
    hwnd: HWND,
    shared: *mut WindowShared,
    background: [u8; 3],
    position: (i32, i32),
    staged: Option<StagedBitmap>,
}

impl DisplayDriver for Win32DisplayDriver {
    fn connect(config: &WindowConfig) -> Result<Self> {
        // SAFETY: GetModuleHandleW(None) returns the module of the running exe.
        let module = unsafe { GetModuleHandleW(None) }
            .map_err(|e| DisplayError::PlatformInit(format!("GetModuleHandleW: {}", e)))?;
        let hinstance = HINSTANCE(module.0);

        static REGISTERED: OnceLock<Result<()>> = OnceLock::new();
        REGISTERED
            .get_or_init(|| register_class(hinstance))
            .clone()
            .map_err(|e| DisplayError::PlatformInit(e.to_string()))?;
        info!("Win32DisplayDriver: window class ready");

        Ok(Self {
            hinstance,
            hwnd: HWND::default(),
            shared: std::ptr::null_mut(),
            background: config.background,
            position: (config.position_x, config.position_y),
            staged: None,
        })
    }

    fn layout(&self) -> PixelLayout {
        PixelLayout::WIN32_DIB
    }

    fn create_window(
        &mut self,
        title: &str,
        width: u32,
        height: u32,
        events: EventMask,
    ) -> Result<WindowHandle> {
        let [r, g, b] = self.background;
        // SAFETY: CreateSolidBrush has no preconditions.
        let brush =
            unsafe { CreateSolidBrush(COLORREF(r as u32 | (g as u32) << 8 | (b as u32) << 16)) };
        let shared = Box::into_raw(Box::new(WindowShared {
            events: Vec::new(),
            mask: events,
            brush,
            pointer: (0, 0),
            tracking: false,
        }));

        let mut rect = RECT {
            left: 0,
            top: 0,
            right: width as i32,
            bottom: height as i32,
        };
        // SAFETY: rect is a valid RECT; the style matches the window below.
        unsafe {
            if let Err(e) =
                AdjustWindowRectEx(&mut rect, WS_OVERLAPPEDWINDOW, FALSE, WINDOW_EX_STYLE(0))
            {
                warn!("AdjustWindowRectEx failed, using client size: {}", e);
            }
        }

        // SAFETY: CLASS_NAME is registered; `shared` reaches wnd_proc through
        // CREATESTRUCTW and stays allocated until destroy_window.
        let created = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                CLASS_NAME,
                &HSTRING::from(title),
                WS_OVERLAPPEDWINDOW,
                self.position.0,
                self.position.1,
                rect.right - rect.left,
                rect.bottom - rect.top,
                HWND::default(),
                HMENU::default(),
                self.hinstance,
                Some(shared as *const c_void),
            )
        };
        let hwnd = match created {
            Ok(hwnd) => hwnd,
            Err(e) => {
                // SAFETY: no window references `shared` or the brush.
                unsafe {
                    drop(Box::from_raw(shared));
                    let _ = DeleteObject(brush);
                }
                return Err(DisplayError::native("CreateWindowExW", e.message()));
            }
        };

        // SAFETY: hwnd was just created.
        unsafe {
            let _ = ShowWindow(hwnd, SW_SHOW);
            let _ = UpdateWindow(hwnd);
        }

        self.hwnd = hwnd;
        self.shared = shared;
        info!("Win32DisplayDriver: created window {:?}", hwnd);
        Ok(WindowHandle(hwnd.0 as u64))
    }

    fn drain_events(&mut self, out: &mut Vec<Event>) -> Result<()> {
        let mut msg = MSG::default();
        // SAFETY: msg is a valid MSG; dispatching runs wnd_proc on this thread.
        unsafe {
            while PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
        if !self.shared.is_null() {
            // SAFETY: wnd_proc is not running; nothing else borrows `shared`.
            let shared = unsafe { &mut *self.shared };
            out.append(&mut shared.events);
        }
        Ok(())
    }

    fn stage(&mut self, frame: ConvertedFrame) -> Result<()> {
        if frame.width == 0 || frame.height == 0 {
            self.staged = None;
            return Ok(());
        }
        let info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: frame.width as i32,
                biHeight: frame.layout.signed_height(frame.height),
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };

        let mut bits: *mut c_void = std::ptr::null_mut();
        // SAFETY: `info` describes a 32bpp DIB whose size equals frame.bytes.
        let bitmap = unsafe {
            CreateDIBSection(
                HDC::default(),
                &info,
                DIB_RGB_COLORS,
                &mut bits,
                HANDLE::default(),
                0,
            )
        }
        .map_err(|e| DisplayError::native("CreateDIBSection", e.message()))?;
        let staged = StagedBitmap { bitmap };
        if bits.is_null() {
            return Err(DisplayError::native("CreateDIBSection", "no pixel storage"));
        }
        // SAFETY: the section holds stride * height bytes, the length of frame.bytes.
        unsafe {
            std::ptr::copy_nonoverlapping(frame.bytes.as_ptr(), bits as *mut u8, frame.bytes.len());
        }
        self.staged = Some(staged);
        Ok(())
    }

    fn present(&mut self, region: BlitRegion) -> Result<()> {
        let staged = self
            .staged
            .as_ref()
            .ok_or_else(|| DisplayError::native("BitBlt", "no frame staged"))?;

        // SAFETY: hwnd is live; both guards release their DC on return.
        unsafe {
            let dc = GetDC(self.hwnd);
            if dc.is_invalid() {
                return Err(last_error("GetDC"));
            }
            let window = WindowDc { hwnd: self.hwnd, dc };
            let memory = MemoryDc::select(window.dc, staged.bitmap)?;
            BitBlt(
                window.dc,
                0,
                0,
                region.width as i32,
                region.height as i32,
                memory.dc,
                0,
                0,
                SRCCOPY,
            )
            .map_err(|e| DisplayError::native("BitBlt", e.message()))?;
        }
        trace!("Win32DisplayDriver: blitted {}x{}", region.width, region.height);
        Ok(())
    }

    fn destroy_window(&mut self) {
        if self.hwnd.is_invalid() {
            return;
        }
        self.staged = None;
        // SAFETY: DestroyWindow runs WM_NCDESTROY synchronously, which clears
        // GWLP_USERDATA before `shared` is freed.
        unsafe {
            if let Err(e) = DestroyWindow(self.hwnd) {
                warn!("DestroyWindow failed: {}", e);
            }
            if !self.shared.is_null() {
                let shared = Box::from_raw(self.shared);
                let _ = DeleteObject(shared.brush);
            }
        }
        self.shared = std::ptr::null_mut();
        self.hwnd = HWND::default();
        debug!("Win32DisplayDriver: window destroyed");
    }
}

impl Drop for Win32DisplayDriver {
    fn drop(&mut self) {
        self.destroy_window();
    }
}

fn register_class(hinstance: HINSTANCE) -> Result<()> {
    // SAFETY: IDC_ARROW is a built-in cursor resource.
    let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }
        .map_err(|e| DisplayError::native("LoadCursorW", e.message()))?;

    let wndclass = WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(wnd_proc),
        hInstance: hinstance,
        hCursor: cursor,
        // Erased per window with its own brush.
        hbrBackground: HBRUSH::default(),
        lpszClassName: CLASS_NAME,
        ..Default::default()
    };

    // SAFETY: wndclass is fully initialised; CLASS_NAME is a static literal.
    let atom = unsafe { RegisterClassExW(&wndclass) };
    if atom == 0 {
        return Err(last_error("RegisterClassExW"));
    }
    Ok(())
}

// SAFETY: registered as lpfnWndProc. GWLP_USERDATA holds either null or the
// WindowShared owned by the driver, which outlives the window.
unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if msg == WM_NCCREATE {
        let create = &*(lparam.0 as *const CREATESTRUCTW);
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, create.lpCreateParams as isize);
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    }
    if msg == WM_NCDESTROY {
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    }

    let shared = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut WindowShared;
    let Some(shared) = shared.as_mut() else {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    };

    match msg {
        messages::WM_PAINT => {
            let mut paint = PAINTSTRUCT::default();
            BeginPaint(hwnd, &mut paint);
            let _ = EndPaint(hwnd, &paint);
            shared.push(Event::Expose);
            LRESULT(0)
        }
        WM_ERASEBKGND => {
            let mut rect = RECT::default();
            if GetClientRect(hwnd, &mut rect).is_ok() {
                FillRect(HDC(wparam.0 as *mut c_void), &rect, shared.brush);
            }
            LRESULT(1)
        }
        // The window stays up until the backend tears it down.
        messages::WM_CLOSE => {
            shared.push(Event::Close);
            LRESULT(0)
        }
        messages::WM_MOUSEMOVE => {
            let position = (x_lparam(lparam.0), y_lparam(lparam.0));
            if !shared.tracking && shared.mask.contains(EventMask::POINTER_CROSSING) {
                let mut track = TRACKMOUSEEVENT {
                    cbSize: std::mem::size_of::<TRACKMOUSEEVENT>() as u32,
                    dwFlags: TME_LEAVE,
                    hwndTrack: hwnd,
                    dwHoverTime: 0,
                };
                if TrackMouseEvent(&mut track).is_ok() {
                    shared.tracking = true;
                    shared.push(Event::MouseEnter {
                        x: position.0,
                        y: position.1,
                    });
                }
            }
            shared.pointer = position;
            if let Some(event) = normalize(msg, wparam.0, lparam.0, shared.pointer) {
                shared.push(event);
            }
            LRESULT(0)
        }
        messages::WM_MOUSELEAVE => {
            shared.tracking = false;
            if let Some(event) = normalize(msg, wparam.0, lparam.0, shared.pointer) {
                shared.push(event);
            }
            LRESULT(0)
        }
        _ => {
            if let Some(event) = normalize(msg, wparam.0, lparam.0, shared.pointer) {
                shared.push(event);
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }
    }
}

/// Capture the current Win32 last-error code.
///
/// Call immediately after the failing function; any later API call may
/// overwrite the thread-local value.
fn last_error(function: &'static str) -> DisplayError {
    // SAFETY: GetLastError reads thread-local state and never fails.
    let code = unsafe { GetLastError() };
    DisplayError::native(function, format!("error code {}", code.0))
}
