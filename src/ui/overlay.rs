//! Layered overlay windows
//!
//! Transparent, topmost, click-through popups that never take focus. The
//! content is rendered with tiny-skia and pushed to the window with
//! `UpdateLayeredWindow`, so no `WM_PAINT` handling is needed.

use std::ffi::c_void;

use tracing::{debug, warn};
use windows::Win32::Foundation::{
    COLORREF, ERROR_CLASS_ALREADY_EXISTS, HWND, LPARAM, LRESULT, POINT, SIZE, WPARAM,
};
use windows::Win32::Graphics::Gdi::{
    AC_SRC_ALPHA, AC_SRC_OVER, BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BLENDFUNCTION,
    CreateCompatibleDC, CreateDIBSection, DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDC, HGDIOBJ,
    ReleaseDC, SelectObject,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, RegisterClassW, SW_HIDE, SW_SHOWNOACTIVATE,
    ShowWindow, ULW_ALPHA, UpdateLayeredWindow, WNDCLASSW, WNDPROC, WS_EX_LAYERED,
    WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_EX_TRANSPARENT, WS_POPUP,
};
use windows::core::{PCWSTR, w};

use crate::domain::core::Point;
use crate::domain::radial::{MenuShape, SectorIndex};
use crate::ui::renderer::{RadialLayout, RadialRenderer, to_bgra};
use crate::ui::{MenuOverlay, MenuPresenter, OverlayError};

const MENU_CLASS: PCWSTR = w!("RadialSnapMenuWindow");

unsafe extern "system" fn passive_window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}

/// Registers `class_name`; an existing registration is reused
pub(crate) fn register_window_class(class_name: PCWSTR, proc: WNDPROC) -> Result<(), OverlayError> {
    let hinstance = unsafe { GetModuleHandleW(PCWSTR::null()) }
        .map_err(|err| OverlayError::WindowClassRegistrationFailed(err.code().0))?;

    let wc = WNDCLASSW {
        lpfnWndProc: proc,
        hInstance: hinstance.into(),
        lpszClassName: class_name,
        ..Default::default()
    };

    if unsafe { RegisterClassW(&wc) } == 0 {
        let err = windows::core::Error::from_win32();
        if err.code() != ERROR_CLASS_ALREADY_EXISTS.to_hresult() {
            return Err(OverlayError::WindowClassRegistrationFailed(err.code().0));
        }
    }

    Ok(())
}

/// Owned layered popup; destroyed on drop
#[derive(Debug)]
pub(crate) struct LayeredWindow {
    hwnd: HWND,
}

impl LayeredWindow {
    pub(crate) fn create(class_name: PCWSTR) -> Result<Self, OverlayError> {
        let hinstance = unsafe { GetModuleHandleW(PCWSTR::null()) }
            .map_err(|err| OverlayError::WindowCreationFailed(err.code().0))?;

        let hwnd = unsafe {
            CreateWindowExW(
                WS_EX_LAYERED
                    | WS_EX_TOPMOST
                    | WS_EX_NOACTIVATE
                    | WS_EX_TOOLWINDOW
                    | WS_EX_TRANSPARENT,
                class_name,
                w!("radial-snap overlay"),
                WS_POPUP,
                0,
                0,
                0,
                0,
                None,
                None,
                hinstance,
                None,
            )
        };

        if hwnd.0 == 0 {
            return Err(OverlayError::WindowCreationFailed(
                windows::core::Error::from_win32().code().0,
            ));
        }

        Ok(Self { hwnd })
    }

    pub(crate) fn hwnd(&self) -> HWND {
        self.hwnd
    }

    /// Copies `pixmap` to the window surface with its top-left at `origin`
    pub(crate) fn present(
        &self,
        pixmap: &tiny_skia::Pixmap,
        origin: Point,
        alpha: u8,
    ) -> Result<(), OverlayError> {
        let width = pixmap.width() as i32;
        let height = pixmap.height() as i32;
        let pixels = to_bgra(pixmap);

        unsafe {
            let screen_dc = GetDC(HWND(0));
            if screen_dc.0 == 0 {
                return Err(OverlayError::DeviceContextFailed);
            }

            let memory_dc = CreateCompatibleDC(screen_dc);
            if memory_dc.0 == 0 {
                ReleaseDC(HWND(0), screen_dc);
                return Err(OverlayError::MemoryDeviceContextFailed);
            }

            let bitmap_info = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width,
                    // Top-down rows, same order as the pixmap
                    biHeight: -height,
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };

            let mut pixel_ptr: *mut c_void = std::ptr::null_mut();
            let section = CreateDIBSection(
                memory_dc,
                &bitmap_info,
                DIB_RGB_COLORS,
                &mut pixel_ptr,
                None,
                0,
            );
            let dib = match section {
                Ok(bitmap) if !pixel_ptr.is_null() => bitmap,
                Ok(bitmap) => {
                    let _ = DeleteObject(HGDIOBJ::from(bitmap));
                    let _ = DeleteDC(memory_dc);
                    ReleaseDC(HWND(0), screen_dc);
                    return Err(OverlayError::DibSectionCreationFailed);
                }
                Err(_) => {
                    let _ = DeleteDC(memory_dc);
                    ReleaseDC(HWND(0), screen_dc);
                    return Err(OverlayError::DibSectionCreationFailed);
                }
            };
            let dib_object: HGDIOBJ = dib.into();

            std::slice::from_raw_parts_mut(pixel_ptr as *mut u8, pixels.len())
                .copy_from_slice(&pixels);

            let old_bitmap = SelectObject(memory_dc, dib_object);

            let size = SIZE { cx: width, cy: height };
            let dst_point = POINT {
                x: origin.x,
                y: origin.y,
            };
            let src_point = POINT { x: 0, y: 0 };
            let blend = blend_function(alpha);

            let result = UpdateLayeredWindow(
                self.hwnd,
                screen_dc,
                Some(&dst_point),
                Some(&size),
                memory_dc,
                Some(&src_point),
                COLORREF(0),
                Some(&blend),
                ULW_ALPHA,
            );

            SelectObject(memory_dc, old_bitmap);
            let _ = DeleteObject(dib_object);
            let _ = DeleteDC(memory_dc);
            ReleaseDC(HWND(0), screen_dc);

            result.map_err(|err| OverlayError::LayerUpdateFailed(err.code().0))
        }
    }

    pub(crate) fn show(&self) {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_SHOWNOACTIVATE);
        }
    }

    pub(crate) fn hide(&self) {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_HIDE);
        }
    }
}

impl Drop for LayeredWindow {
    fn drop(&mut self) {
        if let Err(err) = unsafe { DestroyWindow(self.hwnd) } {
            debug!(%err, "Overlay window already gone");
        }
    }
}

fn blend_function(alpha: u8) -> BLENDFUNCTION {
    BLENDFUNCTION {
        BlendOp: AC_SRC_OVER as u8,
        BlendFlags: 0,
        SourceConstantAlpha: alpha,
        AlphaFormat: AC_SRC_ALPHA as u8,
    }
}

/// `UpdateLayeredWindow` without a source DC only moves and re-blends
pub(crate) fn reposition(hwnd: HWND, origin: Point, alpha: u8) -> Result<(), OverlayError> {
    let dst_point = POINT {
        x: origin.x,
        y: origin.y,
    };
    let blend = blend_function(alpha);
    unsafe {
        UpdateLayeredWindow(
            hwnd,
            None,
            Some(&dst_point),
            None,
            None,
            None,
            COLORREF(0),
            Some(&blend),
            ULW_ALPHA,
        )
    }
    .map_err(|err| OverlayError::LayerUpdateFailed(err.code().0))
}

/// Creates layered radial menus
#[derive(Debug, Default)]
pub struct LayeredMenuPresenter {
    renderer: RadialRenderer,
}

impl LayeredMenuPresenter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MenuPresenter for LayeredMenuPresenter {
    type Overlay = LayeredMenuOverlay;

    fn create(&mut self, shape: &MenuShape) -> Result<LayeredMenuOverlay, OverlayError> {
        register_window_class(MENU_CLASS, Some(passive_window_proc))?;
        let window = LayeredWindow::create(MENU_CLASS)?;

        // Drawn in the same physical pixels the selection geometry uses
        let layout = RadialLayout::from_shape(shape, 1.0);

        Ok(LayeredMenuOverlay {
            window: Some(window),
            layout,
            renderer: RadialRenderer::new(),
            origin: Point::default(),
        })
    }
}

/// One radial menu window
#[derive(Debug)]
pub struct LayeredMenuOverlay {
    window: Option<LayeredWindow>,
    layout: RadialLayout,
    renderer: RadialRenderer,
    origin: Point,
}

impl LayeredMenuOverlay {
    fn draw(&self, highlight: Option<SectorIndex>) -> Result<(), OverlayError> {
        let Some(window) = &self.window else {
            return Ok(());
        };
        let pixmap = self.renderer.render(&self.layout, highlight)?;
        window.present(&pixmap, self.origin, u8::MAX)
    }
}

impl MenuOverlay for LayeredMenuOverlay {
    fn show_at(&mut self, center: Point) -> Result<(), OverlayError> {
        let half = self.layout.center.round() as i32;
        self.origin = Point::new(center.x - half, center.y - half);

        self.draw(None)?;
        if let Some(window) = &self.window {
            window.show();
        }
        Ok(())
    }

    fn update_highlight(&mut self, sector: Option<SectorIndex>) {
        if let Err(err) = self.draw(sector) {
            warn!(%err, "Menu highlight not redrawn");
        }
    }

    fn close(&mut self) {
        if let Some(window) = self.window.take() {
            window.hide();
        }
    }
}
