//! Work-area lookup
//!
//! Placements are computed against the work area (monitor minus taskbar and
//! other reserved bars) of the monitor hosting the target window.
//!
//! Secondary monitors can have negative coordinates; every rectangle here is
//! in virtual-screen pixels.

use std::ffi::c_void;

use thiserror::Error;
use windows::Win32::Foundation::{FALSE, HWND, RECT};
use windows::Win32::Graphics::Gdi::{
    GetMonitorInfoW, HMONITOR, MONITOR_DEFAULTTONEAREST, MONITORINFO, MonitorFromWindow,
};
use windows::Win32::UI::WindowsAndMessaging::{
    SPI_GETWORKAREA, SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS, SystemParametersInfoW,
};

use crate::domain::core::Rect;
use crate::platform::rect;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("No monitor found")]
    MonitorNotFound,
    #[error("Failed to get info for monitor {0:?}")]
    InfoFailed(HMONITOR),
    #[error("Failed to query the primary work area (native error {0:#010x})")]
    WorkAreaFailed(i32),
}

/// Work area of the monitor nearest to `hwnd`
pub fn work_area_for_window(hwnd: HWND) -> Result<Rect, MonitorError> {
    let monitor = unsafe { MonitorFromWindow(hwnd, MONITOR_DEFAULTTONEAREST) };
    work_area_of(monitor)
}

/// Work area of the primary monitor
pub fn primary_work_area() -> Result<Rect, MonitorError> {
    let mut area = RECT::default();
    unsafe {
        SystemParametersInfoW(
            SPI_GETWORKAREA,
            0,
            Some(&mut area as *mut RECT as *mut c_void),
            SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
        )
    }
    .map_err(|err| MonitorError::WorkAreaFailed(err.code().0))?;

    Ok(rect::from_win32(&area))
}

fn work_area_of(monitor: HMONITOR) -> Result<Rect, MonitorError> {
    if monitor.is_invalid() {
        return Err(MonitorError::MonitorNotFound);
    }

    let mut info = MONITORINFO {
        cbSize: std::mem::size_of::<MONITORINFO>() as u32,
        ..Default::default()
    };

    if unsafe { GetMonitorInfoW(monitor, &mut info) } == FALSE {
        return Err(MonitorError::InfoFailed(monitor));
    }

    Ok(rect::from_win32(&info.rcWork))
}
