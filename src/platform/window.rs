//! Window action executor
//!
//! Applies a `WindowAction` to whatever window is in the foreground at the
//! moment of the call. Geometric placements are computed against the work
//! area and compensated for the invisible resize border so the visible edge
//! lands on the target.
//!
//! Failures are logged and swallowed per action: a failed placement leaves
//! the window where it was.

use std::ffi::c_void;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};
use windows::Win32::Foundation::{HWND, RECT};
use windows::Win32::Graphics::Dwm::{DWMWA_EXTENDED_FRAME_BOUNDS, DwmGetWindowAttribute};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    INPUT, INPUT_0, INPUT_KEYBOARD, KEYBD_EVENT_FLAGS, KEYBDINPUT, KEYEVENTF_KEYUP, SendInput,
    VIRTUAL_KEY, VK_LWIN,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, GetWindowRect, IsIconic, IsZoomed, SHOW_WINDOW_CMD, SW_MAXIMIZE,
    SW_MINIMIZE, SW_RESTORE, SWP_NOACTIVATE, SWP_NOZORDER, SetWindowPos, ShowWindow,
};

use crate::app::orchestrator::ActionExecutor;
use crate::domain::action::{Placement, WindowAction};
use crate::domain::core::{FrameOffset, Rect};
use crate::platform::monitors::{self, MonitorError};
use crate::platform::rect;

/// Time the OS needs to report restored bounds after `SW_RESTORE`
const RESTORE_SETTLE: Duration = Duration::from_millis(50);

const VK_D: VIRTUAL_KEY = VIRTUAL_KEY(0x44);

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("{call} failed (native error {code:#010x})")]
    NativeCall { call: &'static str, code: i32 },
    #[error("Work area unavailable: {0}")]
    WorkArea(#[from] MonitorError),
    #[error("SendInput injected {sent} of {expected} key events")]
    InputBlocked { sent: u32, expected: u32 },
}

impl ActionError {
    fn native(call: &'static str) -> impl FnOnce(windows::core::Error) -> ActionError {
        move |err| ActionError::NativeCall {
            call,
            code: err.code().0,
        }
    }
}

/// Current foreground window, or `None` when nothing is focused
pub fn foreground_window() -> Option<HWND> {
    let hwnd = unsafe { GetForegroundWindow() };
    (hwnd.0 != 0).then_some(hwnd)
}

/// Applies `action` to `hwnd`
pub fn apply(hwnd: HWND, action: WindowAction) -> Result<(), ActionError> {
    match action {
        WindowAction::Maximize => set_show_state(hwnd, SW_MAXIMIZE),
        WindowAction::Minimize => set_show_state(hwnd, SW_MINIMIZE),
        WindowAction::BackToDesktop => show_desktop(),
        _ => match action.placement() {
            Some(placement) => place(hwnd, placement).map(|_| ()),
            None => Ok(()),
        },
    }
}

fn set_show_state(hwnd: HWND, command: SHOW_WINDOW_CMD) -> Result<(), ActionError> {
    // The return value is the previous visibility, not a failure indicator
    unsafe {
        let _ = ShowWindow(hwnd, command);
    }
    Ok(())
}

/// Sends the Win+D chord, which toggles the desktop like the taskbar does
pub fn show_desktop() -> Result<(), ActionError> {
    let inputs = [
        key_input(VK_LWIN, KEYBD_EVENT_FLAGS(0)),
        key_input(VK_D, KEYBD_EVENT_FLAGS(0)),
        key_input(VK_D, KEYEVENTF_KEYUP),
        key_input(VK_LWIN, KEYEVENTF_KEYUP),
    ];

    let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent as usize != inputs.len() {
        return Err(ActionError::InputBlocked {
            sent,
            expected: inputs.len() as u32,
        });
    }
    Ok(())
}

fn key_input(vk: VIRTUAL_KEY, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: vk,
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

/// Reported window rectangle, including the invisible resize border
pub fn window_rect(hwnd: HWND) -> Result<Rect, ActionError> {
    let mut bounds = RECT::default();
    unsafe { GetWindowRect(hwnd, &mut bounds) }.map_err(ActionError::native("GetWindowRect"))?;
    Ok(rect::from_win32(&bounds))
}

/// Rectangle the compositor actually draws
pub fn visible_frame(hwnd: HWND) -> Result<Rect, ActionError> {
    let mut bounds = RECT::default();
    unsafe {
        DwmGetWindowAttribute(
            hwnd,
            DWMWA_EXTENDED_FRAME_BOUNDS,
            &mut bounds as *mut RECT as *mut c_void,
            std::mem::size_of::<RECT>() as u32,
        )
    }
    .map_err(ActionError::native("DwmGetWindowAttribute"))?;
    Ok(rect::from_win32(&bounds))
}

/// Invisible border of `hwnd`, measured fresh on every call
///
/// Falls back to no compensation when the compositor cannot be queried.
pub fn frame_offset(hwnd: HWND) -> FrameOffset {
    let measured = window_rect(hwnd)
        .and_then(|reported| visible_frame(hwnd).map(|visible| (reported, visible)));

    match measured {
        Ok((reported, visible)) => FrameOffset::between(reported, visible),
        Err(err) => {
            debug!(%err, "Frame bounds unavailable, placing without compensation");
            FrameOffset::ZERO
        }
    }
}

/// Un-maximizes or un-minimizes so the window reports its normal bounds
fn restore_if_needed(hwnd: HWND) {
    let needs_restore = unsafe { IsZoomed(hwnd).as_bool() || IsIconic(hwnd).as_bool() };
    if needs_restore {
        unsafe {
            let _ = ShowWindow(hwnd, SW_RESTORE);
        }
        thread::sleep(RESTORE_SETTLE);
    }
}

/// Moves `hwnd` so its visible frame covers `placement` of its work area
///
/// Returns the rectangle passed to `SetWindowPos`.
pub fn place(hwnd: HWND, placement: Placement) -> Result<Rect, ActionError> {
    restore_if_needed(hwnd);

    let work_area = match monitors::work_area_for_window(hwnd) {
        Ok(area) => area,
        Err(err) => {
            debug!(%err, "Falling back to the primary work area");
            monitors::primary_work_area()?
        }
    };

    let target = placement.target_rect(work_area);
    let bounds = frame_offset(hwnd).expand(target);

    unsafe {
        SetWindowPos(
            hwnd,
            HWND(0),
            bounds.x,
            bounds.y,
            bounds.w,
            bounds.h,
            SWP_NOZORDER | SWP_NOACTIVATE,
        )
    }
    .map_err(ActionError::native("SetWindowPos"))?;

    Ok(bounds)
}

/// Executor used by the orchestrator on the UI thread
#[derive(Debug, Default)]
pub struct WindowActionExecutor;

impl ActionExecutor for WindowActionExecutor {
    fn execute(&mut self, action: WindowAction) {
        let Some(hwnd) = foreground_window() else {
            debug!(%action, "No foreground window, action skipped");
            return;
        };

        match apply(hwnd, action) {
            Ok(()) => info!(%action, hwnd = hwnd.0, "Window action applied"),
            Err(err) => warn!(%action, hwnd = hwnd.0, %err, "Window action failed"),
        }
    }
}
