//! Global input monitors
//!
//! Each monitor runs a system-wide low-level hook on its own thread and turns
//! raw edges into semantic gesture events for the UI thread.

pub mod events;
pub mod hook;
pub mod keyboard;
pub mod mouse;

pub use events::{AppEvent, EventSender, KeyboardEvent, MouseEvent, PanelId};
pub use hook::{HookError, HookKind};
pub use keyboard::{DoubleTapDetector, KeyboardHookHandler};
pub use mouse::{MouseGestureTracker, MouseHookHandler, PressTimer, TimerSource};

#[cfg(windows)]
pub use keyboard::KeyboardMonitor;
#[cfg(windows)]
pub use mouse::MouseMonitor;
