//! Thread timers
//!
//! Win32 timers created without a window post `WM_TIMER` to the queue of the
//! thread that created them. The owning message loop routes them by id.

use std::time::Duration;

use tracing::warn;
use windows::Win32::UI::WindowsAndMessaging::{KillTimer, SetTimer};

use crate::input::mouse::{PressTimer, TimerSource};

/// Periodic thread timer, killed on drop
///
/// Must be created and dropped on the thread that runs the message loop.
#[derive(Debug)]
pub struct ThreadTimer {
    id: usize,
}

impl ThreadTimer {
    /// Starts a timer on the calling thread, or `None` if the OS refused
    pub fn start(period: Duration) -> Option<Self> {
        let millis = u32::try_from(period.as_millis()).unwrap_or(u32::MAX);
        let id = unsafe { SetTimer(None, 0, millis, None) };
        if id == 0 {
            return None;
        }
        Some(Self { id })
    }

    pub fn id(&self) -> usize {
        self.id
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        if let Err(err) = unsafe { KillTimer(None, self.id) } {
            warn!(timer_id = self.id, code = err.code().0, "KillTimer failed");
        }
    }
}

impl PressTimer for ThreadTimer {
    fn id(&self) -> usize {
        self.id
    }
}

/// Arms per-press timers on the hook thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadTimers;

impl TimerSource for ThreadTimers {
    type Timer = ThreadTimer;

    fn arm(&mut self, delay: Duration) -> Option<ThreadTimer> {
        ThreadTimer::start(delay)
    }
}
