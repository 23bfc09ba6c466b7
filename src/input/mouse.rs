//! Global mouse monitor
//!
//! Turns raw middle-button edges into `Trigger` and `Release` events.
//! A press arms one single-shot timer; if the button is still down when it
//! fires, `Trigger` is emitted with the press position. Every release that
//! follows a recorded press emits exactly one `Release`.
//!
//! All state here is owned by the listener thread. The UI thread only sees
//! the events posted through the `EventSender`.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::SharedConfig;
use crate::domain::core::Point;
use crate::input::events::{EventSender, MouseEvent};

/// Handle of an armed single-shot timer; dropping it cancels the timer
pub trait PressTimer {
    fn id(&self) -> usize;
}

/// Something that can arm per-press timers on the listener thread
pub trait TimerSource {
    type Timer: PressTimer;

    /// Arms a timer that fires once after `delay`, or `None` if the
    /// platform refused
    fn arm(&mut self, delay: Duration) -> Option<Self::Timer>;
}

/// One press/hold cycle of the middle button
#[derive(Debug)]
struct GestureSession<T> {
    down_at: Instant,
    position: Point,
    triggered: bool,
    timer: Option<T>,
}

/// Edge detector for the middle button
pub struct MouseGestureTracker<S: TimerSource> {
    timers: S,
    session: Option<GestureSession<S::Timer>>,
}

impl<S: TimerSource> MouseGestureTracker<S> {
    pub fn new(timers: S) -> Self {
        Self {
            timers,
            session: None,
        }
    }

    /// Starts a session, replacing (and cancelling) any previous one
    pub fn button_down(&mut self, position: Point, now: Instant, delay: Duration) {
        if self.session.take().is_some() {
            debug!("Button down while a session was live, resetting");
        }

        let timer = self.timers.arm(delay);
        if timer.is_none() {
            warn!(delay_ms = delay.as_millis() as u64, "Could not arm trigger timer");
        }

        self.session = Some(GestureSession {
            down_at: now,
            position,
            triggered: false,
            timer,
        });
    }

    /// Handles a timer expiry; stale or foreign timer ids are ignored
    pub fn timer_elapsed(&mut self, timer_id: usize) -> Option<MouseEvent> {
        let session = self.session.as_mut()?;
        if session.timer.as_ref().map(PressTimer::id) != Some(timer_id) {
            return None;
        }

        // Single shot: dropping the handle cancels any repeat
        session.timer = None;
        session.triggered = true;
        Some(MouseEvent::Trigger(session.position))
    }

    /// Ends the session; a release without a recorded press is a no-op
    pub fn button_up(&mut self, now: Instant) -> Option<MouseEvent> {
        let session = self.session.take()?;
        debug!(
            held_ms = now.saturating_duration_since(session.down_at).as_millis() as u64,
            triggered = session.triggered,
            "Middle button released"
        );
        Some(MouseEvent::Release)
    }
}

/// Listener-thread side of the mouse monitor
pub struct MouseHookHandler<S: TimerSource> {
    tracker: MouseGestureTracker<S>,
    config: SharedConfig,
    sender: EventSender,
}

impl<S: TimerSource> MouseHookHandler<S> {
    pub fn new(timers: S, config: SharedConfig, sender: EventSender) -> Self {
        Self {
            tracker: MouseGestureTracker::new(timers),
            config,
            sender,
        }
    }

    pub fn on_button_down(&mut self, position: Point, now: Instant) {
        // Read per press so a changed delay applies to the next press only
        let delay = Duration::from_millis(u64::from(self.config.trigger_delay_ms()));
        debug!(x = position.x, y = position.y, "Middle button down");
        self.tracker.button_down(position, now, delay);
    }

    pub fn on_button_up(&mut self, now: Instant) {
        if let Some(event) = self.tracker.button_up(now) {
            self.post(event);
        }
    }

    pub fn on_timer(&mut self, timer_id: usize) {
        if let Some(event) = self.tracker.timer_elapsed(timer_id) {
            debug!("Hold threshold reached");
            self.post(event);
        }
    }

    fn post(&self, event: MouseEvent) {
        if !self.sender.post(event) {
            debug!(?event, "UI thread gone, dropping mouse event");
        }
    }
}

#[cfg(windows)]
pub use native::MouseMonitor;

#[cfg(windows)]
mod native {
    use std::ops::ControlFlow;
    use std::time::Instant;

    use tracing::info;
    use windows::Win32::Foundation::LPARAM;
    use windows::Win32::UI::WindowsAndMessaging::{MSLLHOOKSTRUCT, WM_MBUTTONDOWN, WM_MBUTTONUP};

    use super::MouseHookHandler;
    use crate::config::SharedConfig;
    use crate::domain::core::Point;
    use crate::input::events::EventSender;
    use crate::input::hook::{HookError, HookKind, HookThread, LowLevelHandler};
    use crate::platform::timer::ThreadTimers;

    impl LowLevelHandler for MouseHookHandler<ThreadTimers> {
        fn on_event(&mut self, message: u32, lparam: LPARAM) -> ControlFlow<()> {
            match message {
                WM_MBUTTONDOWN => {
                    // SAFETY: for WH_MOUSE_LL, lparam points at an MSLLHOOKSTRUCT
                    // that lives for the duration of the callback
                    let data = unsafe { &*(lparam.0 as *const MSLLHOOKSTRUCT) };
                    self.on_button_down(Point::new(data.pt.x, data.pt.y), Instant::now());
                }
                WM_MBUTTONUP => self.on_button_up(Instant::now()),
                _ => {}
            }
            ControlFlow::Continue(())
        }

        fn on_timer(&mut self, timer_id: usize) {
            MouseHookHandler::on_timer(self, timer_id);
        }
    }

    /// Middle-button monitor running on its own hook thread
    #[derive(Debug)]
    pub struct MouseMonitor {
        thread: HookThread,
    }

    impl MouseMonitor {
        /// Installs the low-level mouse hook; fails if the OS refuses it
        pub fn start(config: SharedConfig, sender: EventSender) -> Result<Self, HookError> {
            let thread = HookThread::spawn(HookKind::Mouse, move || {
                Box::new(MouseHookHandler::new(ThreadTimers, config, sender))
                    as Box<dyn LowLevelHandler>
            })?;
            info!("Mouse monitor started");
            Ok(Self { thread })
        }

        /// Idempotent; see `HookThread::stop`
        pub fn stop(&self) {
            self.thread.stop();
        }
    }
}
