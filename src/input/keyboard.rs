//! Global keyboard monitor
//!
//! Detects a double-tap of the configured trigger key and the down edge of
//! Escape. Keys are compared by scan code so left and right modifiers stay
//! distinct on every layout.
//!
//! Threading:
//! - The detector is owned by the listener thread
//! - Nothing here touches UI state; events are posted to the UI thread

use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::{DOUBLE_TAP_MIN_MS, SharedConfig, clamp_double_tap};
use crate::domain::keys::{KeySide, PhysicalKey, TriggerKey};
use crate::input::events::{EventSender, KeyboardEvent};

/// Double-tap and Escape edge detector
#[derive(Debug, Default)]
pub struct DoubleTapDetector {
    last_tap: Option<Instant>,
    /// Held state of the target, per physical side
    held: [bool; 2],
    escape_down: bool,
}

impl DoubleTapDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one key edge; `threshold_ms` is clamped before use
    pub fn on_key(
        &mut self,
        key: PhysicalKey,
        is_down: bool,
        target: TriggerKey,
        threshold_ms: u32,
        now: Instant,
    ) -> Option<KeyboardEvent> {
        if target.matches(key) {
            return if is_down {
                self.target_pressed(key, threshold_ms, now)
            } else {
                if let Some(side) = key.side() {
                    *self.held_mut(side) = false;
                }
                Some(KeyboardEvent::Released)
            };
        }

        if key == PhysicalKey::Escape {
            if !is_down {
                self.escape_down = false;
                return None;
            }
            if self.escape_down {
                return None;
            }
            self.escape_down = true;
            return Some(KeyboardEvent::EscapePressed);
        }

        None
    }

    fn target_pressed(
        &mut self,
        key: PhysicalKey,
        threshold_ms: u32,
        now: Instant,
    ) -> Option<KeyboardEvent> {
        let side = key.side()?;
        // Auto-repeat of a held key is not a tap
        let held = self.held_mut(side);
        if *held {
            return None;
        }
        *held = true;

        let window = Duration::from_millis(u64::from(clamp_double_tap(threshold_ms)));
        let min_gap = Duration::from_millis(u64::from(DOUBLE_TAP_MIN_MS));

        let paired = self.last_tap.is_some_and(|last| {
            let gap = now.saturating_duration_since(last);
            gap >= min_gap && gap <= window
        });

        if paired {
            // The pair is consumed so a third tap starts over
            self.last_tap = None;
            return Some(KeyboardEvent::Trigger(side));
        }

        self.last_tap = Some(now);
        None
    }

    fn held_mut(&mut self, side: KeySide) -> &mut bool {
        match side {
            KeySide::Left => &mut self.held[0],
            KeySide::Right => &mut self.held[1],
        }
    }
}

/// Listener-thread side of the keyboard monitor
#[derive(Debug)]
pub struct KeyboardHookHandler {
    detector: DoubleTapDetector,
    config: SharedConfig,
    sender: EventSender,
}

impl KeyboardHookHandler {
    pub fn new(config: SharedConfig, sender: EventSender) -> Self {
        Self {
            detector: DoubleTapDetector::new(),
            config,
            sender,
        }
    }

    pub fn on_key(&mut self, key: PhysicalKey, is_down: bool, now: Instant) {
        if key == PhysicalKey::Other {
            return;
        }

        let event = self.detector.on_key(
            key,
            is_down,
            self.config.target_key(),
            self.config.double_tap_ms(),
            now,
        );

        if let Some(event) = event {
            debug!(?event, ?key, "Keyboard gesture");
            if !self.sender.post(event) {
                debug!("UI thread gone, dropping keyboard event");
            }
        }
    }
}

#[cfg(windows)]
pub use native::KeyboardMonitor;

#[cfg(windows)]
mod native {
    use std::ops::ControlFlow;
    use std::time::Instant;

    use tracing::info;
    use windows::Win32::Foundation::LPARAM;
    use windows::Win32::UI::WindowsAndMessaging::{
        KBDLLHOOKSTRUCT, LLKHF_EXTENDED, WM_KEYDOWN, WM_KEYUP, WM_SYSKEYDOWN, WM_SYSKEYUP,
    };

    use super::KeyboardHookHandler;
    use crate::config::SharedConfig;
    use crate::domain::keys::PhysicalKey;
    use crate::input::events::EventSender;
    use crate::input::hook::{HookError, HookKind, HookThread, LowLevelHandler};

    impl LowLevelHandler for KeyboardHookHandler {
        fn on_event(&mut self, message: u32, lparam: LPARAM) -> ControlFlow<()> {
            let is_down = match message {
                WM_KEYDOWN | WM_SYSKEYDOWN => true,
                WM_KEYUP | WM_SYSKEYUP => false,
                _ => return ControlFlow::Continue(()),
            };

            // SAFETY: for WH_KEYBOARD_LL, lparam points at a KBDLLHOOKSTRUCT
            // that lives for the duration of the callback
            let data = unsafe { &*(lparam.0 as *const KBDLLHOOKSTRUCT) };
            let extended = data.flags.0 & LLKHF_EXTENDED.0 != 0;
            let key = PhysicalKey::from_scan_code(data.scanCode, extended);

            self.on_key(key, is_down, Instant::now());
            ControlFlow::Continue(())
        }
    }

    /// Double-tap and Escape monitor running on its own hook thread
    #[derive(Debug)]
    pub struct KeyboardMonitor {
        thread: HookThread,
    }

    impl KeyboardMonitor {
        /// Installs the low-level keyboard hook; fails if the OS refuses it
        pub fn start(config: SharedConfig, sender: EventSender) -> Result<Self, HookError> {
            let thread = HookThread::spawn(HookKind::Keyboard, move || {
                Box::new(KeyboardHookHandler::new(config, sender)) as Box<dyn LowLevelHandler>
            })?;
            info!("Keyboard monitor started");
            Ok(Self { thread })
        }

        /// Idempotent; see `HookThread::stop`
        pub fn stop(&self) {
            self.thread.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GestureConfig;
    use crate::domain::keys::KeySide;
    use crate::input::events::AppEvent;
    use std::sync::mpsc;

    const TARGET: TriggerKey = TriggerKey::LeftShift;

    struct Taps {
        detector: DoubleTapDetector,
        start: Instant,
        threshold_ms: u32,
    }

    impl Taps {
        fn new(threshold_ms: u32) -> Self {
            Self {
                detector: DoubleTapDetector::new(),
                start: Instant::now(),
                threshold_ms,
            }
        }

        fn edge(&mut self, key: PhysicalKey, is_down: bool, at_ms: u64) -> Option<KeyboardEvent> {
            let now = self.start + Duration::from_millis(at_ms);
            self.detector.on_key(key, is_down, TARGET, self.threshold_ms, now)
        }

        /// Press and release 30ms later, returning the press result
        fn tap(&mut self, at_ms: u64) -> Option<KeyboardEvent> {
            let pressed = self.edge(PhysicalKey::LeftShift, true, at_ms);
            self.edge(PhysicalKey::LeftShift, false, at_ms + 30);
            pressed
        }
    }

    #[test]
    fn taps_closer_than_minimum_gap_do_not_trigger() {
        let mut taps = Taps::new(300);
        assert_eq!(taps.tap(0), None);
        assert_eq!(taps.tap(100), None);
    }

    #[test]
    fn taps_inside_window_trigger_once() {
        let mut taps = Taps::new(300);
        assert_eq!(taps.tap(0), None);
        assert_eq!(taps.tap(200), Some(KeyboardEvent::Trigger(KeySide::Left)));
        assert_eq!(taps.detector.last_tap, None);
    }

    #[test]
    fn third_tap_does_not_retrigger() {
        let mut taps = Taps::new(300);
        taps.tap(0);
        assert!(taps.tap(200).is_some());
        assert_eq!(taps.tap(250), None);
    }

    #[test]
    fn taps_outside_window_start_over() {
        let mut taps = Taps::new(300);
        assert_eq!(taps.tap(0), None);
        assert_eq!(taps.tap(500), None);
        assert_eq!(taps.tap(700), Some(KeyboardEvent::Trigger(KeySide::Left)));
    }

    #[test]
    fn threshold_is_clamped_to_sane_range() {
        // A zero threshold still allows a 120ms window
        let mut taps = Taps::new(0);
        taps.tap(0);
        assert!(taps.tap(120).is_some());

        // A huge threshold is capped at 1200ms
        let mut taps = Taps::new(60_000);
        taps.tap(0);
        assert_eq!(taps.tap(1500), None);
    }

    #[test]
    fn auto_repeat_is_not_a_tap() {
        let mut taps = Taps::new(300);
        assert_eq!(taps.edge(PhysicalKey::LeftShift, true, 0), None);
        assert_eq!(taps.edge(PhysicalKey::LeftShift, true, 150), None);
        assert_eq!(taps.edge(PhysicalKey::LeftShift, true, 200), None);
        assert_eq!(
            taps.edge(PhysicalKey::LeftShift, false, 210),
            Some(KeyboardEvent::Released)
        );
        assert_eq!(
            taps.edge(PhysicalKey::LeftShift, true, 260),
            Some(KeyboardEvent::Trigger(KeySide::Left))
        );
    }

    #[test]
    fn release_is_reported_for_every_key_up() {
        let mut taps = Taps::new(300);
        assert_eq!(
            taps.edge(PhysicalKey::LeftShift, false, 0),
            Some(KeyboardEvent::Released)
        );
    }

    #[test]
    fn escape_is_debounced() {
        let mut taps = Taps::new(300);
        assert_eq!(
            taps.edge(PhysicalKey::Escape, true, 0),
            Some(KeyboardEvent::EscapePressed)
        );
        assert_eq!(taps.edge(PhysicalKey::Escape, true, 40), None);
        assert_eq!(taps.edge(PhysicalKey::Escape, true, 80), None);
        assert_eq!(taps.edge(PhysicalKey::Escape, false, 90), None);
        assert_eq!(
            taps.edge(PhysicalKey::Escape, true, 400),
            Some(KeyboardEvent::EscapePressed)
        );
    }

    #[test]
    fn other_side_is_not_the_target() {
        let mut taps = Taps::new(300);
        assert_eq!(taps.edge(PhysicalKey::RightShift, true, 0), None);
        assert_eq!(taps.edge(PhysicalKey::RightShift, false, 10), None);
        assert_eq!(taps.edge(PhysicalKey::RightShift, true, 200), None);
    }

    #[test]
    fn either_side_target_reports_tapped_side() {
        let mut detector = DoubleTapDetector::new();
        let start = Instant::now();
        let at = |ms| start + Duration::from_millis(ms);

        detector.on_key(PhysicalKey::RightAlt, true, TriggerKey::Alt, 300, at(0));
        detector.on_key(PhysicalKey::RightAlt, false, TriggerKey::Alt, 300, at(20));
        let event = detector.on_key(PhysicalKey::RightAlt, true, TriggerKey::Alt, 300, at(200));

        assert_eq!(event, Some(KeyboardEvent::Trigger(KeySide::Right)));
    }

    #[test]
    fn releasing_one_side_keeps_the_other_held() {
        let mut detector = DoubleTapDetector::new();
        let start = Instant::now();
        let at = |ms| start + Duration::from_millis(ms);
        let shift = TriggerKey::Shift;

        detector.on_key(PhysicalKey::LeftShift, true, shift, 300, at(0));
        detector.on_key(PhysicalKey::RightShift, true, shift, 300, at(10));
        detector.on_key(PhysicalKey::RightShift, false, shift, 300, at(30));

        // Left Shift is still down, so this is auto-repeat
        let repeat = detector.on_key(PhysicalKey::LeftShift, true, shift, 300, at(200));
        assert_eq!(repeat, None);

        detector.on_key(PhysicalKey::LeftShift, false, shift, 300, at(210));
        // A real press pairs with the right-side tap at 10ms
        let tap = detector.on_key(PhysicalKey::LeftShift, true, shift, 300, at(250));
        assert_eq!(tap, Some(KeyboardEvent::Trigger(KeySide::Left)));
    }

    #[test]
    fn handler_reads_live_target_key() {
        let (tx, rx) = mpsc::channel();
        let config = SharedConfig::new(GestureConfig::default());
        let mut handler = KeyboardHookHandler::new(config.clone(), EventSender::new(tx));
        let start = Instant::now();
        let at = |ms| start + Duration::from_millis(ms);

        config.set_target_key(TriggerKey::RightCtrl);
        handler.on_key(PhysicalKey::RightCtrl, true, at(0));
        handler.on_key(PhysicalKey::RightCtrl, false, at(20));
        handler.on_key(PhysicalKey::RightCtrl, true, at(250));
        handler.on_key(PhysicalKey::Other, true, at(260));

        let events: Vec<AppEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                AppEvent::Keyboard(KeyboardEvent::Released),
                AppEvent::Keyboard(KeyboardEvent::Trigger(KeySide::Right)),
            ]
        );
    }
}
