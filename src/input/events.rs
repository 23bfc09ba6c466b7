//! Semantic input events and their dispatch to the UI thread
//!
//! Listener threads never touch UI state. They post events through an
//! `EventSender`, which queues them in order and wakes the UI thread.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::Sender;

use crate::domain::core::Point;
use crate::domain::keys::KeySide;

/// Output of the mouse monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEvent {
    /// Button held past the trigger delay, at the press position
    Trigger(Point),
    /// Button lifted, whether or not a trigger fired
    Release,
}

/// Output of the keyboard monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardEvent {
    /// Double-tap of the trigger key, on the side that was tapped
    Trigger(KeySide),
    /// Trigger key lifted
    Released,
    EscapePressed,
}

/// Identity of one informational panel instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelId(pub u64);

/// Everything the UI thread reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Mouse(MouseEvent),
    Keyboard(KeyboardEvent),
    /// A panel finished its hide animation
    PanelHidden(PanelId),
}

impl From<MouseEvent> for AppEvent {
    fn from(event: MouseEvent) -> Self {
        AppEvent::Mouse(event)
    }
}

impl From<KeyboardEvent> for AppEvent {
    fn from(event: KeyboardEvent) -> Self {
        AppEvent::Keyboard(event)
    }
}

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Ordered, non-blocking event dispatch towards the UI thread
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<AppEvent>,
    waker: Option<Waker>,
}

impl EventSender {
    pub fn new(tx: Sender<AppEvent>) -> Self {
        Self { tx, waker: None }
    }

    /// Runs `waker` after every queued event so the consumer can drain
    pub fn with_waker(tx: Sender<AppEvent>, waker: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            tx,
            waker: Some(Arc::new(waker)),
        }
    }

    /// Queues an event; returns false once the consumer is gone
    pub fn post(&self, event: impl Into<AppEvent>) -> bool {
        if self.tx.send(event.into()).is_err() {
            return false;
        }
        if let Some(waker) = &self.waker {
            waker();
        }
        true
    }
}

impl fmt::Debug for EventSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender")
            .field("waker", &self.waker.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    #[test]
    fn events_arrive_in_post_order() {
        let (tx, rx) = mpsc::channel();
        let sender = EventSender::new(tx);

        assert!(sender.post(MouseEvent::Trigger(Point::new(1, 2))));
        assert!(sender.post(KeyboardEvent::EscapePressed));
        assert!(sender.post(MouseEvent::Release));

        let received: Vec<AppEvent> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                AppEvent::Mouse(MouseEvent::Trigger(Point::new(1, 2))),
                AppEvent::Keyboard(KeyboardEvent::EscapePressed),
                AppEvent::Mouse(MouseEvent::Release),
            ]
        );
    }

    #[test]
    fn waker_runs_once_per_event() {
        let (tx, _rx) = mpsc::channel();
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let sender = EventSender::with_waker(tx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sender.post(MouseEvent::Release);
        sender.post(KeyboardEvent::Released);
        assert_eq!(wakes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn closed_channel_reports_failure_without_waking() {
        let (tx, rx) = mpsc::channel();
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let sender = EventSender::with_waker(tx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(rx);

        assert!(!sender.post(MouseEvent::Release));
        assert_eq!(wakes.load(Ordering::SeqCst), 0);
    }
}
