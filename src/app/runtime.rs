//! UI thread runtime
//!
//! Owns the Win32 message loop of the main thread. Monitor events arrive on
//! an mpsc channel; every post also wakes the loop with a thread message so
//! events are drained in order without polling.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};
use windows::Win32::Foundation::{BOOL, LPARAM, POINT, TRUE, WPARAM};
use windows::Win32::System::Console::SetConsoleCtrlHandler;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::HiDpi::{
    DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2, SetProcessDpiAwarenessContext,
};
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetCursorPos, GetMessageW, MSG, PM_NOREMOVE, PeekMessageW,
    PostThreadMessageW, TranslateMessage, WM_APP, WM_QUIT, WM_TIMER, WM_USER,
};

use crate::app::orchestrator::{ActionExecutor, Orchestrator};
use crate::config::SharedConfig;
use crate::domain::core::Point;
use crate::input::{AppEvent, EventSender, HookError, KeyboardMonitor, MouseEvent, MouseMonitor};
use crate::platform::WindowActionExecutor;
use crate::platform::timer::ThreadTimer;
use crate::ui::overlay::LayeredMenuPresenter;
use crate::ui::panel::SlidePanelPresenter;
use crate::ui::{MenuPresenter, PanelPresenter};

/// Thread message telling the loop that events are queued
const WM_APP_EVENTS: u32 = WM_APP + 1;

/// Cursor polling period while the menu is open (~60 Hz)
const TRACKING_PERIOD: Duration = Duration::from_millis(16);

/// Thread id of the message loop, for the console control handler
static UI_THREAD: AtomicU32 = AtomicU32::new(0);

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("No input monitor could be started (mouse: {mouse}; keyboard: {keyboard})")]
    NoMonitors { mouse: HookError, keyboard: HookError },

    #[error("Message loop failed (native error {0:#010x})")]
    MessageLoop(i32),
}

/// Running monitors, stopped on drop
struct Monitors {
    mouse: Option<MouseMonitor>,
    keyboard: Option<KeyboardMonitor>,
}

impl Monitors {
    /// Starts both monitors; one failing leaves the other channel working
    fn start(config: &SharedConfig, sender: &EventSender) -> Result<Self, RuntimeError> {
        let mouse = MouseMonitor::start(config.clone(), sender.clone());
        let keyboard = KeyboardMonitor::start(config.clone(), sender.clone());

        match (mouse, keyboard) {
            (Err(mouse), Err(keyboard)) => Err(RuntimeError::NoMonitors { mouse, keyboard }),
            (mouse, keyboard) => {
                let mouse = mouse
                    .inspect_err(|err| error!(%err, "Radial menu disabled"))
                    .ok();
                let keyboard = keyboard
                    .inspect_err(|err| error!(%err, "Informational panel disabled"))
                    .ok();
                Ok(Self { mouse, keyboard })
            }
        }
    }

    fn stop(&self) {
        if let Some(mouse) = &self.mouse {
            mouse.stop();
        }
        if let Some(keyboard) = &self.keyboard {
            keyboard.stop();
        }
    }
}

impl Drop for Monitors {
    fn drop(&mut self) {
        self.stop();
    }
}

fn post_to_ui(message: u32) {
    let thread = UI_THREAD.load(Ordering::Acquire);
    if thread == 0 {
        return;
    }
    if let Err(err) = unsafe { PostThreadMessageW(thread, message, WPARAM(0), LPARAM(0)) } {
        // The loop may already have exited during shutdown
        debug!(code = err.code().0, message, "Thread message not posted");
    }
}

unsafe extern "system" fn console_ctrl_handler(ctrl_type: u32) -> BOOL {
    info!(ctrl_type, "Console close requested");
    post_to_ui(WM_QUIT);
    TRUE
}

fn cursor_position() -> Option<Point> {
    let mut point = POINT::default();
    unsafe { GetCursorPos(&mut point) }.ok()?;
    Some(Point::new(point.x, point.y))
}

/// Feeds queued events to the orchestrator in posting order
fn drain<M, P, E>(rx: &Receiver<AppEvent>, orchestrator: &mut Orchestrator<M, P, E>)
where
    M: MenuPresenter,
    P: PanelPresenter,
    E: ActionExecutor,
{
    for event in rx.try_iter() {
        // Resolve against where the pointer is now, not the last poll
        if event == AppEvent::Mouse(MouseEvent::Release) {
            if let Some(point) = cursor_position() {
                orchestrator.pointer_moved(point);
            }
        }
        orchestrator.handle(event);
    }
}

/// Runs until WM_QUIT, then closes overlays and stops the monitors
pub fn run(config: SharedConfig) -> Result<(), RuntimeError> {
    let awareness =
        unsafe { SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) };
    if let Err(err) = awareness {
        warn!(code = err.code().0, "Per-monitor DPI awareness unavailable");
    }

    // Force creation of this thread's message queue before anyone posts to it
    let mut msg = MSG::default();
    unsafe {
        let _ = PeekMessageW(&mut msg, None, WM_USER, WM_USER, PM_NOREMOVE);
    }
    UI_THREAD.store(unsafe { GetCurrentThreadId() }, Ordering::Release);

    if let Err(err) = unsafe { SetConsoleCtrlHandler(Some(console_ctrl_handler), TRUE) } {
        warn!(code = err.code().0, "Console control handler not installed");
    }

    let (tx, rx) = mpsc::channel();
    let sender = EventSender::with_waker(tx, || post_to_ui(WM_APP_EVENTS));

    let monitors = Monitors::start(&config, &sender)?;
    let mut orchestrator = Orchestrator::new(
        config.clone(),
        LayeredMenuPresenter::new(),
        SlidePanelPresenter::new(config),
        WindowActionExecutor,
        sender,
    );
    info!("Gesture monitors running");

    let mut tracking: Option<ThreadTimer> = None;
    let outcome = loop {
        let status = unsafe { GetMessageW(&mut msg, None, 0, 0) };
        match status.0 {
            0 => break Ok(()),
            -1 => break Err(RuntimeError::MessageLoop(windows::core::Error::from_win32().code().0)),
            _ => {}
        }

        let thread_message = msg.hwnd.0 == 0;
        if thread_message && msg.message == WM_APP_EVENTS {
            drain(&rx, &mut orchestrator);
        } else if thread_message
            && msg.message == WM_TIMER
            && tracking.as_ref().is_some_and(|timer| timer.id() == msg.wParam.0)
        {
            if let Some(point) = cursor_position() {
                orchestrator.pointer_moved(point);
            }
        } else {
            unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }

        match (orchestrator.menu_visible(), tracking.is_some()) {
            (true, false) => {
                tracking = ThreadTimer::start(TRACKING_PERIOD);
                if tracking.is_none() {
                    warn!("Pointer tracking timer unavailable");
                }
            }
            (false, true) => tracking = None,
            _ => {}
        }
    };

    info!("Shutting down");
    drop(tracking);
    orchestrator.shutdown();
    monitors.stop();
    UI_THREAD.store(0, Ordering::Release);

    outcome
}
