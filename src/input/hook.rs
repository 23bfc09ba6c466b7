//! Low-level hook threads
//!
//! Each monitor owns one dedicated thread that installs a system-wide
//! low-level hook and pumps messages so the OS can deliver callbacks.
//! Critical requirements:
//! - The callback runs on the hook thread and must return promptly
//! - A panic must never unwind into the OS hook chain
//! - Every event is passed on with `CallNextHookEx`
//! - The hook is unregistered even if the thread fails to exit in time

use std::fmt;

use thiserror::Error;

/// Which low-level hook a thread installs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Mouse,
    Keyboard,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookKind::Mouse => f.write_str("mouse"),
            HookKind::Keyboard => f.write_str("keyboard"),
        }
    }
}

/// Errors that can occur while starting a hook thread
#[derive(Debug, Error)]
pub enum HookError {
    #[error("Failed to install {hook} hook (native error {code:#010x})")]
    InstallFailed { hook: HookKind, code: i32 },
    #[error("Module handle unavailable for {0} hook")]
    ModuleHandleUnavailable(HookKind),
    #[error("Failed to spawn {hook} hook thread: {source}")]
    ThreadSpawnFailed {
        hook: HookKind,
        source: std::io::Error,
    },
    #[error("{0} hook thread did not signal readiness")]
    NotReady(HookKind),
}

#[cfg(windows)]
pub use native::{HookThread, LowLevelHandler};

#[cfg(windows)]
mod native {
    use std::cell::{Cell, RefCell};
    use std::fmt;
    use std::ops::ControlFlow;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicIsize, AtomicU32, Ordering};
    use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
    use std::sync::{Arc, Mutex, PoisonError};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;

    use tracing::{debug, error, info, warn};
    use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::System::Threading::GetCurrentThreadId;
    use windows::Win32::UI::WindowsAndMessaging::{
        CallNextHookEx, DispatchMessageW, GetMessageW, HC_ACTION, HHOOK, MSG, PM_NOREMOVE,
        PeekMessageW, PostThreadMessageW, SetWindowsHookExW, TranslateMessage,
        UnhookWindowsHookEx, WH_KEYBOARD_LL, WH_MOUSE_LL, WINDOWS_HOOK_ID, WM_QUIT, WM_TIMER,
    };

    use windows::core::PCWSTR;

    use super::{HookError, HookKind};

    const READY_TIMEOUT: Duration = Duration::from_secs(2);
    const STOP_TIMEOUT: Duration = Duration::from_secs(1);
    const ABANDONED: isize = -1;

    /// Monitor logic invoked from the hook callback
    ///
    /// Implementations run on the hook thread and must not block.
    pub trait LowLevelHandler {
        /// One raw hook event; `Break` swallows it instead of passing it on
        fn on_event(&mut self, message: u32, lparam: LPARAM) -> ControlFlow<()>;

        /// A thread timer armed on the hook thread expired
        fn on_timer(&mut self, _timer_id: usize) {}
    }

    thread_local! {
        static HANDLER: RefCell<Option<Box<dyn LowLevelHandler>>> = const { RefCell::new(None) };
        static KIND: Cell<Option<HookKind>> = const { Cell::new(None) };
    }

    impl HookKind {
        fn hook_id(self) -> WINDOWS_HOOK_ID {
            match self {
                HookKind::Mouse => WH_MOUSE_LL,
                HookKind::Keyboard => WH_KEYBOARD_LL,
            }
        }
    }

    /// Runs `f` against this thread's handler, containing any panic
    fn with_handler<R>(kind: HookKind, f: impl FnOnce(&mut dyn LowLevelHandler) -> R) -> Option<R> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            HANDLER.with(|slot| {
                // A nested callback (re-entrancy) finds the slot borrowed
                let mut slot = slot.try_borrow_mut().ok()?;
                let handler = slot.as_mut()?;
                Some(f(handler.as_mut()))
            })
        }));

        match outcome {
            Ok(result) => result,
            Err(_) => {
                error!(hook = %kind, "Hook handler panicked, event passed on");
                None
            }
        }
    }

    /// Shared callback for both hook kinds; the handler is per thread
    unsafe extern "system" fn hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
        if code == HC_ACTION as i32 {
            let kind = KIND.with(|k| k.get()).unwrap_or(HookKind::Mouse);
            let flow = with_handler(kind, |handler| handler.on_event(wparam.0 as u32, lparam));
            if let Some(ControlFlow::Break(())) = flow {
                return LRESULT(1);
            }
        }

        unsafe { CallNextHookEx(None, code, wparam, lparam) }
    }

    struct Running {
        join: JoinHandle<()>,
        done_rx: Receiver<()>,
    }

    /// Dedicated thread owning one low-level hook and its message pump
    pub struct HookThread {
        kind: HookKind,
        thread_id: u32,
        hook: Arc<AtomicIsize>,
        running: Mutex<Option<Running>>,
    }

    impl HookThread {
        /// Spawns the thread, builds the handler on it and installs the hook
        ///
        /// Returns only once the hook is live or installation failed.
        pub fn spawn<F>(kind: HookKind, make_handler: F) -> Result<Self, HookError>
        where
            F: FnOnce() -> Box<dyn LowLevelHandler> + Send + 'static,
        {
            let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<u32, HookError>>(1);
            let (done_tx, done_rx) = mpsc::channel::<()>();
            let hook = Arc::new(AtomicIsize::new(0));
            let thread_hook = Arc::clone(&hook);
            let spawned_id = Arc::new(AtomicU32::new(0));
            let thread_spawned_id = Arc::clone(&spawned_id);

            let join = thread::Builder::new()
                .name(format!("{kind}-hook"))
                .spawn(move || {
                    // Ensure the thread has a message queue before anyone posts to it
                    let mut msg = MSG::default();
                    unsafe {
                        let _ = PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE);
                    }
                    let thread_id = unsafe { GetCurrentThreadId() };
                    // Stored before the hook is published; a timed-out spawner reads it
                    thread_spawned_id.store(thread_id, Ordering::SeqCst);

                    KIND.with(|k| k.set(Some(kind)));
                    HANDLER.with(|slot| *slot.borrow_mut() = Some(make_handler()));

                    match install(kind) {
                        Ok(raw) => {
                            let published = thread_hook
                                .compare_exchange(0, raw.0, Ordering::SeqCst, Ordering::SeqCst)
                                .is_ok();
                            // A dropped receiver means the spawner already gave up
                            if published && ready_tx.send(Ok(thread_id)).is_ok() {
                                pump(kind);
                            } else if !published {
                                // Spawner gave up waiting; nobody will stop this thread
                                unsafe {
                                    let _ = UnhookWindowsHookEx(raw);
                                }
                            }
                        }
                        Err(err) => {
                            let _ = ready_tx.send(Err(err));
                        }
                    }

                    unhook(kind, &thread_hook);
                    HANDLER.with(|slot| slot.borrow_mut().take());
                    let _ = done_tx.send(());
                })
                .map_err(|source| HookError::ThreadSpawnFailed { hook: kind, source })?;

            let thread_id = match ready_rx.recv_timeout(READY_TIMEOUT) {
                Ok(Ok(thread_id)) => thread_id,
                Ok(Err(err)) => {
                    let _ = join.join();
                    return Err(err);
                }
                Err(_) => {
                    // A late install sees the marker and unhooks itself
                    let raw = hook.swap(ABANDONED, Ordering::SeqCst);
                    if raw != 0 {
                        // Published just too late: release the hook and end its pump
                        unhook(kind, &AtomicIsize::new(raw));
                        post_quit(spawned_id.load(Ordering::SeqCst));
                    }
                    return Err(HookError::NotReady(kind));
                }
            };

            debug!(hook = %kind, thread_id, "Hook thread ready");
            Ok(Self {
                kind,
                thread_id,
                hook,
                running: Mutex::new(Some(Running { join, done_rx })),
            })
        }

        /// Asks the thread to exit and waits a bounded time for it
        ///
        /// Safe to call repeatedly and from any thread. If the thread does not
        /// finish in time the hook is unregistered from here instead.
        pub fn stop(&self) {
            let running = self
                .running
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            let Some(running) = running else {
                return;
            };

            post_quit(self.thread_id);

            match running.done_rx.recv_timeout(STOP_TIMEOUT) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    let _ = running.join.join();
                    info!(hook = %self.kind, "Hook thread stopped");
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(hook = %self.kind, "Hook thread still running, unhooking directly");
                    unhook(self.kind, &self.hook);
                }
            }
        }
    }

    impl Drop for HookThread {
        fn drop(&mut self) {
            self.stop();
        }
    }

    impl fmt::Debug for HookThread {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("HookThread")
                .field("kind", &self.kind)
                .field("thread_id", &self.thread_id)
                .field("hook", &self.hook.load(Ordering::SeqCst))
                .finish()
        }
    }

    fn post_quit(thread_id: u32) {
        if thread_id == 0 {
            return;
        }
        // Queued even before the pump starts, so GetMessageW returns at once
        let posted = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) };
        if let Err(err) = posted {
            debug!(thread_id, code = err.code().0, "WM_QUIT not posted");
        }
    }

    fn install(kind: HookKind) -> Result<HHOOK, HookError> {
        let module = unsafe { GetModuleHandleW(PCWSTR::null()) }
            .map_err(|_| HookError::ModuleHandleUnavailable(kind))?;

        match unsafe { SetWindowsHookExW(kind.hook_id(), Some(hook_proc), module, 0) } {
            Ok(hook) if hook.0 != 0 => Ok(hook),
            Ok(_) => Err(HookError::InstallFailed {
                hook: kind,
                code: windows::core::Error::from_win32().code().0,
            }),
            Err(err) => Err(HookError::InstallFailed {
                hook: kind,
                code: err.code().0,
            }),
        }
    }

    /// Unregisters the hook exactly once, whoever gets here first
    fn unhook(kind: HookKind, hook: &AtomicIsize) {
        let raw = hook.swap(0, Ordering::SeqCst);
        if raw == 0 || raw == ABANDONED {
            return;
        }
        if let Err(err) = unsafe { UnhookWindowsHookEx(HHOOK(raw)) } {
            warn!(hook = %kind, code = err.code().0, "UnhookWindowsHookEx failed");
        }
    }

    /// Message loop; thread timers are routed to the handler
    fn pump(kind: HookKind) {
        let mut msg = MSG::default();
        loop {
            let result = unsafe { GetMessageW(&mut msg, None, 0, 0) };
            if result.0 == 0 || result.0 == -1 {
                break;
            }

            if msg.message == WM_TIMER && msg.hwnd.0 == 0 {
                let timer_id = msg.wParam.0;
                with_handler(kind, |handler| handler.on_timer(timer_id));
                continue;
            }

            unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_failure_reports_hook_and_code() {
        let err = HookError::InstallFailed {
            hook: HookKind::Mouse,
            code: 0x8007_0005_u32 as i32,
        };
        assert_eq!(
            err.to_string(),
            "Failed to install mouse hook (native error 0x80070005)"
        );
    }

    #[test]
    fn readiness_errors_name_the_hook() {
        assert_eq!(
            HookError::NotReady(HookKind::Keyboard).to_string(),
            "keyboard hook thread did not signal readiness"
        );
        assert_eq!(
            HookError::ModuleHandleUnavailable(HookKind::Mouse).to_string(),
            "Module handle unavailable for mouse hook"
        );
    }
}
