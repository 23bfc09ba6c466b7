//! Application orchestration layer
//!
//! Turns monitor events into overlay lifecycle decisions and window actions.
//! The orchestrator and state machines are portable; the runtime that hosts
//! them on the Win32 message loop is Windows only.

pub mod orchestrator;
#[cfg(windows)]
pub mod runtime;
pub mod state;

pub use orchestrator::{ActionExecutor, Orchestrator};
pub use state::{MenuPhase, PanelPhase, StateMachine};
