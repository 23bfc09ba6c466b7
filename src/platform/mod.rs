//! Platform-specific Windows implementations
//!
//! This module encapsulates all Win32 window and monitor calls and
//! provides a clean interface to the rest of the application.

pub mod monitors;
pub mod rect;
pub mod timer;
pub mod window;

pub use window::{ActionError, WindowActionExecutor};
