//! radial-snap
//!
//! Hold the middle mouse button to open a radial window-layout menu at the
//! cursor, release over a sector to apply its layout to the foreground
//! window. Double-tap a modifier key to toggle an informational panel.
//!
//! Layers:
//! - `domain`: pure geometry, actions and key classification
//! - `config`: live configuration shared with the listener threads
//! - `input`: global mouse and keyboard monitors
//! - `app`: gesture orchestration and state machines
//! - `platform`: Win32 window placement and monitor queries
//! - `ui`: rendering and layered overlay windows

pub mod app;
pub mod config;
pub mod domain;
pub mod input;
pub mod logging;
#[cfg(windows)]
pub mod platform;
pub mod ui;
