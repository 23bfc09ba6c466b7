//! Gesture configuration
//!
//! Configuration is built from defaults and command-line overrides at
//! start-up, then shared live with the input listener threads.

pub mod gesture;

pub use gesture::{
    ConfigError, DEFAULT_DOUBLE_TAP_MS, DEFAULT_INNER_RADIUS, DEFAULT_OUTER_RADIUS,
    DEFAULT_TRIGGER_DELAY_MS, DOUBLE_TAP_MAX_MS, DOUBLE_TAP_MIN_MS, GestureConfig, MenuSettings,
    SharedConfig, clamp_double_tap,
};
