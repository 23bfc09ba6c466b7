//! Settings snapshot and live configuration view
//!
//! `GestureConfig` is an owned snapshot with documented defaults.
//! `SharedConfig` is the live view shared by the monitors and the UI thread:
//! the values read on every press are atomics, and the menu settings sit
//! behind a lock whose failure is reported as `ConfigError::Unavailable`.

use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::domain::action::ActionMapping;
use crate::domain::keys::TriggerKey;
use crate::domain::radial::{MenuShape, MenuStyle};

pub const DEFAULT_TRIGGER_DELAY_MS: u32 = 200;
pub const DEFAULT_DOUBLE_TAP_MS: u32 = 300;
pub const DOUBLE_TAP_MIN_MS: u32 = 120;
pub const DOUBLE_TAP_MAX_MS: u32 = 1200;
pub const DEFAULT_OUTER_RADIUS: f64 = 50.0;
pub const DEFAULT_INNER_RADIUS: f64 = 28.0;

/// Largest radius accepted from configuration
pub const MAX_RADIUS: f64 = 1000.0;

/// Clamps a double-tap threshold to the range the detector honours
pub fn clamp_double_tap(threshold_ms: u32) -> u32 {
    threshold_ms.clamp(DOUBLE_TAP_MIN_MS, DOUBLE_TAP_MAX_MS)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Configuration is unavailable: {0}")]
    Unavailable(&'static str),
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Menu appearance and sector assignments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MenuSettings {
    pub style: MenuStyle,
    pub outer_radius: f64,
    pub inner_radius: f64,
    pub action_mapping: ActionMapping,
    pub panel_enabled: bool,
}

impl Default for MenuSettings {
    fn default() -> Self {
        Self {
            style: MenuStyle::default(),
            outer_radius: DEFAULT_OUTER_RADIUS,
            inner_radius: DEFAULT_INNER_RADIUS,
            action_mapping: ActionMapping::default(),
            panel_enabled: true,
        }
    }
}

impl MenuSettings {
    /// Returns a copy with radii made finite, non-negative and ordered
    pub fn sanitized(mut self) -> Self {
        let outer = sanitize_radius(self.outer_radius, DEFAULT_OUTER_RADIUS);
        let inner = sanitize_radius(self.inner_radius, DEFAULT_INNER_RADIUS);
        self.outer_radius = outer;
        self.inner_radius = inner.min(outer);
        self
    }

    pub fn shape(&self) -> MenuShape {
        MenuShape {
            style: self.style,
            outer_radius: self.outer_radius,
            inner_radius: self.inner_radius,
        }
    }
}

fn sanitize_radius(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, MAX_RADIUS)
    } else {
        fallback
    }
}

/// Owned configuration snapshot, built once at start-up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    pub trigger_delay_ms: u32,
    pub double_tap_ms: u32,
    pub target_key: TriggerKey,
    pub menu: MenuSettings,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            trigger_delay_ms: DEFAULT_TRIGGER_DELAY_MS,
            double_tap_ms: DEFAULT_DOUBLE_TAP_MS,
            target_key: TriggerKey::default(),
            menu: MenuSettings::default(),
        }
    }
}

impl GestureConfig {
    /// Checks values that cannot be repaired silently
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("outer radius", self.menu.outer_radius),
            ("inner radius", self.menu.inner_radius),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("{value} is not a non-negative number"),
                });
            }
        }

        if self.menu.inner_radius > self.menu.outer_radius {
            return Err(ConfigError::InvalidValue {
                field: "inner radius",
                reason: format!(
                    "{} exceeds the outer radius {}",
                    self.menu.inner_radius, self.menu.outer_radius
                ),
            });
        }

        Ok(())
    }
}

struct SharedState {
    trigger_delay_ms: AtomicU32,
    double_tap_ms: AtomicU32,
    target_key: AtomicU8,
    menu: RwLock<MenuSettings>,
}

/// Live configuration shared between the UI thread and the listener threads
///
/// Delay, threshold and target key are single atomic words read once per
/// press; a change applies to the next press, never to one in flight.
#[derive(Clone)]
pub struct SharedConfig {
    state: Arc<SharedState>,
}

impl SharedConfig {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            state: Arc::new(SharedState {
                trigger_delay_ms: AtomicU32::new(config.trigger_delay_ms),
                double_tap_ms: AtomicU32::new(config.double_tap_ms),
                target_key: AtomicU8::new(config.target_key.as_u8()),
                menu: RwLock::new(config.menu.sanitized()),
            }),
        }
    }

    pub fn trigger_delay_ms(&self) -> u32 {
        self.state.trigger_delay_ms.load(Ordering::Relaxed)
    }

    pub fn set_trigger_delay_ms(&self, value: u32) {
        self.state.trigger_delay_ms.store(value, Ordering::Relaxed);
    }

    /// Threshold as configured; the detector clamps it at use
    pub fn double_tap_ms(&self) -> u32 {
        self.state.double_tap_ms.load(Ordering::Relaxed)
    }

    pub fn set_double_tap_ms(&self, value: u32) {
        self.state.double_tap_ms.store(value, Ordering::Relaxed);
    }

    pub fn target_key(&self) -> TriggerKey {
        TriggerKey::from_u8(self.state.target_key.load(Ordering::Relaxed)).unwrap_or_default()
    }

    pub fn set_target_key(&self, key: TriggerKey) {
        self.state.target_key.store(key.as_u8(), Ordering::Relaxed);
    }

    /// Current menu settings, or `Unavailable` if a writer panicked mid-update
    pub fn try_menu_settings(&self) -> Result<MenuSettings, ConfigError> {
        self.state
            .menu
            .read()
            .map(|menu| *menu)
            .map_err(|_| ConfigError::Unavailable("menu settings lock poisoned"))
    }

    pub fn set_menu(&self, menu: MenuSettings) -> Result<(), ConfigError> {
        let mut guard = self
            .state
            .menu
            .write()
            .map_err(|_| ConfigError::Unavailable("menu settings lock poisoned"))?;
        *guard = menu.sanitized();
        Ok(())
    }
}

impl std::fmt::Debug for SharedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedConfig")
            .field("trigger_delay_ms", &self.trigger_delay_ms())
            .field("double_tap_ms", &self.double_tap_ms())
            .field("target_key", &self.target_key())
            .field("menu", &self.try_menu_settings())
            .finish()
    }
}
