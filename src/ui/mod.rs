//! Overlay presentation
//!
//! The orchestrator drives overlays only through the presenter traits below.
//! `renderer` draws with tiny-skia and is portable; the layered-window
//! implementations are Windows only.

pub mod renderer;

#[cfg(windows)]
pub mod overlay;
#[cfg(windows)]
pub mod panel;

use thiserror::Error;

use crate::domain::core::Point;
use crate::domain::keys::KeySide;
use crate::domain::radial::{MenuShape, SectorIndex};

pub use renderer::{RadialLayout, RadialRenderer, RendererError};

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Failed to register overlay window class (native error {0:#010x})")]
    WindowClassRegistrationFailed(i32),

    #[error("Failed to create overlay window (native error {0:#010x})")]
    WindowCreationFailed(i32),

    #[error("Failed to acquire screen device context")]
    DeviceContextFailed,

    #[error("Failed to create memory device context")]
    MemoryDeviceContextFailed,

    #[error("Failed to create DIB section for overlay frame")]
    DibSectionCreationFailed,

    #[error("Failed to update layered window surface (native error {0:#010x})")]
    LayerUpdateFailed(i32),

    #[cfg(windows)]
    #[error("Work area unavailable: {0}")]
    WorkArea(#[from] crate::platform::monitors::MonitorError),

    #[error("Rendering failed: {0}")]
    RenderingError(#[from] RendererError),
}

/// Screen edge the informational panel slides in from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEdge {
    Left,
    Right,
}

impl From<KeySide> for PanelEdge {
    fn from(side: KeySide) -> Self {
        match side {
            KeySide::Left => PanelEdge::Left,
            KeySide::Right => PanelEdge::Right,
        }
    }
}

/// Creates radial menu overlays
pub trait MenuPresenter {
    type Overlay: MenuOverlay;

    fn create(&mut self, shape: &MenuShape) -> Result<Self::Overlay, OverlayError>;
}

/// One radial menu instance
pub trait MenuOverlay {
    /// Shows the menu centred on `center` without taking focus
    fn show_at(&mut self, center: Point) -> Result<(), OverlayError>;

    fn update_highlight(&mut self, sector: Option<SectorIndex>);

    /// Removes the menu from the screen immediately
    fn close(&mut self);
}

/// Creates informational panels
pub trait PanelPresenter {
    type Panel: InfoPanel;

    fn create(&mut self) -> Result<Self::Panel, OverlayError>;
}

/// One informational panel instance
pub trait InfoPanel {
    fn show(&mut self, edge: PanelEdge) -> Result<(), OverlayError>;

    /// Starts the hide animation; `on_complete` runs on the UI thread once
    /// the panel is fully hidden
    fn hide_animated(&mut self, on_complete: Box<dyn FnOnce()>);

    /// Removes the panel immediately, cancelling any animation
    fn close(&mut self);
}
