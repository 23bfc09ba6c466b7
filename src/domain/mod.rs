//! Domain logic and core data structures
//!
//! This module contains pure logic that is independent
//! of Win32 APIs and platform-specific implementations.

pub mod action;
pub mod core;
pub mod keys;
pub mod radial;

pub use action::{ActionMapping, Placement, Span, WindowAction};
pub use core::{FrameOffset, Point, Rect};
pub use keys::{KeySide, ParseKeyError, PhysicalKey, TriggerKey};
pub use radial::{MenuShape, MenuStyle, RadialGeometry, SECTOR_COUNT, SectorIndex};
