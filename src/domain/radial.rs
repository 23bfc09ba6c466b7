//! Radial selection geometry
//!
//! Maps a pointer position to a pie slice of the radial menu. Sectors are
//! numbered clockwise (screen coordinates, y grows downwards) starting at a
//! base angle.

use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::core::Point;

/// Number of sectors in every menu style
pub const SECTOR_COUNT: usize = 8;

/// One pie slice, in `[0, SECTOR_COUNT)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectorIndex(usize);

impl SectorIndex {
    /// Returns `None` for indices outside the menu
    pub fn new(index: usize) -> Option<Self> {
        (index < SECTOR_COUNT).then_some(Self(index))
    }

    pub fn get(self) -> usize {
        self.0
    }

    pub fn all() -> impl Iterator<Item = SectorIndex> {
        (0..SECTOR_COUNT).map(SectorIndex)
    }
}

impl fmt::Display for SectorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sector {}", self.0)
    }
}

/// Base angle that centres sector 0 on 12 o'clock
pub fn default_base_angle(sectors: usize) -> f64 {
    -FRAC_PI_2 - PI / sectors.max(1) as f64
}

/// Raw sector lookup for an arbitrary sector count
///
/// Returns `None` inside the inner dead zone, outside the outer radius, or
/// when the geometry is degenerate.
pub fn sector_at(
    point: Point,
    center: Point,
    inner: f64,
    outer: f64,
    sectors: usize,
    base_angle: f64,
) -> Option<usize> {
    if sectors == 0 {
        return None;
    }

    let distance = point.distance_to(center);
    if !distance.is_finite() || distance < inner || distance > outer {
        return None;
    }

    let dx = f64::from(point.x - center.x);
    let dy = f64::from(point.y - center.y);
    let normalized = (dy.atan2(dx) - base_angle).rem_euclid(TAU);
    let span = TAU / sectors as f64;

    Some((normalized / span).floor() as usize % sectors)
}

/// Selection ring of one menu instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialGeometry {
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub base_angle: f64,
}

impl RadialGeometry {
    pub fn new(inner_radius: f64, outer_radius: f64) -> Self {
        Self {
            inner_radius,
            outer_radius,
            base_angle: default_base_angle(SECTOR_COUNT),
        }
    }

    /// Sector under `point` for a menu centred on `center`
    pub fn sector_at(&self, point: Point, center: Point) -> Option<SectorIndex> {
        sector_at(
            point,
            center,
            self.inner_radius,
            self.outer_radius,
            SECTOR_COUNT,
            self.base_angle,
        )
        .map(SectorIndex)
    }

    /// Angle of the boundary that opens `sector`
    pub fn sector_start_angle(&self, sector: SectorIndex) -> f64 {
        self.base_angle + sector.0 as f64 * TAU / SECTOR_COUNT as f64
    }
}

/// Visual variant of the radial menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuStyle {
    #[default]
    BasicRadial,
    CsHeadshot,
    SpiderWeb,
    Bagua,
}

impl MenuStyle {
    pub const ALL: [MenuStyle; 4] = [
        MenuStyle::BasicRadial,
        MenuStyle::CsHeadshot,
        MenuStyle::SpiderWeb,
        MenuStyle::Bagua,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MenuStyle::BasicRadial => "basic-radial",
            MenuStyle::CsHeadshot => "cs-headshot",
            MenuStyle::SpiderWeb => "spider-web",
            MenuStyle::Bagua => "bagua",
        }
    }

    /// Outer radius used when the style is picked without an explicit size
    pub fn default_radius(self) -> f64 {
        match self {
            MenuStyle::BasicRadial => 50.0,
            MenuStyle::CsHeadshot => 80.0,
            MenuStyle::SpiderWeb => 70.0,
            MenuStyle::Bagua => 90.0,
        }
    }
}

impl fmt::Display for MenuStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown menu style `{0}`")]
pub struct ParseStyleError(pub String);

impl FromStr for MenuStyle {
    type Err = ParseStyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        MenuStyle::ALL
            .into_iter()
            .find(|style| style.name() == wanted)
            .ok_or_else(|| ParseStyleError(s.to_string()))
    }
}

/// A menu style together with its configured size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MenuShape {
    pub style: MenuStyle,
    pub outer_radius: f64,
    pub inner_radius: f64,
}

impl MenuShape {
    /// Ring in which the pointer selects a sector
    pub fn geometry(&self) -> RadialGeometry {
        let r = self.outer_radius;
        match self.style {
            MenuStyle::BasicRadial => RadialGeometry::new(self.inner_radius, r),
            MenuStyle::CsHeadshot | MenuStyle::SpiderWeb => RadialGeometry::new(0.0, r),
            MenuStyle::Bagua => RadialGeometry::new(0.35 * r, 1.1 * r),
        }
    }

    /// Radius of the drawn artwork, which may exceed the selection ring
    pub fn draw_radius(&self) -> f64 {
        match self.style {
            MenuStyle::Bagua => 1.2 * self.outer_radius,
            _ => self.outer_radius,
        }
    }
}
