//! Window layout actions and their placement ratios

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::core::Rect;
use crate::domain::radial::{SECTOR_COUNT, SectorIndex};

/// Layout command applied to the foreground window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowAction {
    Maximize,
    Minimize,
    BackToDesktop,
    LeftHalf,
    RightHalf,
    TopHalf,
    BottomHalf,
    TopLeftQuadrant,
    TopRightQuadrant,
    BottomLeftQuadrant,
    BottomRightQuadrant,
    LeftTwoThirds,
    RightTwoThirds,
}

impl WindowAction {
    pub const ALL: [WindowAction; 13] = [
        WindowAction::Maximize,
        WindowAction::Minimize,
        WindowAction::BackToDesktop,
        WindowAction::LeftHalf,
        WindowAction::RightHalf,
        WindowAction::TopHalf,
        WindowAction::BottomHalf,
        WindowAction::TopLeftQuadrant,
        WindowAction::TopRightQuadrant,
        WindowAction::BottomLeftQuadrant,
        WindowAction::BottomRightQuadrant,
        WindowAction::LeftTwoThirds,
        WindowAction::RightTwoThirds,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WindowAction::Maximize => "maximize",
            WindowAction::Minimize => "minimize",
            WindowAction::BackToDesktop => "back-to-desktop",
            WindowAction::LeftHalf => "left-half",
            WindowAction::RightHalf => "right-half",
            WindowAction::TopHalf => "top-half",
            WindowAction::BottomHalf => "bottom-half",
            WindowAction::TopLeftQuadrant => "top-left-quadrant",
            WindowAction::TopRightQuadrant => "top-right-quadrant",
            WindowAction::BottomLeftQuadrant => "bottom-left-quadrant",
            WindowAction::BottomRightQuadrant => "bottom-right-quadrant",
            WindowAction::LeftTwoThirds => "left-two-thirds",
            WindowAction::RightTwoThirds => "right-two-thirds",
        }
    }

    /// Work-area placement for the geometric actions
    ///
    /// Show-state commands (maximize, minimize, show desktop) have none.
    pub fn placement(self) -> Option<Placement> {
        use Span::*;

        let (col, row) = match self {
            WindowAction::Maximize | WindowAction::Minimize | WindowAction::BackToDesktop => {
                return None;
            }
            WindowAction::LeftHalf => (FirstHalf, Full),
            WindowAction::RightHalf => (SecondHalf, Full),
            WindowAction::TopHalf => (Full, FirstHalf),
            WindowAction::BottomHalf => (Full, SecondHalf),
            WindowAction::TopLeftQuadrant => (FirstHalf, FirstHalf),
            WindowAction::TopRightQuadrant => (SecondHalf, FirstHalf),
            WindowAction::BottomLeftQuadrant => (FirstHalf, SecondHalf),
            WindowAction::BottomRightQuadrant => (SecondHalf, SecondHalf),
            WindowAction::LeftTwoThirds => (FirstTwoThirds, Full),
            WindowAction::RightTwoThirds => (LastTwoThirds, Full),
        };

        Some(Placement { col, row })
    }
}

impl fmt::Display for WindowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown window action `{0}`")]
pub struct ParseActionError(pub String);

impl FromStr for WindowAction {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        WindowAction::ALL
            .into_iter()
            .find(|action| action.name() == wanted)
            .ok_or_else(|| ParseActionError(s.to_string()))
    }
}

/// Portion of one axis of the work area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    Full,
    FirstHalf,
    SecondHalf,
    FirstTwoThirds,
    LastTwoThirds,
}

impl Span {
    /// Returns `(start, length)` within an axis starting at `origin`
    ///
    /// Trailing spans end flush with the far edge so odd lengths leave no gap.
    pub fn resolve(self, origin: i32, length: i32) -> (i32, i32) {
        match self {
            Span::Full => (origin, length),
            Span::FirstHalf => (origin, length / 2),
            Span::SecondHalf => {
                let part = length / 2;
                (origin + length - part, part)
            }
            Span::FirstTwoThirds => (origin, length * 2 / 3),
            Span::LastTwoThirds => {
                let part = length * 2 / 3;
                (origin + length - part, part)
            }
        }
    }
}

/// Target of a geometric action, relative to a work area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub col: Span,
    pub row: Span,
}

impl Placement {
    /// Resolves the placement against a concrete work area
    pub fn target_rect(&self, work_area: Rect) -> Rect {
        let (x, w) = self.col.resolve(work_area.x, work_area.w);
        let (y, h) = self.row.resolve(work_area.y, work_area.h);
        Rect::new(x, y, w, h)
    }
}

/// Sector to action lookup, read once per gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionMapping {
    slots: [Option<WindowAction>; SECTOR_COUNT],
}

impl ActionMapping {
    pub fn get(&self, sector: SectorIndex) -> Option<WindowAction> {
        self.slots[sector.get()]
    }

    pub fn set(&mut self, sector: SectorIndex, action: Option<WindowAction>) {
        self.slots[sector.get()] = action;
    }
}

impl Default for ActionMapping {
    fn default() -> Self {
        Self {
            slots: [
                Some(WindowAction::Maximize),
                Some(WindowAction::TopRightQuadrant),
                Some(WindowAction::RightTwoThirds),
                Some(WindowAction::BackToDesktop),
                Some(WindowAction::Minimize),
                Some(WindowAction::BottomLeftQuadrant),
                Some(WindowAction::LeftTwoThirds),
                Some(WindowAction::TopLeftQuadrant),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORK: Rect = Rect {
        x: 0,
        y: 0,
        w: 1920,
        h: 1040,
    };

    fn target(action: WindowAction) -> Rect {
        action
            .placement()
            .expect("geometric action")
            .target_rect(WORK)
    }

    #[test]
    fn show_state_actions_have_no_placement() {
        assert!(WindowAction::Maximize.placement().is_none());
        assert!(WindowAction::Minimize.placement().is_none());
        assert!(WindowAction::BackToDesktop.placement().is_none());
    }

    #[test]
    fn halves() {
        assert_eq!(target(WindowAction::LeftHalf), Rect::new(0, 0, 960, 1040));
        assert_eq!(target(WindowAction::RightHalf), Rect::new(960, 0, 960, 1040));
        assert_eq!(target(WindowAction::TopHalf), Rect::new(0, 0, 1920, 520));
        assert_eq!(target(WindowAction::BottomHalf), Rect::new(0, 520, 1920, 520));
    }

    #[test]
    fn quadrants() {
        assert_eq!(target(WindowAction::TopLeftQuadrant), Rect::new(0, 0, 960, 520));
        assert_eq!(target(WindowAction::TopRightQuadrant), Rect::new(960, 0, 960, 520));
        assert_eq!(target(WindowAction::BottomLeftQuadrant), Rect::new(0, 520, 960, 520));
        assert_eq!(
            target(WindowAction::BottomRightQuadrant),
            Rect::new(960, 520, 960, 520)
        );
    }

    #[test]
    fn two_thirds_favour_the_requested_side() {
        assert_eq!(target(WindowAction::LeftTwoThirds), Rect::new(0, 0, 1280, 1040));
        assert_eq!(target(WindowAction::RightTwoThirds), Rect::new(640, 0, 1280, 1040));
    }

    #[test]
    fn placements_follow_work_area_origin() {
        // Secondary monitor left of the primary, taskbar on top
        let work = Rect::new(-1280, 40, 1280, 984);
        let rect = WindowAction::BottomRightQuadrant
            .placement()
            .expect("geometric action")
            .target_rect(work);
        assert_eq!(rect, Rect::new(-640, 532, 640, 492));
    }

    #[test]
    fn odd_lengths_end_flush() {
        let (start, len) = Span::SecondHalf.resolve(0, 1365);
        assert_eq!(start + len, 1365);
        let (start, len) = Span::LastTwoThirds.resolve(10, 1001);
        assert_eq!(start + len, 1011);
    }

    #[test]
    fn default_mapping() {
        let mapping = ActionMapping::default();
        let at = |i| mapping.get(SectorIndex::new(i).expect("in range"));

        assert_eq!(at(0), Some(WindowAction::Maximize));
        assert_eq!(at(3), Some(WindowAction::BackToDesktop));
        assert_eq!(at(7), Some(WindowAction::TopLeftQuadrant));
        assert!(mapping.slots.iter().all(Option::is_some));
    }

    #[test]
    fn mapping_can_clear_a_sector() {
        let mut mapping = ActionMapping::default();
        let sector = SectorIndex::new(4).expect("in range");
        mapping.set(sector, None);
        assert_eq!(mapping.get(sector), None);
        assert_eq!(mapping.slots.iter().filter(|slot| slot.is_none()).count(), 1);
    }

    #[test]
    fn action_names_parse() {
        for action in WindowAction::ALL {
            assert_eq!(action.name().parse::<WindowAction>(), Ok(action));
        }
        assert!("center".parse::<WindowAction>().is_err());
    }
}
