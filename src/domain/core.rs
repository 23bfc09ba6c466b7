//! Core geometric types
//!
//! Pure value types shared by the selection geometry, the placement math and
//! the platform layer. All coordinates are screen pixels.

/// Point in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: Point) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        dx.hypot(dy)
    }
}

/// Rectangle in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    /// Creates a new rectangle
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Creates a rectangle from its four edges
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    /// Returns the right edge coordinate
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Returns the bottom edge coordinate
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Returns true if the rectangle has no area
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }
}

/// Invisible border between a window's reported bounds and its visible frame
///
/// Every margin is measured inwards: a positive `left` means the visible
/// frame starts `left` pixels to the right of the reported rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameOffset {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl FrameOffset {
    pub const ZERO: FrameOffset = FrameOffset {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    /// Derives the offsets from the reported window rectangle and the
    /// rectangle that is actually rendered on screen
    pub fn between(reported: Rect, visible: Rect) -> Self {
        Self {
            left: visible.x - reported.x,
            top: visible.y - reported.y,
            right: reported.right() - visible.right(),
            bottom: reported.bottom() - visible.bottom(),
        }
    }

    /// Grows `target` outwards so that the visible frame, not the padded
    /// bounds, lands on `target`
    pub fn expand(&self, target: Rect) -> Rect {
        Rect::from_edges(
            target.x - self.left,
            target.y - self.top,
            target.right() + self.right,
            target.bottom() + self.bottom,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges() {
        let rect = Rect::new(10, 20, 100, 50);
        assert_eq!(rect.right(), 110);
        assert_eq!(rect.bottom(), 70);
        assert_eq!(Rect::from_edges(10, 20, 110, 70), rect);
        assert!(!rect.is_empty());
        assert!(Rect::new(0, 0, 0, 10).is_empty());
    }

    #[test]
    fn point_distance() {
        let a = Point::new(0, 0);
        let b = Point::new(3, 4);
        assert!((a.distance_to(b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn frame_offset_from_drop_shadow() {
        // Typical Windows 11 frame: 7px shadow left/right/bottom, none on top
        let reported = Rect::from_edges(93, 100, 1107, 807);
        let visible = Rect::from_edges(100, 100, 1100, 800);

        let offset = FrameOffset::between(reported, visible);
        assert_eq!(
            offset,
            FrameOffset {
                left: 7,
                top: 0,
                right: 7,
                bottom: 7
            }
        );
    }

    #[test]
    fn expand_grows_every_edge_outwards() {
        let offset = FrameOffset {
            left: 7,
            top: 0,
            right: 7,
            bottom: 7,
        };
        let target = Rect::new(0, 0, 960, 1040);

        assert_eq!(offset.expand(target), Rect::from_edges(-7, 0, 967, 1047));
        assert_eq!(FrameOffset::ZERO.expand(target), target);
    }

    #[test]
    fn repeated_placement_does_not_drift() {
        let border = FrameOffset {
            left: 8,
            top: 1,
            right: 8,
            bottom: 8,
        };
        // Simulated window: its visible frame is always the bounds minus the border
        let visible_of = |bounds: Rect| {
            Rect::from_edges(
                bounds.x + border.left,
                bounds.y + border.top,
                bounds.right() - border.right,
                bounds.bottom() - border.bottom,
            )
        };
        let target = Rect::new(0, 0, 960, 520);

        let mut bounds = Rect::new(300, 200, 640, 480);
        let mut placed = Vec::new();
        for _ in 0..2 {
            let offset = FrameOffset::between(bounds, visible_of(bounds));
            bounds = offset.expand(target);
            placed.push(bounds);
        }

        assert_eq!(placed[0], placed[1]);
        assert_eq!(visible_of(placed[1]), target);
    }
}
