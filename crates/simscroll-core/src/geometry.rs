//! Screen-space geometry primitives
//!
//! Window frames use the window server's coordinate space (origin at the
//! top-left of the primary display, y growing downward). Screen frames and
//! raw cursor locations use the AppKit space (origin bottom-left, y growing
//! upward); [`flip_to_top_left`] converts between the two.

use serde::{Deserialize, Serialize};

use crate::config::BezelInsets;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Same x, y shifted by `dy`
    #[inline]
    pub fn offset_y(self, dy: f64) -> Self {
        Self::new(self.x, self.y + dy)
    }
}

/// Axis-aligned rectangle with origin at its minimum corner
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Half-open containment: the minimum edges are inside, the maximum edges are not
    pub fn contains(&self, point: Point) -> bool {
        !self.is_empty()
            && point.x >= self.x
            && point.x < self.max_x()
            && point.y >= self.y
            && point.y < self.max_y()
    }

    /// Overlap with positive area; rectangles that only share an edge do not intersect
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let max_x = self.max_x().min(other.max_x());
        let max_y = self.max_y().min(other.max_y());

        let rect = Rect::new(x, y, max_x - x, max_y - y);
        (!rect.is_empty()).then_some(rect)
    }

    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }

    /// Shrink by the given insets. The result may be empty for oversized insets.
    pub fn inset(&self, insets: &BezelInsets) -> Rect {
        Rect::new(
            self.x + insets.left,
            self.y + insets.top,
            self.width - (insets.left + insets.right),
            self.height - (insets.top + insets.bottom),
        )
    }

    /// Height divided by width; infinite for zero-width rectangles
    pub fn height_to_width(&self) -> f64 {
        if self.width == 0.0 {
            f64::INFINITY
        } else {
            self.height / self.width
        }
    }
}

/// The screen under the cursor, falling back to the first screen
///
/// Both `cursor` and `screens` are in AppKit (bottom-left origin) coordinates.
pub fn screen_containing(cursor: Point, screens: &[Rect]) -> Option<&Rect> {
    screens
        .iter()
        .find(|screen| screen.contains(cursor))
        .or_else(|| screens.first())
}

/// Convert an AppKit cursor location to top-left-origin screen coordinates
///
/// Without any known screen the origin is returned.
pub fn flip_to_top_left(cursor: Point, screens: &[Rect]) -> Point {
    match screen_containing(cursor, screens) {
        Some(screen) => Point::new(cursor.x, screen.height - cursor.y),
        None => Point::ZERO,
    }
}
