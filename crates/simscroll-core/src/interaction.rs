//! State of one synthetic drag

use serde::Serialize;

use crate::geometry::Point;

/// Tolerance for treating accumulated steps as having reached the target
pub const COMPLETION_EPSILON: f64 = 0.05;

/// An in-progress synthetic drag
///
/// Exists only between a posted mouse-down and its mouse-up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollInteraction {
    /// Where the drag started (top-left-origin screen coordinates)
    pub initial_point: Point,
    /// Total signed vertical delta requested so far
    pub target_delta: f64,
    /// Delta applied on each step
    pub delta_per_step: f64,
    /// Delta already applied through drag events
    pub delta_completed: f64,
}

impl ScrollInteraction {
    /// Start a drag at `point` covering `delta` over `steps` increments
    pub fn new(point: Point, delta: f64, steps: u32) -> Self {
        Self {
            initial_point: point,
            target_delta: delta,
            delta_per_step: delta / f64::from(steps.max(1)),
            delta_completed: 0.0,
        }
    }

    /// Add a scroll delta and spread the remaining distance over `steps`
    pub fn append_delta(&mut self, delta: f64, steps: u32) {
        self.target_delta += delta;
        self.delta_per_step = self.remaining() / f64::from(steps.max(1));
    }

    /// Distance still to cover
    #[inline]
    pub fn remaining(&self) -> f64 {
        self.target_delta - self.delta_completed
    }

    /// Whether the completed delta is within tolerance of the target
    ///
    /// A freshly created zero-delta interaction is not complete.
    pub fn is_complete(&self) -> bool {
        if self.delta_completed == 0.0 && self.target_delta == 0.0 {
            return false;
        }
        (self.delta_completed - self.target_delta).abs() < COMPLETION_EPSILON
    }

    /// Where the cursor currently is in the drag
    #[inline]
    pub fn current_point(&self) -> Point {
        self.initial_point.offset_y(self.delta_completed)
    }

    /// Where the next drag event goes
    #[inline]
    pub fn next_point(&self) -> Point {
        self.initial_point
            .offset_y(self.delta_completed + self.delta_per_step)
    }

    /// Record one step as applied and return the new drag position
    pub fn advance(&mut self) -> Point {
        let point = self.next_point();
        self.delta_completed += self.delta_per_step;
        point
    }
}
