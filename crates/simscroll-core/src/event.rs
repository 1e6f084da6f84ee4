//! Events flowing into and out of the engine

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::interaction::ScrollInteraction;

/// Momentum phase reported with a scroll-wheel event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumPhase {
    /// Scrolling driven directly by the user
    #[default]
    None,
    Began,
    /// The OS is still emitting decaying momentum events
    Changed,
    Ended,
}

/// A scroll-wheel event from the platform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollEvent {
    /// Cursor location in AppKit (bottom-left-origin) coordinates
    pub location: Point,
    /// Precise vertical scrolling delta
    pub delta_y: f64,
    #[serde(default)]
    pub momentum: MomentumPhase,
}

impl ScrollEvent {
    pub fn new(location: Point, delta_y: f64) -> Self {
        Self {
            location,
            delta_y,
            momentum: MomentumPhase::None,
        }
    }

    pub fn with_momentum(mut self, momentum: MomentumPhase) -> Self {
        self.momentum = momentum;
        self
    }
}

/// A key-up event from the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// macOS virtual key code
    pub key_code: u16,
}

/// Why an interaction ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// All requested delta was applied
    Completed,
    /// The cursor left the target and the remaining steps were drained
    LeftTarget,
    /// The cancel key was pressed
    Cancelled,
    /// No accepted scroll events within the inactivity timeout
    Inactive,
    /// The feature was switched off
    Disabled,
    /// The engine stopped
    Shutdown,
}

/// Notifications for passive observers such as a pointer indicator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InteractionEvent {
    Started {
        interaction: ScrollInteraction,
    },
    Updated {
        interaction: ScrollInteraction,
    },
    Ended {
        interaction: ScrollInteraction,
        reason: EndReason,
        /// Whether momentum events may start the next drag
        momentum_allowed: bool,
    },
}
