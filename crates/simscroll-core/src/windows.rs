//! Target window location
//!
//! Queries the window server (through [`WindowSource`]) for the frames the
//! controller may drag inside, plus the parts of those frames covered by
//! windows stacked in front of them.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::BezelInsets;
use crate::geometry::{Point, Rect};
use crate::Result;

/// A visible window as reported by the window server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowInfo {
    /// Name of the owning application
    pub owner: String,
    /// Frame in top-left-origin coordinates
    pub frame: Rect,
    /// Window level; 0 is the normal application layer
    #[serde(default)]
    pub layer: i64,
}

impl WindowInfo {
    pub fn new(owner: impl Into<String>, frame: Rect) -> Self {
        Self {
            owner: owner.into(),
            frame,
            layer: 0,
        }
    }
}

/// Read-only access to the platform's window and display lists
pub trait WindowSource {
    /// On-screen windows, topmost first
    fn windows(&self) -> Result<Vec<WindowInfo>>;

    /// Display frames in bottom-left-origin coordinates
    fn screens(&self) -> Result<Vec<Rect>>;
}

/// Frames relevant to a single containment decision
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetFrames {
    /// Bezel-inset frames of every target window
    pub targets: Vec<Rect>,
    /// Portions of target frames covered by windows in front of them
    pub occluders: Vec<Rect>,
}

impl TargetFrames {
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn is_occluded(&self, point: Point) -> bool {
        self.occluders.iter().any(|frame| frame.contains(point))
    }

    /// First target frame under the point
    pub fn target_at(&self, point: Point) -> Option<&Rect> {
        self.targets.iter().find(|frame| frame.contains(point))
    }
}

/// Compute target and occluding frames from a front-to-back window list
pub fn locate_target(windows: &[WindowInfo], owner: &str, insets: &BezelInsets) -> TargetFrames {
    let visible: Vec<&WindowInfo> = windows.iter().filter(|w| w.layer == 0).collect();
    let mut frames = TargetFrames::default();

    for (index, window) in visible.iter().enumerate() {
        if window.owner != owner {
            continue;
        }

        let frame = window.frame.inset(insets);
        frames.targets.push(frame);

        frames.occluders.extend(
            visible[..index]
                .iter()
                .filter_map(|in_front| frame.intersection(&in_front.frame)),
        );
    }

    frames
}

/// Geometry provider that absorbs enumeration failures
pub struct TargetLocator<W> {
    source: W,
}

impl<W: WindowSource> TargetLocator<W> {
    pub fn new(source: W) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &W {
        &self.source
    }

    /// Target and occluding frames; empty when enumeration fails
    pub fn locate(&self, owner: &str, insets: &BezelInsets) -> TargetFrames {
        match self.source.windows() {
            Ok(windows) => locate_target(&windows, owner, insets),
            Err(e) => {
                warn!("Window enumeration failed: {}", e);
                TargetFrames::default()
            }
        }
    }

    /// Display frames; empty when enumeration fails
    pub fn screens(&self) -> Vec<Rect> {
        self.source.screens().unwrap_or_else(|e| {
            warn!("Screen enumeration failed: {}", e);
            Vec::new()
        })
    }
}

/// Snapshot of windows and screens that a [`StaticWindowSource`] reports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowLayout {
    #[serde(default)]
    pub screens: Vec<Rect>,
    /// Topmost first
    #[serde(default)]
    pub windows: Vec<WindowInfo>,
}

/// In-memory window source; clones share the same layout
#[derive(Debug, Clone, Default)]
pub struct StaticWindowSource {
    layout: Arc<Mutex<WindowLayout>>,
}

impl StaticWindowSource {
    pub fn new(layout: WindowLayout) -> Self {
        Self {
            layout: Arc::new(Mutex::new(layout)),
        }
    }

    /// Replace the reported layout, e.g. after a window moved
    pub fn set_layout(&self, layout: WindowLayout) {
        *self.lock() = layout;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WindowLayout> {
        self.layout.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WindowSource for StaticWindowSource {
    fn windows(&self) -> Result<Vec<WindowInfo>> {
        Ok(self.lock().windows.clone())
    }

    fn screens(&self) -> Result<Vec<Rect>> {
        Ok(self.lock().screens.clone())
    }
}
