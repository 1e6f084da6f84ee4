//! Synthetic pointer event output
//!
//! [`InputSink`] is the boundary to the platform's event-injection facility.
//! The controller only talks to it through [`SyntheticInput`], which logs and
//! swallows failures so a refused event never stalls the state machine.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{trace, warn};

use crate::geometry::Point;
use crate::Result;

/// Kind of synthetic pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticKind {
    MouseDown,
    MouseDrag,
    MouseUp,
    /// Cursor repositioning without a button event
    Warp,
}

impl SyntheticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyntheticKind::MouseDown => "mouse-down",
            SyntheticKind::MouseDrag => "mouse-drag",
            SyntheticKind::MouseUp => "mouse-up",
            SyntheticKind::Warp => "warp",
        }
    }
}

/// A posted synthetic event
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SyntheticEvent {
    pub kind: SyntheticKind,
    pub point: Point,
}

/// Platform event injection
///
/// Points are absolute, top-left-origin screen coordinates.
pub trait InputSink {
    fn post_mouse_down(&mut self, point: Point) -> Result<()>;

    fn post_mouse_drag(&mut self, point: Point) -> Result<()>;

    fn post_mouse_up(&mut self, point: Point) -> Result<()>;

    /// Move the cursor without pressing a button
    fn warp_cursor(&mut self, point: Point) -> Result<()>;
}

/// Failure-absorbing front for an [`InputSink`]
pub struct SyntheticInput<S> {
    sink: S,
}

impl<S: InputSink> SyntheticInput<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn post(&mut self, kind: SyntheticKind, point: Point) {
        trace!(kind = kind.as_str(), x = point.x, y = point.y, "Posting synthetic event");
        let result = match kind {
            SyntheticKind::MouseDown => self.sink.post_mouse_down(point),
            SyntheticKind::MouseDrag => self.sink.post_mouse_drag(point),
            SyntheticKind::MouseUp => self.sink.post_mouse_up(point),
            SyntheticKind::Warp => self.sink.warp_cursor(point),
        };

        if let Err(e) = result {
            warn!(kind = kind.as_str(), "Synthetic event not posted: {}", e);
        }
    }
}

/// Sink that records events in memory; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SyntheticEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything posted so far, oldest first
    pub fn events(&self) -> Vec<SyntheticEvent> {
        self.lock().clone()
    }

    pub fn kinds(&self) -> Vec<SyntheticKind> {
        self.lock().iter().map(|e| e.kind).collect()
    }

    pub fn count(&self, kind: SyntheticKind) -> usize {
        self.lock().iter().filter(|e| e.kind == kind).count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn record(&self, kind: SyntheticKind, point: Point) -> Result<()> {
        self.lock().push(SyntheticEvent { kind, point });
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SyntheticEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl InputSink for RecordingSink {
    fn post_mouse_down(&mut self, point: Point) -> Result<()> {
        self.record(SyntheticKind::MouseDown, point)
    }

    fn post_mouse_drag(&mut self, point: Point) -> Result<()> {
        self.record(SyntheticKind::MouseDrag, point)
    }

    fn post_mouse_up(&mut self, point: Point) -> Result<()> {
        self.record(SyntheticKind::MouseUp, point)
    }

    fn warp_cursor(&mut self, point: Point) -> Result<()> {
        self.record(SyntheticKind::Warp, point)
    }
}
