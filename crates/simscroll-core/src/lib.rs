pub mod config;
pub mod controller;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod event;
pub mod geometry;
pub mod interaction;
pub mod interceptor;
pub mod platform;
pub mod watchdog;
pub mod windows;

pub use config::{AppConfig, BezelInsets, ScrollConfig};
pub use controller::{InteractionController, InteractionPhase, ScrollDisposition, StepTimer};
pub use emitter::{InputSink, RecordingSink, SyntheticEvent, SyntheticKind};
pub use engine::{EngineInput, ScrollEngine};
pub use error::{Error, Result};
pub use event::{EndReason, InteractionEvent, KeyEvent, MomentumPhase, ScrollEvent};
pub use geometry::{Point, Rect};
pub use windows::{StaticWindowSource, WindowInfo, WindowLayout, WindowSource};
