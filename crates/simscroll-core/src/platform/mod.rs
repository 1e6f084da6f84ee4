//! Platform backends for [`WindowSource`](crate::windows::WindowSource) and
//! [`InputSink`](crate::emitter::InputSink)

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "macos")]
pub use macos::{CoreGraphicsSink, CoreGraphicsWindows};
