//! Emergency stop on the cancel key

use tracing::debug;

use crate::controller::InteractionController;
use crate::emitter::InputSink;
use crate::event::{EndReason, KeyEvent};
use crate::windows::WindowSource;

/// Releases the active drag when the cancel key is pressed
#[derive(Debug, Clone, Copy)]
pub struct CancelKeyInterceptor {
    cancel_key: u16,
}

impl CancelKeyInterceptor {
    pub fn new(cancel_key: u16) -> Self {
        Self { cancel_key }
    }

    pub fn cancel_key(&self) -> u16 {
        self.cancel_key
    }

    pub fn set_cancel_key(&mut self, cancel_key: u16) {
        self.cancel_key = cancel_key;
    }

    /// Returns whether the key was the cancel key
    pub fn on_key<W: WindowSource, S: InputSink>(
        &self,
        controller: &mut InteractionController<W, S>,
        event: &KeyEvent,
    ) -> bool {
        if event.key_code != self.cancel_key {
            return false;
        }

        // The momentum tail of the cancelled gesture must not restart the drag
        if controller.is_active() {
            controller.set_momentum_allowed(false);
        }

        if controller.terminate(EndReason::Cancelled) {
            debug!("Scroll interaction cancelled by key");
        }
        true
    }
}
