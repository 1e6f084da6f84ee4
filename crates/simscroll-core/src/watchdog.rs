//! Inactivity watchdog
//!
//! Debounces scroll activity: once pulses stop arriving for the configured
//! timeout, the watchdog expires exactly once until the next pulse.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct ActivityWatchdog {
    timeout: Duration,
    /// None until the first pulse and after each expiry
    deadline: Option<Instant>,
}

impl ActivityWatchdog {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Takes effect from the next pulse
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Record activity and restart the quiet period
    ///
    /// A deadline past the clock's range never expires.
    pub fn pulse(&mut self, now: Instant) {
        self.deadline = now.checked_add(self.timeout);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the quiet period has elapsed; disarms on expiry
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
