//! Scroll engine event loop
//!
//! Owns the controller, the inactivity watchdog and the cancel-key
//! interceptor, and drives them from a single task: platform input, the
//! stepping timer, the watchdog deadline and the snap-back delay are all
//! branches of one `select!`, so no two handlers ever run concurrently.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::controller::{InteractionController, ScrollDisposition, StepTimer};
use crate::emitter::InputSink;
use crate::event::{EndReason, InteractionEvent, KeyEvent, ScrollEvent};
use crate::interceptor::CancelKeyInterceptor;
use crate::watchdog::ActivityWatchdog;
use crate::windows::WindowSource;

/// Interval periods below this are clamped; a zero period is invalid
const MIN_TICK: Duration = Duration::from_millis(1);

/// Input delivered to the engine
#[derive(Debug, Clone)]
pub enum EngineInput {
    Scroll(ScrollEvent),
    Key(KeyEvent),
    UpdateConfig(AppConfig),
    /// Override whether momentum events may start a drag
    SetMomentumAllowed(bool),
}

pub struct ScrollEngine<W, S> {
    controller: InteractionController<W, S>,
    watchdog: ActivityWatchdog,
    interceptor: CancelKeyInterceptor,
}

impl<W: WindowSource, S: InputSink> ScrollEngine<W, S> {
    pub fn new(config: AppConfig, source: W, sink: S) -> Self {
        let watchdog = ActivityWatchdog::new(config.scroll.inactivity_timeout());
        let interceptor = CancelKeyInterceptor::new(config.scroll.cancel_key);
        Self {
            controller: InteractionController::new(config, source, sink),
            watchdog,
            interceptor,
        }
    }

    /// Set the event sender for interaction notifications
    pub fn with_event_sender(mut self, tx: mpsc::UnboundedSender<InteractionEvent>) -> Self {
        self.controller.set_event_sender(tx);
        self
    }

    pub fn controller(&self) -> &InteractionController<W, S> {
        &self.controller
    }

    pub fn watchdog(&self) -> &ActivityWatchdog {
        &self.watchdog
    }

    /// Dispatch one input
    pub fn handle_input(&mut self, input: EngineInput, now: Instant) {
        match input {
            EngineInput::Scroll(event) => {
                let disposition = self.controller.on_scroll(&event);
                if disposition.is_activity() {
                    self.watchdog.pulse(now);
                }
                if disposition == ScrollDisposition::Draining {
                    debug!("Draining at {:?}", self.controller.timer().period());
                }
            }
            EngineInput::Key(event) => {
                self.interceptor.on_key(&mut self.controller, &event);
            }
            EngineInput::UpdateConfig(config) => {
                self.watchdog.set_timeout(config.scroll.inactivity_timeout());
                self.interceptor.set_cancel_key(config.scroll.cancel_key);
                self.controller.update_config(config);
                info!(
                    enabled = self.controller.config().scroll.enabled,
                    steps = self.controller.config().scroll.steps(),
                    "Configuration updated"
                );
            }
            EngineInput::SetMomentumAllowed(allowed) => {
                self.controller.set_momentum_allowed(allowed);
            }
        }
    }

    /// Process input until shutdown or until every input sender is dropped
    ///
    /// Any drag still in progress is released before returning.
    pub async fn run(
        mut self,
        mut inputs: mpsc::Receiver<EngineInput>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Self {
        let scroll = &self.controller.config().scroll;
        info!(
            "Scroll engine started: steps={}, interval={:?}, timeout={:?}",
            scroll.steps(),
            scroll.stepping_interval(),
            scroll.inactivity_timeout()
        );

        let mut ticker: Option<Interval> = None;
        let mut armed_generation = self.controller.timer_generation();
        let mut snap_back_at: Option<Instant> = None;

        if *shutdown.borrow() {
            info!("Scroll engine shut down before start");
            return self;
        }

        loop {
            let watchdog_deadline = self.watchdog.deadline();

            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Scroll engine received shutdown signal");
                        break;
                    }
                }

                input = inputs.recv() => {
                    match input {
                        Some(input) => self.handle_input(input, Instant::now()),
                        None => {
                            info!("Input channel closed, stopping scroll engine");
                            break;
                        }
                    }
                }

                _ = next_tick(&mut ticker) => {
                    self.controller.on_timer_tick();
                }

                _ = sleep_until(watchdog_deadline) => {
                    if self.watchdog.expire(Instant::now())
                        && self.controller.terminate(EndReason::Inactive)
                    {
                        debug!("Scroll interaction timed out");
                    }
                }

                _ = sleep_until(snap_back_at) => {
                    snap_back_at = None;
                    self.controller.snap_back();
                }
            }

            if self.controller.timer_generation() != armed_generation {
                armed_generation = self.controller.timer_generation();
                ticker = build_ticker(self.controller.timer());
            }

            if !self.controller.snap_back_pending() {
                snap_back_at = None;
            } else if snap_back_at.is_none() {
                snap_back_at = Instant::now().checked_add(self.controller.config().scroll.snap_back_delay());
            }
        }

        self.controller.terminate(EndReason::Shutdown);
        info!("Scroll engine stopped");
        self
    }
}

fn build_ticker(timer: StepTimer) -> Option<Interval> {
    let period = timer.period()?.max(MIN_TICK);
    let start = Instant::now().checked_add(period)?;
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(interval)
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
