//! Scroll-to-drag interaction controller
//!
//! Decides for every scroll event whether to start, extend, drain or end a
//! synthetic drag, and advances the drag on every timer tick. The controller
//! never sleeps: it describes the timer it wants through [`StepTimer`] and the
//! engine arms it.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::emitter::{InputSink, SyntheticInput, SyntheticKind};
use crate::event::{EndReason, InteractionEvent, MomentumPhase, ScrollEvent};
use crate::geometry::{flip_to_top_left, screen_containing, Point, Rect};
use crate::interaction::ScrollInteraction;
use crate::windows::{TargetFrames, TargetLocator, WindowSource};

/// Coarse controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionPhase {
    /// No drag in progress
    Idle,
    /// Drag in progress at the normal stepping cadence
    Dragging,
    /// Cursor left the target; remaining steps are being drained
    Settling,
}

/// Timer requested by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepTimer {
    Off,
    Stepping(Duration),
    Draining(Duration),
}

impl StepTimer {
    pub fn period(&self) -> Option<Duration> {
        match self {
            StepTimer::Off => None,
            StepTimer::Stepping(period) | StepTimer::Draining(period) => Some(*period),
        }
    }
}

/// What the controller did with a scroll event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDisposition {
    /// Feature disabled; any drag was released
    Disabled,
    /// Momentum event dropped after a manual abort
    MomentumSuppressed,
    /// Cursor is over a window stacked in front of the target
    Occluded,
    /// Cursor outside every target frame
    OutOfBounds,
    /// Cursor left the target mid-drag; draining started
    Draining,
    /// New drag started
    Started,
    /// Delta added to the active drag
    Updated,
}

impl ScrollDisposition {
    /// Whether the event counts as scroll activity for the watchdog
    pub fn is_activity(&self) -> bool {
        matches!(self, ScrollDisposition::Started | ScrollDisposition::Updated)
    }
}

pub struct InteractionController<W, S> {
    config: AppConfig,
    locator: TargetLocator<W>,
    input: SyntheticInput<S>,
    interaction: Option<ScrollInteraction>,
    settling: bool,
    momentum_allowed: bool,
    timer: StepTimer,
    /// Bumped on every arm or cancel so the engine can tell a re-arm from a no-op
    timer_generation: u64,
    snap_back: Option<Point>,
    event_tx: Option<mpsc::UnboundedSender<InteractionEvent>>,
}

impl<W: WindowSource, S: InputSink> InteractionController<W, S> {
    pub fn new(config: AppConfig, source: W, sink: S) -> Self {
        Self {
            config,
            locator: TargetLocator::new(source),
            input: SyntheticInput::new(sink),
            interaction: None,
            settling: false,
            momentum_allowed: true,
            timer: StepTimer::Off,
            timer_generation: 0,
            snap_back: None,
            event_tx: None,
        }
    }

    /// Set the sender for interaction notifications
    pub fn with_event_sender(mut self, tx: mpsc::UnboundedSender<InteractionEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn set_event_sender(&mut self, tx: mpsc::UnboundedSender<InteractionEvent>) {
        self.event_tx = Some(tx);
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn locator(&self) -> &TargetLocator<W> {
        &self.locator
    }

    pub fn sink(&self) -> &S {
        self.input.sink()
    }

    pub fn interaction(&self) -> Option<&ScrollInteraction> {
        self.interaction.as_ref()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.interaction.is_some()
    }

    pub fn phase(&self) -> InteractionPhase {
        match (&self.interaction, self.settling) {
            (None, _) => InteractionPhase::Idle,
            (Some(_), false) => InteractionPhase::Dragging,
            (Some(_), true) => InteractionPhase::Settling,
        }
    }

    pub fn momentum_allowed(&self) -> bool {
        self.momentum_allowed
    }

    pub fn set_momentum_allowed(&mut self, allowed: bool) {
        self.momentum_allowed = allowed;
    }

    pub fn timer(&self) -> StepTimer {
        self.timer
    }

    pub fn timer_generation(&self) -> u64 {
        self.timer_generation
    }

    /// Replace the configuration; disabling releases any active drag
    pub fn update_config(&mut self, config: AppConfig) {
        self.config = config;

        if !self.config.scroll.enabled {
            self.terminate(EndReason::Disabled);
            return;
        }

        let wanted = match self.timer {
            StepTimer::Off => StepTimer::Off,
            StepTimer::Stepping(_) => StepTimer::Stepping(self.config.scroll.stepping_interval()),
            StepTimer::Draining(_) => StepTimer::Draining(self.config.scroll.drain_interval()),
        };
        if wanted != self.timer {
            self.arm_timer(wanted);
        }
    }

    /// Handle a scroll-wheel event
    pub fn on_scroll(&mut self, event: &ScrollEvent) -> ScrollDisposition {
        if !self.config.scroll.enabled {
            self.terminate(EndReason::Disabled);
            return ScrollDisposition::Disabled;
        }

        if event.momentum == MomentumPhase::Changed && !self.momentum_allowed {
            return ScrollDisposition::MomentumSuppressed;
        }

        // The wheel came to rest, so the next gesture may use momentum again
        if event.momentum == MomentumPhase::Ended {
            self.momentum_allowed = true;
        }

        let screens = self.locator.screens();
        let point = flip_to_top_left(event.location, &screens);
        let frames = self
            .locator
            .locate(&self.config.target.owner_name, &self.config.target.bezel);

        if frames.is_occluded(point) {
            return ScrollDisposition::Occluded;
        }

        if !self.accepts(point, event.location, &frames, &screens) {
            return self.leave_target();
        }

        let delta = if self.config.scroll.natural_scrolling {
            event.delta_y
        } else {
            -event.delta_y
        };
        let steps = self.config.scroll.steps();

        match self.interaction.as_mut() {
            Some(interaction) => {
                interaction.append_delta(delta, steps);
                let snapshot = *interaction;
                self.send_event(InteractionEvent::Updated {
                    interaction: snapshot,
                });
                ScrollDisposition::Updated
            }
            None => {
                let interaction = ScrollInteraction::new(point, delta, steps);
                self.interaction = Some(interaction);
                self.settling = false;
                self.snap_back = None;

                self.input.post(SyntheticKind::MouseDown, point);
                self.arm_timer(StepTimer::Stepping(self.config.scroll.stepping_interval()));

                debug!(x = point.x, y = point.y, delta, "Scroll interaction started");
                self.send_event(InteractionEvent::Started { interaction });
                ScrollDisposition::Started
            }
        }
    }

    /// Advance the active drag by one step
    pub fn on_timer_tick(&mut self) {
        let Some(interaction) = self.interaction.as_mut() else {
            return;
        };

        if interaction.is_complete() {
            self.finish();
            return;
        }

        let point = interaction.advance();
        let reached = interaction.is_complete();
        self.input.post(SyntheticKind::MouseDrag, point);

        if reached {
            self.finish();
        }
    }

    /// Release the active drag, if any
    ///
    /// Returns whether an interaction was ended. Safe to call while idle.
    pub fn terminate(&mut self, reason: EndReason) -> bool {
        self.cancel_timer();
        self.settling = false;

        let Some(interaction) = self.interaction.take() else {
            return false;
        };

        self.input
            .post(SyntheticKind::MouseUp, interaction.current_point());
        self.snap_back = Some(interaction.initial_point);

        debug!(
            ?reason,
            target = interaction.target_delta,
            completed = interaction.delta_completed,
            "Scroll interaction ended"
        );
        self.send_event(InteractionEvent::Ended {
            interaction,
            reason,
            momentum_allowed: self.momentum_allowed,
        });
        true
    }

    /// Whether a cursor snap-back is waiting for its grace delay
    pub fn snap_back_pending(&self) -> bool {
        self.snap_back.is_some()
    }

    /// Move the cursor back to where the last drag started
    ///
    /// Skipped if a new drag started in the meantime.
    pub fn snap_back(&mut self) {
        let Some(point) = self.snap_back.take() else {
            return;
        };
        if self.interaction.is_none() {
            self.input.post(SyntheticKind::Warp, point);
        }
    }

    /// Containment test for the flipped cursor point
    fn accepts(&self, point: Point, cursor: Point, frames: &TargetFrames, screens: &[Rect]) -> bool {
        let Some(frame) = frames.target_at(point) else {
            return false;
        };
        let Some(screen) = screen_containing(cursor, screens) else {
            return false;
        };

        // Taller than the screen proportionally: the device is shown full screen
        // and the bezel has to be trimmed from the frame itself
        if frame.height_to_width() > screen.height_to_width() {
            return frame.inset(&self.config.target.bezel).contains(point);
        }

        true
    }

    fn leave_target(&mut self) -> ScrollDisposition {
        if self.interaction.is_none() {
            return ScrollDisposition::OutOfBounds;
        }

        // Keep the momentum tail from starting a fresh drag elsewhere
        self.momentum_allowed = false;

        if !self.settling {
            self.settling = true;
            self.arm_timer(StepTimer::Draining(self.config.scroll.drain_interval()));
            debug!("Cursor left target, draining remaining steps");
        }
        ScrollDisposition::Draining
    }

    fn finish(&mut self) {
        let reason = if self.settling {
            EndReason::LeftTarget
        } else {
            EndReason::Completed
        };
        self.terminate(reason);
    }

    fn arm_timer(&mut self, timer: StepTimer) {
        self.timer = timer;
        self.timer_generation += 1;
    }

    fn cancel_timer(&mut self) {
        if self.timer != StepTimer::Off {
            self.arm_timer(StepTimer::Off);
        }
    }

    fn send_event(&self, event: InteractionEvent) {
        if let Some(ref tx) = self.event_tx {
            if tx.send(event).is_err() {
                warn!("Failed to send interaction event: receiver dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::config::BezelInsets;
    use crate::emitter::RecordingSink;
    use crate::windows::{StaticWindowSource, WindowInfo, WindowLayout};

    const SCREEN: Rect = Rect::new(0.0, 0.0, 1440.0, 900.0);

    /// Windowed simulator: proportionally wider than the screen
    fn windowed_layout() -> WindowLayout {
        WindowLayout {
            screens: vec![SCREEN],
            windows: vec![WindowInfo::new("Simulator", Rect::new(100.0, 100.0, 600.0, 300.0))],
        }
    }

    fn config(steps: i64) -> AppConfig {
        let mut config = AppConfig::default();
        config.scroll.steps = steps;
        config.target.bezel = BezelInsets::ZERO;
        config
    }

    fn controller(
        config: AppConfig,
        layout: WindowLayout,
    ) -> (
        InteractionController<StaticWindowSource, RecordingSink>,
        StaticWindowSource,
        RecordingSink,
    ) {
        let source = StaticWindowSource::new(layout);
        let sink = RecordingSink::new();
        let controller = InteractionController::new(config, source.clone(), sink.clone());
        (controller, source, sink)
    }

    /// AppKit location for a top-left-origin point on the test screen
    fn cursor(x: f64, y: f64) -> Point {
        Point::new(x, SCREEN.height - y)
    }

    fn scroll_at(x: f64, y: f64, delta: f64) -> ScrollEvent {
        ScrollEvent::new(cursor(x, y), delta)
    }

    #[test]
    fn test_first_scroll_starts_interaction() {
        let (mut controller, _, sink) = controller(config(10), windowed_layout());

        let disposition = controller.on_scroll(&scroll_at(300.0, 300.0, 100.0));
        assert_eq!(disposition, ScrollDisposition::Started);
        assert_eq!(controller.phase(), InteractionPhase::Dragging);

        let interaction = controller.interaction().unwrap();
        assert_eq!(interaction.initial_point, Point::new(300.0, 300.0));
        assert_eq!(interaction.target_delta, 100.0);
        assert_eq!(interaction.delta_per_step, 10.0);
        assert_eq!(interaction.delta_completed, 0.0);

        assert_eq!(sink.kinds(), vec![SyntheticKind::MouseDown]);
        assert_eq!(sink.events()[0].point, Point::new(300.0, 300.0));
        assert_eq!(controller.timer(), StepTimer::Stepping(Duration::from_millis(15)));
    }

    #[test]
    fn test_ten_ticks_complete_interaction() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (controller, _, sink) = controller(config(10), windowed_layout());
        let mut controller = controller.with_event_sender(tx);

        controller.on_scroll(&scroll_at(300.0, 300.0, 100.0));
        for _ in 0..10 {
            controller.on_timer_tick();
        }

        assert!(!controller.is_active());
        assert_eq!(controller.timer(), StepTimer::Off);

        let kinds = sink.kinds();
        assert_eq!(kinds.len(), 12);
        assert_eq!(kinds[0], SyntheticKind::MouseDown);
        assert!(kinds[1..11].iter().all(|k| *k == SyntheticKind::MouseDrag));
        assert_eq!(kinds[11], SyntheticKind::MouseUp);
        assert_eq!(sink.events()[11].point, Point::new(300.0, 400.0));

        assert!(matches!(rx.try_recv(), Ok(InteractionEvent::Started { .. })));
        match rx.try_recv() {
            Ok(InteractionEvent::Ended {
                interaction,
                reason,
                momentum_allowed,
            }) => {
                assert_eq!(reason, EndReason::Completed);
                assert!(momentum_allowed);
                assert_eq!(interaction.delta_completed, 100.0);
                assert!(interaction.is_complete());
            }
            other => panic!("expected Ended, got {:?}", other),
        }

        // Further ticks do nothing
        controller.on_timer_tick();
        assert_eq!(sink.events().len(), 12);
    }

    #[test]
    fn test_drag_points_move_monotonically() {
        let (mut controller, _, sink) = controller(config(4), windowed_layout());
        controller.on_scroll(&scroll_at(300.0, 300.0, -40.0));
        for _ in 0..4 {
            controller.on_timer_tick();
        }

        let ys: Vec<f64> = sink
            .events()
            .iter()
            .filter(|e| e.kind == SyntheticKind::MouseDrag)
            .map(|e| e.point.y)
            .collect();
        assert_eq!(ys, vec![290.0, 280.0, 270.0, 260.0]);
        assert!(sink.events().iter().all(|e| e.point.x == 300.0));
    }

    #[test]
    fn test_second_scroll_recomputes_step() {
        let (mut controller, _, sink) = controller(config(10), windowed_layout());
        controller.on_scroll(&scroll_at(300.0, 300.0, 100.0));
        for _ in 0..3 {
            controller.on_timer_tick();
        }

        let disposition = controller.on_scroll(&scroll_at(310.0, 320.0, 50.0));
        assert_eq!(disposition, ScrollDisposition::Updated);

        let interaction = controller.interaction().unwrap();
        assert_eq!(interaction.target_delta, 150.0);
        assert!((interaction.delta_per_step - (150.0 - 30.0) / 10.0).abs() < 1e-9);
        // The drag keeps its original anchor
        assert_eq!(interaction.initial_point, Point::new(300.0, 300.0));
        assert_eq!(sink.count(SyntheticKind::MouseDown), 1);
    }

    #[test]
    fn test_natural_scrolling_off_inverts_delta() {
        let mut config = config(10);
        config.scroll.natural_scrolling = false;
        let (mut controller, _, _) = controller(config, windowed_layout());

        controller.on_scroll(&scroll_at(300.0, 300.0, 30.0));
        assert_eq!(controller.interaction().unwrap().target_delta, -30.0);
    }

    #[test]
    fn test_outside_target_is_ignored_when_idle() {
        let (mut controller, _, sink) = controller(config(10), windowed_layout());
        let disposition = controller.on_scroll(&scroll_at(50.0, 50.0, 10.0));
        assert_eq!(disposition, ScrollDisposition::OutOfBounds);
        assert!(!controller.is_active());
        assert!(sink.events().is_empty());
        assert!(controller.momentum_allowed());
    }

    #[test]
    fn test_missing_target_window_is_out_of_bounds() {
        let layout = WindowLayout {
            screens: vec![SCREEN],
            windows: vec![],
        };
        let (mut controller, _, _) = controller(config(10), layout);
        assert_eq!(
            controller.on_scroll(&scroll_at(300.0, 300.0, 10.0)),
            ScrollDisposition::OutOfBounds
        );
    }

    #[test]
    fn test_leaving_target_drains_remaining_steps() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (controller, _, sink) = controller(config(10), windowed_layout());
        let mut controller = controller.with_event_sender(tx);

        controller.on_scroll(&scroll_at(300.0, 300.0, 100.0));
        controller.on_timer_tick();
        controller.on_timer_tick();

        let disposition = controller.on_scroll(&scroll_at(900.0, 300.0, 10.0));
        assert_eq!(disposition, ScrollDisposition::Draining);
        assert_eq!(controller.phase(), InteractionPhase::Settling);
        assert!(!controller.momentum_allowed());
        assert_eq!(controller.timer(), StepTimer::Draining(Duration::from_millis(1)));
        // Delta from outside the target is not added
        assert_eq!(controller.interaction().unwrap().target_delta, 100.0);

        let generation = controller.timer_generation();
        controller.on_scroll(&scroll_at(900.0, 300.0, 10.0));
        assert_eq!(controller.timer_generation(), generation);

        for _ in 0..8 {
            controller.on_timer_tick();
        }
        assert!(!controller.is_active());
        assert_eq!(sink.count(SyntheticKind::MouseDrag), 10);
        assert_eq!(sink.count(SyntheticKind::MouseUp), 1);

        let ended = std::iter::from_fn(|| rx.try_recv().ok()).last();
        assert!(matches!(
            ended,
            Some(InteractionEvent::Ended { reason: EndReason::LeftTarget, .. })
        ));
    }

    #[test]
    fn test_occluding_window_blocks_scroll() {
        let layout = WindowLayout {
            screens: vec![SCREEN],
            windows: vec![
                WindowInfo::new("Notes", Rect::new(250.0, 250.0, 100.0, 100.0)),
                WindowInfo::new("Simulator", Rect::new(100.0, 100.0, 600.0, 500.0)),
            ],
        };
        let (mut controller, _, sink) = controller(config(10), layout);

        assert_eq!(
            controller.on_scroll(&scroll_at(300.0, 300.0, 10.0)),
            ScrollDisposition::Occluded
        );
        assert!(sink.events().is_empty());

        // Occlusion while dragging leaves the drag untouched
        assert_eq!(
            controller.on_scroll(&scroll_at(500.0, 500.0, 10.0)),
            ScrollDisposition::Started
        );
        assert_eq!(
            controller.on_scroll(&scroll_at(300.0, 300.0, 10.0)),
            ScrollDisposition::Occluded
        );
        assert_eq!(controller.phase(), InteractionPhase::Dragging);
        assert_eq!(controller.interaction().unwrap().target_delta, 10.0);
    }

    #[test]
    fn test_full_screen_target_requires_bezel_inset() {
        // Portrait frame on a landscape screen: taller proportionally than the screen
        let layout = WindowLayout {
            screens: vec![SCREEN],
            windows: vec![WindowInfo::new("Simulator", Rect::new(500.0, 0.0, 400.0, 880.0))],
        };
        let mut config = config(10);
        config.target.bezel = BezelInsets {
            top: 50.0,
            left: 20.0,
            right: 20.0,
            bottom: 50.0,
        };
        let (mut controller, _, _) = controller(config, layout);

        // Inside the located frame (520, 50, 360, 780) but within its bezel band
        assert_eq!(
            controller.on_scroll(&scroll_at(530.0, 300.0, 10.0)),
            ScrollDisposition::OutOfBounds
        );
        assert_eq!(
            controller.on_scroll(&scroll_at(700.0, 400.0, 10.0)),
            ScrollDisposition::Started
        );
    }

    #[test]
    fn test_windowed_target_skips_extra_inset() {
        let layout = WindowLayout {
            screens: vec![SCREEN],
            windows: vec![WindowInfo::new("Simulator", Rect::new(100.0, 100.0, 800.0, 400.0))],
        };
        let mut config = config(10);
        config.target.bezel = BezelInsets {
            top: 50.0,
            left: 20.0,
            right: 20.0,
            bottom: 50.0,
        };
        let (mut controller, _, _) = controller(config, layout);

        // Located frame is (120, 150, 760, 300); this point is within 20 of its left edge
        assert_eq!(
            controller.on_scroll(&scroll_at(130.0, 300.0, 10.0)),
            ScrollDisposition::Started
        );
    }

    #[test]
    fn test_no_screens_rejects() {
        let layout = WindowLayout {
            screens: vec![],
            windows: vec![WindowInfo::new("Simulator", Rect::new(0.0, 0.0, 600.0, 500.0))],
        };
        let (mut controller, _, _) = controller(config(10), layout);
        assert_eq!(
            controller.on_scroll(&ScrollEvent::new(Point::new(10.0, 10.0), 5.0)),
            ScrollDisposition::OutOfBounds
        );
    }

    #[test]
    fn test_disabled_terminates() {
        let (mut controller, _, sink) = controller(config(10), windowed_layout());
        controller.on_scroll(&scroll_at(300.0, 300.0, 100.0));
        controller.on_timer_tick();

        let mut disabled = controller.config().clone();
        disabled.scroll.enabled = false;
        controller.update_config(disabled);

        assert!(!controller.is_active());
        assert_eq!(sink.count(SyntheticKind::MouseUp), 1);
        assert_eq!(
            controller.on_scroll(&scroll_at(300.0, 300.0, 100.0)),
            ScrollDisposition::Disabled
        );
        assert_eq!(sink.count(SyntheticKind::MouseDown), 1);
    }

    #[test]
    fn test_momentum_suppression() {
        let (mut controller, _, sink) = controller(config(10), windowed_layout());
        controller.set_momentum_allowed(false);

        let momentum = scroll_at(300.0, 300.0, 8.0).with_momentum(MomentumPhase::Changed);
        assert_eq!(
            controller.on_scroll(&momentum),
            ScrollDisposition::MomentumSuppressed
        );
        assert!(sink.events().is_empty());

        // A plain scroll is still accepted
        assert_eq!(
            controller.on_scroll(&scroll_at(300.0, 300.0, 8.0)),
            ScrollDisposition::Started
        );

        let ended = scroll_at(300.0, 300.0, 0.0).with_momentum(MomentumPhase::Ended);
        controller.on_scroll(&ended);
        assert!(controller.momentum_allowed());
    }

    #[test]
    fn test_terminate_is_idempotent() {
        let (mut controller, _, sink) = controller(config(10), windowed_layout());
        assert!(!controller.terminate(EndReason::Cancelled));
        assert!(sink.events().is_empty());

        controller.on_scroll(&scroll_at(300.0, 300.0, 100.0));
        assert!(controller.terminate(EndReason::Cancelled));
        assert!(!controller.terminate(EndReason::Cancelled));
        assert_eq!(sink.count(SyntheticKind::MouseUp), 1);
    }

    #[test]
    fn test_snap_back_after_terminate() {
        let (mut controller, _, sink) = controller(config(10), windowed_layout());
        controller.on_scroll(&scroll_at(300.0, 300.0, 100.0));
        controller.on_timer_tick();
        controller.terminate(EndReason::Inactive);

        assert!(controller.snap_back_pending());
        controller.snap_back();
        assert!(!controller.snap_back_pending());

        let last = *sink.events().last().unwrap();
        assert_eq!(last.kind, SyntheticKind::Warp);
        assert_eq!(last.point, Point::new(300.0, 300.0));
    }

    #[test]
    fn test_new_interaction_cancels_snap_back() {
        let (mut controller, _, sink) = controller(config(10), windowed_layout());
        controller.on_scroll(&scroll_at(300.0, 300.0, 100.0));
        controller.terminate(EndReason::Cancelled);
        controller.on_scroll(&scroll_at(300.0, 300.0, 100.0));

        assert!(!controller.snap_back_pending());
        controller.snap_back();
        assert_eq!(sink.count(SyntheticKind::Warp), 0);
    }

    #[test]
    fn test_zero_steps_config_does_not_divide_by_zero() {
        let (mut controller, _, _) = controller(config(0), windowed_layout());
        controller.on_scroll(&scroll_at(300.0, 300.0, 25.0));
        let interaction = controller.interaction().unwrap();
        assert_eq!(interaction.delta_per_step, 25.0);
        controller.on_timer_tick();
        assert!(!controller.is_active());
    }

    #[test]
    fn test_interval_change_rearms_stepping_timer() {
        let (mut controller, _, _) = controller(config(10), windowed_layout());
        controller.on_scroll(&scroll_at(300.0, 300.0, 100.0));
        let generation = controller.timer_generation();

        let mut faster = controller.config().clone();
        faster.scroll.stepping_interval_secs = 0.005;
        controller.update_config(faster);

        assert_eq!(controller.timer(), StepTimer::Stepping(Duration::from_millis(5)));
        assert!(controller.timer_generation() > generation);
    }

    #[test]
    fn test_interval_change_rearms_draining_timer() {
        let (mut controller, _, _) = controller(config(10), windowed_layout());
        controller.on_scroll(&scroll_at(300.0, 300.0, 100.0));
        controller.on_scroll(&scroll_at(900.0, 300.0, 10.0));
        let generation = controller.timer_generation();

        // A stepping change does not disturb the drain cadence
        let mut updated = controller.config().clone();
        updated.scroll.stepping_interval_secs = 0.005;
        controller.update_config(updated.clone());
        assert_eq!(controller.timer(), StepTimer::Draining(Duration::from_millis(1)));
        assert_eq!(controller.timer_generation(), generation);

        updated.scroll.drain_interval_secs = 0.002;
        controller.update_config(updated);
        assert_eq!(controller.timer(), StepTimer::Draining(Duration::from_millis(2)));
        assert!(controller.timer_generation() > generation);
    }

    #[test]
    fn test_target_window_closing_mid_drag_drains() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (controller, source, sink) = controller(config(10), windowed_layout());
        let mut controller = controller.with_event_sender(tx);

        controller.on_scroll(&scroll_at(300.0, 300.0, 100.0));
        controller.on_timer_tick();

        source.set_layout(WindowLayout {
            screens: vec![SCREEN],
            windows: vec![WindowInfo::new("Finder", Rect::new(0.0, 0.0, 800.0, 800.0))],
        });
        assert_eq!(
            controller.on_scroll(&scroll_at(300.0, 300.0, 10.0)),
            ScrollDisposition::Draining
        );
        assert_eq!(controller.timer(), StepTimer::Draining(Duration::from_millis(1)));

        for _ in 0..9 {
            controller.on_timer_tick();
        }
        assert!(!controller.is_active());
        assert_eq!(sink.count(SyntheticKind::MouseUp), 1);

        let ended = std::iter::from_fn(|| rx.try_recv().ok()).last();
        assert!(matches!(
            ended,
            Some(InteractionEvent::Ended {
                reason: EndReason::LeftTarget,
                momentum_allowed: false,
                ..
            })
        ));
    }

    /// Window source whose enumeration can be switched to failing
    #[derive(Clone)]
    struct FlakySource {
        layout: StaticWindowSource,
        failing: Arc<AtomicBool>,
    }

    impl WindowSource for FlakySource {
        fn windows(&self) -> crate::Result<Vec<WindowInfo>> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(crate::Error::WindowEnumeration("window server unavailable".into()));
            }
            self.layout.windows()
        }

        fn screens(&self) -> crate::Result<Vec<Rect>> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(crate::Error::WindowEnumeration("no displays".into()));
            }
            self.layout.screens()
        }
    }

    #[test]
    fn test_enumeration_failure_mid_drag_drains() {
        let failing = Arc::new(AtomicBool::new(false));
        let source = FlakySource {
            layout: StaticWindowSource::new(windowed_layout()),
            failing: failing.clone(),
        };
        let sink = RecordingSink::new();
        let mut controller = InteractionController::new(config(10), source, sink.clone());

        assert_eq!(
            controller.on_scroll(&scroll_at(300.0, 300.0, 100.0)),
            ScrollDisposition::Started
        );

        failing.store(true, Ordering::SeqCst);
        assert_eq!(
            controller.on_scroll(&scroll_at(300.0, 300.0, 10.0)),
            ScrollDisposition::Draining
        );
        assert_eq!(controller.timer(), StepTimer::Draining(Duration::from_millis(1)));

        for _ in 0..10 {
            controller.on_timer_tick();
        }
        assert!(!controller.is_active());
        assert_eq!(sink.count(SyntheticKind::MouseDrag), 10);
        assert_eq!(sink.count(SyntheticKind::MouseUp), 1);
    }

    #[test]
    fn test_return_to_target_while_draining_appends_delta() {
        let (mut controller, _, sink) = controller(config(10), windowed_layout());
        controller.on_scroll(&scroll_at(300.0, 300.0, 100.0));
        controller.on_timer_tick();
        controller.on_scroll(&scroll_at(900.0, 300.0, 10.0));
        let generation = controller.timer_generation();

        assert_eq!(
            controller.on_scroll(&scroll_at(300.0, 300.0, 50.0)),
            ScrollDisposition::Updated
        );
        assert_eq!(controller.phase(), InteractionPhase::Settling);
        assert_eq!(controller.timer(), StepTimer::Draining(Duration::from_millis(1)));
        assert_eq!(controller.timer_generation(), generation);

        let interaction = controller.interaction().unwrap();
        assert_eq!(interaction.target_delta, 150.0);
        assert_eq!(interaction.delta_per_step, 14.0);

        for _ in 0..10 {
            controller.on_timer_tick();
        }
        assert!(!controller.is_active());
        assert_eq!(sink.count(SyntheticKind::MouseDrag), 11);
        assert_eq!(sink.events().last().unwrap().point, Point::new(300.0, 450.0));
    }
}
