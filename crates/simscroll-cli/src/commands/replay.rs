use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{info, warn};

use simscroll_core::{
    AppConfig, EngineInput, InputSink, InteractionEvent, KeyEvent, RecordingSink, ScrollEngine,
    ScrollEvent, StaticWindowSource, SyntheticEvent, WindowLayout, WindowSource,
};

/// A recorded session: window geometry plus timestamped platform input
#[derive(Debug, Deserialize)]
pub struct Trace {
    #[serde(flatten)]
    pub layout: WindowLayout,
    #[serde(default)]
    pub events: Vec<TraceEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraceEvent {
    /// Offset from the start of the replay
    pub at_ms: u64,
    #[serde(flatten)]
    pub input: TraceInput,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceInput {
    Scroll(ScrollEvent),
    Key(KeyEvent),
}

impl From<TraceInput> for EngineInput {
    fn from(input: TraceInput) -> Self {
        match input {
            TraceInput::Scroll(event) => EngineInput::Scroll(event),
            TraceInput::Key(event) => EngineInput::Key(event),
        }
    }
}

impl Trace {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut trace: Trace = serde_json::from_str(content).context("Invalid trace")?;
        trace.events.sort_by_key(|event| event.at_ms);
        Ok(trace)
    }
}

pub async fn run(config: AppConfig, path: &Path, live: bool) -> Result<()> {
    let trace = Trace::load(path)?;
    info!(
        "Replaying {} events against {} windows",
        trace.events.len(),
        trace.layout.windows.len()
    );

    if live {
        return run_live(config, &trace).await;
    }

    let sink = RecordingSink::new();
    let source = StaticWindowSource::new(trace.layout.clone());
    let notifications = drive(config, source, sink.clone(), &trace.events).await;

    print_synthetic(&sink.events());
    print_notifications(&notifications)
}

#[cfg(target_os = "macos")]
async fn run_live(config: AppConfig, trace: &Trace) -> Result<()> {
    use simscroll_core::platform::{CoreGraphicsSink, CoreGraphicsWindows};

    let notifications = drive(
        config,
        CoreGraphicsWindows::new(),
        CoreGraphicsSink::new(),
        &trace.events,
    )
    .await;
    print_notifications(&notifications)
}

#[cfg(not(target_os = "macos"))]
async fn run_live(_config: AppConfig, _trace: &Trace) -> Result<()> {
    anyhow::bail!("--live is only supported on macOS")
}

/// Feed the trace to an engine and collect its notifications
///
/// After the last event the engine keeps running for the inactivity timeout
/// plus the snap-back delay, so every drag has ended before shutdown.
async fn drive<W: WindowSource, S: InputSink>(
    config: AppConfig,
    source: W,
    sink: S,
    events: &[TraceEvent],
) -> Vec<InteractionEvent> {
    let settle = config.scroll.inactivity_timeout() + config.scroll.snap_back_delay();

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let engine = ScrollEngine::new(config, source, sink).with_event_sender(event_tx);
    let (input_tx, input_rx) = mpsc::channel(64);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let feed = async move {
        let start = Instant::now();
        for event in events {
            tokio::time::sleep_until(start + Duration::from_millis(event.at_ms)).await;
            if input_tx.send(event.input.clone().into()).await.is_err() {
                warn!("Scroll engine stopped before the trace ended");
                return;
            }
        }

        tokio::time::sleep(settle).await;
        if shutdown_tx.send(true).is_err() {
            warn!("Scroll engine already stopped");
        }
    };

    let (engine, ()) = tokio::join!(engine.run(input_rx, shutdown_rx), feed);
    drop(engine);

    std::iter::from_fn(|| event_rx.try_recv().ok()).collect()
}

fn print_synthetic(events: &[SyntheticEvent]) {
    println!("Synthetic events ({}):", events.len());
    for event in events {
        println!(
            "  {:<10} ({:.1}, {:.1})",
            event.kind.as_str(),
            event.point.x,
            event.point.y
        );
    }
}

fn print_notifications(notifications: &[InteractionEvent]) -> Result<()> {
    println!("Interactions ({}):", notifications.len());
    for notification in notifications {
        println!("  {}", serde_json::to_string(notification)?);
    }
    Ok(())
}
