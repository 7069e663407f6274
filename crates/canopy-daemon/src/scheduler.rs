//! Capture scheduling.
//!
//! Three triggers feed one capture worker: the periodic tick (gated on
//! `capture_enabled`), pull-requests forwarded by the transport (served even
//! while periodic capture is disabled), and manual requests. The trigger
//! channel holds exactly one entry — a trigger arriving while a capture is in
//! flight queues at most one follow-up capture, and anything beyond that
//! coalesces into the pending one. An in-flight capture is never preempted;
//! disabling capture takes effect at the next tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use canopy_capture::assembler::capture_forest;
use canopy_capture::source::AccessibilitySource;
use canopy_core::event::UiEvent;
use canopy_core::flags::CaptureFlags;
use canopy_transport::sink::ForestSink;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// What asked for a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTrigger {
    /// Periodic tick while capture is enabled.
    Tick,
    /// Pull-request from the controller.
    Pull,
    /// Local caller (tooling, tests).
    Manual,
}

impl CaptureTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureTrigger::Tick => "tick",
            CaptureTrigger::Pull => "pull",
            CaptureTrigger::Manual => "manual",
        }
    }
}

pub type TriggerSender = mpsc::Sender<CaptureTrigger>;
pub type TriggerReceiver = mpsc::Receiver<CaptureTrigger>;

/// The capacity-1 trigger channel: at most one capture pending behind the
/// in-flight one.
pub fn trigger_channel() -> (TriggerSender, TriggerReceiver) {
    mpsc::channel(1)
}

/// Fire a trigger, coalescing into an already-pending capture when the queue
/// is full. Returns `false` once the worker is gone.
pub fn fire(triggers: &TriggerSender, trigger: CaptureTrigger) -> bool {
    match triggers.try_send(trigger) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            debug!(trigger = trigger.as_str(), "capture already pending, coalesced");
            true
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

/// Periodic ticker. Re-reads the period every lap, so a control-plane change
/// applies from the next tick; a disable stops the tick after at most one
/// period.
pub async fn run_ticker(
    flags: &'static CaptureFlags,
    triggers: TriggerSender,
    stop: Arc<AtomicBool>,
) {
    info!("capture ticker started");
    loop {
        tokio::time::sleep(flags.capture_period()).await;
        if stop.load(Ordering::Relaxed) {
            break;
        }
        if !flags.capture_enabled() {
            continue;
        }
        if !fire(&triggers, CaptureTrigger::Tick) {
            break;
        }
    }
    info!("capture ticker stopped");
}

/// Forward transport pull notifications into the trigger channel.
pub async fn bridge_pulls(mut pulls: mpsc::Receiver<()>, triggers: TriggerSender) {
    while pulls.recv().await.is_some() {
        if !fire(&triggers, CaptureTrigger::Pull) {
            break;
        }
    }
}

/// Forward discrete UI events from the platform integration to the sink.
///
/// Events are pushed as they arrive, independently of the capture period —
/// only forests are tied to the tick.
pub async fn run_event_pump(mut events: mpsc::Receiver<UiEvent>, sink: Arc<dyn ForestSink>) {
    while let Some(event) = events.recv().await {
        if let Err(err) = sink.push_event(event.into_wire_map()).await {
            warn!("event not delivered: {err}");
        }
    }
    info!("event pump stopped");
}

/// The capture worker: owns the source, serves triggers one at a time.
///
/// The walk is synchronous platform work, so it runs on the blocking pool;
/// the worker gets the source back when the walk finishes. Every completed
/// forest is handed to the sink — delivery failures are logged, never fatal
/// to the worker.
pub async fn run_capture_worker<S>(
    source: S,
    mut triggers: TriggerReceiver,
    sink: Arc<dyn ForestSink>,
) -> Result<()>
where
    S: AccessibilitySource + Send + 'static,
{
    let mut source = Some(source);
    while let Some(trigger) = triggers.recv().await {
        let started = Instant::now();
        let mut owned = source.take().expect("source returned after every walk");
        let (returned, forest) = tokio::task::spawn_blocking(move || {
            let forest = capture_forest(&mut owned);
            (owned, forest)
        })
        .await?;
        source = Some(returned);

        debug!(
            trigger = trigger.as_str(),
            windows = forest.window_count(),
            nodes = forest.total_nodes(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "capture complete"
        );

        if let Err(err) = sink.push_forest(forest).await {
            warn!("forest not delivered: {err}");
        }
    }
    info!("capture worker stopped");
    Ok(())
}
