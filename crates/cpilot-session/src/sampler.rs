//! Frame sampler.
//!
//! Ticks on a fixed interval for the life of a session. Each tick grabs the
//! current frame and, if no detection pass is in flight, starts one. A pass
//! runs detection, classifies attention then emotion, and hands the event to
//! the state owner. At most one pass is in flight at any time, so events
//! reach the history log in tick order no matter how long the model takes.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace, Instrument};

use cpilot_models::InferenceEvent;
use cpilot_vision::{ClassificationPipeline, DetectorAdapter, FrameSource, VideoFrame};

use crate::logging::SessionLogger;
use crate::metrics;
use crate::state::SessionCommand;

/// Tick counters for one session.
#[derive(Debug, Default)]
pub struct SamplerStats {
    ticks: AtomicU64,
    passes: AtomicU64,
    skipped_busy: AtomicU64,
    skipped_no_frame: AtomicU64,
    discarded: AtomicU64,
}

/// Plain copy of [`SamplerStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TickCounters {
    /// Timer ticks observed
    pub ticks: u64,
    /// Detection passes started
    pub passes: u64,
    /// Ticks skipped because a pass was still running
    pub skipped_busy: u64,
    /// Ticks skipped because the video was not ready
    pub skipped_no_frame: u64,
    /// Passes that finished after the session stopped
    pub discarded: u64,
}

impl SamplerStats {
    pub fn counters(&self) -> TickCounters {
        TickCounters {
            ticks: self.ticks.load(Ordering::Relaxed),
            passes: self.passes.load(Ordering::Relaxed),
            skipped_busy: self.skipped_busy.load(Ordering::Relaxed),
            skipped_no_frame: self.skipped_no_frame.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// Busy flag guaranteeing a single in-flight detection pass.
#[derive(Debug, Clone, Default)]
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn try_acquire(&self) -> Option<InFlightPermit> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightPermit(Arc::clone(&self.0)))
    }
}

/// Held for the whole pass, including the hand-off to the state owner.
struct InFlightPermit(Arc<AtomicBool>);

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Shared by the tick loop and its passes.
pub(crate) struct PassContext {
    pub adapter: DetectorAdapter,
    pub pipeline: ClassificationPipeline,
    pub commands: mpsc::Sender<SessionCommand>,
    pub live: Arc<AtomicBool>,
    pub stats: Arc<SamplerStats>,
    pub logger: SessionLogger,
}

/// Run the tick loop until shutdown.
pub(crate) async fn run_sampler<S: FrameSource>(
    source: S,
    interval: Duration,
    ctx: Arc<PassContext>,
    mut shutdown: watch::Receiver<bool>,
) {
    // First analysis happens one full interval after start.
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let in_flight = InFlight::default();
    let mut next_sequence: u64 = 1;

    loop {
        tokio::select! {
            biased;

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                ctx.stats.ticks.fetch_add(1, Ordering::Relaxed);
                metrics::record_tick();

                let Some(frame) = source.current_frame() else {
                    ctx.stats.skipped_no_frame.fetch_add(1, Ordering::Relaxed);
                    metrics::record_skipped_tick("no_frame");
                    trace!(session_id = %ctx.logger.session_id(), "Video not ready, skipping tick");
                    continue;
                };

                let Some(permit) = in_flight.try_acquire() else {
                    ctx.stats.skipped_busy.fetch_add(1, Ordering::Relaxed);
                    metrics::record_skipped_tick("busy");
                    debug!(session_id = %ctx.logger.session_id(), "Detection pass still running, skipping tick");
                    continue;
                };

                let sequence = next_sequence;
                next_sequence += 1;
                ctx.stats.passes.fetch_add(1, Ordering::Relaxed);

                let pass_ctx = Arc::clone(&ctx);
                let span = ctx.logger.create_span();
                tokio::spawn(
                    async move {
                        let _permit = permit;
                        run_pass(&pass_ctx, frame, sequence).await;
                    }
                    .instrument(span),
                );
            }
        }
    }

    trace!(session_id = %ctx.logger.session_id(), "Sampler stopped");
}

/// One detection pass: detect, classify, hand off.
async fn run_pass(ctx: &PassContext, frame: VideoFrame, sequence: u64) {
    let timestamp = Utc::now();
    let result = ctx.adapter.detect(Some(&frame)).await;
    let classification = ctx.pipeline.classify(&result);

    if !ctx.live.load(Ordering::SeqCst) {
        ctx.stats.discarded.fetch_add(1, Ordering::Relaxed);
        metrics::record_discarded_pass();
        debug!(sequence, "Session stopped during detection, discarding result");
        return;
    }

    let event = InferenceEvent::new(
        sequence,
        timestamp,
        classification.emotion,
        classification.attention,
    );
    if ctx.commands.send(SessionCommand::Record(event)).await.is_err() {
        ctx.stats.discarded.fetch_add(1, Ordering::Relaxed);
        debug!(sequence, "State owner gone, discarding result");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_is_exclusive() {
        let in_flight = InFlight::default();
        let permit = in_flight.try_acquire().expect("first acquire");
        assert!(in_flight.try_acquire().is_none());

        drop(permit);
        assert!(in_flight.try_acquire().is_some());
    }

    #[test]
    fn test_counters_snapshot() {
        let stats = SamplerStats::default();
        stats.ticks.fetch_add(3, Ordering::Relaxed);
        stats.skipped_busy.fetch_add(1, Ordering::Relaxed);

        let counters = stats.counters();
        assert_eq!(counters.ticks, 3);
        assert_eq!(counters.skipped_busy, 1);
        assert_eq!(counters.passes, 0);
    }
}
