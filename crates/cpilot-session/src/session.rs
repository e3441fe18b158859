//! Interview session lifecycle.
//!
//! `InterviewSession` holds the validated configuration and the detector.
//! Each `start` spawns three tasks with fresh state (sampler, jitter, state
//! owner) and returns a `SessionHandle`; `stop` tears them down. Nothing is
//! shared between two runs, so restarting always begins with an empty log
//! and the initial confidence score.

use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{warn, Instrument};

use cpilot_models::{InferenceEvent, SessionId, SessionStatus};
use cpilot_vision::{ClassificationPipeline, DetectorAdapter, FaceDetector, FrameSource};

use crate::config::SessionConfig;
use crate::consumer::{spawn_consumer, SessionConsumer};
use crate::error::{SessionError, SessionResult};
use crate::jitter::run_jitter;
use crate::logging::SessionLogger;
use crate::metrics;
use crate::sampler::{run_sampler, PassContext, SamplerStats, TickCounters};
use crate::state::{run_state, SessionSnapshot, SessionState, SessionUpdate, StateOutputs};

/// Commands buffered between the timers and the state owner.
const COMMAND_BUFFER: usize = 32;

/// Factory for interview sessions sharing one detector and configuration.
#[derive(Clone)]
pub struct InterviewSession {
    config: SessionConfig,
    adapter: DetectorAdapter,
    pipeline: ClassificationPipeline,
}

impl InterviewSession {
    /// Validate `config` and bind it to a detector.
    ///
    /// Misconfiguration fails here, before any sampling starts.
    pub fn new(config: SessionConfig, detector: Arc<dyn FaceDetector>) -> SessionResult<Self> {
        config.validate()?;
        Ok(Self {
            adapter: DetectorAdapter::new(detector, config.detector),
            pipeline: ClassificationPipeline::new(config.attention, config.overrides),
            config,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start sampling `source` in a new session.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<S>(&self, source: S) -> SessionResult<SessionHandle>
    where
        S: FrameSource + 'static,
    {
        let session_id = SessionId::new();
        let logger = SessionLogger::new(&session_id, "session");
        let state = SessionState::new(session_id.clone(), &self.config)?;

        let live = Arc::new(AtomicBool::new(true));
        let (shutdown, _) = watch::channel(false);
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshots_tx, snapshots_rx) = watch::channel(state.snapshot());
        let (updates_tx, _) = broadcast::channel(self.config.update_buffer);
        let stats = Arc::new(SamplerStats::default());

        let state_task = tokio::spawn(
            run_state(
                state,
                commands_rx,
                shutdown.subscribe(),
                Arc::clone(&live),
                StateOutputs {
                    snapshots: snapshots_tx,
                    updates: updates_tx.clone(),
                },
                logger.for_component("state"),
            )
            .instrument(logger.for_component("state").create_span()),
        );

        let jitter_task = tokio::spawn(
            run_jitter(
                self.config.confidence.jitter_interval,
                self.config.confidence.jitter_step,
                commands_tx.clone(),
                shutdown.subscribe(),
            )
            .instrument(logger.for_component("jitter").create_span()),
        );

        let pass_ctx = Arc::new(PassContext {
            adapter: self.adapter.clone(),
            pipeline: self.pipeline,
            commands: commands_tx,
            live: Arc::clone(&live),
            stats: Arc::clone(&stats),
            logger: logger.for_component("sampler"),
        });
        let sampler_task = tokio::spawn(
            run_sampler(source, self.config.sample_interval, pass_ctx, shutdown.subscribe())
                .instrument(logger.for_component("sampler").create_span()),
        );

        metrics::session_started();
        logger.log_start(&format!(
            "detector={}, interval={:?}, capacity={}",
            self.adapter.detector_name(),
            self.config.sample_interval,
            self.config.history_capacity
        ));

        Ok(SessionHandle {
            session_id,
            config: self.config.clone(),
            live,
            shutdown,
            snapshots: snapshots_rx,
            updates: updates_tx,
            stats,
            tasks: vec![sampler_task, jitter_task, state_task],
            logger,
        })
    }

    /// Stop `handle` and start a fresh session on `source`.
    pub async fn restart<S>(&self, handle: SessionHandle, source: S) -> SessionResult<SessionHandle>
    where
        S: FrameSource + 'static,
    {
        handle.stop().await?;
        self.start(source)
    }
}

/// A running session. Dropping it without `stop` aborts its tasks.
pub struct SessionHandle {
    session_id: SessionId,
    config: SessionConfig,
    live: Arc<AtomicBool>,
    shutdown: watch::Sender<bool>,
    snapshots: watch::Receiver<SessionSnapshot>,
    updates: broadcast::Sender<SessionUpdate>,
    stats: Arc<SamplerStats>,
    tasks: Vec<JoinHandle<()>>,
    logger: SessionLogger,
}

impl SessionHandle {
    pub fn id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn is_running(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Subscribe to per-tick updates from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.updates.subscribe()
    }

    /// Attach a consumer; it runs in its own task until the session stops.
    pub fn attach(&self, consumer: Arc<dyn SessionConsumer>) -> JoinHandle<()> {
        spawn_consumer(self.subscribe(), consumer)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// The last `n` events, most recent last.
    pub fn recent(&self, n: usize) -> Vec<InferenceEvent> {
        self.snapshots.borrow().recent_n(n).to_vec()
    }

    pub fn confidence(&self) -> i32 {
        self.snapshots.borrow().confidence
    }

    pub fn counters(&self) -> TickCounters {
        self.stats.counters()
    }

    /// Wait until the event with `sequence` (or a later one) is recorded.
    ///
    /// Returns `None` if the session stops first.
    pub async fn wait_for_sequence(&self, sequence: u64) -> Option<SessionSnapshot> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(|s| {
                s.status == SessionStatus::Stopped
                    || s.latest.is_some_and(|e| e.sequence >= sequence)
            })
            .await
            .ok()?
            .clone();

        (snapshot.status != SessionStatus::Stopped).then_some(snapshot)
    }

    /// Stop the session and return its final state.
    ///
    /// Results of a detection pass still in flight are discarded. Tasks that
    /// do not wind down within the shutdown timeout are aborted.
    pub async fn stop(mut self) -> SessionResult<SessionSnapshot> {
        self.live.store(false, Ordering::SeqCst);
        self.shutdown.send_replace(true);

        let tasks = std::mem::take(&mut self.tasks);
        let aborts: Vec<_> = tasks.iter().map(|t| t.abort_handle()).collect();
        let joined = tokio::time::timeout(self.config.shutdown_timeout, join_all(tasks)).await;

        metrics::session_stopped();

        let result = match joined {
            Ok(results) => match results.into_iter().find_map(|r| r.err()) {
                Some(e) => {
                    self.logger.log_error(&format!("session task failed: {e}"));
                    Err(SessionError::TaskFailed(e.to_string()))
                }
                None => Ok(()),
            },
            Err(_) => {
                self.logger
                    .log_warning("session tasks did not stop in time, aborting");
                aborts.iter().for_each(|a| a.abort());
                Ok(())
            }
        };

        let mut snapshot = self.snapshot();
        snapshot.status = SessionStatus::Stopped;
        result.map(|()| snapshot)
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        warn!(session_id = %self.session_id, "Session handle dropped without stop, aborting tasks");
        self.live.store(false, Ordering::SeqCst);
        self.shutdown.send_replace(true);
        for task in &self.tasks {
            task.abort();
        }
        metrics::session_stopped();
    }
}
