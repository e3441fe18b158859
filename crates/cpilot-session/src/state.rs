//! Session state owner.
//!
//! The history log and the confidence estimator live inside a single task.
//! The sampler and the jitter timer never touch them directly; they send
//! `SessionCommand`s, and this task applies them in arrival order, publishes
//! a fresh snapshot, and broadcasts the resulting update.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, trace};

use cpilot_models::{InferenceEvent, SessionId, SessionStatus};

use crate::confidence::{ConfidenceEstimator, ConfidenceSource};
use crate::config::SessionConfig;
use crate::error::SessionResult;
use crate::history::HistoryLog;
use crate::logging::SessionLogger;
use crate::metrics;

/// Messages accepted by the state owner.
#[derive(Debug, Clone, Copy)]
pub(crate) enum SessionCommand {
    /// A classified tick from the sampler.
    Record(InferenceEvent),
    /// An ambient jitter step.
    Jitter(i32),
}

/// Update pushed to session consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionUpdate {
    /// A tick was appended to the history log.
    Inference {
        event: InferenceEvent,
        /// Score after this tick's nudge
        confidence: i32,
    },
    /// The score moved without a new tick.
    Confidence {
        confidence: i32,
        delta: i32,
        source: ConfidenceSource,
    },
}

/// Point-in-time view of a session for the interview UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub confidence: i32,
    pub latest: Option<InferenceEvent>,
    /// Retained events, most recent last
    pub recent: Vec<InferenceEvent>,
}

impl SessionSnapshot {
    /// The last `n` events, most recent last.
    pub fn recent_n(&self, n: usize) -> &[InferenceEvent] {
        let start = self.recent.len().saturating_sub(n);
        &self.recent[start..]
    }
}

/// State owned by the session actor.
pub(crate) struct SessionState {
    session_id: SessionId,
    status: SessionStatus,
    history: HistoryLog,
    confidence: ConfidenceEstimator,
}

impl SessionState {
    pub(crate) fn new(session_id: SessionId, config: &SessionConfig) -> SessionResult<Self> {
        Ok(Self {
            session_id,
            status: SessionStatus::Running,
            history: HistoryLog::new(config.history_capacity)?,
            confidence: ConfidenceEstimator::new(config.confidence),
        })
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            status: self.status,
            confidence: self.confidence.score(),
            latest: self.history.latest().copied(),
            recent: self.history.recent(),
        }
    }

    /// Apply one command and return the update to broadcast.
    pub(crate) fn apply(&mut self, command: SessionCommand) -> SessionUpdate {
        match command {
            SessionCommand::Record(event) => {
                self.history.append(event);
                self.confidence.observe(event.emotion);
                SessionUpdate::Inference {
                    event,
                    confidence: self.confidence.score(),
                }
            }
            SessionCommand::Jitter(delta) => {
                let applied = self.confidence.jitter(delta);
                SessionUpdate::Confidence {
                    confidence: self.confidence.score(),
                    delta: applied,
                    source: ConfidenceSource::Jitter,
                }
            }
        }
    }
}

/// Channels the state owner publishes on.
pub(crate) struct StateOutputs {
    pub snapshots: watch::Sender<SessionSnapshot>,
    pub updates: broadcast::Sender<SessionUpdate>,
}

/// Run the state owner until shutdown or until every command sender is gone.
pub(crate) async fn run_state(
    mut state: SessionState,
    mut commands: mpsc::Receiver<SessionCommand>,
    mut shutdown: watch::Receiver<bool>,
    live: Arc<AtomicBool>,
    outputs: StateOutputs,
    logger: SessionLogger,
) {
    loop {
        tokio::select! {
            biased;

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                if !live.load(Ordering::SeqCst) {
                    debug!(session_id = %logger.session_id(), "Dropping command after stop");
                    continue;
                }

                let update = state.apply(command);
                metrics::record_confidence(state.confidence.score());
                if let SessionUpdate::Inference { event, confidence } = &update {
                    metrics::record_event(event.emotion);
                    debug!(
                        session_id = %logger.session_id(),
                        sequence = event.sequence,
                        emotion = %event.emotion,
                        attention = %event.attention,
                        confidence,
                        "Recorded inference event"
                    );
                }

                outputs.snapshots.send_replace(state.snapshot());
                // Fire-and-forget: no subscribers is not an error.
                if outputs.updates.send(update).is_err() {
                    trace!(session_id = %logger.session_id(), "No subscribers for session update");
                }
            }
        }
    }

    state.status = SessionStatus::Stopped;
    outputs.snapshots.send_replace(state.snapshot());
    logger.log_stop(&format!(
        "{} events retained, confidence {}",
        state.history.len(),
        state.confidence.score()
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cpilot_models::{AttentionState, EmotionLabel};

    fn state() -> SessionState {
        SessionState::new(SessionId::from_string("test"), &SessionConfig::default()).unwrap()
    }

    fn event(sequence: u64, emotion: EmotionLabel) -> InferenceEvent {
        InferenceEvent::new(sequence, Utc::now(), emotion, AttentionState::Focused)
    }

    #[test]
    fn test_record_appends_then_nudges() {
        let mut s = state();
        let update = s.apply(SessionCommand::Record(event(1, EmotionLabel::Happy)));

        assert_eq!(
            update,
            SessionUpdate::Inference {
                event: s.history.latest().copied().unwrap(),
                confidence: 77,
            }
        );
        let snap = s.snapshot();
        assert_eq!(snap.recent.len(), 1);
        assert_eq!(snap.confidence, 77);
        assert_eq!(snap.status, SessionStatus::Running);
    }

    #[test]
    fn test_jitter_reports_applied_delta() {
        let mut s = state();
        match s.apply(SessionCommand::Jitter(-2)) {
            SessionUpdate::Confidence { confidence, delta, source } => {
                assert_eq!(confidence, 73);
                assert_eq!(delta, -2);
                assert_eq!(source, ConfidenceSource::Jitter);
            }
            other => panic!("unexpected update {other:?}"),
        }
        assert!(s.snapshot().latest.is_none());
    }

    #[test]
    fn test_snapshot_recent_n() {
        let mut s = state();
        for seq in 1..=5 {
            s.apply(SessionCommand::Record(event(seq, EmotionLabel::Neutral)));
        }
        let snap = s.snapshot();
        let tail: Vec<u64> = snap.recent_n(2).iter().map(|e| e.sequence).collect();
        assert_eq!(tail, vec![4, 5]);
        assert_eq!(snap.recent_n(10).len(), 5);
    }

    #[test]
    fn test_update_json_is_tagged() {
        let update = SessionUpdate::Confidence {
            confidence: 70,
            delta: 2,
            source: ConfidenceSource::Jitter,
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["type"], "confidence");
        assert_eq!(json["source"], "jitter");
    }
}
