//! Session consumers.
//!
//! Consumers (the interview UI, recorders) receive updates from a broadcast
//! subscription in their own task. Delivery is fire-and-forget: a slow
//! consumer lags and misses updates, a failing one is logged, and neither
//! ever holds up the sampler.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use cpilot_models::InferenceEvent;

use crate::confidence::ConfidenceSource;
use crate::error::SessionResult;
use crate::metrics;
use crate::state::SessionUpdate;

/// Receiver of session updates.
#[async_trait]
pub trait SessionConsumer: Send + Sync {
    /// Called once per appended inference event, in tick order.
    ///
    /// `confidence` is the score after this event's nudge.
    async fn on_event(&self, event: &InferenceEvent, confidence: i32) -> SessionResult<()>;

    /// Called when the score moves on the ambient cadence.
    ///
    /// `delta` is the change actually applied after clamping.
    async fn on_confidence(
        &self,
        _confidence: i32,
        _delta: i32,
        _source: ConfidenceSource,
    ) -> SessionResult<()> {
        Ok(())
    }

    /// Consumer name for logging.
    fn name(&self) -> &'static str;
}

/// Deliver one update to a consumer.
pub async fn dispatch(consumer: &dyn SessionConsumer, update: &SessionUpdate) -> SessionResult<()> {
    match update {
        SessionUpdate::Inference { event, confidence } => consumer.on_event(event, *confidence).await,
        SessionUpdate::Confidence {
            confidence,
            delta,
            source,
        } => consumer.on_confidence(*confidence, *delta, *source).await,
    }
}

/// Drive `consumer` from `updates` until the session's channel closes.
pub fn spawn_consumer(
    mut updates: broadcast::Receiver<SessionUpdate>,
    consumer: Arc<dyn SessionConsumer>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(update) => {
                    if let Err(e) = dispatch(consumer.as_ref(), &update).await {
                        metrics::record_consumer_failure(consumer.name());
                        warn!(consumer = consumer.name(), error = %e, "Session consumer failed");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    metrics::record_consumer_lag(consumer.name(), skipped);
                    warn!(consumer = consumer.name(), skipped, "Session consumer lagging, updates dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!(consumer = consumer.name(), "Session consumer finished");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use chrono::Utc;
    use cpilot_models::{AttentionState, EmotionLabel};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<u64>>,
        scores: Mutex<Vec<i32>>,
        deltas: Mutex<Vec<i32>>,
        fail_first: Mutex<bool>,
    }

    #[async_trait]
    impl SessionConsumer for Recorder {
        async fn on_event(&self, event: &InferenceEvent, confidence: i32) -> SessionResult<()> {
            let mut fail = self.fail_first.lock().unwrap();
            if *fail {
                *fail = false;
                return Err(SessionError::consumer_failed("render failed"));
            }
            self.events.lock().unwrap().push(event.sequence);
            self.scores.lock().unwrap().push(confidence);
            Ok(())
        }

        async fn on_confidence(
            &self,
            confidence: i32,
            delta: i32,
            _source: ConfidenceSource,
        ) -> SessionResult<()> {
            self.scores.lock().unwrap().push(confidence);
            self.deltas.lock().unwrap().push(delta);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    fn inference(sequence: u64, confidence: i32) -> SessionUpdate {
        SessionUpdate::Inference {
            event: InferenceEvent::new(sequence, Utc::now(), EmotionLabel::Happy, AttentionState::Focused),
            confidence,
        }
    }

    #[test]
    fn test_dispatch_routes_by_kind() {
        let recorder = Recorder::default();
        tokio_test::block_on(async {
            dispatch(&recorder, &inference(1, 77)).await.unwrap();
            dispatch(
                &recorder,
                &SessionUpdate::Confidence {
                    confidence: 79,
                    delta: 2,
                    source: ConfidenceSource::Jitter,
                },
            )
            .await
            .unwrap();
        });
        assert_eq!(*recorder.events.lock().unwrap(), vec![1]);
        assert_eq!(*recorder.scores.lock().unwrap(), vec![77, 79]);
        assert_eq!(*recorder.deltas.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_consumer_failure_does_not_stop_delivery() {
        let (tx, rx) = broadcast::channel(8);
        let recorder = Arc::new(Recorder {
            fail_first: Mutex::new(true),
            ..Recorder::default()
        });
        let handle = spawn_consumer(rx, recorder.clone());

        tx.send(inference(1, 77)).unwrap();
        tx.send(inference(2, 79)).unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(*recorder.events.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_lagging_consumer_skips_and_continues() {
        let (tx, rx) = broadcast::channel(2);
        let recorder = Arc::new(Recorder::default());

        for seq in 1..=5 {
            tx.send(inference(seq, 75)).unwrap();
        }
        let handle = spawn_consumer(rx, recorder.clone());
        drop(tx);
        handle.await.unwrap();

        assert_eq!(*recorder.events.lock().unwrap(), vec![4, 5]);
    }
}
