//! Face detector seam and the fault-tolerant adapter around it.
//!
//! The landmark/expression model is a black box behind `FaceDetector`.
//! `DetectorAdapter` turns every way a call can go wrong (no frame, error,
//! panic, timeout, low score) into `DetectionResult::NoFace` so a bad tick
//! never stops sampling.

use async_trait::async_trait;
use futures::FutureExt;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use cpilot_models::{ExpressionVector, LandmarkSet};

use crate::detection::pipeline::DetectionResult;
use crate::error::{VisionError, VisionResult};
use crate::frame::VideoFrame;
use crate::metrics::names;

/// Raw detector output for the single most prominent face in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    pub landmarks: LandmarkSet,
    pub expressions: ExpressionVector,
    /// Face detection confidence in `[0, 1]`.
    #[serde(default = "default_score")]
    pub score: f64,
}

fn default_score() -> f64 {
    1.0
}

impl FaceObservation {
    pub fn new(landmarks: LandmarkSet, expressions: ExpressionVector) -> Self {
        Self {
            landmarks,
            expressions,
            score: default_score(),
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }
}

/// Facial landmark and expression detector.
///
/// Model loading happens before the first call and is not part of this
/// contract.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    /// Detect the most prominent face in `frame`.
    ///
    /// # Returns
    /// `Ok(None)` when no face is present.
    async fn detect(&self, frame: &VideoFrame) -> VisionResult<Option<FaceObservation>>;

    /// Detector name for logging.
    fn name(&self) -> &'static str;
}

/// Adapter policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Detections scoring below this are treated as no face.
    pub min_detection_score: f64,
    /// Upper bound on a single detector call.
    pub timeout: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_detection_score: 0.5,
            timeout: Duration::from_millis(5000),
        }
    }
}

/// Wraps a `FaceDetector` and never fails.
#[derive(Clone)]
pub struct DetectorAdapter {
    detector: Arc<dyn FaceDetector>,
    config: DetectorConfig,
}

impl DetectorAdapter {
    pub fn new(detector: Arc<dyn FaceDetector>, config: DetectorConfig) -> Self {
        Self { detector, config }
    }

    pub fn detector_name(&self) -> &'static str {
        self.detector.name()
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Run detection for one tick.
    ///
    /// A missing frame short-circuits to `NoFace` without calling the
    /// detector. Failures are logged and also become `NoFace`; there is no
    /// retry within a tick.
    pub async fn detect(&self, frame: Option<&VideoFrame>) -> DetectionResult {
        let Some(frame) = frame else {
            trace!("No frame available, skipping detector");
            return DetectionResult::NoFace;
        };

        match self.observe(frame).await {
            Ok(Some(observation))
                if observation.score.is_nan()
                    || observation.score < self.config.min_detection_score =>
            {
                debug!(
                    score = observation.score,
                    min_score = self.config.min_detection_score,
                    "Discarding low-confidence detection"
                );
                counter!(names::DETECTOR_LOW_SCORE_TOTAL).increment(1);
                DetectionResult::NoFace
            }
            Ok(Some(observation)) => DetectionResult::Detected {
                landmarks: observation.landmarks,
                expressions: observation.expressions,
            },
            Ok(None) => DetectionResult::NoFace,
            Err(e) => {
                warn!(
                    detector = self.detector.name(),
                    error = %e,
                    "Face detection failed, treating tick as no face"
                );
                counter!(names::DETECTOR_FAILURES_TOTAL, "reason" => e.reason()).increment(1);
                DetectionResult::NoFace
            }
        }
    }

    async fn observe(&self, frame: &VideoFrame) -> VisionResult<Option<FaceObservation>> {
        counter!(names::DETECTOR_CALLS_TOTAL).increment(1);
        let started = Instant::now();

        let call = AssertUnwindSafe(self.detector.detect(frame)).catch_unwind();
        let outcome = tokio::time::timeout(self.config.timeout, call).await;

        histogram!(names::DETECTOR_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        match outcome {
            Err(_) => Err(VisionError::Timeout(self.config.timeout.as_millis() as u64)),
            Ok(Err(panic)) => Err(VisionError::DetectorPanicked(panic_message(panic.as_ref()))),
            Ok(Ok(result)) => result,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================================================
// Scripted detector
// ============================================================================

/// One scripted detector response.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Face(FaceObservation),
    NoFace,
    Fail(String),
}

/// Detector that replays a fixed script of responses.
///
/// Used to replay recorded sessions and to drive the loop in tests. Once
/// the script runs out every call reports no face.
pub struct ScriptedDetector {
    steps: Mutex<VecDeque<ScriptStep>>,
    latency: Duration,
}

impl ScriptedDetector {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            latency: Duration::ZERO,
        }
    }

    /// Simulated model latency applied to every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Steps not yet consumed.
    pub fn remaining(&self) -> usize {
        self.steps.lock().map(|steps| steps.len()).unwrap_or(0)
    }

    fn next_step(&self) -> ScriptStep {
        self.steps
            .lock()
            .ok()
            .and_then(|mut steps| steps.pop_front())
            .unwrap_or(ScriptStep::NoFace)
    }
}

#[async_trait]
impl FaceDetector for ScriptedDetector {
    async fn detect(&self, _frame: &VideoFrame) -> VisionResult<Option<FaceObservation>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.next_step() {
            ScriptStep::Face(observation) => Ok(Some(observation)),
            ScriptStep::NoFace => Ok(None),
            ScriptStep::Fail(message) => Err(VisionError::detection_failed(message)),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpilot_models::{ExpressionLabel, Point};

    fn observation() -> FaceObservation {
        FaceObservation::new(
            LandmarkSet::from_eye_corners(Point::new(10.0, 0.0), Point::new(30.0, 0.0)),
            ExpressionVector::from_pairs([(ExpressionLabel::Happy, 0.9)]),
        )
    }

    fn adapter(steps: Vec<ScriptStep>) -> DetectorAdapter {
        DetectorAdapter::new(Arc::new(ScriptedDetector::new(steps)), DetectorConfig::default())
    }

    struct PanickingDetector;

    #[async_trait]
    impl FaceDetector for PanickingDetector {
        async fn detect(&self, _frame: &VideoFrame) -> VisionResult<Option<FaceObservation>> {
            panic!("model crashed");
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    #[tokio::test]
    async fn test_detected_face_passes_through() {
        let adapter = adapter(vec![ScriptStep::Face(observation())]);
        let result = adapter.detect(Some(&VideoFrame::empty())).await;
        assert!(result.is_face());
    }

    #[tokio::test]
    async fn test_missing_frame_skips_detector() {
        let detector = Arc::new(ScriptedDetector::new(vec![ScriptStep::Face(observation())]));
        let adapter = DetectorAdapter::new(detector.clone(), DetectorConfig::default());

        assert_eq!(adapter.detect(None).await, DetectionResult::NoFace);
        assert_eq!(detector.remaining(), 1);
    }

    #[tokio::test]
    async fn test_detector_error_becomes_no_face() {
        let adapter = adapter(vec![
            ScriptStep::Fail("model not loaded".into()),
            ScriptStep::Face(observation()),
        ]);
        let frame = VideoFrame::empty();

        assert_eq!(adapter.detect(Some(&frame)).await, DetectionResult::NoFace);
        assert!(adapter.detect(Some(&frame)).await.is_face());
    }

    #[tokio::test]
    async fn test_low_score_becomes_no_face() {
        let adapter = adapter(vec![
            ScriptStep::Face(observation().with_score(0.3)),
            ScriptStep::Face(observation().with_score(f64::NAN)),
            ScriptStep::Face(observation().with_score(0.5)),
        ]);
        let frame = VideoFrame::empty();

        assert_eq!(adapter.detect(Some(&frame)).await, DetectionResult::NoFace);
        assert_eq!(adapter.detect(Some(&frame)).await, DetectionResult::NoFace);
        assert!(adapter.detect(Some(&frame)).await.is_face());
    }

    #[tokio::test]
    async fn test_panic_becomes_no_face() {
        let adapter = DetectorAdapter::new(Arc::new(PanickingDetector), DetectorConfig::default());
        assert_eq!(
            adapter.detect(Some(&VideoFrame::empty())).await,
            DetectionResult::NoFace
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_no_face() {
        let detector = ScriptedDetector::new(vec![ScriptStep::Face(observation())])
            .with_latency(Duration::from_secs(10));
        let adapter = DetectorAdapter::new(
            Arc::new(detector),
            DetectorConfig {
                timeout: Duration::from_secs(1),
                ..DetectorConfig::default()
            },
        );
        assert_eq!(
            adapter.detect(Some(&VideoFrame::empty())).await,
            DetectionResult::NoFace
        );
    }

    #[test]
    fn test_observation_deserializes_with_default_score() {
        let json = serde_json::json!({
            "landmarks": observation().landmarks,
            "expressions": { "happy": 0.9 }
        });
        let parsed: FaceObservation = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.score, 1.0);
        assert_eq!(parsed.expressions.happy(), 0.9);
    }
}
