//! Facial-cue vision layer.
//!
//! This crate provides:
//! - Video frames and the read-only `FrameSource` seam
//! - The `FaceDetector` seam and a fault-tolerant `DetectorAdapter`
//! - Attention classification from eye-corner geometry
//! - Emotion classification with the nervousness override
//! - A `ClassificationPipeline` that runs both in dependency order

pub mod attention;
pub mod detection;
pub mod emotion;
pub mod error;
pub mod frame;
pub mod metrics;

pub use attention::{AttentionClassifier, AttentionConfig, DEFAULT_TILT_THRESHOLD};
pub use detection::{
    Classification, ClassificationPipeline, DetectionResult, DetectorAdapter, DetectorConfig,
    FaceDetector, FaceObservation, ScriptStep, ScriptedDetector,
};
pub use emotion::{EmotionClassifier, OverrideThresholds};
pub use error::{VisionError, VisionResult};
pub use frame::{FrameSource, LatestFrame, VideoFrame};
