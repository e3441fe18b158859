//! Detection seam and per-tick classification.
//!
//! | Stage | Input | Output |
//! |-------|-------|--------|
//! | `DetectorAdapter` | current frame | `DetectionResult` |
//! | `AttentionClassifier` | landmarks | `AttentionState` |
//! | `EmotionClassifier` | expressions + attention | `EmotionLabel` |
//!
//! Use `ClassificationPipeline` to run the two classifiers in order.

pub mod pipeline;
pub mod providers;

pub use pipeline::{Classification, ClassificationPipeline, DetectionResult};
pub use providers::{
    DetectorAdapter, DetectorConfig, FaceDetector, FaceObservation, ScriptStep, ScriptedDetector,
};
