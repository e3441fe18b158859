//! Detection result type and the classification pass.

use cpilot_models::{AttentionState, EmotionLabel, ExpressionVector, LandmarkSet};

use crate::attention::{AttentionClassifier, AttentionConfig};
use crate::emotion::{EmotionClassifier, OverrideThresholds};

/// Outcome of one detector call.
///
/// Produced once per tick and dropped once the tick is classified.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionResult {
    /// A face was found.
    Detected {
        landmarks: LandmarkSet,
        expressions: ExpressionVector,
    },
    /// No face, an unusable frame, or a detector fault.
    NoFace,
}

impl DetectionResult {
    pub fn is_face(&self) -> bool {
        matches!(self, DetectionResult::Detected { .. })
    }
}

/// Labels assigned to a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub emotion: EmotionLabel,
    pub attention: AttentionState,
}

impl Classification {
    pub fn no_face() -> Self {
        Self {
            emotion: EmotionLabel::NoFaceDetected,
            attention: AttentionState::NotFocused,
        }
    }
}

/// Runs attention then emotion classification for a detection result.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassificationPipeline {
    attention: AttentionClassifier,
    emotion: EmotionClassifier,
}

impl ClassificationPipeline {
    pub fn new(attention: AttentionConfig, thresholds: OverrideThresholds) -> Self {
        Self {
            attention: AttentionClassifier::new(attention),
            emotion: EmotionClassifier::new(thresholds),
        }
    }

    pub fn classify(&self, result: &DetectionResult) -> Classification {
        match result {
            DetectionResult::NoFace => Classification::no_face(),
            DetectionResult::Detected {
                landmarks,
                expressions,
            } => {
                let attention = self.attention.classify(landmarks);
                let emotion = self.emotion.classify(expressions, attention);
                Classification { emotion, attention }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpilot_models::{ExpressionLabel, Point};

    fn detected(left: (f64, f64), right: (f64, f64), pairs: &[(ExpressionLabel, f64)]) -> DetectionResult {
        DetectionResult::Detected {
            landmarks: LandmarkSet::from_eye_corners(left.into(), right.into()),
            expressions: ExpressionVector::from_pairs(pairs.iter().copied()),
        }
    }

    #[test]
    fn test_no_face_classification() {
        let pipeline = ClassificationPipeline::default();
        assert_eq!(
            pipeline.classify(&DetectionResult::NoFace),
            Classification::no_face()
        );
    }

    #[test]
    fn test_degenerate_eyes_with_sadness_is_nervous() {
        let pipeline = ClassificationPipeline::default();
        let result = DetectionResult::Detected {
            landmarks: LandmarkSet::from_eye_corners(Point::new(5.0, 1.0), Point::new(5.0, 9.0)),
            expressions: ExpressionVector::from_pairs([
                (ExpressionLabel::Neutral, 0.9),
                (ExpressionLabel::Sad, 0.05),
            ]),
        };
        assert_eq!(
            pipeline.classify(&result),
            Classification {
                emotion: EmotionLabel::Nervous,
                attention: AttentionState::NotFocused,
            }
        );
    }

    #[test]
    fn test_custom_calibration() {
        let pipeline = ClassificationPipeline::new(
            AttentionConfig { tilt_threshold: 0.1 },
            OverrideThresholds {
                fearful: 0.5,
                surprised: 0.5,
                sad: 0.5,
            },
        );
        let result = detected(
            (10.0, 0.0),
            (30.0, 4.0),
            &[(ExpressionLabel::Happy, 0.8), (ExpressionLabel::Fearful, 0.2)],
        );
        let c = pipeline.classify(&result);
        assert_eq!(c.attention, AttentionState::NotFocused);
        assert_eq!(c.emotion, EmotionLabel::Happy);
    }
}
