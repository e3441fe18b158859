//! Emotion classification with the nervousness override.
//!
//! The dominant expression is reported as-is while the candidate is focused.
//! When attention drifts and any trace of fear, surprise or sadness shows,
//! the tick is reported as `Nervous` instead.

use cpilot_models::{AttentionState, EmotionLabel, ExpressionVector};
use serde::{Deserialize, Serialize};

/// Probabilities above which an expression counts towards the override.
///
/// The override only fires when attention is `NotFocused`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverrideThresholds {
    pub fearful: f64,
    pub surprised: f64,
    pub sad: f64,
}

impl Default for OverrideThresholds {
    fn default() -> Self {
        Self {
            fearful: 0.01,
            surprised: 0.1,
            sad: 0.01,
        }
    }
}

impl OverrideThresholds {
    /// Whether any of the watched expressions exceeds its threshold.
    pub fn triggered_by(&self, expressions: &ExpressionVector) -> bool {
        expressions.fearful() > self.fearful
            || expressions.surprised() > self.surprised
            || expressions.sad() > self.sad
    }
}

/// Picks the tick's emotion label.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmotionClassifier {
    thresholds: OverrideThresholds,
}

impl EmotionClassifier {
    pub fn new(thresholds: OverrideThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &OverrideThresholds {
        &self.thresholds
    }

    /// Classify a detected face. `attention` must already be computed for
    /// the same tick.
    pub fn classify(&self, expressions: &ExpressionVector, attention: AttentionState) -> EmotionLabel {
        if attention == AttentionState::NotFocused && self.thresholds.triggered_by(expressions) {
            return EmotionLabel::Nervous;
        }
        expressions.dominant().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpilot_models::ExpressionLabel;

    fn interview_vector() -> ExpressionVector {
        ExpressionVector::from_pairs([
            (ExpressionLabel::Happy, 0.8),
            (ExpressionLabel::Neutral, 0.1),
            (ExpressionLabel::Sad, 0.05),
            (ExpressionLabel::Fearful, 0.02),
            (ExpressionLabel::Surprised, 0.01),
            (ExpressionLabel::Angry, 0.01),
            (ExpressionLabel::Disgusted, 0.01),
        ])
    }

    #[test]
    fn test_focused_reports_dominant() {
        let classifier = EmotionClassifier::default();
        assert_eq!(
            classifier.classify(&interview_vector(), AttentionState::Focused),
            EmotionLabel::Happy
        );
    }

    #[test]
    fn test_not_focused_with_fear_is_nervous() {
        let classifier = EmotionClassifier::default();
        assert_eq!(
            classifier.classify(&interview_vector(), AttentionState::NotFocused),
            EmotionLabel::Nervous
        );
    }

    #[test]
    fn test_each_trigger_fires_alone() {
        let classifier = EmotionClassifier::default();
        let base = [(ExpressionLabel::Happy, 0.9)];

        for (label, value) in [
            (ExpressionLabel::Fearful, 0.011),
            (ExpressionLabel::Surprised, 0.11),
            (ExpressionLabel::Sad, 0.011),
        ] {
            let v = ExpressionVector::from_pairs(base.into_iter().chain([(label, value)]));
            assert_eq!(
                classifier.classify(&v, AttentionState::NotFocused),
                EmotionLabel::Nervous,
                "{label} should trigger the override"
            );
            assert_eq!(classifier.classify(&v, AttentionState::Focused), EmotionLabel::Happy);
        }
    }

    #[test]
    fn test_thresholds_are_strict() {
        let classifier = EmotionClassifier::default();
        let v = ExpressionVector::from_pairs([
            (ExpressionLabel::Neutral, 0.8),
            (ExpressionLabel::Fearful, 0.01),
            (ExpressionLabel::Surprised, 0.1),
            (ExpressionLabel::Sad, 0.01),
        ]);
        assert_eq!(
            classifier.classify(&v, AttentionState::NotFocused),
            EmotionLabel::Neutral
        );
    }

    #[test]
    fn test_not_focused_without_triggers_keeps_dominant() {
        let classifier = EmotionClassifier::default();
        let v = ExpressionVector::from_pairs([
            (ExpressionLabel::Angry, 0.7),
            (ExpressionLabel::Disgusted, 0.3),
        ]);
        assert_eq!(
            classifier.classify(&v, AttentionState::NotFocused),
            EmotionLabel::Angry
        );
    }
}
