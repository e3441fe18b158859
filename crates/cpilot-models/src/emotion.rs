//! Attention and emotion classifications.
//!
//! Exactly one `EmotionLabel` and one `AttentionState` are assigned per
//! sampling tick.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;
use crate::expression::ExpressionLabel;

/// Head-pose engagement derived from eye-corner geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttentionState {
    Focused,
    NotFocused,
}

impl AttentionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttentionState::Focused => "focused",
            AttentionState::NotFocused => "not_focused",
        }
    }

    /// Label shown on the interview badge.
    pub fn display_label(&self) -> &'static str {
        match self {
            AttentionState::Focused => "Focused",
            AttentionState::NotFocused => "Not focused",
        }
    }

    pub fn is_focused(&self) -> bool {
        matches!(self, AttentionState::Focused)
    }
}

impl fmt::Display for AttentionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Emotion assigned to one tick.
///
/// The seven expression labels plus two synthetic labels: `Nervous` for the
/// distracted-and-anxious override, and `NoFaceDetected` when the detector
/// found nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EmotionLabel {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
    Nervous,
    NoFaceDetected,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 9] = [
        EmotionLabel::Neutral,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Fearful,
        EmotionLabel::Disgusted,
        EmotionLabel::Surprised,
        EmotionLabel::Nervous,
        EmotionLabel::NoFaceDetected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Fearful => "fearful",
            EmotionLabel::Disgusted => "disgusted",
            EmotionLabel::Surprised => "surprised",
            EmotionLabel::Nervous => "nervous",
            EmotionLabel::NoFaceDetected => "no_face_detected",
        }
    }

    /// Label shown in the interview log.
    pub fn display_label(&self) -> &'static str {
        match self {
            EmotionLabel::NoFaceDetected => "No face detected",
            other => other.as_str(),
        }
    }

    /// Whether the label came from a detected face.
    pub fn is_face(&self) -> bool {
        !matches!(self, EmotionLabel::NoFaceDetected)
    }
}

impl From<ExpressionLabel> for EmotionLabel {
    fn from(label: ExpressionLabel) -> Self {
        match label {
            ExpressionLabel::Neutral => EmotionLabel::Neutral,
            ExpressionLabel::Happy => EmotionLabel::Happy,
            ExpressionLabel::Sad => EmotionLabel::Sad,
            ExpressionLabel::Angry => EmotionLabel::Angry,
            ExpressionLabel::Fearful => EmotionLabel::Fearful,
            ExpressionLabel::Disgusted => EmotionLabel::Disgusted,
            ExpressionLabel::Surprised => EmotionLabel::Surprised,
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EmotionLabel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        EmotionLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == normalized)
            .ok_or_else(|| ModelError::UnknownEmotion(s.to_string()))
    }
}
