//! Per-tick inference events.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::emotion::{AttentionState, EmotionLabel};

/// Classification produced by one sampling tick.
///
/// Immutable once created. This is the unit stored in the history log and
/// delivered to session consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InferenceEvent {
    /// Per-session tick number, strictly increasing.
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub emotion: EmotionLabel,
    pub attention: AttentionState,
}

impl InferenceEvent {
    pub fn new(
        sequence: u64,
        timestamp: DateTime<Utc>,
        emotion: EmotionLabel,
        attention: AttentionState,
    ) -> Self {
        Self {
            sequence,
            timestamp,
            emotion,
            attention,
        }
    }

    /// Event for a tick where no face was found.
    pub fn no_face(sequence: u64, timestamp: DateTime<Utc>) -> Self {
        Self::new(
            sequence,
            timestamp,
            EmotionLabel::NoFaceDetected,
            AttentionState::NotFocused,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_face_event() {
        let event = InferenceEvent::no_face(3, Utc::now());
        assert_eq!(event.emotion, EmotionLabel::NoFaceDetected);
        assert_eq!(event.attention, AttentionState::NotFocused);
        assert_eq!(event.sequence, 3);
    }

    #[test]
    fn test_event_json_shape() {
        let event = InferenceEvent::new(1, Utc::now(), EmotionLabel::Happy, AttentionState::Focused);
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["emotion"], "happy");
        assert_eq!(json["attention"], "focused");
        assert_eq!(json["sequence"], 1);
    }
}
