//! Attention classification from head tilt.
//!
//! The tilt ratio is the vertical over the horizontal distance between the
//! two outer eye corners (points 36 and 45). A level head reads as focused.

use cpilot_models::{AttentionState, LandmarkSet};
use serde::{Deserialize, Serialize};

/// Default maximum tilt ratio still counted as focused.
pub const DEFAULT_TILT_THRESHOLD: f64 = 0.2;

/// Attention classifier calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttentionConfig {
    /// Largest `dy / dx` between the outer eye corners that is still focused.
    pub tilt_threshold: f64,
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            tilt_threshold: DEFAULT_TILT_THRESHOLD,
        }
    }
}

/// Derives `AttentionState` from a landmark set.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttentionClassifier {
    config: AttentionConfig,
}

impl AttentionClassifier {
    pub fn new(config: AttentionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AttentionConfig {
        &self.config
    }

    /// Tilt ratio between the outer eye corners.
    ///
    /// `None` when the eyes are horizontally coincident or the geometry is
    /// not finite.
    pub fn tilt_ratio(landmarks: &LandmarkSet) -> Option<f64> {
        let left = landmarks.left_eye_outer();
        let right = landmarks.right_eye_outer();
        if !left.is_finite() || !right.is_finite() {
            return None;
        }

        let dx = (left.x - right.x).abs();
        let dy = (left.y - right.y).abs();
        if dx == 0.0 {
            return None;
        }

        Some(dy / dx)
    }

    pub fn classify(&self, landmarks: &LandmarkSet) -> AttentionState {
        match Self::tilt_ratio(landmarks) {
            Some(ratio) if ratio <= self.config.tilt_threshold => AttentionState::Focused,
            _ => AttentionState::NotFocused,
        }
    }
}
