//! Error types for vision operations.

use thiserror::Error;

/// Result type for vision operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors raised at the detector seam.
///
/// None of these are fatal to a session: the adapter folds every variant
/// into a no-face classification for the tick.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Face detection failed: {0}")]
    DetectionFailed(String),

    #[error("Detector timed out after {0} ms")]
    Timeout(u64),

    #[error("Detector panicked: {0}")]
    DetectorPanicked(String),

    #[error("Invalid detector output: {0}")]
    InvalidObservation(#[from] cpilot_models::ModelError),
}

impl VisionError {
    /// Create a detection failure error.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        Self::DetectionFailed(message.into())
    }

    /// Short reason used as a metrics label.
    pub fn reason(&self) -> &'static str {
        match self {
            VisionError::DetectionFailed(_) => "error",
            VisionError::Timeout(_) => "timeout",
            VisionError::DetectorPanicked(_) => "panic",
            VisionError::InvalidObservation(_) => "invalid",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpilot_models::ModelError;

    #[test]
    fn test_reason_labels() {
        assert_eq!(VisionError::detection_failed("boom").reason(), "error");
        assert_eq!(VisionError::Timeout(5000).reason(), "timeout");
        assert_eq!(VisionError::DetectorPanicked("oops".into()).reason(), "panic");

        let invalid: VisionError = ModelError::InvalidLandmarkCount {
            expected: 68,
            actual: 3,
        }
        .into();
        assert_eq!(invalid.reason(), "invalid");
    }
}
