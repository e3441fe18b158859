//! Model validation errors.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Invalid landmark count: expected {expected}, got {actual}")]
    InvalidLandmarkCount { expected: usize, actual: usize },

    #[error("Unknown expression label: {0}")]
    UnknownExpression(String),

    #[error("Unknown emotion label: {0}")]
    UnknownEmotion(String),
}

impl ModelError {
    pub fn invalid_landmark_count(expected: usize, actual: usize) -> Self {
        Self::InvalidLandmarkCount { expected, actual }
    }
}
