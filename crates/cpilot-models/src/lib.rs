//! Shared data models for the CareerPilot facial-cue inference loop.
//!
//! This crate provides Serde-serializable types for:
//! - Facial landmarks (68-point layout) and expression probabilities
//! - Attention and emotion classifications
//! - Per-tick inference events delivered to the interview UI
//! - Session identifiers and lifecycle status

pub mod emotion;
pub mod error;
pub mod event;
pub mod expression;
pub mod landmarks;
pub mod session;

// Re-export common types
pub use emotion::{AttentionState, EmotionLabel};
pub use error::{ModelError, ModelResult};
pub use event::InferenceEvent;
pub use expression::{ExpressionLabel, ExpressionVector};
pub use landmarks::{LandmarkSet, Point, LANDMARK_COUNT, LEFT_EYE_OUTER, RIGHT_EYE_OUTER};
pub use session::{SessionId, SessionStatus};
