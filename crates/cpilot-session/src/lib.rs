//! Interview session runtime.
//!
//! This crate provides:
//! - Session configuration with environment overrides and fail-fast validation
//! - The bounded history log and the confidence estimator
//! - The frame sampler, ambient jitter, and state-owner tasks
//! - Fire-and-forget delivery to session consumers
//! - Start/stop lifecycle with per-session state isolation

pub mod config;
pub mod confidence;
pub mod consumer;
pub mod error;
pub mod history;
mod jitter;
pub mod logging;
pub mod metrics;
pub mod replay;
pub mod sampler;
pub mod session;
pub mod state;

pub use config::{ConfidenceConfig, SessionConfig};
pub use confidence::{ConfidenceEstimator, ConfidenceSource};
pub use consumer::{spawn_consumer, SessionConsumer};
pub use error::{SessionError, SessionResult};
pub use history::HistoryLog;
pub use logging::SessionLogger;
pub use sampler::{SamplerStats, TickCounters};
pub use session::{InterviewSession, SessionHandle};
pub use state::{SessionSnapshot, SessionUpdate};
