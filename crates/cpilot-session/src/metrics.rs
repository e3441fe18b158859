//! Session metrics.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use cpilot_models::EmotionLabel;

use crate::error::{SessionError, SessionResult};

/// Install the Prometheus recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> SessionResult<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| SessionError::Metrics(e.to_string()))
}

/// Metric names as constants for consistency.
pub mod names {
    pub const SESSIONS_ACTIVE: &str = "cpilot_sessions_active";
    pub const TICKS_TOTAL: &str = "cpilot_ticks_total";
    pub const TICKS_SKIPPED_TOTAL: &str = "cpilot_ticks_skipped_total";
    pub const PASSES_DISCARDED_TOTAL: &str = "cpilot_passes_discarded_total";
    pub const EVENTS_PUBLISHED_TOTAL: &str = "cpilot_events_published_total";
    pub const CONFIDENCE_SCORE: &str = "cpilot_confidence_score";
    pub const CONSUMER_FAILURES_TOTAL: &str = "cpilot_consumer_failures_total";
    pub const CONSUMER_LAGGED_TOTAL: &str = "cpilot_consumer_lagged_total";
}

pub fn record_tick() {
    counter!(names::TICKS_TOTAL).increment(1);
}

/// Record a tick that did not start a detection pass.
pub fn record_skipped_tick(reason: &'static str) {
    counter!(names::TICKS_SKIPPED_TOTAL, "reason" => reason).increment(1);
}

pub fn record_discarded_pass() {
    counter!(names::PASSES_DISCARDED_TOTAL).increment(1);
}

pub fn record_event(emotion: EmotionLabel) {
    counter!(names::EVENTS_PUBLISHED_TOTAL, "emotion" => emotion.as_str()).increment(1);
}

pub fn record_confidence(score: i32) {
    gauge!(names::CONFIDENCE_SCORE).set(score as f64);
}

pub fn record_consumer_failure(consumer: &'static str) {
    counter!(names::CONSUMER_FAILURES_TOTAL, "consumer" => consumer).increment(1);
}

pub fn record_consumer_lag(consumer: &'static str, skipped: u64) {
    counter!(names::CONSUMER_LAGGED_TOTAL, "consumer" => consumer).increment(skipped);
}

pub fn session_started() {
    gauge!(names::SESSIONS_ACTIVE).increment(1.0);
}

pub fn session_stopped() {
    gauge!(names::SESSIONS_ACTIVE).decrement(1.0);
}
