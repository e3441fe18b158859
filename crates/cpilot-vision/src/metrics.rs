//! Metric names recorded at the detector seam.

pub mod names {
    pub const DETECTOR_CALLS_TOTAL: &str = "cpilot_detector_calls_total";
    pub const DETECTOR_FAILURES_TOTAL: &str = "cpilot_detector_failures_total";
    pub const DETECTOR_LOW_SCORE_TOTAL: &str = "cpilot_detector_low_score_total";
    pub const DETECTOR_DURATION_SECONDS: &str = "cpilot_detector_duration_seconds";
}
