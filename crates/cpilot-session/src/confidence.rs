//! Live confidence estimate.
//!
//! A clamped integer random walk with two inputs: emotion signals from the
//! detection tick and an ambient jitter on its own slower cadence. The
//! estimator itself is plain state; the session actor owns it and the two
//! cadences reach it only through messages.

use cpilot_models::EmotionLabel;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ConfidenceConfig;

/// What moved the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceSource {
    Signal,
    Jitter,
}

/// Clamped confidence score.
#[derive(Debug, Clone)]
pub struct ConfidenceEstimator {
    config: ConfidenceConfig,
    score: i32,
}

impl ConfidenceEstimator {
    pub fn new(config: ConfidenceConfig) -> Self {
        let mut estimator = Self { config, score: 0 };
        estimator.reset();
        estimator
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn floor(&self) -> i32 {
        self.config.floor
    }

    pub fn ceiling(&self) -> i32 {
        self.config.ceiling
    }

    /// Delta an emotion signal proposes, before clamping.
    pub fn signal_delta(&self, emotion: EmotionLabel) -> i32 {
        match emotion {
            EmotionLabel::Nervous | EmotionLabel::Sad => -self.config.decrease_step,
            EmotionLabel::Happy | EmotionLabel::Neutral => self.config.increase_step,
            _ => 0,
        }
    }

    /// Nudge the score for one classified tick. Returns the applied change.
    pub fn observe(&mut self, emotion: EmotionLabel) -> i32 {
        self.apply(self.signal_delta(emotion))
    }

    /// Apply one ambient jitter step. Returns the applied change.
    pub fn jitter(&mut self, delta: i32) -> i32 {
        self.apply(delta)
    }

    pub fn reset(&mut self) {
        self.score = self.bounded(self.config.initial);
    }

    fn apply(&mut self, delta: i32) -> i32 {
        let before = self.score;
        self.score = self.bounded(before.saturating_add(delta));
        self.score - before
    }

    // Floor wins over ceiling if the two are ever inverted.
    fn bounded(&self, value: i32) -> i32 {
        value.min(self.config.ceiling).max(self.config.floor)
    }
}

/// Draw a `±step` jitter with equal probability.
pub fn random_jitter(step: i32) -> i32 {
    if rand::rng().random_bool(0.5) {
        step
    } else {
        -step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> ConfidenceEstimator {
        ConfidenceEstimator::new(ConfidenceConfig::default())
    }

    #[test]
    fn test_starts_at_initial() {
        assert_eq!(estimator().score(), 75);
    }

    #[test]
    fn test_signal_steps() {
        let mut c = estimator();
        assert_eq!(c.observe(EmotionLabel::Happy), 2);
        assert_eq!(c.observe(EmotionLabel::Neutral), 2);
        assert_eq!(c.score(), 79);
        assert_eq!(c.observe(EmotionLabel::Nervous), -3);
        assert_eq!(c.observe(EmotionLabel::Sad), -3);
        assert_eq!(c.score(), 73);
    }

    #[test]
    fn test_other_labels_leave_score() {
        let mut c = estimator();
        for emotion in [
            EmotionLabel::Angry,
            EmotionLabel::Fearful,
            EmotionLabel::Disgusted,
            EmotionLabel::Surprised,
            EmotionLabel::NoFaceDetected,
        ] {
            assert_eq!(c.observe(emotion), 0);
        }
        assert_eq!(c.score(), 75);
    }

    #[test]
    fn test_clamps_at_bounds() {
        let mut c = estimator();
        for _ in 0..100 {
            c.observe(EmotionLabel::Happy);
        }
        assert_eq!(c.score(), 95);
        assert_eq!(c.jitter(2), 0);

        for _ in 0..100 {
            c.observe(EmotionLabel::Nervous);
        }
        assert_eq!(c.score(), 30);
        assert_eq!(c.jitter(-2), 0);
        assert_eq!(c.observe(EmotionLabel::Sad), 0);
    }

    #[test]
    fn test_partial_step_near_floor() {
        let mut c = estimator();
        while c.score() > 31 {
            c.jitter(-1);
        }
        assert_eq!(c.observe(EmotionLabel::Nervous), -1);
        assert_eq!(c.score(), 30);
    }

    #[test]
    fn test_arbitrary_interleaving_stays_in_range() {
        let mut c = estimator();
        let emotions = EmotionLabel::ALL;
        for i in 0..5_000usize {
            if i % 3 == 0 {
                c.jitter(random_jitter(2));
            } else {
                c.observe(emotions[(i * 7) % emotions.len()]);
            }
            assert!((30..=95).contains(&c.score()), "score {} escaped", c.score());
        }
    }

    #[test]
    fn test_random_jitter_magnitude() {
        for _ in 0..200 {
            assert_eq!(random_jitter(2).abs(), 2);
        }
    }

    #[test]
    fn test_reset() {
        let mut c = estimator();
        c.observe(EmotionLabel::Sad);
        c.reset();
        assert_eq!(c.score(), 75);
    }
}
