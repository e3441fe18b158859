//! Expression labels and per-frame expression probabilities.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Expression labels emitted by the expression classifier.
///
/// Declaration order is the detector's emission order and decides arg-max
/// ties (the first label wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionLabel {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

impl ExpressionLabel {
    /// All labels in enumeration order.
    pub const ALL: [ExpressionLabel; 7] = [
        ExpressionLabel::Neutral,
        ExpressionLabel::Happy,
        ExpressionLabel::Sad,
        ExpressionLabel::Angry,
        ExpressionLabel::Fearful,
        ExpressionLabel::Disgusted,
        ExpressionLabel::Surprised,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpressionLabel::Neutral => "neutral",
            ExpressionLabel::Happy => "happy",
            ExpressionLabel::Sad => "sad",
            ExpressionLabel::Angry => "angry",
            ExpressionLabel::Fearful => "fearful",
            ExpressionLabel::Disgusted => "disgusted",
            ExpressionLabel::Surprised => "surprised",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ExpressionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExpressionLabel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExpressionLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| ModelError::UnknownExpression(s.to_string()))
    }
}

/// Probability per expression label for one frame.
///
/// Values are clamped to `[0, 1]` on the way in and non-finite values are
/// stored as `0`. The distribution need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "ExpressionMap", into = "ExpressionMap")]
pub struct ExpressionVector {
    probabilities: [f64; 7],
}

impl ExpressionVector {
    /// Build a vector from `(label, probability)` pairs; missing labels are 0.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (ExpressionLabel, f64)>) -> Self {
        let mut vector = Self::default();
        for (label, probability) in pairs {
            vector.set(label, probability);
        }
        vector
    }

    pub fn get(&self, label: ExpressionLabel) -> f64 {
        self.probabilities[label.index()]
    }

    pub fn set(&mut self, label: ExpressionLabel, probability: f64) {
        self.probabilities[label.index()] = sanitize(probability);
    }

    /// Iterate `(label, probability)` in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (ExpressionLabel, f64)> + '_ {
        ExpressionLabel::ALL
            .into_iter()
            .map(move |label| (label, self.get(label)))
    }

    /// Label with the highest probability; ties keep the earliest label.
    pub fn dominant(&self) -> ExpressionLabel {
        self.iter()
            .fold((ExpressionLabel::Neutral, f64::NEG_INFINITY), |best, (label, p)| {
                if p > best.1 {
                    (label, p)
                } else {
                    best
                }
            })
            .0
    }

    pub fn neutral(&self) -> f64 {
        self.get(ExpressionLabel::Neutral)
    }

    pub fn happy(&self) -> f64 {
        self.get(ExpressionLabel::Happy)
    }

    pub fn sad(&self) -> f64 {
        self.get(ExpressionLabel::Sad)
    }

    pub fn fearful(&self) -> f64 {
        self.get(ExpressionLabel::Fearful)
    }

    pub fn surprised(&self) -> f64 {
        self.get(ExpressionLabel::Surprised)
    }
}

fn sanitize(probability: f64) -> f64 {
    if probability.is_finite() {
        probability.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Wire shape of an expression vector: an object keyed by label.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
struct ExpressionMap {
    neutral: f64,
    happy: f64,
    sad: f64,
    angry: f64,
    fearful: f64,
    disgusted: f64,
    surprised: f64,
}

impl From<ExpressionMap> for ExpressionVector {
    fn from(map: ExpressionMap) -> Self {
        ExpressionVector::from_pairs([
            (ExpressionLabel::Neutral, map.neutral),
            (ExpressionLabel::Happy, map.happy),
            (ExpressionLabel::Sad, map.sad),
            (ExpressionLabel::Angry, map.angry),
            (ExpressionLabel::Fearful, map.fearful),
            (ExpressionLabel::Disgusted, map.disgusted),
            (ExpressionLabel::Surprised, map.surprised),
        ])
    }
}

impl From<ExpressionVector> for ExpressionMap {
    fn from(vector: ExpressionVector) -> Self {
        ExpressionMap {
            neutral: vector.get(ExpressionLabel::Neutral),
            happy: vector.get(ExpressionLabel::Happy),
            sad: vector.get(ExpressionLabel::Sad),
            angry: vector.get(ExpressionLabel::Angry),
            fearful: vector.get(ExpressionLabel::Fearful),
            disgusted: vector.get(ExpressionLabel::Disgusted),
            surprised: vector.get(ExpressionLabel::Surprised),
        }
    }
}
