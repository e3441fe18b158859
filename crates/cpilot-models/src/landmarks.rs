//! 68-point facial landmark sets.
//!
//! # Landmarks Layout (68-point convention)
//!
//! - 0-16: Jaw outline
//! - 17-21: Right eyebrow
//! - 22-26: Left eyebrow
//! - 27-35: Nose
//! - 36-41: Right eye (image left)
//! - 42-47: Left eye (image right)
//! - 48-59: Outer lip
//! - 60-67: Inner lip
//!
//! Only the two outer eye corners are consumed by the attention heuristic.

use serde::{Deserialize, Serialize};
use std::ops::Index;

use crate::error::{ModelError, ModelResult};

/// Number of points in a landmark set.
pub const LANDMARK_COUNT: usize = 68;

/// Outer corner of the eye on the left side of the image.
pub const LEFT_EYE_OUTER: usize = 36;

/// Outer corner of the eye on the right side of the image.
pub const RIGHT_EYE_OUTER: usize = 45;

/// A 2-D point in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Landmarks for one detected face.
///
/// Always holds exactly [`LANDMARK_COUNT`] points; construction from any
/// other length fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct LandmarkSet {
    points: Vec<Point>,
}

impl LandmarkSet {
    /// Create a landmark set from detector output.
    pub fn new(points: Vec<Point>) -> ModelResult<Self> {
        if points.len() != LANDMARK_COUNT {
            return Err(ModelError::invalid_landmark_count(
                LANDMARK_COUNT,
                points.len(),
            ));
        }
        Ok(Self { points })
    }

    /// Build a set where every point sits at the origin except the two
    /// outer eye corners.
    ///
    /// Useful for detectors that only locate the eyes, and for tests.
    pub fn from_eye_corners(left: Point, right: Point) -> Self {
        let mut points = vec![Point::default(); LANDMARK_COUNT];
        points[LEFT_EYE_OUTER] = left;
        points[RIGHT_EYE_OUTER] = right;
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    pub fn left_eye_outer(&self) -> Point {
        self.points[LEFT_EYE_OUTER]
    }

    pub fn right_eye_outer(&self) -> Point {
        self.points[RIGHT_EYE_OUTER]
    }
}

impl Index<usize> for LandmarkSet {
    type Output = Point;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl TryFrom<Vec<Point>> for LandmarkSet {
    type Error = ModelError;

    fn try_from(points: Vec<Point>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<LandmarkSet> for Vec<Point> {
    fn from(set: LandmarkSet) -> Self {
        set.points
    }
}
