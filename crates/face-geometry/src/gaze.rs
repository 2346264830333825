//! Gaze estimation from eye corner and iris landmarks
//!
//! Each iris is interpolated between its eye's two corner landmarks to a
//! nominal [0,1] horizontal position; the two eyes are averaged and
//! classified left/center/right. The continuous screen-gaze point is the
//! midpoint of the two iris centers and is deliberately left unclamped:
//! landmark noise at frame edges can push it outside [0,1], and the
//! calibration bounds absorb that.

use crate::landmarks::{
    FaceLandmarks, LEFT_EYE_INNER, LEFT_EYE_OUTER, LEFT_IRIS, RIGHT_EYE_INNER, RIGHT_EYE_OUTER,
    RIGHT_IRIS,
};
use crate::GeometryError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Iris position below this counts as looking left
pub const GAZE_LEFT_THRESHOLD: f32 = 0.4;
/// Iris position above this counts as looking right
pub const GAZE_RIGHT_THRESHOLD: f32 = 0.6;

/// Coarse gaze direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GazeDirection {
    #[default]
    Center,
    Left,
    Right,
}

impl fmt::Display for GazeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GazeDirection::Center => "CENTER",
            GazeDirection::Left => "LEFT",
            GazeDirection::Right => "RIGHT",
        };
        write!(f, "{label}")
    }
}

/// Gaze estimate for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Gaze {
    /// Left iris position within the left eye (nominal [0,1])
    pub left_iris_pos: f32,
    /// Right iris position within the right eye (nominal [0,1])
    pub right_iris_pos: f32,
    /// Coarse direction from the averaged iris positions
    pub direction: GazeDirection,
    /// Screen-relative gaze point, midpoint of the iris centers
    pub gaze_x: f32,
    pub gaze_y: f32,
}

impl Gaze {
    /// Classify an averaged iris position
    pub fn classify(avg_iris_pos: f32) -> GazeDirection {
        if avg_iris_pos < GAZE_LEFT_THRESHOLD {
            GazeDirection::Left
        } else if avg_iris_pos > GAZE_RIGHT_THRESHOLD {
            GazeDirection::Right
        } else {
            GazeDirection::Center
        }
    }
}

/// Estimate gaze from one face's landmarks
pub fn estimate_gaze(face: &FaceLandmarks) -> Result<Gaze, GeometryError> {
    let left_outer = face.point(LEFT_EYE_OUTER);
    let left_inner = face.point(LEFT_EYE_INNER);
    let left_iris = face.point(LEFT_IRIS);

    let right_inner = face.point(RIGHT_EYE_INNER);
    let right_outer = face.point(RIGHT_EYE_OUTER);
    let right_iris = face.point(RIGHT_IRIS);

    let left_eye_width = left_inner.x - left_outer.x;
    if left_eye_width == 0.0 {
        return Err(GeometryError::DegenerateFace("zero left eye width"));
    }
    let left_iris_pos = (left_iris.x - left_outer.x) / left_eye_width;

    let right_eye_width = right_outer.x - right_inner.x;
    if right_eye_width == 0.0 {
        return Err(GeometryError::DegenerateFace("zero right eye width"));
    }
    let right_iris_pos = (right_iris.x - right_inner.x) / right_eye_width;

    let avg_iris_pos = (left_iris_pos + right_iris_pos) / 2.0;

    Ok(Gaze {
        left_iris_pos,
        right_iris_pos,
        direction: Gaze::classify(avg_iris_pos),
        gaze_x: (left_iris.x + right_iris.x) / 2.0,
        gaze_y: (left_iris.y + right_iris.y) / 2.0,
    })
}
