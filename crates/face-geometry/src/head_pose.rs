//! Head pose estimation from face mesh landmarks
//!
//! Yaw and pitch are expressed in scaled offset units (nose displacement
//! relative to face size, x100), roll in degrees. The coarse direction is
//! a priority chain: yaw decides first, then pitch, else CENTER.

use crate::landmarks::{FaceLandmarks, CHIN, LEFT_EYE_OUTER, NOSE_TIP, RIGHT_EYE_OUTER};
use crate::GeometryError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Yaw/pitch magnitude beyond which the head counts as turned
pub const HEAD_TURN_THRESHOLD: f32 = 15.0;

/// Coarse head direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HeadDirection {
    #[default]
    Center,
    Left,
    Right,
    Up,
    Down,
}

impl fmt::Display for HeadDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HeadDirection::Center => "CENTER",
            HeadDirection::Left => "LEFT",
            HeadDirection::Right => "RIGHT",
            HeadDirection::Up => "UP",
            HeadDirection::Down => "DOWN",
        };
        write!(f, "{label}")
    }
}

/// Head pose estimate for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadPose {
    /// Left-right rotation (negative = left)
    pub yaw: f32,
    /// Up-down tilt (negative = up)
    pub pitch: f32,
    /// Side tilt in degrees
    pub roll: f32,
    /// Coarse direction classification
    pub direction: HeadDirection,
}

impl HeadPose {
    /// Classify yaw/pitch into a coarse direction.
    ///
    /// Yaw takes priority over pitch; values exactly at the threshold
    /// classify as CENTER.
    pub fn classify(yaw: f32, pitch: f32) -> HeadDirection {
        if yaw < -HEAD_TURN_THRESHOLD {
            HeadDirection::Left
        } else if yaw > HEAD_TURN_THRESHOLD {
            HeadDirection::Right
        } else if pitch < -HEAD_TURN_THRESHOLD {
            HeadDirection::Up
        } else if pitch > HEAD_TURN_THRESHOLD {
            HeadDirection::Down
        } else {
            HeadDirection::Center
        }
    }
}

/// Estimate head pose from one face's landmarks.
///
/// Yaw is the nose tip's horizontal offset from the eye-line midpoint,
/// normalized by face width. Pitch compares the nose tip against an
/// expected vertical position 30% of face height below the eye line.
/// Roll is the eye line's angle from horizontal.
pub fn estimate_head_pose(face: &FaceLandmarks) -> Result<HeadPose, GeometryError> {
    let nose_tip = face.point(NOSE_TIP);
    let chin = face.point(CHIN);
    let left_eye = face.point(LEFT_EYE_OUTER);
    let right_eye = face.point(RIGHT_EYE_OUTER);

    let face_width = (right_eye.x - left_eye.x).abs();
    if face_width == 0.0 {
        return Err(GeometryError::DegenerateFace("zero face width"));
    }
    let eye_mid_x = (left_eye.x + right_eye.x) / 2.0;
    let yaw = (nose_tip.x - eye_mid_x) / face_width * 100.0;

    let eye_mid_y = (left_eye.y + right_eye.y) / 2.0;
    let face_height = (chin.y - eye_mid_y).abs();
    if face_height == 0.0 {
        return Err(GeometryError::DegenerateFace("zero face height"));
    }
    let expected_nose_y = eye_mid_y + face_height * 0.3;
    let pitch = (nose_tip.y - expected_nose_y) / face_height * 100.0;

    let roll = (right_eye.y - left_eye.y)
        .atan2(right_eye.x - left_eye.x)
        .to_degrees();

    Ok(HeadPose {
        yaw,
        pitch,
        roll,
        direction: HeadPose::classify(yaw, pitch),
    })
}
