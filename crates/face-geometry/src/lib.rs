//! Facial landmark geometry
//!
//! Pure, frame-local feature extraction from face mesh landmarks:
//! - Head pose estimation (yaw, pitch, roll + coarse direction)
//! - Gaze estimation (iris position, direction, screen-relative point)
//! - Per-frame face observation snapshots
//!
//! No state is kept between frames; every estimate is derived from a
//! single landmark sequence.

pub mod gaze;
pub mod head_pose;
pub mod landmarks;
pub mod observation;

pub use gaze::{Gaze, GazeDirection};
pub use head_pose::{HeadDirection, HeadPose};
pub use landmarks::{FaceLandmarks, Landmark, LANDMARK_COUNT};
pub use observation::{FaceMetrics, FaceObservation};

use thiserror::Error;

/// Geometry error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Expected {LANDMARK_COUNT} landmarks, got {0}")]
    LandmarkCount(usize),

    #[error("Degenerate face geometry: {0}")]
    DegenerateFace(&'static str),
}
