//! Per-frame face observation snapshots

use crate::gaze::{estimate_gaze, Gaze};
use crate::head_pose::{estimate_head_pose, HeadPose};
use crate::landmarks::FaceLandmarks;
use crate::GeometryError;
use serde::{Deserialize, Serialize};

/// Derived metrics for the primary detected face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceMetrics {
    pub head_pose: HeadPose,
    pub gaze: Gaze,
}

/// One frame's detection result: how many faces were seen, and the
/// primary face's derived metrics when at least one was.
///
/// Replaced wholesale every frame; consumers only ever read the most
/// recent observation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceObservation {
    /// Total faces the detector reported
    pub face_count: usize,
    /// Metrics for the first detected face, if any
    pub primary: Option<FaceMetrics>,
}

impl FaceObservation {
    /// Build an observation from a detector's face list.
    ///
    /// Only the first face is analysed; the rest contribute to the count.
    pub fn from_faces(faces: &[FaceLandmarks]) -> Result<Self, GeometryError> {
        let primary = match faces.first() {
            Some(face) => Some(FaceMetrics {
                head_pose: estimate_head_pose(face)?,
                gaze: estimate_gaze(face)?,
            }),
            None => None,
        };
        Ok(Self {
            face_count: faces.len(),
            primary,
        })
    }

    /// Whether any face was detected this frame
    pub fn face_present(&self) -> bool {
        self.primary.is_some()
    }

    /// Gaze of the primary face, if one was detected
    pub fn gaze(&self) -> Option<&Gaze> {
        self.primary.as_ref().map(|m| &m.gaze)
    }

    /// Head pose of the primary face, if one was detected
    pub fn head_pose(&self) -> Option<&HeadPose> {
        self.primary.as_ref().map(|m| &m.head_pose)
    }
}
