//! Landmark types and face mesh index constants

use crate::GeometryError;
use serde::{Deserialize, Serialize};

/// Number of landmarks in a refined face mesh (468 mesh points + 10 iris points).
pub const LANDMARK_COUNT: usize = 478;

/// Nose tip
pub const NOSE_TIP: usize = 1;
/// Chin bottom
pub const CHIN: usize = 152;
/// Left eye outer corner
pub const LEFT_EYE_OUTER: usize = 33;
/// Left eye inner corner
pub const LEFT_EYE_INNER: usize = 133;
/// Right eye inner corner
pub const RIGHT_EYE_INNER: usize = 362;
/// Right eye outer corner
pub const RIGHT_EYE_OUTER: usize = 263;
/// Left iris center
pub const LEFT_IRIS: usize = 468;
/// Right iris center
pub const RIGHT_IRIS: usize = 473;

/// One tracked face point, normalized to frame dimensions (x, y in [0,1]).
/// Depth is relative and carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    /// Create a landmark at (x, y) with zero depth
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }
}

/// A complete, ordered landmark sequence for one detected face.
///
/// Length is validated once at construction; indexing afterwards is
/// infallible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmarks {
    points: Vec<Landmark>,
}

impl FaceLandmarks {
    /// Wrap a detector output, checking the fixed sequence length
    pub fn new(points: Vec<Landmark>) -> Result<Self, GeometryError> {
        if points.len() != LANDMARK_COUNT {
            return Err(GeometryError::LandmarkCount(points.len()));
        }
        Ok(Self { points })
    }

    /// Get the landmark at a mesh index
    pub fn point(&self, index: usize) -> Landmark {
        self.points[index]
    }

    /// All landmarks in mesh order
    pub fn points(&self) -> &[Landmark] {
        &self.points
    }
}
