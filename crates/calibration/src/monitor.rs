//! Calibrated gaze bounds and the out-of-bounds monitor

use face_geometry::Gaze;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in gaze-normalized coordinates covering the
/// user's calibrated "looking at the screen" range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl GazeBounds {
    /// Bounding rectangle of a set of gaze points, or None when empty
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a (f32, f32)>,
    {
        let mut bounds: Option<GazeBounds> = None;
        for &(x, y) in points {
            bounds = Some(match bounds {
                None => GazeBounds {
                    min_x: x,
                    max_x: x,
                    min_y: y,
                    max_y: y,
                },
                Some(b) => GazeBounds {
                    min_x: b.min_x.min(x),
                    max_x: b.max_x.max(x),
                    min_y: b.min_y.min(y),
                    max_y: b.max_y.max(y),
                },
            });
        }
        bounds
    }

    /// Whether a gaze point falls inside the bounds expanded by the
    /// margin. Points exactly on the expanded edge count as inside.
    pub fn contains(&self, x: f32, y: f32, margin: f32) -> bool {
        !(x < self.min_x - margin
            || x > self.max_x + margin
            || y < self.min_y - margin
            || y > self.max_y + margin)
    }
}

/// Post-calibration watchdog comparing live gaze against the calibrated
/// bounds. Per-frame, no hysteresis: flicker at the boundary is
/// accepted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GazeMonitor {
    bounds: GazeBounds,
    margin: f32,
}

impl GazeMonitor {
    pub fn new(bounds: GazeBounds, margin: f32) -> Self {
        Self { bounds, margin }
    }

    /// True when the gaze point is outside the calibrated range
    pub fn out_of_bounds(&self, gaze: &Gaze) -> bool {
        !self.bounds.contains(gaze.gaze_x, gaze.gaze_y, self.margin)
    }

    pub fn bounds(&self) -> GazeBounds {
        self.bounds
    }
}
