//! Calibration configuration

use serde::{Deserialize, Serialize};

/// Calibration timing and tolerance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Delay before the step 1/2 checks evaluate (milliseconds)
    pub check_delay_ms: u64,

    /// Dwell window per gaze fixation target (milliseconds)
    pub dwell_ms: u64,

    /// Countdown display tick interval (milliseconds)
    pub countdown_tick_ms: u64,

    /// Tolerance margin around the calibrated gaze bounds
    /// (normalized gaze units)
    pub gaze_margin: f32,

    /// Offer a retry when gaze calibration collects no samples
    pub allow_gaze_retry: bool,

    /// Restart the current target's dwell window when it expires during
    /// a fullscreen violation, instead of letting it run through
    pub pause_dwell_on_violation: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            check_delay_ms: 2000,
            dwell_ms: 5000,
            countdown_tick_ms: 1000,
            gaze_margin: 0.05,
            allow_gaze_retry: true,
            pause_dwell_on_violation: false,
        }
    }
}

impl CalibrationConfig {
    /// Countdown start value shown per target (whole seconds of dwell)
    pub fn countdown_start(&self) -> u32 {
        (self.dwell_ms / 1000) as u32
    }
}
