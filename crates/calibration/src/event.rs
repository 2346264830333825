//! Session events and the commands the reducer emits

use face_geometry::FaceObservation;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// User-initiated actions. Each is a safe no-op unless the session is
/// in the state that enables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserAction {
    /// Start the calibration session
    Begin,
    /// Move past a passed step
    Advance,
    /// Re-run a failed step's check
    Retry,
    /// Clear a fullscreen violation by going back to fullscreen
    ReturnToFullscreen,
}

/// What a pending timer is for. One timer per purpose is live at a
/// time; arming a purpose supersedes its previous timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerId {
    /// Step 1/2 delayed check
    StepCheck,
    /// Gaze target dwell window
    Dwell,
    /// Countdown display tick
    Countdown,
}

/// Handle for one armed timer. The epoch lets the session ignore
/// firings from timers it has since abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerToken {
    pub id: TimerId,
    pub epoch: u64,
}

/// Inbound session events, applied strictly in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A new per-frame face observation from the detector
    Frame(FaceObservation),
    /// An armed timer elapsed
    TimerFired(TimerToken),
    /// A user action
    Action(UserAction),
    /// The platform's fullscreen state changed
    FullscreenChanged(bool),
}

/// Side effects requested by the reducer, executed by the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Arm a timer; any prior timer with the same id is superseded
    StartTimer { token: TimerToken, after: Duration },
    /// Ask the platform to enter fullscreen (best effort)
    EnterFullscreen,
}
