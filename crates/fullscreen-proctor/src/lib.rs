//! Fullscreen proctoring
//!
//! Watches fullscreen state transitions while a calibration session is
//! active and flags exits as violations. Platform-specific fullscreen
//! mechanics live behind the [`FullscreenApi`] capability trait; the
//! proctor itself only consumes the resulting boolean state.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fullscreen platform errors
#[derive(Error, Debug)]
pub enum FullscreenError {
    #[error("Fullscreen API not supported on this platform")]
    Unsupported,

    #[error("Fullscreen request rejected: {0}")]
    Rejected(String),
}

/// Platform fullscreen capability.
///
/// Request and exit are best-effort; callers log failures and carry on
/// without mandatory enforcement rather than aborting the session.
pub trait FullscreenApi: Send {
    /// Current fullscreen state
    fn is_fullscreen(&self) -> bool;

    /// Ask the platform to enter fullscreen
    fn request(&mut self) -> Result<(), FullscreenError>;

    /// Ask the platform to leave fullscreen
    fn exit(&mut self) -> Result<(), FullscreenError>;
}

/// Adapter for platforms without a fullscreen API. Every request fails;
/// the session then runs without fullscreen enforcement.
#[derive(Debug, Default)]
pub struct UnsupportedFullscreen {
    fullscreen: bool,
}

impl FullscreenApi for UnsupportedFullscreen {
    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn request(&mut self) -> Result<(), FullscreenError> {
        Err(FullscreenError::Unsupported)
    }

    fn exit(&mut self) -> Result<(), FullscreenError> {
        Err(FullscreenError::Unsupported)
    }
}

/// Emitted when an exit from fullscreen becomes a new violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationEvent {
    /// Total violations including this one
    pub violation_count: u32,
}

/// Tracks fullscreen state and violations across a session.
///
/// A violation is entered at most once per distinct exit: repeated
/// not-fullscreen notifications while already violating are collapsed,
/// since multiple platform APIs can fire for the same transition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FullscreenProctor {
    /// Last known fullscreen state
    pub is_fullscreen: bool,
    /// True while the user is out of fullscreen during an armed session
    pub violation: bool,
    /// Total distinct exits while armed; never decremented
    pub violation_count: u32,
}

impl FullscreenProctor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a fullscreen-state-change notification.
    ///
    /// `armed` is the caller's session condition (calibration started
    /// and not yet complete), evaluated at the moment of the event.
    /// Returns the violation event when this change enters a violation.
    pub fn observe_change(&mut self, is_fullscreen: bool, armed: bool) -> Option<ViolationEvent> {
        self.is_fullscreen = is_fullscreen;

        if is_fullscreen || !armed || self.violation {
            debug!(is_fullscreen, armed, violation = self.violation, "fullscreen change");
            return None;
        }

        self.violation = true;
        self.violation_count += 1;
        warn!(count = self.violation_count, "fullscreen violation");
        Some(ViolationEvent {
            violation_count: self.violation_count,
        })
    }

    /// Clear the violation flag after the user returns to fullscreen.
    /// The violation count is cumulative and stays.
    pub fn acknowledge_return(&mut self) {
        if self.violation {
            info!(count = self.violation_count, "violation cleared, returning to fullscreen");
        }
        self.violation = false;
    }
}
