//! Proctoring calibration engine
//!
//! Drives the pre-activity calibration flow:
//! 1. Lighting / face presence check
//! 2. Single person check
//! 3. Head direction sweep (left, right, up, down)
//! 4. Gaze bounds calibration against fixation targets
//!
//! followed by continuous out-of-bounds gaze monitoring. The session is
//! a synchronous reducer over discrete events (frames, timers, user
//! actions, fullscreen changes); timers are requested as commands and
//! executed by the caller, which keeps the whole machine deterministic
//! under test.

pub mod config;
pub mod event;
pub mod monitor;
pub mod sequencer;
pub mod session;
pub mod step;

pub use config::CalibrationConfig;
pub use event::{Command, SessionEvent, TimerId, TimerToken, UserAction};
pub use monitor::{GazeBounds, GazeMonitor};
pub use sequencer::{DwellOutcome, GazeTarget, GazeTargetSequencer, GAZE_TARGETS};
pub use session::{CalibrationSession, GazeTargetState, SessionSnapshot};
pub use step::{DirectionChecks, StepId, StepInfo, StepState, StepStatus, CALIBRATION_STEPS, SWEEP_DIRECTIONS};
