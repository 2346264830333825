//! Calibration step identifiers, statuses, and per-step state

use face_geometry::HeadDirection;
use serde::{Deserialize, Serialize};

/// The four head-sweep directions step 3 must observe
pub const SWEEP_DIRECTIONS: [HeadDirection; 4] = [
    HeadDirection::Left,
    HeadDirection::Right,
    HeadDirection::Up,
    HeadDirection::Down,
];

/// Calibration step identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepId {
    Lighting,
    PersonCount,
    HeadSweep,
    GazeCalibration,
}

impl StepId {
    /// 1-based step number as shown to the user
    pub fn number(self) -> u8 {
        match self {
            StepId::Lighting => 1,
            StepId::PersonCount => 2,
            StepId::HeadSweep => 3,
            StepId::GazeCalibration => 4,
        }
    }

    /// Step for a 1-based number
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(StepId::Lighting),
            2 => Some(StepId::PersonCount),
            3 => Some(StepId::HeadSweep),
            4 => Some(StepId::GazeCalibration),
            _ => None,
        }
    }
}

/// Static step metadata for presentation
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StepInfo {
    pub id: StepId,
    pub label: &'static str,
    pub description: &'static str,
}

/// The calibration steps in order
pub const CALIBRATION_STEPS: [StepInfo; 4] = [
    StepInfo {
        id: StepId::Lighting,
        label: "Check Lighting",
        description: "Detecting face...",
    },
    StepInfo {
        id: StepId::PersonCount,
        label: "Person Count",
        description: "Checking single person...",
    },
    StepInfo {
        id: StepId::HeadSweep,
        label: "Head Direction",
        description: "Look in all directions",
    },
    StepInfo {
        id: StepId::GazeCalibration,
        label: "Gaze Calibration",
        description: "Follow the red ball",
    },
];

/// Per-step status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StepStatus {
    #[default]
    Pending,
    Checking,
    Passed,
    Failed,
}

/// Monotone per-direction flags for the head sweep step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionChecks {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl DirectionChecks {
    /// Mark a direction as seen. CENTER and already-seen directions are
    /// no-ops. Returns true when a flag newly flipped.
    pub fn mark(&mut self, direction: HeadDirection) -> bool {
        let flag = match direction {
            HeadDirection::Left => &mut self.left,
            HeadDirection::Right => &mut self.right,
            HeadDirection::Up => &mut self.up,
            HeadDirection::Down => &mut self.down,
            HeadDirection::Center => return false,
        };
        let newly = !*flag;
        *flag = true;
        newly
    }

    /// Whether a direction has been seen
    pub fn seen(&self, direction: HeadDirection) -> bool {
        match direction {
            HeadDirection::Left => self.left,
            HeadDirection::Right => self.right,
            HeadDirection::Up => self.up,
            HeadDirection::Down => self.down,
            HeadDirection::Center => false,
        }
    }

    /// All four sweep directions observed
    pub fn all_seen(&self) -> bool {
        self.left && self.right && self.up && self.down
    }

    /// Sweep directions not yet observed, in display order
    pub fn remaining(&self) -> Vec<HeadDirection> {
        SWEEP_DIRECTIONS
            .into_iter()
            .filter(|d| !self.seen(*d))
            .collect()
    }
}

/// Mutable state of one calibration step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepState {
    pub status: StepStatus,
    /// Failure reason for steps 1, 2, and 4
    pub error: Option<String>,
    /// Direction flags, meaningful for the head sweep step only
    pub directions: DirectionChecks,
}
