//! The calibration session reducer
//!
//! Owns the whole session state and applies one event at a time:
//! frames, timer firings, user actions, and fullscreen changes. Side
//! effects (timers, fullscreen requests) are returned as commands for
//! the runtime to execute, so the machine itself stays synchronous and
//! deterministic.

use crate::config::CalibrationConfig;
use crate::event::{Command, SessionEvent, TimerId, TimerToken, UserAction};
use crate::monitor::{GazeBounds, GazeMonitor};
use crate::sequencer::{DwellOutcome, GazeTargetSequencer, GAZE_TARGETS};
use crate::step::{StepId, StepState, StepStatus, CALIBRATION_STEPS};
use face_geometry::{FaceObservation, HeadDirection};
use fullscreen_proctor::FullscreenProctor;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Last issued epoch per timer purpose. A fired token is accepted only
/// if it matches; anything else is a stale timer from an abandoned
/// step or target.
#[derive(Debug, Clone, Default)]
struct TimerLedger {
    step_check: Option<u64>,
    dwell: Option<u64>,
    countdown: Option<u64>,
}

impl TimerLedger {
    fn slot(&mut self, id: TimerId) -> &mut Option<u64> {
        match id {
            TimerId::StepCheck => &mut self.step_check,
            TimerId::Dwell => &mut self.dwell,
            TimerId::Countdown => &mut self.countdown,
        }
    }

    /// Accept and consume a fired token if it is the live one
    fn accept(&mut self, token: TimerToken) -> bool {
        let slot = self.slot(token.id);
        if *slot == Some(token.epoch) {
            *slot = None;
            true
        } else {
            false
        }
    }
}

/// Sequencer progress for presentation
#[derive(Debug, Clone, Serialize)]
pub struct GazeTargetState {
    pub label: &'static str,
    pub index: usize,
    pub total: usize,
    pub countdown: u32,
}

/// Read-only projection of the session for a presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub current_step: u8,
    pub steps: Vec<StepState>,
    pub remaining_directions: Vec<HeadDirection>,
    pub face_count: usize,
    pub gaze_bounds: Option<GazeBounds>,
    pub out_of_bounds: bool,
    pub calibration_complete: bool,
    pub fullscreen_violation: bool,
    pub violation_count: u32,
    pub gaze_target: Option<GazeTargetState>,
    pub header: String,
}

/// The calibration session state machine.
///
/// Step numbering follows the user-visible flow: 0 = not started,
/// 1..=4 = the active step. A step only advances past `Passed` status,
/// and only by the explicit advance action.
#[derive(Debug)]
pub struct CalibrationSession {
    config: CalibrationConfig,
    current_step: u8,
    steps: [StepState; 4],
    observation: FaceObservation,
    sequencer: Option<GazeTargetSequencer>,
    gaze_bounds: Option<GazeBounds>,
    monitor: Option<GazeMonitor>,
    out_of_bounds: bool,
    complete: bool,
    proctor: FullscreenProctor,
    ledger: TimerLedger,
    next_epoch: u64,
}

impl CalibrationSession {
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            current_step: 0,
            steps: Default::default(),
            observation: FaceObservation::default(),
            sequencer: None,
            gaze_bounds: None,
            monitor: None,
            out_of_bounds: false,
            complete: false,
            proctor: FullscreenProctor::new(),
            ledger: TimerLedger::default(),
            next_epoch: 0,
        }
    }

    /// Apply one event, returning the commands to execute
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Command> {
        match event {
            SessionEvent::Frame(observation) => self.on_frame(observation),
            SessionEvent::TimerFired(token) => self.on_timer(token),
            SessionEvent::Action(action) => self.on_action(action),
            SessionEvent::FullscreenChanged(is_fullscreen) => self.on_fullscreen(is_fullscreen),
        }
    }

    fn on_frame(&mut self, observation: FaceObservation) -> Vec<Command> {
        self.observation = observation;

        // Behind the violation overlay nothing progresses
        if self.proctor.violation {
            return Vec::new();
        }

        if self.complete {
            if let (Some(monitor), Some(gaze)) = (&self.monitor, self.observation.gaze()) {
                let out = monitor.out_of_bounds(gaze);
                if out != self.out_of_bounds {
                    debug!(out_of_bounds = out, "gaze monitor state changed");
                }
                self.out_of_bounds = out;
            }
            return Vec::new();
        }

        match self.active_step() {
            Some(StepId::HeadSweep) if self.steps[2].status == StepStatus::Checking => {
                if let Some(pose) = self.observation.head_pose() {
                    let direction = pose.direction;
                    let step = &mut self.steps[2];
                    if step.directions.mark(direction) {
                        info!(%direction, "head sweep direction observed");
                    }
                    if step.directions.all_seen() {
                        step.status = StepStatus::Passed;
                        info!("head sweep complete");
                    }
                }
            }
            Some(StepId::GazeCalibration) if self.steps[3].status == StepStatus::Checking => {
                if let Some(gaze) = self.observation.gaze().copied() {
                    if let Some(sequencer) = &mut self.sequencer {
                        sequencer.record(gaze.gaze_x, gaze.gaze_y);
                    }
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn on_timer(&mut self, token: TimerToken) -> Vec<Command> {
        if !self.ledger.accept(token) {
            debug!(?token, "stale timer ignored");
            return Vec::new();
        }
        match token.id {
            TimerId::StepCheck => self.evaluate_step_check(),
            TimerId::Dwell => self.on_dwell_elapsed(),
            TimerId::Countdown => self.on_countdown_tick(),
        }
    }

    /// Evaluate a step 1/2 check against the observation current at
    /// firing time, not at scheduling time
    fn evaluate_step_check(&mut self) -> Vec<Command> {
        match self.active_step() {
            Some(StepId::Lighting) => {
                let step = &mut self.steps[0];
                if self.observation.face_present() {
                    step.status = StepStatus::Passed;
                    step.error = None;
                    info!("lighting check passed");
                } else {
                    step.status = StepStatus::Failed;
                    step.error = Some("No face detected".to_string());
                    warn!("lighting check failed: no face detected");
                }
            }
            Some(StepId::PersonCount) => {
                let count = self.observation.face_count;
                let step = &mut self.steps[1];
                if count == 1 {
                    step.status = StepStatus::Passed;
                    step.error = None;
                    info!("single person confirmed");
                } else {
                    step.status = StepStatus::Failed;
                    step.error = Some(format!("Detected {count} faces"));
                    warn!(count, "person count check failed");
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn on_dwell_elapsed(&mut self) -> Vec<Command> {
        if self.active_step() != Some(StepId::GazeCalibration) {
            return Vec::new();
        }

        if self.proctor.violation && self.config.pause_dwell_on_violation {
            // Restart this target's full window rather than consuming it
            // while the user is out of fullscreen
            if let Some(sequencer) = &mut self.sequencer {
                sequencer.reset_countdown();
            }
            return vec![
                self.arm(TimerId::Dwell, self.config.dwell_ms),
                self.arm(TimerId::Countdown, self.config.countdown_tick_ms),
            ];
        }

        let outcome = match self.sequencer.as_mut() {
            Some(sequencer) => sequencer.dwell_elapsed(),
            None => return Vec::new(),
        };

        match outcome {
            DwellOutcome::NextTarget => vec![
                self.arm(TimerId::Dwell, self.config.dwell_ms),
                self.arm(TimerId::Countdown, self.config.countdown_tick_ms),
            ],
            DwellOutcome::Complete(Some(bounds)) => {
                self.sequencer = None;
                // Bounds are written at most once per session
                if self.gaze_bounds.is_none() {
                    self.gaze_bounds = Some(bounds);
                }
                let step = &mut self.steps[3];
                step.status = StepStatus::Passed;
                step.error = None;
                Vec::new()
            }
            DwellOutcome::Complete(None) => {
                self.sequencer = None;
                let step = &mut self.steps[3];
                step.status = StepStatus::Failed;
                step.error = Some("No gaze data".to_string());
                warn!("gaze calibration failed: no gaze data");
                Vec::new()
            }
        }
    }

    fn on_countdown_tick(&mut self) -> Vec<Command> {
        let remaining = match self.sequencer.as_mut() {
            Some(sequencer) => sequencer.tick(),
            None => return Vec::new(),
        };
        if remaining > 0 {
            vec![self.arm(TimerId::Countdown, self.config.countdown_tick_ms)]
        } else {
            Vec::new()
        }
    }

    fn on_action(&mut self, action: UserAction) -> Vec<Command> {
        match action {
            UserAction::ReturnToFullscreen => {
                if !self.proctor.violation {
                    return Vec::new();
                }
                self.proctor.acknowledge_return();
                vec![Command::EnterFullscreen]
            }
            _ if self.proctor.violation || self.complete => Vec::new(),
            UserAction::Begin => self.on_begin(),
            UserAction::Advance => self.on_advance(),
            UserAction::Retry => self.on_retry(),
        }
    }

    fn on_begin(&mut self) -> Vec<Command> {
        if self.current_step != 0 {
            return Vec::new();
        }
        self.current_step = 1;
        self.steps[0].status = StepStatus::Checking;
        info!("calibration session started");
        vec![
            Command::EnterFullscreen,
            self.arm(TimerId::StepCheck, self.config.check_delay_ms),
        ]
    }

    fn on_advance(&mut self) -> Vec<Command> {
        let Some(active) = self.active_step() else {
            return Vec::new();
        };
        if self.step(active).status != StepStatus::Passed {
            return Vec::new();
        }

        if active == StepId::GazeCalibration {
            self.complete = true;
            self.monitor = self
                .gaze_bounds
                .map(|bounds| GazeMonitor::new(bounds, self.config.gaze_margin));
            info!(bounds = ?self.gaze_bounds, "calibration complete");
            return Vec::new();
        }

        self.current_step += 1;
        info!(step = self.current_step, "advanced to step");
        match self.active_step() {
            Some(StepId::PersonCount) => {
                self.steps[1].status = StepStatus::Checking;
                vec![self.arm(TimerId::StepCheck, self.config.check_delay_ms)]
            }
            Some(StepId::HeadSweep) => {
                self.steps[2].status = StepStatus::Checking;
                Vec::new()
            }
            Some(StepId::GazeCalibration) => self.start_gaze_calibration(),
            _ => Vec::new(),
        }
    }

    fn on_retry(&mut self) -> Vec<Command> {
        let Some(active) = self.active_step() else {
            return Vec::new();
        };
        if self.step(active).status != StepStatus::Failed {
            return Vec::new();
        }

        match active {
            StepId::Lighting | StepId::PersonCount => {
                let step = &mut self.steps[(active.number() - 1) as usize];
                step.status = StepStatus::Checking;
                step.error = None;
                info!(step = active.number(), "retrying step check");
                vec![self.arm(TimerId::StepCheck, self.config.check_delay_ms)]
            }
            StepId::GazeCalibration if self.config.allow_gaze_retry => {
                info!("retrying gaze calibration");
                self.steps[3].error = None;
                self.start_gaze_calibration()
            }
            _ => Vec::new(),
        }
    }

    fn start_gaze_calibration(&mut self) -> Vec<Command> {
        self.steps[3].status = StepStatus::Checking;
        self.sequencer = Some(GazeTargetSequencer::new(self.config.countdown_start()));
        vec![
            self.arm(TimerId::Dwell, self.config.dwell_ms),
            self.arm(TimerId::Countdown, self.config.countdown_tick_ms),
        ]
    }

    fn on_fullscreen(&mut self, is_fullscreen: bool) -> Vec<Command> {
        // Arming is evaluated against the session state at event time
        let armed = self.current_step > 0 && !self.complete;
        self.proctor.observe_change(is_fullscreen, armed);
        Vec::new()
    }

    /// Arm a timer, superseding any live timer with the same purpose
    fn arm(&mut self, id: TimerId, after_ms: u64) -> Command {
        self.next_epoch += 1;
        let token = TimerToken {
            id,
            epoch: self.next_epoch,
        };
        *self.ledger.slot(id) = Some(token.epoch);
        Command::StartTimer {
            token,
            after: Duration::from_millis(after_ms),
        }
    }

    fn active_step(&self) -> Option<StepId> {
        StepId::from_number(self.current_step)
    }

    /// Current step number (0 = not started)
    pub fn current_step(&self) -> u8 {
        self.current_step
    }

    /// State of one step
    pub fn step(&self, id: StepId) -> &StepState {
        &self.steps[(id.number() - 1) as usize]
    }

    pub fn calibration_complete(&self) -> bool {
        self.complete
    }

    pub fn gaze_bounds(&self) -> Option<GazeBounds> {
        self.gaze_bounds
    }

    pub fn is_out_of_bounds(&self) -> bool {
        self.out_of_bounds
    }

    pub fn fullscreen_violation(&self) -> bool {
        self.proctor.violation
    }

    pub fn violation_count(&self) -> u32 {
        self.proctor.violation_count
    }

    /// Most recent face observation
    pub fn observation(&self) -> &FaceObservation {
        &self.observation
    }

    /// Sweep directions still missing in step 3
    pub fn remaining_directions(&self) -> Vec<HeadDirection> {
        self.steps[2].directions.remaining()
    }

    /// Header line for the presentation layer, recomputed from current
    /// state on every call
    pub fn header_text(&self) -> String {
        if self.proctor.violation {
            return "Fullscreen required!".to_string();
        }
        if self.complete {
            return "Calibration complete!".to_string();
        }
        let Some(active) = self.active_step() else {
            return "Press Start to begin calibration".to_string();
        };

        match active {
            StepId::Lighting => match self.steps[0].status {
                StepStatus::Checking => "Checking lighting...".to_string(),
                StepStatus::Failed => "Face not detected. Please ensure good lighting.".to_string(),
                StepStatus::Passed => "Lighting OK!".to_string(),
                StepStatus::Pending => CALIBRATION_STEPS[0].description.to_string(),
            },
            StepId::PersonCount => match self.steps[1].status {
                StepStatus::Checking => "Checking for single person...".to_string(),
                StepStatus::Failed => format!(
                    "Detected {} faces. Only 1 person allowed.",
                    self.observation.face_count
                ),
                StepStatus::Passed => "Single person confirmed!".to_string(),
                StepStatus::Pending => CALIBRATION_STEPS[1].description.to_string(),
            },
            StepId::HeadSweep => {
                let remaining = self.remaining_directions();
                if remaining.is_empty() {
                    "All directions checked!".to_string()
                } else {
                    let list = remaining
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("Look: {list}")
                }
            }
            StepId::GazeCalibration => "Follow the red ball with your eyes".to_string(),
        }
    }

    /// Read-only projection for the presentation layer
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_step: self.current_step,
            steps: self.steps.to_vec(),
            remaining_directions: self.remaining_directions(),
            face_count: self.observation.face_count,
            gaze_bounds: self.gaze_bounds,
            out_of_bounds: self.out_of_bounds,
            calibration_complete: self.complete,
            fullscreen_violation: self.proctor.violation,
            violation_count: self.proctor.violation_count,
            gaze_target: self.sequencer.as_ref().map(|s| GazeTargetState {
                label: s.current_target().label,
                index: s.target_index(),
                total: GAZE_TARGETS.len(),
                countdown: s.countdown(),
            }),
            header: self.header_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::SWEEP_DIRECTIONS;
    use face_geometry::{FaceMetrics, Gaze, HeadPose};
    use proptest::prelude::*;

    fn session() -> CalibrationSession {
        CalibrationSession::new(CalibrationConfig::default())
    }

    fn single_face() -> FaceObservation {
        FaceObservation {
            face_count: 1,
            primary: Some(FaceMetrics {
                head_pose: HeadPose::default(),
                gaze: Gaze::default(),
            }),
        }
    }

    fn faces(count: usize) -> FaceObservation {
        FaceObservation {
            face_count: count,
            primary: (count > 0).then(|| FaceMetrics {
                head_pose: HeadPose::default(),
                gaze: Gaze::default(),
            }),
        }
    }

    fn facing(direction: HeadDirection) -> FaceObservation {
        FaceObservation {
            face_count: 1,
            primary: Some(FaceMetrics {
                head_pose: HeadPose {
                    direction,
                    ..Default::default()
                },
                gaze: Gaze::default(),
            }),
        }
    }

    fn gazing(x: f32, y: f32) -> FaceObservation {
        FaceObservation {
            face_count: 1,
            primary: Some(FaceMetrics {
                head_pose: HeadPose::default(),
                gaze: Gaze {
                    gaze_x: x,
                    gaze_y: y,
                    ..Default::default()
                },
            }),
        }
    }

    /// Extract the timer tokens from a command batch
    fn timers(commands: &[Command]) -> Vec<TimerToken> {
        commands
            .iter()
            .filter_map(|c| match c {
                Command::StartTimer { token, .. } => Some(*token),
                Command::EnterFullscreen => None,
            })
            .collect()
    }

    fn timer_for(commands: &[Command], id: TimerId) -> TimerToken {
        timers(commands)
            .into_iter()
            .find(|t| t.id == id)
            .unwrap_or_else(|| panic!("no {id:?} timer in {commands:?}"))
    }

    /// Begin and pass steps 1 and 2 with a steady single face
    fn session_at_step3() -> CalibrationSession {
        let mut s = session();
        s.handle(SessionEvent::Frame(single_face()));

        let cmds = s.handle(SessionEvent::Action(UserAction::Begin));
        s.handle(SessionEvent::TimerFired(timer_for(&cmds, TimerId::StepCheck)));
        assert_eq!(s.step(StepId::Lighting).status, StepStatus::Passed);

        let cmds = s.handle(SessionEvent::Action(UserAction::Advance));
        s.handle(SessionEvent::TimerFired(timer_for(&cmds, TimerId::StepCheck)));
        assert_eq!(s.step(StepId::PersonCount).status, StepStatus::Passed);

        s.handle(SessionEvent::Action(UserAction::Advance));
        assert_eq!(s.current_step(), 3);
        s
    }

    /// Pass step 3 as well, leaving the session at step 4 checking
    fn session_at_step4() -> (CalibrationSession, Vec<Command>) {
        let mut s = session_at_step3();
        for direction in SWEEP_DIRECTIONS {
            s.handle(SessionEvent::Frame(facing(direction)));
        }
        assert_eq!(s.step(StepId::HeadSweep).status, StepStatus::Passed);
        let cmds = s.handle(SessionEvent::Action(UserAction::Advance));
        (s, cmds)
    }

    #[test]
    fn test_begin_enters_step1_and_requests_fullscreen() {
        let mut s = session();
        let cmds = s.handle(SessionEvent::Action(UserAction::Begin));

        assert_eq!(s.current_step(), 1);
        assert_eq!(s.step(StepId::Lighting).status, StepStatus::Checking);
        assert!(cmds.contains(&Command::EnterFullscreen));
        assert_eq!(timer_for(&cmds, TimerId::StepCheck).id, TimerId::StepCheck);
    }

    #[test]
    fn test_begin_twice_is_noop() {
        let mut s = session();
        s.handle(SessionEvent::Action(UserAction::Begin));
        let cmds = s.handle(SessionEvent::Action(UserAction::Begin));
        assert!(cmds.is_empty());
        assert_eq!(s.current_step(), 1);
    }

    #[test]
    fn test_step1_fails_without_face() {
        let mut s = session();
        let cmds = s.handle(SessionEvent::Action(UserAction::Begin));
        s.handle(SessionEvent::TimerFired(timer_for(&cmds, TimerId::StepCheck)));

        let step = s.step(StepId::Lighting);
        assert_eq!(step.status, StepStatus::Failed);
        assert_eq!(step.error.as_deref(), Some("No face detected"));
    }

    #[test]
    fn test_retry_reevaluates_observation_at_fire_time() {
        let mut s = session();
        let cmds = s.handle(SessionEvent::Action(UserAction::Begin));
        s.handle(SessionEvent::TimerFired(timer_for(&cmds, TimerId::StepCheck)));
        assert_eq!(s.step(StepId::Lighting).status, StepStatus::Failed);

        // Retry while still no face, then a face arrives before the
        // retry's timer fires
        let cmds = s.handle(SessionEvent::Action(UserAction::Retry));
        assert_eq!(s.step(StepId::Lighting).status, StepStatus::Checking);
        s.handle(SessionEvent::Frame(single_face()));
        s.handle(SessionEvent::TimerFired(timer_for(&cmds, TimerId::StepCheck)));

        assert_eq!(s.step(StepId::Lighting).status, StepStatus::Passed);
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let mut s = session();
        let first = s.handle(SessionEvent::Action(UserAction::Begin));
        let stale = timer_for(&first, TimerId::StepCheck);
        s.handle(SessionEvent::TimerFired(stale));
        assert_eq!(s.step(StepId::Lighting).status, StepStatus::Failed);

        // Retry arms a fresh timer; the old token must no longer apply
        s.handle(SessionEvent::Action(UserAction::Retry));
        s.handle(SessionEvent::Frame(single_face()));
        s.handle(SessionEvent::TimerFired(stale));
        assert_eq!(s.step(StepId::Lighting).status, StepStatus::Checking);
    }

    #[test]
    fn test_step2_requires_exactly_one_face() {
        let mut s = session();
        s.handle(SessionEvent::Frame(single_face()));
        let cmds = s.handle(SessionEvent::Action(UserAction::Begin));
        s.handle(SessionEvent::TimerFired(timer_for(&cmds, TimerId::StepCheck)));

        let cmds = s.handle(SessionEvent::Action(UserAction::Advance));
        s.handle(SessionEvent::Frame(faces(2)));
        s.handle(SessionEvent::TimerFired(timer_for(&cmds, TimerId::StepCheck)));

        let step = s.step(StepId::PersonCount);
        assert_eq!(step.status, StepStatus::Failed);
        assert_eq!(step.error.as_deref(), Some("Detected 2 faces"));
    }

    #[test]
    fn test_advance_requires_passed_status() {
        let mut s = session();
        s.handle(SessionEvent::Action(UserAction::Begin));
        // Step 1 still checking
        let cmds = s.handle(SessionEvent::Action(UserAction::Advance));
        assert!(cmds.is_empty());
        assert_eq!(s.current_step(), 1);
    }

    #[test]
    fn test_retry_when_not_failed_is_noop() {
        let mut s = session();
        s.handle(SessionEvent::Frame(single_face()));
        let cmds = s.handle(SessionEvent::Action(UserAction::Begin));
        s.handle(SessionEvent::TimerFired(timer_for(&cmds, TimerId::StepCheck)));
        assert_eq!(s.step(StepId::Lighting).status, StepStatus::Passed);

        assert!(s.handle(SessionEvent::Action(UserAction::Retry)).is_empty());
        assert_eq!(s.step(StepId::Lighting).status, StepStatus::Passed);
    }

    #[test]
    fn test_head_sweep_needs_all_four_directions() {
        let mut s = session_at_step3();
        s.handle(SessionEvent::Frame(facing(HeadDirection::Left)));
        s.handle(SessionEvent::Frame(facing(HeadDirection::Center)));
        s.handle(SessionEvent::Frame(facing(HeadDirection::Left)));
        s.handle(SessionEvent::Frame(facing(HeadDirection::Right)));
        s.handle(SessionEvent::Frame(facing(HeadDirection::Up)));
        assert_eq!(s.step(StepId::HeadSweep).status, StepStatus::Checking);
        assert_eq!(s.remaining_directions(), vec![HeadDirection::Down]);

        s.handle(SessionEvent::Frame(facing(HeadDirection::Down)));
        assert_eq!(s.step(StepId::HeadSweep).status, StepStatus::Passed);
        assert!(s.remaining_directions().is_empty());
    }

    proptest! {
        #[test]
        fn prop_head_sweep_passes_in_any_order(
            order in Just(SWEEP_DIRECTIONS.to_vec()).prop_shuffle()
        ) {
            let mut s = session_at_step3();
            for (i, direction) in order.iter().enumerate() {
                // Interleave CENTER noise; it must never count
                s.handle(SessionEvent::Frame(facing(HeadDirection::Center)));
                s.handle(SessionEvent::Frame(facing(*direction)));

                let status = s.step(StepId::HeadSweep).status;
                if i + 1 < order.len() {
                    prop_assert_eq!(status, StepStatus::Checking);
                } else {
                    prop_assert_eq!(status, StepStatus::Passed);
                }
            }
        }
    }

    #[test]
    fn test_gaze_calibration_pools_samples_into_bounds() {
        let (mut s, mut cmds) = session_at_step4();
        assert_eq!(s.step(StepId::GazeCalibration).status, StepStatus::Checking);

        let points = [(0.5, 0.5), (0.1, 0.1), (0.9, 0.1), (0.9, 0.9), (0.1, 0.9)];
        for (x, y) in points {
            s.handle(SessionEvent::Frame(gazing(x, y)));
            cmds = s.handle(SessionEvent::TimerFired(timer_for(&cmds, TimerId::Dwell)));
        }

        assert_eq!(s.step(StepId::GazeCalibration).status, StepStatus::Passed);
        let bounds = s.gaze_bounds().unwrap();
        assert_eq!(bounds.min_x, 0.1);
        assert_eq!(bounds.max_x, 0.9);
        assert_eq!(bounds.min_y, 0.1);
        assert_eq!(bounds.max_y, 0.9);
    }

    #[test]
    fn test_gaze_calibration_without_samples_fails() {
        let (mut s, mut cmds) = session_at_step4();
        for _ in 0..5 {
            cmds = s.handle(SessionEvent::TimerFired(timer_for(&cmds, TimerId::Dwell)));
        }
        let step = s.step(StepId::GazeCalibration);
        assert_eq!(step.status, StepStatus::Failed);
        assert_eq!(step.error.as_deref(), Some("No gaze data"));
        assert_eq!(s.gaze_bounds(), None);
    }

    #[test]
    fn test_gaze_retry_is_configurable() {
        let (mut s, mut cmds) = session_at_step4();
        for _ in 0..5 {
            cmds = s.handle(SessionEvent::TimerFired(timer_for(&cmds, TimerId::Dwell)));
        }
        assert_eq!(s.step(StepId::GazeCalibration).status, StepStatus::Failed);

        let cmds = s.handle(SessionEvent::Action(UserAction::Retry));
        assert_eq!(s.step(StepId::GazeCalibration).status, StepStatus::Checking);
        assert_eq!(timers(&cmds).len(), 2);
    }

    #[test]
    fn test_gaze_retry_disabled() {
        let config = CalibrationConfig {
            allow_gaze_retry: false,
            ..Default::default()
        };
        let mut s = CalibrationSession::new(config);
        s.handle(SessionEvent::Frame(single_face()));
        let cmds = s.handle(SessionEvent::Action(UserAction::Begin));
        s.handle(SessionEvent::TimerFired(timer_for(&cmds, TimerId::StepCheck)));
        let cmds = s.handle(SessionEvent::Action(UserAction::Advance));
        s.handle(SessionEvent::TimerFired(timer_for(&cmds, TimerId::StepCheck)));
        s.handle(SessionEvent::Action(UserAction::Advance));
        for direction in SWEEP_DIRECTIONS {
            s.handle(SessionEvent::Frame(facing(direction)));
        }
        let mut cmds = s.handle(SessionEvent::Action(UserAction::Advance));
        for _ in 0..5 {
            cmds = s.handle(SessionEvent::TimerFired(timer_for(&cmds, TimerId::Dwell)));
        }
        assert_eq!(s.step(StepId::GazeCalibration).status, StepStatus::Failed);

        assert!(s.handle(SessionEvent::Action(UserAction::Retry)).is_empty());
        assert_eq!(s.step(StepId::GazeCalibration).status, StepStatus::Failed);
    }

    #[test]
    fn test_countdown_ticks_rearm_until_zero() {
        let (mut s, cmds) = session_at_step4();
        let mut tick = timer_for(&cmds, TimerId::Countdown);
        // Countdown 5 -> ticks re-arm four times, the fifth reaches zero
        for _ in 0..4 {
            let cmds = s.handle(SessionEvent::TimerFired(tick));
            tick = timer_for(&cmds, TimerId::Countdown);
        }
        let cmds = s.handle(SessionEvent::TimerFired(tick));
        assert!(cmds.is_empty());
    }

    fn complete_session() -> CalibrationSession {
        let (mut s, mut cmds) = session_at_step4();
        for (x, y) in [(0.3, 0.3), (0.6, 0.6), (0.4, 0.4), (0.5, 0.5), (0.45, 0.5)] {
            s.handle(SessionEvent::Frame(gazing(x, y)));
            cmds = s.handle(SessionEvent::TimerFired(timer_for(&cmds, TimerId::Dwell)));
        }
        assert_eq!(s.step(StepId::GazeCalibration).status, StepStatus::Passed);
        s.handle(SessionEvent::Action(UserAction::Advance));
        assert!(s.calibration_complete());
        s
    }

    #[test]
    fn test_monitor_tracks_out_of_bounds_after_completion() {
        let mut s = complete_session();
        // Bounds are 0.3..0.6 on both axes, margin 0.05
        s.handle(SessionEvent::Frame(gazing(0.64, 0.45)));
        assert!(!s.is_out_of_bounds());
        s.handle(SessionEvent::Frame(gazing(0.66, 0.45)));
        assert!(s.is_out_of_bounds());
        s.handle(SessionEvent::Frame(gazing(0.65, 0.45)));
        assert!(!s.is_out_of_bounds());
    }

    #[test]
    fn test_completed_session_ignores_actions() {
        let mut s = complete_session();
        assert!(s.handle(SessionEvent::Action(UserAction::Advance)).is_empty());
        assert!(s.handle(SessionEvent::Action(UserAction::Begin)).is_empty());
        assert!(s.calibration_complete());
    }

    #[test]
    fn test_fullscreen_exit_during_session_is_violation() {
        let mut s = session_at_step3();
        s.handle(SessionEvent::FullscreenChanged(true));
        s.handle(SessionEvent::FullscreenChanged(false));

        assert!(s.fullscreen_violation());
        assert_eq!(s.violation_count(), 1);
    }

    #[test]
    fn test_violation_blocks_progress() {
        let mut s = session_at_step3();
        s.handle(SessionEvent::FullscreenChanged(false));
        assert!(s.fullscreen_violation());

        // Frames no longer mark directions, advance is a no-op
        s.handle(SessionEvent::Frame(facing(HeadDirection::Left)));
        assert_eq!(s.remaining_directions().len(), 4);
        assert!(s.handle(SessionEvent::Action(UserAction::Advance)).is_empty());

        // Return clears the flag and requests fullscreen again
        let cmds = s.handle(SessionEvent::Action(UserAction::ReturnToFullscreen));
        assert_eq!(cmds, vec![Command::EnterFullscreen]);
        assert!(!s.fullscreen_violation());
        assert_eq!(s.violation_count(), 1);

        s.handle(SessionEvent::FullscreenChanged(true));
        s.handle(SessionEvent::Frame(facing(HeadDirection::Left)));
        assert_eq!(s.remaining_directions().len(), 3);
    }

    #[test]
    fn test_exit_before_begin_is_not_violation() {
        let mut s = session();
        s.handle(SessionEvent::FullscreenChanged(false));
        assert!(!s.fullscreen_violation());
        assert_eq!(s.violation_count(), 0);
    }

    #[test]
    fn test_exit_after_completion_is_not_violation() {
        let mut s = complete_session();
        s.handle(SessionEvent::FullscreenChanged(false));
        assert!(!s.fullscreen_violation());
    }

    #[test]
    fn test_header_text_follows_state() {
        let mut s = session();
        assert_eq!(s.header_text(), "Press Start to begin calibration");

        s.handle(SessionEvent::Action(UserAction::Begin));
        assert_eq!(s.header_text(), "Checking lighting...");

        let mut s = session_at_step3();
        assert_eq!(s.header_text(), "Look: LEFT, RIGHT, UP, DOWN");
        s.handle(SessionEvent::Frame(facing(HeadDirection::Left)));
        assert_eq!(s.header_text(), "Look: RIGHT, UP, DOWN");

        s.handle(SessionEvent::FullscreenChanged(false));
        assert_eq!(s.header_text(), "Fullscreen required!");
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut s = session();
        s.handle(SessionEvent::Frame(single_face()));

        // Step 1: lighting
        let cmds = s.handle(SessionEvent::Action(UserAction::Begin));
        s.handle(SessionEvent::TimerFired(timer_for(&cmds, TimerId::StepCheck)));
        assert_eq!(s.step(StepId::Lighting).status, StepStatus::Passed);

        // Step 2: single person
        let cmds = s.handle(SessionEvent::Action(UserAction::Advance));
        s.handle(SessionEvent::TimerFired(timer_for(&cmds, TimerId::StepCheck)));
        assert_eq!(s.step(StepId::PersonCount).status, StepStatus::Passed);

        // Step 3: head sweep
        s.handle(SessionEvent::Action(UserAction::Advance));
        for direction in SWEEP_DIRECTIONS {
            s.handle(SessionEvent::Frame(facing(direction)));
        }
        assert_eq!(s.step(StepId::HeadSweep).status, StepStatus::Passed);

        // Step 4: five dwell windows of gaze samples
        let mut cmds = s.handle(SessionEvent::Action(UserAction::Advance));
        for (x, y) in [(0.5, 0.5), (0.2, 0.2), (0.8, 0.2), (0.8, 0.8), (0.2, 0.8)] {
            s.handle(SessionEvent::Frame(gazing(x, y)));
            cmds = s.handle(SessionEvent::TimerFired(timer_for(&cmds, TimerId::Dwell)));
        }
        assert_eq!(s.step(StepId::GazeCalibration).status, StepStatus::Passed);
        assert!(s.gaze_bounds().is_some());

        s.handle(SessionEvent::Action(UserAction::Advance));
        assert!(s.calibration_complete());
        assert_eq!(s.header_text(), "Calibration complete!");
    }

    #[test]
    fn test_snapshot_serializes() {
        let (s, _) = session_at_step4();
        let value = serde_json::to_value(s.snapshot()).unwrap();
        assert_eq!(value["current_step"], 4);
        assert_eq!(value["calibration_complete"], false);
        assert_eq!(value["gaze_target"]["label"], "Center");
        assert_eq!(value["gaze_target"]["countdown"], 5);
    }
}
