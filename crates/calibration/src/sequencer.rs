//! Gaze target sequencer
//!
//! Walks the user's gaze through five fixed fixation targets (center,
//! then the four corners at 10%/90% margins), collecting every gaze
//! sample seen during each target's dwell window. At the end all
//! samples are pooled into a single bounding rectangle; per-target
//! collections exist only for logging and diagnostics.

use crate::monitor::GazeBounds;
use serde::Serialize;
use tracing::{debug, info};

/// One fixation target in normalized screen coordinates
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GazeTarget {
    pub id: &'static str,
    pub x: f32,
    pub y: f32,
    pub label: &'static str,
}

/// Fixation targets in presentation order
pub const GAZE_TARGETS: [GazeTarget; 5] = [
    GazeTarget { id: "center", x: 0.5, y: 0.5, label: "Center" },
    GazeTarget { id: "top-left", x: 0.1, y: 0.1, label: "Top Left" },
    GazeTarget { id: "top-right", x: 0.9, y: 0.1, label: "Top Right" },
    GazeTarget { id: "bottom-right", x: 0.9, y: 0.9, label: "Bottom Right" },
    GazeTarget { id: "bottom-left", x: 0.1, y: 0.9, label: "Bottom Left" },
];

/// Result of a dwell window elapsing
#[derive(Debug, Clone, PartialEq)]
pub enum DwellOutcome {
    /// Moved on to the next target
    NextTarget,
    /// All targets done; bounds are None when no samples were collected
    Complete(Option<GazeBounds>),
}

/// Collects gaze samples per fixation target and derives the pooled
/// calibration bounds when the last dwell window elapses.
#[derive(Debug, Clone)]
pub struct GazeTargetSequencer {
    target_index: usize,
    countdown: u32,
    countdown_start: u32,
    samples: [Vec<(f32, f32)>; GAZE_TARGETS.len()],
}

impl GazeTargetSequencer {
    /// Start at the first target with the countdown at its display value
    pub fn new(countdown_start: u32) -> Self {
        Self {
            target_index: 0,
            countdown: countdown_start,
            countdown_start,
            samples: Default::default(),
        }
    }

    /// The target the user should currently fixate
    pub fn current_target(&self) -> GazeTarget {
        GAZE_TARGETS[self.target_index]
    }

    /// Zero-based index of the current target
    pub fn target_index(&self) -> usize {
        self.target_index
    }

    /// Seconds remaining on the display countdown
    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Record one gaze sample against the current target
    pub fn record(&mut self, gaze_x: f32, gaze_y: f32) {
        self.samples[self.target_index].push((gaze_x, gaze_y));
    }

    /// Total samples across all targets so far
    pub fn total_samples(&self) -> usize {
        self.samples.iter().map(Vec::len).sum()
    }

    /// Decrement the display countdown. Purely cosmetic; sequencing is
    /// driven by the dwell timer alone.
    pub fn tick(&mut self) -> u32 {
        self.countdown = self.countdown.saturating_sub(1);
        self.countdown
    }

    /// Reset the display countdown for a restarted dwell window
    pub fn reset_countdown(&mut self) {
        self.countdown = self.countdown_start;
    }

    /// Apply an elapsed dwell window: advance to the next target, or on
    /// the last target pool every sample into the final bounds.
    pub fn dwell_elapsed(&mut self) -> DwellOutcome {
        debug!(
            target = self.current_target().id,
            samples = self.samples[self.target_index].len(),
            "dwell window elapsed"
        );

        if self.target_index + 1 < GAZE_TARGETS.len() {
            self.target_index += 1;
            self.countdown = self.countdown_start;
            return DwellOutcome::NextTarget;
        }

        let bounds = GazeBounds::from_points(self.samples.iter().flatten());
        match &bounds {
            Some(b) => info!(samples = self.total_samples(), ?b, "gaze bounds calibrated"),
            None => info!("gaze calibration finished with no samples"),
        }
        DwellOutcome::Complete(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_through_targets(seq: &mut GazeTargetSequencer) -> DwellOutcome {
        loop {
            match seq.dwell_elapsed() {
                DwellOutcome::NextTarget => continue,
                complete => return complete,
            }
        }
    }

    #[test]
    fn test_target_order() {
        let mut seq = GazeTargetSequencer::new(5);
        let mut ids = vec![seq.current_target().id];
        while seq.dwell_elapsed() == DwellOutcome::NextTarget {
            ids.push(seq.current_target().id);
        }
        assert_eq!(
            ids,
            vec!["center", "top-left", "top-right", "bottom-right", "bottom-left"]
        );
    }

    #[test]
    fn test_bounds_pool_samples_across_targets() {
        let mut seq = GazeTargetSequencer::new(5);

        // 5 samples on the first target
        seq.record(0.45, 0.50);
        seq.record(0.50, 0.55);
        seq.record(0.48, 0.52);
        seq.record(0.51, 0.49);
        seq.record(0.47, 0.53);

        // Skip to the last target, 3 samples there
        for _ in 0..4 {
            assert_eq!(seq.dwell_elapsed(), DwellOutcome::NextTarget);
        }
        seq.record(0.12, 0.88);
        seq.record(0.95, 0.15);
        seq.record(0.10, 0.92);

        let outcome = seq.dwell_elapsed();
        let DwellOutcome::Complete(Some(bounds)) = outcome else {
            panic!("expected completed bounds, got {outcome:?}");
        };
        // Min/max over all 8 pooled samples, not per-target extremes
        assert_eq!(bounds.min_x, 0.10);
        assert_eq!(bounds.max_x, 0.95);
        assert_eq!(bounds.min_y, 0.15);
        assert_eq!(bounds.max_y, 0.92);
    }

    #[test]
    fn test_empty_target_is_not_an_error() {
        let mut seq = GazeTargetSequencer::new(5);
        // Only the first target gets a sample
        seq.record(0.5, 0.5);
        let outcome = run_through_targets(&mut seq);
        assert!(matches!(outcome, DwellOutcome::Complete(Some(_))));
    }

    #[test]
    fn test_zero_samples_reports_failure() {
        let mut seq = GazeTargetSequencer::new(5);
        assert_eq!(run_through_targets(&mut seq), DwellOutcome::Complete(None));
    }

    #[test]
    fn test_countdown_is_display_only() {
        let mut seq = GazeTargetSequencer::new(5);
        for _ in 0..10 {
            seq.tick();
        }
        // Ticking past zero saturates and never advances the target
        assert_eq!(seq.countdown(), 0);
        assert_eq!(seq.target_index(), 0);

        seq.dwell_elapsed();
        assert_eq!(seq.countdown(), 5);
    }
}
