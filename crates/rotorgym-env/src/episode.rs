//! Episode lifecycle and per-episode race progress.
//!
//! [`Episode`] owns everything that changes while stepping: the control step
//! counter, the gate index, the goal dwell counter and the flags reported
//! in the step info. It is rebuilt on every reset.

use rotorgym_core::BodyId;

// ---------------------------------------------------------------------------
// EpisodePhase
// ---------------------------------------------------------------------------

/// Lifecycle state of an episode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EpisodePhase {
    /// Before the first reset.
    #[default]
    Idle,
    /// Actively stepping.
    Running,
    /// Ended by a termination condition.
    Done,
    /// Ended by the time limit.
    Truncated,
}

impl EpisodePhase {
    /// Returns `true` if the episode is finished (Done or Truncated).
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Truncated)
    }

    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

// ---------------------------------------------------------------------------
// Episode
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Episode {
    pub phase: EpisodePhase,
    /// Control steps taken this episode.
    pub ctrl_step: usize,
    /// Index of the next gate to pass; equals the gate count when finished.
    pub current_gate: usize,
    pub gate_count: usize,
    /// Set only on the step the vehicle crossed a gate.
    pub stepped_through_gate: bool,
    /// First body the vehicle touched this step.
    pub collision: Option<BodyId>,
    pub at_goal: bool,
    /// Consecutive steps spent within tolerance of the goal.
    pub steps_at_goal: usize,
    /// Latched once the goal was held long enough.
    pub task_completed: bool,
    pub total_reward: f64,
    /// Number of episodes started since construction.
    pub episode_number: u64,
}

impl Episode {
    /// Start a new episode targeting `first_gate` of `gate_count`.
    pub fn begin(&mut self, first_gate: usize, gate_count: usize) {
        let episode_number = self.episode_number + 1;
        *self = Self {
            phase: EpisodePhase::Running,
            current_gate: first_gate,
            gate_count,
            episode_number,
            ..Self::default()
        };
    }

    /// Clear the single-step flags before evaluating a new step.
    pub const fn clear_step_flags(&mut self) {
        self.stepped_through_gate = false;
        self.collision = None;
    }

    /// Register a gate crossing. The index never exceeds the gate count.
    pub fn record_passage(&mut self) {
        self.current_gate = (self.current_gate + 1).min(self.gate_count);
        self.stepped_through_gate = true;
    }

    pub const fn all_gates_passed(&self) -> bool {
        self.current_gate >= self.gate_count
    }

    /// Id of the next gate, or `-1` once the last gate was passed.
    #[allow(clippy::cast_possible_wrap)]
    pub const fn current_gate_id(&self) -> i64 {
        if self.all_gates_passed() {
            -1
        } else {
            self.current_gate as i64
        }
    }

    /// Update the dwell counter. The task completes once the vehicle has
    /// stayed within tolerance for more than `threshold` steps.
    pub const fn update_goal_dwell(&mut self, within: bool, threshold: usize) {
        self.at_goal = within;
        if within {
            self.steps_at_goal += 1;
        } else {
            self.steps_at_goal = 0;
        }
        if self.steps_at_goal > threshold {
            self.task_completed = true;
        }
    }

    /// Count one control step and accumulate `reward`. Returns `false` if
    /// the episode is not running.
    pub fn advance(&mut self, reward: f64) -> bool {
        if !self.phase.is_running() {
            return false;
        }
        self.ctrl_step += 1;
        self.total_reward += reward;
        true
    }

    pub const fn terminate(&mut self) {
        self.phase = EpisodePhase::Done;
    }

    pub const fn truncate(&mut self) {
        self.phase = EpisodePhase::Truncated;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
