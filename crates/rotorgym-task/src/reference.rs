//! Goal states for stabilization and trajectory tracking.

use nalgebra::{DVector, Vector3};
use rotorgym_core::config::EnvConfig;
use rotorgym_core::{ConfigError, Fidelity, TaskKind};

use crate::trajectory::{ParametricTrajectory, ReferenceTrajectory, TrajectoryGenerator};
use crate::transform::PlaneProjection;

/// Place a world position and velocity into a fidelity's state layout.
/// Angle and rate slots are zero.
pub fn embed(fidelity: Fidelity, pos: &Vector3<f64>, vel: &Vector3<f64>) -> DVector<f64> {
    match fidelity {
        Fidelity::OneD => DVector::from_vec(vec![pos.z, vel.z]),
        Fidelity::TwoD => DVector::from_vec(vec![pos.x, vel.x, pos.z, vel.z, 0.0, 0.0]),
        Fidelity::ThreeD => {
            let mut x = DVector::zeros(12);
            for axis in 0..3 {
                x[2 * axis] = pos[axis];
                x[2 * axis + 1] = vel[axis];
            }
            x
        }
    }
}

/// Target the vehicle is scored against. Constant for an episode.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskGoal {
    /// One fixed state and input.
    Stabilization {
        state: DVector<f64>,
        input: DVector<f64>,
    },
    /// One goal state per control step; the input is fixed.
    Tracking {
        states: Vec<DVector<f64>>,
        input: DVector<f64>,
    },
}

impl TaskGoal {
    /// Fixed goal at `position` with zero velocity and attitude.
    pub fn stabilization(fidelity: Fidelity, position: [f64; 3], input: DVector<f64>) -> Self {
        let state = embed(fidelity, &Vector3::from(position), &Vector3::zeros());
        Self::Stabilization { state, input }
    }

    /// Goal sequence from sampled positions and velocities.
    pub fn tracking(
        fidelity: Fidelity,
        reference: &ReferenceTrajectory,
        input: DVector<f64>,
    ) -> Result<Self, ConfigError> {
        if reference.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "task_info".into(),
                message: "tracking reference has no samples".into(),
            });
        }
        let states = reference
            .positions
            .iter()
            .zip(&reference.velocities)
            .map(|(p, v)| embed(fidelity, p, v))
            .collect();
        Ok(Self::Tracking { states, input })
    }

    /// Build the goal described by `config`, using the built-in parametric
    /// trajectory for tracking tasks.
    pub fn from_config(config: &EnvConfig, input: DVector<f64>) -> Result<Self, ConfigError> {
        let generator =
            ParametricTrajectory::from_task_info(&config.task_info, config.episode_len_sec)?;
        Self::from_config_with(config, &generator, input)
    }

    /// Like [`from_config`](Self::from_config) with a caller-supplied
    /// trajectory generator. 3D references are projected onto the
    /// configured plane.
    pub fn from_config_with(
        config: &EnvConfig,
        generator: &dyn TrajectoryGenerator,
        input: DVector<f64>,
    ) -> Result<Self, ConfigError> {
        let fidelity = config.fidelity;
        match config.task {
            TaskKind::Stabilization => Ok(Self::stabilization(
                fidelity,
                config.task_info.goal_position(fidelity)?,
                input,
            )),
            TaskKind::TrajectoryTracking => {
                let samples = config.ctrl_steps().max(1);
                let mut reference =
                    ReferenceTrajectory::sample(generator, samples, config.ctrl_timestep());
                if fidelity == Fidelity::ThreeD {
                    let projection = PlaneProjection::new(
                        config.task_info.proj_point,
                        config.task_info.proj_normal,
                    )?;
                    reference = projection.apply(&reference);
                }
                Self::tracking(fidelity, &reference, input)
            }
        }
    }

    /// Number of goal states (1 for stabilization).
    pub fn len(&self) -> usize {
        match self {
            Self::Stabilization { .. } => 1,
            Self::Tracking { states, .. } => states.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn is_tracking(&self) -> bool {
        matches!(self, Self::Tracking { .. })
    }

    /// Goal state for control step `step`. Past the end of a tracking
    /// sequence the last entry is returned.
    pub fn state_at(&self, step: usize) -> &DVector<f64> {
        match self {
            Self::Stabilization { state, .. } => state,
            Self::Tracking { states, .. } => &states[step.min(states.len() - 1)],
        }
    }

    pub const fn input(&self) -> &DVector<f64> {
        match self {
            Self::Stabilization { input, .. } | Self::Tracking { input, .. } => input,
        }
    }

    /// Goals appended to the observation at control step `next_step`:
    /// the fixed goal once, or the next `horizon` tracking goals.
    pub fn lookahead(&self, next_step: usize, horizon: usize) -> Vec<&DVector<f64>> {
        match self {
            Self::Stabilization { state, .. } => vec![state],
            Self::Tracking { .. } => (0..horizon).map(|i| self.state_at(next_step + i)).collect(),
        }
    }

}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rotorgym_core::CostKind;

    fn hover(n: usize) -> DVector<f64> {
        DVector::from_element(n, 0.027 * 9.8 / n as f64)
    }

    // -- Stabilization --

    #[test]
    fn stabilization_goal_two_d_exact() {
        let goal = TaskGoal::stabilization(Fidelity::TwoD, [0.5, 0.0, 1.0], hover(2));
        assert_eq!(goal.state_at(0).as_slice(), &[0.5, 0.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn stabilization_goal_from_config() {
        let mut config = EnvConfig::default();
        config.task_info.stabilization_goal = Some(vec![0.5, 1.0]);
        let goal = TaskGoal::from_config(&config, hover(2)).unwrap();
        assert_eq!(goal.state_at(0).as_slice(), &[0.5, 0.0, 1.0, 0.0, 0.0, 0.0]);
        assert_eq!(goal.len(), 1);
        assert!(!goal.is_tracking());
    }

    #[test]
    fn stabilization_goal_layouts() {
        let one = TaskGoal::stabilization(Fidelity::OneD, [0.0, 0.0, 1.5], hover(1));
        assert_eq!(one.state_at(0).as_slice(), &[1.5, 0.0]);
        let three = TaskGoal::stabilization(Fidelity::ThreeD, [1.0, 2.0, 3.0], hover(4));
        let s = three.state_at(99);
        assert_eq!(s.len(), 12);
        assert_eq!((s[0], s[2], s[4]), (1.0, 2.0, 3.0));
        assert!(s.iter().skip(5).all(|v| *v == 0.0));
    }

    #[test]
    fn goal_input_is_hover_split() {
        let goal = TaskGoal::stabilization(Fidelity::ThreeD, [0.0; 3], hover(4));
        for v in goal.input().iter() {
            assert_relative_eq!(*v, 0.027 * 9.8 / 4.0);
        }
    }

    // -- Tracking --

    fn tracking_config(fidelity: Fidelity) -> EnvConfig {
        EnvConfig::default()
            .with_fidelity(fidelity)
            .with_task(TaskKind::TrajectoryTracking, CostKind::RlReward)
    }

    #[test]
    fn tracking_goal_has_one_state_per_control_step() {
        let config = tracking_config(Fidelity::TwoD);
        let goal = TaskGoal::from_config(&config, hover(2)).unwrap();
        assert_eq!(goal.len(), config.ctrl_steps());
        assert!(goal.is_tracking());
        for step in [0, 10, 200] {
            let s = goal.state_at(step);
            assert_eq!(s[4], 0.0);
            assert_eq!(s[5], 0.0);
        }
    }

    #[test]
    fn tracking_lookup_clamps_to_last_entry() {
        let config = tracking_config(Fidelity::OneD);
        let goal = TaskGoal::from_config(&config, hover(1)).unwrap();
        let last = goal.state_at(goal.len() - 1).clone();
        assert_eq!(goal.state_at(goal.len()), &last);
        assert_eq!(goal.state_at(usize::MAX / 2), &last);
    }

    #[test]
    fn tracking_three_d_lies_on_projection_plane() {
        let config = tracking_config(Fidelity::ThreeD);
        let goal = TaskGoal::from_config(&config, hover(4)).unwrap();
        let normal = Vector3::new(0.0, 1.0, 1.0).normalize();
        let point = Vector3::new(0.0, 0.0, 0.5);
        for step in (0..goal.len()).step_by(17) {
            let s = goal.state_at(step);
            let p = Vector3::new(s[0], s[2], s[4]);
            let v = Vector3::new(s[1], s[3], s[5]);
            assert_relative_eq!((p - point).dot(&normal), 0.0, epsilon = 1e-12);
            assert_relative_eq!(v.dot(&normal), 0.0, epsilon = 1e-12);
            assert!(s.iter().skip(6).all(|a| *a == 0.0));
        }
    }

    #[test]
    fn lookahead_clamps_and_repeats() {
        let config = tracking_config(Fidelity::OneD);
        let goal = TaskGoal::from_config(&config, hover(1)).unwrap();
        let n = goal.len();
        let ahead = goal.lookahead(n - 1, 3);
        assert_eq!(ahead.len(), 3);
        assert_eq!(ahead[0], ahead[2]);

        let fixed = TaskGoal::stabilization(Fidelity::OneD, [0.0, 0.0, 1.0], hover(1));
        assert_eq!(fixed.lookahead(5, 4).len(), 1);
    }

    #[test]
    fn empty_tracking_reference_is_rejected() {
        let empty = ReferenceTrajectory {
            positions: Vec::new(),
            velocities: Vec::new(),
        };
        assert!(matches!(
            TaskGoal::tracking(Fidelity::TwoD, &empty, hover(2)),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
