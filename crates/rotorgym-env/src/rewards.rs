//! Reward and cost policies.
//!
//! The policy is chosen once from the configured cost and evaluated every
//! step against the current goal. Per-step events (gate passage, goal
//! arrival, collision, constraint violation) feed only the sparse policy.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use rotorgym_core::config::{EnvConfig, SparseRewardConfig, broadcast_weights};
use rotorgym_core::{ConfigError, CostKind, TaskKind};
use rotorgym_dynamics::{DynamicsModel, cost_weight_matrix};

/// Events of one control step consumed by the sparse reward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepEvents {
    pub stepped_through_gate: bool,
    pub at_goal: bool,
    pub collided: bool,
    pub constraint_violated: bool,
}

// ---------------------------------------------------------------------------
// RewardPolicy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum RewardPolicy {
    /// `-(sum w_x e_x^2 + sum w_u e_u^2)`, optionally exponentiated.
    Dense {
        state_weight: DVector<f64>,
        act_weight: DVector<f64>,
        exponential: bool,
    },
    /// Negated model loss.
    Quadratic {
        model: Arc<DynamicsModel>,
        q: DMatrix<f64>,
        r: DMatrix<f64>,
    },
    /// Additive event score.
    Sparse(SparseRewardConfig),
}

impl RewardPolicy {
    pub fn from_config(config: &EnvConfig, model: Arc<DynamicsModel>) -> Result<Self, ConfigError> {
        let nx = config.fidelity.state_dim();
        let nu = config.fidelity.action_dim();
        match (config.task, config.cost) {
            (_, CostKind::RlReward) => Ok(Self::Dense {
                state_weight: DVector::from_vec(broadcast_weights(
                    "reward.state_weight",
                    &config.reward.state_weight,
                    nx,
                )?),
                act_weight: DVector::from_vec(broadcast_weights(
                    "reward.act_weight",
                    &config.reward.act_weight,
                    nu,
                )?),
                exponential: config.reward.exponential,
            }),
            (_, CostKind::Quadratic) => Ok(Self::Quadratic {
                q: cost_weight_matrix("quadratic.q", &config.quadratic.q, nx)?,
                r: cost_weight_matrix("quadratic.r", &config.quadratic.r, nu)?,
                model,
            }),
            (TaskKind::Stabilization, CostKind::Competition) => Ok(Self::Sparse(config.sparse)),
            (TaskKind::TrajectoryTracking, CostKind::Competition) => Err(ConfigError::Incompatible(
                "competition reward is only defined for the stabilization task".into(),
            )),
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Dense { .. } => "dense",
            Self::Quadratic { .. } => "quadratic",
            Self::Sparse(_) => "sparse",
        }
    }

    /// Reward of `state`/`action` against the current goal.
    pub fn evaluate(
        &self,
        state: &DVector<f64>,
        action: &DVector<f64>,
        goal_state: &DVector<f64>,
        goal_input: &DVector<f64>,
        events: StepEvents,
    ) -> f64 {
        match self {
            Self::Dense {
                state_weight,
                act_weight,
                exponential,
            } => {
                let dx = state - goal_state;
                let du = action - goal_input;
                let cost = state_weight.dot(&dx.component_mul(&dx))
                    + act_weight.dot(&du.component_mul(&du));
                if *exponential { (-cost).exp() } else { -cost }
            }
            Self::Quadratic { model, q, r } => {
                -model.loss(state, action, goal_state, goal_input, q, r)
            }
            Self::Sparse(points) => {
                let mut reward = 0.0;
                if events.stepped_through_gate {
                    reward += points.gate_reward;
                }
                if events.at_goal {
                    reward += points.goal_reward;
                }
                if events.collided {
                    reward -= points.collision_penalty;
                }
                if events.constraint_violated {
                    reward -= points.constraint_penalty;
                }
                reward
            }
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
    use rotorgym_core::Fidelity;
    use rotorgym_dynamics::VehicleParams;
    use rotorgym_test_utils::{competition_config, hover_config, tracking_config};

    fn model(fidelity: Fidelity) -> Arc<DynamicsModel> {
        Arc::new(DynamicsModel::new(fidelity, VehicleParams::default(), 1.0 / 60.0))
    }

    fn policy(config: &EnvConfig) -> RewardPolicy {
        RewardPolicy::from_config(config, model(config.fidelity)).unwrap()
    }

    fn v(values: &[f64]) -> DVector<f64> {
        DVector::from_row_slice(values)
    }

    // -- Selection --

    #[test]
    fn cost_selects_policy() {
        assert_eq!(policy(&hover_config(Fidelity::TwoD)).name(), "dense");
        assert_eq!(policy(&tracking_config(Fidelity::TwoD)).name(), "quadratic");
        assert_eq!(policy(&competition_config()).name(), "sparse");
    }

    #[test]
    fn competition_tracking_is_rejected() {
        let config = tracking_config(Fidelity::ThreeD)
            .with_task(TaskKind::TrajectoryTracking, CostKind::Competition);
        assert!(matches!(
            RewardPolicy::from_config(&config, model(Fidelity::ThreeD)),
            Err(ConfigError::Incompatible(_))
        ));
    }

    #[test]
    fn bad_weight_length_is_rejected() {
        let mut config = hover_config(Fidelity::TwoD);
        config.reward.state_weight = vec![1.0, 2.0];
        assert!(matches!(
            RewardPolicy::from_config(&config, model(Fidelity::TwoD)),
            Err(ConfigError::DimensionMismatch { .. })
        ));
    }

    // -- Dense --

    #[test]
    fn dense_exponential_is_one_at_goal() {
        let p = policy(&hover_config(Fidelity::OneD));
        let goal = v(&[1.0, 0.0]);
        let u = v(&[0.1]);
        let r = p.evaluate(&goal, &u, &goal, &u, StepEvents::default());
        assert_relative_eq!(r, 1.0);
    }

    #[test]
    fn dense_exponential_bounded_and_decreasing() {
        let p = policy(&hover_config(Fidelity::OneD));
        let goal = v(&[1.0, 0.0]);
        let u = v(&[0.1]);
        let mut last = f64::INFINITY;
        for err in [0.0, 0.1, 0.5, 1.0, 3.0] {
            let r = p.evaluate(&v(&[1.0 + err, 0.0]), &u, &goal, &u, StepEvents::default());
            assert!(r > 0.0 && r <= 1.0);
            assert!(r < last);
            last = r;
        }
    }

    #[test]
    fn dense_linear_is_negative_weighted_error() {
        let mut config = hover_config(Fidelity::OneD);
        config.reward.exponential = false;
        config.reward.state_weight = vec![2.0, 0.0];
        config.reward.act_weight = vec![1.0];
        let p = policy(&config);
        let r = p.evaluate(
            &v(&[1.5, 3.0]),
            &v(&[0.3]),
            &v(&[1.0, 0.0]),
            &v(&[0.1]),
            StepEvents::default(),
        );
        assert_relative_eq!(r, -(2.0 * 0.25 + 0.04), epsilon = 1e-12);
    }

    // -- Quadratic --

    #[test]
    fn quadratic_is_negated_loss() {
        let p = policy(&tracking_config(Fidelity::OneD));
        let goal = v(&[1.0, 0.0]);
        let hover = v(&[0.5]);
        let r = p.evaluate(&v(&[2.0, 0.0]), &hover, &goal, &hover, StepEvents::default());
        assert_relative_eq!(r, -0.5, epsilon = 1e-12);
        let zero = p.evaluate(&goal, &hover, &goal, &hover, StepEvents::default());
        assert_relative_eq!(zero, 0.0);
    }

    // -- Sparse --

    #[test]
    fn sparse_terms_add_independently() {
        let p = policy(&competition_config());
        let x = DVector::zeros(12);
        let u = DVector::zeros(4);
        let eval = |events| p.evaluate(&x, &u, &x, &u, events);
        assert_relative_eq!(eval(StepEvents::default()), 0.0);
        let gate_and_crash = StepEvents {
            stepped_through_gate: true,
            collided: true,
            ..StepEvents::default()
        };
        assert_relative_eq!(eval(gate_and_crash), -900.0);
        let all = StepEvents {
            stepped_through_gate: true,
            at_goal: true,
            collided: true,
            constraint_violated: true,
        };
        assert_relative_eq!(eval(all), 100.0 + 100.0 - 1000.0 - 100.0);
    }

    #[test]
    fn sparse_ignores_state_error() {
        let p = policy(&competition_config());
        let goal = DVector::zeros(12);
        let far = DVector::from_element(12, 10.0);
        let u = DVector::zeros(4);
        assert_relative_eq!(p.evaluate(&far, &u, &goal, &u, StepEvents::default()), 0.0);
    }
}
