//! The quadrotor environment: `reset` and `step` over a physics engine.
//!
//! [`QuadrotorEnv`] is generic over the [`PhysicsEngine`] it drives and
//! owns everything else: the dynamics model, the goal, the reward and
//! termination policies, the placed track and the episode state.
//!
//! A step runs in a fixed order: preprocess the action, advance the
//! engine, read the state, build the observation, update collision, gate
//! and goal progress, check termination, evaluate the reward, count the
//! step.

use std::sync::Arc;

use nalgebra::{DVector, UnitQuaternion, Vector3};
use rand_chacha::ChaCha8Rng;
use rotorgym_core::config::EnvConfig;
use rotorgym_core::seed::SeedHierarchy;
use rotorgym_core::traits::{ConstraintMonitor, NoConstraints, PhysicsEngine, ThrustToRpm};
use rotorgym_core::{
    Action, BodyId, BodyState, BoxSpace, CostKind, Fidelity, Observation, RotorgymError, SimError,
    TaskKind,
};
use rotorgym_domain_rand::{DomainRandomizer, InertialProperties};
use rotorgym_dynamics::{DynamicsModel, VehicleParams};
use rotorgym_task::TaskGoal;
use tracing::{debug, warn};

use crate::actuator::ActionPreprocessor;
use crate::disturbance::Disturbances;
use crate::episode::{Episode, EpisodePhase};
use crate::info::{
    GateDimensions, GateShape, ObstacleDimensions, ResetInfo, ResetResult, StepInfo, StepResult,
};
use crate::rewards::{RewardPolicy, StepEvents};
use crate::spaces::{extend_observation, goal_copies, observation_space, state_space};
use crate::terminations::{TerminationCause, TerminationPolicy};
use crate::track::{
    GATE_EDGE, GateKind, OBSTACLE_HEIGHT, OBSTACLE_RADIUS, PASSAGE_THRESHOLD, PlacedTrack, Track,
    VISIBILITY_RANGE,
};

/// Seconds the vehicle must hold the final goal before the task completes.
const GOAL_DWELL_SEC: u32 = 2;

// ---------------------------------------------------------------------------
// ResetOptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetOptions {
    /// Reseed the episode random source before drawing.
    pub seed: Option<u64>,
    /// Start in front of this gate instead of at the initial state.
    pub initial_target_gate_id: Option<usize>,
}

impl ResetOptions {
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub const fn with_initial_target_gate(mut self, gate: usize) -> Self {
        self.initial_target_gate_id = Some(gate);
        self
    }
}

// ---------------------------------------------------------------------------
// QuadrotorEnv
// ---------------------------------------------------------------------------

pub struct QuadrotorEnv<E: PhysicsEngine> {
    config: EnvConfig,
    nominal: InertialProperties,
    model: Arc<DynamicsModel>,
    goal: TaskGoal,
    reward: RewardPolicy,
    termination: TerminationPolicy,
    actuator: ActionPreprocessor,
    state_space: BoxSpace,
    observation_space: BoxSpace,
    goal_copies: usize,
    mse_weights: DVector<f64>,
    track: Track,
    nominal_gate_poses: Vec<[f64; 6]>,
    nominal_obstacle_poses: Vec<[f64; 6]>,
    placed: PlacedTrack,
    randomizer: DomainRandomizer,
    disturbances: Disturbances,
    rng: ChaCha8Rng,
    episode: Episode,
    state: DVector<f64>,
    pyb_steps: u64,
    gates_in_range: Vec<bool>,
    obstacles_in_range: Vec<bool>,
    constraint_violated: bool,
    engine: E,
    motors: Box<dyn ThrustToRpm>,
    constraints: Box<dyn ConstraintMonitor>,
}

impl<E: PhysicsEngine> QuadrotorEnv<E> {
    /// Validate `config` and build the environment around `engine`.
    /// Nothing is spawned until the first [`reset`](Self::reset).
    pub fn new(
        config: EnvConfig,
        engine: E,
        motors: Box<dyn ThrustToRpm>,
    ) -> Result<Self, RotorgymError> {
        config.validate()?;
        let fidelity = config.fidelity;
        let vehicle = config.effective_vehicle()?;
        let params = VehicleParams::from(&vehicle);
        let model = Arc::new(DynamicsModel::new(fidelity, params, config.ctrl_timestep()));
        let goal = TaskGoal::from_config(&config, model.hover_input())?;
        let reward = RewardPolicy::from_config(&config, Arc::clone(&model))?;

        let state_space = state_space(fidelity);
        let goal_copies = goal_copies(&config);
        let observation_space = observation_space(&state_space, goal_copies);
        let termination = TerminationPolicy::from_config(&config, &state_space);

        let n = fidelity.action_dim();
        let actuator = ActionPreprocessor::from_config(
            &config,
            params.hover_thrust_per_actuator(n),
            motors.thrust_limits(n),
        );

        let track = Track::from_config(&config.gates, &config.obstacles)?;
        let randomizer = DomainRandomizer::from_config(&config.randomization, fidelity)?;
        let seeds = SeedHierarchy::new(config.seed);
        let disturbances = Disturbances::from_config(
            &config.disturbances,
            fidelity,
            seeds.subsystem_seed("disturbance"),
        )?;
        let mse_weights = DVector::from_vec(config.mse_weights()?);

        if config.cost == CostKind::Competition && fidelity != Fidelity::ThreeD {
            warn!(
                %fidelity,
                "goal arrival and task completion are only tracked for the 3D vehicle"
            );
        }
        debug!(
            %fidelity,
            task = ?config.task,
            reward = reward.name(),
            engine = engine.name(),
            gates = track.gate_count(),
            obstacles = track.obstacles().len(),
            randomized = randomizer.is_enabled(),
            "environment built"
        );

        Ok(Self {
            nominal: InertialProperties::from(&vehicle),
            nominal_gate_poses: track.nominal_gate_poses().iter().map(|p| p.to_array()).collect(),
            nominal_obstacle_poses: track
                .nominal_obstacle_poses()
                .iter()
                .map(|p| p.to_array())
                .collect(),
            state: DVector::zeros(fidelity.state_dim()),
            rng: seeds.randomization_rng(),
            model,
            goal,
            reward,
            termination,
            actuator,
            state_space,
            observation_space,
            goal_copies,
            mse_weights,
            track,
            placed: PlacedTrack::default(),
            randomizer,
            disturbances,
            episode: Episode::default(),
            pyb_steps: 0,
            gates_in_range: Vec::new(),
            obstacles_in_range: Vec::new(),
            constraint_violated: false,
            engine,
            motors,
            constraints: Box::new(NoConstraints),
            config,
        })
    }

    /// Builder: supply the constraint-violation flag for the sparse reward.
    #[must_use]
    pub fn with_constraints(mut self, constraints: Box<dyn ConstraintMonitor>) -> Self {
        self.constraints = constraints;
        self
    }

    // -- Reset --

    /// Start a new episode.
    ///
    /// Every random draw happens before the engine is touched, so a failed
    /// draw leaves the previous episode's scene in place.
    pub fn reset(&mut self, options: ResetOptions) -> Result<ResetResult, RotorgymError> {
        if let Some(seed) = options.seed {
            debug!(seed, "reseeding episode random source");
            let seeds = SeedHierarchy::new(seed);
            self.rng = seeds.randomization_rng();
            self.disturbances.reseed(seeds.subsystem_seed("disturbance"));
        }

        let gate_count = self.track.gate_count();
        let first_gate = options.initial_target_gate_id.unwrap_or(0);
        if options.initial_target_gate_id.is_some() && first_gate >= gate_count {
            return Err(SimError::GateOutOfRange {
                requested: first_gate,
                count: gate_count,
            }
            .into());
        }

        let layout = self.track.layout(self.randomizer.poses.as_ref(), &mut self.rng);
        let inertial = match &self.randomizer.inertial {
            Some(randomizer) => randomizer.randomize(&self.nominal, &mut self.rng)?,
            None => self.nominal,
        };
        let initial = if first_gate > 0 {
            let (pose, _) = layout.gates[first_gate - 1];
            let [roll, pitch, yaw] = pose.rpy;
            BodyState::at_rest(
                Vector3::from(pose.position),
                UnitQuaternion::from_euler_angles(roll, pitch, yaw),
            )
        } else {
            let nominal = self.config.initial_state()?;
            let values = match &self.randomizer.init_state {
                Some(randomizer) => randomizer.randomize(&nominal, &mut self.rng),
                None => nominal,
            };
            initial_body_state(self.config.fidelity, &values)
        };

        self.engine.reset();
        self.placed = layout.spawn(&mut self.engine);
        self.engine.set_vehicle_inertia(inertial.mass, inertial.inertia());
        self.engine.set_vehicle_state(&initial);

        self.pyb_steps = 0;
        self.constraint_violated = false;
        self.gates_in_range = vec![false; gate_count];
        self.obstacles_in_range = vec![false; self.placed.obstacles.len()];
        self.episode.begin(first_gate, gate_count);
        self.state = self.read_state()?;
        let observation = self.observe();
        self.detect_collision();
        self.update_visibility();

        debug!(
            episode = self.episode.episode_number,
            first_gate,
            mass = inertial.mass,
            "episode reset"
        );

        Ok(ResetResult {
            observation,
            info: self.reset_info(self.step_info(None)),
        })
    }

    // -- Step --

    /// Advance one control step with `action`.
    pub fn step(&mut self, action: &Action) -> Result<StepResult, RotorgymError> {
        match self.episode.phase {
            EpisodePhase::Idle => return Err(SimError::NotReset.into()),
            EpisodePhase::Done | EpisodePhase::Truncated => {
                return Err(SimError::EpisodeFinished.into());
            }
            EpisodePhase::Running => {}
        }
        let step = self.episode.ctrl_step as u64;

        let thrust = self.actuator.preprocess(action)?;
        let mut applied = thrust.clone();
        self.disturbances.apply_action(&mut applied, step);
        let rpm = self.motors.thrust_to_rpm(&applied);
        let force = self.disturbances.dynamics_force(step);

        let substeps = self.config.substeps();
        let dt = self.config.pyb_timestep();
        for _ in 0..substeps {
            self.engine.advance(&rpm, force.as_ref(), dt);
        }
        self.pyb_steps += u64::from(substeps);

        self.state = self.read_state()?;
        let observation = self.observe();

        let was_colliding = self.episode.collision.is_some();
        self.episode.clear_step_flags();
        self.detect_collision();
        if self.gate_check_due() {
            self.check_gate_passage();
        }
        self.update_visibility();
        self.update_goal_dwell();
        if let (Some(body), false) = (self.episode.collision, was_colliding) {
            debug!(body = body.0, step, "collision");
        }

        let thrust = DVector::from_vec(thrust);
        self.constraint_violated = self
            .constraints
            .is_violated(self.state.as_slice(), thrust.as_slice());
        let termination = self.termination.check(&self.state, &self.episode);
        let events = StepEvents {
            stepped_through_gate: self.episode.stepped_through_gate,
            at_goal: self.episode.at_goal,
            collided: self.episode.collision.is_some(),
            constraint_violated: self.constraint_violated,
        };
        let reward = self.reward.evaluate(
            &self.state,
            &thrust,
            self.goal.state_at(self.episode.ctrl_step),
            self.goal.input(),
            events,
        );
        let info = self.step_info(termination);

        self.episode.advance(reward);
        let terminated = termination.is_some();
        let truncated = self.episode.ctrl_step >= self.config.ctrl_steps();
        if terminated {
            debug!(cause = ?termination, step, "episode terminated");
            self.episode.terminate();
        } else if truncated {
            self.episode.truncate();
        }

        Ok(StepResult {
            observation,
            reward,
            terminated,
            truncated,
            info,
        })
    }

    // -- Accessors --

    pub const fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// Shared model at nominal parameters.
    pub const fn model(&self) -> &Arc<DynamicsModel> {
        &self.model
    }

    pub const fn goal(&self) -> &TaskGoal {
        &self.goal
    }

    pub const fn reward_policy(&self) -> &RewardPolicy {
        &self.reward
    }

    pub const fn state_space(&self) -> &BoxSpace {
        &self.state_space
    }

    pub const fn observation_space(&self) -> &BoxSpace {
        &self.observation_space
    }

    pub const fn action_space(&self) -> &BoxSpace {
        self.actuator.action_space()
    }

    pub const fn episode(&self) -> &Episode {
        &self.episode
    }

    /// State vector after the last reset or step.
    pub const fn state(&self) -> &DVector<f64> {
        &self.state
    }

    pub const fn track(&self) -> &Track {
        &self.track
    }

    /// Bodies placed by the last reset.
    pub const fn placed_track(&self) -> &PlacedTrack {
        &self.placed
    }

    pub const fn engine(&self) -> &E {
        &self.engine
    }

    pub const fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    // -- Internals --

    fn read_state(&self) -> Result<DVector<f64>, SimError> {
        let vehicle = self.engine.vehicle();
        let body = self
            .engine
            .body_state(vehicle)
            .ok_or(SimError::BodyNotFound(vehicle.0))?;
        if !body.is_finite() {
            return Err(SimError::PhysicsDiverged);
        }
        Ok(self.model.state_from_body(&body))
    }

    fn observe(&mut self) -> Observation {
        let mut obs = self.model.observation(&self.state).as_slice().to_vec();
        self.disturbances
            .apply_observation(&mut obs, self.episode.ctrl_step as u64);
        let obs = extend_observation(obs, &self.goal, self.episode.ctrl_step + 1, self.goal_copies);
        Observation::new(obs)
    }

    /// Gates, then obstacles, then the ground; the first contact wins.
    fn detect_collision(&mut self) {
        let vehicle = self.engine.vehicle();
        let candidates: Vec<BodyId> = self
            .placed
            .gates
            .iter()
            .map(|g| g.body.id)
            .chain(self.placed.obstacles.iter().map(|o| o.id))
            .chain(std::iter::once(self.engine.ground_plane()))
            .collect();
        self.episode.collision = candidates
            .into_iter()
            .find(|body| !self.engine.contacts(*body, vehicle).is_empty());
    }

    #[allow(clippy::cast_precision_loss)]
    fn gate_check_due(&self) -> bool {
        let delay_steps = self.config.gate_check_delay_sec * f64::from(self.config.pyb_freq);
        self.pyb_steps as f64 > delay_steps && !self.episode.all_gates_passed()
    }

    fn check_gate_passage(&mut self) {
        let Some(gate) = self.placed.gates.get(self.episode.current_gate) else {
            return;
        };
        let (from, to) = gate.passage_rays();
        let crossed = self
            .engine
            .ray_test_batch(&from, &to)
            .iter()
            .any(|fraction| *fraction < PASSAGE_THRESHOLD);
        if crossed {
            let passed = self.episode.current_gate;
            self.episode.record_passage();
            debug!(gate = passed, next = self.episode.current_gate_id(), "gate passed");
        }
    }

    fn update_visibility(&mut self) {
        let vehicle = self.engine.vehicle();
        let engine = &self.engine;
        let in_range = |id: BodyId| engine.closest_points(id, vehicle, VISIBILITY_RANGE).is_some();
        self.gates_in_range = self.placed.gates.iter().map(|g| in_range(g.body.id)).collect();
        self.obstacles_in_range = self.placed.obstacles.iter().map(|o| in_range(o.id)).collect();
    }

    /// Once every gate is passed, count steps within tolerance of the goal
    /// position. 3D only.
    fn update_goal_dwell(&mut self) {
        if !self.episode.all_gates_passed() || self.config.fidelity != Fidelity::ThreeD {
            return;
        }
        let goal = self.goal.state_at(self.episode.ctrl_step);
        let distance = [0, 2, 4]
            .iter()
            .map(|i| (self.state[*i] - goal[*i]).powi(2))
            .sum::<f64>()
            .sqrt();
        let within = distance < self.config.task_info.stabilization_goal_tolerance;
        let threshold =
            usize::try_from(GOAL_DWELL_SEC * self.config.ctrl_freq).unwrap_or(usize::MAX);
        let was_completed = self.episode.task_completed;
        self.episode.update_goal_dwell(within, threshold);
        if self.episode.task_completed && !was_completed {
            debug!(step = self.episode.ctrl_step, "task completed");
        }
    }

    fn step_info(&self, termination: Option<TerminationCause>) -> StepInfo {
        let goal = self.goal.state_at(self.episode.ctrl_step);
        let error = &self.state - goal;
        let goal_reached = (self.config.task == TaskKind::Stabilization
            && self.config.cost == CostKind::Quadratic)
            .then(|| error.norm() < self.config.task_info.stabilization_goal_tolerance);
        StepInfo {
            mse: error.component_mul(&self.mse_weights).norm_squared(),
            collision: (self.episode.collision, self.episode.collision.is_some()),
            gates_pose: self
                .placed
                .gates
                .iter()
                .zip(&self.nominal_gate_poses)
                .zip(&self.gates_in_range)
                .map(|((placed, nominal), seen)| {
                    if *seen { placed.body.pose.to_array() } else { *nominal }
                })
                .collect(),
            gates_in_range: self.gates_in_range.clone(),
            obstacles_pose: self
                .placed
                .obstacles
                .iter()
                .zip(&self.nominal_obstacle_poses)
                .zip(&self.obstacles_in_range)
                .map(|((placed, nominal), seen)| {
                    if *seen { placed.pose.to_array() } else { *nominal }
                })
                .collect(),
            obstacles_in_range: self.obstacles_in_range.clone(),
            gates_type: self.track.gate_types(),
            current_gate_id: self.episode.current_gate_id(),
            at_goal_position: self.episode.at_goal,
            task_completed: self.episode.task_completed,
            goal_reached,
            constraint_violated: self.constraint_violated,
            termination,
        }
    }

    fn reset_info(&self, step: StepInfo) -> ResetInfo {
        let gate_shape = |kind: GateKind| GateShape {
            shape: "square",
            height: kind.height(),
            edge: GATE_EDGE,
        };
        ResetInfo {
            model: Arc::clone(&self.model),
            nominal_physical_parameters: self.nominal,
            x_reference: (0..self.goal.len())
                .map(|i| self.goal.state_at(i).as_slice().to_vec())
                .collect(),
            u_reference: self.goal.input().as_slice().to_vec(),
            ctrl_timestep: self.config.ctrl_timestep(),
            ctrl_freq: self.config.ctrl_freq,
            episode_len_sec: self.config.episode_len_sec,
            quadrotor_kf: self.config.vehicle.kf,
            quadrotor_km: self.config.vehicle.km,
            gate_dimensions: GateDimensions {
                tall: gate_shape(GateKind::Tall),
                low: gate_shape(GateKind::Low),
            },
            obstacle_dimensions: ObstacleDimensions {
                shape: "cylinder",
                height: OBSTACLE_HEIGHT,
                radius: OBSTACLE_RADIUS,
            },
            nominal_gates: self.track.gates().to_vec(),
            nominal_obstacles: self.track.obstacles().to_vec(),
            randomization: self.randomizer.clone(),
            disturbances: self.config.disturbances.clone(),
            step,
        }
    }
}

/// Engine state for a labelled initial state. Labels absent at the
/// fidelity are zero. The 2D pitch rate acts about the world y axis; 3D
/// rates are body rates.
fn initial_body_state(fidelity: Fidelity, values: &[(&'static str, f64)]) -> BodyState {
    let get = |label: &str| {
        values
            .iter()
            .find(|(l, _)| *l == label)
            .map_or(0.0, |(_, v)| *v)
    };
    let orientation =
        UnitQuaternion::from_euler_angles(get("init_phi"), get("init_theta"), get("init_psi"));
    let angular_velocity = match fidelity {
        Fidelity::OneD => Vector3::zeros(),
        Fidelity::TwoD => Vector3::new(0.0, get("init_theta_dot"), 0.0),
        Fidelity::ThreeD => {
            orientation * Vector3::new(get("init_p"), get("init_q"), get("init_r"))
        }
    };
    BodyState {
        position: Vector3::new(get("init_x"), get("init_y"), get("init_z")),
        orientation,
        linear_velocity: Vector3::new(get("init_x_dot"), get("init_y_dot"), get("init_z_dot")),
        angular_velocity,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
