//! Full episodes on the reference rigid-body engine.

use std::collections::BTreeMap;

use approx::assert_relative_eq;
use rotorgym_core::config::{DistributionSpec, EnvConfig, InitStateOverride};
use rotorgym_core::traits::PhysicsEngine;
use rotorgym_core::{Action, CostKind, Fidelity, RotorgymError, SimError, TaskKind};
use rotorgym_env::prelude::*;
use rotorgym_physics::{PwmMotorMap, RigidBodyEngine};
use rotorgym_test_utils::{competition_config, hover_config};

fn make_env(config: EnvConfig) -> QuadrotorEnv<RigidBodyEngine> {
    let engine = RigidBodyEngine::from_vehicle(&config.vehicle);
    let motors = Box::new(PwmMotorMap::from_vehicle(&config.vehicle));
    QuadrotorEnv::new(config, engine, motors).unwrap()
}

fn airborne(fidelity: Fidelity) -> EnvConfig {
    let mut config = hover_config(fidelity);
    let mut values = vec![0.0; fidelity.state_dim()];
    let z = fidelity.state_labels().iter().position(|l| *l == "z").unwrap_or(0);
    values[z] = 1.0;
    config.init_state = Some(InitStateOverride::Full(values));
    config
}

#[test]
fn hover_thrust_holds_altitude_for_whole_episode() {
    for fidelity in [Fidelity::OneD, Fidelity::TwoD, Fidelity::ThreeD] {
        let mut env = make_env(airborne(fidelity));
        env.reset(ResetOptions::default()).unwrap();
        let a = Action::new(env.model().hover_input().as_slice().to_vec());
        let mut steps = 0;
        loop {
            let result = env.step(&a).unwrap();
            steps += 1;
            assert!(!result.terminated, "{fidelity} vehicle left the bounds");
            if result.is_done() {
                break;
            }
        }
        assert_eq!(steps, env.config().ctrl_steps());
        let z = env.model().state_labels().iter().position(|l| *l == "z").unwrap();
        assert_relative_eq!(env.state()[z], 1.0, epsilon = 1e-3);
        assert_relative_eq!(env.engine().time(), 5.0, epsilon = 1e-9);
    }
}

#[test]
fn minimum_thrust_falls_to_the_ground() {
    let mut config = airborne(Fidelity::OneD);
    config.done_on_collision = true;
    let mut env = make_env(config);
    env.reset(ResetOptions::default()).unwrap();
    // Clipped up to the lowest PWM thrust, which is below the weight.
    let a = Action::zeros(1);
    let result = loop {
        let result = env.step(&a).unwrap();
        if result.is_done() {
            break result;
        }
    };
    assert!(result.terminated);
    assert_eq!(result.info.termination, Some(TerminationCause::Collision));
    assert_eq!(result.info.collision.0, Some(env.engine().ground_plane()));
    assert!(env.state()[0] < 0.1);
}

#[test]
fn resting_on_ground_reports_ground_contact() {
    let mut env = make_env(competition_config());
    let reset = env.reset(ResetOptions::default()).unwrap();
    assert_eq!(reset.info.step.collision.0, Some(env.engine().ground_plane()));
    assert_eq!(reset.info.nominal_gates.len(), 4);
    assert_eq!(env.engine().scenery_len(), 6);
}

#[test]
fn normalized_action_space_maps_zero_to_hover() {
    let mut config =
        airborne(Fidelity::TwoD).with_task(TaskKind::Stabilization, CostKind::Quadratic);
    config.normalized_action_space = true;
    let mut env = make_env(config);
    env.reset(ResetOptions::default()).unwrap();
    assert_eq!(env.action_space().low, vec![-1.0, -1.0]);
    let a = Action::zeros(2);
    for _ in 0..60 {
        env.step(&a).unwrap();
    }
    assert_relative_eq!(env.state()[2], 1.0, epsilon = 1e-3);
}

#[test]
fn rejected_mass_draw_keeps_previous_episode() {
    let mut config = competition_config();
    config.randomization.inertial_prop.enabled = true;
    config.randomization.inertial_prop.info = Some(BTreeMap::from([(
        "M".to_string(),
        DistributionSpec::Uniform { low: -0.1, high: 0.1 },
    )]));
    let mut env = make_env(config);

    let mut seeds = 0..256_u64;
    let accepted = seeds
        .by_ref()
        .find(|&seed| env.reset(ResetOptions::default().with_seed(seed)).is_ok());
    assert!(accepted.is_some(), "no seed drew a positive mass");
    let a = Action::new(env.model().hover_input().as_slice().to_vec());
    env.step(&a).unwrap();

    let phase = env.episode().phase;
    let ctrl_step = env.episode().ctrl_step;
    let episode_number = env.episode().episode_number;
    let state = env.state().clone();
    let placed = env.placed_track().clone();
    let time = env.engine().time();

    let rejected = seeds.find_map(|seed| env.reset(ResetOptions::default().with_seed(seed)).err());
    assert!(matches!(
        rejected,
        Some(RotorgymError::Simulation(SimError::NonPhysicalParameter { .. }))
    ));

    assert_eq!(env.engine().scenery_len(), 6);
    assert_eq!(env.episode().phase, phase);
    assert_eq!(env.episode().ctrl_step, ctrl_step);
    assert_eq!(env.episode().episode_number, episode_number);
    assert_eq!(env.state(), &state);
    assert_eq!(env.placed_track(), &placed);
    assert_relative_eq!(env.engine().time(), time);

    // The interrupted episode carries on.
    let result = env.step(&a).unwrap();
    assert_eq!(env.episode().ctrl_step, ctrl_step + 1);
    assert!(!result.truncated);
}
