//! The shipped configuration files load and build an environment.

use rotorgym_core::config::{EnvConfig, InitStateOverride};
use rotorgym_core::{CostKind, Fidelity, TaskKind};
use rotorgym_env::prelude::*;
use rotorgym_physics::PwmMotorMap;
use rotorgym_test_utils::ScriptedEngine;

fn load(content: &str) -> EnvConfig {
    EnvConfig::from_toml_str(content).unwrap()
}

fn build(config: EnvConfig) -> QuadrotorEnv<ScriptedEngine> {
    let motors = Box::new(PwmMotorMap::from_vehicle(&config.vehicle));
    QuadrotorEnv::new(config, ScriptedEngine::new(), motors).unwrap()
}

#[test]
fn hover_config_loads() {
    let config = load(include_str!("../../../configs/hover_2d.toml"));
    assert_eq!(config.fidelity, Fidelity::TwoD);
    assert!(matches!(config.init_state, Some(InitStateOverride::Partial(_))));
    let mut env = build(config);
    let reset = env.reset(ResetOptions::default()).unwrap();
    assert_eq!(reset.observation.len(), 12);
    assert!(env.reward_policy().name() == "dense");
}

#[test]
fn tracking_config_loads() {
    let config = load(include_str!("../../../configs/tracking_3d.toml"));
    assert_eq!(config.task, TaskKind::TrajectoryTracking);
    assert!(matches!(config.init_state, Some(InitStateOverride::Full(_))));
    let mut env = build(config);
    let reset = env.reset(ResetOptions::default()).unwrap();
    assert_eq!(reset.info.x_reference.len(), 480);
    assert_eq!(env.action_space().high, vec![1.0; 4]);
}

#[test]
fn competition_config_loads() {
    let config = load(include_str!("../../../configs/competition.toml"));
    assert_eq!(config.cost, CostKind::Competition);
    let mut env = build(config);
    let reset = env.reset(ResetOptions::default().with_initial_target_gate(1)).unwrap();
    assert_eq!(reset.info.nominal_gates.len(), 4);
    assert_eq!(reset.info.nominal_obstacles.len(), 4);
    assert_eq!(reset.info.step.gates_type, vec![0, 1, 1, 0]);
    assert_eq!(reset.info.step.current_gate_id, 1);
}
