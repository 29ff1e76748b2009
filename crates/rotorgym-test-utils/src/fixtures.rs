//! Ready-made environment configurations.

use rotorgym_core::config::{EnvConfig, GateConfig, ObstacleConfig};
use rotorgym_core::{CostKind, Fidelity, TaskKind};

/// Stabilization at `[x, y, z] = [0, 0, 1]` with the dense reward.
pub fn hover_config(fidelity: Fidelity) -> EnvConfig {
    EnvConfig::default()
        .with_fidelity(fidelity)
        .with_task(TaskKind::Stabilization, CostKind::RlReward)
        .with_seed(7)
}

/// Circle tracking with the quadratic cost over a two second episode.
pub fn tracking_config(fidelity: Fidelity) -> EnvConfig {
    let mut config = EnvConfig::default()
        .with_fidelity(fidelity)
        .with_task(TaskKind::TrajectoryTracking, CostKind::Quadratic)
        .with_seed(11);
    config.episode_len_sec = 2.0;
    config
}

/// Four gates around a 2 m square, alternating tall and low, with two
/// obstacles. Gate heights are added at placement, so configured z is 0.
pub fn square_track() -> (Vec<GateConfig>, Vec<ObstacleConfig>) {
    let gates = vec![
        GateConfig {
            pose: [1.0, 0.0, 0.0, 0.0, 0.0, 1.57],
            kind: 0,
        },
        GateConfig {
            pose: [1.0, 2.0, 0.0, 0.0, 0.0, 0.0],
            kind: 1,
        },
        GateConfig {
            pose: [-1.0, 2.0, 0.0, 0.0, 0.0, 1.57],
            kind: 0,
        },
        GateConfig {
            pose: [-1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            kind: 1,
        },
    ];
    let obstacles = vec![
        ObstacleConfig {
            pose: [0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        },
        ObstacleConfig {
            pose: [2.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        },
    ];
    (gates, obstacles)
}

/// 3D gate racing on [`square_track`] with the sparse reward.
pub fn competition_config() -> EnvConfig {
    let (gates, obstacles) = square_track();
    let mut config = EnvConfig::default()
        .with_fidelity(Fidelity::ThreeD)
        .with_task(TaskKind::Stabilization, CostKind::Competition)
        .with_seed(3);
    config.task_info.stabilization_goal = Some(vec![0.0, -1.0, 1.0]);
    config.gates = gates;
    config.obstacles = obstacles;
    config.done_on_out_of_bound = false;
    config
}
