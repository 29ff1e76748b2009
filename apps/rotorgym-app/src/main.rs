//! rotorgym quadrotor environment CLI.
//!
//! Provides three modes of operation:
//! - `run`: Run N episodes with a hover controller and print statistics
//! - `info`: Print the dynamics model and reset info of a configuration
//! - `check-config`: Load and validate a configuration file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rotorgym_core::config::EnvConfig;
use rotorgym_core::{Action, Fidelity};
use rotorgym_env::prelude::*;
use rotorgym_physics::{PwmMotorMap, RigidBodyEngine};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Simulated quadrotor environment.
#[derive(Parser)]
#[command(name = "rotorgym", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run episodes with a hover controller and print statistics.
    Run {
        /// Environment configuration (TOML). Defaults are used if omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of episodes to run.
        #[arg(short = 'n', long, default_value_t = 1)]
        episodes: u32,

        /// Seed for the first reset.
        #[arg(short, long)]
        seed: Option<u64>,

        /// Start each episode in front of this gate.
        #[arg(long)]
        start_gate: Option<usize>,
    },

    /// Print the dynamics model and reset info.
    Info {
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the full reset info as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Validate a configuration file.
    CheckConfig {
        config: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// HoverController
// ---------------------------------------------------------------------------

/// Equal-thrust altitude hold around the goal height.
struct HoverController {
    hover: Vec<f64>,
    z: usize,
    kp: f64,
    kd: f64,
    /// `Some(scale)` when actions are normalized around hover.
    normalized: Option<f64>,
}

impl HoverController {
    fn new(env: &QuadrotorEnv<RigidBodyEngine>) -> Self {
        let config = env.config();
        Self {
            hover: env.model().hover_input().as_slice().to_vec(),
            z: match config.fidelity {
                Fidelity::OneD => 0,
                Fidelity::TwoD => 2,
                Fidelity::ThreeD => 4,
            },
            kp: 0.5,
            kd: 0.3,
            normalized: config.normalized_action_space.then_some(config.norm_act_scale),
        }
    }

    fn act(&self, state: &[f64], goal: &[f64]) -> Action {
        let error = goal[self.z] - state[self.z];
        let gain = 1.0 + self.kp * error - self.kd * state[self.z + 1];
        let values = match self.normalized {
            Some(scale) if scale > 0.0 => vec![(gain - 1.0) / scale; self.hover.len()],
            Some(_) => vec![0.0; self.hover.len()],
            None => self.hover.iter().map(|h| h * gain).collect(),
        };
        Action::new(values)
    }
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<EnvConfig> {
    match path {
        Some(path) => EnvConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display())),
        None => Ok(EnvConfig::default()),
    }
}

fn build_env(config: EnvConfig) -> Result<QuadrotorEnv<RigidBodyEngine>> {
    let engine = RigidBodyEngine::from_vehicle(&config.vehicle);
    let motors = Box::new(PwmMotorMap::from_vehicle(&config.vehicle));
    Ok(QuadrotorEnv::new(config, engine, motors)?)
}

fn run_episodes(
    config: Option<&Path>,
    episodes: u32,
    seed: Option<u64>,
    start_gate: Option<usize>,
) -> Result<()> {
    let mut env = build_env(load_config(config)?)?;
    let controller = HoverController::new(&env);
    let mut stats = EpisodeStats::new();

    for ep in 0..episodes {
        let mut options = ResetOptions {
            initial_target_gate_id: start_gate,
            ..ResetOptions::default()
        };
        if ep == 0 {
            options.seed = seed;
        }
        env.reset(options)?;

        let last = loop {
            let goal = env.goal().state_at(env.episode().ctrl_step);
            let action = controller.act(env.state().as_slice(), goal.as_slice());
            let result = env.step(&action)?;
            if result.is_done() {
                break result;
            }
        };
        stats.record(env.episode());

        let episode = env.episode();
        println!(
            "episode {}: steps={}, reward={:.3}, gate={}, end={}",
            ep + 1,
            episode.ctrl_step,
            episode.total_reward,
            last.info.current_gate_id,
            last.info
                .termination
                .map_or_else(|| "time limit".to_string(), |c| format!("{c:?}")),
        );
    }

    println!(
        "\ntotal: episodes={}, steps={}, mean length={:.1}, mean return={:.3}",
        stats.episodes_completed,
        stats.total_steps,
        stats.mean_episode_length().unwrap_or(0.0),
        stats.mean_return().unwrap_or(0.0),
    );
    Ok(())
}

fn run_info(config: Option<&Path>, json: bool) -> Result<()> {
    let mut env = build_env(load_config(config)?)?;
    let reset = env.reset(ResetOptions::default())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&reset.info)?);
        return Ok(());
    }

    let model = env.model();
    println!("rotorgym v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("fidelity:     {}", model.fidelity());
    println!("state:        {:?}", model.state_labels());
    println!("input:        {:?}", model.input_labels());
    println!("hover input:  {:?}", model.hover_input().as_slice());
    println!("ctrl dt:      {} s ({} substeps)", model.dt(), env.config().substeps());
    println!("reward:       {}", env.reward_policy().name());
    println!("obs dim:      {}", env.observation_space().dim());
    let goal = env.goal();
    let goal_kind = if goal.is_tracking() { "tracking" } else { "fixed" };
    println!("goal:         {goal_kind}, {} steps", goal.len());
    println!("gates:        {}", env.track().gate_count());
    println!("obstacles:    {}", env.track().obstacles().len());
    Ok(())
}

fn check_config(path: &Path) -> Result<()> {
    let config = load_config(Some(path))?;
    let fidelity = config.fidelity;
    let steps = config.ctrl_steps();
    // Building the environment also resolves distributions and the track.
    build_env(config)?;
    info!(path = %path.display(), "configuration ok");
    println!("ok: {fidelity} vehicle, {steps} control steps per episode");
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run {
            config,
            episodes,
            seed,
            start_gate,
        }) => run_episodes(config.as_deref(), episodes, seed, start_gate),
        Some(Commands::Info { config, json }) => run_info(config.as_deref(), json),
        Some(Commands::CheckConfig { config }) => check_config(&config),
        None => run_episodes(None, 1, None, None),
    }
}
