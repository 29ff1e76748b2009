//! Episode statistics tracking.
//!
//! [`EpisodeStats`] records cumulative statistics across episodes: total
//! episodes, total steps, and per-episode step counts and returns.

use crate::episode::Episode;

// ---------------------------------------------------------------------------
// EpisodeStats
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeStats {
    /// Total number of finished episodes.
    pub episodes_completed: u32,
    /// Total control steps across all finished episodes.
    pub total_steps: u64,
    /// Steps per finished episode.
    pub step_history: Vec<usize>,
    /// Summed reward per finished episode.
    pub returns: Vec<f64>,
}

impl Default for EpisodeStats {
    fn default() -> Self {
        Self::new()
    }
}

impl EpisodeStats {
    pub const fn new() -> Self {
        Self {
            episodes_completed: 0,
            total_steps: 0,
            step_history: Vec::new(),
            returns: Vec::new(),
        }
    }

    /// Record `episode` if it has finished. Returns whether it was recorded.
    pub fn record(&mut self, episode: &Episode) -> bool {
        if !episode.phase.is_terminal() {
            return false;
        }
        self.episodes_completed += 1;
        self.total_steps += episode.ctrl_step as u64;
        self.step_history.push(episode.ctrl_step);
        self.returns.push(episode.total_reward);
        true
    }

    /// Average episode length (steps) across all finished episodes.
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_episode_length(&self) -> Option<f64> {
        if self.step_history.is_empty() {
            return None;
        }
        let sum: usize = self.step_history.iter().sum();
        Some(sum as f64 / self.step_history.len() as f64)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn mean_return(&self) -> Option<f64> {
        if self.returns.is_empty() {
            return None;
        }
        Some(self.returns.iter().sum::<f64>() / self.returns.len() as f64)
    }

    /// Reset all statistics.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(steps: usize, reward: f64) -> Episode {
        let mut ep = Episode::default();
        ep.begin(0, 0);
        for _ in 0..steps {
            ep.advance(reward);
        }
        ep.truncate();
        ep
    }

    #[test]
    fn stats_default_empty() {
        let stats = EpisodeStats::new();
        assert_eq!(stats.episodes_completed, 0);
        assert_eq!(stats.total_steps, 0);
        assert!(stats.mean_episode_length().is_none());
        assert!(stats.mean_return().is_none());
    }

    #[test]
    fn records_only_finished_episodes() {
        let mut stats = EpisodeStats::new();
        let mut running = Episode::default();
        running.begin(0, 0);
        assert!(!stats.record(&running));
        assert!(stats.record(&finished(3, 1.0)));
        assert_eq!(stats.episodes_completed, 1);
        assert_eq!(stats.total_steps, 3);
        assert_eq!(stats.step_history, vec![3]);
    }

    #[test]
    fn means_compute() {
        let mut stats = EpisodeStats::new();
        stats.record(&finished(100, 0.5));
        stats.record(&finished(300, 0.5));
        assert!((stats.mean_episode_length().unwrap() - 200.0).abs() < f64::EPSILON);
        assert!((stats.mean_return().unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn reset_clears_stats() {
        let mut stats = EpisodeStats::new();
        stats.record(&finished(10, 1.0));
        stats.reset();
        assert_eq!(stats, EpisodeStats::default());
    }
}
