use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::win_prob::{DEFAULT_STEEPNESS, WinProbModel};

pub const DEFAULT_TRIALS: u32 = 5000;

/// Simulation knobs read from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub trials: u32,
    /// Worker threads; `None` runs on rayon's global pool.
    pub parallelism: Option<usize>,
    /// Fixed base seed; `None` draws one from entropy per run.
    pub seed: Option<u64>,
    pub steepness: f64,
    pub timeout: Option<Duration>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            parallelism: None,
            seed: None,
            steepness: DEFAULT_STEEPNESS,
            timeout: None,
        }
    }
}

impl SimConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            // Not clamped: zero must reach validation and be rejected there.
            trials: env_parse("SIM_TRIALS").unwrap_or(d.trials),
            parallelism: env_parse::<usize>("SIM_PARALLELISM").map(|n| n.clamp(1, 64)),
            seed: env_parse("SIM_SEED"),
            steepness: env_parse::<f64>("SIM_STEEPNESS")
                .filter(|k| WinProbModel::new(*k).is_valid())
                .unwrap_or(d.steepness),
            timeout: env_parse::<u64>("SIM_TIMEOUT_MS").map(Duration::from_millis),
        }
    }

    pub fn model(&self) -> WinProbModel {
        WinProbModel::new(self.steepness)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|val| val.trim().parse::<T>().ok())
}
