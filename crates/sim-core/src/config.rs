use crate::error::ValidationError;
use crate::params::HISTORY_CAP;
use serde::{Deserialize, Serialize};

/// Session configuration.
///
/// Every field has a default, so a partial YAML document is enough.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Wall-clock length of one quarter in live mode.
    pub quarter_duration_secs: u64,
    /// Seed for the session RNG (bot names, bot decisions, entrants).
    pub rng_seed: u64,
    /// Bots created by the initial population, inclusive range.
    pub initial_bots_min: u32,
    pub initial_bots_max: u32,
    /// New bot entrants are considered every this many quarters; 0 disables.
    pub entrant_interval: u32,
    pub entrants_min: u32,
    pub entrants_max: u32,
    /// No entrants are admitted once this many firms are alive.
    pub max_live_firms: usize,
    /// Entries of per-firm history kept.
    pub history_cap: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            quarter_duration_secs: 120,
            rng_seed: 42,
            initial_bots_min: 10,
            initial_bots_max: 25,
            entrant_interval: 5,
            entrants_min: 1,
            entrants_max: 3,
            max_live_firms: 30,
            history_cap: HISTORY_CAP,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.quarter_duration_secs == 0 {
            return Err(ValidationError::OutOfRange {
                field: "quarter_duration_secs",
                min: 1.0,
                max: u64::MAX as f64,
            });
        }
        if self.initial_bots_min > self.initial_bots_max {
            return Err(ValidationError::OutOfRange {
                field: "initial_bots_min",
                min: 0.0,
                max: self.initial_bots_max as f64,
            });
        }
        if self.entrants_min > self.entrants_max {
            return Err(ValidationError::OutOfRange {
                field: "entrants_min",
                min: 0.0,
                max: self.entrants_max as f64,
            });
        }
        if self.history_cap == 0 {
            return Err(ValidationError::OutOfRange {
                field: "history_cap",
                min: 1.0,
                max: usize::MAX as f64,
            });
        }
        Ok(())
    }
}
