use serde::{Deserialize, Serialize};

use crate::clock::GameDate;
use crate::error::SimResult;

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for deterministic spawning and growth.
    pub seed: u64,
    /// Real milliseconds per ten in-game minutes.
    pub ms_per_ten_minutes: u32,
    /// Milliseconds simulated by one frame.
    pub frame_ms: u32,
    /// The date the simulation starts on.
    pub start_date: GameDate,
    /// Maximum event log size (oldest events dropped when exceeded). 0 = unlimited.
    pub max_events: usize,
    /// Monsters walk through other monsters.
    pub monsters_pass_through: bool,
    /// Upper bound on scripted steps run in a single frame.
    pub max_script_steps_per_frame: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            ms_per_ten_minutes: 7_000,
            frame_ms: 16,
            start_date: GameDate::default(),
            max_events: 0,
            monsters_pass_through: true,
            max_script_steps_per_frame: 8,
        }
    }
}

impl SimConfig {
    /// Parse from JSON; missing fields take defaults.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set real milliseconds per ten game minutes.
    pub fn with_ms_per_ten_minutes(mut self, ms: u32) -> Self {
        self.ms_per_ten_minutes = ms;
        self
    }

    /// Set milliseconds simulated per frame.
    pub fn with_frame_ms(mut self, ms: u32) -> Self {
        self.frame_ms = ms;
        self
    }

    /// Set the first simulated date.
    pub fn with_start_date(mut self, date: GameDate) -> Self {
        self.start_date = date;
        self
    }

    /// Set the maximum event log size (0 = unlimited).
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    /// Let monsters walk through one another.
    pub fn with_monsters_pass_through(mut self, pass: bool) -> Self {
        self.monsters_pass_through = pass;
        self
    }

    /// Cap script steps run in one frame.
    pub fn with_max_script_steps_per_frame(mut self, steps: usize) -> Self {
        self.max_script_steps_per_frame = steps;
        self
    }
}
