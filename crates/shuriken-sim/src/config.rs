use serde::{Deserialize, Serialize};

use shuriken_arena::config::ArenaConfig;

/// Knobs for a headless bot match, loaded from `config/sim.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub bots: usize,
    /// Virtual milliseconds per frame.
    pub tick_ms: u64,
    pub seed: u64,
    /// Give up after this much virtual time.
    pub max_match_secs: u64,
    /// Chance a throw at an opponent connects.
    pub accuracy: f64,
    /// Chance a throw goes for a pickup when one is out.
    pub pickup_chance: f64,
    pub throw_cooldown_ms: u64,
    /// Drop the last bot once this round is under way. Zero keeps everyone.
    pub dropout_round: u32,
    pub arena: ArenaConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            bots: 4,
            tick_ms: 50,
            seed: 7,
            max_match_secs: 1_800,
            accuracy: 0.4,
            pickup_chance: 0.25,
            throw_cooldown_ms: 1_200,
            dropout_round: 0,
            arena: ArenaConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("SHURIKEN_SIM_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
        {
            match toml::from_str::<Self>(&contents) {
                Ok(config) => return config.validated(),
                Err(e) => tracing::warn!("Failed to parse {path}: {e}"),
            }
        }
        if let Ok(contents) = std::fs::read_to_string("config/sim.toml") {
            match toml::from_str::<Self>(&contents) {
                Ok(config) => return config.validated(),
                Err(e) => tracing::warn!("Failed to parse config/sim.toml: {e}"),
            }
        }
        Self::default()
    }

    pub fn validated(mut self) -> Self {
        self.arena = self.arena.validated();
        if self.bots == 0 {
            tracing::warn!("bots must be > 0, using 1");
            self.bots = 1;
        }
        if self.tick_ms == 0 {
            tracing::warn!("tick_ms must be > 0, using 50");
            self.tick_ms = 50;
        }
        for (name, value) in [
            ("accuracy", &mut self.accuracy),
            ("pickup_chance", &mut self.pickup_chance),
        ] {
            if !(0.0..=1.0).contains(value) {
                tracing::warn!(value = *value, "{name} must be within 0..=1, clamping");
                *value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
            }
        }
        self
    }
}
