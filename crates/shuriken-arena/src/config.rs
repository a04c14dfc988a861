use serde::{Deserialize, Serialize};

use shuriken_core::slots::DEFAULT_CAPACITY;
use shuriken_core::time::Millis;

/// Allowed range for kills-to-win.
pub const MAX_SCORE_RANGE: (u32, u32) = (1, 15);
/// Allowed range for the round time limit, in seconds.
pub const ROUND_TIME_RANGE: (u32, u32) = (15, 600);
/// Step used by the round time menu buttons.
pub const ROUND_TIME_STEP: i32 = 10;

/// Data-driven configuration for a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Number of player slots.
    pub slot_capacity: usize,
    /// Occupants required before a start request is honoured.
    pub min_players: usize,
    /// Lives each player starts a round with.
    pub starting_lives: u8,
    /// Kills needed to win the game.
    pub max_score: u32,
    /// Round clock shown to players (seconds). Display only.
    pub round_time_limit_secs: u32,
    /// RoundStarting -> Fighting delay.
    pub fighting_delay_ms: Millis,
    /// How long "one player left alive" must hold before the round ends.
    pub elimination_confirm_ms: Millis,
    /// RoundEnding -> RoundStarting delay.
    pub inter_round_delay_ms: Millis,
    /// GameEnding -> Lobby delay.
    pub game_end_delay_ms: Millis,
    /// Delay between a pickup being taken (or the arena changing) and the next spawn.
    pub power_up_respawn_ms: Millis,
    /// Release speed above which a release counts as a throw (m/s).
    pub throw_speed_threshold: f32,
    /// Launch speed applied along the thrower's forward vector (m/s).
    pub throw_impulse: f32,
    /// Speed below which a thrown projectile is considered at rest (m/s).
    pub rest_speed: f32,
    /// Horizontal distance from the owner a resting projectile may lie at.
    pub ground_distance: f32,
    /// Distance from the owner beyond which a projectile is always recalled.
    pub tether_distance: f32,
    /// Height below which a projectile is recalled.
    pub floor_y: f32,
    /// Return-to-owner offset along the owner's forward vector.
    pub return_forward: f32,
    /// Return-to-owner offset above the owner's position.
    pub return_up: f32,
    /// Lobby countdown shown to the session owner (seconds).
    pub host_countdown_secs: u64,
    /// Lobby countdown shown to everyone else (seconds).
    pub guest_countdown_secs: u64,
    /// Practice targets placed in the lobby.
    pub practice_targets: u8,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            slot_capacity: DEFAULT_CAPACITY,
            min_players: 2,
            starting_lives: 3,
            max_score: 10,
            round_time_limit_secs: 120,
            fighting_delay_ms: 3_000,
            elimination_confirm_ms: 1_500,
            inter_round_delay_ms: 5_000,
            game_end_delay_ms: 8_000,
            power_up_respawn_ms: 10_000,
            throw_speed_threshold: 2.0,
            throw_impulse: 12.0,
            rest_speed: 0.1,
            ground_distance: 6.0,
            tether_distance: 40.0,
            floor_y: -10.0,
            return_forward: 0.5,
            return_up: 1.0,
            host_countdown_secs: 10,
            guest_countdown_secs: 30,
            practice_targets: 1,
        }
    }
}

impl ArenaConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("SHURIKEN_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
        {
            match toml::from_str::<Self>(&contents) {
                Ok(config) => return config.validated(),
                Err(e) => tracing::warn!("Failed to parse {path}: {e}"),
            }
        }
        if let Ok(contents) = std::fs::read_to_string("config/shuriken.toml") {
            match toml::from_str::<Self>(&contents) {
                Ok(config) => return config.validated(),
                Err(e) => tracing::warn!("Failed to parse config/shuriken.toml: {e}"),
            }
        }
        Self::default()
    }

    /// Clamp out-of-range values, warning about each one.
    pub fn validated(mut self) -> Self {
        let (lo, hi) = MAX_SCORE_RANGE;
        if !(lo..=hi).contains(&self.max_score) {
            tracing::warn!(max_score = self.max_score, "max_score out of range, clamping");
            self.max_score = self.max_score.clamp(lo, hi);
        }
        let (lo, hi) = ROUND_TIME_RANGE;
        if !(lo..=hi).contains(&self.round_time_limit_secs) {
            tracing::warn!(
                round_time_limit_secs = self.round_time_limit_secs,
                "round_time_limit_secs out of range, clamping"
            );
            self.round_time_limit_secs = self.round_time_limit_secs.clamp(lo, hi);
        }
        if self.slot_capacity == 0 || self.slot_capacity > u8::MAX as usize {
            tracing::warn!(
                slot_capacity = self.slot_capacity,
                "slot_capacity must be 1..=255, using default"
            );
            self.slot_capacity = DEFAULT_CAPACITY;
        }
        if self.min_players == 0 {
            tracing::warn!("min_players must be > 0, using 1");
            self.min_players = 1;
        }
        if self.starting_lives == 0 {
            tracing::warn!("starting_lives must be > 0, using 1");
            self.starting_lives = 1;
        }
        if self.tether_distance < self.ground_distance {
            tracing::warn!(
                tether_distance = self.tether_distance,
                ground_distance = self.ground_distance,
                "tether_distance is shorter than ground_distance"
            );
        }
        self
    }
}
