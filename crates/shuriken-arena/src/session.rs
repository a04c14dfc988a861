use serde::{Deserialize, Serialize};

use shuriken_core::player::PlayerId;
use shuriken_core::slots::{SlotIndex, SlotTable};
use shuriken_core::time::Deadline;

use crate::config::ArenaConfig;
use crate::level::Level;
use crate::phase::Phase;
use crate::powerups::Pickup;

/// Session-wide replicated state, owned by the game logic authority.
///
/// Deadlines are authority-local scheduling and are not sent to replicas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub phase: Phase,
    /// Rounds started since the last return to the lobby.
    pub round: u32,
    pub max_score: u32,
    pub round_time_limit_secs: u32,
    pub level: Level,
    pub slots: SlotTable,
    /// Power-ups currently lying in the arena.
    pub pickups: Vec<Pickup>,
    #[serde(skip)]
    pub next_phase_deadline: Deadline,
    #[serde(skip)]
    pub power_up_respawn_deadline: Deadline,
}

impl Session {
    pub fn new(config: &ArenaConfig) -> Self {
        Self {
            phase: Phase::Lobby,
            round: 0,
            max_score: config.max_score,
            round_time_limit_secs: config.round_time_limit_secs,
            level: Level::Lobby,
            slots: SlotTable::new(config.slot_capacity),
            pickups: Vec::new(),
            next_phase_deadline: Deadline::NONE,
            power_up_respawn_deadline: Deadline::NONE,
        }
    }

    pub fn slot_of(&self, player: PlayerId) -> Option<SlotIndex> {
        self.slots.find_slot(player)
    }

    pub fn is_joined(&self, player: PlayerId) -> bool {
        self.slot_of(player).is_some()
    }

    /// Alive players other than the one asking, as shown on hit banners.
    pub fn others_remaining(&self) -> usize {
        self.slots.alive_count().saturating_sub(1)
    }
}

/// Who won a game, carried on the game-end broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub player: PlayerId,
    pub slot: u8,
    pub score: u32,
}
