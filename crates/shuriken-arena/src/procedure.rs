use serde::{Deserialize, Serialize};

use shuriken_core::net::messages::Envelope;
use shuriken_core::net::outbox::{Outbound, Outbox};
use shuriken_core::player::PlayerId;

use crate::level::Level;
use crate::powerups::ShurikenPowerUp;
use crate::session::Winner;

/// Every procedure a networked object in the arena exposes.
///
/// The caller is always the envelope's `sender`; procedures never carry the
/// caller's identity themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Procedure {
    // Game logic owner
    StartGame,
    RequestJoin,
    RequestLeave,
    /// The sender's projectile struck `victim`'s collider.
    RegisterHit { victim: PlayerId },
    /// The sender's projectile touched pickup `pickup`.
    CollectPowerUp { pickup: u16 },
    ModifyMaxScore { delta: i32 },
    ModifyRoundTimeLimit { delta: i32 },

    // Round lifecycle, to every holder of each projectile and collider
    RoundStart { level: Level, round: u32 },
    FightingStart,
    RoundEnd,
    GameEnd { winner: Option<Winner> },

    // Projectile holders
    ActivatePowerUp { kind: ShurikenPowerUp },

    // Collider owner
    NotifyHit { attacker: PlayerId, lives_left: u8 },
    NotifyKill { victim: PlayerId, score: u32 },

    // Target owner
    TargetHit,
}

impl Procedure {
    /// True for the four round-lifecycle broadcasts.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Procedure::RoundStart { .. }
                | Procedure::FightingStart
                | Procedure::RoundEnd
                | Procedure::GameEnd { .. }
        )
    }

    /// Procedures only the game logic owner may send.
    pub fn is_authority_only(&self) -> bool {
        self.is_lifecycle()
            || matches!(
                self,
                Procedure::ActivatePowerUp { .. }
                    | Procedure::NotifyHit { .. }
                    | Procedure::NotifyKill { .. }
            )
    }
}

pub type ArenaEnvelope = Envelope<Procedure>;
pub type ArenaOutbound = Outbound<Procedure>;
pub type ArenaOutbox = Outbox<Procedure>;
