use shuriken_core::net::messages::ObjectId;
use shuriken_core::player::PlayerId;
use shuriken_core::slots::SlotIndex;

use crate::level::Level;
use crate::listener::{RoundContext, RoundListener};
use crate::notices;
use crate::phase::Phase;
use crate::pose::{Pose, Vec3};
use crate::session::Winner;
use crate::stats::Stat;

/// Hit volume that follows the player in one slot.
///
/// The occupant owns it, so hit and kill notifications addressed to the
/// owner land on that player's participant.
#[derive(Debug, Clone)]
pub struct PlayerCollider {
    slot: SlotIndex,
    occupant: Option<PlayerId>,
    position: Vec3,
}

impl PlayerCollider {
    pub fn new(slot: SlotIndex) -> Self {
        Self {
            slot,
            occupant: None,
            position: Vec3::ZERO,
        }
    }

    pub fn object(&self) -> ObjectId {
        ObjectId::Collider(self.slot as u8)
    }

    pub fn slot(&self) -> SlotIndex {
        self.slot
    }

    pub fn occupant(&self) -> Option<PlayerId> {
        self.occupant
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Returns `true` if the occupant changed.
    pub fn bind(&mut self, occupant: Option<PlayerId>) -> bool {
        let changed = self.occupant != occupant;
        self.occupant = occupant;
        changed
    }

    pub fn follow(&mut self, pose: &Pose) {
        self.position = pose.position;
    }

    fn is_local_player(&self, ctx: &RoundContext<'_>) -> bool {
        ctx.is_owner && self.occupant == Some(ctx.local)
    }

    /// The local player was hit by `attacker`.
    pub fn notify_hit(&self, attacker: PlayerId, lives_left: u8, ctx: &mut RoundContext<'_>) {
        if !self.is_local_player(ctx) || ctx.session.phase == Phase::Lobby {
            tracing::debug!(slot = self.slot, attacker, "Hit notice ignored");
            return;
        }
        tracing::debug!(slot = self.slot, attacker, lives_left, "Sliced");
        let name = ctx.identity.display_name(attacker);
        let remaining = ctx.session.others_remaining();
        if let Some(banner) = notices::hit_banner(&name, ctx.session.slot_of(attacker), remaining) {
            ctx.presentation.show_banner(&banner);
        }
    }

    /// The local player eliminated `victim`.
    pub fn notify_kill(&self, victim: PlayerId, score: u32, ctx: &mut RoundContext<'_>) {
        if !self.is_local_player(ctx) || ctx.session.phase == Phase::Lobby {
            tracing::debug!(slot = self.slot, victim, "Kill notice ignored");
            return;
        }
        tracing::debug!(slot = self.slot, victim, score, "Kill credited");
        ctx.stats.increment(Stat::PlayersKilled);
        let name = ctx.identity.display_name(victim);
        let remaining = ctx.session.others_remaining();
        if let Some(banner) = notices::kill_banner(&name, ctx.session.slot_of(victim), remaining) {
            ctx.presentation.show_banner(&banner);
        }
    }
}

impl RoundListener for PlayerCollider {
    fn on_round_start(&mut self, level: Level, _round: u32, ctx: &mut RoundContext<'_>) {
        if !self.is_local_player(ctx) {
            return;
        }
        if let Some(spawn) = ctx.levels.spawn_position(level, self.slot) {
            ctx.presentation.teleport_local_player(spawn);
        }
    }

    fn on_fighting_start(&mut self, _ctx: &mut RoundContext<'_>) {}

    fn on_round_end(&mut self, _ctx: &mut RoundContext<'_>) {}

    fn on_game_end(&mut self, winner: Option<Winner>, ctx: &mut RoundContext<'_>) {
        if !self.is_local_player(ctx) {
            return;
        }
        ctx.stats.increment(Stat::GamesPlayed);
        if let Some(winner) = winner {
            let won = winner.player == ctx.local;
            if won {
                ctx.stats.increment(Stat::GamesWon);
            }
            let name = ctx.identity.display_name(winner.player);
            let banner = notices::game_over_banner(&name, usize::from(winner.slot), won, &mut *ctx.rng);
            ctx.presentation.show_banner(&banner);
        }
        if let Some(spawn) = ctx.levels.spawn_position(Level::Lobby, self.slot) {
            ctx.presentation.teleport_local_player(spawn);
        }
    }
}
