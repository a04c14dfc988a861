use serde::{Deserialize, Serialize};

use shuriken_core::host::{IdentityResolver, Ownership};
use shuriken_core::net::messages::ObjectId;
use shuriken_core::player::{PlayerColor, PlayerId};
use shuriken_core::slots::SlotIndex;
use shuriken_core::time::Millis;

use crate::config::{ArenaConfig, ROUND_TIME_STEP};
use crate::phase::Phase;
use crate::procedure::{ArenaOutbox, Procedure};
use crate::session::Session;

/// One entry of the lobby's player strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIcon {
    pub slot: SlotIndex,
    /// `P1`, `P2`... for occupied slots, empty otherwise.
    pub label: String,
    pub color: Option<PlayerColor>,
}

/// Everything the lobby menu shows. Derived, never replicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyView {
    pub phase: Phase,
    pub game_master: String,
    pub icons: Vec<PlayerIcon>,
    pub joined: bool,
    pub can_start: bool,
    /// Only the game master may use the counter buttons.
    pub can_edit_settings: bool,
    pub kills_to_win: String,
    pub round_time: String,
    /// Seconds left on the start nudge, once enough players are in.
    pub countdown_secs: Option<u64>,
}

/// Lobby UI logic: turns gestures into requests and derives the menu view.
///
/// Holds no replicated state. The countdown is paced by the local clock,
/// shorter for the game master than for everyone else.
#[derive(Debug, Clone)]
pub struct LobbyMenu {
    min_players: usize,
    host_countdown_secs: u64,
    guest_countdown_secs: u64,
    countdown_started: Option<Millis>,
}

impl LobbyMenu {
    pub fn new(config: &ArenaConfig) -> Self {
        Self {
            min_players: config.min_players,
            host_countdown_secs: config.host_countdown_secs,
            guest_countdown_secs: config.guest_countdown_secs,
            countdown_started: None,
        }
    }

    pub fn start(&self, outbox: &mut ArenaOutbox) {
        outbox.to_owner(ObjectId::GameLogic, Procedure::StartGame);
    }

    pub fn join(&self, outbox: &mut ArenaOutbox) {
        outbox.to_owner(ObjectId::GameLogic, Procedure::RequestJoin);
    }

    pub fn leave(&self, outbox: &mut ArenaOutbox) {
        outbox.to_owner(ObjectId::GameLogic, Procedure::RequestLeave);
    }

    /// Kills-to-win plus or minus one per step.
    pub fn adjust_max_score(&self, steps: i32, outbox: &mut ArenaOutbox) {
        outbox.to_owner(ObjectId::GameLogic, Procedure::ModifyMaxScore { delta: steps });
    }

    /// Round clock plus or minus ten seconds per step.
    pub fn adjust_round_time(&self, steps: i32, outbox: &mut ArenaOutbox) {
        outbox.to_owner(
            ObjectId::GameLogic,
            Procedure::ModifyRoundTimeLimit {
                delta: steps.saturating_mul(ROUND_TIME_STEP),
            },
        );
    }

    /// Start the countdown when the lobby fills up, drop it when it empties.
    pub fn reconcile(&mut self, session: &Session, now: Millis) {
        let ready =
            session.phase == Phase::Lobby && session.slots.occupant_count() >= self.min_players;
        match (ready, self.countdown_started) {
            (true, None) => self.countdown_started = Some(now),
            (false, Some(_)) => self.countdown_started = None,
            _ => {},
        }
    }

    /// Forget the countdown; the next full lobby starts a fresh one.
    pub fn reset(&mut self) {
        self.countdown_started = None;
    }

    pub fn countdown(&self, now: Millis, is_game_master: bool) -> Option<u64> {
        let started = self.countdown_started?;
        let total = if is_game_master {
            self.host_countdown_secs
        } else {
            self.guest_countdown_secs
        };
        let elapsed = now.saturating_sub(started) / 1_000;
        Some(total.saturating_sub(elapsed))
    }

    pub fn view(
        &self,
        session: &Session,
        now: Millis,
        local: PlayerId,
        ownership: &dyn Ownership,
        identity: &dyn IdentityResolver,
    ) -> LobbyView {
        let master = ownership.owner_of(ObjectId::GameLogic);
        let is_game_master = master == Some(local);
        let game_master = match master {
            Some(id) => format!("Game Master: {}", identity.display_name(id)),
            None => "Game Master: ".to_string(),
        };
        let icons = session
            .slots
            .slots()
            .iter()
            .enumerate()
            .map(|(slot, s)| {
                if s.is_active() {
                    PlayerIcon {
                        slot,
                        label: format!("P{}", slot + 1),
                        color: Some(PlayerColor::for_slot(slot)),
                    }
                } else {
                    PlayerIcon {
                        slot,
                        label: String::new(),
                        color: None,
                    }
                }
            })
            .collect();
        let in_lobby = session.phase == Phase::Lobby;
        LobbyView {
            phase: session.phase,
            game_master,
            icons,
            joined: session.is_joined(local),
            can_start: in_lobby && session.slots.occupant_count() >= self.min_players,
            can_edit_settings: in_lobby && is_game_master,
            kills_to_win: format!("{} KILLS", session.max_score),
            round_time: format!("{} SEC", session.round_time_limit_secs),
            countdown_secs: self.countdown(now, is_game_master),
        }
    }
}
