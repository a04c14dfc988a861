use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smallvec::SmallVec;

use shuriken_core::authority::Authority;
use shuriken_core::host::Ownership;
use shuriken_core::net::messages::{CommitMsg, ObjectId};
use shuriken_core::player::PlayerId;
use shuriken_core::replica::{Replica, ReplicaError};
use shuriken_core::slots::{HitResult, SlotError, SlotIndex};
use shuriken_core::time::{Clock, Millis};

use crate::config::{ArenaConfig, MAX_SCORE_RANGE, ROUND_TIME_RANGE};
use crate::level::{Level, LevelCatalog, random_level};
use crate::phase::Phase;
use crate::powerups::{Pickup, ShurikenPowerUp};
use crate::procedure::{ArenaEnvelope, ArenaOutbox, Procedure};
use crate::session::{Session, Winner};

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    NotInLobby,
    NotEnoughPlayers { have: usize, need: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined(SlotIndex),
    /// The identity already holds this slot; nothing changed.
    AlreadyJoined(SlotIndex),
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left(SlotIndex),
    NotJoined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    Wounded { lives: u8 },
    Eliminated { attacker_score: u32 },
    Ignored(HitRejection),
}

/// Why a registered hit changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitRejection {
    NotFighting,
    UnknownAttacker,
    UnknownVictim,
    SelfHit,
    AttackerOut,
    VictimOut,
}

/// The session state machine.
///
/// Every participant holds one. Only the holder of the game logic authority
/// mutates it; everyone else applies the commits that holder publishes.
pub struct GameLogic {
    session: Replica<Session>,
    config: ArenaConfig,
    levels: Arc<LevelCatalog>,
    /// Objects that receive the round lifecycle broadcasts.
    listeners: SmallVec<[ObjectId; 16]>,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    next_pickup_id: u16,
}

impl GameLogic {
    pub fn new(config: ArenaConfig, levels: Arc<LevelCatalog>, clock: Arc<dyn Clock>, seed: u64) -> Self {
        let mut session = Session::new(&config);
        session
            .power_up_respawn_deadline
            .schedule(clock.now_ms(), config.power_up_respawn_ms);
        Self {
            session: Replica::new(ObjectId::GameLogic, session),
            config,
            levels,
            listeners: SmallVec::new(),
            clock,
            rng: StdRng::seed_from_u64(seed),
            next_pickup_id: 0,
        }
    }

    pub fn session(&self) -> &Session {
        self.session.get()
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn levels(&self) -> &LevelCatalog {
        &self.levels
    }

    /// Add an object to the lifecycle broadcast list. Registering twice is a no-op.
    pub fn register_listener(&mut self, object: ObjectId) {
        if !self.listeners.contains(&object) {
            self.listeners.push(object);
        }
    }

    pub fn listeners(&self) -> &[ObjectId] {
        &self.listeners
    }

    /// Whether the session changed since the last reconcile.
    pub fn take_reconcile(&mut self) -> bool {
        self.session.take_reconcile()
    }

    /// Overwrite the local replica with a commit from the authority.
    pub fn apply_commit(&mut self, msg: &CommitMsg) -> Result<(), ReplicaError> {
        self.session.apply(msg)
    }

    /// Run `f` against the writable session, then commit if it changed anything.
    fn transact<R>(
        &mut self,
        auth: &Authority,
        outbox: &mut ArenaOutbox,
        f: impl FnOnce(&mut Txn<'_>) -> R,
    ) -> Result<R, ReplicaError> {
        let now = self.clock.now_ms();
        let Some(session) = self.session.write(auth) else {
            return Err(ReplicaError::NotAuthority(ObjectId::GameLogic));
        };
        let mut txn = Txn {
            session,
            config: &self.config,
            levels: &self.levels,
            listeners: &self.listeners,
            rng: &mut self.rng,
            next_pickup_id: &mut self.next_pickup_id,
            outbox: &mut *outbox,
            now,
            dirty: false,
        };
        let result = f(&mut txn);
        let dirty = txn.dirty;
        if dirty {
            self.session.commit(auth, outbox)?;
        }
        Ok(result)
    }

    /// Advance deadlines: phase transitions, elimination confirmation and
    /// power-up respawns.
    pub fn tick(&mut self, auth: &Authority, outbox: &mut ArenaOutbox) -> Result<(), ReplicaError> {
        self.transact(auth, outbox, |txn| txn.tick())
    }

    pub fn start_game(&mut self, auth: &Authority, outbox: &mut ArenaOutbox) -> Result<StartOutcome, ReplicaError> {
        self.transact(auth, outbox, |txn| {
            if txn.session.phase != Phase::Lobby {
                return StartOutcome::NotInLobby;
            }
            let have = txn.session.slots.occupant_count();
            let need = txn.config.min_players;
            if have < need {
                tracing::debug!(have, need, "Start ignored, not enough players");
                return StartOutcome::NotEnoughPlayers { have, need };
            }
            txn.enter_round_starting();
            StartOutcome::Started
        })
    }

    pub fn request_join(
        &mut self,
        auth: &Authority,
        player: PlayerId,
        ownership: &dyn Ownership,
        outbox: &mut ArenaOutbox,
    ) -> Result<JoinOutcome, ReplicaError> {
        self.transact(auth, outbox, |txn| {
            let lives = txn.config.starting_lives;
            match txn.session.slots.add_occupant(player, lives) {
                Ok(slot) => {
                    let index = slot as u8;
                    ownership.request_transfer(ObjectId::Projectile(index), player);
                    ownership.request_transfer(ObjectId::Collider(index), player);
                    txn.dirty = true;
                    tracing::info!(player_id = player, slot, "Player joined");
                    JoinOutcome::Joined(slot)
                },
                Err(SlotError::AlreadyJoined(slot)) => {
                    tracing::error!(player_id = player, slot, "Duplicate join request");
                    JoinOutcome::AlreadyJoined(slot)
                },
                Err(SlotError::Full | SlotError::NotFound) => {
                    tracing::warn!(player_id = player, "Join rejected, slot table full");
                    JoinOutcome::Full
                },
            }
        })
    }

    pub fn request_leave(
        &mut self,
        auth: &Authority,
        player: PlayerId,
        ownership: &dyn Ownership,
        outbox: &mut ArenaOutbox,
    ) -> Result<LeaveOutcome, ReplicaError> {
        let holder = auth.holder();
        self.transact(auth, outbox, |txn| match txn.session.slots.remove_occupant(player) {
            Ok(slot) => {
                let index = slot as u8;
                ownership.request_transfer(ObjectId::Projectile(index), holder);
                ownership.request_transfer(ObjectId::Collider(index), holder);
                txn.dirty = true;
                tracing::info!(player_id = player, slot, "Player left");
                LeaveOutcome::Left(slot)
            },
            Err(_) => {
                tracing::error!(player_id = player, "Leave request from a player who is not joined");
                LeaveOutcome::NotJoined
            },
        })
    }

    /// Apply a hit reported by the attacker's projectile.
    pub fn register_hit(
        &mut self,
        auth: &Authority,
        attacker: PlayerId,
        victim: PlayerId,
        outbox: &mut ArenaOutbox,
    ) -> Result<HitOutcome, ReplicaError> {
        self.transact(auth, outbox, |txn| txn.register_hit(attacker, victim))
    }

    /// First contact wins; later claims on the same pickup return `false`.
    pub fn collect_power_up(
        &mut self,
        auth: &Authority,
        collector: PlayerId,
        pickup: u16,
        outbox: &mut ArenaOutbox,
    ) -> Result<bool, ReplicaError> {
        self.transact(auth, outbox, |txn| txn.collect_power_up(collector, pickup))
    }

    /// Adjust kills-to-win. Only in the lobby, only by the authority holder.
    pub fn modify_max_score(
        &mut self,
        auth: &Authority,
        requester: PlayerId,
        delta: i32,
        outbox: &mut ArenaOutbox,
    ) -> Result<Option<u32>, ReplicaError> {
        let holder = auth.holder();
        self.transact(auth, outbox, |txn| {
            if requester != holder || txn.session.phase != Phase::Lobby {
                tracing::debug!(requester, "Max score change ignored");
                return None;
            }
            let value = step(txn.session.max_score, delta, MAX_SCORE_RANGE);
            if value != txn.session.max_score {
                txn.session.max_score = value;
                txn.dirty = true;
            }
            Some(value)
        })
    }

    /// Adjust the displayed round clock. Same rules as [`GameLogic::modify_max_score`].
    pub fn modify_round_time_limit(
        &mut self,
        auth: &Authority,
        requester: PlayerId,
        delta: i32,
        outbox: &mut ArenaOutbox,
    ) -> Result<Option<u32>, ReplicaError> {
        let holder = auth.holder();
        self.transact(auth, outbox, |txn| {
            if requester != holder || txn.session.phase != Phase::Lobby {
                tracing::debug!(requester, "Round time change ignored");
                return None;
            }
            let value = step(txn.session.round_time_limit_secs, delta, ROUND_TIME_RANGE);
            if value != txn.session.round_time_limit_secs {
                txn.session.round_time_limit_secs = value;
                txn.dirty = true;
            }
            Some(value)
        })
    }

    /// Dispatch a procedure addressed to the game logic object.
    pub fn handle_rpc(
        &mut self,
        auth: &Authority,
        env: &ArenaEnvelope,
        ownership: &dyn Ownership,
        outbox: &mut ArenaOutbox,
    ) {
        let sender = env.sender;
        let result = match env.procedure {
            Procedure::StartGame => self.start_game(auth, outbox).map(|outcome| {
                tracing::debug!(player_id = sender, ?outcome, "Start requested");
            }),
            Procedure::RequestJoin => self
                .request_join(auth, sender, ownership, outbox)
                .map(|_| ()),
            Procedure::RequestLeave => self
                .request_leave(auth, sender, ownership, outbox)
                .map(|_| ()),
            Procedure::RegisterHit { victim } => self
                .register_hit(auth, sender, victim, outbox)
                .map(|outcome| {
                    tracing::debug!(attacker = sender, victim, ?outcome, "Hit registered");
                }),
            Procedure::CollectPowerUp { pickup } => self
                .collect_power_up(auth, sender, pickup, outbox)
                .map(|_| ()),
            Procedure::ModifyMaxScore { delta } => self
                .modify_max_score(auth, sender, delta, outbox)
                .map(|_| ()),
            Procedure::ModifyRoundTimeLimit { delta } => self
                .modify_round_time_limit(auth, sender, delta, outbox)
                .map(|_| ()),
            ref other => {
                tracing::warn!(player_id = sender, procedure = ?other, "Unexpected procedure for game logic");
                Ok(())
            },
        };
        if let Err(e) = result {
            tracing::error!(error = %e, "Game logic RPC failed");
        }
    }
}

/// Add `delta` to `value`, clamped to `range`.
fn step(value: u32, delta: i32, (lo, hi): (u32, u32)) -> u32 {
    let next = i64::from(value) + i64::from(delta);
    next.clamp(i64::from(lo), i64::from(hi)) as u32
}

/// One write pass over the session. Anything that changes replicated
/// fields sets `dirty`, and the caller commits once at the end.
struct Txn<'a> {
    session: &'a mut Session,
    config: &'a ArenaConfig,
    levels: &'a LevelCatalog,
    listeners: &'a [ObjectId],
    rng: &'a mut StdRng,
    next_pickup_id: &'a mut u16,
    outbox: &'a mut ArenaOutbox,
    now: Millis,
    dirty: bool,
}

impl Txn<'_> {
    fn tick(&mut self) {
        self.tick_power_ups();
        let due = self.session.next_phase_deadline.is_elapsed(self.now);
        match self.session.phase {
            Phase::RoundStarting if due => self.enter_fighting(),
            Phase::Fighting => self.tick_fighting(),
            Phase::RoundEnding if due => self.enter_round_starting(),
            Phase::GameEnding if due => self.enter_lobby(),
            _ => {},
        }
    }

    fn tick_fighting(&mut self) {
        let slots = &self.session.slots;
        if let Some(slot) = slots.leader_at_or_above(self.session.max_score) {
            self.enter_game_ending(slot);
            return;
        }
        let decided = slots.alive_count() <= 1 && slots.occupant_count() > 1;
        let deadline = self.session.next_phase_deadline;
        if !deadline.is_set() {
            if decided {
                self.session
                    .next_phase_deadline
                    .schedule(self.now, self.config.elimination_confirm_ms);
                tracing::debug!("One player standing, confirming elimination");
            }
            return;
        }
        if !deadline.is_elapsed(self.now) {
            return;
        }
        if decided {
            self.enter_round_ending();
        } else {
            self.session.next_phase_deadline.clear();
            tracing::debug!("Elimination no longer holds, round continues");
        }
    }

    fn tick_power_ups(&mut self) {
        if !self.session.power_up_respawn_deadline.is_elapsed(self.now) {
            return;
        }
        self.session.power_up_respawn_deadline.clear();
        let level = self.session.level;
        let markers = self.levels.power_up_markers(level);
        if markers.is_empty() {
            tracing::error!(?level, "No power-up spawn points, skipping spawn");
            return;
        }
        let position = markers[self.rng.random_range(0..markers.len())];
        let kind = ShurikenPowerUp::ALL[self.rng.random_range(0..ShurikenPowerUp::ALL.len())];
        let id = *self.next_pickup_id;
        *self.next_pickup_id = id.wrapping_add(1);
        self.session.pickups.push(Pickup { id, kind, position });
        self.dirty = true;
        tracing::debug!(pickup = id, ?kind, ?level, "Power-up spawned");
    }

    fn register_hit(&mut self, attacker: PlayerId, victim: PlayerId) -> HitOutcome {
        if self.session.phase != Phase::Fighting {
            return HitOutcome::Ignored(HitRejection::NotFighting);
        }
        if attacker == victim {
            return HitOutcome::Ignored(HitRejection::SelfHit);
        }
        let slots = &mut self.session.slots;
        let Some(attacker_slot) = slots.find_slot(attacker) else {
            return HitOutcome::Ignored(HitRejection::UnknownAttacker);
        };
        let Some(victim_slot) = slots.find_slot(victim) else {
            return HitOutcome::Ignored(HitRejection::UnknownVictim);
        };
        if slots.get(attacker_slot).is_none_or(|s| !s.is_alive()) {
            return HitOutcome::Ignored(HitRejection::AttackerOut);
        }
        match slots.hit(victim_slot) {
            HitResult::Wounded { lives } => {
                self.dirty = true;
                self.outbox.to_owner(
                    ObjectId::Collider(victim_slot as u8),
                    Procedure::NotifyHit {
                        attacker,
                        lives_left: lives,
                    },
                );
                HitOutcome::Wounded { lives }
            },
            HitResult::Eliminated => {
                let score = slots.credit_kill(attacker_slot).unwrap_or_default();
                self.dirty = true;
                self.outbox.to_owner(
                    ObjectId::Collider(victim_slot as u8),
                    Procedure::NotifyHit {
                        attacker,
                        lives_left: 0,
                    },
                );
                self.outbox.to_owner(
                    ObjectId::Collider(attacker_slot as u8),
                    Procedure::NotifyKill { victim, score },
                );
                tracing::info!(attacker, victim, score, "Player eliminated");
                HitOutcome::Eliminated {
                    attacker_score: score,
                }
            },
            HitResult::AlreadyOut => {
                tracing::error!(attacker, victim, "Hit registered against an eliminated player");
                HitOutcome::Ignored(HitRejection::VictimOut)
            },
            HitResult::Vacant => HitOutcome::Ignored(HitRejection::UnknownVictim),
        }
    }

    fn collect_power_up(&mut self, collector: PlayerId, pickup: u16) -> bool {
        if self.session.phase != Phase::Fighting {
            return false;
        }
        let Some(slot) = self.session.slot_of(collector) else {
            return false;
        };
        let Some(pos) = self.session.pickups.iter().position(|p| p.id == pickup) else {
            tracing::debug!(player_id = collector, pickup, "Power-up already taken");
            return false;
        };
        let taken = self.session.pickups.remove(pos);
        self.session
            .power_up_respawn_deadline
            .schedule(self.now, self.config.power_up_respawn_ms);
        self.outbox.broadcast(
            ObjectId::Projectile(slot as u8),
            Procedure::ActivatePowerUp { kind: taken.kind },
        );
        self.dirty = true;
        tracing::debug!(player_id = collector, pickup, kind = ?taken.kind, "Power-up collected");
        true
    }

    fn broadcast_lifecycle(&mut self, procedure: &Procedure) {
        for object in self.listeners {
            self.outbox.broadcast(*object, procedure.clone());
        }
    }

    /// Switch arenas. Pickups never carry over, and the spawn timer restarts.
    fn change_level(&mut self, level: Level) {
        self.session.level = level;
        self.session.pickups.clear();
        self.session
            .power_up_respawn_deadline
            .schedule(self.now, self.config.power_up_respawn_ms);
    }

    fn enter_lobby(&mut self) {
        let session = &mut *self.session;
        session.phase = Phase::Lobby;
        session.round = 0;
        session.slots.reset_lives(self.config.starting_lives);
        session.slots.reset_scores();
        session.next_phase_deadline.clear();
        self.dirty = true;
        tracing::info!("Returned to lobby");
    }

    fn enter_round_starting(&mut self) {
        let level = random_level(self.session.level, &mut *self.rng);
        self.change_level(level);
        self.session.phase = Phase::RoundStarting;
        self.session.round += 1;
        self.session.slots.reset_lives(self.config.starting_lives);
        self.session
            .next_phase_deadline
            .schedule(self.now, self.config.fighting_delay_ms);
        self.dirty = true;
        let round = self.session.round;
        self.broadcast_lifecycle(&Procedure::RoundStart { level, round });
        tracing::info!(round, ?level, "Round starting");
    }

    fn enter_fighting(&mut self) {
        self.session.phase = Phase::Fighting;
        self.session.next_phase_deadline.clear();
        self.dirty = true;
        self.broadcast_lifecycle(&Procedure::FightingStart);
        tracing::info!(round = self.session.round, "Fight");
    }

    fn enter_round_ending(&mut self) {
        let survivor = self.session.slots.last_alive();
        self.session.phase = Phase::RoundEnding;
        self.session.slots.reset_lives(self.config.starting_lives);
        self.session
            .next_phase_deadline
            .schedule(self.now, self.config.inter_round_delay_ms);
        self.dirty = true;
        self.broadcast_lifecycle(&Procedure::RoundEnd);
        tracing::info!(round = self.session.round, ?survivor, "Round over");
    }

    fn enter_game_ending(&mut self, slot: SlotIndex) {
        let winner = self.session.slots.get(slot).and_then(|s| {
            s.occupant.map(|player| Winner {
                player,
                slot: slot as u8,
                score: s.score,
            })
        });
        self.session.phase = Phase::GameEnding;
        self.change_level(Level::Lobby);
        self.session
            .next_phase_deadline
            .schedule(self.now, self.config.game_end_delay_ms);
        self.dirty = true;
        self.broadcast_lifecycle(&Procedure::GameEnd { winner });
        tracing::info!(?winner, "Game over");
    }
}
