use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use shuriken_core::authority::Authority;
use shuriken_core::host::{IdentityResolver, Ownership};
use shuriken_core::net::messages::{CommitMsg, ObjectId, RpcTarget};
use shuriken_core::net::protocol::{ProtocolError, decode_inbound};
use shuriken_core::player::PlayerId;
use shuriken_core::slots::SlotIndex;
use shuriken_core::time::{Clock, Millis};

use crate::collider::PlayerCollider;
use crate::config::ArenaConfig;
use crate::game_logic::GameLogic;
use crate::level::{Level, LevelCatalog};
use crate::listener::{RoundContext, dispatch_lifecycle};
use crate::lobby::{LobbyMenu, LobbyView};
use crate::notices::{self, SCOREBOARD_MS};
use crate::phase::Phase;
use crate::pose::{Pose, Vec3};
use crate::presentation::{Hud, Presentation};
use crate::procedure::{ArenaEnvelope, ArenaOutbound, ArenaOutbox, Procedure};
use crate::projectile::{Contact, ContactOutcome, GripOutcome, Projectile, ReleaseOutcome};
use crate::session::Session;
use crate::stats::{PlayerStats, Stat};
use crate::target::Target;

/// What the presentation was last told, so reconcile only pushes changes.
#[derive(Debug, Default)]
struct Shown {
    phase: Option<Phase>,
    level: Option<Level>,
    hud: Option<Hud>,
    lobby: Option<LobbyView>,
}

/// One player's view of the arena.
///
/// Owns a local copy of every networked object and routes inbound commits
/// and RPCs to them. Whichever participant holds the game logic object acts
/// as the authority; everyone else follows its commits.
pub struct Participant {
    local: PlayerId,
    config: ArenaConfig,
    clock: Arc<dyn Clock>,
    ownership: Arc<dyn Ownership>,
    identity: Arc<dyn IdentityResolver>,
    presentation: Box<dyn Presentation>,
    levels: Arc<LevelCatalog>,
    game: GameLogic,
    projectiles: Vec<Projectile>,
    colliders: Vec<PlayerCollider>,
    targets: Vec<Target>,
    lobby: LobbyMenu,
    stats: PlayerStats,
    rng: StdRng,
    outbox: ArenaOutbox,
    shown: Shown,
    fighting_since: Option<Millis>,
}

/// Host services a participant is built from.
pub struct ParticipantServices {
    pub clock: Arc<dyn Clock>,
    pub ownership: Arc<dyn Ownership>,
    pub identity: Arc<dyn IdentityResolver>,
    pub presentation: Box<dyn Presentation>,
}

impl Participant {
    pub fn new(
        config: ArenaConfig,
        levels: Arc<LevelCatalog>,
        services: ParticipantServices,
        seed: u64,
    ) -> Self {
        let ParticipantServices {
            clock,
            ownership,
            identity,
            presentation,
        } = services;
        let local = ownership.local_player();
        let capacity = config.slot_capacity;

        let mut game = GameLogic::new(config.clone(), Arc::clone(&levels), Arc::clone(&clock), seed);
        let projectiles: Vec<Projectile> = (0..capacity).map(Projectile::new).collect();
        let colliders: Vec<PlayerCollider> = (0..capacity).map(PlayerCollider::new).collect();
        for (projectile, collider) in projectiles.iter().zip(&colliders) {
            game.register_listener(projectile.object());
            game.register_listener(collider.object());
        }

        let markers = levels.target_markers(Level::Lobby).to_vec();
        let targets = (0..config.practice_targets)
            .map(|i| Target::new(i, markers.clone()))
            .collect();

        tracing::info!(player_id = local, capacity, "Participant created");

        Self {
            local,
            lobby: LobbyMenu::new(&config),
            config,
            clock,
            ownership,
            identity,
            presentation,
            levels,
            game,
            projectiles,
            colliders,
            targets,
            stats: PlayerStats::default(),
            // Offset so the local stream differs from the game logic's.
            rng: StdRng::seed_from_u64(seed ^ local),
            outbox: ArenaOutbox::new(local),
            shown: Shown::default(),
            fighting_since: None,
        }
    }

    pub fn local(&self) -> PlayerId {
        self.local
    }

    pub fn session(&self) -> &Session {
        self.game.session()
    }

    pub fn game(&self) -> &GameLogic {
        &self.game
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn projectile(&self, slot: SlotIndex) -> Option<&Projectile> {
        self.projectiles.get(slot)
    }

    pub fn collider(&self, slot: SlotIndex) -> Option<&PlayerCollider> {
        self.colliders.get(slot)
    }

    pub fn target(&self, index: usize) -> Option<&Target> {
        self.targets.get(index)
    }

    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    /// Seed the counters from whatever the host persisted.
    pub fn restore_stats(&mut self, stats: PlayerStats) {
        self.stats = stats;
    }

    pub fn is_authority(&self) -> bool {
        self.ownership.is_owner(ObjectId::GameLogic)
    }

    /// The local player's projectile, if they are seated.
    pub fn local_projectile(&self) -> Option<&Projectile> {
        self.projectiles.iter().find(|p| p.owner() == Some(self.local))
    }

    pub fn lobby_view(&self) -> LobbyView {
        self.lobby.view(
            self.game.session(),
            self.clock.now_ms(),
            self.local,
            self.ownership.as_ref(),
            self.identity.as_ref(),
        )
    }

    /// Seconds left on the round clock, counted from when fighting began
    /// locally. The clock is informational; rounds never end on it.
    pub fn round_time_remaining(&self) -> Option<u64> {
        let since = self.fighting_since?;
        let elapsed = self.clock.now_ms().saturating_sub(since) / 1_000;
        Some(u64::from(self.game.session().round_time_limit_secs).saturating_sub(elapsed))
    }

    /// Everything queued for the network since the last drain.
    pub fn drain_outbox(&mut self) -> Vec<ArenaOutbound> {
        self.outbox.drain().collect()
    }

    // Lobby gestures

    pub fn start_game(&mut self) {
        self.lobby.start(&mut self.outbox);
    }

    pub fn join(&mut self) {
        self.lobby.join(&mut self.outbox);
    }

    pub fn leave(&mut self) {
        self.lobby.leave(&mut self.outbox);
    }

    pub fn adjust_max_score(&mut self, steps: i32) {
        self.lobby.adjust_max_score(steps, &mut self.outbox);
    }

    pub fn adjust_round_time(&mut self, steps: i32) {
        self.lobby.adjust_round_time(steps, &mut self.outbox);
    }

    /// Advance one frame. `local_pose` is where the local player stands.
    pub fn tick(&mut self, local_pose: &Pose) {
        if let Some(auth) = Authority::claim(self.ownership.as_ref(), ObjectId::GameLogic)
            && let Err(e) = self.game.tick(&auth, &mut self.outbox)
        {
            tracing::error!(error = %e, "Game logic tick failed");
        }

        for projectile in &mut self.projectiles {
            if projectile.owner() != Some(self.local) || !self.ownership.is_owner(projectile.object()) {
                continue;
            }
            if let Some(reason) = projectile.tick(local_pose, &self.config) {
                tracing::debug!(slot = projectile.slot(), ?reason, "Projectile recalled");
            }
        }
        for collider in &mut self.colliders {
            if collider.occupant() == Some(self.local) {
                collider.follow(local_pose);
            }
        }

        self.reconcile();
    }

    /// Feed one inbound message, already decoded.
    pub fn receive(&mut self, msg: ArenaOutbound) {
        match msg {
            ArenaOutbound::Commit(commit) => self.apply_commit(&commit),
            ArenaOutbound::Rpc(env) => self.dispatch(&env),
        }
        self.reconcile();
    }

    /// Feed one inbound message straight off the wire.
    pub fn receive_bytes(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        let msg = decode_inbound::<Procedure>(data)?;
        self.receive(msg);
        Ok(())
    }

    /// The host reports that `player` left the instance.
    pub fn player_left(&mut self, player: PlayerId) {
        let Some(auth) = Authority::claim(self.ownership.as_ref(), ObjectId::GameLogic) else {
            return;
        };
        match self
            .game
            .request_leave(&auth, player, self.ownership.as_ref(), &mut self.outbox)
        {
            Ok(outcome) => tracing::info!(player_id = player, ?outcome, "Player left the instance"),
            Err(e) => tracing::error!(error = %e, player_id = player, "Departure failed"),
        }
        self.reconcile();
    }

    // Physics events for the local player's projectile

    pub fn grip(&mut self, slot: SlotIndex, owner_pose: Option<&Pose>) -> Option<GripOutcome> {
        let projectile = self.projectiles.get_mut(slot)?;
        Some(projectile.grip(self.local, owner_pose, &self.config))
    }

    pub fn release(&mut self, slot: SlotIndex, velocity: Vec3, forward: Vec3) -> Option<ReleaseOutcome> {
        let projectile = self.projectiles.get_mut(slot)?;
        Some(projectile.release(self.local, velocity, forward, &self.config))
    }

    /// Mirror the physics body of a projectile.
    pub fn set_body(&mut self, slot: SlotIndex, position: Vec3, velocity: Vec3) {
        if let Some(projectile) = self.projectiles.get_mut(slot) {
            projectile.set_body(position, velocity);
        }
    }

    /// The projectile in `slot` touched something.
    pub fn contact(&mut self, slot: SlotIndex, contact: Contact, local_pose: &Pose) -> ContactOutcome {
        let Some(projectile) = self.projectiles.get_mut(slot) else {
            return ContactOutcome::Ignored;
        };
        if !self.ownership.is_owner(projectile.object()) {
            return ContactOutcome::Ignored;
        }
        let outcome = projectile.contact(
            contact,
            self.game.session(),
            local_pose,
            &self.config,
            &mut self.outbox,
        );
        match outcome {
            ContactOutcome::HitReported { victim, explosion } => {
                tracing::debug!(slot, victim, "Hit reported");
                self.stats.increment(Stat::PlayersHit);
                if let Some((position, radius)) = explosion {
                    self.presentation.play_explosion(position, radius);
                }
            },
            ContactOutcome::TargetStruck { .. } => self.stats.increment(Stat::TargetsHit),
            _ => {},
        }
        outcome
    }

    fn apply_commit(&mut self, commit: &CommitMsg) {
        if commit.sender == self.local || self.ownership.is_owner(commit.object) {
            return;
        }
        let owner = self.ownership.owner_of(commit.object);
        if owner != Some(commit.sender) {
            tracing::debug!(
                object = ?commit.object,
                sender = commit.sender,
                ?owner,
                "Commit from a participant that does not own the object"
            );
            return;
        }
        let result = match commit.object {
            ObjectId::GameLogic => self.game.apply_commit(commit),
            ObjectId::Target(index) => match self.targets.get_mut(usize::from(index)) {
                Some(target) => target.apply_commit(commit),
                None => {
                    tracing::warn!(target_index = index, "Commit for unknown target");
                    return;
                },
            },
            other => {
                tracing::warn!(object = ?other, "Commit for an object without state");
                return;
            },
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, sender = commit.sender, "Rejected commit");
        }
    }

    fn dispatch(&mut self, env: &ArenaEnvelope) {
        if env.target == RpcTarget::Owner && !self.ownership.is_owner(env.object) {
            tracing::trace!(object = ?env.object, "Owner RPC for an object held elsewhere");
            return;
        }
        if env.procedure.is_authority_only() {
            let authority = self.ownership.owner_of(ObjectId::GameLogic);
            if authority != Some(env.sender) {
                tracing::debug!(
                    sender = env.sender,
                    ?authority,
                    procedure = ?env.procedure,
                    "Authority-only procedure from another participant"
                );
                return;
            }
        }
        self.track_round_clock(&env.procedure);
        match env.object {
            ObjectId::GameLogic => {
                let Some(auth) = Authority::claim(self.ownership.as_ref(), ObjectId::GameLogic) else {
                    return;
                };
                self.game
                    .handle_rpc(&auth, env, self.ownership.as_ref(), &mut self.outbox);
            },
            ObjectId::Projectile(slot) => self.dispatch_projectile(usize::from(slot), env),
            ObjectId::Collider(slot) => self.dispatch_collider(usize::from(slot), env),
            ObjectId::Target(index) => self.dispatch_target(index, env),
        }
    }

    fn track_round_clock(&mut self, procedure: &Procedure) {
        match procedure {
            Procedure::FightingStart => {
                let now = self.clock.now_ms();
                self.fighting_since.get_or_insert(now);
            },
            Procedure::RoundStart { .. } | Procedure::RoundEnd | Procedure::GameEnd { .. } => {
                self.fighting_since = None;
            },
            _ => {},
        }
        if matches!(procedure, Procedure::GameEnd { .. }) {
            self.lobby.reset();
        }
    }

    fn dispatch_projectile(&mut self, slot: SlotIndex, env: &ArenaEnvelope) {
        let Some(projectile) = self.projectiles.get_mut(slot) else {
            tracing::warn!(slot, "RPC for unknown projectile");
            return;
        };
        let is_owner = self.ownership.is_owner(projectile.object());
        let mut ctx = RoundContext {
            local: self.local,
            is_owner,
            session: self.game.session(),
            config: &self.config,
            levels: &self.levels,
            identity: self.identity.as_ref(),
            presentation: self.presentation.as_mut(),
            stats: &mut self.stats,
            rng: &mut self.rng,
        };
        if dispatch_lifecycle(&mut *projectile, &env.procedure, &mut ctx) {
            return;
        }
        match env.procedure {
            Procedure::ActivatePowerUp { kind } => {
                if ctx.session.phase != Phase::Fighting {
                    tracing::debug!(slot, ?kind, phase = ?ctx.session.phase, "Power-up outside a round ignored");
                    return;
                }
                projectile.activate_power_up(kind);
                if is_owner && projectile.owner() == Some(self.local) {
                    ctx.stats.increment(Stat::PowerUpsCollected);
                    ctx.presentation
                        .show_banner(&notices::power_up_banner(kind, projectile.power_ups()));
                    ctx.presentation.set_locomotion(&projectile.effects().locomotion);
                }
            },
            ref other => {
                tracing::warn!(slot, procedure = ?other, "Unexpected procedure for projectile");
            },
        }
    }

    fn dispatch_collider(&mut self, slot: SlotIndex, env: &ArenaEnvelope) {
        let Some(collider) = self.colliders.get_mut(slot) else {
            tracing::warn!(slot, "RPC for unknown collider");
            return;
        };
        let mut ctx = RoundContext {
            local: self.local,
            is_owner: self.ownership.is_owner(collider.object()),
            session: self.game.session(),
            config: &self.config,
            levels: &self.levels,
            identity: self.identity.as_ref(),
            presentation: self.presentation.as_mut(),
            stats: &mut self.stats,
            rng: &mut self.rng,
        };
        if dispatch_lifecycle(&mut *collider, &env.procedure, &mut ctx) {
            return;
        }
        match env.procedure {
            Procedure::NotifyHit { attacker, lives_left } => {
                collider.notify_hit(attacker, lives_left, &mut ctx);
            },
            Procedure::NotifyKill { victim, score } => collider.notify_kill(victim, score, &mut ctx),
            ref other => {
                tracing::warn!(slot, procedure = ?other, "Unexpected procedure for collider");
            },
        }
    }

    fn dispatch_target(&mut self, index: u8, env: &ArenaEnvelope) {
        if env.procedure != Procedure::TargetHit {
            tracing::warn!(target_index = index, procedure = ?env.procedure, "Unexpected procedure for target");
            return;
        }
        let Some(target) = self.targets.get_mut(usize::from(index)) else {
            tracing::warn!(target_index = index, "RPC for unknown target");
            return;
        };
        let Some(auth) = Authority::claim(self.ownership.as_ref(), target.object()) else {
            return;
        };
        if let Err(e) = target.hit(&auth, &mut self.rng, &mut self.outbox) {
            tracing::error!(error = %e, target_index = index, "Target hit failed");
        }
    }

    /// Bring every local object and the presentation in line with the
    /// replicated state. Safe to run any number of times.
    fn reconcile(&mut self) {
        let now = self.clock.now_ms();
        if self.game.take_reconcile() {
            self.reconcile_session(now);
        }
        for target in &mut self.targets {
            if target.take_reconcile() {
                tracing::trace!(object = ?target.object(), position = ?target.position(), "Target moved");
            }
        }
        self.refresh_views(now);
    }

    fn reconcile_session(&mut self, now: Millis) {
        let session = self.game.session();

        for projectile in &mut self.projectiles {
            let slot = session.slots.get(projectile.slot());
            let occupant = slot.and_then(|s| s.occupant);
            if projectile.bind_owner(occupant) && occupant == Some(self.local) {
                self.presentation.set_locomotion(&projectile.effects().locomotion);
            }
            projectile.set_local_score(slot.map_or(0, |s| s.score));
        }
        for collider in &mut self.colliders {
            let occupant = session.slots.occupant(collider.slot());
            if collider.bind(occupant) {
                tracing::debug!(slot = collider.slot(), ?occupant, "Collider rebound");
            }
        }

        if self.shown.phase != Some(session.phase) {
            tracing::debug!(from = ?self.shown.phase, to = ?session.phase, "Phase changed");
            self.presentation.set_phase(session.phase);
            if session.phase == Phase::RoundEnding {
                let lines = notices::scoreboard(session, self.identity.as_ref());
                self.presentation.show_scoreboard(&lines, SCOREBOARD_MS);
            }
            self.shown.phase = Some(session.phase);
        }
        if self.shown.level != Some(session.level) {
            self.presentation.show_level(session.level);
            self.shown.level = Some(session.level);
        }

        self.lobby.reconcile(session, now);
    }

    fn refresh_views(&mut self, now: Millis) {
        let session = self.game.session();
        let hud = self
            .projectiles
            .iter()
            .find(|p| p.owner() == Some(self.local))
            .and_then(|p| notices::hud(session, self.local, p.power_ups()));
        if hud != self.shown.hud {
            if let Some(hud) = &hud {
                self.presentation.set_hud(hud);
            }
            self.shown.hud = hud;
        }

        let view = self.lobby.view(
            session,
            now,
            self.local,
            self.ownership.as_ref(),
            self.identity.as_ref(),
        );
        if self.shown.lobby.as_ref() != Some(&view) {
            self.presentation.set_lobby(&view);
            self.shown.lobby = Some(view);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{PresentationEvent, RecordingPresentation};
    use crate::powerups::ShurikenPowerUp;
    use shuriken_core::net::protocol::encode_state;
    use shuriken_core::test_helpers::{TestIdentity, TestOwnership, make_players};
    use shuriken_core::time::ManualClock;

    const HOST: PlayerId = 1;
    const GUEST: PlayerId = 2;

    fn participant(
        local: PlayerId,
        table: &TestOwnership,
        clock: &ManualClock,
    ) -> (Participant, RecordingPresentation) {
        let recorder = RecordingPresentation::new();
        let services = ParticipantServices {
            clock: Arc::new(clock.clone()),
            ownership: Arc::new(table.view(local)),
            identity: Arc::new(TestIdentity::new(&make_players(4))),
            presentation: Box::new(recorder.clone()),
        };
        let p = Participant::new(
            ArenaConfig::default(),
            Arc::new(LevelCatalog::generated()),
            services,
            7,
        );
        (p, recorder)
    }

    /// Deliver everything queued until nobody has anything left to send.
    fn pump(peers: &mut [&mut Participant]) {
        for _ in 0..16 {
            let outgoing: Vec<ArenaOutbound> = peers.iter_mut().flat_map(|p| p.drain_outbox()).collect();
            if outgoing.is_empty() {
                return;
            }
            for msg in outgoing {
                for peer in peers.iter_mut() {
                    peer.receive(msg.clone());
                }
            }
        }
    }

    fn commit_from(sender: PlayerId, session: &Session) -> ArenaOutbound {
        ArenaOutbound::Commit(CommitMsg {
            object: ObjectId::GameLogic,
            sender,
            payload: encode_state(session).unwrap(),
        })
    }

    fn rpc_from(sender: PlayerId, object: ObjectId, procedure: Procedure) -> ArenaOutbound {
        ArenaOutbound::Rpc(ArenaEnvelope {
            object,
            target: RpcTarget::All,
            sender,
            procedure,
        })
    }

    fn table() -> TestOwnership {
        let table = TestOwnership::new(HOST);
        table.assign(ObjectId::GameLogic, HOST);
        table
    }

    #[test]
    fn authority_handles_its_own_join() {
        let table = table();
        let clock = ManualClock::new(0);
        let (mut host, recorder) = participant(HOST, &table, &clock);
        host.join();
        for msg in host.drain_outbox() {
            host.receive(msg);
        }
        assert!(host.session().is_joined(HOST));
        assert_eq!(host.local_projectile().map(|p| p.slot()), Some(0));
        assert_eq!(host.collider(0).and_then(|c| c.occupant()), Some(HOST));
        assert_eq!(recorder.last_hud().map(|h| h.score), Some("SCORE: 0/10".to_string()));
    }

    #[test]
    fn own_commit_echo_is_ignored() {
        let table = table();
        let clock = ManualClock::new(0);
        let (mut host, _) = participant(HOST, &table, &clock);
        host.join();
        let outbound = host.drain_outbox();
        for msg in outbound {
            host.receive(msg);
        }
        let commits: Vec<_> = host
            .drain_outbox()
            .into_iter()
            .filter(|m| matches!(m, ArenaOutbound::Commit(_)))
            .collect();
        assert!(!commits.is_empty());
        // Replaying our own commit must not disturb state.
        let before = host.session().clone();
        for msg in commits {
            host.receive(msg);
        }
        assert_eq!(host.session().slots, before.slots);
    }

    #[test]
    fn owner_rpcs_for_foreign_objects_are_dropped() {
        let table = table();
        let clock = ManualClock::new(0);
        let (mut guest, _) = participant(GUEST, &table, &clock);
        guest.receive(ArenaOutbound::Rpc(ArenaEnvelope {
            object: ObjectId::GameLogic,
            target: RpcTarget::Owner,
            sender: GUEST,
            procedure: Procedure::RequestJoin,
        }));
        assert!(!guest.session().is_joined(GUEST));
        assert!(guest.drain_outbox().is_empty());
    }

    #[test]
    fn guest_follows_authority_commits() {
        let table = table();
        let clock = ManualClock::new(0);
        let (mut host, _) = participant(HOST, &table, &clock);
        let (mut guest, recorder) = participant(GUEST, &table, &clock);
        guest.join();
        for msg in guest.drain_outbox() {
            host.receive(msg);
        }
        for msg in host.drain_outbox() {
            guest.receive(msg);
        }
        assert!(guest.session().is_joined(GUEST));
        assert_eq!(guest.local_projectile().map(|p| p.slot()), Some(0));
        assert!(recorder.events().contains(&PresentationEvent::Phase(Phase::Lobby)));
        assert!(guest.lobby_view().joined);
        assert!(!guest.is_authority());
    }

    #[test]
    fn round_clock_runs_from_fighting_start() {
        let table = table();
        let clock = ManualClock::new(0);
        let (mut p, _) = participant(HOST, &table, &clock);
        assert_eq!(p.round_time_remaining(), None);
        p.receive(ArenaOutbound::Rpc(ArenaEnvelope {
            object: ObjectId::Projectile(0),
            target: RpcTarget::All,
            sender: HOST,
            procedure: Procedure::FightingStart,
        }));
        clock.advance(30_500);
        assert_eq!(p.round_time_remaining(), Some(90));
        p.receive(ArenaOutbound::Rpc(ArenaEnvelope {
            object: ObjectId::Collider(0),
            target: RpcTarget::All,
            sender: HOST,
            procedure: Procedure::RoundEnd,
        }));
        assert_eq!(p.round_time_remaining(), None);
    }

    #[test]
    fn authority_ignores_session_commits_from_guests() {
        let table = table();
        let clock = ManualClock::new(0);
        let (mut host, _) = participant(HOST, &table, &clock);
        host.join();
        pump(&mut [&mut host]);
        assert!(host.session().is_joined(HOST));

        host.receive(commit_from(GUEST, &Session::new(&ArenaConfig::default())));
        assert!(host.session().is_joined(HOST));
    }

    #[test]
    fn guest_commit_does_not_stall_round_start() {
        let table = table();
        let clock = ManualClock::new(0);
        let (mut host, _) = participant(HOST, &table, &clock);
        let (mut guest, _) = participant(GUEST, &table, &clock);
        host.join();
        guest.join();
        pump(&mut [&mut host, &mut guest]);
        host.start_game();
        pump(&mut [&mut host, &mut guest]);
        assert_eq!(host.session().phase, Phase::RoundStarting);

        // Same state, but without the authority's pending deadline.
        let echoed = host.session().clone();
        host.receive(commit_from(GUEST, &echoed));

        clock.advance(host.config().fighting_delay_ms + 100);
        host.tick(&Pose::default());
        assert_eq!(host.session().phase, Phase::Fighting);
    }

    #[test]
    fn guest_ignores_commits_from_non_owners() {
        let table = table();
        let clock = ManualClock::new(0);
        let (mut guest, _) = participant(GUEST, &table, &clock);
        let mut foreign = Session::new(&ArenaConfig::default());
        foreign.slots.add_occupant(3, 3).unwrap();
        guest.receive(commit_from(3, &foreign));
        assert!(!guest.session().is_joined(3));

        guest.receive(commit_from(HOST, &foreign));
        assert!(guest.session().is_joined(3));
    }

    #[test]
    fn power_ups_outside_fighting_are_ignored() {
        let table = table();
        let clock = ManualClock::new(0);
        let (mut host, _) = participant(HOST, &table, &clock);
        host.join();
        pump(&mut [&mut host]);
        assert_eq!(host.session().phase, Phase::Lobby);

        let activate = Procedure::ActivatePowerUp {
            kind: ShurikenPowerUp::Embiggen,
        };
        host.receive(rpc_from(GUEST, ObjectId::Projectile(0), activate.clone()));
        host.receive(rpc_from(HOST, ObjectId::Projectile(0), activate));
        assert!(host.projectile(0).is_some_and(|p| p.power_ups().is_empty()));
    }

    #[test]
    fn lifecycle_from_non_authority_is_ignored() {
        let table = table();
        let clock = ManualClock::new(0);
        let (mut guest, recorder) = participant(GUEST, &table, &clock);
        guest.receive(rpc_from(GUEST, ObjectId::Collider(0), Procedure::FightingStart));
        guest.receive(rpc_from(
            3,
            ObjectId::Collider(0),
            Procedure::NotifyKill { victim: HOST, score: 4 },
        ));
        assert_eq!(guest.round_time_remaining(), None);
        assert!(recorder.banners().is_empty());

        guest.receive(rpc_from(HOST, ObjectId::Collider(0), Procedure::FightingStart));
        assert!(guest.round_time_remaining().is_some());
    }

    #[test]
    fn undecodable_bytes_leave_the_authority_untouched() {
        let table = table();
        let clock = ManualClock::new(0);
        let (mut host, _) = participant(HOST, &table, &clock);
        host.join();
        pump(&mut [&mut host]);
        let before = host.session().clone();

        assert!(host.receive_bytes(&[]).is_err());
        assert!(host.receive_bytes(&[0x7f, 1, 2]).is_err());
        assert!(host.receive_bytes(&[0x01, 0xc1]).is_err());
        assert_eq!(host.session().slots, before.slots);
        assert_eq!(host.session().phase, before.phase);
        assert!(host.drain_outbox().is_empty());
    }
}
