use std::sync::{Arc, Mutex, MutexGuard};

use shuriken_arena::config::ArenaConfig;
use shuriken_arena::level::LevelCatalog;
use shuriken_arena::lobby::LobbyView;
use shuriken_arena::phase::Phase;
use shuriken_arena::pose::{Pose, Vec3};
use shuriken_arena::projectile::Contact;
use shuriken_arena::powerups::Locomotion;
use shuriken_arena::presentation::{Banner, Hud, Presentation, ScoreLine};
use shuriken_arena::procedure::ArenaOutbound;
use shuriken_arena::{Participant, ParticipantServices};
use shuriken_core::host::{IdentityResolver, Ownership};
use shuriken_core::net::messages::{ObjectId, RpcTarget};
use shuriken_core::net::protocol::encode_outbound;
use shuriken_core::player::PlayerId;
use shuriken_core::test_helpers::{TestIdentity, TestOwnership, make_players};
use shuriken_core::time::{Clock, ManualClock, Millis};

/// Player 1 hosts the instance and owns the game logic.
pub const HOST: PlayerId = 1;

/// Frame length used by [`Arena::run_for`].
pub const FRAME_MS: Millis = 100;

#[derive(Debug, Default)]
pub struct ScreenLog {
    pub phases: Vec<Phase>,
    pub banners: Vec<Banner>,
    pub hud: Option<Hud>,
    pub lobby: Option<LobbyView>,
    pub scoreboards: usize,
    pub teleports: Vec<Vec3>,
    pub locomotion: Option<Locomotion>,
    pub explosions: usize,
}

/// Presentation that keeps what it was shown. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct Screen(Arc<Mutex<ScreenLog>>);

impl Screen {
    pub fn log(&self) -> MutexGuard<'_, ScreenLog> {
        self.0.lock().unwrap()
    }

    pub fn banner_tops(&self) -> Vec<String> {
        self.log().banners.iter().map(|b| b.top.clone()).collect()
    }
}

impl Presentation for Screen {
    fn set_phase(&mut self, phase: Phase) {
        self.log().phases.push(phase);
    }

    fn set_hud(&mut self, hud: &Hud) {
        self.log().hud = Some(hud.clone());
    }

    fn show_banner(&mut self, banner: &Banner) {
        self.log().banners.push(banner.clone());
    }

    fn show_scoreboard(&mut self, _lines: &[ScoreLine], _duration_ms: Millis) {
        self.log().scoreboards += 1;
    }

    fn set_lobby(&mut self, view: &LobbyView) {
        self.log().lobby = Some(view.clone());
    }

    fn teleport_local_player(&mut self, position: Vec3) {
        self.log().teleports.push(position);
    }

    fn set_locomotion(&mut self, locomotion: &Locomotion) {
        self.log().locomotion = Some(*locomotion);
    }

    fn play_explosion(&mut self, _position: Vec3, _radius: f32) {
        self.log().explosions += 1;
    }
}

pub struct Peer {
    pub participant: Participant,
    pub screen: Screen,
    pub pose: Pose,
}

/// A whole instance in memory. Every message goes through the wire codec,
/// broadcasts loop back to their sender, and owner RPCs reach whoever holds
/// the object at delivery time.
pub struct Arena {
    pub clock: ManualClock,
    pub table: TestOwnership,
    pub peers: Vec<Peer>,
}

impl Arena {
    pub fn new(players: usize) -> Self {
        Self::with_config(players, ArenaConfig::default())
    }

    pub fn with_config(players: usize, config: ArenaConfig) -> Self {
        let clock = ManualClock::new(1_000);
        let table = TestOwnership::new(HOST);
        table.assign(ObjectId::GameLogic, HOST);
        for slot in 0..config.slot_capacity as u8 {
            table.assign(ObjectId::Projectile(slot), HOST);
            table.assign(ObjectId::Collider(slot), HOST);
        }
        for index in 0..config.practice_targets {
            table.assign(ObjectId::Target(index), HOST);
        }
        let roster = make_players(players);
        let identity: Arc<dyn IdentityResolver> = Arc::new(TestIdentity::new(&roster));
        let levels = Arc::new(LevelCatalog::generated());
        let peers = roster
            .iter()
            .map(|player| {
                let screen = Screen::default();
                let services = ParticipantServices {
                    clock: Arc::new(clock.clone()),
                    ownership: Arc::new(table.view(player.id)),
                    identity: Arc::clone(&identity),
                    presentation: Box::new(screen.clone()),
                };
                Peer {
                    participant: Participant::new(config.clone(), Arc::clone(&levels), services, 99),
                    screen,
                    pose: Pose::default(),
                }
            })
            .collect();
        Self {
            clock,
            table,
            peers,
        }
    }

    pub fn peer(&self, player: PlayerId) -> &Peer {
        self.peers
            .iter()
            .find(|p| p.participant.local() == player)
            .expect("no such peer")
    }

    pub fn peer_mut(&mut self, player: PlayerId) -> &mut Peer {
        self.peers
            .iter_mut()
            .find(|p| p.participant.local() == player)
            .expect("no such peer")
    }

    /// Deliver queued messages until every outbox is empty.
    pub fn pump(&mut self) {
        for _ in 0..64 {
            let mut queued = Vec::new();
            for peer in &mut self.peers {
                queued.extend(peer.participant.drain_outbox());
            }
            if queued.is_empty() {
                return;
            }
            for msg in queued {
                self.deliver(&msg);
            }
        }
        panic!("network did not settle");
    }

    fn deliver(&mut self, msg: &ArenaOutbound) {
        let bytes = encode_outbound(msg).unwrap();
        let owner_only = match msg {
            ArenaOutbound::Rpc(env) if env.target == RpcTarget::Owner => self.table.owner_of(env.object),
            _ => None,
        };
        let is_owner_rpc = matches!(msg, ArenaOutbound::Rpc(env) if env.target == RpcTarget::Owner);
        for peer in &mut self.peers {
            if is_owner_rpc && owner_only != Some(peer.participant.local()) {
                continue;
            }
            peer.participant.receive_bytes(&bytes).unwrap();
        }
    }

    /// One frame on every peer, then settle the network.
    pub fn frame(&mut self) {
        for peer in &mut self.peers {
            peer.participant.tick(&peer.pose);
        }
        self.pump();
    }

    pub fn run_for(&mut self, ms: Millis) {
        let mut left = ms;
        while left > 0 {
            let step = left.min(FRAME_MS);
            self.clock.advance(step);
            self.frame();
            left -= step;
        }
    }

    pub fn now(&self) -> Millis {
        self.clock.now_ms()
    }

    pub fn join(&mut self, player: PlayerId) {
        self.peer_mut(player).participant.join();
        self.pump();
        self.frame();
    }

    pub fn start(&mut self, player: PlayerId) {
        self.peer_mut(player).participant.start_game();
        self.pump();
    }

    pub fn phase(&self) -> Phase {
        self.peer(HOST).participant.session().phase
    }

    /// Grip, throw and land a hit on `victim` with `attacker`'s projectile.
    pub fn throw_at(&mut self, attacker: PlayerId, victim: PlayerId) {
        let victim_slot = self.peer(HOST).participant.session().slot_of(victim).unwrap();
        let peer = self.peer_mut(attacker);
        let slot = peer.participant.local_projectile().unwrap().slot();
        let pose = peer.pose;
        peer.participant.grip(slot, None);
        peer.participant
            .release(slot, Vec3::new(0.0, 0.0, 6.0), pose.forward);
        peer.participant.contact(
            slot,
            Contact::Collider(victim_slot),
            &pose,
        );
        self.pump();
    }

    /// Every peer agrees with the host on the replicated session.
    pub fn assert_converged(&self) {
        let host = self.peer(HOST).participant.session();
        for peer in &self.peers {
            let s = peer.participant.session();
            assert_eq!(s.phase, host.phase, "phase on {}", peer.participant.local());
            assert_eq!(s.round, host.round);
            assert_eq!(s.level, host.level);
            assert_eq!(s.max_score, host.max_score);
            assert_eq!(s.round_time_limit_secs, host.round_time_limit_secs);
            assert_eq!(s.slots, host.slots);
            assert_eq!(s.pickups, host.pickups);
        }
    }
}
