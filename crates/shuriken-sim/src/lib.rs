pub mod bot;
pub mod config;
pub mod peer;
pub mod registry;
pub mod relay;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use shuriken_arena::level::LevelCatalog;
use shuriken_arena::phase::Phase;
use shuriken_arena::{Participant, ParticipantServices};
use shuriken_core::net::messages::ObjectId;
use shuriken_core::player::PlayerId;
use shuriken_core::time::{Clock, ManualClock, Millis};

use bot::{Bot, bot_pose};
use config::SimConfig;
use peer::{LogPresentation, PeerSummary, SimPeer, TickReport, run_peer};
use registry::{OwnershipRegistry, Roster};
use relay::{InFlight, PeerEvent, Relay};

/// Upper bound on yields while waiting for the fabric to drain.
const MAX_SETTLE_SPINS: usize = 100_000;

/// The player who hosts the instance and starts out owning everything.
pub const HOST: PlayerId = 1;

/// How a match went.
#[derive(Debug, Clone)]
pub struct MatchReport {
    pub rounds: u32,
    /// Top scorer when the game ended.
    pub winner: Option<(PlayerId, u32)>,
    pub elapsed_ms: Millis,
    pub timed_out: bool,
    pub dropped: Option<PlayerId>,
    pub peers: Vec<PeerSummary>,
}

impl MatchReport {
    /// Every peer ended with the same seating, lives and scores.
    pub fn converged(&self) -> bool {
        self.peers.windows(2).all(|w| {
            w[0].slots == w[1].slots && w[0].phase == w[1].phase && w[0].round == w[1].round
        })
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "rounds: {}  elapsed: {}s  timed out: {}",
            self.rounds,
            self.elapsed_ms / 1_000,
            self.timed_out
        )];
        match self.winner {
            Some((player, score)) => lines.push(format!("winner: Bot {player} with {score}")),
            None => lines.push("winner: none".to_string()),
        }
        for peer in &self.peers {
            lines.push(format!("-- Bot {}", peer.player));
            lines.extend(peer.stats.lines().into_iter().map(|l| format!("   {l}")));
        }
        lines
    }
}

/// Hand every object to the host before anyone joins.
fn seed_ownership(registry: &OwnershipRegistry, config: &SimConfig) {
    registry.assign(ObjectId::GameLogic, HOST);
    for slot in 0..config.arena.slot_capacity {
        let slot = slot as u8;
        registry.assign(ObjectId::Projectile(slot), HOST);
        registry.assign(ObjectId::Collider(slot), HOST);
    }
    for index in 0..config.arena.practice_targets {
        registry.assign(ObjectId::Target(index), HOST);
    }
}

async fn settle(in_flight: &InFlight) {
    for _ in 0..MAX_SETTLE_SPINS {
        if in_flight.is_idle() {
            return;
        }
        tokio::task::yield_now().await;
    }
    tracing::warn!(in_flight = in_flight.count(), "Fabric did not drain");
}

async fn tick_all(peers: &HashMap<PlayerId, mpsc::UnboundedSender<PeerEvent>>) -> Vec<TickReport> {
    let mut acks = Vec::with_capacity(peers.len());
    for tx in peers.values() {
        let (ack_tx, ack_rx) = oneshot::channel();
        if tx.send(PeerEvent::Tick(ack_tx)).is_ok() {
            acks.push(ack_rx);
        }
    }
    let mut reports = Vec::with_capacity(acks.len());
    for ack in acks {
        if let Ok(report) = ack.await {
            reports.push(report);
        }
    }
    reports
}

/// Play one game with bots on a virtual clock, from empty lobby to the
/// winner announcement.
pub async fn run_match(config: SimConfig) -> MatchReport {
    let config = config.validated();
    let clock = ManualClock::new(0);
    let registry = OwnershipRegistry::default();
    let roster = Roster::bots(config.bots);
    let levels = Arc::new(LevelCatalog::load());
    let in_flight = InFlight::default();
    seed_ownership(&registry, &config);

    let (relay_tx, relay_rx) = mpsc::unbounded_channel();
    let mut peers = HashMap::new();
    let mut handles = Vec::new();
    let ids = roster.ids();
    for (index, &player) in ids.iter().enumerate() {
        let (tx, rx) = mpsc::unbounded_channel();
        let services = ParticipantServices {
            clock: Arc::new(clock.clone()),
            ownership: Arc::new(registry.view(player)),
            identity: Arc::new(roster.clone()),
            presentation: Box::new(LogPresentation { player }),
        };
        let participant = Participant::new(
            config.arena.clone(),
            Arc::clone(&levels),
            services,
            config.seed,
        );
        let peer = SimPeer {
            participant,
            bot: Bot::new(&config, config.seed.wrapping_add(player)),
            pose: bot_pose(index, ids.len()),
            relay: relay_tx.clone(),
            in_flight: in_flight.clone(),
            clock: Arc::new(clock.clone()),
        };
        handles.push(tokio::spawn(run_peer(peer, rx)));
        peers.insert(player, tx);
    }
    drop(relay_tx);
    let relay = Relay::new(peers.clone(), registry.clone(), in_flight.clone());
    let relay_handle = tokio::spawn(relay.run(relay_rx));

    tracing::info!(bots = config.bots, seed = config.seed, "Match starting");

    let limit = config.max_match_secs.saturating_mul(1_000);
    let mut rounds = 0;
    let mut winner = None;
    let mut dropped = None;
    let mut timed_out = true;

    while clock.now_ms() < limit {
        clock.advance(config.tick_ms);
        let reports = tick_all(&peers).await;
        settle(&in_flight).await;

        let Some(host) = reports.iter().find(|r| r.is_authority) else {
            tracing::error!("No peer holds the game logic");
            break;
        };
        rounds = rounds.max(host.round);

        if dropped.is_none()
            && config.dropout_round > 0
            && host.round >= config.dropout_round
            && host.phase == Phase::Fighting
            && let Some(&leaver) = ids.last().filter(|&&id| id != HOST)
        {
            dropped = Some(leaver);
            if let Some(tx) = peers.remove(&leaver) {
                let _ = tx.send(PeerEvent::Stop);
            }
            let moved = registry.reassign_all(leaver, HOST);
            tracing::info!(player_id = leaver, moved, "Bot dropped out");
            if let Some(tx) = peers.get(&HOST) {
                let _ = tx.send(PeerEvent::PlayerLeft(leaver));
            }
            settle(&in_flight).await;
        }

        if host.phase == Phase::GameEnding {
            timed_out = false;
            break;
        }
    }

    for tx in peers.values() {
        let _ = tx.send(PeerEvent::Stop);
    }
    drop(peers);

    let mut summaries = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(summary) => summaries.push(summary),
            Err(e) => tracing::error!(error = %e, "Peer task failed"),
        }
    }
    if let Err(e) = relay_handle.await {
        tracing::error!(error = %e, "Relay task failed");
    }

    if !timed_out
        && let Some(host) = summaries.iter().find(|s| s.player == HOST)
    {
        winner = host.winner();
    }
    // The leaver's copy stopped following the game.
    summaries.retain(|s| Some(s.player) != dropped);
    summaries.sort_by_key(|s| s.player);

    let report = MatchReport {
        rounds,
        winner,
        elapsed_ms: clock.now_ms(),
        timed_out,
        dropped,
        peers: summaries,
    };
    tracing::info!(
        rounds = report.rounds,
        winner = ?report.winner,
        timed_out = report.timed_out,
        "Match finished"
    );
    report
}
