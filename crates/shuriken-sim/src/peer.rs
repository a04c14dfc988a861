use std::sync::Arc;

use tokio::sync::mpsc;

use shuriken_arena::Participant;
use shuriken_arena::phase::Phase;
use shuriken_arena::pose::Pose;
use shuriken_arena::presentation::{Banner, Presentation, ScoreLine};
use shuriken_arena::session::Session;
use shuriken_arena::stats::PlayerStats;
use shuriken_core::player::PlayerId;
use shuriken_core::slots::SlotTable;
use shuriken_core::time::{Clock, Millis};

use crate::bot::{Bot, BotAction};
use crate::relay::{InFlight, PeerEvent, Routed, submit};

/// Presentation for headless peers: everything goes to the log.
#[derive(Debug, Clone, Copy)]
pub struct LogPresentation {
    pub player: PlayerId,
}

impl Presentation for LogPresentation {
    fn set_phase(&mut self, phase: Phase) {
        tracing::debug!(player_id = self.player, phase = phase.label(), "Phase");
    }

    fn show_banner(&mut self, banner: &Banner) {
        tracing::info!(
            player_id = self.player,
            top = %banner.top,
            highlight = %banner.highlight,
            middle = %banner.middle,
            "Banner"
        );
    }

    fn show_scoreboard(&mut self, lines: &[ScoreLine], _duration_ms: Millis) {
        for line in lines {
            tracing::debug!(
                player_id = self.player,
                slot = line.slot,
                name = %line.name,
                score = line.score,
                "Scoreboard"
            );
        }
    }
}

/// What a peer tells the driver after each frame.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub player: PlayerId,
    pub is_authority: bool,
    pub phase: Phase,
    pub round: u32,
    pub action: BotAction,
}

/// A peer's final state once its task stops.
#[derive(Debug, Clone)]
pub struct PeerSummary {
    pub player: PlayerId,
    pub stats: PlayerStats,
    pub phase: Phase,
    pub round: u32,
    pub max_score: u32,
    pub slots: SlotTable,
}

impl PeerSummary {
    /// Player and score of the match winner as the game logic picks it:
    /// highest score at or above the target, ties to the lowest slot.
    pub fn winner(&self) -> Option<(PlayerId, u32)> {
        let slot = self.slots.get(self.slots.leader_at_or_above(self.max_score)?)?;
        Some((slot.occupant?, slot.score))
    }
}

/// One bot-driven participant and its link to the relay.
pub struct SimPeer {
    pub participant: Participant,
    pub bot: Bot,
    pub pose: Pose,
    pub relay: mpsc::UnboundedSender<Routed>,
    pub in_flight: InFlight,
    pub clock: Arc<dyn Clock>,
}

impl SimPeer {
    fn flush(&mut self) {
        let from = self.participant.local();
        for msg in self.participant.drain_outbox() {
            if !submit(&self.relay, &self.in_flight, from, &msg) {
                tracing::warn!(player_id = from, "Relay closed, dropping outbound message");
            }
        }
    }

    fn tick(&mut self) -> TickReport {
        let now = self.clock.now_ms();
        let action = self.bot.act(&mut self.participant, &self.pose, now);
        self.participant.tick(&self.pose);
        self.flush();
        let session: &Session = self.participant.session();
        TickReport {
            player: self.participant.local(),
            is_authority: self.participant.is_authority(),
            phase: session.phase,
            round: session.round,
            action,
        }
    }

    fn summary(&self) -> PeerSummary {
        let session = self.participant.session();
        PeerSummary {
            player: self.participant.local(),
            stats: *self.participant.stats(),
            phase: session.phase,
            round: session.round,
            max_score: session.max_score,
            slots: session.slots.clone(),
        }
    }
}

/// Drive one peer until told to stop or its channel closes.
pub async fn run_peer(mut peer: SimPeer, mut events: mpsc::UnboundedReceiver<PeerEvent>) -> PeerSummary {
    while let Some(event) = events.recv().await {
        match event {
            PeerEvent::Tick(ack) => {
                let report = peer.tick();
                let _ = ack.send(report);
            },
            PeerEvent::Deliver(data) => {
                if let Err(e) = peer.participant.receive_bytes(&data) {
                    tracing::warn!(error = %e, player_id = peer.participant.local(), "Dropped malformed message");
                }
                peer.flush();
                peer.in_flight.done();
            },
            PeerEvent::PlayerLeft(player) => {
                peer.participant.player_left(player);
                peer.flush();
            },
            PeerEvent::Stop => break,
        }
    }
    // Anything still queued will never be handled.
    events.close();
    while let Ok(event) = events.try_recv() {
        if matches!(event, PeerEvent::Deliver(_)) {
            peer.in_flight.done();
        }
    }
    peer.summary()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(scores: &[(PlayerId, u32)], max_score: u32) -> PeerSummary {
        let mut slots = SlotTable::new(4);
        for &(player, score) in scores {
            if let Ok(slot) = slots.add_occupant(player, 3) {
                for _ in 0..score {
                    slots.credit_kill(slot);
                }
            }
        }
        PeerSummary {
            player: 1,
            stats: PlayerStats::default(),
            phase: Phase::GameEnding,
            round: 3,
            max_score,
            slots,
        }
    }

    #[test]
    fn tied_winner_is_the_lowest_slot() {
        let report = summary(&[(1, 1), (2, 3), (3, 3)], 3);
        assert_eq!(report.winner(), Some((2, 3)));
    }

    #[test]
    fn no_winner_below_max_score() {
        let report = summary(&[(1, 2), (2, 1)], 3);
        assert_eq!(report.winner(), None);
    }
}
