use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use shuriken_arena::Participant;
use shuriken_arena::phase::Phase;
use shuriken_arena::pose::{Pose, Vec3};
use shuriken_arena::projectile::Contact;
use shuriken_core::time::Millis;

use crate::config::SimConfig;

/// Release speed for bot throws, well over the throw threshold.
const THROW_SPEED: f32 = 6.0;

/// What a bot did this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAction {
    Idle,
    Join,
    Start,
    Throw(Contact),
}

/// Scripted player: joins, starts when the lobby countdown runs out, and
/// throws on a cooldown.
#[derive(Debug)]
pub struct Bot {
    rng: StdRng,
    accuracy: f64,
    pickup_chance: f64,
    throw_cooldown_ms: Millis,
    next_throw_at: Millis,
    join_sent: bool,
    start_sent: bool,
}

impl Bot {
    pub fn new(config: &SimConfig, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            accuracy: config.accuracy,
            pickup_chance: config.pickup_chance,
            throw_cooldown_ms: config.throw_cooldown_ms,
            next_throw_at: 0,
            join_sent: false,
            start_sent: false,
        }
    }

    pub fn act(&mut self, participant: &mut Participant, pose: &Pose, now: Millis) -> BotAction {
        match participant.session().phase {
            Phase::Lobby => self.lobby(participant),
            Phase::Fighting => self.fight(participant, pose, now),
            _ => BotAction::Idle,
        }
    }

    fn lobby(&mut self, participant: &mut Participant) -> BotAction {
        let local = participant.local();
        if !participant.session().is_joined(local) {
            if self.join_sent {
                return BotAction::Idle;
            }
            self.join_sent = true;
            participant.join();
            return BotAction::Join;
        }
        // The game master starts once its countdown runs out.
        let view = participant.lobby_view();
        if participant.is_authority() && !self.start_sent && view.can_start && view.countdown_secs == Some(0) {
            self.start_sent = true;
            participant.start_game();
            return BotAction::Start;
        }
        BotAction::Idle
    }

    fn fight(&mut self, participant: &mut Participant, pose: &Pose, now: Millis) -> BotAction {
        if now < self.next_throw_at {
            return BotAction::Idle;
        }
        let Some(slot) = participant.local_projectile().map(|p| p.slot()) else {
            return BotAction::Idle;
        };
        let local = participant.local();
        let session = participant.session();
        let pickup = session.pickups.first().map(|p| p.id);
        let opponents: Vec<usize> = session
            .slots
            .occupants()
            .filter(|(_, s)| s.occupant != Some(local) && s.lives > 0)
            .map(|(index, _)| index)
            .collect();

        let contact = match pickup {
            Some(id) if self.rng.random_bool(self.pickup_chance) => Contact::Pickup(id),
            _ if !opponents.is_empty() && self.rng.random_bool(self.accuracy) => {
                Contact::Collider(opponents[self.rng.random_range(0..opponents.len())])
            },
            _ => Contact::Ground,
        };

        participant.grip(slot, None);
        participant.release(slot, pose.forward * THROW_SPEED, pose.forward);
        let outcome = participant.contact(slot, contact, pose);
        tracing::trace!(player_id = local, ?contact, ?outcome, "Bot threw");
        self.next_throw_at = now + self.throw_cooldown_ms;
        BotAction::Throw(contact)
    }
}

/// Bots stand on a ring facing the middle.
pub fn bot_pose(index: usize, count: usize) -> Pose {
    let angle = std::f32::consts::TAU * index as f32 / count.max(1) as f32;
    let position = Vec3::new(3.0 * angle.cos(), 0.0, 3.0 * angle.sin());
    Pose::new(position, (Vec3::ZERO - position).normalized_or_zero())
}
