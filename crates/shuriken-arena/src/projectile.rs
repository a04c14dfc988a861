use serde::{Deserialize, Serialize};

use shuriken_core::net::messages::ObjectId;
use shuriken_core::player::PlayerId;
use shuriken_core::slots::SlotIndex;

use crate::config::ArenaConfig;
use crate::level::Level;
use crate::listener::{RoundContext, RoundListener};
use crate::phase::Phase;
use crate::pose::{Pose, Vec3};
use crate::powerups::{ProjectileEffects, ShurikenPowerUp, ShurikenStack};
use crate::procedure::{ArenaOutbox, Procedure};
use crate::session::{Session, Winner};

/// Physical state of a projectile as simulated by its owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileState {
    #[default]
    AtRest,
    Held,
    Thrown,
}

/// Something the physics layer saw the projectile touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// The hit collider following the player in a slot.
    Collider(SlotIndex),
    /// Another slot's projectile.
    Projectile(SlotIndex),
    Pickup(u16),
    Target(u8),
    Ground,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactOutcome {
    /// A hit on `victim` was forwarded to the game logic owner.
    HitReported {
        victim: PlayerId,
        /// Where and how big the cosmetic explosion is, with Badaboom held.
        explosion: Option<(Vec3, f32)>,
    },
    /// Sent back to the owner after touching another projectile.
    Returned,
    PickupClaimed { pickup: u16 },
    TargetStruck { target: u8 },
    Settled,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GripOutcome {
    Held,
    /// Someone other than the owner grabbed it; it went back to the owner.
    SnappedBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Thrown,
    Dropped,
    Ignored,
}

/// Why the owner's tick recalled the projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnReason {
    /// A new round or a new owner.
    Reset,
    BelowFloor,
    BeyondTether,
    RestingTooFar,
}

/// Per-slot throwable.
///
/// Every participant holds one per slot. Only the owner (the slot's
/// occupant) runs [`Projectile::tick`], [`Projectile::contact`] and the
/// grip handlers; other holders just track power-ups and score for display.
#[derive(Debug, Clone)]
pub struct Projectile {
    slot: SlotIndex,
    owner: Option<PlayerId>,
    state: ProjectileState,
    held_by_hand: bool,
    has_been_released: bool,
    enabled: bool,
    power_ups: ShurikenStack,
    effects: ProjectileEffects,
    local_score: u32,
    position: Vec3,
    velocity: Vec3,
    return_pending: bool,
}

impl Projectile {
    pub fn new(slot: SlotIndex) -> Self {
        Self {
            slot,
            owner: None,
            state: ProjectileState::AtRest,
            held_by_hand: false,
            has_been_released: false,
            enabled: false,
            power_ups: ShurikenStack::new(),
            effects: ProjectileEffects::default(),
            local_score: 0,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            return_pending: false,
        }
    }

    pub fn object(&self) -> ObjectId {
        ObjectId::Projectile(self.slot as u8)
    }

    pub fn slot(&self) -> SlotIndex {
        self.slot
    }

    pub fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    pub fn state(&self) -> ProjectileState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn has_been_released(&self) -> bool {
        self.has_been_released
    }

    pub fn is_held_by_hand(&self) -> bool {
        self.held_by_hand
    }

    pub fn power_ups(&self) -> &ShurikenStack {
        &self.power_ups
    }

    pub fn effects(&self) -> &ProjectileEffects {
        &self.effects
    }

    pub fn local_score(&self) -> u32 {
        self.local_score
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Follow the slot's occupant. A new owner starts from a clean slate.
    /// Returns `true` if the owner changed.
    pub fn bind_owner(&mut self, owner: Option<PlayerId>) -> bool {
        if self.owner == owner {
            return false;
        }
        tracing::debug!(slot = self.slot, ?owner, "Projectile owner changed");
        self.owner = owner;
        self.retire();
        self.state = ProjectileState::AtRest;
        self.held_by_hand = false;
        self.has_been_released = false;
        self.return_pending = owner.is_some();
        true
    }

    /// Mirror of the slot's score, kept for display.
    pub fn set_local_score(&mut self, score: u32) {
        self.local_score = score;
    }

    /// Body state reported by the physics layer.
    pub fn set_body(&mut self, position: Vec3, velocity: Vec3) {
        self.position = position;
        self.velocity = velocity;
    }

    /// Push a power-up and recompute effects. Returns whatever fell off the stack.
    pub fn activate_power_up(&mut self, kind: ShurikenPowerUp) -> Option<ShurikenPowerUp> {
        let evicted = self.power_ups.push(kind);
        self.effects = ProjectileEffects::from_stack(&self.power_ups);
        evicted
    }

    /// Drop all power-ups and the mirrored score.
    pub fn retire(&mut self) {
        self.power_ups.clear();
        self.effects = ProjectileEffects::from_stack(&self.power_ups);
        self.local_score = 0;
    }

    /// Put the projectile just in front of its owner, motionless.
    pub fn return_to(&mut self, owner_pose: &Pose, config: &ArenaConfig) {
        self.position = owner_pose.offset(config.return_forward, config.return_up);
        self.velocity = Vec3::ZERO;
        self.state = ProjectileState::AtRest;
        self.held_by_hand = false;
        self.has_been_released = false;
        self.return_pending = false;
    }

    pub fn grip(&mut self, by: PlayerId, owner_pose: Option<&Pose>, config: &ArenaConfig) -> GripOutcome {
        if self.owner != Some(by) {
            if let Some(pose) = owner_pose {
                self.return_to(pose, config);
            }
            tracing::debug!(slot = self.slot, player_id = by, "Grip by non-owner, snapping back");
            return GripOutcome::SnappedBack;
        }
        self.state = ProjectileState::Held;
        self.held_by_hand = true;
        self.has_been_released = false;
        self.velocity = Vec3::ZERO;
        GripOutcome::Held
    }

    /// Let go. Fast enough and it flies along `forward`; otherwise it drops.
    pub fn release(
        &mut self,
        by: PlayerId,
        velocity: Vec3,
        forward: Vec3,
        config: &ArenaConfig,
    ) -> ReleaseOutcome {
        if self.owner != Some(by) || self.state != ProjectileState::Held {
            return ReleaseOutcome::Ignored;
        }
        self.held_by_hand = false;
        self.has_been_released = true;
        if velocity.length() > config.throw_speed_threshold {
            let direction = forward.normalized_or_zero();
            self.velocity = if direction == Vec3::ZERO {
                velocity
            } else {
                direction * config.throw_impulse
            };
            self.state = ProjectileState::Thrown;
            ReleaseOutcome::Thrown
        } else {
            self.velocity = velocity;
            self.state = ProjectileState::AtRest;
            ReleaseOutcome::Dropped
        }
    }

    /// Owner-side bounds policy. Recalls the projectile when it falls out of
    /// the world, strays past the tether, or comes to rest too far away.
    pub fn tick(&mut self, owner_pose: &Pose, config: &ArenaConfig) -> Option<ReturnReason> {
        if self.state == ProjectileState::Thrown && self.velocity.length() < config.rest_speed {
            self.state = ProjectileState::AtRest;
        }
        let reason = if self.return_pending {
            Some(ReturnReason::Reset)
        } else if !self.position.is_finite() || self.position.y < config.floor_y {
            Some(ReturnReason::BelowFloor)
        } else if self.position.distance(owner_pose.position) > config.tether_distance {
            Some(ReturnReason::BeyondTether)
        } else if self.state == ProjectileState::AtRest
            && self.has_been_released
            && self.position.horizontal_distance(owner_pose.position) > config.ground_distance
        {
            Some(ReturnReason::RestingTooFar)
        } else {
            None
        };
        if let Some(reason) = reason {
            tracing::trace!(slot = self.slot, ?reason, "Returning projectile");
            self.return_to(owner_pose, config);
        }
        reason
    }

    /// Owner-side contact handling.
    pub fn contact(
        &mut self,
        contact: Contact,
        session: &Session,
        owner_pose: &Pose,
        config: &ArenaConfig,
        outbox: &mut ArenaOutbox,
    ) -> ContactOutcome {
        let Some(owner) = self.owner else {
            return ContactOutcome::Ignored;
        };
        if outbox.sender() != owner {
            return ContactOutcome::Ignored;
        }
        match contact {
            Contact::Collider(slot) => {
                if !self.enabled || self.state != ProjectileState::Thrown {
                    return ContactOutcome::Ignored;
                }
                if session.phase != Phase::Fighting {
                    return ContactOutcome::Ignored;
                }
                let Some(target) = session.slots.get(slot) else {
                    return ContactOutcome::Ignored;
                };
                let Some(victim) = target.occupant else {
                    return ContactOutcome::Ignored;
                };
                if victim == owner {
                    return ContactOutcome::Ignored;
                }
                if target.lives == 0 {
                    tracing::debug!(slot, victim, "Contact with an eliminated player ignored");
                    return ContactOutcome::Ignored;
                }
                outbox.to_owner(ObjectId::GameLogic, Procedure::RegisterHit { victim });
                let radius = self.effects.explosion_radius();
                let explosion = (radius > 0.0).then_some((self.position, radius));
                self.return_to(owner_pose, config);
                ContactOutcome::HitReported { victim, explosion }
            },
            Contact::Projectile(_) => {
                if self.held_by_hand {
                    return ContactOutcome::Ignored;
                }
                self.return_to(owner_pose, config);
                ContactOutcome::Returned
            },
            Contact::Pickup(pickup) => {
                if !self.enabled || !session.pickups.iter().any(|p| p.id == pickup) {
                    return ContactOutcome::Ignored;
                }
                outbox.to_owner(ObjectId::GameLogic, Procedure::CollectPowerUp { pickup });
                ContactOutcome::PickupClaimed { pickup }
            },
            Contact::Target(target) => {
                if self.state != ProjectileState::Thrown {
                    return ContactOutcome::Ignored;
                }
                outbox.to_owner(ObjectId::Target(target), Procedure::TargetHit);
                ContactOutcome::TargetStruck { target }
            },
            Contact::Ground => {
                if self.state != ProjectileState::Thrown {
                    return ContactOutcome::Ignored;
                }
                self.state = ProjectileState::AtRest;
                ContactOutcome::Settled
            },
        }
    }
}

impl RoundListener for Projectile {
    fn on_round_start(&mut self, _level: Level, _round: u32, _ctx: &mut RoundContext<'_>) {
        self.enabled = false;
        self.return_pending = self.owner.is_some();
    }

    fn on_fighting_start(&mut self, _ctx: &mut RoundContext<'_>) {
        self.enabled = true;
    }

    fn on_round_end(&mut self, _ctx: &mut RoundContext<'_>) {
        self.enabled = false;
    }

    fn on_game_end(&mut self, _winner: Option<Winner>, ctx: &mut RoundContext<'_>) {
        self.enabled = false;
        self.retire();
        self.return_pending = self.owner.is_some();
        if ctx.is_owner {
            ctx.presentation.set_locomotion(&self.effects.locomotion);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shuriken_core::net::messages::RpcTarget;
    use shuriken_core::powerup::PowerUpKind;

    const OWNER: PlayerId = 10;
    const OTHER: PlayerId = 11;

    fn config() -> ArenaConfig {
        ArenaConfig::default()
    }

    fn owner_pose() -> Pose {
        Pose::new(Vec3::ZERO, Vec3::FORWARD)
    }

    fn fighting_session() -> Session {
        let mut session = Session::new(&config());
        session.slots.add_occupant(OWNER, 3).unwrap();
        session.slots.add_occupant(OTHER, 3).unwrap();
        session.phase = Phase::Fighting;
        session
    }

    fn bound() -> Projectile {
        let mut p = Projectile::new(0);
        p.bind_owner(Some(OWNER));
        p.tick(&owner_pose(), &config());
        p.enabled = true;
        p
    }

    fn thrown() -> Projectile {
        let mut p = bound();
        p.grip(OWNER, None, &config());
        p.release(OWNER, Vec3::new(0.0, 0.0, 5.0), Vec3::FORWARD, &config());
        p
    }

    #[test]
    fn new_owner_is_returned_on_first_tick() {
        let mut p = Projectile::new(2);
        assert!(p.bind_owner(Some(OWNER)));
        assert!(!p.bind_owner(Some(OWNER)));
        assert_eq!(p.tick(&owner_pose(), &config()), Some(ReturnReason::Reset));
        assert_eq!(p.position(), Vec3::new(0.0, 1.0, 0.5));
        assert_eq!(p.tick(&owner_pose(), &config()), None);
    }

    #[test]
    fn fast_release_throws_along_forward() {
        let p = thrown();
        assert_eq!(p.state(), ProjectileState::Thrown);
        assert!(p.has_been_released());
        assert!(!p.is_held_by_hand());
        assert_eq!(p.velocity(), Vec3::new(0.0, 0.0, 12.0));
    }

    #[test]
    fn slow_release_drops() {
        let mut p = bound();
        p.grip(OWNER, None, &config());
        let outcome = p.release(OWNER, Vec3::new(0.5, 0.0, 0.0), Vec3::FORWARD, &config());
        assert_eq!(outcome, ReleaseOutcome::Dropped);
        assert_eq!(p.state(), ProjectileState::AtRest);
        assert!(p.has_been_released());
    }

    #[test]
    fn release_without_grip_is_ignored() {
        let mut p = bound();
        let outcome = p.release(OWNER, Vec3::new(5.0, 0.0, 0.0), Vec3::FORWARD, &config());
        assert_eq!(outcome, ReleaseOutcome::Ignored);
    }

    #[test]
    fn foreign_grip_snaps_back_to_owner() {
        let mut p = thrown();
        p.set_body(Vec3::new(5.0, 0.0, 5.0), Vec3::new(1.0, 0.0, 0.0));
        let pose = Pose::new(Vec3::new(2.0, 0.0, 0.0), Vec3::FORWARD);
        assert_eq!(p.grip(OTHER, Some(&pose), &config()), GripOutcome::SnappedBack);
        assert_eq!(p.position(), Vec3::new(2.0, 1.0, 0.5));
        assert_eq!(p.velocity(), Vec3::ZERO);
        assert_eq!(p.state(), ProjectileState::AtRest);
    }

    #[test]
    fn beyond_tether_returns_with_zero_velocity() {
        let mut p = thrown();
        p.set_body(Vec3::new(0.0, 2.0, 41.0), Vec3::new(0.0, 0.0, 12.0));
        assert_eq!(p.tick(&owner_pose(), &config()), Some(ReturnReason::BeyondTether));
        assert_eq!(p.velocity(), Vec3::ZERO);
        assert!(!p.has_been_released());
    }

    #[test]
    fn below_floor_returns() {
        let mut p = thrown();
        p.set_body(Vec3::new(0.0, -11.0, 0.0), Vec3::new(0.0, -3.0, 0.0));
        assert_eq!(p.tick(&owner_pose(), &config()), Some(ReturnReason::BelowFloor));
    }

    #[test]
    fn resting_far_away_returns_but_near_does_not() {
        let mut p = thrown();
        p.set_body(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        assert_eq!(p.tick(&owner_pose(), &config()), None);
        assert_eq!(p.state(), ProjectileState::AtRest);

        p.set_body(Vec3::new(0.0, 0.0, 7.0), Vec3::ZERO);
        assert_eq!(p.tick(&owner_pose(), &config()), Some(ReturnReason::RestingTooFar));
    }

    #[test]
    fn in_flight_far_but_inside_tether_keeps_flying() {
        let mut p = thrown();
        p.set_body(Vec3::new(0.0, 2.0, 20.0), Vec3::new(0.0, 0.0, 12.0));
        assert_eq!(p.tick(&owner_pose(), &config()), None);
        assert_eq!(p.state(), ProjectileState::Thrown);
    }

    #[test]
    fn collider_contact_reports_hit_and_returns() {
        let session = fighting_session();
        let mut outbox = ArenaOutbox::new(OWNER);
        let mut p = thrown();
        let outcome = p.contact(Contact::Collider(1), &session, &owner_pose(), &config(), &mut outbox);
        assert_eq!(
            outcome,
            ContactOutcome::HitReported {
                victim: OTHER,
                explosion: None
            }
        );
        let env = outbox.rpcs().next().unwrap();
        assert_eq!(env.object, ObjectId::GameLogic);
        assert_eq!(env.target, RpcTarget::Owner);
        assert_eq!(env.procedure, Procedure::RegisterHit { victim: OTHER });
        assert_eq!(p.state(), ProjectileState::AtRest);
        assert!(!p.has_been_released());
    }

    #[test]
    fn badaboom_adds_explosion() {
        let session = fighting_session();
        let mut outbox = ArenaOutbox::new(OWNER);
        let mut p = thrown();
        p.activate_power_up(ShurikenPowerUp::Badaboom);
        let outcome = p.contact(Contact::Collider(1), &session, &owner_pose(), &config(), &mut outbox);
        let ContactOutcome::HitReported { explosion, .. } = outcome else {
            panic!("expected hit");
        };
        assert!(explosion.is_some_and(|(_, r)| r > 0.0));
    }

    #[test]
    fn collider_contact_ignored_when_not_allowed() {
        let mut session = fighting_session();
        let mut outbox = ArenaOutbox::new(OWNER);

        // Own collider.
        let mut p = thrown();
        let own = p.contact(Contact::Collider(0), &session, &owner_pose(), &config(), &mut outbox);
        assert_eq!(own, ContactOutcome::Ignored);

        // Eliminated victim.
        session.slots.hit(1);
        session.slots.hit(1);
        session.slots.hit(1);
        let out = p.contact(Contact::Collider(1), &session, &owner_pose(), &config(), &mut outbox);
        assert_eq!(out, ContactOutcome::Ignored);

        // Disabled projectile.
        let session = fighting_session();
        let mut p = thrown();
        p.enabled = false;
        let disabled = p.contact(Contact::Collider(1), &session, &owner_pose(), &config(), &mut outbox);
        assert_eq!(disabled, ContactOutcome::Ignored);

        // Not the owner's participant.
        let mut foreign = ArenaOutbox::new(OTHER);
        let mut p = thrown();
        let remote = p.contact(Contact::Collider(1), &session, &owner_pose(), &config(), &mut foreign);
        assert_eq!(remote, ContactOutcome::Ignored);

        assert!(outbox.is_empty());
        assert!(foreign.is_empty());
    }

    #[test]
    fn projectile_contact_returns() {
        let session = fighting_session();
        let mut outbox = ArenaOutbox::new(OWNER);
        let mut p = thrown();
        p.set_body(Vec3::new(3.0, 1.0, 3.0), Vec3::new(0.0, 0.0, 8.0));
        let outcome = p.contact(Contact::Projectile(1), &session, &owner_pose(), &config(), &mut outbox);
        assert_eq!(outcome, ContactOutcome::Returned);
        assert_eq!(p.velocity(), Vec3::ZERO);
    }

    #[test]
    fn pickup_contact_claims_existing_pickup() {
        let mut session = fighting_session();
        session.pickups.push(crate::powerups::Pickup {
            id: 4,
            kind: ShurikenPowerUp::Jumpman,
            position: Vec3::ZERO,
        });
        let mut outbox = ArenaOutbox::new(OWNER);
        let mut p = thrown();
        let outcome = p.contact(Contact::Pickup(4), &session, &owner_pose(), &config(), &mut outbox);
        assert_eq!(outcome, ContactOutcome::PickupClaimed { pickup: 4 });
        let gone = p.contact(Contact::Pickup(5), &session, &owner_pose(), &config(), &mut outbox);
        assert_eq!(gone, ContactOutcome::Ignored);
        assert_eq!(outbox.len(), 1);
    }

    #[test]
    fn ground_settles_thrown_projectile() {
        let session = fighting_session();
        let mut outbox = ArenaOutbox::new(OWNER);
        let mut p = thrown();
        let outcome = p.contact(Contact::Ground, &session, &owner_pose(), &config(), &mut outbox);
        assert_eq!(outcome, ContactOutcome::Settled);
        assert_eq!(p.state(), ProjectileState::AtRest);
    }

    #[test]
    fn power_ups_keep_three_and_recompute() {
        let mut p = bound();
        p.activate_power_up(ShurikenPowerUp::Embiggen);
        p.activate_power_up(ShurikenPowerUp::Jumpman);
        p.activate_power_up(ShurikenPowerUp::MoonShoes);
        let evicted = p.activate_power_up(ShurikenPowerUp::Badaboom);
        assert_eq!(evicted, Some(ShurikenPowerUp::Embiggen));
        assert_eq!(p.power_ups().len(), 3);
        assert!((p.effects().scale - 1.0).abs() < 1e-6);
        assert_eq!(p.effects().explosion_level, 1);
        assert_eq!(p.power_ups().iter().next().map(|k| k.name()), Some("Badaboom"));
    }

    #[test]
    fn owner_change_clears_power_ups_and_score() {
        let mut p = bound();
        p.activate_power_up(ShurikenPowerUp::Embiggen);
        p.set_local_score(4);
        p.bind_owner(Some(OTHER));
        assert!(p.power_ups().is_empty());
        assert_eq!(p.local_score(), 0);
        assert_eq!(*p.effects(), ProjectileEffects::default());
    }
}
