use serde::{Deserialize, Serialize};

use shuriken_core::powerup::{PowerUpKind, PowerUpStack};

use crate::pose::Vec3;

/// Power-ups a projectile can pick up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShurikenPowerUp {
    /// Bigger projectile.
    Embiggen,
    /// Faster owner.
    Amphetamines,
    /// Lower owner gravity.
    MoonShoes,
    /// Projectile explodes on player contact.
    Badaboom,
    /// Higher owner jump.
    Jumpman,
}

impl ShurikenPowerUp {
    /// Every kind the spawner can place.
    pub const ALL: [ShurikenPowerUp; 5] = [
        ShurikenPowerUp::Embiggen,
        ShurikenPowerUp::Amphetamines,
        ShurikenPowerUp::MoonShoes,
        ShurikenPowerUp::Badaboom,
        ShurikenPowerUp::Jumpman,
    ];
}

impl PowerUpKind for ShurikenPowerUp {
    fn name(&self) -> &'static str {
        match self {
            Self::Embiggen => "Embiggen",
            Self::Amphetamines => "Amphetamines",
            Self::MoonShoes => "Moon Shoes",
            Self::Badaboom => "Badaboom",
            Self::Jumpman => "Jumpman",
        }
    }

    fn subtitle(&self) -> &'static str {
        match self {
            Self::Embiggen => "Go big or go home",
            Self::Amphetamines => "Gotta go fast",
            Self::MoonShoes => "Reach for the stars",
            Self::Badaboom => "Hearing protection recommended",
            Self::Jumpman => "It's-a me, legally-distinct character!",
        }
    }
}

pub type ShurikenStack = PowerUpStack<ShurikenPowerUp>;

/// Movement parameters applied to the projectile's owner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Locomotion {
    pub walk_speed: f32,
    pub run_speed: f32,
    pub jump_impulse: f32,
    pub gravity: f32,
}

impl Default for Locomotion {
    fn default() -> Self {
        Self {
            walk_speed: 2.0,
            run_speed: 4.0,
            jump_impulse: 3.0,
            gravity: 1.0,
        }
    }
}

/// Everything a power-up stack changes, derived from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileEffects {
    pub scale: f32,
    pub explosion_level: u8,
    pub locomotion: Locomotion,
}

impl Default for ProjectileEffects {
    fn default() -> Self {
        Self {
            scale: 1.0,
            explosion_level: 0,
            locomotion: Locomotion::default(),
        }
    }
}

impl ProjectileEffects {
    /// Reset to baseline, then apply every held power-up.
    ///
    /// Duplicates stack. The result depends only on the stack contents.
    pub fn from_stack(stack: &ShurikenStack) -> Self {
        let mut effects = Self::default();
        for kind in stack.iter() {
            effects.apply(kind);
        }
        effects
    }

    fn apply(&mut self, kind: ShurikenPowerUp) {
        match kind {
            ShurikenPowerUp::Embiggen => self.scale += 1.0,
            ShurikenPowerUp::Amphetamines => {
                self.locomotion.walk_speed *= 1.5;
                self.locomotion.run_speed *= 1.5;
            },
            ShurikenPowerUp::MoonShoes => self.locomotion.gravity *= 0.5,
            ShurikenPowerUp::Badaboom => self.explosion_level += 1,
            ShurikenPowerUp::Jumpman => self.locomotion.jump_impulse += 2.0,
        }
    }

    /// Radius of the cosmetic explosion on player contact, zero without Badaboom.
    pub fn explosion_radius(&self) -> f32 {
        explosion_range(self.explosion_level)
    }
}

/// Explosion radius for a Badaboom stack count.
pub fn explosion_range(level: u8) -> f32 {
    if level == 0 {
        0.0
    } else {
        1.0 + 1.5 * f32::from(level)
    }
}

/// A collectible sitting in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u16,
    pub kind: ShurikenPowerUp,
    pub position: Vec3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stack_is_baseline() {
        assert_eq!(
            ProjectileEffects::from_stack(&ShurikenStack::new()),
            ProjectileEffects::default()
        );
    }

    #[test]
    fn duplicates_stack() {
        let mut stack = ShurikenStack::new();
        stack.push(ShurikenPowerUp::Embiggen);
        stack.push(ShurikenPowerUp::Embiggen);
        let effects = ProjectileEffects::from_stack(&stack);
        assert!((effects.scale - 3.0).abs() < 1e-6);
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut stack = ShurikenStack::new();
        stack.push(ShurikenPowerUp::MoonShoes);
        stack.push(ShurikenPowerUp::Badaboom);
        stack.push(ShurikenPowerUp::Amphetamines);
        let first = ProjectileEffects::from_stack(&stack);
        let second = ProjectileEffects::from_stack(&stack);
        assert_eq!(first, second);
        assert_eq!(first.explosion_level, 1);
        assert!((first.locomotion.gravity - 0.5).abs() < 1e-6);
    }

    #[test]
    fn evicted_power_up_stops_applying() {
        let mut stack = ShurikenStack::new();
        stack.push(ShurikenPowerUp::Jumpman);
        stack.push(ShurikenPowerUp::Embiggen);
        stack.push(ShurikenPowerUp::Embiggen);
        stack.push(ShurikenPowerUp::Embiggen);
        let effects = ProjectileEffects::from_stack(&stack);
        assert!((effects.locomotion.jump_impulse - Locomotion::default().jump_impulse).abs() < 1e-6);
        assert!((effects.scale - 4.0).abs() < 1e-6);
    }

    #[test]
    fn explosion_range_grows_with_level() {
        assert_eq!(explosion_range(0), 0.0);
        assert!(explosion_range(2) > explosion_range(1));
    }

    #[test]
    fn names_and_subtitles() {
        assert_eq!(ShurikenPowerUp::MoonShoes.name(), "Moon Shoes");
        assert_eq!(ShurikenPowerUp::Amphetamines.subtitle(), "Gotta go fast");
    }
}
