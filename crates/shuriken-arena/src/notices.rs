use rand::Rng;

use shuriken_core::host::IdentityResolver;
use shuriken_core::player::{PlayerColor, PlayerId};
use shuriken_core::powerup::PowerUpKind;
use shuriken_core::slots::SlotIndex;
use shuriken_core::time::Millis;

use crate::powerups::{ShurikenPowerUp, ShurikenStack};
use crate::presentation::{Banner, Hud, ScoreLine};
use crate::session::Session;

pub const HIT_BANNER_MS: Millis = 1_500;
pub const KILL_BANNER_MS: Millis = 1_300;
pub const POWER_UP_BANNER_MS: Millis = 1_300;
pub const WINNER_BANNER_MS: Millis = 5_000;
pub const SCOREBOARD_MS: Millis = 3_000;

const LOSING_TAUNTS: &[&str] = &[
    "It wasn't even close...",
    "Better luck next time",
    "I bet they cheated",
    "That was a fluke",
];

const WINNING_TAUNTS: &[&str] = &[
    "It wasn't even close...",
    "What did they expect?",
    "Easy peasy",
];

fn remaining_text(remaining: usize) -> String {
    match remaining {
        0 => "No Players Remaining".to_string(),
        1 => "1 Player Remaining".to_string(),
        n => format!("{n} Players Remaining"),
    }
}

/// Shown to the player who was just hit. `None` once the round is decided,
/// since the round-end scoreboard follows.
pub fn hit_banner(attacker_name: &str, attacker_slot: Option<SlotIndex>, remaining: usize) -> Option<Banner> {
    if remaining == 0 {
        return None;
    }
    Some(Banner {
        top: "SLICED BY".to_string(),
        highlight: attacker_name.to_string(),
        middle: remaining_text(remaining),
        bottom: String::new(),
        highlight_color: attacker_slot.map(PlayerColor::for_slot),
        duration_ms: HIT_BANNER_MS,
    })
}

/// Shown to the player who just eliminated someone.
pub fn kill_banner(victim_name: &str, victim_slot: Option<SlotIndex>, remaining: usize) -> Option<Banner> {
    if remaining == 0 {
        return None;
    }
    Some(Banner {
        top: "YOU SLICED".to_string(),
        highlight: victim_name.to_string(),
        middle: remaining_text(remaining),
        bottom: String::new(),
        highlight_color: victim_slot.map(PlayerColor::for_slot),
        duration_ms: KILL_BANNER_MS,
    })
}

pub fn power_up_banner(kind: ShurikenPowerUp, stack: &ShurikenStack) -> Banner {
    let index = ShurikenPowerUp::ALL
        .iter()
        .position(|k| *k == kind)
        .unwrap_or_default();
    Banner {
        top: String::new(),
        highlight: kind.name().to_string(),
        middle: kind.subtitle().to_string(),
        bottom: format!("Equipped: {}", stack.describe()),
        highlight_color: Some(PlayerColor::for_slot(index)),
        duration_ms: POWER_UP_BANNER_MS,
    }
}

pub fn game_over_banner(
    winner_name: &str,
    winner_slot: SlotIndex,
    local_won: bool,
    rng: &mut impl Rng,
) -> Banner {
    let taunts = if local_won {
        WINNING_TAUNTS
    } else {
        LOSING_TAUNTS
    };
    Banner {
        top: "WINNER".to_string(),
        highlight: winner_name.to_string(),
        middle: taunts[rng.random_range(0..taunts.len())].to_string(),
        bottom: String::new(),
        highlight_color: Some(PlayerColor::for_slot(winner_slot)),
        duration_ms: WINNER_BANNER_MS,
    }
}

/// One line per active slot, in slot order.
pub fn scoreboard(session: &Session, identity: &dyn IdentityResolver) -> Vec<ScoreLine> {
    session
        .slots
        .occupants()
        .filter_map(|(slot, s)| {
            let player = s.occupant?;
            Some(ScoreLine {
                slot,
                name: identity.display_name(player),
                score: s.score,
                lives: s.lives,
                color: PlayerColor::for_slot(slot),
            })
        })
        .collect()
}

/// HUD power-up text: upper-case names in their colours, most recent first.
pub fn power_up_text(stack: &ShurikenStack) -> String {
    stack
        .iter()
        .map(|kind| {
            let index = ShurikenPowerUp::ALL
                .iter()
                .position(|k| *k == kind)
                .unwrap_or_default();
            format!(
                "<color={}>{}</color>",
                PlayerColor::for_slot(index).hex(),
                kind.name().to_uppercase()
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// HUD for the local player, or `None` when they are not joined.
pub fn hud(session: &Session, local: PlayerId, stack: &ShurikenStack) -> Option<Hud> {
    let slot = session.slots.get(session.slot_of(local)?)?;
    Some(Hud {
        score: format!("SCORE: {}/{}", slot.score, session.max_score),
        lives: slot.lives,
        power_ups: power_up_text(stack),
    })
}
