use rand::rngs::StdRng;

use shuriken_core::host::IdentityResolver;
use shuriken_core::player::PlayerId;

use crate::config::ArenaConfig;
use crate::level::{Level, LevelCatalog};
use crate::presentation::Presentation;
use crate::procedure::Procedure;
use crate::session::{Session, Winner};
use crate::stats::PlayerStats;

/// Local services handed to an object while it handles a broadcast.
pub struct RoundContext<'a> {
    pub local: PlayerId,
    /// Whether the local participant owns the object being notified.
    pub is_owner: bool,
    pub session: &'a Session,
    pub config: &'a ArenaConfig,
    pub levels: &'a LevelCatalog,
    pub identity: &'a dyn IdentityResolver,
    pub presentation: &'a mut dyn Presentation,
    pub stats: &'a mut PlayerStats,
    pub rng: &'a mut StdRng,
}

/// An object that follows the round lifecycle.
pub trait RoundListener {
    fn on_round_start(&mut self, level: Level, round: u32, ctx: &mut RoundContext<'_>);
    fn on_fighting_start(&mut self, ctx: &mut RoundContext<'_>);
    fn on_round_end(&mut self, ctx: &mut RoundContext<'_>);
    fn on_game_end(&mut self, winner: Option<Winner>, ctx: &mut RoundContext<'_>);
}

/// Route a lifecycle procedure to `listener`. Returns `false` for anything else.
pub fn dispatch_lifecycle(
    listener: &mut dyn RoundListener,
    procedure: &Procedure,
    ctx: &mut RoundContext<'_>,
) -> bool {
    match *procedure {
        Procedure::RoundStart { level, round } => listener.on_round_start(level, round, ctx),
        Procedure::FightingStart => listener.on_fighting_start(ctx),
        Procedure::RoundEnd => listener.on_round_end(ctx),
        Procedure::GameEnd { winner } => listener.on_game_end(winner, ctx),
        _ => return false,
    }
    true
}
