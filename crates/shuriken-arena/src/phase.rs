use serde::{Deserialize, Serialize};

/// Phase of the session-wide state machine.
///
/// `Lobby -> RoundStarting -> Fighting -> RoundEnding -> RoundStarting ...`
/// until a winner is found, then `Fighting -> GameEnding -> Lobby`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Lobby,
    RoundStarting,
    Fighting,
    RoundEnding,
    GameEnding,
}

impl Phase {
    /// True for every phase between a start request and the return to the lobby.
    pub fn in_match(self) -> bool {
        self != Phase::Lobby
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Lobby => "Lobby",
            Phase::RoundStarting => "Round starting",
            Phase::Fighting => "Fight!",
            Phase::RoundEnding => "Round over",
            Phase::GameEnding => "Game over",
        }
    }
}
