use serde::{Deserialize, Serialize};

/// Lifetime counters for the local player. Hosts persist these however they like.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub players_hit: u32,
    pub players_killed: u32,
    pub power_ups_collected: u32,
    pub targets_hit: u32,
    pub games_played: u32,
    pub games_won: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    PlayersHit,
    PlayersKilled,
    PowerUpsCollected,
    TargetsHit,
    GamesPlayed,
    GamesWon,
}

impl Stat {
    pub const ALL: [Stat; 6] = [
        Stat::PlayersHit,
        Stat::PlayersKilled,
        Stat::PowerUpsCollected,
        Stat::TargetsHit,
        Stat::GamesPlayed,
        Stat::GamesWon,
    ];

    /// Storage key.
    pub fn key(self) -> &'static str {
        match self {
            Stat::PlayersHit => "playersHit",
            Stat::PlayersKilled => "playersKilled",
            Stat::PowerUpsCollected => "powerUpsCollected",
            Stat::TargetsHit => "targetsHit",
            Stat::GamesPlayed => "gamesPlayed",
            Stat::GamesWon => "gamesWon",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stat::PlayersHit => "PLAYERS HIT",
            Stat::PlayersKilled => "PLAYERS KILLED",
            Stat::PowerUpsCollected => "POWER-UPS",
            Stat::TargetsHit => "TARGETS HIT",
            Stat::GamesPlayed => "GAMES PLAYED",
            Stat::GamesWon => "GAMES WON",
        }
    }
}

/// Width of one line on the stats board.
const LINE_WIDTH: usize = 19;

impl PlayerStats {
    pub fn get(&self, stat: Stat) -> u32 {
        match stat {
            Stat::PlayersHit => self.players_hit,
            Stat::PlayersKilled => self.players_killed,
            Stat::PowerUpsCollected => self.power_ups_collected,
            Stat::TargetsHit => self.targets_hit,
            Stat::GamesPlayed => self.games_played,
            Stat::GamesWon => self.games_won,
        }
    }

    pub fn increment(&mut self, stat: Stat) {
        let counter = match stat {
            Stat::PlayersHit => &mut self.players_hit,
            Stat::PlayersKilled => &mut self.players_killed,
            Stat::PowerUpsCollected => &mut self.power_ups_collected,
            Stat::TargetsHit => &mut self.targets_hit,
            Stat::GamesPlayed => &mut self.games_played,
            Stat::GamesWon => &mut self.games_won,
        };
        *counter = counter.saturating_add(1);
        tracing::debug!(stat = stat.key(), value = *counter, "Stat incremented");
    }

    /// Stats board text, label left and value right-aligned.
    pub fn lines(&self) -> Vec<String> {
        Stat::ALL
            .into_iter()
            .map(|stat| {
                let label = stat.label();
                let value = self.get(stat).to_string();
                let pad = LINE_WIDTH.saturating_sub(label.len() + 1);
                format!("{label}:{value:>pad$}")
            })
            .collect()
    }
}
