use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use shuriken_core::slots::SlotIndex;

use crate::pose::Vec3;

/// Playable locations. `Lobby` is where players gather between games.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    #[default]
    Lobby,
    Ruins,
    Foundations,
    FrozenBay,
}

impl Level {
    pub const ALL: [Level; 4] = [
        Level::Lobby,
        Level::Ruins,
        Level::Foundations,
        Level::FrozenBay,
    ];

    /// Levels a round can be played on.
    pub const ARENAS: [Level; 3] = [Level::Ruins, Level::Foundations, Level::FrozenBay];

    /// File stem used when loading a layout from disk.
    pub fn file_stem(self) -> &'static str {
        match self {
            Level::Lobby => "lobby",
            Level::Ruins => "ruins",
            Level::Foundations => "foundations",
            Level::FrozenBay => "frozen_bay",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Level::Lobby => "Lobby",
            Level::Ruins => "Ruins",
            Level::Foundations => "Foundations",
            Level::FrozenBay => "Frozen Bay",
        }
    }
}

/// Marker positions for one level.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LevelLayout {
    pub spawn_markers: Vec<Vec3>,
    pub power_up_markers: Vec<Vec3>,
    #[serde(default)]
    pub target_markers: Vec<Vec3>,
}

/// Layouts for every level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelCatalog {
    layouts: HashMap<Level, LevelLayout>,
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::generated()
    }
}

impl LevelCatalog {
    /// Built-in layouts for every level.
    pub fn generated() -> Self {
        let layouts = Level::ALL
            .into_iter()
            .map(|level| (level, generate_layout(level)))
            .collect();
        Self { layouts }
    }

    /// Load layouts, preferring JSON files from the levels directory.
    ///
    /// Checks env var `SHURIKEN_LEVELS_DIR` (default `config/levels`) for files
    /// named `{level}.json` (e.g. `ruins.json`, `frozen_bay.json`). Any level
    /// whose file is missing or unparseable uses the generated layout.
    pub fn load() -> Self {
        let dir =
            std::env::var("SHURIKEN_LEVELS_DIR").unwrap_or_else(|_| "config/levels".to_string());
        let layouts = Level::ALL
            .into_iter()
            .map(|level| {
                let path = format!("{dir}/{}.json", level.file_stem());
                let layout =
                    load_layout_from_file(&path).unwrap_or_else(|| generate_layout(level));
                (level, layout)
            })
            .collect();
        Self { layouts }
    }

    /// Replace one level's layout.
    pub fn with_layout(mut self, level: Level, layout: LevelLayout) -> Self {
        self.layouts.insert(level, layout);
        self
    }

    pub fn layout(&self, level: Level) -> Option<&LevelLayout> {
        self.layouts.get(&level)
    }

    /// Spawn point for a slot: markers are shared round-robin by slot index.
    pub fn spawn_position(&self, level: Level, slot: SlotIndex) -> Option<Vec3> {
        let markers = &self.layout(level)?.spawn_markers;
        if markers.is_empty() {
            tracing::error!(?level, "Level has no spawn markers");
            return None;
        }
        Some(markers[slot % markers.len()])
    }

    pub fn power_up_markers(&self, level: Level) -> &[Vec3] {
        self.layout(level)
            .map(|l| l.power_up_markers.as_slice())
            .unwrap_or(&[])
    }

    pub fn target_markers(&self, level: Level) -> &[Vec3] {
        self.layout(level)
            .map(|l| l.target_markers.as_slice())
            .unwrap_or(&[])
    }
}

/// Pick the next round's level: any arena other than `current`.
pub fn random_level(current: Level, rng: &mut impl Rng) -> Level {
    let candidates: Vec<Level> = Level::ARENAS
        .into_iter()
        .filter(|l| *l != current)
        .collect();
    candidates[rng.random_range(0..candidates.len())]
}

/// Try to load a layout from a JSON file.
pub fn load_layout_from_file(path: &str) -> Option<LevelLayout> {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<LevelLayout>(&content) {
            Ok(layout) => Some(layout),
            Err(e) => {
                tracing::warn!("Failed to parse {path}: {e}");
                None
            },
        },
        Err(_) => None,
    }
}

/// Generate a layout: spawn markers on a ring, power-up markers on a smaller one.
pub fn generate_layout(level: Level) -> LevelLayout {
    let (radius, height, spawns, power_ups) = match level {
        Level::Lobby => (4.0, 0.0, 8, 1),
        Level::Ruins => (14.0, 0.5, 8, 4),
        Level::Foundations => (18.0, 2.0, 8, 5),
        Level::FrozenBay => (22.0, 0.0, 8, 6),
    };
    let spawn_markers = ring(radius, height, spawns);
    let power_up_markers = if level == Level::Lobby {
        vec![Vec3::new(-1.0, 1.0, -0.3)]
    } else {
        ring(radius * 0.4, height + 1.0, power_ups)
    };
    let target_markers = if level == Level::Lobby {
        vec![
            Vec3::new(-6.0, 1.5, 8.0),
            Vec3::new(0.0, 2.5, 10.0),
            Vec3::new(6.0, 1.5, 8.0),
            Vec3::new(3.0, 3.5, 12.0),
        ]
    } else {
        Vec::new()
    };
    LevelLayout {
        spawn_markers,
        power_up_markers,
        target_markers,
    }
}

fn ring(radius: f32, height: f32, count: usize) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let angle = std::f32::consts::TAU * i as f32 / count as f32;
            Vec3::new(radius * angle.cos(), height, radius * angle.sin())
        })
        .collect()
}
