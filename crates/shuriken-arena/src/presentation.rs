//! Sinks for everything a participant shows locally. The arena never reads
//! back from these; hosts render however they like.

use serde::{Deserialize, Serialize};

use shuriken_core::player::PlayerColor;
use shuriken_core::slots::SlotIndex;
use shuriken_core::time::Millis;

use crate::level::Level;
use crate::lobby::LobbyView;
use crate::phase::Phase;
use crate::pose::Vec3;
use crate::powerups::Locomotion;

/// Fade in/out time for overlays.
pub const UI_FADE_MS: Millis = 200;

/// Full-screen message: a small top line, a highlighted name, then two lines of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub top: String,
    pub highlight: String,
    pub middle: String,
    pub bottom: String,
    pub highlight_color: Option<PlayerColor>,
    pub duration_ms: Millis,
}

/// One row of the scoreboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreLine {
    pub slot: SlotIndex,
    pub name: String,
    pub score: u32,
    pub lives: u8,
    pub color: PlayerColor,
}

/// Heads-up display for the local player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    pub score: String,
    pub lives: u8,
    pub power_ups: String,
}

/// Local presentation layer. Every method defaults to doing nothing.
pub trait Presentation: Send {
    fn set_phase(&mut self, _phase: Phase) {}

    /// Swap scenery and music to `level`.
    fn show_level(&mut self, _level: Level) {}

    fn set_hud(&mut self, _hud: &Hud) {}

    fn show_banner(&mut self, _banner: &Banner) {}

    fn show_scoreboard(&mut self, _lines: &[ScoreLine], _duration_ms: Millis) {}

    fn set_lobby(&mut self, _view: &LobbyView) {}

    /// Move the local player's avatar.
    fn teleport_local_player(&mut self, _position: Vec3) {}

    /// Movement parameters for the local player's avatar.
    fn set_locomotion(&mut self, _locomotion: &Locomotion) {}

    fn play_explosion(&mut self, _position: Vec3, _radius: f32) {}
}

/// Presentation that drops everything. Used by headless hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresentation;

impl Presentation for NullPresentation {}

/// Timing of one overlay (banner or scoreboard), including its fades.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlay {
    shown_at: Millis,
    hide_at: Millis,
}

impl Overlay {
    pub fn new(now: Millis, duration_ms: Millis) -> Self {
        let shown_at = now + UI_FADE_MS;
        Self {
            shown_at,
            hide_at: shown_at + duration_ms + UI_FADE_MS,
        }
    }

    /// Opacity at `now`, fading in before and out after the visible window.
    pub fn alpha(&self, now: Millis) -> f32 {
        if now >= self.hide_at {
            return 0.0;
        }
        if now < self.shown_at {
            let left = self.shown_at - now;
            return 1.0 - left as f32 / UI_FADE_MS as f32;
        }
        let until_hidden = self.hide_at - now;
        if until_hidden < UI_FADE_MS {
            until_hidden as f32 / UI_FADE_MS as f32
        } else {
            1.0
        }
    }

    pub fn is_finished(&self, now: Millis) -> bool {
        now >= self.hide_at
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub use recording::{PresentationEvent, RecordingPresentation};

#[cfg(any(test, feature = "test-helpers"))]
mod recording {
    use std::sync::{Arc, Mutex, MutexGuard};

    use super::*;

    /// Everything a [`RecordingPresentation`] was asked to show.
    #[derive(Debug, Clone, PartialEq)]
    pub enum PresentationEvent {
        Phase(Phase),
        Level(Level),
        Hud(Hud),
        Banner(Banner),
        Scoreboard(Vec<ScoreLine>),
        Lobby(LobbyView),
        Teleport(Vec3),
        Locomotion(Locomotion),
        Explosion(Vec3, f32),
    }

    /// Presentation that records calls. Clones share the same log.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingPresentation {
        events: Arc<Mutex<Vec<PresentationEvent>>>,
    }

    impl RecordingPresentation {
        pub fn new() -> Self {
            Self::default()
        }

        fn log(&self) -> MutexGuard<'_, Vec<PresentationEvent>> {
            self.events.lock().unwrap_or_else(|e| e.into_inner())
        }

        pub fn events(&self) -> Vec<PresentationEvent> {
            self.log().clone()
        }

        pub fn clear(&self) {
            self.log().clear();
        }

        pub fn banners(&self) -> Vec<Banner> {
            self.log()
                .iter()
                .filter_map(|e| match e {
                    PresentationEvent::Banner(b) => Some(b.clone()),
                    _ => None,
                })
                .collect()
        }

        pub fn last_hud(&self) -> Option<Hud> {
            self.log().iter().rev().find_map(|e| match e {
                PresentationEvent::Hud(h) => Some(h.clone()),
                _ => None,
            })
        }

        pub fn last_lobby(&self) -> Option<LobbyView> {
            self.log().iter().rev().find_map(|e| match e {
                PresentationEvent::Lobby(v) => Some(v.clone()),
                _ => None,
            })
        }

        pub fn teleports(&self) -> Vec<Vec3> {
            self.log()
                .iter()
                .filter_map(|e| match e {
                    PresentationEvent::Teleport(p) => Some(*p),
                    _ => None,
                })
                .collect()
        }

        fn push(&mut self, event: PresentationEvent) {
            self.log().push(event);
        }
    }

    impl Presentation for RecordingPresentation {
        fn set_phase(&mut self, phase: Phase) {
            self.push(PresentationEvent::Phase(phase));
        }

        fn show_level(&mut self, level: Level) {
            self.push(PresentationEvent::Level(level));
        }

        fn set_hud(&mut self, hud: &Hud) {
            self.push(PresentationEvent::Hud(hud.clone()));
        }

        fn show_banner(&mut self, banner: &Banner) {
            self.push(PresentationEvent::Banner(banner.clone()));
        }

        fn show_scoreboard(&mut self, lines: &[ScoreLine], _duration_ms: Millis) {
            self.push(PresentationEvent::Scoreboard(lines.to_vec()));
        }

        fn set_lobby(&mut self, view: &LobbyView) {
            self.push(PresentationEvent::Lobby(view.clone()));
        }

        fn teleport_local_player(&mut self, position: Vec3) {
            self.push(PresentationEvent::Teleport(position));
        }

        fn set_locomotion(&mut self, locomotion: &Locomotion) {
            self.push(PresentationEvent::Locomotion(*locomotion));
        }

        fn play_explosion(&mut self, position: Vec3, radius: f32) {
            self.push(PresentationEvent::Explosion(position, radius));
        }
    }
}
