use serde::{Deserialize, Serialize};

/// Stable external identity of a participant, issued by the host platform.
pub type PlayerId = u64;

/// Identity metadata resolved for a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
}

impl Player {
    pub fn new(id: PlayerId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

/// Slot colour used for projectiles, HUD highlights and the scoreboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for PlayerColor {
    fn default() -> Self {
        Self::PALETTE[0]
    }
}

impl PlayerColor {
    /// One colour per slot, in slot order.
    pub const PALETTE: &[PlayerColor] = &[
        PlayerColor {
            r: 255,
            g: 76,
            b: 76,
        }, // Red
        PlayerColor {
            r: 102,
            g: 153,
            b: 255,
        }, // Blue
        PlayerColor {
            r: 111,
            g: 227,
            b: 91,
        }, // Green
        PlayerColor {
            r: 255,
            g: 207,
            b: 63,
        }, // Yellow
        PlayerColor {
            r: 213,
            g: 128,
            b: 255,
        }, // Purple
        PlayerColor {
            r: 255,
            g: 153,
            b: 102,
        }, // Orange
        PlayerColor {
            r: 98,
            g: 221,
            b: 243,
        }, // Cyan
        PlayerColor {
            r: 255,
            g: 128,
            b: 191,
        }, // Pink
    ];

    /// Colour for a slot index, wrapping past the end of the palette.
    pub fn for_slot(slot: usize) -> Self {
        Self::PALETTE[slot % Self::PALETTE.len()]
    }

    /// Blend 30% towards black; used for text on light UI backgrounds.
    pub fn darkened(self) -> Self {
        let f = |c: u8| (c as f32 * 0.7).round() as u8;
        Self {
            r: f(self.r),
            g: f(self.g),
            b: f(self.b),
        }
    }

    /// `#rrggbb` form for rich-text markup.
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_covers_default_capacity() {
        assert_eq!(PlayerColor::PALETTE.len(), 8);
    }

    #[test]
    fn for_slot_wraps() {
        assert_eq!(PlayerColor::for_slot(8), PlayerColor::for_slot(0));
        assert_eq!(PlayerColor::for_slot(3), PlayerColor::PALETTE[3]);
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(PlayerColor::for_slot(0).hex(), "#ff4c4c");
        assert_eq!(PlayerColor::for_slot(1).hex(), "#6699ff");
    }

    #[test]
    fn darkened_is_darker() {
        let c = PlayerColor::for_slot(2);
        let d = c.darkened();
        assert!(d.r <= c.r && d.g <= c.g && d.b <= c.b);
        assert_eq!(d.g, 159);
    }
}
