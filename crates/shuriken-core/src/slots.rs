use serde::{Deserialize, Serialize};

use crate::player::PlayerId;

/// Index into the slot table. Stable for the whole of a player's membership.
pub type SlotIndex = usize;

/// Default slot table capacity.
pub const DEFAULT_CAPACITY: usize = 8;

/// One joined player's match-scoped data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub occupant: Option<PlayerId>,
    pub lives: u8,
    pub score: u32,
}

impl Slot {
    pub fn is_active(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn is_alive(&self) -> bool {
        self.is_active() && self.lives > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotError {
    /// No vacant slot left.
    Full,
    /// The identity already occupies this slot.
    AlreadyJoined(SlotIndex),
    /// The identity does not occupy any slot.
    NotFound,
}

impl std::fmt::Display for SlotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "slot table is full"),
            Self::AlreadyJoined(slot) => write!(f, "already joined in slot {slot}"),
            Self::NotFound => write!(f, "player is not in the slot table"),
        }
    }
}

impl std::error::Error for SlotError {}

/// Outcome of landing a hit on a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitResult {
    /// Lives went from 1 to 0. The only outcome that grants kill credit.
    Eliminated,
    /// Lives decremented but the slot is still alive.
    Wounded { lives: u8 },
    /// Slot already had zero lives; nothing changed.
    AlreadyOut,
    /// Slot is not occupied; nothing changed.
    Vacant,
}

/// Fixed-capacity table mapping player identities to slots.
///
/// Indices never compact: when a player leaves, their slot is cleared in
/// place and the next joiner takes the first vacant index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTable {
    slots: Vec<Slot>,
}

impl Default for SlotTable {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SlotTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Slot::default(); capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, index: SlotIndex) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn find_slot(&self, id: PlayerId) -> Option<SlotIndex> {
        self.slots.iter().position(|s| s.occupant == Some(id))
    }

    pub fn occupant(&self, index: SlotIndex) -> Option<PlayerId> {
        self.slots.get(index).and_then(|s| s.occupant)
    }

    /// Claim the first vacant slot for `id`, starting it with `starting_lives`
    /// and a zero score.
    pub fn add_occupant(&mut self, id: PlayerId, starting_lives: u8) -> Result<SlotIndex, SlotError> {
        if let Some(existing) = self.find_slot(id) {
            return Err(SlotError::AlreadyJoined(existing));
        }
        let index = self
            .slots
            .iter()
            .position(|s| !s.is_active())
            .ok_or(SlotError::Full)?;
        self.slots[index] = Slot {
            occupant: Some(id),
            lives: starting_lives,
            score: 0,
        };
        Ok(index)
    }

    /// Clear the slot held by `id`. Other indices are untouched.
    pub fn remove_occupant(&mut self, id: PlayerId) -> Result<SlotIndex, SlotError> {
        let index = self.find_slot(id).ok_or(SlotError::NotFound)?;
        self.slots[index] = Slot::default();
        Ok(index)
    }

    pub fn occupant_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_active()).count()
    }

    pub fn alive_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_alive()).count()
    }

    /// Active slots with their indices.
    pub fn occupants(&self) -> impl Iterator<Item = (SlotIndex, &Slot)> {
        self.slots.iter().enumerate().filter(|(_, s)| s.is_active())
    }

    pub fn reset_lives(&mut self, starting_lives: u8) {
        for slot in self.slots.iter_mut().filter(|s| s.is_active()) {
            slot.lives = starting_lives;
        }
    }

    pub fn reset_scores(&mut self) {
        for slot in &mut self.slots {
            slot.score = 0;
        }
    }

    /// Take one life from `index`. A slot at zero lives is left untouched.
    pub fn hit(&mut self, index: SlotIndex) -> HitResult {
        let Some(slot) = self.slots.get_mut(index) else {
            return HitResult::Vacant;
        };
        if !slot.is_active() {
            return HitResult::Vacant;
        }
        match slot.lives {
            0 => HitResult::AlreadyOut,
            1 => {
                slot.lives = 0;
                HitResult::Eliminated
            },
            n => {
                slot.lives = n - 1;
                HitResult::Wounded { lives: n - 1 }
            },
        }
    }

    /// Add one to the score of `index`, returning the new score.
    pub fn credit_kill(&mut self, index: SlotIndex) -> Option<u32> {
        let slot = self.slots.get_mut(index).filter(|s| s.is_active())?;
        slot.score += 1;
        Some(slot.score)
    }

    /// Highest-scoring active slot whose score is at least `max_score`.
    /// Ties go to the lowest index.
    pub fn leader_at_or_above(&self, max_score: u32) -> Option<SlotIndex> {
        let mut best: Option<(SlotIndex, u32)> = None;
        for (i, slot) in self.occupants() {
            if slot.score >= max_score && best.is_none_or(|(_, s)| slot.score > s) {
                best = Some((i, slot.score));
            }
        }
        best.map(|(i, _)| i)
    }

    /// The single remaining alive slot, if exactly one is alive.
    pub fn last_alive(&self) -> Option<SlotIndex> {
        let mut alive = self.slots.iter().enumerate().filter(|(_, s)| s.is_alive());
        match (alive.next(), alive.next()) {
            (Some((i, _)), None) => Some(i),
            _ => None,
        }
    }
}
