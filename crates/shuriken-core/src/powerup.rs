use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Number of power-ups a projectile can hold at once.
pub const STACK_CAPACITY: usize = 3;

/// Trait for game-specific power-up kind enums.
pub trait PowerUpKind: Clone + Copy + PartialEq + Serialize + DeserializeOwned {
    /// Display name for banners and the HUD.
    fn name(&self) -> &'static str;

    /// One-line flavour text shown under the name when collected.
    fn subtitle(&self) -> &'static str;
}

/// Most-recent-first list of held power-ups.
///
/// Pushing onto a full stack drops the oldest entry. The stack carries no
/// effect state of its own; owners recompute effects from it from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PowerUpStack<K: PowerUpKind> {
    slots: [Option<K>; STACK_CAPACITY],
}

impl<K: PowerUpKind> Default for PowerUpStack<K> {
    fn default() -> Self {
        Self {
            slots: [None; STACK_CAPACITY],
        }
    }
}

impl<K: PowerUpKind> PowerUpStack<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the front, shifting the rest right. Returns the evicted entry.
    pub fn push(&mut self, kind: K) -> Option<K> {
        let evicted = self.slots[STACK_CAPACITY - 1];
        self.slots.copy_within(0..STACK_CAPACITY - 1, 1);
        self.slots[0] = Some(kind);
        evicted
    }

    pub fn clear(&mut self) {
        self.slots = [None; STACK_CAPACITY];
    }

    /// Held kinds, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.slots.iter().flatten().copied()
    }

    pub fn slots(&self) -> &[Option<K>; STACK_CAPACITY] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots[0].is_none()
    }

    /// Comma-separated display names, most recent first.
    pub fn describe(&self) -> String {
        self.iter().map(|k| k.name()).collect::<Vec<_>>().join(", ")
    }
}
