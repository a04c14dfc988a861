pub mod authority;
pub mod host;
pub mod net;
pub mod player;
pub mod powerup;
pub mod replica;
pub mod slots;
pub mod time;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use crate::host::{IdentityResolver, Ownership};
    use crate::net::messages::ObjectId;
    use crate::player::{Player, PlayerId};

    /// Create `n` test players with sequential IDs starting at 1.
    pub fn make_players(n: usize) -> Vec<Player> {
        (0..n)
            .map(|i| Player::new(i as PlayerId + 1, format!("Player{}", i + 1)))
            .collect()
    }

    /// Identity resolver backed by a fixed roster.
    #[derive(Debug, Clone, Default)]
    pub struct TestIdentity {
        players: HashMap<PlayerId, Player>,
    }

    impl TestIdentity {
        pub fn new(players: &[Player]) -> Self {
            Self {
                players: players.iter().map(|p| (p.id, p.clone())).collect(),
            }
        }
    }

    impl IdentityResolver for TestIdentity {
        fn resolve(&self, id: PlayerId) -> Option<Player> {
            self.players.get(&id).cloned()
        }
    }

    /// Ownership table shared by every participant in a test. Each clone made
    /// with [`TestOwnership::view`] answers `local_player` for a different
    /// participant but sees the same owners.
    #[derive(Debug, Clone)]
    pub struct TestOwnership {
        local: PlayerId,
        owners: Arc<Mutex<HashMap<ObjectId, PlayerId>>>,
    }

    impl TestOwnership {
        pub fn new(local: PlayerId) -> Self {
            Self {
                local,
                owners: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        pub fn view(&self, local: PlayerId) -> Self {
            Self {
                local,
                owners: Arc::clone(&self.owners),
            }
        }

        pub fn assign(&self, object: ObjectId, owner: PlayerId) {
            if let Ok(mut owners) = self.owners.lock() {
                owners.insert(object, owner);
            }
        }
    }

    impl Ownership for TestOwnership {
        fn local_player(&self) -> PlayerId {
            self.local
        }

        fn owner_of(&self, object: ObjectId) -> Option<PlayerId> {
            self.owners.lock().ok()?.get(&object).copied()
        }

        fn request_transfer(&self, object: ObjectId, to: PlayerId) {
            self.assign(object, to);
        }
    }
}
