//! Platform services the relay provides: who owns which object, and who
//! each player is.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use shuriken_core::host::{IdentityResolver, Ownership};
use shuriken_core::net::messages::ObjectId;
use shuriken_core::player::{Player, PlayerId};

/// Instance-wide ownership table. Transfers take effect immediately.
#[derive(Debug, Clone, Default)]
pub struct OwnershipRegistry {
    owners: Arc<RwLock<HashMap<ObjectId, PlayerId>>>,
}

impl OwnershipRegistry {
    pub fn assign(&self, object: ObjectId, owner: PlayerId) {
        let mut owners = self.owners.write().unwrap_or_else(PoisonError::into_inner);
        if owners.insert(object, owner) != Some(owner) {
            tracing::trace!(?object, owner, "Ownership assigned");
        }
    }

    pub fn owner(&self, object: ObjectId) -> Option<PlayerId> {
        let owners = self.owners.read().unwrap_or_else(PoisonError::into_inner);
        owners.get(&object).copied()
    }

    /// Every object `player` holds goes to `heir`.
    pub fn reassign_all(&self, player: PlayerId, heir: PlayerId) -> usize {
        let mut owners = self.owners.write().unwrap_or_else(PoisonError::into_inner);
        let mut moved = 0;
        for owner in owners.values_mut().filter(|o| **o == player) {
            *owner = heir;
            moved += 1;
        }
        moved
    }

    /// The registry as seen from `local`'s participant.
    pub fn view(&self, local: PlayerId) -> PeerOwnership {
        PeerOwnership {
            local,
            registry: self.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PeerOwnership {
    local: PlayerId,
    registry: OwnershipRegistry,
}

impl Ownership for PeerOwnership {
    fn local_player(&self) -> PlayerId {
        self.local
    }

    fn owner_of(&self, object: ObjectId) -> Option<PlayerId> {
        self.registry.owner(object)
    }

    fn request_transfer(&self, object: ObjectId, to: PlayerId) {
        self.registry.assign(object, to);
    }
}

/// Everyone in the instance.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    players: Arc<HashMap<PlayerId, Player>>,
}

impl Roster {
    /// `count` bots with ids from 1.
    pub fn bots(count: usize) -> Self {
        let players = (1..=count as PlayerId)
            .map(|id| (id, Player::new(id, format!("Bot {id}"))))
            .collect();
        Self {
            players: Arc::new(players),
        }
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self.players.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl IdentityResolver for Roster {
    fn resolve(&self, id: PlayerId) -> Option<Player> {
        self.players.get(&id).cloned()
    }
}
