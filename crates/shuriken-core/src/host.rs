//! Primitives consumed from the host platform. The core never implements
//! these; hosts (and tests) plug their own in.

use crate::net::messages::ObjectId;
use crate::player::{Player, PlayerId};

/// Player identity lookup.
pub trait IdentityResolver: Send + Sync {
    /// Identity metadata for `id`, or `None` if the player is unknown or gone.
    fn resolve(&self, id: PlayerId) -> Option<Player>;

    /// Display name with a placeholder for unknown players.
    fn display_name(&self, id: PlayerId) -> String {
        self.resolve(id)
            .map(|p| p.display_name)
            .unwrap_or_else(|| format!("Player {id}"))
    }
}

/// Networked-object ownership as seen from one participant.
pub trait Ownership: Send + Sync {
    /// Identity of the participant this view belongs to.
    fn local_player(&self) -> PlayerId;

    /// Current owner of `object`, if it has one.
    fn owner_of(&self, object: ObjectId) -> Option<PlayerId>;

    /// Ask the platform to hand `object` to `to`. Takes effect asynchronously.
    fn request_transfer(&self, object: ObjectId, to: PlayerId);

    fn is_owner(&self, object: ObjectId) -> bool {
        self.owner_of(object) == Some(self.local_player())
    }
}
