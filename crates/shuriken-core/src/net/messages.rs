use serde::{Deserialize, Serialize};

use crate::player::PlayerId;

/// Network message type discriminator (first byte on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    // Authority -> replicas
    Commit = 0x01,
    // Any -> all holders, or -> the owning holder
    Rpc = 0x02,
}

impl MessageType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::Commit),
            0x02 => Some(Self::Rpc),
            _ => None,
        }
    }
}

/// Identifies one networked object. Every participant holds a replica of
/// every object; exactly one participant owns each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectId {
    /// The session / round state machine.
    GameLogic,
    /// The projectile bound to a slot.
    Projectile(u8),
    /// The hit collider that follows the player in a slot.
    Collider(u8),
    /// A practice target.
    Target(u8),
}

/// Fan-out of a remote procedure call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcTarget {
    /// Every current holder of the object, including the sender.
    All,
    /// Only the holder that owns the object.
    Owner,
}

/// A named procedure addressed to one networked object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<P> {
    pub object: ObjectId,
    pub target: RpcTarget,
    pub sender: PlayerId,
    pub procedure: P,
}

/// A state push for one object: the full replicated field set, encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMsg {
    pub object: ObjectId,
    pub sender: PlayerId,
    pub payload: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_type_from_byte() {
        assert_eq!(MessageType::from_byte(0x01), Some(MessageType::Commit));
        assert_eq!(MessageType::from_byte(0x02), Some(MessageType::Rpc));
        assert_eq!(MessageType::from_byte(0x00), None);
        assert_eq!(MessageType::from_byte(0xff), None);
    }

    #[test]
    fn object_ids_order_session_first() {
        let mut ids = vec![
            ObjectId::Collider(0),
            ObjectId::Projectile(1),
            ObjectId::GameLogic,
        ];
        ids.sort();
        assert_eq!(ids[0], ObjectId::GameLogic);
    }
}
