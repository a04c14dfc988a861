use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::authority::Authority;
use crate::net::messages::{CommitMsg, ObjectId};
use crate::net::outbox::Outbox;
use crate::net::protocol::{self, ProtocolError};

/// Errors raised when writing or applying replicated state.
#[derive(Debug)]
pub enum ReplicaError {
    /// The authority token does not cover this object.
    NotAuthority(ObjectId),
    /// A commit addressed to another object was applied here.
    WrongObject { expected: ObjectId, got: ObjectId },
    Protocol(ProtocolError),
}

impl std::fmt::Display for ReplicaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthority(object) => write!(f, "not the authority for {object:?}"),
            Self::WrongObject { expected, got } => {
                write!(f, "commit for {got:?} applied to {expected:?}")
            },
            Self::Protocol(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ReplicaError {}

impl From<ProtocolError> for ReplicaError {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

/// One participant's copy of an object's replicated fields.
///
/// Only the owner writes, and every write is published with [`Replica::commit`].
/// Replicas overwrite the whole value on [`Replica::apply`]. Both paths raise
/// the reconcile flag, so the owner re-derives its local view from the same
/// state everyone else sees.
#[derive(Debug, Clone)]
pub struct Replica<T> {
    object: ObjectId,
    value: T,
    reconcile_pending: bool,
}

impl<T: Serialize + DeserializeOwned> Replica<T> {
    pub fn new(object: ObjectId, value: T) -> Self {
        Self {
            object,
            value,
            reconcile_pending: false,
        }
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Mutable access, only for the object's authority.
    pub fn write(&mut self, auth: &Authority) -> Option<&mut T> {
        auth.covers(self.object).then_some(&mut self.value)
    }

    /// Publish the current value to every other holder.
    pub fn commit<P>(&mut self, auth: &Authority, outbox: &mut Outbox<P>) -> Result<(), ReplicaError> {
        if !auth.covers(self.object) {
            return Err(ReplicaError::NotAuthority(self.object));
        }
        let payload = protocol::encode_state(&self.value)?;
        outbox.push_commit(self.object, payload);
        self.reconcile_pending = true;
        Ok(())
    }

    /// Overwrite the local value with a received commit.
    pub fn apply(&mut self, msg: &CommitMsg) -> Result<(), ReplicaError> {
        if msg.object != self.object {
            return Err(ReplicaError::WrongObject {
                expected: self.object,
                got: msg.object,
            });
        }
        self.value = protocol::decode_state(&msg.payload)?;
        self.reconcile_pending = true;
        Ok(())
    }

    /// Whether the value changed since the last reconcile. Clears the flag.
    pub fn take_reconcile(&mut self) -> bool {
        std::mem::take(&mut self.reconcile_pending)
    }
}
