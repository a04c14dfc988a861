use serde::{Deserialize, Serialize};

use super::messages::{CommitMsg, Envelope, ObjectId, RpcTarget};
use crate::player::PlayerId;

/// One message produced during a tick, waiting for the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outbound<P> {
    Commit(CommitMsg),
    Rpc(Envelope<P>),
}

/// Messages queued by one participant during a tick.
///
/// Nothing here blocks or waits for acknowledgement; the host drains the
/// outbox after each tick and hands everything to the transport.
#[derive(Debug)]
pub struct Outbox<P> {
    sender: PlayerId,
    items: Vec<Outbound<P>>,
}

impl<P> Outbox<P> {
    pub fn new(sender: PlayerId) -> Self {
        Self {
            sender,
            items: Vec::new(),
        }
    }

    pub fn sender(&self) -> PlayerId {
        self.sender
    }

    /// Invoke `procedure` on every holder of `object`.
    pub fn broadcast(&mut self, object: ObjectId, procedure: P) {
        self.send(object, RpcTarget::All, procedure);
    }

    /// Invoke `procedure` only on the holder that owns `object`.
    pub fn to_owner(&mut self, object: ObjectId, procedure: P) {
        self.send(object, RpcTarget::Owner, procedure);
    }

    pub fn send(&mut self, object: ObjectId, target: RpcTarget, procedure: P) {
        self.items.push(Outbound::Rpc(Envelope {
            object,
            target,
            sender: self.sender,
            procedure,
        }));
    }

    pub fn push_commit(&mut self, object: ObjectId, payload: Vec<u8>) {
        self.items.push(Outbound::Commit(CommitMsg {
            object,
            sender: self.sender,
            payload,
        }));
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, Outbound<P>> {
        self.items.drain(..)
    }

    pub fn items(&self) -> &[Outbound<P>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// RPC envelopes currently queued, in send order.
    pub fn rpcs(&self) -> impl Iterator<Item = &Envelope<P>> {
        self.items.iter().filter_map(|m| match m {
            Outbound::Rpc(env) => Some(env),
            Outbound::Commit(_) => None,
        })
    }

    pub fn commits(&self) -> impl Iterator<Item = &CommitMsg> {
        self.items.iter().filter_map(|m| match m {
            Outbound::Commit(c) => Some(c),
            Outbound::Rpc(_) => None,
        })
    }
}
