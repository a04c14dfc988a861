//! In-process stand-in for the platform's message fabric.
//!
//! Broadcasts reach every peer, the sender included. Owner RPCs reach
//! whoever holds the object when the relay routes them.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use shuriken_arena::procedure::ArenaOutbound;
use shuriken_core::net::messages::{ObjectId, RpcTarget};
use shuriken_core::net::protocol::encode_outbound;
use shuriken_core::player::PlayerId;

use crate::peer::TickReport;
use crate::registry::OwnershipRegistry;

/// Where a message should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    All,
    Owner(ObjectId),
}

impl Route {
    pub fn of(msg: &ArenaOutbound) -> Self {
        match msg {
            ArenaOutbound::Rpc(env) if env.target == RpcTarget::Owner => Route::Owner(env.object),
            _ => Route::All,
        }
    }
}

/// An encoded message on its way through the relay.
#[derive(Debug, Clone)]
pub struct Routed {
    pub from: PlayerId,
    pub route: Route,
    /// `Bytes` so fanout clones share one buffer.
    pub data: Bytes,
}

/// Commands the driver and relay send to a peer task.
#[derive(Debug)]
pub enum PeerEvent {
    Tick(oneshot::Sender<TickReport>),
    Deliver(Bytes),
    /// The platform reports that a player disconnected.
    PlayerLeft(PlayerId),
    Stop,
}

/// Messages queued or being handled anywhere in the fabric. The driver
/// waits for zero before starting the next frame.
#[derive(Debug, Clone, Default)]
pub struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    pub fn add(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn done(&self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn is_idle(&self) -> bool {
        self.count() == 0
    }
}

/// Encode `msg` and hand it to the relay. Returns `false` if the relay is gone.
pub fn submit(
    relay: &mpsc::UnboundedSender<Routed>,
    in_flight: &InFlight,
    from: PlayerId,
    msg: &ArenaOutbound,
) -> bool {
    let data = match encode_outbound(msg) {
        Ok(data) => Bytes::from(data),
        Err(e) => {
            tracing::error!(error = %e, player_id = from, "Failed to encode outbound message");
            return true;
        },
    };
    in_flight.add();
    let routed = Routed {
        from,
        route: Route::of(msg),
        data,
    };
    if relay.send(routed).is_err() {
        in_flight.done();
        return false;
    }
    true
}

pub struct Relay {
    peers: HashMap<PlayerId, mpsc::UnboundedSender<PeerEvent>>,
    ownership: OwnershipRegistry,
    in_flight: InFlight,
}

impl Relay {
    pub fn new(
        peers: HashMap<PlayerId, mpsc::UnboundedSender<PeerEvent>>,
        ownership: OwnershipRegistry,
        in_flight: InFlight,
    ) -> Self {
        Self {
            peers,
            ownership,
            in_flight,
        }
    }

    /// Route until every sender is dropped.
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<Routed>) {
        while let Some(routed) = rx.recv().await {
            self.route(routed);
        }
        tracing::debug!("Relay closed");
    }

    pub fn route(&self, routed: Routed) {
        match routed.route {
            Route::All => {
                for tx in self.peers.values() {
                    self.forward(tx, &routed.data);
                }
            },
            Route::Owner(object) => match self
                .ownership
                .owner(object)
                .and_then(|owner| self.peers.get(&owner))
            {
                Some(tx) => self.forward(tx, &routed.data),
                None => {
                    tracing::warn!(?object, from = routed.from, "No owner to deliver to");
                },
            },
        }
        self.in_flight.done();
    }

    fn forward(&self, tx: &mpsc::UnboundedSender<PeerEvent>, data: &Bytes) {
        self.in_flight.add();
        if tx.send(PeerEvent::Deliver(data.clone())).is_err() {
            // Peer already left.
            self.in_flight.done();
        }
    }
}
