use rand::Rng;
use serde::{Deserialize, Serialize};

use shuriken_core::authority::Authority;
use shuriken_core::net::messages::{CommitMsg, ObjectId};
use shuriken_core::replica::{Replica, ReplicaError};

use crate::pose::Vec3;
use crate::procedure::ArenaOutbox;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetState {
    pub marker: usize,
    pub hits: u32,
}

/// Practice target in the lobby that hops to another marker when struck.
#[derive(Debug, Clone)]
pub struct Target {
    index: u8,
    markers: Vec<Vec3>,
    state: Replica<TargetState>,
}

impl Target {
    pub fn new(index: u8, markers: Vec<Vec3>) -> Self {
        let marker = if markers.is_empty() {
            0
        } else {
            usize::from(index) % markers.len()
        };
        Self {
            index,
            markers,
            state: Replica::new(ObjectId::Target(index), TargetState { marker, hits: 0 }),
        }
    }

    pub fn object(&self) -> ObjectId {
        ObjectId::Target(self.index)
    }

    pub fn state(&self) -> &TargetState {
        self.state.get()
    }

    pub fn position(&self) -> Option<Vec3> {
        self.markers.get(self.state.get().marker).copied()
    }

    /// Move to a different random marker and publish it. Owner only.
    pub fn hit(
        &mut self,
        auth: &Authority,
        rng: &mut impl Rng,
        outbox: &mut ArenaOutbox,
    ) -> Result<usize, ReplicaError> {
        let count = self.markers.len();
        let Some(state) = self.state.write(auth) else {
            return Err(ReplicaError::NotAuthority(ObjectId::Target(self.index)));
        };
        if count > 1 {
            let next = rng.random_range(0..count - 1);
            state.marker = if next >= state.marker { next + 1 } else { next };
        }
        state.hits += 1;
        let marker = state.marker;
        self.state.commit(auth, outbox)?;
        tracing::debug!(target_index = self.index, marker, "Target moved");
        Ok(marker)
    }

    pub fn apply_commit(&mut self, msg: &CommitMsg) -> Result<(), ReplicaError> {
        self.state.apply(msg)
    }

    pub fn take_reconcile(&mut self) -> bool {
        self.state.take_reconcile()
    }
}
