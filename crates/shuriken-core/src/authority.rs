use crate::host::Ownership;
use crate::net::messages::ObjectId;
use crate::player::PlayerId;

/// Proof that the local participant is the single writer for one object.
///
/// Mutating entry points take `&Authority` instead of querying ownership
/// themselves, so the precondition is visible in every signature. A token
/// only ever covers the object it was claimed for.
#[derive(Debug)]
pub struct Authority {
    object: ObjectId,
    holder: PlayerId,
}

impl Authority {
    /// Claim authority over `object` if the local participant owns it.
    pub fn claim(ownership: &dyn Ownership, object: ObjectId) -> Option<Self> {
        let local = ownership.local_player();
        (ownership.owner_of(object) == Some(local)).then_some(Self {
            object,
            holder: local,
        })
    }

    /// Build a token without consulting ownership.
    #[cfg(any(test, feature = "test-helpers"))]
    pub fn assume(object: ObjectId, holder: PlayerId) -> Self {
        Self { object, holder }
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn holder(&self) -> PlayerId {
        self.holder
    }

    pub fn covers(&self, object: ObjectId) -> bool {
        self.object == object
    }
}
