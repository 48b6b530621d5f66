//! Actor identity and allocation.
//!
//! An [`Actor`] is a lightweight `u64` identifier with no inherent data.
//! Attributes are attached to actors to give them meaning.

use serde::{Deserialize, Serialize};

/// A unique actor identifier.
///
/// Actors are pure identifiers — they carry no data of their own. Existence
/// is defined solely by membership in the store's live set, and an identifier
/// is never reused once the actor has been destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Actor(pub u64);

impl Actor {
    /// Create an actor handle from a raw `u64` identifier.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Actor({})", self.0)
    }
}

/// Allocates monotonically increasing actor IDs, starting at 0.
///
/// The counter only ever moves forward: destroyed actors are never recycled,
/// and restoring a snapshot advances the counter past the highest restored ID
/// via [`ActorAllocator::reserve_past`].
#[derive(Debug, Default)]
pub struct ActorAllocator {
    next_id: u64,
}

impl ActorAllocator {
    /// Creates a new allocator. The first allocated actor is `Actor(0)`.
    #[must_use]
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Allocates a fresh actor ID.
    pub fn allocate(&mut self) -> Actor {
        let id = self.next_id;
        self.next_id += 1;
        Actor(id)
    }

    /// Advance the counter so that `id` can never be handed out again.
    ///
    /// No-op if the counter is already past `id`.
    pub fn reserve_past(&mut self, id: Actor) {
        self.next_id = self.next_id.max(id.0 + 1);
    }

    /// Returns the number of IDs allocated so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_starts_at_zero() {
        let mut alloc = ActorAllocator::new();
        assert_eq!(alloc.allocate(), Actor(0));
    }

    #[test]
    fn test_allocator_produces_strictly_increasing_ids() {
        let mut alloc = ActorAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        let c = alloc.allocate();
        assert!(a < b && b < c);
        assert_eq!(alloc.count(), 3);
    }

    #[test]
    fn test_reserve_past_advances_counter() {
        let mut alloc = ActorAllocator::new();
        alloc.reserve_past(Actor(9));
        assert_eq!(alloc.allocate(), Actor(10));
    }

    #[test]
    fn test_reserve_past_never_rewinds() {
        let mut alloc = ActorAllocator::new();
        for _ in 0..5 {
            alloc.allocate();
        }
        alloc.reserve_past(Actor(1));
        assert_eq!(alloc.allocate(), Actor(5));
    }
}
