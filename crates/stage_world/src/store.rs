//! Live actor storage.
//!
//! The [`ActorStore`] owns the set of live actors and, per actor, its
//! [`AttributeMap`]. The two are a single `BTreeMap` so they can never drift
//! apart: an actor is live exactly when it has a map entry, and iteration
//! order is ID order, which equals creation order because IDs are allocated
//! monotonically.

use std::collections::BTreeMap;

use stage_actor::{Actor, ActorAllocator, Attribute, AttributeMap, AttributeSet, AttributeTag, BoxedAttribute};

use crate::error::StoreError;

/// The live actor set and each actor's attribute slots.
#[derive(Debug, Default)]
pub struct ActorStore {
    allocator: ActorAllocator,
    actors: BTreeMap<Actor, AttributeMap>,
}

impl ActorStore {
    /// Create a new empty store. The first spawned actor gets ID 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- Actor lifecycle --

    /// Spawn a new actor with the given initial attributes.
    ///
    /// Later duplicates of the same tag in `initial` overwrite earlier ones.
    /// Never fails.
    pub fn spawn(&mut self, initial: AttributeSet) -> Actor {
        let actor = self.allocator.allocate();
        self.actors.insert(actor, initial.into_map());
        actor
    }

    /// Returns `true` if the actor is in the live set.
    #[must_use]
    pub fn exists(&self, actor: Actor) -> bool {
        self.actors.contains_key(&actor)
    }

    /// Destroy an actor, dropping its attribute map with it.
    ///
    /// Idempotent: destroying an unknown or already-destroyed actor is a
    /// no-op. Returns `true` if the actor was live.
    pub fn despawn(&mut self, actor: Actor) -> bool {
        self.actors.remove(&actor).is_some()
    }

    // -- Attribute operations --

    /// Attach an attribute to a live actor, overwriting any existing slot of
    /// the same kind.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ActorNotFound`] if the actor is not live; no
    /// mutation occurs in that case.
    pub fn add<T: Attribute>(&mut self, actor: Actor, value: T) -> Result<(), StoreError> {
        self.add_boxed(actor, T::tag(), Box::new(value))
    }

    /// Type-erased variant of [`ActorStore::add`], used by deferred commands.
    pub fn add_boxed(
        &mut self,
        actor: Actor,
        tag: AttributeTag,
        value: BoxedAttribute,
    ) -> Result<(), StoreError> {
        let map = self
            .actors
            .get_mut(&actor)
            .ok_or(StoreError::ActorNotFound(actor))?;
        map.insert_boxed(tag, value);
        Ok(())
    }

    /// Read an attribute from a live actor.
    ///
    /// Absence of the attribute is not an error: `Ok(None)` means the actor
    /// is live but has no slot of this kind.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ActorNotFound`] if the actor is not live.
    pub fn get<T: Attribute>(&self, actor: Actor) -> Result<Option<&T>, StoreError> {
        let map = self
            .actors
            .get(&actor)
            .ok_or(StoreError::ActorNotFound(actor))?;
        Ok(map.get::<T>())
    }

    /// Mutable variant of [`ActorStore::get`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ActorNotFound`] if the actor is not live.
    pub fn get_mut<T: Attribute>(&mut self, actor: Actor) -> Result<Option<&mut T>, StoreError> {
        let map = self
            .actors
            .get_mut(&actor)
            .ok_or(StoreError::ActorNotFound(actor))?;
        Ok(map.get_mut::<T>())
    }

    /// Remove an attribute slot if present.
    ///
    /// Unlike `add`/`get`, this does not assert actor existence: removing an
    /// absent slot or a slot on an unknown actor is a silent no-op. Returns
    /// `true` if a value was actually removed.
    pub fn remove(&mut self, actor: Actor, tag: AttributeTag) -> bool {
        self.actors
            .get_mut(&actor)
            .is_some_and(|map| map.remove(tag))
    }

    /// Returns the attribute map of a live actor.
    #[must_use]
    pub fn attributes(&self, actor: Actor) -> Option<&AttributeMap> {
        self.actors.get(&actor)
    }

    // -- Iteration --

    /// Iterate over live actors in creation order.
    pub fn actors(&self) -> impl Iterator<Item = Actor> + '_ {
        self.actors.keys().copied()
    }

    /// Iterate over `(actor, attribute map)` pairs in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (Actor, &AttributeMap)> {
        self.actors.iter().map(|(a, m)| (*a, m))
    }

    /// Returns the number of live actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Returns `true` if no actors are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    // -- Snapshot support --

    /// Replace the entire live set with restored contents.
    ///
    /// The allocator is advanced past the highest restored ID so identifiers
    /// stay unique and monotonic across restores.
    pub fn restore(&mut self, actors: BTreeMap<Actor, AttributeMap>) {
        if let Some(max) = actors.keys().next_back().copied() {
            self.allocator.reserve_past(max);
        }
        self.actors = actors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Position {
        x: f32,
        y: f32,
    }

    impl Attribute for Position {
        fn type_name() -> &'static str {
            "Position"
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Health(u32);

    impl Attribute for Health {
        fn type_name() -> &'static str {
            "Health"
        }
    }

    #[test]
    fn test_spawn_ids_are_distinct_and_increasing_from_zero() {
        let mut store = ActorStore::new();
        let a = store.spawn(AttributeSet::new());
        let b = store.spawn(AttributeSet::new());
        let c = store.spawn(AttributeSet::new());
        assert_eq!((a, b, c), (Actor(0), Actor(1), Actor(2)));
    }

    #[test]
    fn test_spawn_with_initial_attributes() {
        let mut store = ActorStore::new();
        let a = store.spawn(
            AttributeSet::new()
                .with(Position { x: 0.0, y: 0.0 })
                .with(Health(100)),
        );
        assert!(store.exists(a));
        assert_eq!(store.get::<Health>(a).unwrap(), Some(&Health(100)));
    }

    #[test]
    fn test_despawn_is_idempotent_and_ids_not_reused() {
        let mut store = ActorStore::new();
        let a = store.spawn(AttributeSet::new());
        assert!(store.despawn(a));
        assert!(!store.despawn(a));
        assert!(!store.exists(a));
        // The next id continues past the destroyed one.
        assert_eq!(store.spawn(AttributeSet::new()), Actor(1));
    }

    #[test]
    fn test_add_to_unknown_actor_is_a_precondition_error() {
        let mut store = ActorStore::new();
        let err = store.add(Actor(99), Health(1)).unwrap_err();
        assert!(matches!(err, StoreError::ActorNotFound(Actor(99))));
    }

    #[test]
    fn test_get_distinguishes_missing_actor_from_absent_attribute() {
        let mut store = ActorStore::new();
        let a = store.spawn(AttributeSet::new());
        assert_eq!(store.get::<Health>(a).unwrap(), None);
        store.despawn(a);
        assert!(store.get::<Health>(a).is_err());
    }

    #[test]
    fn test_add_overwrites_existing_slot() {
        let mut store = ActorStore::new();
        let a = store.spawn(AttributeSet::new().with(Position { x: 0.0, y: 0.0 }));
        store.add(a, Position { x: 1.0, y: 0.0 }).unwrap();
        assert_eq!(
            store.get::<Position>(a).unwrap(),
            Some(&Position { x: 1.0, y: 0.0 })
        );
        assert_eq!(store.attributes(a).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_is_a_silent_no_op_everywhere() {
        let mut store = ActorStore::new();
        let a = store.spawn(AttributeSet::new().with(Health(10)));
        assert!(store.remove(a, Health::tag()));
        assert!(!store.remove(a, Health::tag()));
        assert!(!store.remove(Actor(404), Health::tag()));
    }

    #[test]
    fn test_iteration_follows_creation_order() {
        let mut store = ActorStore::new();
        let ids: Vec<Actor> = (0..4).map(|_| store.spawn(AttributeSet::new())).collect();
        let seen: Vec<Actor> = store.actors().collect();
        assert_eq!(seen, ids);
    }

    #[test]
    fn test_restore_advances_allocator() {
        let mut store = ActorStore::new();
        let mut restored = BTreeMap::new();
        restored.insert(Actor(7), AttributeMap::new());
        store.restore(restored);
        assert!(store.exists(Actor(7)));
        assert_eq!(store.spawn(AttributeSet::new()), Actor(8));
    }
}
