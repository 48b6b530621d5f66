//! The [`World`] facade.
//!
//! Every mutation of the actor store routes through the world so that cache
//! invalidation can never be skipped. Queries go through the world for the
//! same reason: the cache is only allowed to answer when nothing has changed
//! since the entry was stored.

use stage_actor::{
    Actor, Attribute, AttributeCatalog, AttributeMap, AttributeSet, AttributeTag, BoxedAttribute,
};
use tracing::debug;

use crate::cache::{QueryCache, QueryKey};
use crate::error::StoreError;
use crate::store::ActorStore;

/// World construction options.
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// Whether `actors_with` results are memoized. Fixed for the lifetime of
    /// the world; observable query results are identical either way.
    pub cache_queries: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            cache_queries: true,
        }
    }
}

/// Actor store, query cache, and attribute catalog under one roof.
#[derive(Debug)]
pub struct World {
    store: ActorStore,
    cache: QueryCache,
    catalog: AttributeCatalog,
}

impl World {
    /// Create a world with the default configuration (caching enabled).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Create a world with explicit options.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            store: ActorStore::new(),
            cache: QueryCache::new(config.cache_queries),
            catalog: AttributeCatalog::new(),
        }
    }

    /// Register an attribute kind so it can round-trip through snapshots.
    pub fn register_attribute<T: Attribute>(&mut self) {
        self.catalog.register::<T>();
    }

    /// Access the attribute catalog.
    #[must_use]
    pub fn catalog(&self) -> &AttributeCatalog {
        &self.catalog
    }

    // -- Actor lifecycle --

    /// Spawn a new actor with the given initial attributes.
    pub fn spawn(&mut self, initial: AttributeSet) -> Actor {
        let actor = self.store.spawn(initial);
        self.cache.invalidate();
        debug!(%actor, "actor spawned");
        actor
    }

    /// Returns `true` if the actor is live.
    #[must_use]
    pub fn exists(&self, actor: Actor) -> bool {
        self.store.exists(actor)
    }

    /// Destroy an actor. Idempotent; returns `true` if the actor was live.
    pub fn despawn(&mut self, actor: Actor) -> bool {
        let removed = self.store.despawn(actor);
        self.cache.invalidate();
        if removed {
            debug!(%actor, "actor despawned");
        }
        removed
    }

    // -- Attribute operations --

    /// Attach an attribute to a live actor.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ActorNotFound`] if the actor is not live; the
    /// store and cache are untouched in that case.
    pub fn add_attribute<T: Attribute>(&mut self, actor: Actor, value: T) -> Result<(), StoreError> {
        self.store.add(actor, value)?;
        self.cache.invalidate();
        Ok(())
    }

    /// Type-erased attach, used by deferred commands.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ActorNotFound`] if the actor is not live.
    pub fn add_boxed(
        &mut self,
        actor: Actor,
        tag: AttributeTag,
        value: BoxedAttribute,
    ) -> Result<(), StoreError> {
        self.store.add_boxed(actor, tag, value)?;
        self.cache.invalidate();
        Ok(())
    }

    /// Read an attribute. `Ok(None)` means the actor is live but has no slot
    /// of this kind — absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ActorNotFound`] if the actor is not live.
    pub fn get_attribute<T: Attribute>(&self, actor: Actor) -> Result<Option<&T>, StoreError> {
        self.store.get::<T>(actor)
    }

    /// Mutable attribute read. Updating a value in place does not change the
    /// actor's tag set, so the cache stays valid.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ActorNotFound`] if the actor is not live.
    pub fn get_attribute_mut<T: Attribute>(
        &mut self,
        actor: Actor,
    ) -> Result<Option<&mut T>, StoreError> {
        self.store.get_mut::<T>(actor)
    }

    /// Remove the slot for `T` on an actor. Silent no-op on unknown actors
    /// or absent slots; the cache is invalidated regardless.
    pub fn remove_attribute<T: Attribute>(&mut self, actor: Actor) -> bool {
        self.remove_by_tag(actor, T::tag())
    }

    /// Tag-addressed variant of [`World::remove_attribute`].
    pub fn remove_by_tag(&mut self, actor: Actor, tag: AttributeTag) -> bool {
        let removed = self.store.remove(actor, tag);
        self.cache.invalidate();
        removed
    }

    /// Returns the attribute map of a live actor.
    #[must_use]
    pub fn attributes(&self, actor: Actor) -> Option<&AttributeMap> {
        self.store.attributes(actor)
    }

    // -- Queries --

    /// Return all live actors possessing every tag in `tags`, in creation
    /// order.
    ///
    /// When caching is enabled the result is memoized until the next
    /// structural mutation; results are identical with caching disabled.
    #[must_use]
    pub fn actors_with(&self, tags: &[AttributeTag]) -> Vec<Actor> {
        let key = QueryKey::from_tags(tags);
        if let Some(hit) = self.cache.lookup(&key) {
            return hit;
        }
        let result: Vec<Actor> = self
            .store
            .iter()
            .filter(|(_, map)| tags.iter().all(|tag| map.contains(*tag)))
            .map(|(actor, _)| actor)
            .collect();
        self.cache.store(key, result.clone());
        result
    }

    // -- Introspection --

    /// Iterate over live actors in creation order.
    pub fn actors(&self) -> impl Iterator<Item = Actor> + '_ {
        self.store.actors()
    }

    /// Returns the number of live actors.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.store.len()
    }

    pub(crate) fn store(&self) -> &ActorStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut ActorStore {
        &mut self.store
    }

    pub(crate) fn cache(&self) -> &QueryCache {
        &self.cache
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
