//! Snapshot persistence.
//!
//! A [`Snapshot`] is a complete, self-contained serialization of store state:
//! the live actor set plus every actor's attribute payloads, keyed by
//! attribute name. It carries no cache or behavior state.
//!
//! Loading is decode-then-swap: the whole snapshot is parsed and every
//! payload decoded through the catalog *before* any live state is replaced.
//! A malformed snapshot therefore leaves the world exactly as it was.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stage_actor::{Actor, AttributeMap};
use tracing::{debug, info};

use crate::error::SnapshotError;
use crate::world::World;

/// The logical snapshot schema.
///
/// ```json
/// {
///   "actors": [0, 1],
///   "attributes": {
///     "0": { "Position": { "x": 1.0, "y": 0.0 } },
///     "1": {}
///   }
/// }
/// ```
///
/// Every actor keyed in `attributes` must also appear in `actors`; an actor
/// in `actors` may map to an empty attribute object (or no entry at all).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Unique live actor IDs.
    pub actors: Vec<u64>,
    /// Per-actor attribute payloads, keyed by actor ID then attribute name.
    pub attributes: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

impl World {
    /// Serialise the live actor set and all attribute maps to snapshot text.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::UnregisteredTag`] if a live attribute kind
    /// was never registered with the catalog, or an encode error from the
    /// kind's own codec.
    pub fn save_state(&self) -> Result<String, SnapshotError> {
        let mut actors = Vec::with_capacity(self.actor_count());
        let mut attributes = BTreeMap::new();

        for (actor, map) in self.store().iter() {
            actors.push(actor.id());
            let mut payloads = BTreeMap::new();
            for (tag, value) in map.iter() {
                let meta = self
                    .catalog()
                    .meta(tag)
                    .ok_or(SnapshotError::UnregisteredTag(tag))?;
                payloads.insert(meta.name.to_string(), (meta.encode_fn)(value)?);
            }
            attributes.insert(actor.id().to_string(), payloads);
        }

        let snapshot = Snapshot { actors, attributes };
        debug!(actors = snapshot.actors.len(), "state captured");
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Replace the entire store with the contents of snapshot text.
    ///
    /// On success the live set and all attribute maps are swapped wholesale,
    /// the allocator is advanced past the highest restored ID, and the query
    /// cache is invalidated.
    ///
    /// # Errors
    ///
    /// Returns a [`SnapshotError`] on malformed JSON, an unknown attribute
    /// name, a payload that fails its kind's decoder, or an attribute entry
    /// for an actor missing from the actor list. The store is untouched on
    /// every error path.
    pub fn load_state(&mut self, text: &str) -> Result<(), SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(text)?;

        let mut restored: BTreeMap<Actor, AttributeMap> = BTreeMap::new();
        for id in &snapshot.actors {
            restored.insert(Actor::from_raw(*id), AttributeMap::new());
        }

        for (actor_key, payloads) in &snapshot.attributes {
            let id: u64 = actor_key
                .parse()
                .map_err(|_| SnapshotError::MalformedActorId(actor_key.clone()))?;
            let actor = Actor::from_raw(id);
            let map = restored
                .get_mut(&actor)
                .ok_or(SnapshotError::OrphanAttributes(actor))?;
            for (name, payload) in payloads {
                let meta = self
                    .catalog()
                    .meta_for_name(name)
                    .ok_or_else(|| SnapshotError::UnknownTag(name.clone()))?;
                map.insert_boxed(meta.tag, (meta.decode_fn)(payload.clone())?);
            }
        }

        let count = restored.len();
        self.store_mut().restore(restored);
        self.cache().invalidate();
        info!(actors = count, "state restored from snapshot");
        Ok(())
    }

    /// Write the encoded snapshot to a file, overwriting existing content.
    ///
    /// # Errors
    ///
    /// Propagates encode errors from [`World::save_state`] and file I/O
    /// errors.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let text = self.save_state()?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Read a whole snapshot file and delegate to [`World::load_state`].
    ///
    /// # Errors
    ///
    /// Propagates file I/O errors and every [`World::load_state`] error; the
    /// store is untouched on failure.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let text = std::fs::read_to_string(path)?;
        self.load_state(&text)
    }
}
