//! # stage_world
//!
//! World state for the stagehand runtime: the actor store, the tag-set query
//! cache, and snapshot persistence.
//!
//! This crate provides:
//!
//! - [`ActorStore`] — live actor set + per-actor attribute maps.
//! - [`QueryCache`] — memoized "actors possessing all of these tags" lookups.
//! - [`World`] — the facade every mutation routes through, so the cache can
//!   never be read stale.
//! - Snapshot save/load (JSON) with decode-then-swap semantics.

pub mod cache;
pub mod error;
pub mod snapshot;
pub mod store;
pub mod world;

pub use cache::{QueryCache, QueryKey};
pub use error::{SnapshotError, StoreError};
pub use snapshot::Snapshot;
pub use store::ActorStore;
pub use world::{World, WorldConfig};
