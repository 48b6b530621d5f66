//! World-layer error types.

use stage_actor::{Actor, AttributeError, AttributeTag};

/// Errors raised by actor store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The referenced actor is not in the live set.
    #[error("actor {0} not found")]
    ActorNotFound(Actor),
}

/// Errors raised while encoding or decoding a state snapshot.
///
/// A failed load is guaranteed to leave the store untouched: every variant
/// here is produced before any live state is replaced.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The snapshot text is not well-formed JSON for the snapshot schema.
    #[error("malformed snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    /// An attribute key in the snapshot names a kind the catalog does not know.
    #[error("unknown attribute tag '{0}' in snapshot")]
    UnknownTag(String),

    /// A live attribute has no registered codec, so it cannot be saved.
    #[error("attribute tag {0:?} has no registered codec")]
    UnregisteredTag(AttributeTag),

    /// An actor key in the `attributes` table is not a valid integer ID.
    #[error("malformed actor id '{0}' in snapshot")]
    MalformedActorId(String),

    /// An actor appears in the `attributes` table but not in the actor list.
    #[error("{0} has attributes in the snapshot but is missing from the actor list")]
    OrphanAttributes(Actor),

    /// An attribute payload failed its kind-specific encode/decode.
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// Reading or writing the snapshot file failed.
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
