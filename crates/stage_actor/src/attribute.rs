//! Core [`Attribute`] trait, type tags, and the encode/decode catalog.
//!
//! Every piece of data attached to an actor implements [`Attribute`]. The
//! trait requires `Send + Sync + 'static` so attribute values can be read by
//! worker threads, and serde bounds so every attribute kind round-trips
//! through the snapshot format keyed by its own tag.
//!
//! ## Type identity
//!
//! [`AttributeTag`] is derived from the attribute's **string name** using the
//! FNV-1a 64-bit hash algorithm. The name is the stable external form (it is
//! what appears as the key in a snapshot); the hash is the in-memory map key.

use std::any::Any;
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::attrmap::BoxedAttribute;

/// A unique identifier for an attribute kind, derived from its string name
/// using the FNV-1a 64-bit hash algorithm.
///
/// The tag is deterministic: hashing the same UTF-8 name bytes always
/// produces the same `AttributeTag`, so tags are stable across runs and
/// across snapshot save/load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeTag(pub u64);

impl AttributeTag {
    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Compute the [`AttributeTag`] for an attribute's string name.
    ///
    /// This is the canonical way to derive a tag; [`Attribute::tag`] calls it
    /// with [`Attribute::type_name`].
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }
}

/// Errors raised while encoding or decoding attribute payloads.
#[derive(Debug, thiserror::Error)]
pub enum AttributeError {
    /// The payload could not be serialised to JSON.
    #[error("attribute '{0}' payload failed to encode: {1}")]
    Encode(&'static str, serde_json::Error),

    /// The payload could not be deserialised from JSON.
    #[error("attribute '{0}' payload failed to decode: {1}")]
    Decode(&'static str, serde_json::Error),

    /// A stored value did not have the concrete type its tag promises.
    #[error("stored value for attribute '{0}' has the wrong concrete type")]
    TypeMismatch(&'static str),
}

/// Metadata about an attribute kind, used for type-erased persistence.
#[derive(Debug, Clone)]
pub struct AttributeMeta {
    /// The unique attribute tag.
    pub tag: AttributeTag,
    /// The human-readable name (e.g. `"Position"`), also the snapshot key.
    pub name: &'static str,
    /// Serialise a stored attribute value to a JSON payload.
    pub encode_fn: fn(&(dyn Any + Send + Sync)) -> Result<serde_json::Value, AttributeError>,
    /// Deserialise a JSON payload back into a boxed attribute value.
    pub decode_fn: fn(serde_json::Value) -> Result<BoxedAttribute, AttributeError>,
}

/// The core attribute trait.
///
/// All data attached to actors must implement this trait. Attributes must be
/// serialisable so they round-trip through snapshots, and `Send + Sync` so
/// parallel behaviors can read them.
///
/// # Examples
///
/// ```rust
/// use serde::{Serialize, Deserialize};
/// use stage_actor::Attribute;
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Attribute for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Attribute: Any + Send + Sync + Serialize + DeserializeOwned {
    /// A human-readable name for this attribute kind.
    fn type_name() -> &'static str;

    /// Returns the [`AttributeTag`] for this attribute kind.
    fn tag() -> AttributeTag {
        AttributeTag::from_name(Self::type_name())
    }

    /// Returns the [`AttributeMeta`] descriptor for this attribute kind.
    fn meta() -> AttributeMeta {
        AttributeMeta {
            tag: Self::tag(),
            name: Self::type_name(),
            encode_fn: |value| {
                let value = value
                    .downcast_ref::<Self>()
                    .ok_or(AttributeError::TypeMismatch(Self::type_name()))?;
                serde_json::to_value(value)
                    .map_err(|e| AttributeError::Encode(Self::type_name(), e))
            },
            decode_fn: |payload| {
                let value: Self = serde_json::from_value(payload)
                    .map_err(|e| AttributeError::Decode(Self::type_name(), e))?;
                Ok(Box::new(value))
            },
        }
    }
}

/// Registry of all attribute kinds known to a world.
///
/// The catalog maps tags and names to their [`AttributeMeta`], and is the
/// only way a snapshot can be decoded: a payload whose name is not in the
/// catalog is an unknown tag, which is a format error.
#[derive(Debug, Default)]
pub struct AttributeCatalog {
    by_tag: HashMap<AttributeTag, AttributeMeta>,
    by_name: HashMap<&'static str, AttributeTag>,
}

impl AttributeCatalog {
    /// Create a new empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attribute kind. Re-registering the same kind is a no-op.
    pub fn register<T: Attribute>(&mut self) {
        let meta = T::meta();
        self.by_name.insert(meta.name, meta.tag);
        self.by_tag.insert(meta.tag, meta);
    }

    /// Returns the metadata for a tag.
    #[must_use]
    pub fn meta(&self, tag: AttributeTag) -> Option<&AttributeMeta> {
        self.by_tag.get(&tag)
    }

    /// Returns the tag registered under a name.
    #[must_use]
    pub fn tag_for_name(&self, name: &str) -> Option<AttributeTag> {
        self.by_name.get(name).copied()
    }

    /// Returns the metadata registered under a name.
    #[must_use]
    pub fn meta_for_name(&self, name: &str) -> Option<&AttributeMeta> {
        self.by_name.get(name).and_then(|tag| self.by_tag.get(tag))
    }

    /// Returns the registered name for a tag.
    #[must_use]
    pub fn name_of(&self, tag: AttributeTag) -> Option<&'static str> {
        self.by_tag.get(&tag).map(|m| m.name)
    }

    /// Returns the number of registered attribute kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    /// Returns `true` if no attribute kinds are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}
