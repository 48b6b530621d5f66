//! # stage_actor
//!
//! The "A" in the actor/attribute runtime — defines what an actor is, what an
//! attribute is, and how attributes are stored and serialised.
//!
//! This crate provides:
//!
//! - [`Actor`] — lightweight `u64` actor identifiers.
//! - [`ActorAllocator`] — monotonically increasing ID allocator.
//! - [`Attribute`] trait — the contract all actor data must satisfy.
//! - [`AttributeMap`] — per-actor tag-keyed slot storage.
//! - [`AttributeSet`] — ordered initial-attribute builder for actor creation.
//! - [`AttributeCatalog`] — registry of encode/decode pairs for persistence.

pub mod actor;
pub mod attribute;
pub mod attrmap;

pub use actor::{Actor, ActorAllocator};
pub use attribute::{Attribute, AttributeCatalog, AttributeError, AttributeMeta, AttributeTag};
pub use attrmap::{AttributeMap, AttributeSet, BoxedAttribute};
