//! Per-actor attribute storage.
//!
//! An [`AttributeMap`] holds one slot per attribute tag: adding an attribute
//! of a kind the actor already has overwrites the old value. Values are
//! stored type-erased; a typed read downcasts at the call site and a failed
//! downcast reads as "absent" rather than a crash.

use std::any::Any;
use std::collections::HashMap;

use crate::attribute::{Attribute, AttributeTag};

/// A type-erased attribute value.
pub type BoxedAttribute = Box<dyn Any + Send + Sync>;

/// The attribute slots of a single actor.
#[derive(Default)]
pub struct AttributeMap {
    slots: HashMap<AttributeTag, BoxedAttribute>,
}

// Values are type-erased, so only the occupied tags can be shown.
impl std::fmt::Debug for AttributeMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.slots.keys()).finish()
    }
}

impl AttributeMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an attribute value, overwriting any existing slot for its tag.
    pub fn insert<T: Attribute>(&mut self, value: T) {
        self.slots.insert(T::tag(), Box::new(value));
    }

    /// Insert a type-erased value under an explicit tag.
    ///
    /// The caller is responsible for the tag matching the boxed type; a
    /// mismatch is not unsafe, it just makes the slot read as absent.
    pub fn insert_boxed(&mut self, tag: AttributeTag, value: BoxedAttribute) {
        self.slots.insert(tag, value);
    }

    /// Typed read of the slot for `T`. Returns `None` when the slot is empty
    /// or holds a value of a different concrete type.
    #[must_use]
    pub fn get<T: Attribute>(&self) -> Option<&T> {
        self.slots.get(&T::tag()).and_then(|v| v.downcast_ref())
    }

    /// Typed mutable read of the slot for `T`.
    #[must_use]
    pub fn get_mut<T: Attribute>(&mut self) -> Option<&mut T> {
        self.slots.get_mut(&T::tag()).and_then(|v| v.downcast_mut())
    }

    /// Type-erased read of a slot.
    #[must_use]
    pub fn get_raw(&self, tag: AttributeTag) -> Option<&(dyn Any + Send + Sync)> {
        self.slots.get(&tag).map(|v| v.as_ref())
    }

    /// Remove the slot for `tag`. Returns `true` if a value was present.
    pub fn remove(&mut self, tag: AttributeTag) -> bool {
        self.slots.remove(&tag).is_some()
    }

    /// Returns `true` if a slot for `tag` is occupied.
    #[must_use]
    pub fn contains(&self, tag: AttributeTag) -> bool {
        self.slots.contains_key(&tag)
    }

    /// Iterate over the occupied tags.
    pub fn tags(&self) -> impl Iterator<Item = AttributeTag> + '_ {
        self.slots.keys().copied()
    }

    /// Iterate over occupied slots as `(tag, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (AttributeTag, &(dyn Any + Send + Sync))> {
        self.slots.iter().map(|(tag, v)| (*tag, v.as_ref()))
    }

    /// Returns the number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no slots are occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// An ordered list of initial attributes for actor creation.
///
/// Order matters: when the same tag appears twice, the later entry overwrites
/// the earlier one when the set is turned into an [`AttributeMap`].
#[derive(Default)]
pub struct AttributeSet {
    entries: Vec<(AttributeTag, BoxedAttribute)>,
}

impl std::fmt::Debug for AttributeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(tag, _)| tag))
            .finish()
    }
}

impl AttributeSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute, builder style.
    #[must_use]
    pub fn with<T: Attribute>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    /// Append an attribute.
    pub fn push<T: Attribute>(&mut self, value: T) {
        self.entries.push((T::tag(), Box::new(value)));
    }

    /// Append a type-erased attribute under an explicit tag.
    pub fn push_boxed(&mut self, tag: AttributeTag, value: BoxedAttribute) {
        self.entries.push((tag, value));
    }

    /// Returns the number of entries (duplicates included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the set has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the set into an [`AttributeMap`], later duplicates winning.
    #[must_use]
    pub fn into_map(self) -> AttributeMap {
        let mut map = AttributeMap::new();
        for (tag, value) in self.entries {
            map.insert_boxed(tag, value);
        }
        map
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
    fn test_insert_and_get() {
        let mut map = AttributeMap::new();
        map.insert(Position { x: 1.0, y: 2.0 });
        assert_eq!(map.get::<Position>(), Some(&Position { x: 1.0, y: 2.0 }));
        assert_eq!(map.get::<Health>(), None);
    }

    #[test]
    fn test_insert_overwrites_same_tag() {
        let mut map = AttributeMap::new();
        map.insert(Position { x: 0.0, y: 0.0 });
        map.insert(Position { x: 1.0, y: 0.0 });
        assert_eq!(map.len(), 1);
        assert_eq!(map.get::<Position>(), Some(&Position { x: 1.0, y: 0.0 }));
    }

    #[test]
    fn test_mismatched_boxed_type_reads_as_absent() {
        let mut map = AttributeMap::new();
        map.insert_boxed(Position::tag(), Box::new(Health(3)));
        assert!(map.contains(Position::tag()));
        assert_eq!(map.get::<Position>(), None);
    }

    #[test]
    fn test_remove_reports_presence() {
        let mut map = AttributeMap::new();
        map.insert(Health(100));
        assert!(map.remove(Health::tag()));
        assert!(!map.remove(Health::tag()));
        assert!(map.is_empty());
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut map = AttributeMap::new();
        map.insert(Health(100));
        if let Some(h) = map.get_mut::<Health>() {
            h.0 -= 25;
        }
        assert_eq!(map.get::<Health>(), Some(&Health(75)));
    }

    #[test]
    fn test_attribute_set_later_duplicate_wins() {
        let map = AttributeSet::new()
            .with(Position { x: 0.0, y: 0.0 })
            .with(Health(50))
            .with(Position { x: 9.0, y: 9.0 })
            .into_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get::<Position>(), Some(&Position { x: 9.0, y: 9.0 }));
    }
}
