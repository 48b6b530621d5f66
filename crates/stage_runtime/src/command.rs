//! Deferred structural mutations.
//!
//! Parallel behaviors cannot mutate the world directly; they record
//! [`Command`]s into a private [`CommandBuffer`], and the driver applies all
//! buffers at an explicit synchronization point after the batch joins.
//! Commands are applied in FIFO order within a buffer.

use stage_actor::{Actor, Attribute, AttributeSet, AttributeTag, BoxedAttribute};
use stage_world::World;
use tracing::warn;

/// A queued structural mutation.
pub enum Command {
    /// Create a new actor with the given initial attributes. The new ID is
    /// observable only after the merge.
    Spawn {
        /// Initial attribute set; later duplicate tags overwrite earlier ones.
        attributes: AttributeSet,
    },
    /// Destroy an actor (no-op if it is already gone).
    Despawn {
        /// The actor to destroy.
        actor: Actor,
    },
    /// Attach an attribute, overwriting any existing slot of the same tag.
    Add {
        /// Target actor.
        actor: Actor,
        /// The attribute's tag.
        tag: AttributeTag,
        /// The type-erased value.
        value: BoxedAttribute,
    },
    /// Remove an attribute slot (silent no-op if absent).
    Remove {
        /// Target actor.
        actor: Actor,
        /// The tag to remove.
        tag: AttributeTag,
    },
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Spawn { attributes } => {
                f.debug_struct("Spawn").field("attributes", attributes).finish()
            }
            Command::Despawn { actor } => f.debug_struct("Despawn").field("actor", actor).finish(),
            Command::Add { actor, tag, .. } => f
                .debug_struct("Add")
                .field("actor", actor)
                .field("tag", tag)
                .finish_non_exhaustive(),
            Command::Remove { actor, tag } => f
                .debug_struct("Remove")
                .field("actor", actor)
                .field("tag", tag)
                .finish(),
        }
    }
}

/// A private queue of deferred mutations recorded by one behavior run.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    queued: Vec<Command>,
}

impl CommandBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an actor creation.
    pub fn spawn(&mut self, attributes: AttributeSet) {
        self.queued.push(Command::Spawn { attributes });
    }

    /// Queue an actor destruction.
    pub fn despawn(&mut self, actor: Actor) {
        self.queued.push(Command::Despawn { actor });
    }

    /// Queue an attribute attach.
    pub fn add_attribute<T: Attribute>(&mut self, actor: Actor, value: T) {
        self.queued.push(Command::Add {
            actor,
            tag: T::tag(),
            value: Box::new(value),
        });
    }

    /// Queue an attribute removal.
    pub fn remove_attribute<T: Attribute>(&mut self, actor: Actor) {
        self.queued.push(Command::Remove {
            actor,
            tag: T::tag(),
        });
    }

    /// Returns the number of queued commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queued.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    /// Drain the buffer onto the world, in FIFO order.
    ///
    /// An `Add` whose target was despawned earlier in the merge is logged and
    /// skipped; `Despawn` and `Remove` are no-ops on missing targets by the
    /// store contract already.
    pub fn apply(self, world: &mut World) {
        for command in self.queued {
            match command {
                Command::Spawn { attributes } => {
                    world.spawn(attributes);
                }
                Command::Despawn { actor } => {
                    world.despawn(actor);
                }
                Command::Add { actor, tag, value } => {
                    if let Err(err) = world.add_boxed(actor, tag, value) {
                        warn!(%actor, %err, "deferred attribute add dropped");
                    }
                }
                Command::Remove { actor, tag } => {
                    world.remove_by_tag(actor, tag);
                }
            }
        }
    }
}
