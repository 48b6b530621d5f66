//! Behavior registration.
//!
//! Behaviors have no identity beyond their position in a phase's ordered
//! list: registration appends, there is no removal, and a phase run invokes
//! its list front to back.

use std::sync::Arc;

use stage_world::World;

use crate::command::CommandBuffer;
use crate::phase::Phase;

/// A behavior that runs synchronously on the driver with full world access.
pub type SyncBehavior = Box<dyn FnMut(&mut World) + Send>;

/// A behavior that runs on the worker pool: it reads the world and records
/// its mutations into a command buffer merged by the driver after the batch
/// joins.
pub type ParallelBehavior = Arc<dyn Fn(&World, &mut CommandBuffer) + Send + Sync>;

/// One registered behavior.
pub enum BehaviorEntry {
    /// Runs in the calling (driver) context.
    Sync(SyncBehavior),
    /// Submitted to the worker pool for the current batch.
    Parallel(ParallelBehavior),
}

/// Append-only per-phase behavior lists.
#[derive(Default)]
pub struct BehaviorSchedule {
    lists: [Vec<BehaviorEntry>; 6],
}

impl BehaviorSchedule {
    /// Create an empty schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a synchronous behavior to the end of a phase's list.
    pub fn add_sync(&mut self, phase: Phase, behavior: impl FnMut(&mut World) + Send + 'static) {
        self.lists[phase.index()].push(BehaviorEntry::Sync(Box::new(behavior)));
    }

    /// Append a parallel behavior to the end of a phase's list.
    pub fn add_parallel(
        &mut self,
        phase: Phase,
        behavior: impl Fn(&World, &mut CommandBuffer) + Send + Sync + 'static,
    ) {
        self.lists[phase.index()].push(BehaviorEntry::Parallel(Arc::new(behavior)));
    }

    /// The registered behaviors of a phase, in registration order.
    pub(crate) fn entries_mut(&mut self, phase: Phase) -> &mut [BehaviorEntry] {
        &mut self.lists[phase.index()]
    }

    /// Returns the number of behaviors registered for a phase.
    #[must_use]
    pub fn len(&self, phase: Phase) -> usize {
        self.lists[phase.index()].len()
    }

    /// Returns `true` if no behaviors are registered in any phase.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lists.iter().all(Vec::is_empty)
    }
}

impl std::fmt::Debug for BehaviorSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for phase in Phase::ALL {
            map.entry(&phase, &self.lists[phase.index()].len());
        }
        map.finish()
    }
}
