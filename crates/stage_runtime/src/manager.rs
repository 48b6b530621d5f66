//! The phase driver.
//!
//! A [`Manager`] owns the world, the behavior schedule, and the worker pool.
//! The host drives it through the phase entry points; ordering discipline
//! between entry points is the host's responsibility — the core does not
//! reject out-of-order calls, and only [`Manager::end`] is terminal.
//!
//! ## Execution model
//!
//! Within a phase, behaviors run in registration order. Sync behaviors run
//! on the driver under a write lock. Consecutive parallel behaviors form a
//! batch: each is submitted to the pool, reads the world under a read lock,
//! and records mutations into a private command buffer. The driver joins the
//! whole batch and applies the buffers in submission order before the next
//! sync behavior runs — a phase is never left with work in flight.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use stage_actor::Attribute;
use stage_world::{SnapshotError, World, WorldConfig};
use tracing::{debug, info, warn};

use crate::command::CommandBuffer;
use crate::executor::{ExecutorError, WorkerPool};
use crate::phase::Phase;
use crate::schedule::{BehaviorEntry, BehaviorSchedule, ParallelBehavior};

/// Manager construction options.
#[derive(Debug, Clone, Default)]
pub struct ManagerConfig {
    /// World options (query cache mode).
    pub world: WorldConfig,
    /// Worker pool size; defaults to the available hardware parallelism.
    pub worker_threads: Option<usize>,
}

/// World, schedule, and worker pool under one lifecycle.
pub struct Manager {
    world: Arc<RwLock<World>>,
    schedule: BehaviorSchedule,
    pool: WorkerPool,
}

impl Manager {
    /// Create a manager with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    /// Create a manager with explicit options.
    #[must_use]
    pub fn with_config(config: ManagerConfig) -> Self {
        let pool = match config.worker_threads {
            Some(threads) => WorkerPool::new(threads),
            None => WorkerPool::with_default_size(),
        };
        Self {
            world: Arc::new(RwLock::new(World::with_config(config.world))),
            schedule: BehaviorSchedule::new(),
            pool,
        }
    }

    /// Register an attribute kind with the world's catalog.
    pub fn register_attribute<T: Attribute>(&self) {
        self.world.write().register_attribute::<T>();
    }

    /// Run a closure against the world, read-only.
    pub fn with_world<R>(&self, f: impl FnOnce(&World) -> R) -> R {
        f(&self.world.read())
    }

    /// Run a closure against the world with full access.
    pub fn with_world_mut<R>(&self, f: impl FnOnce(&mut World) -> R) -> R {
        f(&mut self.world.write())
    }

    // -- Behavior registration --

    /// Append a synchronous behavior to a phase. It runs on the driver with
    /// full world access.
    pub fn add_behavior(&mut self, phase: Phase, behavior: impl FnMut(&mut World) + Send + 'static) {
        self.schedule.add_sync(phase, behavior);
    }

    /// Append a parallel behavior to a phase. It runs on the worker pool,
    /// reading the world and recording mutations into a command buffer that
    /// the driver merges after the batch joins.
    pub fn add_parallel_behavior(
        &mut self,
        phase: Phase,
        behavior: impl Fn(&World, &mut CommandBuffer) + Send + Sync + 'static,
    ) {
        self.schedule.add_parallel(phase, behavior);
    }

    // -- Phase entry points --

    /// Run the `Init` phase.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::ShutDown`] if parallel work can no longer be
    /// submitted.
    pub fn init(&mut self) -> Result<(), ExecutorError> {
        self.run_phase(Phase::Init)
    }

    /// Run `PreUpdate`, `Update`, and `PostUpdate`, in that order, each
    /// phase's list exhausted fully before the next begins.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::ShutDown`] if parallel work can no longer be
    /// submitted.
    pub fn update(&mut self) -> Result<(), ExecutorError> {
        for phase in Phase::UPDATE_SEQUENCE {
            self.run_phase(phase)?;
        }
        Ok(())
    }

    /// Run the `Draw` phase.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::ShutDown`] if parallel work can no longer be
    /// submitted.
    pub fn draw(&mut self) -> Result<(), ExecutorError> {
        self.run_phase(Phase::Draw)
    }

    /// Run the `End` phase, then shut the worker pool down.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::ShutDown`] on a second call — the pool shuts
    /// down exactly once.
    pub fn end(&mut self) -> Result<(), ExecutorError> {
        self.run_phase(Phase::End)?;
        self.pool.shutdown()?;
        info!("manager ended");
        Ok(())
    }

    // -- Persistence pass-through --

    /// Write the current world snapshot to a file.
    ///
    /// # Errors
    ///
    /// Propagates [`SnapshotError`] from encoding or file I/O.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        self.world.read().save_to_file(path)
    }

    /// Replace the world's store from a snapshot file.
    ///
    /// # Errors
    ///
    /// Propagates [`SnapshotError`]; the store is untouched on failure.
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        self.world.write().load_from_file(path)
    }

    // -- Phase execution --

    fn run_phase(&mut self, phase: Phase) -> Result<(), ExecutorError> {
        let total = self.schedule.len(phase);
        if total == 0 {
            return Ok(());
        }
        debug!(%phase, behaviors = total, "running phase");

        let mut batch: Vec<ParallelBehavior> = Vec::new();
        for entry in self.schedule.entries_mut(phase) {
            match entry {
                BehaviorEntry::Sync(behavior) => {
                    Self::flush_batch(&self.world, &self.pool, &mut batch)?;
                    behavior(&mut self.world.write());
                }
                BehaviorEntry::Parallel(behavior) => {
                    batch.push(Arc::clone(behavior));
                }
            }
        }
        Self::flush_batch(&self.world, &self.pool, &mut batch)
    }

    /// Submit a batch of parallel behaviors, join them all, and merge their
    /// command buffers in submission order.
    fn flush_batch(
        world: &Arc<RwLock<World>>,
        pool: &WorkerPool,
        batch: &mut Vec<ParallelBehavior>,
    ) -> Result<(), ExecutorError> {
        if batch.is_empty() {
            return Ok(());
        }

        let submitted = batch.len();
        let (done_tx, done_rx) = crossbeam_channel::bounded::<(usize, CommandBuffer)>(submitted);
        for (index, behavior) in batch.drain(..).enumerate() {
            let world = Arc::clone(world);
            let done = done_tx.clone();
            pool.submit(move || {
                let mut buffer = CommandBuffer::new();
                {
                    let world = world.read();
                    behavior(&world, &mut buffer);
                }
                let _ = done.send((index, buffer));
            })?;
        }
        drop(done_tx);

        // Join barrier: the channel closes once every job has sent its
        // buffer or unwound (a panicked job drops its sender unsent).
        let mut buffers: Vec<(usize, CommandBuffer)> = done_rx.iter().collect();
        if buffers.len() < submitted {
            warn!(
                lost = submitted - buffers.len(),
                "parallel behaviors panicked; their commands are discarded"
            );
        }
        buffers.sort_by_key(|(index, _)| *index);

        let mut world = world.write();
        for (_, buffer) in buffers {
            buffer.apply(&mut world);
        }
        Ok(())
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use stage_actor::AttributeSet;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Health(u32);

    impl Attribute for Health {
        fn type_name() -> &'static str {
            "Health"
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Expired;

    impl Attribute for Expired {
        fn type_name() -> &'static str {
            "Expired"
        }
    }

    fn small_manager() -> Manager {
        Manager::with_config(ManagerConfig {
            worker_threads: Some(2),
            ..ManagerConfig::default()
        })
    }

    #[test]
    fn test_behaviors_run_in_registration_order() {
        let mut manager = small_manager();
        let order = Arc::new(Mutex::new(Vec::new()));
        for id in 0..3 {
            let order = Arc::clone(&order);
            manager.add_behavior(Phase::Init, move |_| order.lock().push(id));
        }
        manager.init().unwrap();
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_update_exhausts_each_phase_in_order() {
        let mut manager = small_manager();
        let order = Arc::new(Mutex::new(Vec::new()));
        for (phase, label) in [
            (Phase::PostUpdate, "post"),
            (Phase::Update, "mid"),
            (Phase::PreUpdate, "pre"),
            (Phase::Update, "mid2"),
        ] {
            let order = Arc::clone(&order);
            manager.add_behavior(phase, move |_| order.lock().push(label));
        }
        manager.update().unwrap();
        assert_eq!(*order.lock(), vec!["pre", "mid", "mid2", "post"]);
    }

    #[test]
    fn test_init_and_draw_are_repeatable() {
        let mut manager = small_manager();
        let hits = Arc::new(Mutex::new(0));
        let h = Arc::clone(&hits);
        manager.add_behavior(Phase::Draw, move |_| *h.lock() += 1);
        manager.draw().unwrap();
        manager.init().unwrap();
        manager.draw().unwrap();
        assert_eq!(*hits.lock(), 2);
    }

    #[test]
    fn test_sync_behavior_mutates_world() {
        let mut manager = small_manager();
        manager.register_attribute::<Health>();
        manager.add_behavior(Phase::Update, |world| {
            world.spawn(AttributeSet::new().with(Health(10)));
        });
        manager.update().unwrap();
        assert_eq!(manager.with_world(|w| w.actor_count()), 1);
    }

    #[test]
    fn test_parallel_commands_merge_before_next_sync_behavior() {
        let mut manager = small_manager();
        let actor = manager.with_world_mut(|w| w.spawn(AttributeSet::new()));

        manager.add_parallel_behavior(Phase::Update, move |_, buffer| {
            buffer.add_attribute(actor, Health(42));
        });
        // Registered after the parallel behavior, so it must observe the
        // merged command.
        let seen = Arc::new(Mutex::new(None));
        let s = Arc::clone(&seen);
        manager.add_behavior(Phase::Update, move |world| {
            *s.lock() = world.get_attribute::<Health>(actor).unwrap().copied();
        });

        manager.update().unwrap();
        assert_eq!(*seen.lock(), Some(Health(42)));
    }

    #[test]
    fn test_parallel_behavior_queries_and_defers_despawn() {
        let mut manager = small_manager();
        manager.with_world_mut(|w| {
            w.spawn(AttributeSet::new().with(Expired));
            w.spawn(AttributeSet::new().with(Health(1)));
        });

        manager.add_parallel_behavior(Phase::PostUpdate, |world, buffer| {
            for actor in world.actors_with(&[Expired::tag()]) {
                buffer.despawn(actor);
            }
        });
        manager.update().unwrap();

        assert_eq!(manager.with_world(|w| w.actor_count()), 1);
        assert!(manager.with_world(|w| w.actors_with(&[Expired::tag()]).is_empty()));
    }

    #[test]
    fn test_batch_buffers_apply_in_submission_order() {
        let mut manager = small_manager();
        let actor = manager.with_world_mut(|w| w.spawn(AttributeSet::new()));

        // Both behaviors write the same slot; the later registration must
        // win regardless of which worker finishes first.
        manager.add_parallel_behavior(Phase::Update, move |_, buffer| {
            buffer.add_attribute(actor, Health(1));
        });
        manager.add_parallel_behavior(Phase::Update, move |_, buffer| {
            buffer.add_attribute(actor, Health(2));
        });
        for _ in 0..16 {
            manager.update().unwrap();
            let seen = manager.with_world(|w| w.get_attribute::<Health>(actor).unwrap().copied());
            assert_eq!(seen, Some(Health(2)));
        }
    }

    #[test]
    fn test_panicking_parallel_behavior_is_isolated() {
        let mut manager = small_manager();
        let actor = manager.with_world_mut(|w| w.spawn(AttributeSet::new()));

        manager.add_parallel_behavior(Phase::Update, |_, _| panic!("broken behavior"));
        manager.add_parallel_behavior(Phase::Update, move |_, buffer| {
            buffer.add_attribute(actor, Health(7));
        });
        manager.update().unwrap();

        let seen = manager.with_world(|w| w.get_attribute::<Health>(actor).unwrap().copied());
        assert_eq!(seen, Some(Health(7)));
    }

    #[test]
    fn test_end_runs_end_phase_then_shuts_pool() {
        let mut manager = small_manager();
        let ended = Arc::new(Mutex::new(false));
        let e = Arc::clone(&ended);
        manager.add_behavior(Phase::End, move |_| *e.lock() = true);
        manager.end().unwrap();
        assert!(*ended.lock());
        assert_eq!(manager.end(), Err(ExecutorError::ShutDown));
    }

    #[test]
    fn test_parallel_work_after_end_is_an_error() {
        let mut manager = small_manager();
        manager.add_parallel_behavior(Phase::Update, |_, _| {});
        manager.end().unwrap();
        assert_eq!(manager.update(), Err(ExecutorError::ShutDown));
    }

    #[test]
    fn test_sync_only_phases_still_run_after_end() {
        // Phase ordering is the host's responsibility; only the pool is
        // terminal.
        let mut manager = small_manager();
        let hits = Arc::new(Mutex::new(0));
        let h = Arc::clone(&hits);
        manager.add_behavior(Phase::Draw, move |_| *h.lock() += 1);
        manager.end().unwrap();
        manager.draw().unwrap();
        assert_eq!(*hits.lock(), 1);
    }
}
