//! # stage_runtime
//!
//! Phase-ordered behavior execution for the stagehand runtime.
//!
//! The host drives lifecycle phases through a [`Manager`]:
//!
//! 1. `init()` once, then per tick `update()` (which runs `PreUpdate`,
//!    `Update`, `PostUpdate` in order) and `draw()`, then `end()` once.
//! 2. Each phase invokes its behaviors in registration order.
//! 3. Behaviors flagged parallel run on a fixed worker pool against a
//!    read-only world and record their mutations into command buffers; the
//!    driver joins each batch and merges the buffers before moving on.
//!
//! This crate provides:
//!
//! - [`Phase`] — the fixed lifecycle enumeration.
//! - [`BehaviorSchedule`] — append-only per-phase behavior lists.
//! - [`CommandBuffer`] / [`Command`] — deferred structural mutations.
//! - [`WorkerPool`] — the bounded pool behind parallel behaviors.
//! - [`Manager`] — the phase driver owning world, schedule, and pool.

pub mod command;
pub mod executor;
pub mod manager;
pub mod phase;
pub mod schedule;

pub use command::{Command, CommandBuffer};
pub use executor::{ExecutorError, WorkerPool};
pub use manager::{Manager, ManagerConfig};
pub use phase::Phase;
pub use schedule::BehaviorSchedule;
