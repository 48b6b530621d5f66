//! The bounded worker pool behind parallel behaviors.
//!
//! The pool is a scoped resource: created with the manager, never resized,
//! shut down exactly once at end-of-life. Submitting work after shutdown is
//! an error, not a silent drop. A panicking job is caught and logged by the
//! worker so one broken behavior cannot take the pool down or be lost
//! without trace.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error};

/// A unit of work for the pool.
type Job = Box<dyn FnOnce() + Send + 'static>;

/// Errors raised by the worker pool lifecycle.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExecutorError {
    /// The pool has already been shut down.
    #[error("worker pool is shut down")]
    ShutDown,
}

/// A fixed-size pool of worker threads fed from a shared job channel.
#[derive(Debug)]
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn a pool with `threads` workers (clamped to at least one).
    #[must_use]
    pub fn new(threads: usize) -> Self {
        let threads = threads.max(1);
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();
        let workers = (0..threads)
            .map(|index| {
                let receiver: Receiver<Job> = receiver.clone();
                std::thread::spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                            error!(
                                worker = index,
                                panic = panic_message(payload.as_ref()),
                                "parallel behavior panicked"
                            );
                        }
                    }
                })
            })
            .collect();
        debug!(threads, "worker pool started");
        Self {
            sender: Some(sender),
            workers,
        }
    }

    /// Spawn a pool sized to the available hardware parallelism.
    #[must_use]
    pub fn with_default_size() -> Self {
        Self::new(num_cpus::get())
    }

    /// Returns the number of worker threads.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Returns `true` once [`WorkerPool::shutdown`] has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.sender.is_none()
    }

    /// Hand a job to the pool.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::ShutDown`] if the pool is no longer
    /// accepting work.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) -> Result<(), ExecutorError> {
        let sender = self.sender.as_ref().ok_or(ExecutorError::ShutDown)?;
        sender
            .send(Box::new(job))
            .map_err(|_| ExecutorError::ShutDown)
    }

    /// Stop accepting work, drain the queue, and join every worker.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::ShutDown`] if the pool was already shut
    /// down.
    pub fn shutdown(&mut self) -> Result<(), ExecutorError> {
        let sender = self.sender.take().ok_or(ExecutorError::ShutDown)?;
        // Workers exit once the queue drains and the last sender is gone.
        drop(sender);
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("worker thread terminated abnormally");
            }
        }
        debug!("worker pool shut down");
        Ok(())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_submitted_jobs_execute() {
        let pool = WorkerPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = crossbeam_channel::bounded(8);
        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            let tx = tx.clone();
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = tx.send(());
            })
            .unwrap();
        }
        for _ in 0..8 {
            rx.recv().unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_shutdown_waits_for_queued_work() {
        let mut pool = WorkerPool::new(1);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..4 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.shutdown().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_double_shutdown_is_an_error() {
        let mut pool = WorkerPool::new(1);
        pool.shutdown().unwrap();
        assert_eq!(pool.shutdown(), Err(ExecutorError::ShutDown));
    }

    #[test]
    fn test_submit_after_shutdown_is_an_error() {
        let mut pool = WorkerPool::new(1);
        pool.shutdown().unwrap();
        assert!(pool.is_shut_down());
        assert_eq!(pool.submit(|| {}), Err(ExecutorError::ShutDown));
    }

    #[test]
    fn test_panicking_job_does_not_kill_the_pool() {
        let pool = WorkerPool::new(1);
        let (tx, rx) = crossbeam_channel::bounded(1);
        pool.submit(|| panic!("behavior failure")).unwrap();
        pool.submit(move || {
            let _ = tx.send(());
        })
        .unwrap();
        // The worker that caught the panic still serves the second job.
        assert!(rx.recv_timeout(std::time::Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_zero_threads_clamps_to_one() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.threads(), 1);
    }
}
