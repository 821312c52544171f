//! # Worker Pool
//!
//! Long-lived worker threads reused across generation passes. A *pass*
//! submits one job per grid region and blocks the caller until every job has
//! reported back — the barrier that guarantees no consumer observes a
//! partially-updated grid.
//!
//! ## Failure semantics
//!
//! Failures are whole-pass, never partial-region: if any job panics, the
//! pass still waits for the remaining jobs (the barrier holds) and then
//! returns an error with every output discarded. Callers keep the previous
//! state and simply skip the pass's output.
//!
//! ## Scheduling model
//!
//! Workers never block on anything except the job channel; all polling and
//! waiting happens on the caller's thread. Passes are bounded and run to
//! completion once started — there is no mid-flight cancellation.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use thiserror::Error;
use tracing::warn;

/// Errors surfaced by a generation pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PassError {
    /// A region job panicked; the whole pass's output was discarded.
    #[error("region job {region} failed; pass output discarded")]
    RegionFailed {
        /// Index of the first failing region.
        region: usize,
    },

    /// The pool's worker threads are gone (the pool was shut down).
    #[error("worker pool is shut down")]
    PoolShutDown,
}

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed set of worker threads reused across passes.
///
/// Replaces thread-per-pass spawning: the threads live as long as the pool
/// and sleep on a job channel between passes.
pub struct WorkerPool {
    job_tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Creates a pool with `threads` worker threads.
    ///
    /// # Panics
    ///
    /// Panics if `threads` is zero.
    #[must_use]
    pub fn new(threads: usize) -> Self {
        assert!(threads > 0, "worker pool needs at least one thread");

        let (job_tx, job_rx) = unbounded::<Job>();
        let workers = (0..threads)
            .map(|i| {
                let rx: Receiver<Job> = job_rx.clone();
                std::thread::Builder::new()
                    .name(format!("stratus-worker-{i}"))
                    .spawn(move || {
                        while let Ok(job) = rx.recv() {
                            job();
                        }
                    })
                    .expect("spawn worker thread")
            })
            .collect();

        Self {
            job_tx: Some(job_tx),
            workers,
        }
    }

    /// Number of worker threads.
    #[inline]
    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    /// Runs one pass: dispatches every job, waits for all of them (barrier),
    /// and returns the outputs in submission order.
    ///
    /// # Errors
    ///
    /// [`PassError::RegionFailed`] if any job panicked (all outputs are
    /// discarded), [`PassError::PoolShutDown`] if the workers are gone.
    pub fn run_pass<T, F>(&self, jobs: Vec<F>) -> Result<Vec<T>, PassError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let tx = self.job_tx.as_ref().ok_or(PassError::PoolShutDown)?;
        let total = jobs.len();
        let (done_tx, done_rx) = bounded::<(usize, Option<T>)>(total);

        for (index, job) in jobs.into_iter().enumerate() {
            let done = done_tx.clone();
            let wrapped: Job = Box::new(move || {
                // A panicking job is reported as a missing output; the pass
                // discards everything, so unwind safety of captures is moot.
                let output = catch_unwind(AssertUnwindSafe(job)).ok();
                let _ = done.send((index, output));
            });
            tx.send(wrapped).map_err(|_| PassError::PoolShutDown)?;
        }
        drop(done_tx);

        let mut outputs: Vec<Option<T>> = (0..total).map(|_| None).collect();
        let mut failed: Option<usize> = None;

        // Barrier: every job must report before the pass completes, even
        // when an earlier job already failed.
        for _ in 0..total {
            let (index, output) = done_rx.recv().map_err(|_| PassError::PoolShutDown)?;
            match output {
                Some(value) => outputs[index] = Some(value),
                None => failed = Some(failed.map_or(index, |f| f.min(index))),
            }
        }

        if let Some(region) = failed {
            warn!(region, "generation pass failed; keeping previous state");
            return Err(PassError::RegionFailed { region });
        }

        Ok(outputs
            .into_iter()
            .map(|slot| slot.expect("barrier guarantees every output"))
            .collect())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the channel wakes every worker out of recv().
        self.job_tx = None;
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}
