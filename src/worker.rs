//! Worker Pool
//!
//! A small fork-join scheduler backing the parallel draw-call sort. Jobs
//! fan out over an MPMC channel to long-lived named threads; the frame
//! thread blocks on a [`WaitCounter`] until every job of a batch has
//! decremented it to zero. No other part of the core runs off the frame
//! thread.
//!
//! # Ownership
//!
//! Once a batch is submitted, the submitting thread must not touch the
//! buffers the jobs reference until `wait` returns; the sort upholds this
//! by construction (disjoint chunks in, disjoint output regions out).

use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Decrement-to-zero completion counter for one fork-join batch.
pub struct WaitCounter {
    remaining: Mutex<usize>,
    condvar: Condvar,
}

impl WaitCounter {
    /// Creates a counter expecting `count` decrements.
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            remaining: Mutex::new(count),
            condvar: Condvar::new(),
        }
    }

    /// Signals one completed job; wakes waiters when the count hits zero.
    pub fn decrement(&self) {
        let mut remaining = self.remaining.lock();
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            self.condvar.notify_all();
        }
    }

    /// Blocks until every expected decrement has arrived.
    pub fn wait(&self) {
        let mut remaining = self.remaining.lock();
        while *remaining > 0 {
            self.condvar.wait(&mut remaining);
        }
    }
}

/// Fixed set of worker threads consuming jobs from a shared channel.
pub struct WorkerPool {
    sender: Option<flume::Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    worker_count: usize,
}

impl WorkerPool {
    /// Spawns `worker_count` (at least one) named worker threads.
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (sender, receiver) = flume::unbounded::<Job>();

        let workers = (0..worker_count)
            .map(|index| {
                let receiver = receiver.clone();
                std::thread::Builder::new()
                    .name(format!("kiln-worker-{index}"))
                    .spawn(move || {
                        while let Ok(job) = receiver.recv() {
                            job();
                        }
                    })
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self {
            sender: Some(sender),
            workers,
            worker_count,
        }
    }

    /// Number of worker threads (also the fan-out width of the sort).
    #[inline]
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Enqueues one job. Jobs from a single submitter run in submission
    /// order per worker but are distributed across workers.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) {
        if let Some(sender) = &self.sender {
            // Send only fails once the pool is shutting down.
            let _ = sender.send(Box::new(job));
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the channel lets each worker drain and exit.
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn counter_reaches_zero_and_releases_waiter() {
        let pool = WorkerPool::new(4);
        let counter = Arc::new(WaitCounter::new(16));
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..16 {
            let counter = Arc::clone(&counter);
            let hits = Arc::clone(&hits);
            pool.submit(move || {
                hits.fetch_add(1, Ordering::Relaxed);
                counter.decrement();
            });
        }
        counter.wait();
        assert_eq!(hits.load(Ordering::Relaxed), 16);
    }

    #[test]
    fn pool_clamps_to_at_least_one_worker() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.worker_count(), 1);

        let counter = Arc::new(WaitCounter::new(1));
        let counter_clone = Arc::clone(&counter);
        pool.submit(move || counter_clone.decrement());
        counter.wait();
    }
}
