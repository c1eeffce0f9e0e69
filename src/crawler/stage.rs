//! Worker-pool plumbing shared by the crawl and post-process stages
//!
//! A stage is a [`WorkQueue`]: a bounded channel whose receiving end is
//! shared by a fixed pool of workers, plus a [`CompletionCounter`] tracking
//! how many submitted tasks have not finished yet. Quiescence is detected
//! through the counter, never through queue emptiness: a task that is being
//! executed is invisible to the channel but still counts as outstanding.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio_util::sync::CancellationToken;

/// A submission was made to a stage that has already been closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{0} queue is closed")]
pub struct QueueClosed(pub &'static str);

/// Atomic count of outstanding tasks with a wait-for-zero signal
#[derive(Debug, Default)]
pub struct CompletionCounter {
    outstanding: AtomicUsize,
    zero: Notify,
}

impl CompletionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
    }

    /// Marks one task finished, waking every waiter when the count hits zero
    pub fn decrement(&self) {
        let previous = self.outstanding.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "completion counter underflow");
        if previous == 1 {
            self.zero.notify_waiters();
        }
    }

    pub fn count(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Waits until the count is zero
    ///
    /// Returns immediately if it already is. The waiter registers for
    /// notification before reading the count, so a decrement landing between
    /// the read and the await is never missed.
    pub async fn wait_for_zero(&self) {
        loop {
            let notified = self.zero.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Decrements a counter when dropped, so every exit path of a task counts
struct Completion<'a>(&'a CompletionCounter);

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Bounded multi-consumer task queue with completion tracking
pub struct WorkQueue<T> {
    name: &'static str,
    tx: mpsc::Sender<T>,
    rx: Mutex<mpsc::Receiver<T>>,
    pending: CompletionCounter,
    closed: CancellationToken,
}

impl<T: Send> WorkQueue<T> {
    /// Creates a queue holding at most `capacity` waiting tasks
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            name,
            tx,
            rx: Mutex::new(rx),
            pending: CompletionCounter::new(),
            closed: CancellationToken::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Enqueues a task, counting it outstanding before it becomes visible
    ///
    /// Waits for space when the queue is full. Fails with [`QueueClosed`]
    /// if the queue is closed before or while waiting; the task is then
    /// dropped and not counted.
    pub async fn submit(&self, task: T) -> Result<(), QueueClosed> {
        if self.closed.is_cancelled() {
            return Err(QueueClosed(self.name));
        }

        self.pending.increment();
        let sent = tokio::select! {
            biased;
            _ = self.closed.cancelled() => false,
            result = self.tx.send(task) => result.is_ok(),
        };

        if sent {
            Ok(())
        } else {
            self.pending.decrement();
            Err(QueueClosed(self.name))
        }
    }

    /// Number of tasks submitted but not yet finished
    pub fn pending(&self) -> usize {
        self.pending.count()
    }

    /// Waits until every submitted task has finished
    pub async fn wait_idle(&self) {
        self.pending.wait_for_zero().await;
    }

    /// Stops accepting tasks and lets idle workers return
    ///
    /// Tasks already buffered are still handed out; workers only return once
    /// the buffer is empty.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Runs one worker until the queue is closed and drained
    ///
    /// Workers take turns on the shared receiver; the lock is released
    /// before `handler` runs, so handlers execute in parallel. The task is
    /// counted finished when `handler` returns.
    pub async fn run_worker<F, Fut>(&self, mut handler: F)
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = ()>,
    {
        loop {
            let next = {
                let mut rx = self.rx.lock().await;
                tokio::select! {
                    biased;
                    task = rx.recv() => task,
                    _ = self.closed.cancelled() => None,
                }
            };

            let Some(task) = next else {
                break;
            };

            let _completion = Completion(&self.pending);
            handler(task).await;
        }

        tracing::trace!("{} worker exiting", self.name);
    }
}
