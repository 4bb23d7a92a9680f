//! In-process MPMC task queue
//!
//! FIFO hand-off between the producer and the workers. Sentinels travel
//! through the same queue as payloads, in order.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Unit of work handed to a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task<T> {
    /// An item to process
    Payload(T),
    /// Instruction for exactly one worker to exit
    Shutdown,
}

impl<T> Task<T> {
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Task::Shutdown)
    }
}

struct Inner<T> {
    items: Mutex<VecDeque<Task<T>>>,
    capacity: Option<usize>,
    /// Signalled when an item was queued
    available: Notify,
    /// Signalled when an item was taken
    space: Notify,
}

/// Shared FIFO queue; clones refer to the same queue
pub struct TaskQueue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for TaskQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T> std::fmt::Debug for TaskQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("len", &self.len())
            .field("capacity", &self.inner.capacity)
            .finish()
    }
}

impl<T> TaskQueue<T> {
    pub fn unbounded() -> Self {
        Self::with_capacity(None)
    }

    /// Queue holding at most `capacity` items (`None` for unbounded)
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            inner: Arc::new(Inner {
                items: Mutex::new(VecDeque::new()),
                capacity,
                available: Notify::new(),
                space: Notify::new(),
            }),
        }
    }

    /// Queue an item, waiting for room if the queue is full
    pub async fn push(&self, item: T) {
        let mut item = item;
        loop {
            let space = self.inner.space.notified();
            tokio::pin!(space);
            space.as_mut().enable();

            match self.try_push(item) {
                Ok(()) => return,
                Err(rejected) => item = rejected,
            }

            space.await;
        }
    }

    /// Queue an item if there is room, handing it back otherwise
    pub fn try_push(&self, item: T) -> Result<(), T> {
        {
            let mut items = self.inner.items.lock();
            if let Some(capacity) = self.inner.capacity {
                if items.len() >= capacity {
                    return Err(item);
                }
            }
            items.push_back(Task::Payload(item));
        }
        self.inner.available.notify_one();
        Ok(())
    }

    /// Queue a shutdown sentinel; never waits, ignores capacity
    pub fn push_sentinel(&self) {
        self.inner.items.lock().push_back(Task::Shutdown);
        self.inner.available.notify_one();
    }

    /// Take the oldest task, if any
    pub fn try_pop(&self) -> Option<Task<T>> {
        let (task, more) = {
            let mut items = self.inner.items.lock();
            let task = items.pop_front();
            (task, !items.is_empty())
        };

        if task.is_some() {
            if self.inner.capacity.is_some() {
                self.inner.space.notify_one();
            }
            // Pass the wakeup on so a burst is not drained by a single worker
            if more {
                self.inner.available.notify_one();
            }
        }
        task
    }

    /// Take the oldest task, waiting up to `timeout` for one to arrive
    pub async fn pop_timeout(&self, timeout: Duration) -> Option<Task<T>> {
        let deadline = Instant::now() + timeout;
        loop {
            let available = self.inner.available.notified();
            tokio::pin!(available);
            available.as_mut().enable();

            if let Some(task) = self.try_pop() {
                return Some(task);
            }

            if tokio::time::timeout_at(deadline, available).await.is_err() {
                return self.try_pop();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.lock().is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.inner.capacity
    }
}
