//! Blocking FIFO queue shared between producer and consumer threads.
//!
//! # Invariants
//!
//! | Property | Verified By |
//! |----------|-------------|
//! | NoLostElements | DST, loom, integration |
//! | NoDuplicates | DST, integration |
//! | FIFO_Order | DST, proptest |
//! | NoLostWakeup | loom, integration |
//!
//! One mutex guards the sequence and one condition variable signals
//! "became non-empty". A consumer parked in [`ConcurrentQueue::wait_and_pop`]
//! does not hold the lock, and re-checks the sequence on every wake-up.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
#[cfg(not(loom))]
use std::time::{Duration, Instant};

use vc_dst::DstTestableContainer;

use crate::sync::{lock, Condvar, Mutex, MutexGuard};

/// Thread-safe FIFO queue with blocking and non-blocking pops.
///
/// Share it through an `Arc` (or a scoped borrow); every method takes
/// `&self`. There is no close state: a consumer blocked in `wait_and_pop`
/// only returns once some thread pushes.
pub struct ConcurrentQueue<T> {
    items: Mutex<VecDeque<T>>,
    not_empty: Condvar,
}

impl<T> ConcurrentQueue<T> {
    /// Create a new empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
        }
    }

    /// Append `value` at the tail and wake one waiting consumer.
    ///
    /// The notification is sent after the lock is released, so the woken
    /// thread can take the lock immediately.
    pub fn push(&self, value: T) {
        lock(&self.items).push_back(value);
        self.not_empty.notify_one();
    }

    /// Remove the head element, parking the calling thread until one exists.
    ///
    /// Spurious wake-ups are absorbed: the sequence is re-checked under the
    /// lock every time the thread wakes. Blocks forever if nothing is pushed.
    pub fn wait_and_pop(&self) -> T {
        self.wait_until_non_empty(lock(&self.items))
    }

    /// Park on `not_empty` until the head can be taken. Consumes the guard.
    fn wait_until_non_empty(&self, mut items: MutexGuard<'_, VecDeque<T>>) -> T {
        loop {
            if let Some(value) = items.pop_front() {
                return value;
            }
            tracing::trace!("queue empty, parking consumer");
            items = self
                .not_empty
                .wait(items)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
    }

    /// [`wait_and_pop`](Self::wait_and_pop), assigning into `slot`.
    ///
    /// The previous value of `slot` is dropped.
    pub fn wait_and_pop_into(&self, slot: &mut T) {
        *slot = self.wait_and_pop();
    }

    /// [`wait_and_pop`](Self::wait_and_pop), returning a shared handle.
    pub fn wait_and_pop_shared(&self) -> Arc<T> {
        Arc::new(self.wait_and_pop())
    }

    /// Like [`wait_and_pop`](Self::wait_and_pop) but gives up after `timeout`.
    ///
    /// Returns `None` if the queue stayed empty for the whole duration. A
    /// timeout too large to represent as a deadline, such as
    /// `Duration::MAX`, waits without bound.
    #[cfg(not(loom))]
    pub fn wait_and_pop_timeout(&self, timeout: Duration) -> Option<T> {
        let mut items = lock(&self.items);
        if let Some(value) = items.pop_front() {
            return Some(value);
        }

        // A deadline past the end of `Instant` means no deadline at all.
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Some(self.wait_until_non_empty(items));
        };

        loop {
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, _) = self
                .not_empty
                .wait_timeout(items, deadline - now)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            items = guard;
            if let Some(value) = items.pop_front() {
                return Some(value);
            }
        }
    }

    /// Remove the head element without blocking. `None` when empty.
    pub fn try_pop(&self) -> Option<T> {
        lock(&self.items).pop_front()
    }

    /// [`try_pop`](Self::try_pop) into `slot`. Returns `false` and leaves
    /// `slot` untouched when the queue is empty.
    pub fn try_pop_into(&self, slot: &mut T) -> bool {
        match self.try_pop() {
            Some(value) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// [`try_pop`](Self::try_pop), returning a shared handle.
    pub fn try_pop_shared(&self) -> Option<Arc<T>> {
        self.try_pop().map(Arc::new)
    }

    /// Whether the queue held no elements at the moment of the call.
    ///
    /// Advisory only: another thread may push or pop before the caller acts
    /// on the answer. Never use it as the precondition for a pop; use
    /// [`try_pop`](Self::try_pop) instead.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.items).is_empty()
    }

    /// Number of queued elements at the moment of the call. Advisory, like
    /// [`is_empty`](Self::is_empty).
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    /// Remove every queued element in one critical section, head first.
    pub fn drain(&self) -> Vec<T> {
        lock(&self.items).drain(..).collect()
    }
}

impl<T: Clone> ConcurrentQueue<T> {
    /// Copy of the current contents, head first, taken under the lock.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        lock(&self.items).iter().cloned().collect()
    }
}

impl<T> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for ConcurrentQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: Mutex::new(iter.into_iter().collect()),
            not_empty: Condvar::new(),
        }
    }
}

impl<T> fmt::Debug for ConcurrentQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentQueue")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl DstTestableContainer for ConcurrentQueue<u64> {
    fn new() -> Self {
        ConcurrentQueue::new()
    }

    fn push(&self, value: u64) {
        ConcurrentQueue::push(self, value);
    }

    fn pop(&self) -> Option<u64> {
        self.try_pop()
    }

    fn is_empty(&self) -> bool {
        ConcurrentQueue::is_empty(self)
    }

    fn get_contents(&self) -> Vec<u64> {
        self.snapshot()
    }
}
