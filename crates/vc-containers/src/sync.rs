//! Sync primitives, swapped for loom's under `--cfg loom`.
//!
//! ```bash
//! RUSTFLAGS="--cfg loom" cargo test -p vc-containers --release
//! ```

use std::sync::PoisonError;

#[cfg(loom)]
pub(crate) use loom::sync::{Condvar, Mutex, MutexGuard};

#[cfg(not(loom))]
pub(crate) use std::sync::{Condvar, Mutex, MutexGuard};

/// Lock, recovering the guard if a previous holder panicked.
///
/// Every critical section in this crate moves elements with a single
/// `Vec`/`VecDeque` call, so the sequence is valid even after a panic.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
