//! Invariant traits for lock-based containers.
//!
//! - `queue`: FIFO queue invariants (NoLostElements, NoDuplicates, FIFO_Order, EmptyPopConsistency)
//! - `stack`: LIFO stack invariants (NoLostElements, NoDuplicates, LIFO_Order, EmptyPopConsistency)
//!
//! Both checkers replay a recorded `OpHistory` against a sequential model.
//! Because every container operation runs under a single lock, the
//! recording order is the linearization order.

pub mod history;
pub mod queue;
pub mod stack;

use std::collections::HashMap;

pub use history::{OpHistory, OpKind, RecordedOp};
pub use queue::{QueueProperties, QueuePropertyChecker};
pub use stack::{StackProperties, StackPropertyChecker};

/// Count occurrences of each element.
pub(crate) fn multiset(values: impl IntoIterator<Item = u64>) -> HashMap<u64, usize> {
    let mut counts = HashMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
}

/// Elements that were pushed more often than they are now accounted for
/// (popped + still held). Sorted for stable messages.
pub(crate) fn lost_elements(pushed: &[u64], popped: &[u64], contents: &[u64]) -> Vec<u64> {
    let pushed = multiset(pushed.iter().copied());
    let accounted = multiset(popped.iter().chain(contents.iter()).copied());

    let mut lost: Vec<u64> = pushed
        .iter()
        .filter(|(v, n)| accounted.get(*v).copied().unwrap_or(0) < **n)
        .map(|(v, _)| *v)
        .collect();
    lost.sort_unstable();
    lost
}

/// Elements accounted for (popped + held) more often than they were pushed.
pub(crate) fn duplicated_elements(pushed: &[u64], popped: &[u64], contents: &[u64]) -> Vec<u64> {
    let pushed = multiset(pushed.iter().copied());
    let accounted = multiset(popped.iter().chain(contents.iter()).copied());

    let mut dups: Vec<u64> = accounted
        .iter()
        .filter(|(v, n)| pushed.get(*v).copied().unwrap_or(0) < **n)
        .map(|(v, _)| *v)
        .collect();
    dups.sort_unstable();
    dups
}
