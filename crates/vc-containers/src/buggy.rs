//! Deliberately broken containers.
//!
//! Each one gets a single operation wrong. They exist so the property
//! checkers and DST harness can be shown to catch real mistakes.
//!
//! # Bug Catalog
//!
//! | Implementation | Bug | Caught By |
//! |----------------|-----|-----------|
//! | LostElementStack | Drops pushes once full | NoLostElements |
//! | ReorderingQueue | Pops from the tail | FIFO_Order |
//! | SpuriousEmptyQueue | Reports empty every third pop | EmptyPopConsistency |

use std::collections::VecDeque;

use vc_dst::DstTestableContainer;

use crate::sync::{lock, Mutex};

/// Pushes beyond this many held elements are silently discarded.
pub const LOST_ELEMENT_CAPACITY: usize = 8;

// =============================================================================
// Bug 1: Bounded stack that forgets overflow
// =============================================================================

/// Stack with a fixed capacity that does not report overflow.
///
/// BUG: a push onto a full stack returns normally but stores nothing.
pub struct LostElementStack {
    items: Mutex<Vec<u64>>,
}

impl DstTestableContainer for LostElementStack {
    fn new() -> Self {
        Self {
            items: Mutex::new(Vec::with_capacity(LOST_ELEMENT_CAPACITY)),
        }
    }

    fn push(&self, value: u64) {
        let mut items = lock(&self.items);
        // BUG: should grow or fail loudly.
        if items.len() < LOST_ELEMENT_CAPACITY {
            items.push(value);
        }
    }

    fn pop(&self) -> Option<u64> {
        lock(&self.items).pop()
    }

    fn is_empty(&self) -> bool {
        lock(&self.items).is_empty()
    }

    fn get_contents(&self) -> Vec<u64> {
        lock(&self.items).clone()
    }
}

// =============================================================================
// Bug 2: Queue that pops from the wrong end
// =============================================================================

/// Queue that hands out the newest element instead of the oldest.
///
/// BUG: `pop_back` where `pop_front` belongs. Nothing is lost, so only
/// the order check notices.
pub struct ReorderingQueue {
    items: Mutex<VecDeque<u64>>,
}

impl DstTestableContainer for ReorderingQueue {
    fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    fn push(&self, value: u64) {
        lock(&self.items).push_back(value);
    }

    fn pop(&self) -> Option<u64> {
        // BUG
        lock(&self.items).pop_back()
    }

    fn is_empty(&self) -> bool {
        lock(&self.items).is_empty()
    }

    fn get_contents(&self) -> Vec<u64> {
        lock(&self.items).iter().copied().collect()
    }
}

// =============================================================================
// Bug 3: Queue that sometimes claims to be empty
// =============================================================================

/// Queue whose non-blocking pop gives up every third call.
///
/// BUG: models a try-lock that treats contention as emptiness.
pub struct SpuriousEmptyQueue {
    state: Mutex<SpuriousState>,
}

struct SpuriousState {
    items: VecDeque<u64>,
    pops_count: u64,
}

impl DstTestableContainer for SpuriousEmptyQueue {
    fn new() -> Self {
        Self {
            state: Mutex::new(SpuriousState {
                items: VecDeque::new(),
                pops_count: 0,
            }),
        }
    }

    fn push(&self, value: u64) {
        lock(&self.state).items.push_back(value);
    }

    fn pop(&self) -> Option<u64> {
        let mut state = lock(&self.state);
        state.pops_count += 1;
        if state.pops_count % 3 == 0 {
            return None;
        }
        state.items.pop_front()
    }

    fn is_empty(&self) -> bool {
        lock(&self.state).items.is_empty()
    }

    fn get_contents(&self) -> Vec<u64> {
        lock(&self.state).items.iter().copied().collect()
    }
}
