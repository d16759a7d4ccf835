//! Operation history shared by the queue and stack checkers.

use crate::counterexample::{Counterexample, ThreadAction};

/// Kind of a recorded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Push,
    Pop,
    /// A pop that found the container empty (queue `try_pop` -> `None`,
    /// stack `pop` -> `EmptyContainer`).
    PopEmpty,
}

/// A single recorded operation.
#[derive(Debug, Clone)]
pub struct RecordedOp {
    /// Thread that performed the operation
    pub thread_id: u64,
    /// Type of operation
    pub kind: OpKind,
    /// Element pushed, or element returned by a pop
    pub element: Option<u64>,
    /// Step number for ordering
    pub step: u64,
}

impl RecordedOp {
    /// Short label used in counterexample diagrams.
    #[must_use]
    pub fn label(&self) -> String {
        match (self.kind, self.element) {
            (OpKind::Push, Some(e)) => format!("push({})", e),
            (OpKind::Pop, Some(e)) => format!("pop()={}", e),
            _ => "pop()".to_string(),
        }
    }
}

/// History of container operations in lock-acquisition order.
#[derive(Debug, Clone, Default)]
pub struct OpHistory {
    pub operations: Vec<RecordedOp>,
}

impl OpHistory {
    /// Create a new empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Step assigned to the next recorded operation.
    #[must_use]
    pub fn next_step(&self) -> u64 {
        self.operations.len() as u64 + 1
    }

    /// Record a push.
    pub fn record_push(&mut self, thread_id: u64, element: u64) {
        let step = self.next_step();
        self.operations.push(RecordedOp {
            thread_id,
            kind: OpKind::Push,
            element: Some(element),
            step,
        });
    }

    /// Record a pop; `None` means the container was empty.
    pub fn record_pop(&mut self, thread_id: u64, element: Option<u64>) {
        let step = self.next_step();
        self.operations.push(RecordedOp {
            thread_id,
            kind: if element.is_some() {
                OpKind::Pop
            } else {
                OpKind::PopEmpty
            },
            element,
            step,
        });
    }

    /// Pushed elements in recording order.
    #[must_use]
    pub fn pushed(&self) -> Vec<u64> {
        self.operations
            .iter()
            .filter(|op| op.kind == OpKind::Push)
            .filter_map(|op| op.element)
            .collect()
    }

    /// Popped elements in recording order.
    #[must_use]
    pub fn popped(&self) -> Vec<u64> {
        self.operations
            .iter()
            .filter(|op| op.kind == OpKind::Pop)
            .filter_map(|op| op.element)
            .collect()
    }

    /// Number of recorded operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Counterexample holding every operation up to and including `step`.
    #[must_use]
    pub fn counterexample_until(&self, step: u64, seed: Option<u64>) -> Counterexample {
        let mut ce = Counterexample::maybe_seeded(seed);
        for op in self.operations.iter().take_while(|op| op.step <= step) {
            ce.add_action(ThreadAction {
                thread_id: op.thread_id,
                step: op.step,
                action: op.label(),
                success: op.kind != OpKind::PopEmpty,
            });
        }
        ce
    }
}
