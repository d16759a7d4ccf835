//! Queue invariants.
//!
//! | Property | Description |
//! |----------|-------------|
//! | NoLostElements | Every pushed element is in the queue or was popped |
//! | NoDuplicates | No element is delivered or held more often than it was pushed |
//! | FIFO_Order | Pops return elements in the order they were pushed |
//! | EmptyPopConsistency | An empty pop only happens when the model queue is empty |

use std::collections::VecDeque;

use crate::counterexample::{Counterexample, StateSnapshot};
use crate::invariants::history::{OpHistory, OpKind};
use crate::invariants::{duplicated_elements, lost_elements};
use crate::property::{PropertyChecker, PropertyResult};

/// Properties that any FIFO queue implementation must satisfy.
///
/// Implementations expose recorded history and current contents; the
/// checker verifies invariants against them.
pub trait QueueProperties {
    /// Current contents of the queue (head to tail).
    fn current_contents(&self) -> Vec<u64>;

    /// Operation history in lock-acquisition order.
    /// Returns owned data to avoid lifetime issues with internal mutexes.
    fn history(&self) -> OpHistory;
}

/// Property checker for queue implementations.
pub struct QueuePropertyChecker<'a, T: QueueProperties> {
    queue: &'a T,
    dst_seed: Option<u64>,
}

impl<'a, T: QueueProperties> QueuePropertyChecker<'a, T> {
    /// Create a new checker for the given queue.
    #[must_use]
    pub fn new(queue: &'a T) -> Self {
        Self {
            queue,
            dst_seed: None,
        }
    }

    /// Set DST seed for counterexample reproduction.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        debug_assert!(seed != 0, "DST seed should not be zero");
        self.dst_seed = Some(seed);
        self
    }

    fn check_no_lost_elements(&self, history: &OpHistory, contents: &[u64]) -> PropertyResult {
        let pushed = history.pushed();
        let popped = history.popped();
        let lost = lost_elements(&pushed, &popped, contents);

        let Some(&element) = lost.first() else {
            return PropertyResult::pass("NoLostElements");
        };

        let mut ce = Counterexample::maybe_seeded(self.dst_seed);
        ce.add_state(StateSnapshot {
            step: 1,
            description: format!("Element {} lost", element),
            variables: vec![
                ("pushed".to_string(), format!("{:?}", pushed)),
                ("popped".to_string(), format!("{:?}", popped)),
                ("contents".to_string(), format!("{:?}", contents)),
            ],
        });

        PropertyResult::fail(
            "NoLostElements",
            format!(
                "Element {} was pushed but is neither in the queue nor popped ({} lost total)",
                element,
                lost.len()
            ),
            Some(ce),
        )
    }

    fn check_no_duplicates(&self, history: &OpHistory, contents: &[u64]) -> PropertyResult {
        let dups = duplicated_elements(&history.pushed(), &history.popped(), contents);

        match dups.first() {
            None => PropertyResult::pass("NoDuplicates"),
            Some(element) => PropertyResult::fail(
                "NoDuplicates",
                format!("Element {} observed more times than it was pushed", element),
                None,
            ),
        }
    }

    /// Replay the history against a `VecDeque` model.
    fn check_fifo_order(&self, history: &OpHistory, contents: &[u64]) -> PropertyResult {
        let mut model: VecDeque<u64> = VecDeque::new();

        for op in &history.operations {
            match (op.kind, op.element) {
                (OpKind::Push, Some(e)) => model.push_back(e),
                (OpKind::Pop, Some(actual)) => match model.pop_front() {
                    Some(expected) if expected == actual => {}
                    Some(expected) => {
                        return PropertyResult::fail(
                            "FIFO_Order",
                            format!(
                                "FIFO violated: pop returned {} but model expected {} (step {})",
                                actual, expected, op.step
                            ),
                            Some(self.trace(history, op.step)),
                        );
                    }
                    None => {
                        return PropertyResult::fail(
                            "FIFO_Order",
                            format!(
                                "FIFO violated: pop returned {} but model queue was empty (step {})",
                                actual, op.step
                            ),
                            Some(self.trace(history, op.step)),
                        );
                    }
                },
                _ => {}
            }
        }

        // Whatever is still held must be the model's remainder, in order.
        if !model.iter().eq(contents.iter()) {
            return PropertyResult::fail(
                "FIFO_Order",
                format!(
                    "Remaining contents {:?} differ from model {:?}",
                    contents, model
                ),
                None,
            );
        }

        PropertyResult::pass("FIFO_Order")
    }

    fn check_empty_pop_consistency(&self, history: &OpHistory) -> PropertyResult {
        let mut held: usize = 0;

        for op in &history.operations {
            match op.kind {
                OpKind::Push => held += 1,
                OpKind::Pop => held = held.saturating_sub(1),
                OpKind::PopEmpty if held > 0 => {
                    return PropertyResult::fail(
                        "EmptyPopConsistency",
                        format!(
                            "Pop reported empty while {} elements were queued (step {})",
                            held, op.step
                        ),
                        Some(self.trace(history, op.step)),
                    );
                }
                OpKind::PopEmpty => {}
            }
        }

        PropertyResult::pass("EmptyPopConsistency")
    }

    fn trace(&self, history: &OpHistory, step: u64) -> Counterexample {
        history.counterexample_until(step, self.dst_seed)
    }
}

impl<T: QueueProperties> PropertyChecker for QueuePropertyChecker<'_, T> {
    fn check_all(&self) -> Vec<PropertyResult> {
        let history = self.queue.history();
        let contents = self.queue.current_contents();

        vec![
            self.check_no_lost_elements(&history, &contents),
            self.check_no_duplicates(&history, &contents),
            self.check_fifo_order(&history, &contents),
            self.check_empty_pop_consistency(&history),
        ]
    }
}
