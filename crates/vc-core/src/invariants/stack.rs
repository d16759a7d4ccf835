//! Stack invariants.
//!
//! | Property | Description |
//! |----------|-------------|
//! | NoLostElements | Every pushed element is in the stack or was popped |
//! | NoDuplicates | No element is delivered or held more often than it was pushed |
//! | LIFO_Order | Last-in-first-out ordering |
//! | EmptyPopConsistency | `EmptyContainer` only when the model stack is empty |

use crate::counterexample::{Counterexample, StateSnapshot};
use crate::invariants::history::{OpHistory, OpKind};
use crate::invariants::{duplicated_elements, lost_elements};
use crate::property::{PropertyChecker, PropertyResult};

/// Properties that any stack implementation must satisfy.
///
/// Implementations provide access to their recorded state for
/// property checking. The checker verifies invariants against
/// this state.
pub trait StackProperties {
    /// Current contents of the stack (bottom to top).
    fn current_contents(&self) -> Vec<u64>;

    /// Operation history for LIFO order checking.
    /// Returns owned data to avoid lifetime issues with internal mutexes.
    fn history(&self) -> OpHistory;
}

/// Property checker for stack implementations.
pub struct StackPropertyChecker<'a, T: StackProperties> {
    stack: &'a T,
    dst_seed: Option<u64>,
}

impl<'a, T: StackProperties> StackPropertyChecker<'a, T> {
    /// Create a new checker for the given stack.
    #[must_use]
    pub fn new(stack: &'a T) -> Self {
        Self {
            stack,
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

    /// NoLostElements
    ///
    /// Every element that was pushed must either be in the stack
    /// or have been popped. No elements can be lost.
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
                "Element {} was pushed but is neither in stack nor popped",
                element
            ),
            Some(ce),
        )
    }

    /// NoDuplicates
    fn check_no_duplicates(&self, history: &OpHistory, contents: &[u64]) -> PropertyResult {
        let dups = duplicated_elements(&history.pushed(), &history.popped(), contents);

        match dups.first() {
            None => PropertyResult::pass("NoDuplicates"),
            Some(element) => PropertyResult::fail(
                "NoDuplicates",
                format!("Element {} appears more times than it was pushed", element),
                None,
            ),
        }
    }

    /// LIFO_Order
    ///
    /// Replays the operation history against a model stack and checks
    /// that pop results match.
    fn check_lifo_order(&self, history: &OpHistory, contents: &[u64]) -> PropertyResult {
        let mut model: Vec<u64> = Vec::new();

        for op in &history.operations {
            match (op.kind, op.element) {
                (OpKind::Push, Some(e)) => model.push(e),
                (OpKind::Pop, Some(actual)) => match model.pop() {
                    Some(expected) if expected == actual => {}
                    Some(expected) => {
                        return PropertyResult::fail(
                            "LIFO_Order",
                            format!(
                                "LIFO violated: pop returned {} but model expected {} (step {})",
                                actual, expected, op.step
                            ),
                            Some(history.counterexample_until(op.step, self.dst_seed)),
                        );
                    }
                    None => {
                        return PropertyResult::fail(
                            "LIFO_Order",
                            format!(
                                "LIFO violated: pop returned {} but model stack was empty (step {})",
                                actual, op.step
                            ),
                            Some(history.counterexample_until(op.step, self.dst_seed)),
                        );
                    }
                },
                _ => {}
            }
        }

        if model != contents {
            return PropertyResult::fail(
                "LIFO_Order",
                format!("Remaining contents {:?} differ from model {:?}", contents, model),
                None,
            );
        }

        PropertyResult::pass("LIFO_Order")
    }

    /// EmptyPopConsistency
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
                            "Pop failed with EmptyContainer but model has {} elements (step {})",
                            held, op.step
                        ),
                        Some(history.counterexample_until(op.step, self.dst_seed)),
                    );
                }
                OpKind::PopEmpty => {}
            }
        }

        PropertyResult::pass("EmptyPopConsistency")
    }
}

impl<T: StackProperties> PropertyChecker for StackPropertyChecker<'_, T> {
    fn check_all(&self) -> Vec<PropertyResult> {
        let history = self.stack.history();
        let contents = self.stack.current_contents();

        vec![
            self.check_no_lost_elements(&history, &contents),
            self.check_no_duplicates(&history, &contents),
            self.check_lifo_order(&history, &contents),
            self.check_empty_pop_consistency(&history),
        ]
    }
}
