//! LIFO stack with a failing pop and a locked copy.
//!
//! # Invariants
//!
//! | Property | Verified By |
//! |----------|-------------|
//! | NoLostElements | DST, loom, integration |
//! | NoDuplicates | DST, integration |
//! | LIFO_Order | DST, proptest |
//! | EmptyPopConsistency | DST |
//! | CopyIsolation | integration |

use std::fmt;
use std::sync::Arc;

use vc_dst::DstTestableContainer;

use crate::error::EmptyContainer;
use crate::sync::{lock, Mutex};

/// Thread-safe LIFO stack.
///
/// `pop` on an empty stack returns [`EmptyContainer`] instead of blocking.
/// Cloning takes the source's lock for the duration of the copy.
pub struct ConcurrentStack<T> {
    items: Mutex<Vec<T>>,
}

impl<T> ConcurrentStack<T> {
    /// Create a new empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    /// Place `value` on top.
    pub fn push(&self, value: T) {
        lock(&self.items).push(value);
    }

    /// Remove and return the top element.
    ///
    /// # Errors
    ///
    /// [`EmptyContainer`] if the stack holds nothing. No retry is attempted.
    pub fn pop(&self) -> Result<T, EmptyContainer> {
        lock(&self.items).pop().ok_or(EmptyContainer)
    }

    /// [`pop`](Self::pop) into `slot`. On error `slot` is left untouched.
    ///
    /// # Errors
    ///
    /// [`EmptyContainer`] if the stack holds nothing.
    pub fn pop_into(&self, slot: &mut T) -> Result<(), EmptyContainer> {
        *slot = self.pop()?;
        Ok(())
    }

    /// [`pop`](Self::pop), returning a shared handle.
    ///
    /// # Errors
    ///
    /// [`EmptyContainer`] if the stack holds nothing.
    pub fn pop_shared(&self) -> Result<Arc<T>, EmptyContainer> {
        self.pop().map(Arc::new)
    }

    /// Whether the stack held no elements at the moment of the call.
    ///
    /// Advisory only. `if !stack.is_empty() { stack.pop() }` can still fail
    /// when another thread pops in between; handle the `Result` instead.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.items).is_empty()
    }

    /// Number of elements at the moment of the call. Advisory.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    /// Remove every element in one critical section, top first.
    pub fn drain(&self) -> Vec<T> {
        let mut items = std::mem::take(&mut *lock(&self.items));
        items.reverse();
        items
    }
}

impl<T: Clone> ConcurrentStack<T> {
    /// Copy of the current contents, bottom first, taken under the lock.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        lock(&self.items).to_vec()
    }
}

/// Copy construction.
///
/// Only the source is locked: the new stack is not visible to any other
/// thread until `clone` returns. There is no method that overwrites a
/// shared stack with another's contents; `clone_from` keeps its default,
/// which needs `&mut self` and so exclusive access to the destination.
impl<T: Clone> Clone for ConcurrentStack<T> {
    fn clone(&self) -> Self {
        let items = self.snapshot();
        tracing::debug!(len = items.len(), "copied stack");
        Self {
            items: Mutex::new(items),
        }
    }
}

impl<T> Default for ConcurrentStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for ConcurrentStack<T> {
    /// Pushes in iteration order; the last item ends up on top.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: Mutex::new(iter.into_iter().collect()),
        }
    }
}

impl<T> fmt::Debug for ConcurrentStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentStack")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl DstTestableContainer for ConcurrentStack<u64> {
    fn new() -> Self {
        ConcurrentStack::new()
    }

    fn push(&self, value: u64) {
        ConcurrentStack::push(self, value);
    }

    fn pop(&self) -> Option<u64> {
        ConcurrentStack::pop(self).ok()
    }

    fn is_empty(&self) -> bool {
        ConcurrentStack::is_empty(self)
    }

    fn get_contents(&self) -> Vec<u64> {
        self.snapshot()
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;
    use std::thread;

    use vc_core::{PropertyChecker, StackPropertyChecker};
    use vc_dst::{get_or_generate_seed, DstEnv, DstRunner, FaultConfig};

    #[test]
    fn test_basic_push_pop() {
        let stack = ConcurrentStack::new();

        stack.push(1);
        stack.push(2);
        stack.push(3);

        assert_eq!(stack.pop(), Ok(3));
        assert_eq!(stack.pop(), Ok(2));
        assert_eq!(stack.pop(), Ok(1));
        assert_eq!(stack.pop(), Err(EmptyContainer));
    }

    #[test]
    fn test_lifo_order() {
        let stack = ConcurrentStack::new();
        for i in 1..=10 {
            stack.push(i);
        }
        for i in (1..=10).rev() {
            assert_eq!(stack.pop(), Ok(i), "LIFO order violated");
        }
    }

    #[test]
    fn test_empty_pop_variants() {
        let stack = ConcurrentStack::<String>::new();
        assert!(stack.is_empty());

        let mut slot = String::from("keep");
        assert_eq!(stack.pop_into(&mut slot), Err(EmptyContainer));
        assert_eq!(slot, "keep");
        assert_eq!(stack.pop_shared(), Err(EmptyContainer));

        stack.push("x".to_string());
        stack.push("y".to_string());
        assert_eq!(stack.pop_into(&mut slot), Ok(()));
        assert_eq!(slot, "y");
        assert_eq!(*stack.pop_shared().unwrap(), "x");
    }

    #[test]
    fn test_copy_isolation() {
        let original: ConcurrentStack<char> = ['a', 'b', 'c'].into_iter().collect();
        let copy = original.clone();

        original.push('d');
        assert_eq!(copy.len(), 3);
        assert_eq!(copy.drain(), vec!['c', 'b', 'a']);

        copy.push('z');
        assert_eq!(original.snapshot(), vec!['a', 'b', 'c', 'd']);
    }

    #[test]
    fn test_clone_while_mutated() {
        let stack = ConcurrentStack::new();
        for i in 0..100 {
            stack.push(i);
        }

        thread::scope(|s| {
            s.spawn(|| {
                for i in 100..1100 {
                    stack.push(i);
                }
            });
            s.spawn(|| {
                for _ in 0..20 {
                    // Each copy is one consistent prefix of the pushes.
                    let copy = stack.clone().snapshot();
                    assert!(copy.len() >= 100);
                    assert!(copy.iter().copied().eq(0..copy.len()));
                }
            });
        });

        assert_eq!(stack.len(), 1100);
    }

    #[test]
    fn test_drain_and_debug() {
        let stack: ConcurrentStack<u8> = (1..=3).collect();
        assert_eq!(format!("{:?}", stack), "ConcurrentStack { len: 3, .. }");
        assert_eq!(stack.drain(), vec![3, 2, 1]);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_invariants_basic() {
        let runner: DstRunner<ConcurrentStack<u64>> = DstRunner::with_fault_config(1, FaultConfig::none());
        runner.push(1).unwrap();
        runner.push(2).unwrap();
        assert_eq!(runner.pop().unwrap(), Some(2));
        assert_eq!(runner.pop().unwrap(), Some(1));
        assert_eq!(runner.pop().unwrap(), None);

        let checker = StackPropertyChecker::new(&runner);
        assert!(checker.all_hold(), "Invariants should hold");
    }

    #[test]
    fn test_dst_single_threaded() {
        let seed = get_or_generate_seed();
        let mut env = DstEnv::with_fault_config(seed, FaultConfig::none());
        let runner: DstRunner<ConcurrentStack<u64>> = DstRunner::with_fault_config(seed, FaultConfig::none());
        let checker = StackPropertyChecker::new(&runner).with_seed(seed);

        for _ in 0..vc_dst::dst_iterations() {
            match env.rng().gen_range(0..3_u8) {
                0 => {
                    let value = env.rng().gen_range(1..1000_u64);
                    runner.push(value).unwrap();
                }
                1 => {
                    runner.pop().unwrap();
                }
                _ => {
                    assert!(
                        checker.all_hold(),
                        "Invariant violated at {}: {:?}",
                        env.format_seed(),
                        checker.violations()
                    );
                }
            }
        }

        assert!(
            checker.all_hold(),
            "Final invariant check failed at {}",
            env.format_seed()
        );

        println!("DST completed: {}", env.stats());
    }

    #[test]
    fn test_dst_with_faults() {
        let seed = get_or_generate_seed();
        let mut env = DstEnv::new(seed);
        let runner: DstRunner<ConcurrentStack<u64>> = DstRunner::new(seed);
        let checker = StackPropertyChecker::new(&runner).with_seed(seed);

        let mut values_to_push: Vec<u64> = (1..=100).collect();
        env.rng().shuffle(&mut values_to_push);
        let mut push_idx = 0;

        for _ in 0..vc_dst::dst_iterations() {
            env.maybe_delay();

            match env.rng().gen_range(0..4_u8) {
                0 if push_idx < values_to_push.len() => {
                    let _ = runner.push(values_to_push[push_idx]);
                    push_idx += 1;
                }
                1 | 2 => {
                    let _ = runner.pop();
                }
                _ => {
                    assert!(
                        checker.all_hold(),
                        "Invariant violated at {}",
                        env.format_seed()
                    );
                }
            }

            let delay = env.rng().gen_range(1..100_u64);
            env.clock().advance_us(delay);
        }

        assert!(
            checker.all_hold(),
            "Final invariant check failed at {}",
            env.format_seed()
        );

        println!("DST with faults completed: {}", runner.stats().format());
    }
}
