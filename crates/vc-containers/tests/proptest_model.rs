//! Property-based model tests.
//!
//! Arbitrary single-threaded operation sequences are applied to a container
//! and to a plain `VecDeque`/`Vec` model side by side; every observable
//! result must agree.

#![cfg(not(loom))]

use std::collections::VecDeque;

use proptest::prelude::*;

use vc_containers::{ConcurrentQueue, ConcurrentStack, EmptyContainer};

#[derive(Debug, Clone)]
enum Op {
    Push(i32),
    Pop,
    Len,
    Drain,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<i32>().prop_map(Op::Push),
        3 => Just(Op::Pop),
        1 => Just(Op::Len),
        1 => Just(Op::Drain),
    ]
}

proptest! {
    /// The queue behaves exactly like a `VecDeque` used at both ends.
    #[test]
    fn prop_queue_matches_model(ops in prop::collection::vec(arb_op(), 0..200)) {
        let queue = ConcurrentQueue::new();
        let mut model = VecDeque::new();

        for op in ops {
            match op {
                Op::Push(v) => {
                    queue.push(v);
                    model.push_back(v);
                }
                Op::Pop => prop_assert_eq!(queue.try_pop(), model.pop_front()),
                Op::Len => {
                    prop_assert_eq!(queue.len(), model.len());
                    prop_assert_eq!(queue.is_empty(), model.is_empty());
                }
                Op::Drain => {
                    let expected: Vec<i32> = model.drain(..).collect();
                    prop_assert_eq!(queue.drain(), expected);
                }
            }
        }

        prop_assert_eq!(queue.snapshot(), model.into_iter().collect::<Vec<_>>());
    }

    /// The stack behaves exactly like a `Vec`, with emptiness as an error.
    #[test]
    fn prop_stack_matches_model(ops in prop::collection::vec(arb_op(), 0..200)) {
        let stack = ConcurrentStack::new();
        let mut model = Vec::new();

        for op in ops {
            match op {
                Op::Push(v) => {
                    stack.push(v);
                    model.push(v);
                }
                Op::Pop => prop_assert_eq!(stack.pop(), model.pop().ok_or(EmptyContainer)),
                Op::Len => {
                    prop_assert_eq!(stack.len(), model.len());
                    prop_assert_eq!(stack.is_empty(), model.is_empty());
                }
                Op::Drain => {
                    let expected: Vec<i32> = model.drain(..).rev().collect();
                    prop_assert_eq!(stack.drain(), expected);
                }
            }
        }

        prop_assert_eq!(stack.snapshot(), model);
    }

    /// A copy never observes pushes or pops made on the original afterwards.
    #[test]
    fn prop_stack_copy_is_independent(
        before in prop::collection::vec(any::<u16>(), 0..50),
        after in prop::collection::vec(any::<u16>(), 0..50),
        pops in 0usize..60,
    ) {
        let original: ConcurrentStack<u16> = before.iter().copied().collect();
        let copy = original.clone();

        for v in &after {
            original.push(*v);
        }
        for _ in 0..pops {
            let _ = original.pop();
        }

        prop_assert_eq!(copy.snapshot(), before);
    }

    /// The `_into` and `_shared` pop forms return the same element as the plain one.
    #[test]
    fn prop_pop_forms_agree(values in prop::collection::vec(any::<i64>(), 1..50)) {
        let queue: ConcurrentQueue<i64> = values.iter().copied().collect();
        let stack: ConcurrentStack<i64> = values.iter().copied().collect();

        let mut slot = 0;
        prop_assert!(queue.try_pop_into(&mut slot));
        prop_assert_eq!(slot, values[0]);
        prop_assert_eq!(stack.pop_into(&mut slot), Ok(()));
        prop_assert_eq!(slot, values[values.len() - 1]);

        if values.len() > 1 {
            let from_queue = queue.try_pop_shared();
            let from_stack = stack.pop_shared();
            prop_assert_eq!(from_queue.as_deref(), Some(&values[1]));
            prop_assert_eq!(from_stack.as_deref(), Ok(&values[values.len() - 2]));
        }
    }
}
