//! Real-thread tests for the queue and stack.
//!
//! Each test spawns OS threads against one shared container, joins them,
//! then inspects the final contents from the test thread.

#![cfg(not(loom))]

use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use vc_containers::{ConcurrentQueue, ConcurrentStack, EmptyContainer};

const PUSH_THREADS: usize = 100;

/// Generous bound for anything that should happen "promptly".
const PROMPT: Duration = Duration::from_secs(5);

/// A non-blocking pop must not wait at all; allow for scheduler noise only.
const NON_BLOCKING: Duration = Duration::from_millis(50);

fn assert_exactly_once(mut drained: Vec<String>, expected: usize) {
    assert_eq!(drained.len(), expected, "drained count");
    drained.sort_unstable();
    drained.dedup();
    assert_eq!(drained.len(), expected, "duplicates were drained");

    let seen: HashSet<String> = drained.into_iter().collect();
    for i in 0..expected {
        assert!(seen.contains(&i.to_string()), "value {} missing", i);
    }
}

#[test]
fn test_queue_concurrent_push_integrity() {
    let queue = Arc::new(ConcurrentQueue::new());

    let handles: Vec<_> = (0..PUSH_THREADS)
        .map(|i| {
            let q = Arc::clone(&queue);
            thread::spawn(move || q.push(i.to_string()))
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let mut drained = Vec::new();
    while let Some(v) = queue.try_pop() {
        drained.push(v);
    }
    assert_exactly_once(drained, PUSH_THREADS);
    assert!(queue.is_empty());
}

#[test]
fn test_stack_concurrent_push_integrity() {
    let stack = Arc::new(ConcurrentStack::new());

    let handles: Vec<_> = (0..PUSH_THREADS)
        .map(|i| {
            let s = Arc::clone(&stack);
            thread::spawn(move || s.push(i.to_string()))
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let mut drained = Vec::new();
    while let Ok(v) = stack.pop() {
        drained.push(v);
    }
    assert_exactly_once(drained, PUSH_THREADS);
    assert_eq!(stack.pop(), Err(EmptyContainer));
}

#[test]
fn test_queue_producers_and_consumers() {
    const PRODUCERS: u64 = 8;
    const PER_PRODUCER: u64 = 500;
    let queue = ConcurrentQueue::new();

    let consumed: Vec<u64> = thread::scope(|s| {
        for p in 0..PRODUCERS {
            let queue = &queue;
            s.spawn(move || {
                for j in 0..PER_PRODUCER {
                    queue.push(p * PER_PRODUCER + j);
                }
            });
        }

        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let queue = &queue;
                s.spawn(move || {
                    (0..PRODUCERS * PER_PRODUCER / 4)
                        .map(|_| queue.wait_and_pop())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        consumers.into_iter().flat_map(|h| h.join().unwrap()).collect()
    });

    let mut sorted = consumed;
    sorted.sort_unstable();
    assert!(sorted.iter().copied().eq(0..PRODUCERS * PER_PRODUCER));
    assert!(queue.is_empty());
}

#[test]
fn test_queue_per_producer_order_preserved() {
    // Racing producers interleave, but each producer's own values stay in order.
    let queue = ConcurrentQueue::new();

    thread::scope(|s| {
        for p in 0..4_u64 {
            let queue = &queue;
            s.spawn(move || {
                for j in 0..1000_u64 {
                    queue.push((p, j));
                }
            });
        }
    });

    let mut last = [None::<u64>; 4];
    for (p, j) in queue.drain() {
        let slot = &mut last[p as usize];
        assert!(slot.map_or(true, |prev| prev < j), "producer {} out of order", p);
        *slot = Some(j);
    }
}

#[test]
fn test_queue_single_producer_fifo() {
    let queue = ConcurrentQueue::new();
    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..1000 {
                queue.push(i);
            }
        });
    });

    let popped: Vec<i32> = thread::scope(|s| {
        s.spawn(|| (0..1000).map(|_| queue.wait_and_pop()).collect())
            .join()
            .unwrap()
    });
    assert!(popped.into_iter().eq(0..1000));
}

#[test]
fn test_stack_single_producer_lifo() {
    let stack = ConcurrentStack::new();
    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..1000 {
                stack.push(i);
            }
        });
    });

    let popped: Vec<i32> = thread::scope(|s| {
        s.spawn(|| std::iter::from_fn(|| stack.pop().ok()).collect())
            .join()
            .unwrap()
    });
    assert!(popped.into_iter().eq((0..1000).rev()));
}

#[test]
fn test_no_lost_wakeup() {
    let queue = Arc::new(ConcurrentQueue::new());
    let (tx, rx) = mpsc::channel();

    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let value = queue.wait_and_pop();
            tx.send(value).unwrap();
        })
    };

    // Give the consumer time to park on the empty queue.
    thread::sleep(Duration::from_millis(100));
    queue.push(42);

    assert_eq!(rx.recv_timeout(PROMPT), Ok(42));
    consumer.join().unwrap();
}

#[test]
fn test_every_blocked_consumer_woken() {
    const CONSUMERS: usize = 16;
    let queue = Arc::new(ConcurrentQueue::new());
    let (tx, rx) = mpsc::channel();

    let handles: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            thread::spawn(move || tx.send(queue.wait_and_pop_shared()).unwrap())
        })
        .collect();
    drop(tx);

    thread::sleep(Duration::from_millis(50));
    for i in 0..CONSUMERS {
        queue.push(i);
    }

    let mut got: Vec<usize> = (0..CONSUMERS)
        .map(|_| *rx.recv_timeout(PROMPT).unwrap())
        .collect();
    got.sort_unstable();
    assert!(got.into_iter().eq(0..CONSUMERS));

    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn test_try_pop_on_empty_returns_promptly() {
    let queue = ConcurrentQueue::<u64>::new();

    let start = Instant::now();
    assert_eq!(queue.try_pop(), None);
    assert!(start.elapsed() < NON_BLOCKING, "try_pop waited {:?}", start.elapsed());

    let mut slot = 0;
    let start = Instant::now();
    assert!(!queue.try_pop_into(&mut slot));
    assert!(start.elapsed() < NON_BLOCKING);

    let start = Instant::now();
    assert!(queue.try_pop_shared().is_none());
    assert!(start.elapsed() < NON_BLOCKING);

    let stack = ConcurrentStack::<u64>::new();
    let start = Instant::now();
    assert_eq!(stack.pop(), Err(EmptyContainer));
    assert!(start.elapsed() < NON_BLOCKING);
}

#[test]
fn test_try_pop_races_never_duplicate() {
    let queue: ConcurrentQueue<u32> = (0..10_000).collect();

    let taken: Vec<u32> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| std::iter::from_fn(|| queue.try_pop()).collect::<Vec<_>>()))
            .collect();
        handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
    });

    let unique: HashSet<u32> = taken.iter().copied().collect();
    assert_eq!(taken.len(), 10_000);
    assert_eq!(unique.len(), 10_000);
}

#[test]
fn test_stack_empty_pop_fails() {
    let stack = ConcurrentStack::<u8>::new();
    assert_eq!(stack.pop(), Err(EmptyContainer));
    assert_eq!(stack.pop_shared(), Err(EmptyContainer));

    let err: Box<dyn std::error::Error> = Box::new(stack.pop().unwrap_err());
    assert_eq!(err.to_string(), "pop on an empty container");
}

#[test]
fn test_stack_concurrent_pops_split_contents() {
    let stack: ConcurrentStack<u32> = (0..10_000).collect();

    let (taken, failures): (Vec<u32>, usize) = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    let mut mine = Vec::new();
                    let mut failures = 0;
                    loop {
                        match stack.pop() {
                            Ok(v) => mine.push(v),
                            Err(EmptyContainer) => {
                                failures += 1;
                                break;
                            }
                        }
                    }
                    (mine, failures)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).fold(
            (Vec::new(), 0),
            |(mut all, n), (mine, f)| {
                all.extend(mine);
                (all, n + f)
            },
        )
    });

    assert_eq!(failures, 8);
    let unique: HashSet<u32> = taken.iter().copied().collect();
    assert_eq!(unique.len(), 10_000);
}

#[test]
fn test_stack_copy_isolation() {
    let original: ConcurrentStack<&str> = ["a", "b", "c"].into_iter().collect();
    let copy = original.clone();

    original.push("d");

    assert_eq!(copy.pop(), Ok("c"));
    assert_eq!(copy.pop(), Ok("b"));
    assert_eq!(copy.pop(), Ok("a"));
    assert_eq!(copy.pop(), Err(EmptyContainer));
    assert_eq!(original.len(), 4);
}

#[test]
fn test_stack_copy_under_concurrent_mutation() {
    let stack = ConcurrentStack::new();

    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..5000_u32 {
                stack.push(i);
                if i % 3 == 0 {
                    let _ = stack.pop();
                }
            }
        });
        s.spawn(|| {
            for _ in 0..50 {
                let copy = stack.clone();
                // A copy is internally consistent: strictly increasing from bottom.
                let items = copy.snapshot();
                assert!(items.windows(2).all(|w| w[0] < w[1]), "torn copy: {:?}", items);
                copy.push(u32::MAX);
            }
        });
    });

    assert!(!stack.snapshot().contains(&u32::MAX));
}
