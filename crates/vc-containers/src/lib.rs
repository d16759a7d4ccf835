//! # vc-containers
//!
//! Thread-safe container adapters built on coarse-grained locking.
//!
//! - [`ConcurrentQueue`]: FIFO, with a blocking pop that parks on a
//!   condition variable and non-blocking pops that report emptiness
//! - [`ConcurrentStack`]: LIFO, whose pop fails with [`EmptyContainer`]
//!   and whose copy locks only the source
//!
//! Each container guards one sequence with one mutex. Nothing here is
//! lock-free; throughput is traded for obviously-correct exclusion.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//! use vc_containers::ConcurrentQueue;
//!
//! let queue = Arc::new(ConcurrentQueue::new());
//! let consumer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || queue.wait_and_pop())
//! };
//! queue.push(7);
//! assert_eq!(consumer.join().unwrap(), 7);
//! ```
//!
//! # Testing
//!
//! Both containers implement `vc_dst::DstTestableContainer` for `u64`
//! elements and are checked with `vc_core`'s property checkers.
//! The [`buggy`] module holds broken variants the checkers must reject.
//!
//! ```bash
//! cargo test -p vc-containers
//! RUSTFLAGS="--cfg loom" cargo test -p vc-containers --release
//! ```

mod sync;

pub mod buggy;
pub mod error;
pub mod queue;
pub mod stack;

pub use buggy::{LostElementStack, ReorderingQueue, SpuriousEmptyQueue};
pub use error::EmptyContainer;
pub use queue::ConcurrentQueue;
pub use stack::ConcurrentStack;
