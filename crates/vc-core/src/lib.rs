//! # vc-core
//!
//! Core types and invariants for verified lock-based containers.
//!
//! This crate provides:
//! - `PropertyResult` and `PropertyChecker` for verifying invariants
//! - `Counterexample` for rendering failure paths
//! - Invariant traits for each container (`QueueProperties`, `StackProperties`)
//!
//! Containers do not track themselves. A recording wrapper (see `vc-dst`)
//! captures the operation history and exposes it through the traits here,
//! so the checkers run against any implementation without touching it.

pub mod counterexample;
pub mod invariants;
pub mod property;

pub use counterexample::{Counterexample, StateSnapshot, ThreadAction};
pub use invariants::{
    OpKind, QueueProperties, QueuePropertyChecker, RecordedOp, StackProperties,
    StackPropertyChecker,
};
pub use property::{PropertyChecker, PropertyResult};
