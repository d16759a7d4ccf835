//! Fault injection for lock-based containers.
//!
//! DST injects faults at OPERATION BOUNDARIES, never inside a critical
//! section. The container under test stays unmodified; faults happen in
//! the runner that wraps it.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  DstRunner                                                │
//! │  ┌─────────────┐    ┌──────────────────┐    ┌──────────┐ │
//! │  │ FaultPoint  │───>│ container        │───>│FaultPoint│ │
//! │  │ (pre-op)    │    │ push()/try_pop() │    │(post-op) │ │
//! │  └─────────────┘    └──────────────────┘    └──────────┘ │
//! │        │                                         │        │
//! │        ▼                                         ▼        │
//! │  "Thread dies before        "Thread dies after the lock   │
//! │   taking the lock?"          was released?"               │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The runner records every completed container operation into an
//! `OpHistory` while holding its own state lock across the container call,
//! so recording order equals the container's lock order even when the
//! runner is shared by real threads. Only non-blocking operations go
//! through the runner.

use std::sync::{Mutex, MutexGuard, PoisonError};

use vc_core::invariants::{OpHistory, QueueProperties, StackProperties};
use vc_core::{PropertyChecker, QueuePropertyChecker, StackPropertyChecker};

use crate::clock::SimClock;
use crate::fault::{FaultConfig, FaultInjector};
use crate::random::DeterministicRng;

/// Fault injection points (between operations, not inside).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    /// Before the container lock is taken
    BeforeOperation,
    /// After the operation completed and the lock was released
    AfterOperation,
}

/// Types of faults that can be injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultType {
    /// Thread "crashes"; the caller never sees the result
    ThreadCrash,
    /// Slow thread; simulated time advances, the operation proceeds
    Delay,
}

/// Trait for containers testable with DST.
///
/// MINIMAL interface, no DST knowledge in the implementation. `pop` is the
/// container's non-blocking pop with emptiness mapped to `None`.
pub trait DstTestableContainer: Send + Sync {
    fn new() -> Self;
    fn push(&self, value: u64);
    fn pop(&self) -> Option<u64>;
    fn is_empty(&self) -> bool;
    /// Queue: head to tail. Stack: bottom to top.
    fn get_contents(&self) -> Vec<u64>;
}

struct RunnerState {
    rng: DeterministicRng,
    fault_injector: FaultInjector,
    clock: SimClock,
    history: OpHistory,
    operations_count: u64,
    faults_injected: u64,
    abandoned_operations: u64,
}

/// DST runner for lock-based containers.
///
/// Wraps a container and injects faults at operation boundaries.
pub struct DstRunner<C> {
    container: C,
    seed: u64,
    state: Mutex<RunnerState>,
}

impl<C: DstTestableContainer> DstRunner<C> {
    /// Create a new DST runner with the default fault configuration.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_fault_config(seed, FaultConfig::default())
    }

    #[must_use]
    pub fn with_fault_config(seed: u64, config: FaultConfig) -> Self {
        Self {
            container: C::new(),
            seed,
            state: Mutex::new(RunnerState {
                rng: DeterministicRng::new(seed),
                fault_injector: FaultInjector::new(DeterministicRng::new(seed.wrapping_add(1)), config),
                clock: SimClock::new(),
                history: OpHistory::new(),
                operations_count: 0,
                faults_injected: 0,
                abandoned_operations: 0,
            }),
        }
    }
}

impl<C: DstTestableContainer> DstRunner<C> {
    /// Get the seed for reproduction.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The wrapped container. Operations issued directly are not recorded.
    #[must_use]
    pub fn container(&self) -> &C {
        &self.container
    }

    fn state(&self) -> MutexGuard<'_, RunnerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push from simulated thread 0.
    pub fn push(&self, value: u64) -> Result<(), FaultType> {
        self.push_as(0, value)
    }

    /// Pop from simulated thread 0.
    pub fn pop(&self) -> Result<Option<u64>, FaultType> {
        self.pop_as(0)
    }

    /// Push with fault injection at boundaries.
    pub fn push_as(&self, thread_id: u64, value: u64) -> Result<(), FaultType> {
        let mut state = self.state();

        if let Some(fault) = state.maybe_inject_fault(FaultPoint::BeforeOperation) {
            if fault == FaultType::ThreadCrash {
                // Operation never started.
                state.abandoned_operations += 1;
                return Err(fault);
            }
        }

        self.container.push(value);
        state.operations_count += 1;
        state.history.record_push(thread_id, value);

        if let Some(FaultType::ThreadCrash) = state.maybe_inject_fault(FaultPoint::AfterOperation) {
            // The value IS in the container; only the caller is gone.
            state.abandoned_operations += 1;
            return Err(FaultType::ThreadCrash);
        }

        Ok(())
    }

    /// Non-blocking pop with fault injection at boundaries.
    pub fn pop_as(&self, thread_id: u64) -> Result<Option<u64>, FaultType> {
        let mut state = self.state();

        if let Some(FaultType::ThreadCrash) = state.maybe_inject_fault(FaultPoint::BeforeOperation) {
            state.abandoned_operations += 1;
            return Err(FaultType::ThreadCrash);
        }

        let result = self.container.pop();
        state.operations_count += 1;
        state.history.record_pop(thread_id, result);

        if let Some(FaultType::ThreadCrash) = state.maybe_inject_fault(FaultPoint::AfterOperation) {
            // Value left the container but the caller crashed before using it.
            state.abandoned_operations += 1;
            return Err(FaultType::ThreadCrash);
        }

        Ok(result)
    }

    /// Recorded history so far.
    #[must_use]
    pub fn history(&self) -> OpHistory {
        self.state().history.clone()
    }

    /// Get statistics.
    #[must_use]
    pub fn stats(&self) -> DstStats {
        let state = self.state();
        DstStats {
            seed: self.seed,
            operations_count: state.operations_count,
            faults_injected: state.faults_injected,
            abandoned_operations: state.abandoned_operations,
            simulated_ns: state.clock.now_ns(),
        }
    }
}

impl RunnerState {
    /// Maybe inject a fault at the given point.
    fn maybe_inject_fault(&mut self, point: FaultPoint) -> Option<FaultType> {
        if !self.fault_injector.should_fail() {
            return None;
        }
        self.faults_injected += 1;

        let fault = if self.rng.gen_bool(0.5) {
            FaultType::ThreadCrash
        } else {
            FaultType::Delay
        };
        if fault == FaultType::Delay {
            let delay_us = self.rng.gen_range(1..1_000_u64);
            self.clock.advance_us(delay_us);
        }
        tracing::trace!(?point, ?fault, "fault injected");
        Some(fault)
    }
}

impl<C: DstTestableContainer> QueueProperties for DstRunner<C> {
    fn current_contents(&self) -> Vec<u64> {
        // Holding the state lock keeps recorded pops and contents in step.
        let _state = self.state();
        self.container.get_contents()
    }

    fn history(&self) -> OpHistory {
        self.state().history.clone()
    }
}

impl<C: DstTestableContainer> StackProperties for DstRunner<C> {
    fn current_contents(&self) -> Vec<u64> {
        let _state = self.state();
        self.container.get_contents()
    }

    fn history(&self) -> OpHistory {
        self.state().history.clone()
    }
}

/// Statistics from DST run.
#[derive(Debug, Clone, Copy)]
pub struct DstStats {
    pub seed: u64,
    pub operations_count: u64,
    pub faults_injected: u64,
    pub abandoned_operations: u64,
    pub simulated_ns: u64,
}

impl DstStats {
    #[must_use]
    pub fn format(&self) -> String {
        format!(
            "DST_SEED={} ops={} faults={} abandoned={} simulated={}ns",
            self.seed,
            self.operations_count,
            self.faults_injected,
            self.abandoned_operations,
            self.simulated_ns
        )
    }
}

/// DST operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DstOp {
    Push(u64),
    Pop,
}

/// Ordering discipline to check a scenario against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    Fifo,
    Lifo,
}

/// DST result.
#[derive(Debug)]
pub struct DstResult {
    pub passed: bool,
    /// Formatted violations, empty when `passed`
    pub violations: Vec<String>,
    pub stats: DstStats,
    /// Faults that aborted an operation, in order. These are always
    /// `ThreadCrash`; injected delays let the operation finish and are
    /// only counted in `stats.faults_injected`.
    pub fault_errors: Vec<FaultType>,
}

impl DstResult {
    #[must_use]
    pub fn format(&self) -> String {
        let status = if self.passed { "PASS" } else { "FAIL" };
        let mut result = format!("[{}] {}", status, self.stats.format());
        for v in &self.violations {
            result.push_str(&format!("\n  VIOLATION: {}", v));
        }
        result
    }
}

/// Run a DST scenario and check the invariants for `discipline` at the end.
///
/// Faults are expected; they are collected, not treated as failures.
pub fn run_dst_scenario<C: DstTestableContainer>(
    seed: u64,
    discipline: Discipline,
    operations: &[DstOp],
) -> DstResult {
    let runner: DstRunner<C> = DstRunner::new(seed);
    let mut fault_errors = Vec::new();

    for op in operations {
        let result = match *op {
            DstOp::Push(v) => runner.push(v),
            DstOp::Pop => runner.pop().map(|_| ()),
        };
        if let Err(fault) = result {
            fault_errors.push(fault);
        }
    }

    let violations: Vec<String> = match discipline {
        Discipline::Fifo => QueuePropertyChecker::new(&runner).with_seed(seed.max(1)).violations(),
        Discipline::Lifo => StackPropertyChecker::new(&runner).with_seed(seed.max(1)).violations(),
    }
    .iter()
    .map(|r| r.format())
    .collect();

    DstResult {
        passed: violations.is_empty(),
        violations,
        stats: runner.stats(),
        fault_errors,
    }
}
