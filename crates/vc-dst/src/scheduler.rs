//! Deterministic scheduler for simulated threads.
//!
//! Logical threads are interleaved on one OS thread. At each yield point
//! the scheduler decides, from its seeded RNG, whether to keep running the
//! current thread or switch.

use crate::random::DeterministicRng;

/// Decision taken at a yield point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDecision {
    /// Keep running the current thread
    Continue,
    /// Switch to the given thread
    SwitchTo(usize),
}

/// Seeded scheduler over `threads_count` logical threads.
#[derive(Debug, Clone)]
pub struct Scheduler {
    rng: DeterministicRng,
    threads_count: usize,
    current: usize,
    yield_probability: f64,
    switches_count: u64,
}

impl Scheduler {
    #[must_use]
    pub fn new(rng: DeterministicRng, threads_count: usize, yield_probability: f64) -> Self {
        assert!(threads_count > 0, "scheduler needs at least one thread");
        Self {
            rng,
            threads_count,
            current: 0,
            yield_probability,
            switches_count: 0,
        }
    }

    /// Thread currently scheduled.
    #[must_use]
    pub fn current_thread(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn threads_count(&self) -> usize {
        self.threads_count
    }

    #[must_use]
    pub fn switches_count(&self) -> u64 {
        self.switches_count
    }

    /// Maybe switch to another thread.
    pub fn decide(&mut self) -> ScheduleDecision {
        if self.threads_count < 2 || !self.rng.gen_bool(self.yield_probability) {
            return ScheduleDecision::Continue;
        }
        // Pick any thread other than the current one.
        let offset = self.rng.gen_range(1..self.threads_count);
        let next = (self.current + offset) % self.threads_count;
        self.switch_to(next);
        ScheduleDecision::SwitchTo(next)
    }

    /// Unconditionally move to the next thread (round robin).
    pub fn force_switch(&mut self) -> ScheduleDecision {
        let next = (self.current + 1) % self.threads_count;
        self.switch_to(next);
        ScheduleDecision::SwitchTo(next)
    }

    fn switch_to(&mut self, next: usize) {
        debug_assert!(next < self.threads_count);
        self.current = next;
        self.switches_count += 1;
    }
}
