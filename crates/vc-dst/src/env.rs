//! The DST environment: one seed, all sources of nondeterminism.

use std::fmt;

use crate::clock::SimClock;
use crate::fault::{FaultConfig, FaultInjector};
use crate::random::DeterministicRng;
use crate::scheduler::Scheduler;

/// Bundles the seeded RNG, simulated clock, fault injector and optional
/// scheduler. Each component gets its own RNG stream derived from the seed.
#[derive(Debug, Clone)]
pub struct DstEnv {
    seed: u64,
    rng: DeterministicRng,
    clock: SimClock,
    fault: FaultInjector,
    scheduler: Option<Scheduler>,
}

impl DstEnv {
    /// Environment with the default fault configuration.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_fault_config(seed, FaultConfig::default())
    }

    #[must_use]
    pub fn with_fault_config(seed: u64, fault_config: FaultConfig) -> Self {
        Self {
            seed,
            rng: DeterministicRng::new(seed),
            clock: SimClock::new(),
            fault: FaultInjector::new(DeterministicRng::new(seed.wrapping_add(1)), fault_config),
            scheduler: None,
        }
    }

    /// Environment that also schedules `threads_count` simulated threads.
    #[must_use]
    pub fn with_scheduler(seed: u64, threads_count: usize, yield_probability: f64) -> Self {
        let mut env = Self::new(seed);
        env.scheduler = Some(Scheduler::new(
            DeterministicRng::new(seed.wrapping_add(2)),
            threads_count,
            yield_probability,
        ));
        env
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rng(&mut self) -> &mut DeterministicRng {
        &mut self.rng
    }

    pub fn clock(&mut self) -> &mut SimClock {
        &mut self.clock
    }

    pub fn fault(&mut self) -> &mut FaultInjector {
        &mut self.fault
    }

    pub fn scheduler(&mut self) -> Option<&mut Scheduler> {
        self.scheduler.as_mut()
    }

    /// Replace the fault configuration, keeping the fault RNG stream.
    pub fn set_fault_config(&mut self, config: FaultConfig) {
        self.fault = FaultInjector::new(DeterministicRng::new(self.seed.wrapping_add(1)), config);
    }

    /// Possibly inject a simulated delay; returns the delay applied.
    pub fn maybe_delay(&mut self) -> Option<u64> {
        let delay_us = self.fault.maybe_delay_us()?;
        self.clock.advance_us(delay_us);
        Some(delay_us)
    }

    /// `DST_SEED=<seed>` for failure messages.
    #[must_use]
    pub fn format_seed(&self) -> String {
        format!("DST_SEED={}", self.seed)
    }

    #[must_use]
    pub fn stats(&self) -> DstEnvStats {
        let fault = self.fault.stats();
        DstEnvStats {
            seed: self.seed,
            elapsed_ns: self.clock.now_ns(),
            faults_count: fault.faults_count,
            delays_count: fault.delays_count,
            switches_count: self.scheduler.as_ref().map_or(0, Scheduler::switches_count),
        }
    }
}

/// Summary of an environment's activity.
#[derive(Debug, Clone, Copy)]
pub struct DstEnvStats {
    pub seed: u64,
    pub elapsed_ns: u64,
    pub faults_count: u64,
    pub delays_count: u64,
    pub switches_count: u64,
}

impl fmt::Display for DstEnvStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DST_SEED={} simulated={}ns faults={} delays={} switches={}",
            self.seed, self.elapsed_ns, self.faults_count, self.delays_count, self.switches_count
        )
    }
}
