//! Probabilistic fault injection driven by a deterministic RNG.

use serde::Serialize;

use crate::random::DeterministicRng;

/// Fault probabilities.
#[derive(Debug, Clone, Serialize)]
pub struct FaultConfig {
    /// Probability that `should_fail` fires
    pub failure_probability: f64,
    /// Probability that `maybe_delay` fires
    pub delay_probability: f64,
    /// Upper bound of an injected delay, in simulated microseconds
    pub delay_us_max: u64,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            failure_probability: 0.05,
            delay_probability: 0.1,
            delay_us_max: 1_000,
        }
    }
}

impl FaultConfig {
    /// No faults at all.
    #[must_use]
    pub fn none() -> Self {
        Self {
            failure_probability: 0.0,
            delay_probability: 0.0,
            delay_us_max: 0,
        }
    }

    /// High fault rates for stress runs.
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            failure_probability: 0.2,
            delay_probability: 0.3,
            delay_us_max: 10_000,
        }
    }
}

/// Counters kept by the injector.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct FaultStats {
    pub checks_count: u64,
    pub faults_count: u64,
    pub delays_count: u64,
}

/// Decides, deterministically, when faults happen.
#[derive(Debug, Clone)]
pub struct FaultInjector {
    rng: DeterministicRng,
    config: FaultConfig,
    stats: FaultStats,
}

impl FaultInjector {
    #[must_use]
    pub fn new(rng: DeterministicRng, config: FaultConfig) -> Self {
        debug_assert!(
            (0.0..=1.0).contains(&config.failure_probability),
            "failure_probability out of range"
        );
        debug_assert!(
            (0.0..=1.0).contains(&config.delay_probability),
            "delay_probability out of range"
        );
        Self {
            rng,
            config,
            stats: FaultStats::default(),
        }
    }

    /// Should the current operation fail?
    pub fn should_fail(&mut self) -> bool {
        self.stats.checks_count += 1;
        let fail = self.rng.gen_bool(self.config.failure_probability);
        if fail {
            self.stats.faults_count += 1;
        }
        fail
    }

    /// A delay to inject now, in simulated microseconds, if any.
    pub fn maybe_delay_us(&mut self) -> Option<u64> {
        if self.config.delay_us_max == 0 || !self.rng.gen_bool(self.config.delay_probability) {
            return None;
        }
        self.stats.delays_count += 1;
        Some(self.rng.gen_range(1..=self.config.delay_us_max))
    }

    #[must_use]
    pub fn config(&self) -> &FaultConfig {
        &self.config
    }

    #[must_use]
    pub fn stats(&self) -> FaultStats {
        self.stats
    }
}
