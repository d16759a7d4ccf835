//! # vc-dst
//!
//! Deterministic Simulation Testing for lock-based containers.
//!
//! Inspired by FoundationDB and TigerBeetle, this crate provides deterministic
//! simulation of time, randomness, scheduling and faults. All behavior is
//! reproducible via a seed.
//!
//! ## Usage
//!
//! ```rust
//! use vc_dst::DstEnv;
//!
//! let seed = 12345;
//! let mut env = DstEnv::new(seed);
//!
//! // Deterministic time
//! let start = env.clock().now_ns();
//! env.clock().advance_ns(1_000_000); // 1ms
//! assert_eq!(env.clock().now_ns(), start + 1_000_000);
//!
//! // Deterministic randomness
//! let _value: u64 = env.rng().gen();
//! let choice = env.rng().gen_range(0..10);
//! assert!(choice < 10);
//!
//! // Deterministic fault injection
//! if env.fault().should_fail() {
//!     // Simulate failure
//! }
//! ```
//!
//! ## Reproducibility
//!
//! To reproduce a failing test:
//! ```bash
//! DST_SEED=12345 cargo test
//! ```

pub mod clock;
pub mod env;
pub mod fault;
pub mod fault_injection;
pub mod harness;
pub mod random;
pub mod scheduler;

pub use clock::SimClock;
pub use env::{DstEnv, DstEnvStats};
pub use fault::{FaultConfig, FaultInjector, FaultStats};
pub use fault_injection::{
    run_dst_scenario, Discipline, DstOp, DstResult, DstRunner, DstStats, DstTestableContainer,
    FaultPoint, FaultType,
};
pub use harness::{DstHarness, HarnessConfig, HarnessResult};
pub use random::DeterministicRng;
pub use scheduler::{ScheduleDecision, Scheduler};

/// Default iteration count when `DST_ITERATIONS` is unset.
pub const DST_ITERATIONS_DEFAULT: u64 = 1000;

/// Get DST seed from environment or generate random one.
///
/// Prints the seed for reproduction. Use `DST_SEED=<seed>` to reproduce.
/// An unparsable `DST_SEED` is reported and replaced by a random seed.
/// Zero is never returned.
#[must_use]
pub fn get_or_generate_seed() -> u64 {
    let from_env = std::env::var("DST_SEED").ok().and_then(|s| match s.parse::<u64>() {
        Ok(seed) if seed != 0 => Some(seed),
        _ => {
            eprintln!("DST_SEED={:?} is not a non-zero u64, ignoring", s);
            None
        }
    });

    match from_env {
        Some(seed) => {
            println!("DST_SEED={} (from environment)", seed);
            seed
        }
        None => {
            let seed = rand::random::<u64>().max(1);
            println!("DST_SEED={} (randomly generated)", seed);
            seed
        }
    }
}

/// Iteration count from `DST_ITERATIONS`, or [`DST_ITERATIONS_DEFAULT`].
#[must_use]
pub fn dst_iterations() -> u64 {
    std::env::var("DST_ITERATIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DST_ITERATIONS_DEFAULT)
}
