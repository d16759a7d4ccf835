//! Property results and the checker trait shared by every container.

use serde::Serialize;

use crate::counterexample::Counterexample;

/// Outcome of evaluating one named invariant.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyResult {
    /// Invariant name, e.g. `NoLostElements`.
    pub name: &'static str,
    /// Whether the invariant held.
    pub holds: bool,
    /// Human-readable violation, present only when `holds` is false.
    pub violation: Option<String>,
    /// Failure path for reproduction.
    #[serde(skip)]
    pub counterexample: Option<Counterexample>,
}

impl PropertyResult {
    /// A passing result.
    #[must_use]
    pub fn pass(name: &'static str) -> Self {
        Self {
            name,
            holds: true,
            violation: None,
            counterexample: None,
        }
    }

    /// A failing result with a message and optional counterexample.
    #[must_use]
    pub fn fail(
        name: &'static str,
        violation: impl Into<String>,
        counterexample: Option<Counterexample>,
    ) -> Self {
        Self {
            name,
            holds: false,
            violation: Some(violation.into()),
            counterexample,
        }
    }

    /// One-line summary, `[PASS] Name` or `[FAIL] Name: reason`.
    #[must_use]
    pub fn format(&self) -> String {
        match &self.violation {
            None => format!("[PASS] {}", self.name),
            Some(v) => format!("[FAIL] {}: {}", self.name, v),
        }
    }
}

/// Evaluates a fixed set of invariants.
pub trait PropertyChecker {
    /// Evaluate every invariant, in a stable order.
    fn check_all(&self) -> Vec<PropertyResult>;

    /// True when every invariant holds.
    fn all_hold(&self) -> bool {
        self.check_all().iter().all(|r| r.holds)
    }

    /// Only the failing results.
    fn violations(&self) -> Vec<PropertyResult> {
        self.check_all().into_iter().filter(|r| !r.holds).collect()
    }

    /// `Ok(())` when everything holds, otherwise the first violation formatted.
    ///
    /// Shaped for the `check_invariants` callback of the DST harness.
    fn check(&self) -> Result<(), String> {
        match self.violations().into_iter().next() {
            None => Ok(()),
            Some(r) => Err(r.format()),
        }
    }
}
