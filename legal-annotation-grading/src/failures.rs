//! Expected failures tracking via TOML file.
//!
//! ```toml
//! [[pending]]
//! case = "royalty-obligation"
//! facet = "relationship:refines"
//! reason = "candidate model does not emit cross-references yet"
//! added = "2026-10-01"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{GradeError, GradeResult};
use crate::facet::Facet;
use crate::grade::{FacetGrade, FacetOutcome, FailureClass};

/// Loaded expected failures configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpectedFailures {
    /// Known failures (won't fix soon).
    #[serde(default)]
    pub known: Vec<FailureEntry>,
    /// Pending failures (awaiting fix).
    #[serde(default)]
    pub pending: Vec<FailureEntry>,
}

/// A single expected failure entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureEntry {
    /// Case name (directory name relative to the cases root).
    pub case: String,
    pub facet: Facet,
    /// Human-readable reason.
    #[serde(default)]
    pub reason: Option<String>,
    /// Date added (YYYY-MM-DD).
    #[serde(default)]
    pub added: Option<String>,
    #[serde(default)]
    pub issue: Option<String>,
}

/// Failure lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureState {
    /// Known limitation, won't fix soon.
    Known,
    /// Awaiting fix, not blocking.
    Pending,
    /// Expected to pass - failure is a regression.
    Regression,
}

impl ExpectedFailures {
    /// Load from a TOML file. A missing file means no expected failures.
    pub fn load(path: &Path) -> GradeResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| GradeError::Load {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| GradeError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn is_expected(&self, case: &str, facet: Facet) -> FailureState {
        if self.known.iter().any(|e| e.matches(case, facet)) {
            return FailureState::Known;
        }
        if self.pending.iter().any(|e| e.matches(case, facet)) {
            return FailureState::Pending;
        }
        FailureState::Regression
    }

    pub fn count(&self) -> usize {
        self.known.len() + self.pending.len()
    }

    pub fn get_entry(&self, case: &str, facet: Facet) -> Option<&FailureEntry> {
        self.known
            .iter()
            .chain(self.pending.iter())
            .find(|e| e.matches(case, facet))
    }
}

impl FailureEntry {
    fn matches(&self, case: &str, facet: Facet) -> bool {
        self.case == case && self.facet == facet
    }
}

/// Pass and failure-class counts for one facet across a suite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FacetTally {
    /// Passed with content in the ground truth.
    pub passed_with_content: usize,
    /// Passed with nothing to find.
    pub passed_empty: usize,
    pub missed_content: usize,
    pub spurious_content: usize,
    pub different_content: usize,
}

impl FacetTally {
    pub fn record(&mut self, outcome: &FacetOutcome) {
        match outcome {
            FacetOutcome::Passed {
                ground_truth_had_content: true,
            } => self.passed_with_content += 1,
            FacetOutcome::Passed {
                ground_truth_had_content: false,
            } => self.passed_empty += 1,
            FacetOutcome::Failed { class, .. } => match class {
                FailureClass::MissedContent => self.missed_content += 1,
                FailureClass::SpuriousContent => self.spurious_content += 1,
                FailureClass::DifferentContent => self.different_content += 1,
            },
        }
    }

    pub fn passed(&self) -> usize {
        self.passed_with_content + self.passed_empty
    }

    pub fn failed(&self) -> usize {
        self.missed_content + self.spurious_content + self.different_content
    }

    pub fn total(&self) -> usize {
        self.passed() + self.failed()
    }
}

/// Result of running the harness.
#[derive(Debug, Clone, Default)]
pub struct HarnessResult {
    /// Total facet grades checked.
    pub total: usize,
    pub passed: usize,
    /// Expected failures (known + pending).
    pub expected_failures: usize,
    /// Regressions (unexpected failures).
    pub regressions: usize,
    pub per_facet: BTreeMap<Facet, FacetTally>,
}

impl HarnessResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the exit code (0 = pass, 1 = regressions).
    pub fn exit_code(&self) -> i32 {
        if self.regressions > 0 {
            1
        } else {
            0
        }
    }

    /// Check if all cases passed (no regressions).
    pub fn success(&self) -> bool {
        self.regressions == 0
    }

    /// Record one facet grade. A failure without a state counts as a
    /// regression.
    pub fn record(&mut self, grade: &FacetGrade, state: Option<FailureState>) {
        self.per_facet
            .entry(grade.facet)
            .or_default()
            .record(&grade.outcome);
        if grade.outcome.passed() {
            self.record_pass();
        } else {
            self.record_failure(state.unwrap_or(FailureState::Regression));
        }
    }

    pub fn record_pass(&mut self) {
        self.total += 1;
        self.passed += 1;
    }

    pub fn record_failure(&mut self, state: FailureState) {
        self.total += 1;
        match state {
            FailureState::Known | FailureState::Pending => {
                self.expected_failures += 1;
            }
            FailureState::Regression => {
                self.regressions += 1;
            }
        }
    }

    pub fn failed(&self) -> usize {
        self.expected_failures + self.regressions
    }
}
