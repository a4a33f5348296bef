//! Facet-level grading of legal annotations.
//!
//! A candidate annotation is graded against a ground truth one facet at a
//! time (a rule's entity, a definition's meaning, the `refines` lists of
//! every statement, ...). Each facet passes or fails as a whole; failures
//! are classified by whether the ground truth had content the candidate
//! missed, the candidate added content the ground truth lacked, or both had
//! content that differed.
//!
//! ## Modules
//!
//! - [`script`] - RON annotation scripts built into an annotation graph
//! - [`loader`] - Lenient loading into per-variant statement collections
//! - [`facet`] - The gradeable facets
//! - [`grade`] - Per-facet comparison and failure classification
//! - [`config`] - Threshold and facet selection via TOML
//! - [`runner`] - Case directories and suite execution
//! - [`formatter`] - Human-readable diagnostics
//! - [`failures`] - Expected failures tracking via TOML
//! - [`errors`] - Error types for loading and configuration

pub mod config;
pub mod errors;
pub mod facet;
pub mod failures;
pub mod formatter;
pub mod grade;
pub mod loader;
pub mod runner;
pub mod script;

pub use config::GradingConfig;
pub use errors::{GradeError, GradeResult};
pub use facet::{Comparison, Facet, FacetSource};
pub use failures::{ExpectedFailures, FacetTally, FailureEntry, FailureState, HarnessResult};
pub use formatter::{format_facet_table, format_failure, format_summary};
pub use grade::{
    trees_for, FacetGrade, FacetOutcome, FailureClass, FailureReason, GradeReport, Grader,
};
pub use loader::{load_file, LoadedAnnotation};
pub use runner::{failure_state, load_all_cases, load_case, run_case, run_suite, GradingCase};
pub use script::{AnnotationScript, Step};

#[cfg(test)]
mod tests;
