//! Human-readable grading diagnostics.

use std::fmt::Write;

use crate::failures::HarnessResult;
use crate::grade::{FacetGrade, FacetOutcome};

/// Format a failed facet with its classification and first difference.
pub fn format_failure(case_name: &str, grade: &FacetGrade) -> String {
    let mut output = String::new();

    writeln!(output, "\nFAIL: {} [{}]", case_name, grade.facet).unwrap();

    match &grade.outcome {
        FacetOutcome::Failed { class, reason } => {
            writeln!(
                output,
                "  {} (ground truth {}, candidate {} with content)",
                class, grade.ground_truth_count, grade.candidate_count
            )
            .unwrap();
            writeln!(output, "  {}", reason).unwrap();
        }
        FacetOutcome::Passed { .. } => {
            writeln!(output, "  (passed)").unwrap();
        }
    }

    output
}

/// Format a summary line for one case or a whole suite.
pub fn format_summary(
    name: &str,
    passed: usize,
    failed: usize,
    expected_failures: usize,
    regressions: usize,
) -> String {
    let mut output = String::new();

    let status = if regressions > 0 { "FAIL" } else { "PASS" };

    writeln!(output, "\n{}: {}", status, name).unwrap();
    writeln!(
        output,
        "  {} passed, {} failed ({} expected, {} regressions)",
        passed, failed, expected_failures, regressions
    )
    .unwrap();

    output
}

/// One line per facet: passes and the three failure classes.
pub fn format_facet_table(result: &HarnessResult) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "{:<30} {:>6} {:>6} {:>6} {:>6} {:>6}",
        "facet", "pass", "empty", "missed", "spur.", "diff"
    )
    .unwrap();
    for (facet, tally) in &result.per_facet {
        writeln!(
            output,
            "{:<30} {:>6} {:>6} {:>6} {:>6} {:>6}",
            facet.to_string(),
            tally.passed_with_content,
            tally.passed_empty,
            tally.missed_content,
            tally.spurious_content,
            tally.different_content
        )
        .unwrap();
    }

    output
}
