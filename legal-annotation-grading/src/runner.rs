//! Case loading and suite execution.
//!
//! A case is a directory holding a `ground_truth.ron` and a `candidate.ron`
//! annotation script. Cases may be nested in subdirectories; a case is
//! named by its path relative to the cases root.

use std::fs;
use std::path::Path;

use crate::errors::{GradeError, GradeResult};
use crate::failures::{ExpectedFailures, FailureState, HarnessResult};
use crate::grade::{FacetGrade, GradeReport, Grader};
use crate::loader::{read_script, LoadedAnnotation};

pub const GROUND_TRUTH_FILE: &str = "ground_truth.ron";
pub const CANDIDATE_FILE: &str = "candidate.ron";

/// A ground truth annotation paired with the candidate graded against it.
#[derive(Debug, Clone)]
pub struct GradingCase {
    pub name: String,
    pub ground_truth: LoadedAnnotation,
    pub candidate: LoadedAnnotation,
}

/// Load a single case directory.
///
/// Both files must exist. Their contents are loaded leniently: a script
/// that fails to build grades as an empty annotation.
pub fn load_case(dir: &Path, name: impl Into<String>) -> GradeResult<GradingCase> {
    let ground_truth = read_script(&dir.join(GROUND_TRUTH_FILE))?;
    let candidate = read_script(&dir.join(CANDIDATE_FILE))?;
    Ok(GradingCase {
        name: name.into(),
        ground_truth: LoadedAnnotation::load(&ground_truth),
        candidate: LoadedAnnotation::load(&candidate),
    })
}

/// Load every case under `dir`, sorted by name.
pub fn load_all_cases(dir: &Path) -> GradeResult<Vec<GradingCase>> {
    let mut cases = Vec::new();
    load_cases_recursive(dir, dir, &mut cases)?;
    cases.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(cases)
}

fn load_cases_recursive(base: &Path, dir: &Path, cases: &mut Vec<GradingCase>) -> GradeResult<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    if dir.join(GROUND_TRUTH_FILE).is_file() {
        let relative = dir.strip_prefix(base).unwrap_or(dir);
        let name = if relative.as_os_str().is_empty() {
            dir.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        };
        cases.push(load_case(dir, name)?);
        return Ok(());
    }

    for entry in fs::read_dir(dir).map_err(|e| GradeError::Load {
        path: dir.display().to_string(),
        message: e.to_string(),
    })? {
        let entry = entry.map_err(|e| GradeError::Load {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;
        let path = entry.path();
        if path.is_dir() {
            load_cases_recursive(base, &path, cases)?;
        }
    }

    Ok(())
}

/// Grade one case.
pub fn run_case(case: &GradingCase, grader: &Grader) -> GradeReport {
    grader.grade(&case.ground_truth, &case.candidate)
}

/// Lifecycle state of a graded facet; `None` when it passed.
pub fn failure_state(
    expected: &ExpectedFailures,
    case_name: &str,
    grade: &FacetGrade,
) -> Option<FailureState> {
    if grade.outcome.passed() {
        None
    } else {
        Some(expected.is_expected(case_name, grade.facet))
    }
}

/// Grade every case and tally the results against the expected failures.
pub fn run_suite(
    cases: &[GradingCase],
    grader: &Grader,
    expected: &ExpectedFailures,
) -> HarnessResult {
    let mut result = HarnessResult::new();

    for case in cases {
        let report = run_case(case, grader);
        for grade in &report.facets {
            let state = failure_state(expected, &case.name, grade);
            let (pass, class) = grade.outcome.codes();
            tracing::debug!(
                case = %case.name,
                facet = %grade.facet,
                pass,
                class,
                ground_truth = grade.ground_truth_count,
                candidate = grade.candidate_count,
                state = ?state,
                "facet graded"
            );
            result.record(grade, state);
        }
    }

    tracing::info!(
        cases = cases.len(),
        total = result.total,
        passed = result.passed,
        expected_failures = result.expected_failures,
        regressions = result.regressions,
        "grading suite finished"
    );
    result
}
