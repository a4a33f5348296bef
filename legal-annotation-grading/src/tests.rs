use crate::*;
use legal_annotation::Relationship;
use std::path::{Path, PathBuf};

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

fn load(name: &str) -> GradingCase {
    load_case(&fixtures().join(name), name)
        .unwrap_or_else(|e| panic!("Failed to load case {}: {}", name, e))
}

fn codes(report: &GradeReport, facet: Facet) -> (u8, u8) {
    report.get(facet).unwrap().outcome.codes()
}

// ============================================================================
// Royalty obligation: paraphrased candidate
// ============================================================================

#[test]
fn test_royalty_obligation_passes_every_facet() {
    let case = load("royalty-obligation");
    assert_eq!(case.ground_truth.rules.len(), 2);
    assert_eq!(case.ground_truth.references.len(), 1);

    let report = run_case(&case, &Grader::default());
    let failures: Vec<_> = report
        .failed()
        .map(|g| format_failure(&case.name, g))
        .collect();
    assert!(failures.is_empty(), "{}", failures.join(""));
    assert_eq!(report.passed(), 16);
}

#[test]
fn test_royalty_obligation_pass_codes() {
    let report = run_case(&load("royalty-obligation"), &Grader::default());

    for facet in [
        Facet::RuleEntity,
        Facet::RuleType,
        Facet::RuleDescription,
        Facet::RuleConditions,
        Facet::References,
        Facet::Relationship(Relationship::Refines),
        Facet::Relationship(Relationship::IsRefinedBy),
    ] {
        assert_eq!(codes(&report, facet), (1, 1), "{}", facet);
    }

    // Nothing to find in the ground truth.
    assert_eq!(codes(&report, Facet::DefinitionTerm), (1, 0));
    assert_eq!(codes(&report, Facet::ExemptionDescription), (1, 0));
    assert_eq!(
        codes(&report, Facet::Relationship(Relationship::HasException)),
        (1, 0)
    );
}

#[test]
fn test_royalty_obligation_fails_under_strict_threshold() {
    let case = load("royalty-obligation");
    let report = run_case(&case, &Grader::default().with_threshold(2));

    // "the licensee" and "the license holder" are 6 edits apart.
    let grade = report.get(Facet::RuleEntity).unwrap();
    assert_eq!(grade.outcome.codes(), (0, 2));
    match &grade.outcome {
        FacetOutcome::Failed {
            reason: FailureReason::Mismatch { index, mismatch },
            ..
        } => {
            assert_eq!(*index, 0);
            assert_eq!(mismatch.path(), "$.text");
        }
        other => panic!("expected a mismatch, got {:?}", other),
    }

    // Rule types are exact and unaffected by the threshold.
    assert_eq!(codes(&report, Facet::RuleType), (1, 1));
}

// ============================================================================
// Definitions: one failure of each class
// ============================================================================

#[test]
fn test_missing_definition_classification() {
    let report = run_case(&load("definitions/missing-definition"), &Grader::default());

    assert_eq!(codes(&report, Facet::DefinitionTerm), (0, 1));
    assert_eq!(codes(&report, Facet::DefinitionMeaning), (0, 1));
    assert_eq!(codes(&report, Facet::DefinitionExclusions), (0, 2));
    assert_eq!(codes(&report, Facet::InformationDescription), (0, 0));

    // Both sides have two statements overall, none related.
    assert_eq!(
        codes(&report, Facet::Relationship(Relationship::Refines)),
        (1, 0)
    );
    assert_eq!(report.failed().count(), 4);
}

#[test]
fn test_missing_definition_failure_output() {
    let case = load("definitions/missing-definition");
    let report = run_case(&case, &Grader::default());
    let grade = report.get(Facet::DefinitionTerm).unwrap();

    insta::assert_snapshot!(format_failure(&case.name, grade).trim(), @r"
    FAIL: definitions/missing-definition [definition_term]
      missed content (ground truth 2, candidate 1 with content)
      ground truth has 2 items, candidate has 1
    ");
}

#[test]
fn test_licensed_software_with_nested_includes() {
    let case = load("definitions/licensed-software");
    let report = run_case(&case, &Grader::default());
    assert!(report.all_passed());
    assert_eq!(codes(&report, Facet::DefinitionExclusions), (1, 1));
}

// ============================================================================
// Loader recovery
// ============================================================================

#[test]
fn test_unparseable_candidate_grades_as_empty() {
    let case = load("unparseable-candidate");
    assert!(case.candidate.is_empty());
    assert_eq!(case.ground_truth.references.len(), 1);

    let report = run_case(&case, &Grader::default());
    assert_eq!(codes(&report, Facet::References), (0, 1));
    assert_eq!(report.failed().count(), 1);
}

// ============================================================================
// Suite
// ============================================================================

#[test]
fn test_suite_has_no_regressions() {
    let cases = load_all_cases(&fixtures()).unwrap();
    assert_eq!(cases.len(), 4);

    let expected =
        ExpectedFailures::load(&Path::new(env!("CARGO_MANIFEST_DIR")).join("expected_failures.toml"))
            .unwrap();
    let result = run_suite(&cases, &Grader::default(), &expected);

    assert_eq!(result.total, 64);
    assert_eq!(result.expected_failures, 5);
    assert_eq!(result.regressions, 0);
    assert!(result.success());

    let definition_term = result.per_facet[&Facet::DefinitionTerm];
    assert_eq!(definition_term.missed_content, 1);
    assert_eq!(definition_term.passed_with_content, 1);
    assert_eq!(definition_term.passed_empty, 2);
}

#[test]
fn test_suite_without_expectations_reports_regressions() {
    let cases = load_all_cases(&fixtures()).unwrap();
    let result = run_suite(&cases, &Grader::default(), &ExpectedFailures::default());
    assert_eq!(result.regressions, 5);
    assert_eq!(result.exit_code(), 1);

    let summary = format_summary("fixtures", result.passed, result.failed(), 0, 5);
    assert!(summary.contains("FAIL: fixtures"));
    assert!(summary.contains("59 passed, 5 failed"));
}

#[test]
fn test_configured_facets_limit_the_report() {
    let config = GradingConfig {
        threshold: 10,
        facets: vec![Facet::RuleEntity, Facet::References],
    };
    let report = run_case(&load("unparseable-candidate"), &Grader::new(&config));
    assert_eq!(report.facets.len(), 2);
    assert_eq!(report.passed(), 1);
}
