//! Per-facet grading of a candidate annotation against ground truth.
//!
//! For each facet both sides are canonicalized, counted, and compared
//! index by index. A differing number of trees fails immediately. Every
//! failure is classified from how many trees on each side had content:
//!
//! | Ground truth vs candidate | Class |
//! |---------------------------|-------|
//! | more content              | [`FailureClass::MissedContent`] |
//! | less content              | [`FailureClass::SpuriousContent`] |
//! | same                      | [`FailureClass::DifferentContent`] |

use std::fmt;

use legal_annotation::{
    check_expr_lists, check_expr_trees, check_reference_trees, check_value_lists, Canonicalizer,
    Mismatch, Side, DEFAULT_THRESHOLD,
};
use serde_json::Value;

use crate::config::GradingConfig;
use crate::facet::{Comparison, Facet, FacetSource};
use crate::loader::LoadedAnnotation;

/// Why a failed facet failed, in terms of content presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Ground truth had content the candidate lacked.
    MissedContent,
    /// Candidate had content the ground truth lacked.
    SpuriousContent,
    /// Both had the same amount of content, but it differed.
    DifferentContent,
}

impl FailureClass {
    pub fn from_counts(ground_truth: usize, candidate: usize) -> Self {
        if ground_truth > candidate {
            FailureClass::MissedContent
        } else if candidate > ground_truth {
            FailureClass::SpuriousContent
        } else {
            FailureClass::DifferentContent
        }
    }

    /// Numeric code: 1 missed, 0 spurious, 2 different.
    pub fn code(&self) -> u8 {
        match self {
            FailureClass::MissedContent => 1,
            FailureClass::SpuriousContent => 0,
            FailureClass::DifferentContent => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FailureClass::MissedContent => "missed content",
            FailureClass::SpuriousContent => "spurious content",
            FailureClass::DifferentContent => "different content",
        }
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What made a facet fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The two sides produced a different number of trees.
    Count { ground_truth: usize, candidate: usize },
    /// The trees at `index` differ.
    Mismatch { index: usize, mismatch: Mismatch },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Count {
                ground_truth,
                candidate,
            } => write!(
                f,
                "ground truth has {} items, candidate has {}",
                ground_truth, candidate
            ),
            FailureReason::Mismatch { index, mismatch } => {
                write!(f, "item {}: {}", index, mismatch)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetOutcome {
    Passed { ground_truth_had_content: bool },
    Failed {
        class: FailureClass,
        reason: FailureReason,
    },
}

impl FacetOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, FacetOutcome::Passed { .. })
    }

    /// `(pass, classification)` code pair.
    ///
    /// A pass is `(1, 1)` when the ground truth had content and `(1, 0)`
    /// when it had none. A failure is `(0, class code)`.
    pub fn codes(&self) -> (u8, u8) {
        match self {
            FacetOutcome::Passed {
                ground_truth_had_content,
            } => (1, u8::from(*ground_truth_had_content)),
            FacetOutcome::Failed { class, .. } => (0, class.code()),
        }
    }
}

/// Result of grading one facet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetGrade {
    pub facet: Facet,
    /// Ground truth trees with content for the facet.
    pub ground_truth_count: usize,
    /// Candidate trees with content for the facet.
    pub candidate_count: usize,
    pub outcome: FacetOutcome,
}

/// Every configured facet graded for one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeReport {
    pub facets: Vec<FacetGrade>,
}

impl GradeReport {
    pub fn passed(&self) -> usize {
        self.facets.iter().filter(|g| g.outcome.passed()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &FacetGrade> {
        self.facets.iter().filter(|g| !g.outcome.passed())
    }

    pub fn all_passed(&self) -> bool {
        self.facets.iter().all(|g| g.outcome.passed())
    }

    pub fn get(&self, facet: Facet) -> Option<&FacetGrade> {
        self.facets.iter().find(|g| g.facet == facet)
    }
}

/// Grades candidates against ground truth.
#[derive(Debug, Clone)]
pub struct Grader {
    threshold: usize,
    facets: Vec<Facet>,
}

impl Default for Grader {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            facets: Facet::all(),
        }
    }
}

impl Grader {
    pub fn new(config: &GradingConfig) -> Self {
        Self {
            threshold: config.threshold,
            facets: config.facets.clone(),
        }
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    /// Grade every configured facet.
    pub fn grade(&self, ground_truth: &LoadedAnnotation, candidate: &LoadedAnnotation) -> GradeReport {
        let facets = self
            .facets
            .iter()
            .map(|facet| self.grade_facet(*facet, ground_truth, candidate))
            .collect();
        GradeReport { facets }
    }

    /// Canonicalize the facet's collection on both sides and grade it.
    pub fn grade_facet(
        &self,
        facet: Facet,
        ground_truth: &LoadedAnnotation,
        candidate: &LoadedAnnotation,
    ) -> FacetGrade {
        let gt = trees_for(facet, ground_truth);
        let cand = trees_for(facet, candidate);
        self.grade_trees(facet, &gt, &cand)
    }

    /// Grade one facet over already canonicalized trees.
    pub fn grade_trees(&self, facet: Facet, ground_truth: &[Value], candidate: &[Value]) -> FacetGrade {
        let ground_truth_count = ground_truth.iter().filter(|t| facet.has_content(t)).count();
        let candidate_count = candidate.iter().filter(|t| facet.has_content(t)).count();

        let outcome = match self.compare(facet, ground_truth, candidate) {
            Ok(()) => FacetOutcome::Passed {
                ground_truth_had_content: ground_truth_count > 0,
            },
            Err(reason) => FacetOutcome::Failed {
                class: FailureClass::from_counts(ground_truth_count, candidate_count),
                reason,
            },
        };

        FacetGrade {
            facet,
            ground_truth_count,
            candidate_count,
            outcome,
        }
    }

    fn compare(&self, facet: Facet, ground_truth: &[Value], candidate: &[Value]) -> Result<(), FailureReason> {
        if ground_truth.len() != candidate.len() {
            return Err(FailureReason::Count {
                ground_truth: ground_truth.len(),
                candidate: candidate.len(),
            });
        }
        for (index, (gt, cand)) in ground_truth.iter().zip(candidate).enumerate() {
            self.compare_values(facet, facet.extract(gt), facet.extract(cand))
                .map_err(|mismatch| FailureReason::Mismatch { index, mismatch })?;
        }
        Ok(())
    }

    fn compare_values(&self, facet: Facet, gt: &Value, cand: &Value) -> Result<(), Mismatch> {
        let field = facet.field().unwrap_or("$");
        match facet.comparison() {
            Comparison::ExpressionList => {
                check_expr_lists(as_list(gt)?, as_list(cand)?, self.threshold)
            }
            Comparison::RequiredExpression => {
                if gt.is_null() {
                    return Err(missing(field, Side::GroundTruth));
                }
                if cand.is_null() {
                    return Err(missing(field, Side::Candidate));
                }
                check_expr_trees(gt, cand, self.threshold)
            }
            Comparison::OptionalExpression => match (gt.is_null(), cand.is_null()) {
                (true, true) => Ok(()),
                (false, true) => Err(missing(field, Side::Candidate)),
                (true, false) => Err(missing(field, Side::GroundTruth)),
                (false, false) => check_expr_trees(gt, cand, self.threshold),
            },
            Comparison::Exact => {
                if gt == cand {
                    Ok(())
                } else {
                    Err(Mismatch::Value {
                        path: "$".to_string(),
                        expected: gt.to_string(),
                        found: cand.to_string(),
                    })
                }
            }
            Comparison::Reference => check_reference_trees(gt, cand, self.threshold),
            Comparison::IdentifierList => check_value_lists(gt, cand, self.threshold),
        }
    }
}

/// Canonical trees of the collection a facet draws from.
pub fn trees_for(facet: Facet, annotation: &LoadedAnnotation) -> Vec<Value> {
    let canon = Canonicalizer::new(&annotation.graph);
    match facet.source() {
        FacetSource::Statements(variant) => annotation
            .statements_of(variant)
            .iter()
            .map(|id| canon.statement(*id))
            .collect(),
        FacetSource::AllStatements => annotation
            .statements
            .iter()
            .map(|id| canon.statement(*id))
            .collect(),
        FacetSource::References => annotation
            .references
            .iter()
            .map(|id| canon.reference(*id))
            .collect(),
    }
}

fn as_list(value: &Value) -> Result<&[Value], Mismatch> {
    value.as_array().map(Vec::as_slice).ok_or_else(|| Mismatch::Shape {
        path: "$".to_string(),
        expected: "a list",
        found: value.to_string(),
    })
}

fn missing(field: &str, side: Side) -> Mismatch {
    Mismatch::MissingField {
        path: "$".to_string(),
        field: field.to_string(),
        side,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legal_annotation::Relationship;
    use serde_json::json;

    fn expr(text: &str) -> Value {
        json!({"text": text, "includes": [], "sectionNumber": "1"})
    }

    fn definition(term: &str, meaning: &[&str]) -> Value {
        json!({
            "type": "Definition",
            "defined_term": expr(term),
            "meaning": meaning.iter().map(|m| expr(m)).collect::<Vec<_>>(),
            "exclusions": [],
        })
    }

    #[test]
    fn count_mismatch_classification() {
        let grader = Grader::default();
        let two = [definition("licensee", &[]), definition("territory", &[])];
        let one = [definition("licensee", &[])];

        let missed = grader.grade_trees(Facet::DefinitionTerm, &two, &one);
        assert_eq!(missed.outcome.codes(), (0, 1));
        assert!(matches!(
            missed.outcome,
            FacetOutcome::Failed {
                reason: FailureReason::Count {
                    ground_truth: 2,
                    candidate: 1
                },
                ..
            }
        ));

        let spurious = grader.grade_trees(Facet::DefinitionTerm, &one, &two);
        assert_eq!(spurious.outcome.codes(), (0, 0));
    }

    #[test]
    fn equal_counts_with_differing_content() {
        let grader = Grader::default();
        let gt = [definition("licensee", &[])];
        let cand = [definition("intellectual property rights", &[])];
        let grade = grader.grade_trees(Facet::DefinitionTerm, &gt, &cand);
        assert_eq!(grade.outcome.codes(), (0, 2));
    }

    #[test]
    fn pass_codes_reflect_ground_truth_content() {
        let grader = Grader::default();
        let gt = [definition("licensee", &[])];
        let cand = [definition("the licensee", &[])];

        let term = grader.grade_trees(Facet::DefinitionTerm, &gt, &cand);
        assert_eq!(term.outcome.codes(), (1, 1));

        // Both meanings empty: pass, but nothing to find.
        let meaning = grader.grade_trees(Facet::DefinitionMeaning, &gt, &cand);
        assert_eq!(meaning.outcome.codes(), (1, 0));
        assert_eq!(meaning.ground_truth_count, 0);
    }

    #[test]
    fn no_trees_on_either_side_passes() {
        let grade = Grader::default().grade_trees(Facet::RuleEntity, &[], &[]);
        assert_eq!(grade.outcome.codes(), (1, 0));
    }

    #[test]
    fn null_required_field_is_missing() {
        let gt = [json!({"entity": expr("the licensee")})];
        let cand = [json!({"entity": null})];
        let grade = Grader::default().grade_trees(Facet::RuleEntity, &gt, &cand);
        match grade.outcome {
            FacetOutcome::Failed {
                class,
                reason: FailureReason::Mismatch { index, mismatch },
            } => {
                assert_eq!(class, FailureClass::MissedContent);
                assert_eq!(index, 0);
                assert_eq!(
                    mismatch,
                    Mismatch::MissingField {
                        path: "$".to_string(),
                        field: "entity".to_string(),
                        side: Side::Candidate,
                    }
                );
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn rule_type_is_exact_and_description_optional() {
        let grader = Grader::default();
        let obligation = json!({"rule_type": 0, "description": null});
        let permission = json!({"rule_type": 1, "description": null});

        let grade = grader.grade_trees(Facet::RuleType, &[obligation.clone()], &[permission]);
        assert!(!grade.outcome.passed());

        let grade = grader.grade_trees(
            Facet::RuleDescription,
            &[obligation.clone()],
            &[obligation],
        );
        assert_eq!(grade.outcome.codes(), (1, 0));
    }

    #[test]
    fn relationship_facet_reads_one_list() {
        let gt = [json!({"relationships": {"refines": ["section 2"], "follows": []}})];
        let cand = [json!({"relationships": {"refines": ["section 3"], "follows": ["x"]}})];
        let grader = Grader::default();

        let refines = grader.grade_trees(Facet::Relationship(Relationship::Refines), &gt, &cand);
        assert_eq!(refines.outcome.codes(), (1, 1));

        let follows = grader.grade_trees(Facet::Relationship(Relationship::Follows), &gt, &cand);
        assert_eq!(follows.outcome.codes(), (0, 0));
    }

    #[test]
    fn stricter_threshold_rejects_paraphrase() {
        let gt = [definition("the licensee", &[])];
        let cand = [definition("the license holder", &[])];

        let lenient = Grader::default().grade_trees(Facet::DefinitionTerm, &gt, &cand);
        assert!(lenient.outcome.passed());

        let strict = Grader::default()
            .with_threshold(2)
            .grade_trees(Facet::DefinitionTerm, &gt, &cand);
        assert_eq!(strict.outcome.codes(), (0, 2));
    }
}
