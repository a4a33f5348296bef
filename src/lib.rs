//! Structural annotation model for legal text.
//!
//! Legal text is annotated as a tree of bullet-point [`Section`]s holding
//! textual [`Expression`]s (some of which are cross-references) and typed
//! legal [`Statement`]s connected by relationship edges. Two independently
//! built annotations of the same text can then be compared:
//!
//! - [`canonical`] renders entities into deterministic, content-addressed
//!   trees ([`serde_json::Value`] with fixed keys).
//! - [`equivalence`] compares those trees structurally, tolerating small
//!   textual differences through a bounded edit distance.
//!
//! ## Example
//!
//! ```
//! use legal_annotation::{AnnotationGraph, RuleType, canonicalize_statement, check_expr_trees};
//!
//! let mut gt = AnnotationGraph::new();
//! let s = gt.new_section("1");
//! let entity = gt.new_expression(s, "the licensee").unwrap();
//! let rule = gt.new_rule(s, entity).unwrap();
//! gt.set_rule_type(rule, RuleType::Obligation).unwrap();
//!
//! let mut candidate = AnnotationGraph::new();
//! let s = candidate.new_section("1");
//! let entity = candidate.new_expression(s, "the license holder").unwrap();
//! let rule2 = candidate.new_rule(s, entity).unwrap();
//!
//! let a = canonicalize_statement(&gt, rule);
//! let b = canonicalize_statement(&candidate, rule2);
//! assert!(check_expr_trees(&a["entity"], &b["entity"], 10).is_ok());
//! ```

pub mod canonical;
pub mod equivalence;
mod errors;
mod graph;
mod statement;

pub use canonical::{
    canonicalize_expression, canonicalize_reference, canonicalize_section,
    canonicalize_statement, identify, Canonicalizer,
};
pub use equivalence::{
    check_expr_lists, check_expr_trees, check_reference_lists, check_reference_trees,
    check_value_lists, edit_distance, expr_lists_similar, expr_trees_similar, lists_similar,
    reference_lists_similar, reference_trees_similar, strings_similar, Mismatch, Side,
    DEFAULT_THRESHOLD,
};
pub use errors::{GraphError, GraphResult};
pub use graph::{
    AnnotationGraph, Expression, ExpressionId, ReferenceLink, Section, SectionId, StatementId,
    Target,
};
pub use statement::{
    Definition, Exemption, Information, Relationship, Relationships, Rule, RuleType, Statement,
    StatementKind, StatementVariant,
};
