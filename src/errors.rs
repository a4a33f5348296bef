//! Error types for building annotation graphs.

use thiserror::Error;

use crate::graph::{ExpressionId, SectionId, StatementId};

/// Errors raised while constructing or linking an [`AnnotationGraph`](crate::AnnotationGraph).
///
/// Comparison never produces these: the equivalence engine reports
/// differences as [`Mismatch`](crate::Mismatch) values instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A section handle that does not belong to this graph.
    #[error("unknown section {0:?}")]
    UnknownSection(SectionId),

    /// An expression handle that does not belong to this graph.
    #[error("unknown expression {0:?}")]
    UnknownExpression(ExpressionId),

    /// A statement handle that does not belong to this graph.
    #[error("unknown statement {0:?}")]
    UnknownStatement(StatementId),

    /// A reference or relationship target that has not been constructed yet.
    #[error("reference target does not exist: {0}")]
    UnknownTarget(String),

    /// Attaching the subsection would make a section its own ancestor.
    #[error("attaching section {child:?} under {parent:?} would create a cycle")]
    SectionCycle { parent: SectionId, child: SectionId },

    /// Including the child would make an expression include itself.
    #[error("including expression {child:?} in {parent:?} would create a cycle")]
    IncludeCycle {
        parent: ExpressionId,
        child: ExpressionId,
    },

    /// A variant-specific mutator was applied to another statement variant.
    #[error("{operation} expects a {expected} statement, found {found}")]
    VariantMismatch {
        operation: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

/// Result type for graph construction.
pub type GraphResult<T> = Result<T, GraphError>;
