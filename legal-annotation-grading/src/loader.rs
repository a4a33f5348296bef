//! Loading annotation scripts into graded collections.

use std::fs;
use std::path::Path;

use legal_annotation::{AnnotationGraph, ExpressionId, StatementId, StatementVariant};

use crate::errors::{GradeError, GradeResult};
use crate::script::AnnotationScript;

/// One annotation, built into its own graph, with the statement and
/// reference collections graded facets draw from.
///
/// Collections are in creation order.
#[derive(Debug, Clone, Default)]
pub struct LoadedAnnotation {
    pub graph: AnnotationGraph,
    pub information: Vec<StatementId>,
    pub definitions: Vec<StatementId>,
    pub rules: Vec<StatementId>,
    pub exemptions: Vec<StatementId>,
    pub references: Vec<ExpressionId>,
    pub statements: Vec<StatementId>,
}

impl LoadedAnnotation {
    /// Parse and build `source` into a fresh graph.
    ///
    /// A script that fails to parse or build yields empty collections; the
    /// error is logged, not returned.
    pub fn load(source: &str) -> Self {
        match Self::try_load(source) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(error = %e, "annotation failed to load, grading it as empty");
                Self::default()
            }
        }
    }

    /// Like [`load`](Self::load), but surfaces the error.
    pub fn try_load(source: &str) -> GradeResult<Self> {
        let graph = AnnotationScript::parse(source)?.build()?;
        Ok(Self::from_graph(graph))
    }

    pub fn from_graph(graph: AnnotationGraph) -> Self {
        let of = |variant| graph.statements_of(variant).collect::<Vec<_>>();
        let information = of(StatementVariant::Information);
        let definitions = of(StatementVariant::Definition);
        let rules = of(StatementVariant::Rule);
        let exemptions = of(StatementVariant::Exemption);
        let references = graph.references().collect();
        let statements = graph.statements().map(|(id, _)| id).collect();
        Self {
            graph,
            information,
            definitions,
            rules,
            exemptions,
            references,
            statements,
        }
    }

    /// Statements of one variant.
    pub fn statements_of(&self, variant: StatementVariant) -> &[StatementId] {
        match variant {
            StatementVariant::Information => &self.information,
            StatementVariant::Definition => &self.definitions,
            StatementVariant::Rule => &self.rules,
            StatementVariant::Exemption => &self.exemptions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty() && self.references.is_empty()
    }
}

/// Read a script from disk. Only I/O errors are returned; the script
/// itself is loaded leniently.
pub fn load_file(path: &Path) -> GradeResult<LoadedAnnotation> {
    let source = read_script(path)?;
    Ok(LoadedAnnotation::load(&source))
}

pub(crate) fn read_script(path: &Path) -> GradeResult<String> {
    fs::read_to_string(path).map_err(|e| GradeError::Load {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
