//! Data-driven annotation scripts.
//!
//! A script is a RON list of construction steps, executed in order against
//! a fresh [`AnnotationGraph`]. Each step names a local id that later steps
//! use to refer to it:
//!
//! ```ron
//! [
//!     Section(id: "s1", number: "4.1", title: "Royalties"),
//!     Expression(id: "licensee", section: "s1", text: "the licensee"),
//!     Expression(id: "pay", section: "s1", text: "must pay royalties within 30 days"),
//!     Rule(id: "r1", section: "s1", entity: "licensee", rule_type: OBLIGATION, description: "pay"),
//!     Reference(id: "ref", section: "s1", text: "Section 4.1", target: "r1"),
//!     Relate(from: "r1", relationship: refines, to: "ref"),
//! ]
//! ```
//!
//! Optional fields may be written without `Some(..)`.

use std::collections::HashMap;

use legal_annotation::{
    AnnotationGraph, ExpressionId, GraphError, Relationship, RuleType, SectionId, StatementId,
    Target,
};
use ron::extensions::Extensions;
use serde::{Deserialize, Serialize};

use crate::errors::{GradeError, GradeResult};

/// One construction step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    Section {
        id: String,
        number: String,
        #[serde(default)]
        title: Option<String>,
        /// Id of the parent section for nested bullets.
        #[serde(default)]
        parent: Option<String>,
    },
    Expression {
        id: String,
        #[serde(default)]
        section: Option<String>,
        text: String,
        #[serde(default)]
        includes: Vec<String>,
    },
    Reference {
        id: String,
        #[serde(default)]
        section: Option<String>,
        text: String,
        /// Id of an existing statement or expression.
        target: String,
        #[serde(default)]
        includes: Vec<String>,
    },
    Information {
        id: String,
        #[serde(default)]
        section: Option<String>,
        description: Vec<String>,
    },
    Definition {
        id: String,
        #[serde(default)]
        section: Option<String>,
        defined_term: String,
        #[serde(default)]
        meaning: Vec<String>,
        #[serde(default)]
        exclusions: Vec<String>,
    },
    Rule {
        id: String,
        #[serde(default)]
        section: Option<String>,
        entity: String,
        #[serde(default)]
        rule_type: Option<RuleType>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        conditions: Vec<String>,
    },
    Exemption {
        id: String,
        #[serde(default)]
        section: Option<String>,
        #[serde(default)]
        description: Vec<String>,
    },
    /// Register `to` in the `relationship` list of statement `from`.
    Relate {
        from: String,
        relationship: Relationship,
        to: String,
    },
}

/// A parsed annotation script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationScript {
    pub steps: Vec<Step>,
}

impl AnnotationScript {
    /// Parse RON source.
    pub fn parse(source: &str) -> GradeResult<Self> {
        ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(source)
            .map_err(|e| GradeError::Parse {
                line: e.position.line,
                column: e.position.col,
                message: e.code.to_string(),
            })
    }

    /// Execute every step against a fresh graph.
    pub fn build(&self) -> GradeResult<AnnotationGraph> {
        let mut builder = ScriptBuilder::default();
        for (idx, step) in self.steps.iter().enumerate() {
            builder
                .apply(step)
                .map_err(|message| GradeError::Build { step: idx, message })?;
        }
        Ok(builder.graph)
    }
}

#[derive(Debug, Clone, Copy)]
enum Handle {
    Section(SectionId),
    Expression(ExpressionId),
    Statement(StatementId),
}

impl Handle {
    fn kind(&self) -> &'static str {
        match self {
            Handle::Section(_) => "a section",
            Handle::Expression(_) => "an expression",
            Handle::Statement(_) => "a statement",
        }
    }
}

#[derive(Debug, Default)]
struct ScriptBuilder {
    graph: AnnotationGraph,
    ids: HashMap<String, Handle>,
}

impl ScriptBuilder {
    fn apply(&mut self, step: &Step) -> Result<(), String> {
        match step {
            Step::Section {
                id,
                number,
                title,
                parent,
            } => {
                let section = match parent {
                    Some(parent) => {
                        let parent = self.section(parent)?;
                        self.graph
                            .new_subsection(parent, number.as_str())
                            .map_err(graph_err)?
                    }
                    None => self.graph.new_section(number.as_str()),
                };
                if let Some(title) = title {
                    self.graph
                        .set_section_title(section, title.as_str())
                        .map_err(graph_err)?;
                }
                self.bind(id, Handle::Section(section))
            }
            Step::Expression {
                id,
                section,
                text,
                includes,
            } => {
                let section = self.optional_section(section)?;
                let expr = self
                    .graph
                    .new_expression(section, text.as_str())
                    .map_err(graph_err)?;
                self.include_all(expr, includes)?;
                self.bind(id, Handle::Expression(expr))
            }
            Step::Reference {
                id,
                section,
                text,
                target,
                includes,
            } => {
                let section = self.optional_section(section)?;
                let target = self.target(target)?;
                let expr = self
                    .graph
                    .new_reference(section, text.as_str(), target)
                    .map_err(graph_err)?;
                self.include_all(expr, includes)?;
                self.bind(id, Handle::Expression(expr))
            }
            Step::Information {
                id,
                section,
                description,
            } => {
                let section = self.optional_section(section)?;
                let (first, rest) = description
                    .split_first()
                    .ok_or_else(|| "Information requires at least one description".to_string())?;
                let first = self.expression(first)?;
                let stmt = self
                    .graph
                    .new_information(section, first)
                    .map_err(graph_err)?;
                for desc in rest {
                    let desc = self.expression(desc)?;
                    self.graph.add_description(stmt, desc).map_err(graph_err)?;
                }
                self.bind(id, Handle::Statement(stmt))
            }
            Step::Definition {
                id,
                section,
                defined_term,
                meaning,
                exclusions,
            } => {
                let section = self.optional_section(section)?;
                let term = self.expression(defined_term)?;
                let stmt = self
                    .graph
                    .new_definition(section, term)
                    .map_err(graph_err)?;
                for m in meaning {
                    let m = self.expression(m)?;
                    self.graph.add_meaning(stmt, m).map_err(graph_err)?;
                }
                for ex in exclusions {
                    let ex = self.expression(ex)?;
                    self.graph.add_exclusion(stmt, ex).map_err(graph_err)?;
                }
                self.bind(id, Handle::Statement(stmt))
            }
            Step::Rule {
                id,
                section,
                entity,
                rule_type,
                description,
                conditions,
            } => {
                let section = self.optional_section(section)?;
                let entity = self.expression(entity)?;
                let stmt = self.graph.new_rule(section, entity).map_err(graph_err)?;
                if let Some(rule_type) = rule_type {
                    self.graph
                        .set_rule_type(stmt, *rule_type)
                        .map_err(graph_err)?;
                }
                if let Some(description) = description {
                    let description = self.expression(description)?;
                    self.graph
                        .set_rule_description(stmt, description)
                        .map_err(graph_err)?;
                }
                for cond in conditions {
                    let cond = self.expression(cond)?;
                    self.graph.add_condition(stmt, cond).map_err(graph_err)?;
                }
                self.bind(id, Handle::Statement(stmt))
            }
            Step::Exemption {
                id,
                section,
                description,
            } => {
                let section = self.optional_section(section)?;
                let stmt = self.graph.new_exemption(section).map_err(graph_err)?;
                for desc in description {
                    let desc = self.expression(desc)?;
                    self.graph.add_description(stmt, desc).map_err(graph_err)?;
                }
                self.bind(id, Handle::Statement(stmt))
            }
            Step::Relate {
                from,
                relationship,
                to,
            } => {
                let from = self.statement(from)?;
                let to = self.target(to)?;
                self.graph
                    .add_relationship(from, *relationship, to)
                    .map_err(graph_err)
            }
        }
    }

    fn bind(&mut self, id: &str, handle: Handle) -> Result<(), String> {
        if self.ids.contains_key(id) {
            return Err(format!("duplicate id '{}'", id));
        }
        self.ids.insert(id.to_string(), handle);
        Ok(())
    }

    fn lookup(&self, id: &str) -> Result<Handle, String> {
        self.ids
            .get(id)
            .copied()
            .ok_or_else(|| format!("unknown id '{}'", id))
    }

    fn section(&self, id: &str) -> Result<SectionId, String> {
        match self.lookup(id)? {
            Handle::Section(section) => Ok(section),
            other => Err(wrong_kind(id, "a section", other)),
        }
    }

    fn optional_section(&self, id: &Option<String>) -> Result<Option<SectionId>, String> {
        id.as_deref().map(|id| self.section(id)).transpose()
    }

    fn expression(&self, id: &str) -> Result<ExpressionId, String> {
        match self.lookup(id)? {
            Handle::Expression(expr) => Ok(expr),
            other => Err(wrong_kind(id, "an expression", other)),
        }
    }

    fn statement(&self, id: &str) -> Result<StatementId, String> {
        match self.lookup(id)? {
            Handle::Statement(stmt) => Ok(stmt),
            other => Err(wrong_kind(id, "a statement", other)),
        }
    }

    fn target(&self, id: &str) -> Result<Target, String> {
        match self.lookup(id)? {
            Handle::Expression(expr) => Ok(Target::Expression(expr)),
            Handle::Statement(stmt) => Ok(Target::Statement(stmt)),
            other => Err(wrong_kind(id, "a statement or expression", other)),
        }
    }

    fn include_all(&mut self, parent: ExpressionId, includes: &[String]) -> Result<(), String> {
        for child in includes {
            let child = self.expression(child)?;
            self.graph.add_include(parent, child).map_err(graph_err)?;
        }
        Ok(())
    }
}

fn wrong_kind(id: &str, expected: &str, found: Handle) -> String {
    format!("'{}' is {}, expected {}", id, found.kind(), expected)
}

fn graph_err(err: GraphError) -> String {
    err.to_string()
}
