//! Arena-backed entity graph for annotated legal text.
//!
//! Sections form a strict tree. Statement relationship edges and
//! reference targets may form arbitrary graphs (including cycles), so all
//! links are stored as handles into the owning [`AnnotationGraph`].

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::errors::{GraphError, GraphResult};
use crate::statement::{
    Definition, Exemption, Information, Relationship, Rule, RuleType, Statement, StatementKind,
    StatementVariant,
};

/// Handle to a [`Section`] in an [`AnnotationGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionId(usize);

/// Handle to an [`Expression`] (plain span or reference).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExpressionId(usize);

/// Handle to a [`Statement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatementId(usize);

impl SectionId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl ExpressionId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl StatementId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// What a reference or relationship edge points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    Expression(ExpressionId),
    Statement(StatementId),
}

impl From<ExpressionId> for Target {
    fn from(id: ExpressionId) -> Self {
        Target::Expression(id)
    }
}

impl From<StatementId> for Target {
    fn from(id: StatementId) -> Self {
        Target::Statement(id)
    }
}

/// A bullet point of the source text. Sub-bullets become subsections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub number: String,
    /// Empty when the bullet has no title.
    pub title: String,
    pub parent: Option<SectionId>,
    pub subsections: Vec<SectionId>,
    pub expressions: Vec<ExpressionId>,
    pub statements: Vec<StatementId>,
}

/// Cross-reference payload carried by an expression that points elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceLink {
    pub target: Target,
    /// Assigned when the reference is registered in a relationship list.
    pub relationship: Option<Relationship>,
}

/// A span of text within a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub section: Option<SectionId>,
    pub text: String,
    /// Nested spans, shared by handle.
    pub includes: Vec<ExpressionId>,
    /// Present iff this expression is a Reference.
    pub reference: Option<ReferenceLink>,
}

impl Expression {
    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }
}

/// Owner of every section, expression and statement of one annotation.
///
/// Entities are kept in creation order, which is the order loaders
/// expose them in.
#[derive(Debug, Clone, Default)]
pub struct AnnotationGraph {
    sections: Vec<Section>,
    expressions: Vec<Expression>,
    statements: Vec<Statement>,
}

impl AnnotationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Sections
    // ------------------------------------------------------------------

    /// Create a top-level section.
    pub fn new_section(&mut self, number: impl Into<String>) -> SectionId {
        let id = SectionId(self.sections.len());
        self.sections.push(Section {
            number: number.into(),
            title: String::new(),
            parent: None,
            subsections: Vec::new(),
            expressions: Vec::new(),
            statements: Vec::new(),
        });
        id
    }

    /// Create a section nested directly under `parent`.
    pub fn new_subsection(
        &mut self,
        parent: SectionId,
        number: impl Into<String>,
    ) -> GraphResult<SectionId> {
        self.check_section(parent)?;
        let child = self.new_section(number);
        self.add_subsection(parent, child)?;
        Ok(child)
    }

    pub fn set_section_title(
        &mut self,
        section: SectionId,
        title: impl Into<String>,
    ) -> GraphResult<()> {
        self.section_mut(section)?.title = title.into();
        Ok(())
    }

    /// Attach `child` under `parent`.
    ///
    /// A child that already has a parent is detached from it first.
    /// Attachments that would make a section its own ancestor are rejected.
    pub fn add_subsection(&mut self, parent: SectionId, child: SectionId) -> GraphResult<()> {
        self.check_section(parent)?;
        self.check_section(child)?;

        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(GraphError::SectionCycle { parent, child });
            }
            cursor = self.sections[current.0].parent;
        }

        if let Some(old_parent) = self.sections[child.0].parent {
            self.sections[old_parent.0]
                .subsections
                .retain(|sub| *sub != child);
        }
        self.sections[parent.0].subsections.push(child);
        self.sections[child.0].parent = Some(parent);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Expressions and references
    // ------------------------------------------------------------------

    /// Create a plain expression, appended to its section's expression list.
    pub fn new_expression(
        &mut self,
        section: impl Into<Option<SectionId>>,
        text: impl Into<String>,
    ) -> GraphResult<ExpressionId> {
        self.push_expression(section.into(), text.into(), None)
    }

    /// Create a reference pointing at an existing statement or expression.
    pub fn new_reference(
        &mut self,
        section: impl Into<Option<SectionId>>,
        text: impl Into<String>,
        target: impl Into<Target>,
    ) -> GraphResult<ExpressionId> {
        let target = target.into();
        self.check_target(target)?;
        let link = ReferenceLink {
            target,
            relationship: None,
        };
        self.push_expression(section.into(), text.into(), Some(link))
    }

    /// Nest `child` inside `parent`.
    ///
    /// Includes that would make `parent` reachable from its own includes
    /// are rejected.
    pub fn add_include(&mut self, parent: ExpressionId, child: ExpressionId) -> GraphResult<()> {
        self.check_expression(parent)?;
        self.check_expression(child)?;

        let mut pending = vec![child];
        let mut seen = vec![false; self.expressions.len()];
        while let Some(current) = pending.pop() {
            if current == parent {
                return Err(GraphError::IncludeCycle { parent, child });
            }
            if !std::mem::replace(&mut seen[current.0], true) {
                pending.extend(self.expressions[current.0].includes.iter().copied());
            }
        }

        self.expressions[parent.0].includes.push(child);
        Ok(())
    }

    fn push_expression(
        &mut self,
        section: Option<SectionId>,
        text: String,
        reference: Option<ReferenceLink>,
    ) -> GraphResult<ExpressionId> {
        if let Some(section) = section {
            self.check_section(section)?;
        }
        let id = ExpressionId(self.expressions.len());
        self.expressions.push(Expression {
            section,
            text,
            includes: Vec::new(),
            reference,
        });
        if let Some(section) = section {
            self.sections[section.0].expressions.push(id);
        }
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    pub fn new_information(
        &mut self,
        section: impl Into<Option<SectionId>>,
        description: ExpressionId,
    ) -> GraphResult<StatementId> {
        self.check_expression(description)?;
        let kind = StatementKind::Information(Information {
            description: vec![description],
        });
        self.push_statement(section.into(), kind)
    }

    pub fn new_definition(
        &mut self,
        section: impl Into<Option<SectionId>>,
        defined_term: ExpressionId,
    ) -> GraphResult<StatementId> {
        self.check_expression(defined_term)?;
        let kind = StatementKind::Definition(Definition {
            defined_term,
            meaning: Vec::new(),
            exclusions: Vec::new(),
        });
        self.push_statement(section.into(), kind)
    }

    /// Create a rule with no type, description or conditions yet.
    pub fn new_rule(
        &mut self,
        section: impl Into<Option<SectionId>>,
        entity: ExpressionId,
    ) -> GraphResult<StatementId> {
        self.check_expression(entity)?;
        let kind = StatementKind::Rule(Rule {
            rule_type: None,
            entity,
            description: None,
            conditions: Vec::new(),
        });
        self.push_statement(section.into(), kind)
    }

    pub fn new_exemption(
        &mut self,
        section: impl Into<Option<SectionId>>,
    ) -> GraphResult<StatementId> {
        self.push_statement(section.into(), StatementKind::Exemption(Exemption::default()))
    }

    fn push_statement(
        &mut self,
        section: Option<SectionId>,
        kind: StatementKind,
    ) -> GraphResult<StatementId> {
        if let Some(section) = section {
            self.check_section(section)?;
        }
        let id = StatementId(self.statements.len());
        self.statements.push(Statement::new(section, kind));
        if let Some(section) = section {
            self.sections[section.0].statements.push(id);
        }
        Ok(id)
    }

    /// Append a description span to an Information or Exemption.
    pub fn add_description(
        &mut self,
        statement: StatementId,
        expression: ExpressionId,
    ) -> GraphResult<()> {
        self.check_expression(expression)?;
        match &mut self.statement_mut(statement)?.kind {
            StatementKind::Information(info) => info.description.push(expression),
            StatementKind::Exemption(exemption) => exemption.description.push(expression),
            other => {
                return Err(GraphError::VariantMismatch {
                    operation: "add_description",
                    expected: "Information or Exemption",
                    found: other.variant().name(),
                })
            }
        }
        Ok(())
    }

    pub fn add_meaning(
        &mut self,
        statement: StatementId,
        expression: ExpressionId,
    ) -> GraphResult<()> {
        self.check_expression(expression)?;
        self.definition_mut(statement, "add_meaning")?
            .meaning
            .push(expression);
        Ok(())
    }

    pub fn add_exclusion(
        &mut self,
        statement: StatementId,
        expression: ExpressionId,
    ) -> GraphResult<()> {
        self.check_expression(expression)?;
        self.definition_mut(statement, "add_exclusion")?
            .exclusions
            .push(expression);
        Ok(())
    }

    pub fn set_rule_type(&mut self, statement: StatementId, rule_type: RuleType) -> GraphResult<()> {
        self.rule_mut(statement, "set_rule_type")?.rule_type = Some(rule_type);
        Ok(())
    }

    pub fn set_rule_description(
        &mut self,
        statement: StatementId,
        expression: ExpressionId,
    ) -> GraphResult<()> {
        self.check_expression(expression)?;
        self.rule_mut(statement, "set_rule_description")?.description = Some(expression);
        Ok(())
    }

    pub fn add_condition(
        &mut self,
        statement: StatementId,
        expression: ExpressionId,
    ) -> GraphResult<()> {
        self.check_expression(expression)?;
        self.rule_mut(statement, "add_condition")?
            .conditions
            .push(expression);
        Ok(())
    }

    fn definition_mut(
        &mut self,
        statement: StatementId,
        operation: &'static str,
    ) -> GraphResult<&mut Definition> {
        match &mut self.statement_mut(statement)?.kind {
            StatementKind::Definition(def) => Ok(def),
            other => Err(GraphError::VariantMismatch {
                operation,
                expected: "Definition",
                found: other.variant().name(),
            }),
        }
    }

    fn rule_mut(&mut self, statement: StatementId, operation: &'static str) -> GraphResult<&mut Rule> {
        match &mut self.statement_mut(statement)?.kind {
            StatementKind::Rule(rule) => Ok(rule),
            other => Err(GraphError::VariantMismatch {
                operation,
                expected: "Rule",
                found: other.variant().name(),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Relationship edges
    // ------------------------------------------------------------------

    /// Register `target` under `relationship` on `statement`.
    ///
    /// If the target is a reference, its relationship tag becomes
    /// `relationship`; a later registration overwrites the tag.
    pub fn add_relationship(
        &mut self,
        statement: StatementId,
        relationship: Relationship,
        target: impl Into<Target>,
    ) -> GraphResult<()> {
        let target = target.into();
        self.check_target(target)?;
        self.statement_mut(statement)?
            .relationships
            .push(relationship, target);

        if let Target::Expression(expr) = target {
            if let Some(link) = self.expressions[expr.0].reference.as_mut() {
                link.relationship = Some(relationship);
            }
        }
        Ok(())
    }

    pub fn add_refines(&mut self, statement: StatementId, target: impl Into<Target>) -> GraphResult<()> {
        self.add_relationship(statement, Relationship::Refines, target)
    }

    pub fn add_is_refined_by(
        &mut self,
        statement: StatementId,
        target: impl Into<Target>,
    ) -> GraphResult<()> {
        self.add_relationship(statement, Relationship::IsRefinedBy, target)
    }

    /// Register under `has_exception`.
    pub fn add_exception(&mut self, statement: StatementId, target: impl Into<Target>) -> GraphResult<()> {
        self.add_relationship(statement, Relationship::HasException, target)
    }

    pub fn add_is_exception_to(
        &mut self,
        statement: StatementId,
        target: impl Into<Target>,
    ) -> GraphResult<()> {
        self.add_relationship(statement, Relationship::IsExceptionTo, target)
    }

    pub fn add_follows(&mut self, statement: StatementId, target: impl Into<Target>) -> GraphResult<()> {
        self.add_relationship(statement, Relationship::Follows, target)
    }

    pub fn add_is_followed_by(
        &mut self,
        statement: StatementId,
        target: impl Into<Target>,
    ) -> GraphResult<()> {
        self.add_relationship(statement, Relationship::IsFollowedBy, target)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn get_section(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(id.0)
    }

    pub fn get_expression(&self, id: ExpressionId) -> Option<&Expression> {
        self.expressions.get(id.0)
    }

    pub fn get_statement(&self, id: StatementId) -> Option<&Statement> {
        self.statements.get(id.0)
    }

    /// All sections in creation order.
    pub fn sections(&self) -> impl Iterator<Item = (SectionId, &Section)> + '_ {
        self.sections
            .iter()
            .enumerate()
            .map(|(idx, section)| (SectionId(idx), section))
    }

    /// Sections without a parent, in creation order.
    pub fn top_level_sections(&self) -> impl Iterator<Item = SectionId> + '_ {
        self.sections()
            .filter(|(_, section)| section.parent.is_none())
            .map(|(id, _)| id)
    }

    /// All expressions (plain and references) in creation order.
    pub fn expressions(&self) -> impl Iterator<Item = (ExpressionId, &Expression)> + '_ {
        self.expressions
            .iter()
            .enumerate()
            .map(|(idx, expr)| (ExpressionId(idx), expr))
    }

    /// Expressions that are references, in creation order.
    pub fn references(&self) -> impl Iterator<Item = ExpressionId> + '_ {
        self.expressions()
            .filter(|(_, expr)| expr.is_reference())
            .map(|(id, _)| id)
    }

    pub fn statements(&self) -> impl Iterator<Item = (StatementId, &Statement)> + '_ {
        self.statements
            .iter()
            .enumerate()
            .map(|(idx, stmt)| (StatementId(idx), stmt))
    }

    /// Statements of one variant, in creation order.
    pub fn statements_of(&self, variant: StatementVariant) -> impl Iterator<Item = StatementId> + '_ {
        self.statements()
            .filter(move |(_, stmt)| stmt.variant() == variant)
            .map(|(id, _)| id)
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn expression_count(&self) -> usize {
        self.expressions.len()
    }

    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.expressions.is_empty() && self.statements.is_empty()
    }

    // ------------------------------------------------------------------
    // Handle validation
    // ------------------------------------------------------------------

    fn check_section(&self, id: SectionId) -> GraphResult<()> {
        self.get_section(id)
            .map(|_| ())
            .ok_or(GraphError::UnknownSection(id))
    }

    fn check_expression(&self, id: ExpressionId) -> GraphResult<()> {
        self.get_expression(id)
            .map(|_| ())
            .ok_or(GraphError::UnknownExpression(id))
    }

    fn check_target(&self, target: Target) -> GraphResult<()> {
        let exists = match target {
            Target::Expression(id) => self.get_expression(id).is_some(),
            Target::Statement(id) => self.get_statement(id).is_some(),
        };
        if exists {
            Ok(())
        } else {
            Err(GraphError::UnknownTarget(format!("{:?}", target)))
        }
    }

    fn section_mut(&mut self, id: SectionId) -> GraphResult<&mut Section> {
        self.sections
            .get_mut(id.0)
            .ok_or(GraphError::UnknownSection(id))
    }

    fn statement_mut(&mut self, id: StatementId) -> GraphResult<&mut Statement> {
        self.statements
            .get_mut(id.0)
            .ok_or(GraphError::UnknownStatement(id))
    }
}

// Indexing panics on handles minted by another graph, like `Vec` indexing.

impl Index<SectionId> for AnnotationGraph {
    type Output = Section;

    fn index(&self, id: SectionId) -> &Section {
        &self.sections[id.0]
    }
}

impl Index<ExpressionId> for AnnotationGraph {
    type Output = Expression;

    fn index(&self, id: ExpressionId) -> &Expression {
        &self.expressions[id.0]
    }
}

impl Index<StatementId> for AnnotationGraph {
    type Output = Statement;

    fn index(&self, id: StatementId) -> &Statement {
        &self.statements[id.0]
    }
}
