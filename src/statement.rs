//! Typed legal statements and their relationship edges.
//!
//! A [`Statement`] is a closed sum over four variants (Information,
//! Definition, Rule, Exemption). Every statement carries the same six
//! relationship lists regardless of variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::graph::{ExpressionId, SectionId, Target};

/// The six relationship kinds a statement can have towards other
/// statements or references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    /// This statement provides more detail about the target.
    Refines,
    /// The target provides more detail about this statement.
    IsRefinedBy,
    /// The target is an exception to this statement.
    HasException,
    /// This statement is an exception to the target.
    IsExceptionTo,
    /// The target precedes this statement.
    Follows,
    /// The target comes after this statement.
    IsFollowedBy,
}

impl Relationship {
    /// All kinds, in canonical key order.
    pub const ALL: [Relationship; 6] = [
        Relationship::Refines,
        Relationship::IsRefinedBy,
        Relationship::HasException,
        Relationship::IsExceptionTo,
        Relationship::Follows,
        Relationship::IsFollowedBy,
    ];

    /// Key name used in canonical trees and as a reference's relationship tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Refines => "refines",
            Relationship::IsRefinedBy => "is_refined_by",
            Relationship::HasException => "has_exception",
            Relationship::IsExceptionTo => "is_exception_to",
            Relationship::Follows => "follows",
            Relationship::IsFollowedBy => "is_followed_by",
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relationship {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Relationship::ALL
            .iter()
            .copied()
            .find(|rel| rel.as_str() == s)
            .ok_or_else(|| format!("unknown relationship '{}'", s))
    }
}

/// Ordered relationship targets, one list per [`Relationship`] kind.
///
/// All six lists always exist; an unused kind is simply empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    lists: [Vec<Target>; 6],
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Targets registered under `relationship`, in insertion order.
    pub fn get(&self, relationship: Relationship) -> &[Target] {
        &self.lists[Self::slot(relationship)]
    }

    pub(crate) fn push(&mut self, relationship: Relationship, target: Target) {
        self.lists[Self::slot(relationship)].push(target);
    }

    /// Iterate over every kind with its targets, in canonical key order.
    pub fn iter(&self) -> impl Iterator<Item = (Relationship, &[Target])> + '_ {
        Relationship::ALL
            .iter()
            .map(move |rel| (*rel, self.get(*rel)))
    }

    /// Total number of edges across all kinds.
    pub fn len(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(relationship: Relationship) -> usize {
        match relationship {
            Relationship::Refines => 0,
            Relationship::IsRefinedBy => 1,
            Relationship::HasException => 2,
            Relationship::IsExceptionTo => 3,
            Relationship::Follows => 4,
            Relationship::IsFollowedBy => 5,
        }
    }
}

/// The legal force of a [`Rule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    Obligation,
    Permission,
    Prohibition,
    Penalty,
}

impl RuleType {
    /// Integer code carried in canonical trees.
    pub fn code(&self) -> u8 {
        match self {
            RuleType::Obligation => 0,
            RuleType::Permission => 1,
            RuleType::Prohibition => 2,
            RuleType::Penalty => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(RuleType::Obligation),
            1 => Some(RuleType::Permission),
            2 => Some(RuleType::Prohibition),
            3 => Some(RuleType::Penalty),
            _ => None,
        }
    }
}

/// Something known or proved to be true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Information {
    /// Descriptive spans; the first one is supplied at construction.
    pub description: Vec<ExpressionId>,
}

/// Defines a term used elsewhere in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub defined_term: ExpressionId,
    pub meaning: Vec<ExpressionId>,
    /// What the term explicitly does not cover.
    pub exclusions: Vec<ExpressionId>,
}

/// An obligation, permission, prohibition or penalty bearing on an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub rule_type: Option<RuleType>,
    /// Who or what the rule applies to.
    pub entity: ExpressionId,
    pub description: Option<ExpressionId>,
    pub conditions: Vec<ExpressionId>,
}

/// Someone or something exempt from another rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exemption {
    pub description: Vec<ExpressionId>,
}

/// Variant-specific payload of a [`Statement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    Information(Information),
    Definition(Definition),
    Rule(Rule),
    Exemption(Exemption),
}

/// Field-less discriminant of [`StatementKind`], used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatementVariant {
    Information,
    Definition,
    Rule,
    Exemption,
}

impl StatementVariant {
    /// Name emitted as the `type` discriminator of a canonical statement.
    pub fn name(&self) -> &'static str {
        match self {
            StatementVariant::Information => "Information",
            StatementVariant::Definition => "Definition",
            StatementVariant::Rule => "Rule",
            StatementVariant::Exemption => "Exemption",
        }
    }
}

impl fmt::Display for StatementVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl StatementKind {
    pub fn variant(&self) -> StatementVariant {
        match self {
            StatementKind::Information(_) => StatementVariant::Information,
            StatementKind::Definition(_) => StatementVariant::Definition,
            StatementKind::Rule(_) => StatementVariant::Rule,
            StatementKind::Exemption(_) => StatementVariant::Exemption,
        }
    }
}

/// A typed legal fact, optionally anchored to the section where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub section: Option<SectionId>,
    pub relationships: Relationships,
    pub kind: StatementKind,
}

impl Statement {
    pub(crate) fn new(section: Option<SectionId>, kind: StatementKind) -> Self {
        Self {
            section,
            relationships: Relationships::new(),
            kind,
        }
    }

    pub fn variant(&self) -> StatementVariant {
        self.kind.variant()
    }

    pub fn as_information(&self) -> Option<&Information> {
        match &self.kind {
            StatementKind::Information(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_definition(&self) -> Option<&Definition> {
        match &self.kind {
            StatementKind::Definition(def) => Some(def),
            _ => None,
        }
    }

    pub fn as_rule(&self) -> Option<&Rule> {
        match &self.kind {
            StatementKind::Rule(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn as_exemption(&self) -> Option<&Exemption> {
        match &self.kind {
            StatementKind::Exemption(exemption) => Some(exemption),
            _ => None,
        }
    }
}
