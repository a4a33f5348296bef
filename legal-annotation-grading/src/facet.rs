//! Gradeable facets of an annotation.
//!
//! A facet selects one collection of a [`LoadedAnnotation`](crate::LoadedAnnotation)
//! and one field of each canonical tree in it.

use std::fmt;
use std::str::FromStr;

use legal_annotation::{Relationship, StatementVariant};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which collection a facet draws its trees from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetSource {
    /// Statements of one variant, rendered as statement trees.
    Statements(StatementVariant),
    /// Every reference, rendered as reference trees.
    References,
    /// Every statement regardless of variant.
    AllStatements,
}

/// How the per-index values of a facet are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Ordered list of expression trees.
    ExpressionList,
    /// A single expression tree that must be present on both sides.
    RequiredExpression,
    /// A single expression tree that may be null on both sides.
    OptionalExpression,
    /// Exact equality of the value.
    Exact,
    /// A whole reference tree.
    Reference,
    /// Ordered list of target identifiers.
    IdentifierList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Facet {
    InformationDescription,
    DefinitionTerm,
    DefinitionMeaning,
    DefinitionExclusions,
    RuleEntity,
    RuleType,
    RuleDescription,
    RuleConditions,
    ExemptionDescription,
    References,
    Relationship(Relationship),
}

impl Facet {
    /// Every facet, statement facets first.
    pub fn all() -> Vec<Facet> {
        let mut facets = vec![
            Facet::InformationDescription,
            Facet::DefinitionTerm,
            Facet::DefinitionMeaning,
            Facet::DefinitionExclusions,
            Facet::RuleEntity,
            Facet::RuleType,
            Facet::RuleDescription,
            Facet::RuleConditions,
            Facet::ExemptionDescription,
            Facet::References,
        ];
        facets.extend(Relationship::ALL.iter().copied().map(Facet::Relationship));
        facets
    }

    pub fn source(&self) -> FacetSource {
        match self {
            Facet::InformationDescription => FacetSource::Statements(StatementVariant::Information),
            Facet::DefinitionTerm | Facet::DefinitionMeaning | Facet::DefinitionExclusions => {
                FacetSource::Statements(StatementVariant::Definition)
            }
            Facet::RuleEntity
            | Facet::RuleType
            | Facet::RuleDescription
            | Facet::RuleConditions => FacetSource::Statements(StatementVariant::Rule),
            Facet::ExemptionDescription => FacetSource::Statements(StatementVariant::Exemption),
            Facet::References => FacetSource::References,
            Facet::Relationship(_) => FacetSource::AllStatements,
        }
    }

    pub fn comparison(&self) -> Comparison {
        match self {
            Facet::InformationDescription
            | Facet::DefinitionMeaning
            | Facet::DefinitionExclusions
            | Facet::RuleConditions
            | Facet::ExemptionDescription => Comparison::ExpressionList,
            Facet::DefinitionTerm | Facet::RuleEntity => Comparison::RequiredExpression,
            Facet::RuleDescription => Comparison::OptionalExpression,
            Facet::RuleType => Comparison::Exact,
            Facet::References => Comparison::Reference,
            Facet::Relationship(_) => Comparison::IdentifierList,
        }
    }

    /// Canonical tree key holding this facet's value. `None` means the
    /// whole tree.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Facet::InformationDescription
            | Facet::RuleDescription
            | Facet::ExemptionDescription => Some("description"),
            Facet::DefinitionTerm => Some("defined_term"),
            Facet::DefinitionMeaning => Some("meaning"),
            Facet::DefinitionExclusions => Some("exclusions"),
            Facet::RuleEntity => Some("entity"),
            Facet::RuleType => Some("rule_type"),
            Facet::RuleConditions => Some("conditions"),
            Facet::References => None,
            Facet::Relationship(_) => Some("relationships"),
        }
    }

    /// Value of this facet in one canonical tree. Missing keys read as null.
    pub fn extract<'t>(&self, tree: &'t Value) -> &'t Value {
        let value = match self.field() {
            Some(key) => &tree[key],
            None => tree,
        };
        match self {
            Facet::Relationship(rel) => &value[rel.as_str()],
            _ => value,
        }
    }

    /// Whether a tree counts as having content for this facet.
    ///
    /// Null and empty lists are no content. Every reference counts.
    pub fn has_content(&self, tree: &Value) -> bool {
        if let Facet::References = self {
            return true;
        }
        match self.extract(tree) {
            Value::Null => false,
            Value::Array(items) => !items.is_empty(),
            _ => true,
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Facet::InformationDescription => "information_description",
            Facet::DefinitionTerm => "definition_term",
            Facet::DefinitionMeaning => "definition_meaning",
            Facet::DefinitionExclusions => "definition_exclusions",
            Facet::RuleEntity => "rule_entity",
            Facet::RuleType => "rule_type",
            Facet::RuleDescription => "rule_description",
            Facet::RuleConditions => "rule_conditions",
            Facet::ExemptionDescription => "exemption_description",
            Facet::References => "references",
            Facet::Relationship(rel) => return write!(f, "relationship:{}", rel),
        };
        f.write_str(name)
    }
}

impl FromStr for Facet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rel) = s.strip_prefix("relationship:") {
            return rel.parse().map(Facet::Relationship);
        }
        match s {
            "information_description" => Ok(Facet::InformationDescription),
            "definition_term" => Ok(Facet::DefinitionTerm),
            "definition_meaning" => Ok(Facet::DefinitionMeaning),
            "definition_exclusions" => Ok(Facet::DefinitionExclusions),
            "rule_entity" => Ok(Facet::RuleEntity),
            "rule_type" => Ok(Facet::RuleType),
            "rule_description" => Ok(Facet::RuleDescription),
            "rule_conditions" => Ok(Facet::RuleConditions),
            "exemption_description" => Ok(Facet::ExemptionDescription),
            "references" => Ok(Facet::References),
            other => Err(format!("unknown facet '{}'", other)),
        }
    }
}

impl TryFrom<String> for Facet {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Facet> for String {
    fn from(facet: Facet) -> Self {
        facet.to_string()
    }
}
