//! Canonical trees: deterministic, comparable renderings of graph entities.
//!
//! Two annotation graphs built independently share no identity space, so
//! every node is rendered from its content alone. Relationship targets are
//! reduced to a stable textual identifier (see [`Canonicalizer::identify`]).
//!
//! The key names below are the interchange format consumed by graders and
//! external tooling:
//!
//! | Entity     | Keys |
//! |------------|------|
//! | Section    | `sectionNumber`, `sectionTitle`, `subSections`, `expressions`, `statements` |
//! | Expression | `text`, `includes`, `sectionNumber` |
//! | Reference  | `text`, `target`, `sectionNumber`, `relationship` |
//! | Statement  | `section`, `relationships`, `type` + variant fields |

use serde_json::{json, Map, Value};

use crate::graph::{AnnotationGraph, ExpressionId, SectionId, StatementId, Target};
use crate::statement::{Relationships, StatementKind};

/// Renders entities of one graph into canonical trees.
///
/// Handles passed in must belong to the borrowed graph.
#[derive(Debug, Clone, Copy)]
pub struct Canonicalizer<'g> {
    graph: &'g AnnotationGraph,
}

impl<'g> Canonicalizer<'g> {
    pub fn new(graph: &'g AnnotationGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &'g AnnotationGraph {
        self.graph
    }

    /// Section with its subsections, expressions and statements, in order.
    pub fn section(&self, id: SectionId) -> Value {
        let section = &self.graph[id];
        json!({
            "sectionNumber": section.number,
            "sectionTitle": section.title,
            "subSections": section
                .subsections
                .iter()
                .map(|sub| self.section(*sub))
                .collect::<Vec<_>>(),
            "expressions": section
                .expressions
                .iter()
                .map(|expr| self.expression(*expr))
                .collect::<Vec<_>>(),
            "statements": section
                .statements
                .iter()
                .map(|stmt| self.statement(*stmt))
                .collect::<Vec<_>>(),
        })
    }

    /// Expression form. References rendered through this keep only the
    /// expression keys.
    pub fn expression(&self, id: ExpressionId) -> Value {
        let expr = &self.graph[id];
        json!({
            "text": expr.text.to_lowercase(),
            "includes": expr
                .includes
                .iter()
                .map(|child| self.expression(*child))
                .collect::<Vec<_>>(),
            "sectionNumber": self.section_number(expr.section),
        })
    }

    /// Reference form. A plain expression yields a null target and
    /// relationship.
    pub fn reference(&self, id: ExpressionId) -> Value {
        let expr = &self.graph[id];
        let (target, relationship) = match expr.reference {
            Some(link) => (
                Value::String(self.identify(link.target)),
                link.relationship
                    .map_or(Value::Null, |rel| Value::String(rel.as_str().to_string())),
            ),
            None => (Value::Null, Value::Null),
        };
        json!({
            "text": expr.text.to_lowercase(),
            "target": target,
            "sectionNumber": self.section_number(expr.section),
            "relationship": relationship,
        })
    }

    pub fn statement(&self, id: StatementId) -> Value {
        let stmt = &self.graph[id];
        let mut tree = Map::new();
        tree.insert("section".into(), self.section_number(stmt.section));
        tree.insert(
            "relationships".into(),
            self.relationships(&stmt.relationships),
        );
        tree.insert("type".into(), stmt.variant().name().into());

        match &stmt.kind {
            StatementKind::Information(info) => {
                tree.insert("description".into(), self.expression_list(&info.description));
            }
            StatementKind::Definition(def) => {
                tree.insert("defined_term".into(), self.expression(def.defined_term));
                tree.insert("meaning".into(), self.expression_list(&def.meaning));
                tree.insert("exclusions".into(), self.expression_list(&def.exclusions));
            }
            StatementKind::Rule(rule) => {
                tree.insert(
                    "rule_type".into(),
                    rule.rule_type.map_or(Value::Null, |rt| rt.code().into()),
                );
                tree.insert("entity".into(), self.expression(rule.entity));
                tree.insert(
                    "description".into(),
                    rule.description
                        .map_or(Value::Null, |desc| self.expression(desc)),
                );
                tree.insert("conditions".into(), self.expression_list(&rule.conditions));
            }
            StatementKind::Exemption(exemption) => {
                tree.insert(
                    "description".into(),
                    self.expression_list(&exemption.description),
                );
            }
        }

        Value::Object(tree)
    }

    /// Stable identifier for a relationship or reference target.
    ///
    /// Statements are identified by their leading span (entity, defined
    /// term or first description); an empty description list yields `""`.
    /// Plain expressions fall back to `expression:<text>`.
    pub fn identify(&self, target: Target) -> String {
        match target {
            Target::Expression(id) => {
                let expr = &self.graph[id];
                if expr.is_reference() {
                    expr.text.to_lowercase()
                } else {
                    format!("expression:{}", expr.text.to_lowercase())
                }
            }
            Target::Statement(id) => {
                let leading = match &self.graph[id].kind {
                    StatementKind::Rule(rule) => Some(rule.entity),
                    StatementKind::Information(info) => info.description.first().copied(),
                    StatementKind::Definition(def) => Some(def.defined_term),
                    StatementKind::Exemption(exemption) => exemption.description.first().copied(),
                };
                leading
                    .map(|expr| self.graph[expr].text.to_lowercase())
                    .unwrap_or_default()
            }
        }
    }

    fn relationships(&self, relationships: &Relationships) -> Value {
        let mut map = Map::new();
        for (rel, targets) in relationships.iter() {
            let ids = targets
                .iter()
                .map(|target| Value::String(self.identify(*target)))
                .collect();
            map.insert(rel.as_str().to_string(), Value::Array(ids));
        }
        Value::Object(map)
    }

    fn expression_list(&self, ids: &[ExpressionId]) -> Value {
        Value::Array(ids.iter().map(|id| self.expression(*id)).collect())
    }

    fn section_number(&self, section: Option<SectionId>) -> Value {
        section.map_or(Value::Null, |id| {
            Value::String(self.graph[id].number.clone())
        })
    }
}

/// Canonical tree of a section (recursively).
pub fn canonicalize_section(graph: &AnnotationGraph, id: SectionId) -> Value {
    Canonicalizer::new(graph).section(id)
}

pub fn canonicalize_expression(graph: &AnnotationGraph, id: ExpressionId) -> Value {
    Canonicalizer::new(graph).expression(id)
}

pub fn canonicalize_reference(graph: &AnnotationGraph, id: ExpressionId) -> Value {
    Canonicalizer::new(graph).reference(id)
}

pub fn canonicalize_statement(graph: &AnnotationGraph, id: StatementId) -> Value {
    Canonicalizer::new(graph).statement(id)
}

/// Stable textual identifier of a target, see [`Canonicalizer::identify`].
pub fn identify(graph: &AnnotationGraph, target: Target) -> String {
    Canonicalizer::new(graph).identify(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::RuleType;

    #[test]
    fn expression_text_is_lowercased() {
        let mut graph = AnnotationGraph::new();
        let s = graph.new_section("1");
        let upper = graph.new_expression(s, "Hello World").unwrap();
        let lower = graph.new_expression(s, "hello world").unwrap();

        let a = canonicalize_expression(&graph, upper);
        let b = canonicalize_expression(&graph, lower);
        assert_eq!(a["text"], b["text"]);
        assert_eq!(a, b);
    }

    #[test]
    fn expression_tree_shape() {
        let mut graph = AnnotationGraph::new();
        let s = graph.new_section("2(b)");
        let outer = graph.new_expression(s, "The Licensee and its Affiliates").unwrap();
        let inner = graph.new_expression(s, "Affiliates").unwrap();
        graph.add_include(outer, inner).unwrap();

        let tree = canonicalize_expression(&graph, outer);
        assert_eq!(
            tree,
            json!({
                "text": "the licensee and its affiliates",
                "includes": [
                    { "text": "affiliates", "includes": [], "sectionNumber": "2(b)" }
                ],
                "sectionNumber": "2(b)",
            })
        );

        let floating = graph.new_expression(None, "x").unwrap();
        assert_eq!(canonicalize_expression(&graph, floating)["sectionNumber"], Value::Null);
    }

    #[test]
    fn reference_tree_carries_target_and_tag() {
        let mut graph = AnnotationGraph::new();
        let s = graph.new_section("3");
        let term = graph.new_expression(s, "Royalty").unwrap();
        let def = graph.new_definition(s, term).unwrap();
        let reference = graph.new_reference(s, "the Royalty", def).unwrap();

        let untagged = canonicalize_reference(&graph, reference);
        assert_eq!(untagged["target"], "royalty");
        assert_eq!(untagged["relationship"], Value::Null);

        let entity = graph.new_expression(s, "the licensee").unwrap();
        let rule = graph.new_rule(s, entity).unwrap();
        graph.add_refines(rule, reference).unwrap();

        assert_eq!(
            canonicalize_reference(&graph, reference),
            json!({
                "text": "the royalty",
                "target": "royalty",
                "sectionNumber": "3",
                "relationship": "refines",
            })
        );
    }

    #[test]
    fn identify_uses_leading_span() {
        let mut graph = AnnotationGraph::new();
        let entity = graph.new_expression(None, "The Licensee").unwrap();
        let rule = graph.new_rule(None, entity).unwrap();
        let desc = graph.new_expression(None, "Payments are Final").unwrap();
        let info = graph.new_information(None, desc).unwrap();
        let empty = graph.new_exemption(None).unwrap();
        let plain = graph.new_expression(None, "Schedule A").unwrap();

        assert_eq!(identify(&graph, rule.into()), "the licensee");
        assert_eq!(identify(&graph, info.into()), "payments are final");
        assert_eq!(identify(&graph, empty.into()), "");
        assert_eq!(identify(&graph, plain.into()), "expression:schedule a");
    }

    #[test]
    fn statement_tree_has_all_relationship_keys() {
        let mut graph = AnnotationGraph::new();
        let s = graph.new_section("4");
        let entity = graph.new_expression(s, "the licensee").unwrap();
        let rule = graph.new_rule(s, entity).unwrap();
        graph.set_rule_type(rule, RuleType::Obligation).unwrap();

        let tree = canonicalize_statement(&graph, rule);
        let rels = tree["relationships"].as_object().unwrap();
        assert_eq!(rels.len(), 6);
        assert!(rels.values().all(|list| list == &json!([])));
        assert_eq!(tree["type"], "Rule");
        assert_eq!(tree["rule_type"], 0);
        assert_eq!(tree["description"], Value::Null);
        assert_eq!(tree["section"], "4");
    }

    #[test]
    fn canonicalization_is_deterministic() {
        let mut graph = AnnotationGraph::new();
        let s = graph.new_section("1");
        let sub = graph.new_subsection(s, "1.1").unwrap();
        let term = graph.new_expression(sub, "Territory").unwrap();
        let def = graph.new_definition(sub, term).unwrap();
        let meaning = graph.new_expression(sub, "the United States").unwrap();
        graph.add_meaning(def, meaning).unwrap();
        let exemption = graph.new_exemption(s).unwrap();
        graph.add_is_exception_to(exemption, def).unwrap();

        let first = canonicalize_section(&graph, s);
        let second = canonicalize_section(&graph, s);
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(
            first["statements"][0]["relationships"]["is_exception_to"],
            json!(["territory"])
        );
        assert_eq!(first["subSections"][0]["statements"][0]["defined_term"]["text"], "territory");
    }
}
