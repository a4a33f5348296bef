//! Fuzzy structural comparison of canonical trees.
//!
//! Structure is compared strictly: key sets, list lengths and list order
//! must agree. Free text is compared with a bounded Levenshtein distance so
//! paraphrase-level noise passes while unrelated content does not.
//!
//! Every comparator comes in two forms: `check_*` returns the first
//! [`Mismatch`] found (with a path into the tree), and the `*_similar`
//! wrappers reduce that to a boolean.

use serde_json::Value;
use thiserror::Error;

/// Edit-distance tolerance used when a caller does not pick one.
pub const DEFAULT_THRESHOLD: usize = 10;

/// First difference found between two canonical trees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Mismatch {
    #[error("{path}: key sets differ (expected {expected:?}, found {found:?})")]
    KeySet {
        path: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("{path}: expected {expected} items, found {found}")]
    Length {
        path: String,
        expected: usize,
        found: usize,
    },

    #[error("{path}: \"{expected}\" and \"{found}\" are {distance} edits apart (threshold {threshold})")]
    Text {
        path: String,
        expected: String,
        found: String,
        distance: usize,
        threshold: usize,
    },

    #[error("{path}: expected {expected}, found {found}")]
    Value {
        path: String,
        expected: String,
        found: String,
    },

    #[error("{path}: {side} has no {field}")]
    MissingField {
        path: String,
        field: String,
        side: Side,
    },

    #[error("{path}: expected {expected}, found {found}")]
    Shape {
        path: String,
        expected: &'static str,
        found: String,
    },
}

/// Which of the two compared trees a [`Mismatch`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    GroundTruth,
    Candidate,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::GroundTruth => f.write_str("ground truth"),
            Side::Candidate => f.write_str("candidate"),
        }
    }
}

impl Mismatch {
    /// Location of the difference, e.g. `$.includes[1].text`.
    pub fn path(&self) -> &str {
        match self {
            Mismatch::KeySet { path, .. }
            | Mismatch::Length { path, .. }
            | Mismatch::Text { path, .. }
            | Mismatch::Value { path, .. }
            | Mismatch::MissingField { path, .. }
            | Mismatch::Shape { path, .. } => path,
        }
    }

    /// Structural mismatches are those not caused by text distance.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Mismatch::Text { .. })
    }
}

/// Levenshtein distance over Unicode scalar values.
///
/// Unit cost for insertion, deletion and substitution. Uses two rows sized
/// by the shorter string.
pub fn edit_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    if short.is_empty() {
        return long.len();
    }

    let mut prev: Vec<usize> = (0..=short.len()).collect();
    let mut curr = vec![0usize; short.len() + 1];

    for (i, lc) in long.iter().enumerate() {
        curr[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let cost = if lc == sc { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1)
                .min(curr[j] + 1)
                .min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[short.len()]
}

/// True iff the strings are at most `threshold` edits apart.
pub fn strings_similar(s1: &str, s2: &str, threshold: usize) -> bool {
    edit_distance(s1, s2) <= threshold
}

/// Positional, equal-length, pairwise [`strings_similar`].
///
/// No reordering is attempted: `["a", "b"]` and `["b", "a"]` differ.
pub fn lists_similar<A: AsRef<str>, B: AsRef<str>>(
    list1: &[A],
    list2: &[B],
    threshold: usize,
) -> bool {
    list1.len() == list2.len()
        && list1
            .iter()
            .zip(list2)
            .all(|(s1, s2)| strings_similar(s1.as_ref(), s2.as_ref(), threshold))
}

/// Compare two canonical lists of plain values (e.g. relationship
/// identifiers). Strings are compared fuzzily, anything else exactly.
pub fn check_value_lists(list1: &Value, list2: &Value, threshold: usize) -> Result<(), Mismatch> {
    let path = "$";
    let (items1, items2) = both_arrays(path, list1, list2)?;
    check_len(path, items1.len(), items2.len())?;
    for (idx, (v1, v2)) in items1.iter().zip(items2).enumerate() {
        check_scalar(&format!("{}[{}]", path, idx), v1, v2, threshold)?;
    }
    Ok(())
}

pub fn expr_trees_similar(tree1: &Value, tree2: &Value, threshold: usize) -> bool {
    check_expr_trees(tree1, tree2, threshold).is_ok()
}

/// Compare two canonical expression trees.
///
/// Key sets must be identical. `text` is compared fuzzily, `sectionNumber`
/// fuzzily after stringification, and `includes` pairwise in order.
pub fn check_expr_trees(tree1: &Value, tree2: &Value, threshold: usize) -> Result<(), Mismatch> {
    expr_tree_at("$", tree1, tree2, threshold)
}

pub fn reference_trees_similar(tree1: &Value, tree2: &Value, threshold: usize) -> bool {
    check_reference_trees(tree1, tree2, threshold).is_ok()
}

/// Compare two canonical reference trees on `text`, `target`,
/// `sectionNumber` and `relationship`.
pub fn check_reference_trees(
    tree1: &Value,
    tree2: &Value,
    threshold: usize,
) -> Result<(), Mismatch> {
    reference_tree_at("$", tree1, tree2, threshold)
}

pub fn expr_lists_similar(list1: &[Value], list2: &[Value], threshold: usize) -> bool {
    check_expr_lists(list1, list2, threshold).is_ok()
}

pub fn check_expr_lists(list1: &[Value], list2: &[Value], threshold: usize) -> Result<(), Mismatch> {
    check_len("$", list1.len(), list2.len())?;
    for (idx, (t1, t2)) in list1.iter().zip(list2).enumerate() {
        expr_tree_at(&format!("$[{}]", idx), t1, t2, threshold)?;
    }
    Ok(())
}

pub fn reference_lists_similar(list1: &[Value], list2: &[Value], threshold: usize) -> bool {
    check_reference_lists(list1, list2, threshold).is_ok()
}

pub fn check_reference_lists(
    list1: &[Value],
    list2: &[Value],
    threshold: usize,
) -> Result<(), Mismatch> {
    check_len("$", list1.len(), list2.len())?;
    for (idx, (t1, t2)) in list1.iter().zip(list2).enumerate() {
        reference_tree_at(&format!("$[{}]", idx), t1, t2, threshold)?;
    }
    Ok(())
}

fn expr_tree_at(path: &str, tree1: &Value, tree2: &Value, threshold: usize) -> Result<(), Mismatch> {
    let (map1, map2) = both_objects(path, tree1, tree2)?;
    check_key_sets(path, map1, map2)?;

    // Keys are identical past this point; fields absent from both are skipped.
    if let (Some(t1), Some(t2)) = (map1.get("text"), map2.get("text")) {
        check_scalar(&field(path, "text"), t1, t2, threshold)?;
    }

    if let (Some(n1), Some(n2)) = (map1.get("sectionNumber"), map2.get("sectionNumber")) {
        check_text(
            &field(path, "sectionNumber"),
            &stringify(n1),
            &stringify(n2),
            threshold,
        )?;
    }

    if let (Some(i1), Some(i2)) = (map1.get("includes"), map2.get("includes")) {
        let includes_path = field(path, "includes");
        match (i1, i2) {
            (Value::Array(items1), Value::Array(items2)) => {
                check_len(&includes_path, items1.len(), items2.len())?;
                for (idx, (item1, item2)) in items1.iter().zip(items2).enumerate() {
                    let item_path = format!("{}[{}]", includes_path, idx);
                    match (item1, item2) {
                        (Value::Object(_), Value::Object(_)) => {
                            expr_tree_at(&item_path, item1, item2, threshold)?
                        }
                        _ => check_scalar(&item_path, item1, item2, threshold)?,
                    }
                }
            }
            _ => check_exact(&includes_path, i1, i2)?,
        }
    }

    Ok(())
}

fn reference_tree_at(
    path: &str,
    tree1: &Value,
    tree2: &Value,
    threshold: usize,
) -> Result<(), Mismatch> {
    let (map1, map2) = both_objects(path, tree1, tree2)?;
    check_key_sets(path, map1, map2)?;

    for key in ["text", "target", "relationship"].iter() {
        if let (Some(v1), Some(v2)) = (map1.get(*key), map2.get(*key)) {
            check_scalar(&field(path, key), v1, v2, threshold)?;
        }
    }

    if let (Some(n1), Some(n2)) = (map1.get("sectionNumber"), map2.get("sectionNumber")) {
        check_text(
            &field(path, "sectionNumber"),
            &stringify(n1),
            &stringify(n2),
            threshold,
        )?;
    }

    Ok(())
}

/// Strings fuzzily, everything else by exact equality.
fn check_scalar(path: &str, v1: &Value, v2: &Value, threshold: usize) -> Result<(), Mismatch> {
    match (v1, v2) {
        (Value::String(s1), Value::String(s2)) => check_text(path, s1, s2, threshold),
        _ => check_exact(path, v1, v2),
    }
}

fn check_text(path: &str, s1: &str, s2: &str, threshold: usize) -> Result<(), Mismatch> {
    let distance = edit_distance(s1, s2);
    if distance <= threshold {
        Ok(())
    } else {
        Err(Mismatch::Text {
            path: path.to_string(),
            expected: s1.to_string(),
            found: s2.to_string(),
            distance,
            threshold,
        })
    }
}

fn check_exact(path: &str, v1: &Value, v2: &Value) -> Result<(), Mismatch> {
    if v1 == v2 {
        Ok(())
    } else {
        Err(Mismatch::Value {
            path: path.to_string(),
            expected: v1.to_string(),
            found: v2.to_string(),
        })
    }
}

fn check_len(path: &str, expected: usize, found: usize) -> Result<(), Mismatch> {
    if expected == found {
        Ok(())
    } else {
        Err(Mismatch::Length {
            path: path.to_string(),
            expected,
            found,
        })
    }
}

fn check_key_sets(
    path: &str,
    map1: &serde_json::Map<String, Value>,
    map2: &serde_json::Map<String, Value>,
) -> Result<(), Mismatch> {
    let mut keys1: Vec<String> = map1.keys().cloned().collect();
    let mut keys2: Vec<String> = map2.keys().cloned().collect();
    keys1.sort();
    keys2.sort();
    if keys1 == keys2 {
        Ok(())
    } else {
        Err(Mismatch::KeySet {
            path: path.to_string(),
            expected: keys1,
            found: keys2,
        })
    }
}

fn both_objects<'a>(
    path: &str,
    v1: &'a Value,
    v2: &'a Value,
) -> Result<(&'a serde_json::Map<String, Value>, &'a serde_json::Map<String, Value>), Mismatch> {
    let map1 = v1.as_object().ok_or_else(|| shape(path, "an object", v1))?;
    let map2 = v2.as_object().ok_or_else(|| shape(path, "an object", v2))?;
    Ok((map1, map2))
}

fn both_arrays<'a>(
    path: &str,
    v1: &'a Value,
    v2: &'a Value,
) -> Result<(&'a Vec<Value>, &'a Vec<Value>), Mismatch> {
    let items1 = v1.as_array().ok_or_else(|| shape(path, "a list", v1))?;
    let items2 = v2.as_array().ok_or_else(|| shape(path, "a list", v2))?;
    Ok((items1, items2))
}

fn shape(path: &str, expected: &'static str, found: &Value) -> Mismatch {
    Mismatch::Shape {
        path: path.to_string(),
        expected,
        found: found.to_string(),
    }
}

/// Section numbers may arrive as strings, numbers or null.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn field(path: &str, key: &str) -> String {
    format!("{}.{}", path, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expr(text: &str, section: &str) -> Value {
        json!({ "text": text, "includes": [], "sectionNumber": section })
    }

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", "abd"), 1);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("sitting", "kitten"), 3);
        assert_eq!(edit_distance("flaw", "lawn"), 2);
    }

    #[test]
    fn edit_distance_counts_characters_not_bytes() {
        assert_eq!(edit_distance("§ 2", "§ 3"), 1);
        assert_eq!(edit_distance("café", "cafe"), 1);
    }

    #[test]
    fn threshold_boundary() {
        assert!(strings_similar("kitten", "sitting", 3));
        assert!(!strings_similar("kitten", "sitting", 2));
        assert!(strings_similar("the licensee", "the license holder", DEFAULT_THRESHOLD));
    }

    #[test]
    fn lists_are_positional() {
        // Swapped single letters are one edit apart per pair, so they only
        // fail once the threshold drops below that.
        assert!(lists_similar(&["a", "b"], &["b", "a"], DEFAULT_THRESHOLD));
        assert!(!lists_similar(&["a", "b"], &["b", "a"], 0));
        assert!(!lists_similar(
            &["the licensee", "any governmental authority"],
            &["any governmental authority", "the licensee"],
            DEFAULT_THRESHOLD
        ));
        assert!(lists_similar(&["alpha", "beta"], &["alpha", "beta"], 0));
        assert!(!lists_similar(&["a"], &["a", "b"], DEFAULT_THRESHOLD));
        let empty: [&str; 0] = [];
        assert!(lists_similar(&empty, &empty, 0));
    }

    #[test]
    fn value_lists_compare_strings_fuzzily() {
        let gt = json!(["the licensee", "royalty"]);
        let cand = json!(["the licensees", "royalties"]);
        assert!(check_value_lists(&gt, &cand, 3).is_ok());

        let err = check_value_lists(&gt, &json!(["the licensee"]), 3).unwrap_err();
        assert_eq!(
            err,
            Mismatch::Length {
                path: "$".into(),
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn expr_trees_tolerate_paraphrase() {
        let gt = expr("the licensee", "1");
        let cand = expr("the license holder", "1");
        assert!(expr_trees_similar(&gt, &cand, DEFAULT_THRESHOLD));
        assert!(!expr_trees_similar(&gt, &cand, 5));
    }

    #[test]
    fn expr_trees_require_identical_keys() {
        let gt = expr("royalty", "1");
        let cand = json!({ "text": "royalty", "includes": [] });
        let err = check_expr_trees(&gt, &cand, DEFAULT_THRESHOLD).unwrap_err();
        assert!(matches!(err, Mismatch::KeySet { .. }));
        assert!(err.is_structural());
    }

    #[test]
    fn expr_trees_recurse_into_includes() {
        let gt = json!({
            "text": "the licensee and its affiliates",
            "includes": [expr("affiliates", "2")],
            "sectionNumber": "2",
        });
        let same = gt.clone();
        assert!(expr_trees_similar(&gt, &same, 0));

        let different = json!({
            "text": "the licensee and its affiliates",
            "includes": [expr("any subsidiary of the licensor", "2")],
            "sectionNumber": "2",
        });
        let err = check_expr_trees(&gt, &different, DEFAULT_THRESHOLD).unwrap_err();
        assert_eq!(err.path(), "$.includes[0].text");

        let shorter = json!({
            "text": "the licensee and its affiliates",
            "includes": [],
            "sectionNumber": "2",
        });
        let err = check_expr_trees(&gt, &shorter, DEFAULT_THRESHOLD).unwrap_err();
        assert_eq!(err.path(), "$.includes");
    }

    #[test]
    fn include_items_of_mixed_shape_compare_exactly() {
        let gt = json!({ "text": "x", "includes": ["a string"], "sectionNumber": "1" });
        let cand = json!({ "text": "x", "includes": [expr("a string", "1")], "sectionNumber": "1" });
        assert!(matches!(
            check_expr_trees(&gt, &cand, DEFAULT_THRESHOLD),
            Err(Mismatch::Value { .. })
        ));

        let plain = json!({ "text": "x", "includes": ["a strong"], "sectionNumber": "1" });
        assert!(expr_trees_similar(&gt, &plain, 1));
    }

    #[test]
    fn section_numbers_are_stringified() {
        let numeric = json!({ "text": "x", "includes": [], "sectionNumber": 12 });
        let textual = expr("x", "12");
        assert!(expr_trees_similar(&numeric, &textual, 0));

        let absent = json!({ "text": "x", "includes": [], "sectionNumber": null });
        assert!(!expr_trees_similar(&absent, &textual, 1));
        assert!(expr_trees_similar(&absent, &absent, 0));
    }

    #[test]
    fn non_object_trees_are_shape_mismatches() {
        let err = check_expr_trees(&Value::Null, &expr("x", "1"), DEFAULT_THRESHOLD).unwrap_err();
        assert!(matches!(err, Mismatch::Shape { .. }));
    }

    #[test]
    fn reference_trees() {
        let gt = json!({
            "text": "section 4",
            "target": "the licensee",
            "sectionNumber": "2",
            "relationship": "refines",
        });
        let cand = json!({
            "text": "section 4.",
            "target": "the licensee",
            "sectionNumber": "2",
            "relationship": "refines",
        });
        assert!(reference_trees_similar(&gt, &cand, 1));

        let untagged = json!({
            "text": "section 4",
            "target": "the licensee",
            "sectionNumber": "2",
            "relationship": null,
        });
        let err = check_reference_trees(&gt, &untagged, DEFAULT_THRESHOLD).unwrap_err();
        assert_eq!(err.path(), "$.relationship");
    }

    #[test]
    fn expression_lists() {
        let gt = vec![expr("first condition", "1"), expr("second condition", "1")];
        let swapped = vec![expr("second condition", "1"), expr("first condition", "1")];
        assert!(expr_lists_similar(&gt, &gt, 0));
        assert!(!expr_lists_similar(&gt, &swapped, 0));
        assert!(expr_lists_similar(&[], &[], 0));
        assert!(!reference_lists_similar(&gt[..1], &[], DEFAULT_THRESHOLD));
    }

    #[test]
    fn mismatch_messages() {
        let err = check_expr_trees(&expr("royalty", "1"), &expr("indemnification", "1"), 3)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "$.text: \"royalty\" and \"indemnification\" are 14 edits apart (threshold 3)"
        );
    }
}
