//! The results comparison engine (spec §4.9): equality between two
//! query results under a configurable policy — ordering sensitivity, a
//! blank-node matching strategy, literal comparison flags, and a cap on
//! how many differences get reported.

pub mod graph_iso;

use crate::config::ComparisonConfig as ConfigComparisonConfig;
use crate::error::{Difference, GraphIsoTimeout};
use crate::execution::QueryTimeout;
use crate::literal::{CompareFlags, Literal};
use crate::results::QueryResult;
use crate::row::Row;
use crate::triple::Triple;
use std::cmp::Ordering;
use std::time::Duration;

use graph_iso::structural_signature;

/// How two blank nodes are judged equal (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlankNodeStrategy {
    MatchAny,
    MatchById,
    MatchStructural,
}

impl BlankNodeStrategy {
    pub fn parse(s: &str) -> Self {
        match s {
            "match-by-id" | "id" => BlankNodeStrategy::MatchById,
            "match-structural" | "structure" | "structural" => BlankNodeStrategy::MatchStructural,
            _ => BlankNodeStrategy::MatchAny,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphComparisonOptions {
    pub signature_threshold: usize,
    pub max_search_time: Duration,
}

#[derive(Debug, Clone)]
pub struct ComparisonConfig {
    pub order_sensitive: bool,
    pub blank_node_strategy: BlankNodeStrategy,
    pub literal_comparison_flags: CompareFlags,
    pub max_differences_to_report: usize,
    pub graph_comparison_options: GraphComparisonOptions,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        ComparisonConfig {
            order_sensitive: false,
            blank_node_strategy: BlankNodeStrategy::MatchAny,
            literal_comparison_flags: CompareFlags::default(),
            max_differences_to_report: 100,
            graph_comparison_options: GraphComparisonOptions {
                signature_threshold: 1000,
                max_search_time: Duration::from_secs(30),
            },
        }
    }
}

impl From<&ConfigComparisonConfig> for ComparisonConfig {
    fn from(config: &ConfigComparisonConfig) -> Self {
        ComparisonConfig {
            order_sensitive: config.order_sensitive,
            blank_node_strategy: BlankNodeStrategy::parse(&config.blank_node_strategy),
            literal_comparison_flags: CompareFlags::default(),
            max_differences_to_report: config.max_differences,
            graph_comparison_options: GraphComparisonOptions {
                signature_threshold: config.signature_threshold,
                max_search_time: config.timeout(),
            },
        }
    }
}

/// Outcome of a comparison: overall verdict plus the differences found,
/// capped at `max_differences_to_report` (spec §4.9 step 6) — the list
/// may be shorter than the true number of differences even when `equal`
/// is false.
#[derive(Debug, Clone)]
pub struct ComparisonOutcome {
    pub equal: bool,
    pub differences: Vec<Difference>,
}

impl ComparisonOutcome {
    fn equal_outcome() -> Self {
        ComparisonOutcome { equal: true, differences: Vec::new() }
    }
}

struct DifferenceSink {
    max: usize,
    equal: bool,
    differences: Vec<Difference>,
}

impl DifferenceSink {
    fn new(max: usize) -> Self {
        DifferenceSink { max, equal: true, differences: Vec::new() }
    }

    fn push(&mut self, difference: Difference) {
        self.equal = false;
        if self.differences.len() < self.max {
            self.differences.push(difference);
        }
    }

    fn into_outcome(self) -> ComparisonOutcome {
        ComparisonOutcome { equal: self.equal, differences: self.differences }
    }
}

/// Compare two query results under `config` (spec §4.9). Dispatches on
/// result kind; a kind mismatch (e.g. boolean vs bindings) is itself a
/// single recorded difference.
pub fn compare(expected: &QueryResult, actual: &QueryResult, config: &ComparisonConfig) -> ComparisonOutcome {
    match (expected, actual) {
        (QueryResult::Boolean(e), QueryResult::Boolean(a)) => compare_boolean(*e, *a),
        (QueryResult::Bindings(e), QueryResult::Bindings(a)) => {
            compare_bindings(&e.variables, &e.rows, &a.variables, &a.rows, config, None, None)
        }
        (QueryResult::Graph(e), QueryResult::Graph(a)) => compare_graph(&e.triples, &a.triples, config),
        _ => {
            let mut sink = DifferenceSink::new(config.max_differences_to_report);
            sink.push(Difference::Cell {
                description: "result kind mismatch".to_string(),
                expected: result_kind_name(expected).to_string(),
                actual: result_kind_name(actual).to_string(),
            });
            sink.into_outcome()
        }
    }
}

/// Compare two bindings results, optionally with the triples each side
/// was drawn from supplying structural-signature context for blank-node
/// cells (spec §4.9 step 5). Without supplied triples, `match-structural`
/// falls back to comparing blank-node identifiers directly: a bare
/// SELECT result carries no triples to derive a signature from.
#[allow(clippy::too_many_arguments)]
pub fn compare_bindings(
    expected_vars: &[String],
    expected_rows: &[Row],
    actual_vars: &[String],
    actual_rows: &[Row],
    config: &ComparisonConfig,
    expected_triples: Option<&[Triple]>,
    actual_triples: Option<&[Triple]>,
) -> ComparisonOutcome {
    let mut sink = DifferenceSink::new(config.max_differences_to_report);

    if expected_vars != actual_vars {
        sink.push(Difference::Cell {
            description: "variable table mismatch".to_string(),
            expected: expected_vars.join(", "),
            actual: actual_vars.join(", "),
        });
        return sink.into_outcome();
    }

    let mut expected_rows: Vec<&Row> = expected_rows.iter().collect();
    let mut actual_rows: Vec<&Row> = actual_rows.iter().collect();
    if !config.order_sensitive {
        let flags = config.literal_comparison_flags;
        expected_rows.sort_by(|a, b| row_order(a, b, flags));
        actual_rows.sort_by(|a, b| row_order(a, b, flags));
    }

    if expected_rows.len() != actual_rows.len() {
        sink.push(Difference::Cell {
            description: "row count mismatch".to_string(),
            expected: expected_rows.len().to_string(),
            actual: actual_rows.len().to_string(),
        });
        return sink.into_outcome();
    }

    'rows: for (index, (e, a)) in expected_rows.iter().zip(actual_rows.iter()).enumerate() {
        for (offset, name) in expected_vars.iter().enumerate() {
            let (ev, av) = (e.get(offset), a.get(offset));
            let cells_equal = match (ev, av) {
                (None, None) => true,
                (None, Some(_)) | (Some(_), None) => false,
                (Some(ev), Some(av)) => match (ev, av) {
                    (Literal::Blank(eid), Literal::Blank(aid)) => match config.blank_node_strategy {
                        BlankNodeStrategy::MatchAny => true,
                        BlankNodeStrategy::MatchById => eid == aid,
                        BlankNodeStrategy::MatchStructural => match (expected_triples, actual_triples) {
                            (Some(et), Some(at)) => structural_signature(eid, et) == structural_signature(aid, at),
                            _ => eid == aid,
                        },
                    },
                    _ => ev.value_equals(av, config.literal_comparison_flags),
                },
            };
            if !cells_equal {
                sink.push(Difference::Cell {
                    description: format!("row {index}, variable {name}"),
                    expected: ev.map(Literal::as_string).unwrap_or_else(|| "unbound".to_string()),
                    actual: av.map(Literal::as_string).unwrap_or_else(|| "unbound".to_string()),
                });
                if sink.differences.len() >= sink.max {
                    break 'rows;
                }
            }
        }
    }

    sink.into_outcome()
}

fn compare_boolean(expected: bool, actual: bool) -> ComparisonOutcome {
    if expected == actual {
        ComparisonOutcome::equal_outcome()
    } else {
        ComparisonOutcome {
            equal: false,
            differences: vec![Difference::Cell {
                description: "boolean result".to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            }],
        }
    }
}

fn compare_graph(expected: &[Triple], actual: &[Triple], config: &ComparisonConfig) -> ComparisonOutcome {
    let timeout = QueryTimeout::new(Some(config.graph_comparison_options.max_search_time));
    match graph_iso::compare_graphs(expected, actual, config.graph_comparison_options.signature_threshold, &timeout) {
        Ok(outcome) => outcome,
        Err(GraphIsoTimeout) => ComparisonOutcome {
            equal: false,
            differences: vec![Difference::Triple {
                description: "graph isomorphism search timed out".to_string(),
                expected: String::new(),
                actual: String::new(),
            }],
        },
    }
}

/// Lexicographic row comparison (spec §4.9 step 3): compare cells left
/// to right under `flags`, unbound sorts before bound, an incomparable
/// pair of cells is treated as equal at that position and ordering
/// falls through to the next cell or, failing all of them, to the
/// row's own offset as a stability tiebreaker.
fn row_order(a: &Row, b: &Row, flags: CompareFlags) -> Ordering {
    let width = a.size().max(b.size());
    for offset in 0..width {
        let (av, bv) = (a.get(offset), b.get(offset));
        let ordering = match (av, bv) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => x.compare(y, flags).unwrap_or(Ordering::Equal),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.offset().cmp(&b.offset())
}

fn result_kind_name(result: &QueryResult) -> &'static str {
    match result {
        QueryResult::Boolean(_) => "boolean",
        QueryResult::Bindings(_) => "bindings",
        QueryResult::Graph(_) => "graph",
    }
}
