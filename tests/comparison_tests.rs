//! End-to-end comparison-engine tests against the worked examples in
//! spec §8.

use rowsource_engine::comparison::{compare, BlankNodeStrategy, ComparisonConfig};
use rowsource_engine::literal::Literal;
use rowsource_engine::results::{BindingsResult, GraphResult, QueryResult};
use rowsource_engine::row::Row;
use rowsource_engine::triple::Triple;

fn row(values: &[i64]) -> Row {
    let mut r = Row::new(values.len(), 1, 0);
    for (i, v) in values.iter().enumerate() {
        r.set(i, Some(Literal::integer(*v)));
    }
    r
}

#[test]
fn identical_bindings_are_equal_under_default_options() {
    let vars = vec!["x".to_string(), "y".to_string()];
    let expected = QueryResult::Bindings(BindingsResult::new(vars.clone(), vec![row(&[1, 2]), row(&[3, 4])]));
    let actual = QueryResult::Bindings(BindingsResult::new(vars, vec![row(&[1, 2]), row(&[3, 4])]));
    assert!(compare(&expected, &actual, &ComparisonConfig::default()).equal);
}

#[test]
fn two_differing_cells_with_max_differences_one_report_exactly_one() {
    let vars = vec!["x".to_string()];
    let expected = QueryResult::Bindings(BindingsResult::new(vars.clone(), vec![row(&[1]), row(&[2])]));
    let actual = QueryResult::Bindings(BindingsResult::new(vars, vec![row(&[10]), row(&[20])]));
    let config = ComparisonConfig { max_differences_to_report: 1, ..ComparisonConfig::default() };
    let outcome = compare(&expected, &actual, &config);
    assert!(!outcome.equal);
    assert_eq!(outcome.differences.len(), 1);
}

#[test]
fn match_by_id_strategy_requires_identical_blank_identifiers() {
    let vars = vec!["x".to_string()];
    let mut expected_row = Row::new(1, 1, 0);
    expected_row.set(0, Some(Literal::blank("b0")));
    let mut actual_row = Row::new(1, 1, 0);
    actual_row.set(0, Some(Literal::blank("b0")));
    let expected = QueryResult::Bindings(BindingsResult::new(vars.clone(), vec![expected_row]));
    let actual = QueryResult::Bindings(BindingsResult::new(vars.clone(), vec![actual_row.clone()]));
    let config = ComparisonConfig { blank_node_strategy: BlankNodeStrategy::MatchById, ..ComparisonConfig::default() };
    assert!(compare(&expected, &actual, &config).equal);

    let mut mismatched_row = Row::new(1, 1, 0);
    mismatched_row.set(0, Some(Literal::blank("other")));
    let mismatched = QueryResult::Bindings(BindingsResult::new(vars, vec![mismatched_row]));
    assert!(!compare(&expected, &mismatched, &config).equal);
}

#[test]
fn identical_graphs_with_renamed_blank_nodes_are_equal() {
    let expected = QueryResult::Graph(GraphResult::new(vec![
        Triple::new(Literal::blank("b0"), Literal::uri("http://knows"), Literal::uri("http://alice")),
    ]));
    let actual = QueryResult::Graph(GraphResult::new(vec![
        Triple::new(Literal::blank("x9"), Literal::uri("http://knows"), Literal::uri("http://alice")),
    ]));
    assert!(compare(&expected, &actual, &ComparisonConfig::default()).equal);
}

#[test]
fn a_missing_triple_makes_graphs_unequal() {
    let expected = QueryResult::Graph(GraphResult::new(vec![
        Triple::new(Literal::uri("http://a"), Literal::uri("http://p"), Literal::uri("http://b")),
        Triple::new(Literal::uri("http://c"), Literal::uri("http://p"), Literal::uri("http://d")),
    ]));
    let actual = QueryResult::Graph(GraphResult::new(vec![
        Triple::new(Literal::uri("http://a"), Literal::uri("http://p"), Literal::uri("http://b")),
    ]));
    let outcome = compare(&expected, &actual, &ComparisonConfig::default());
    assert!(!outcome.equal);
    assert!(!outcome.differences.is_empty());
}
