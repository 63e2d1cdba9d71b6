//! End-to-end operator tree tests: a join feeding a group-by feeding an
//! aggregation, and a few pipelines combining the remaining operators,
//! exercised the way the executor would drive a real plan.

use rowsource_engine::expr::{CompareOp, Expr};
use rowsource_engine::literal::Literal;
use rowsource_engine::row::Row;
use rowsource_engine::rowsource::aggregate::{Aggregate, AggregateFunction, AggregateSpec};
use rowsource_engine::rowsource::filter::Filter;
use rowsource_engine::rowsource::groupby::GroupBy;
use rowsource_engine::rowsource::join::{Join, JoinKind};
use rowsource_engine::rowsource::sequence::Sequence;
use rowsource_engine::rowsource::slice::Slice;
use rowsource_engine::rowsource::{RowSource, RowSourceOp};
use rowsource_engine::variable::VariablesTable;

fn sequence(names: &[&str], data: &[&[i64]]) -> RowSource {
    let mut variables = VariablesTable::new();
    for name in names {
        variables.insert_named(*name);
    }
    let rows = data
        .iter()
        .map(|values| {
            let mut row = Row::new(values.len(), 1, 0);
            for (i, v) in values.iter().enumerate() {
                row.set(i, Some(Literal::integer(*v)));
            }
            row
        })
        .collect();
    RowSource::Sequence(Sequence::new(rows, variables))
}

#[test]
fn join_then_group_by_then_aggregate_sums_matched_rows() {
    // left(x): 1, 2, 3 -- right(x, y): (1, 10), (1, 20), (2, 30)
    let left = sequence(&["x"], &[&[1], &[2], &[3]]);
    let right = sequence(&["x", "y"], &[&[1, 10], &[1, 20], &[2, 30]]);
    let joined = RowSource::Join(Box::new(Join::new(left, right, JoinKind::Natural, None)));
    let grouped = RowSource::GroupBy(Box::new(GroupBy::new(joined, vec![Expr::Column(0)])));

    let specs = vec![AggregateSpec::new(AggregateFunction::Sum, vec![Expr::Column(1)], "total")];
    let mut aggregate = Aggregate::new(grouped, specs, vec![0], false);
    aggregate.ensure_variables().unwrap();
    aggregate.init().unwrap();
    let rows = aggregate.read_all_rows().unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get(0).unwrap().as_string(), "1");
    assert_eq!(rows[0].get(1).unwrap().as_string(), "30");
    assert_eq!(rows[1].get(0).unwrap().as_string(), "2");
    assert_eq!(rows[1].get(1).unwrap().as_string(), "30");
}

#[test]
fn left_outer_join_preserves_unmatched_left_rows() {
    let left = sequence(&["x"], &[&[1], &[2]]);
    let right = sequence(&["x", "y"], &[&[1, 10]]);
    let mut join = Join::new(left, right, JoinKind::LeftOuter, None);
    join.ensure_variables().unwrap();
    join.init().unwrap();
    let rows = join.read_all_rows().unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].get(0).unwrap().as_string(), "2");
    assert!(rows[1].is_unbound(1));
}

#[test]
fn filter_then_slice_applies_offset_one_numbering() {
    // spec §8: Slice(limit=2, offset=1) over a 5-row input yields output offsets 1 and 2.
    let source = sequence(&["x"], &[&[1], &[2], &[3], &[4], &[5]]);
    let filter = RowSource::Filter(Box::new(Filter::new(
        source,
        Expr::Compare { op: CompareOp::Ge, left: Box::new(Expr::Column(0)), right: Box::new(Expr::Literal(Literal::integer(1))) },
    )));
    let mut slice = Slice::new(filter, 2, 1);
    slice.ensure_variables().unwrap();
    slice.init().unwrap();
    let rows = slice.read_all_rows().unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].offset(), 1);
    assert_eq!(rows[1].offset(), 2);
    assert_eq!(rows[0].get(0).unwrap().as_string(), "2");
    assert_eq!(rows[1].get(0).unwrap().as_string(), "3");
}

#[test]
fn empty_grouping_with_no_input_rows_still_yields_one_aggregate_row() {
    // spec §8 invariant 3: zero input rows with an empty grouping list
    // still produce a single output row, feeding aggregates their zero
    // results (COUNT(*) = 0, SUM = 0).
    let empty = sequence(&["x"], &[]);
    let grouped = RowSource::GroupBy(Box::new(GroupBy::new(empty, vec![])));
    let specs = vec![
        AggregateSpec::new(AggregateFunction::Count, vec![], "n"),
        AggregateSpec::new(AggregateFunction::Sum, vec![Expr::Column(0)], "total"),
    ];
    let mut aggregate = Aggregate::new(grouped, specs, vec![], true);
    aggregate.ensure_variables().unwrap();
    aggregate.init().unwrap();
    let rows = aggregate.read_all_rows().unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get(0).unwrap().as_string(), "0");
    assert_eq!(rows[0].get(1).unwrap().as_string(), "0");
}
