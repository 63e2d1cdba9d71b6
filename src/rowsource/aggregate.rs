//! `Aggregation` (spec §4.8): consumes a grouped input (rows tagged with
//! `group_id`, e.g. from `GroupBy`) and emits one row per group. Each
//! aggregate expression holds its own accumulator state and an optional
//! DISTINCT filter over argument tuples.

use super::{next_rowsource_id, RowSource, RowSourceOp};
use crate::error::RowSourceError;
use crate::expr::Expr;
use crate::literal::{CompareFlags, Literal};
use crate::row::{Row, RowSourceId, UNGROUPED};
use crate::variable::VariablesTable;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Sample,
    GroupConcat,
}

/// One aggregate expression's declaration: which function, over which
/// argument expressions, with or without DISTINCT, and the separator
/// GROUP_CONCAT uses.
pub struct AggregateSpec {
    pub function: AggregateFunction,
    pub arguments: Vec<Expr>,
    pub distinct: bool,
    pub separator: String,
    pub output_name: String,
}

impl AggregateSpec {
    pub fn new(function: AggregateFunction, arguments: Vec<Expr>, output_name: impl Into<String>) -> Self {
        AggregateSpec {
            function,
            arguments,
            distinct: false,
            separator: " ".to_string(),
            output_name: output_name.into(),
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

/// Per-expression running state for the group currently open.
struct AccumulatorState {
    count: i64,
    sum: Option<Literal>,
    extremum: Option<Literal>,
    sample: Option<Literal>,
    concat: String,
    concat_started: bool,
    distinct_seen: HashSet<String>,
    errored: bool,
}

impl AccumulatorState {
    fn new() -> Self {
        AccumulatorState {
            count: 0,
            sum: None,
            extremum: None,
            sample: None,
            concat: String::new(),
            concat_started: false,
            distinct_seen: HashSet::new(),
            errored: false,
        }
    }

    fn step(&mut self, spec: &AggregateSpec, row: &Row, flags: CompareFlags) {
        if spec.function == AggregateFunction::Count && spec.arguments.is_empty() {
            self.count += 1;
            return;
        }
        let values: Vec<Literal> = spec.arguments.iter().filter_map(|e| e.eval(row, flags).ok()).collect();
        if values.len() != spec.arguments.len() {
            // one or more arguments errored: skip this row for this aggregate
            // (SPARQL "list-eval-E" semantics, spec §4.8).
            return;
        }
        if values.is_empty() {
            return;
        }
        if spec.distinct {
            let key = values.iter().map(Literal::as_string).collect::<Vec<_>>().join("\u{1}");
            if !self.distinct_seen.insert(key) {
                return;
            }
        }
        self.count += 1;
        let primary = values[0].clone();
        match spec.function {
            AggregateFunction::Count => {}
            AggregateFunction::Sum | AggregateFunction::Avg => {
                self.sum = Some(match &self.sum {
                    None => primary,
                    Some(acc) => match acc.add(&primary) {
                        Ok(v) => v,
                        Err(_) => {
                            self.errored = true;
                            return;
                        }
                    },
                });
            }
            AggregateFunction::Min => {
                self.extremum = Some(match &self.extremum {
                    None => primary,
                    Some(cur) => match primary.compare(cur, flags) {
                        Ok(std::cmp::Ordering::Less) => primary,
                        Ok(_) => cur.clone(),
                        Err(_) => {
                            self.errored = true;
                            return;
                        }
                    },
                });
            }
            AggregateFunction::Max => {
                self.extremum = Some(match &self.extremum {
                    None => primary,
                    Some(cur) => match primary.compare(cur, flags) {
                        Ok(std::cmp::Ordering::Greater) => primary,
                        Ok(_) => cur.clone(),
                        Err(_) => {
                            self.errored = true;
                            return;
                        }
                    },
                });
            }
            AggregateFunction::Sample => {
                if self.sample.is_none() {
                    self.sample = Some(primary);
                }
            }
            AggregateFunction::GroupConcat => {
                if self.concat_started {
                    self.concat.push_str(&spec.separator);
                }
                self.concat.push_str(&primary.as_string());
                self.concat_started = true;
            }
        }
    }

    fn finalize(&self, spec: &AggregateSpec) -> Option<Literal> {
        if self.errored {
            return None;
        }
        match spec.function {
            AggregateFunction::Count => Some(Literal::integer(self.count)),
            AggregateFunction::Sum => self.sum.clone().or(Some(Literal::integer(0))),
            AggregateFunction::Avg => match &self.sum {
                Some(total) if self.count > 0 => total.divide(&Literal::integer(self.count)).ok(),
                _ => Some(Literal::integer(0)),
            },
            AggregateFunction::Min | AggregateFunction::Max => self.extremum.clone(),
            AggregateFunction::Sample => self.sample.clone(),
            AggregateFunction::GroupConcat => Some(Literal::plain_string(self.concat.clone())),
        }
    }
}

pub struct Aggregate {
    id: RowSourceId,
    inner: Box<RowSource>,
    specs: Vec<AggregateSpec>,
    /// Non-aggregate columns copied through from the first row of each
    /// group (the "sample" of scalar columns, spec §4.8 step 2c).
    passthrough_columns: Vec<usize>,
    compare_flags: CompareFlags,
    variables: VariablesTable,
    last_group_id: i64,
    accumulators: Vec<AccumulatorState>,
    passthrough_values: Vec<Option<Literal>>,
    pending: Option<Row>,
    finished_input: bool,
    saw_any_row: bool,
    is_grouping_empty: bool,
    emitted_empty_group_row: bool,
    next_offset: u64,
    preserve: bool,
}

impl Aggregate {
    /// `is_grouping_empty` mirrors the upstream `GroupBy`'s key
    /// expression list being empty (a caller-supplied fact rather than
    /// something `Aggregate` introspects from `inner`, so it stays
    /// agnostic to whether `inner` is literally a `GroupBy`). It gates
    /// the zero-input special case (spec §8 invariant 3): a single
    /// output row even though no input rows were read, but only when
    /// the whole input is ungrouped into one implicit group.
    pub fn new(inner: RowSource, specs: Vec<AggregateSpec>, passthrough_columns: Vec<usize>, is_grouping_empty: bool) -> Self {
        let accumulators = specs.iter().map(|_| AccumulatorState::new()).collect();
        Aggregate {
            id: next_rowsource_id(),
            inner: Box::new(inner),
            specs,
            passthrough_columns,
            compare_flags: CompareFlags::default(),
            variables: VariablesTable::new(),
            last_group_id: UNGROUPED,
            accumulators,
            passthrough_values: Vec::new(),
            pending: None,
            finished_input: false,
            saw_any_row: false,
            is_grouping_empty,
            emitted_empty_group_row: false,
            next_offset: 0,
            preserve: false,
        }
    }

    fn reset_accumulators(&mut self) {
        self.accumulators = self.specs.iter().map(|_| AccumulatorState::new()).collect();
        self.passthrough_values.clear();
    }

    fn finalize_row(&self) -> Row {
        let mut values: Vec<Option<Literal>> = self.passthrough_values.clone();
        for (spec, acc) in self.specs.iter().zip(self.accumulators.iter()) {
            values.push(acc.finalize(spec));
        }
        Row::from_values(values, self.id, 0)
    }
}

impl RowSourceOp for Aggregate {
    fn init(&mut self) -> Result<(), RowSourceError> {
        self.inner.init()
    }

    fn ensure_variables(&mut self) -> Result<(), RowSourceError> {
        self.inner.ensure_variables()?;
        if self.variables.size() > 0 {
            return Ok(());
        }
        let inner_vars = self.inner.variables();
        let mut variables = VariablesTable::new();
        for &offset in &self.passthrough_columns {
            let name = inner_vars.get_by_offset(offset).map(|v| v.name.clone()).unwrap_or_default();
            variables.insert_named(name);
        }
        for spec in &self.specs {
            variables.insert_named(spec.output_name.clone());
        }
        self.variables = variables;
        Ok(())
    }

    fn read_row(&mut self) -> Result<Option<Row>, RowSourceError> {
        if let Some(row) = self.pending.take() {
            return Ok(Some(row));
        }
        if self.finished_input {
            return Ok(None);
        }
        loop {
            let Some(row) = self.inner.read_row()? else {
                self.finished_input = true;
                if self.last_group_id == UNGROUPED {
                    if !self.saw_any_row && self.is_grouping_empty && !self.emitted_empty_group_row {
                        self.emitted_empty_group_row = true;
                        let mut out = self.finalize_row();
                        out.set_offset(self.next_offset);
                        self.next_offset += 1;
                        return Ok(Some(out));
                    }
                    return Ok(None);
                }
                let mut out = self.finalize_row();
                out.set_offset(self.next_offset);
                self.next_offset += 1;
                self.last_group_id = UNGROUPED;
                return Ok(Some(out));
            };
            self.saw_any_row = true;
            if row.group_id() != self.last_group_id && self.last_group_id != UNGROUPED {
                let mut out = self.finalize_row();
                out.set_offset(self.next_offset);
                self.next_offset += 1;
                self.reset_accumulators();
                if self.passthrough_values.is_empty() {
                    self.passthrough_values = self.passthrough_columns.iter().map(|&o| row.get(o).cloned()).collect();
                }
                for (spec, acc) in self.specs.iter().zip(self.accumulators.iter_mut()) {
                    acc.step(spec, &row, self.compare_flags);
                }
                self.last_group_id = row.group_id();
                self.pending = Some(out);
                return self.read_row();
            }
            if self.passthrough_values.is_empty() {
                self.passthrough_values = self.passthrough_columns.iter().map(|&o| row.get(o).cloned()).collect();
            }
            for (spec, acc) in self.specs.iter().zip(self.accumulators.iter_mut()) {
                acc.step(spec, &row, self.compare_flags);
            }
            self.last_group_id = row.group_id();
        }
    }

    fn reset(&mut self) -> Result<(), RowSourceError> {
        if !self.preserve {
            return Err(RowSourceError::ResetNotSupported);
        }
        self.inner.reset()?;
        self.last_group_id = UNGROUPED;
        self.reset_accumulators();
        self.pending = None;
        self.finished_input = false;
        self.saw_any_row = false;
        self.emitted_empty_group_row = false;
        self.next_offset = 0;
        Ok(())
    }

    fn set_requirements(&mut self, preserve: bool) {
        self.preserve = preserve;
        self.inner.set_requirements(preserve);
    }

    fn get_inner_rowsource(&self, i: usize) -> Option<&RowSource> {
        if i == 0 {
            Some(&self.inner)
        } else {
            None
        }
    }

    fn set_origin(&mut self, _term: Option<Literal>) {}

    fn size(&self) -> usize {
        self.variables.size()
    }

    fn variables(&self) -> &VariablesTable {
        &self.variables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rowsource::groupby::GroupBy;
    use crate::rowsource::sequence::Sequence;

    fn xyz_rows() -> RowSource {
        let mut vars = VariablesTable::new();
        vars.insert_named("x");
        vars.insert_named("z");
        let data = [(1, 3), (1, 4), (2, 6)];
        let rows = data
            .iter()
            .map(|(x, z)| {
                let mut row = Row::new(2, 1, 0);
                row.set(0, Some(Literal::integer(*x)));
                row.set(1, Some(Literal::integer(*z)));
                row
            })
            .collect();
        RowSource::Sequence(Sequence::new(rows, vars))
    }

    #[test]
    fn avg_grouped_by_x_produces_decimal_results() {
        let grouped = RowSource::GroupBy(Box::new(GroupBy::new(xyz_rows(), vec![Expr::Column(0)])));
        let specs = vec![AggregateSpec::new(AggregateFunction::Avg, vec![Expr::Column(1)], "avg_z")];
        let mut op = Aggregate::new(grouped, specs, vec![0], false);
        op.ensure_variables().unwrap();
        op.init().unwrap();
        let rows = op.read_all_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(1).unwrap().as_string(), "3.5");
        assert_eq!(rows[1].get(1).unwrap().as_string(), "6.0");
    }

    #[test]
    fn group_concat_joins_with_default_separator() {
        let grouped = RowSource::GroupBy(Box::new(GroupBy::new(xyz_rows(), vec![Expr::Column(0)])));
        let specs = vec![AggregateSpec::new(AggregateFunction::GroupConcat, vec![Expr::Column(1)], "concat_z")];
        let mut op = Aggregate::new(grouped, specs, vec![0], false);
        op.ensure_variables().unwrap();
        op.init().unwrap();
        let rows = op.read_all_rows().unwrap();
        assert_eq!(rows[0].get(1).unwrap().as_string(), "3 4");
        assert_eq!(rows[1].get(1).unwrap().as_string(), "6");
    }

    #[test]
    fn count_star_counts_every_row_regardless_of_errors() {
        let grouped = RowSource::GroupBy(Box::new(GroupBy::new(xyz_rows(), vec![Expr::Column(0)])));
        let specs = vec![AggregateSpec::new(AggregateFunction::Count, vec![], "n")];
        let mut op = Aggregate::new(grouped, specs, vec![0], false);
        op.ensure_variables().unwrap();
        op.init().unwrap();
        let rows = op.read_all_rows().unwrap();
        assert_eq!(rows[0].get(1).unwrap().as_string(), "2");
        assert_eq!(rows[1].get(1).unwrap().as_string(), "1");
    }
}
