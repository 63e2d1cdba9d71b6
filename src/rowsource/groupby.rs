//! `GroupBy` (spec §4.7): drains the input fully on first read, batches
//! rows by a tuple of key expressions into a balanced search tree (here
//! a `BTreeMap` — any ordered map with a total order and deterministic
//! iteration works, per spec §9), and re-emits them in tree order with
//! input order preserved inside each group.

use super::{next_rowsource_id, RowSource, RowSourceOp};
use crate::error::RowSourceError;
use crate::execution::{check_batch, ResourceLimits};
use crate::expr::{eval_tuple, Expr};
use crate::literal::{CompareFlags, Literal};
use crate::row::{Row, RowSourceId};
use crate::variable::VariablesTable;
use std::collections::BTreeMap;

struct GroupEntry {
    id: i64,
    rows: Vec<Row>,
}

pub struct GroupBy {
    id: RowSourceId,
    inner: Box<RowSource>,
    key_exprs: Vec<Expr>,
    compare_flags: CompareFlags,
    drained: bool,
    output: Vec<Row>,
    cursor: usize,
    next_group_id: i64,
    next_offset: u64,
    preserve: bool,
    limits: Option<ResourceLimits>,
}

impl GroupBy {
    pub fn new(inner: RowSource, key_exprs: Vec<Expr>) -> Self {
        GroupBy {
            id: next_rowsource_id(),
            inner: Box::new(inner),
            key_exprs,
            compare_flags: CompareFlags::default(),
            drained: false,
            output: Vec::new(),
            cursor: 0,
            next_group_id: 0,
            next_offset: 0,
            preserve: false,
            limits: None,
        }
    }

    /// Bound the number of rows this operator may buffer while draining
    /// its input (spec §5).
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Distinct groups discovered, used by `Aggregate`'s empty-input
    /// special case.
    pub fn group_count(&self) -> usize {
        self.next_group_id as usize
    }

    pub fn grouping_is_empty(&self) -> bool {
        self.key_exprs.is_empty()
    }

    fn literal_sort_key(value: &Option<Literal>) -> String {
        match value {
            None => "\u{0}unbound".to_string(),
            Some(Literal::Str { lexical, lang, datatype }) => {
                format!("str|{}|{}|{}", lexical, lang.as_deref().unwrap_or(""), datatype.as_deref().unwrap_or(""))
            }
            Some(other) => format!("{}|{}", other.kind_name(), other.as_string()),
        }
    }

    fn drain(&mut self) -> Result<(), RowSourceError> {
        let rows = self.inner.read_all_rows()?;
        if let Some(limits) = &self.limits {
            check_batch(limits, &rows).map_err(|source| RowSourceError::ResourceLimit { operator: "group_by", source })?;
        }
        let mut groups: BTreeMap<Vec<String>, GroupEntry> = BTreeMap::new();
        for row in rows {
            let key_values = eval_tuple(&self.key_exprs, &row, self.compare_flags);
            let key: Vec<String> = key_values.iter().map(Self::literal_sort_key).collect();
            let next_id = self.next_group_id;
            let entry = groups.entry(key).or_insert_with(|| {
                self.next_group_id += 1;
                GroupEntry { id: next_id, rows: Vec::new() }
            });
            let mut tagged = row;
            tagged.set_group_id(entry.id);
            entry.rows.push(tagged);
        }
        self.output = groups.into_values().flat_map(|g| g.rows).collect();
        self.drained = true;
        Ok(())
    }
}

impl RowSourceOp for GroupBy {
    fn init(&mut self) -> Result<(), RowSourceError> {
        self.inner.init()
    }

    fn ensure_variables(&mut self) -> Result<(), RowSourceError> {
        self.inner.ensure_variables()
    }

    fn read_row(&mut self) -> Result<Option<Row>, RowSourceError> {
        if !self.drained {
            self.drain()?;
        }
        let Some(row) = self.output.get(self.cursor) else {
            return Ok(None);
        };
        let mut row = row.clone();
        self.cursor += 1;
        row.set_offset(self.next_offset);
        self.next_offset += 1;
        Ok(Some(row))
    }

    fn reset(&mut self) -> Result<(), RowSourceError> {
        if !self.preserve {
            return Err(RowSourceError::ResetNotSupported);
        }
        self.cursor = 0;
        self.next_offset = 0;
        Ok(())
    }

    fn set_requirements(&mut self, preserve: bool) {
        self.preserve = preserve;
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
        self.inner.size()
    }

    fn variables(&self) -> &VariablesTable {
        self.inner.variables()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rowsource::sequence::Sequence;

    fn xy_rows() -> RowSource {
        let mut vars = VariablesTable::new();
        vars.insert_named("x");
        vars.insert_named("y");
        let data = [(2, 3), (2, 5), (6, 7)];
        let rows = data
            .iter()
            .map(|(x, y)| {
                let mut row = Row::new(2, 1, 0);
                row.set(0, Some(Literal::integer(*x)));
                row.set(1, Some(Literal::integer(*y)));
                row
            })
            .collect();
        RowSource::Sequence(Sequence::new(rows, vars))
    }

    #[test]
    fn groups_rows_sharing_a_key_and_tags_group_id() {
        let mut op = GroupBy::new(xy_rows(), vec![Expr::Column(0)]);
        op.ensure_variables().unwrap();
        op.init().unwrap();
        let rows = op.read_all_rows().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].group_id(), rows[1].group_id());
        assert_ne!(rows[0].group_id(), rows[2].group_id());
        // Input order within a group is preserved.
        assert_eq!(rows[0].get(1).unwrap().as_string(), "3");
        assert_eq!(rows[1].get(1).unwrap().as_string(), "5");
    }

    #[test]
    fn empty_key_list_is_a_single_group() {
        let mut op = GroupBy::new(xy_rows(), vec![]);
        op.ensure_variables().unwrap();
        op.init().unwrap();
        let rows = op.read_all_rows().unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.group_id() == 0));
    }

    #[test]
    fn drain_reports_a_resource_limit_error_instead_of_buffering_unbounded() {
        let mut op = GroupBy::new(xy_rows(), vec![Expr::Column(0)])
            .with_limits(crate::execution::ResourceLimits { max_materialized_rows: 2, max_memory_bytes: usize::MAX });
        op.ensure_variables().unwrap();
        op.init().unwrap();
        assert!(matches!(op.read_all_rows(), Err(RowSourceError::ResourceLimit { operator: "group_by", .. })));
    }

    fn keyed_rows(keys: &[i64]) -> RowSource {
        let mut vars = VariablesTable::new();
        vars.insert_named("x");
        let rows = keys
            .iter()
            .map(|k| {
                let mut row = Row::new(1, 1, 0);
                row.set(0, Some(Literal::integer(*k)));
                row
            })
            .collect();
        RowSource::Sequence(Sequence::new(rows, vars))
    }

    fn partition_by_key(keys: &[i64]) -> Vec<std::collections::BTreeSet<i64>> {
        let mut op = GroupBy::new(keyed_rows(keys), vec![Expr::Column(0)]);
        op.ensure_variables().unwrap();
        op.init().unwrap();
        let rows = op.read_all_rows().unwrap();
        let mut groups: std::collections::BTreeMap<u64, std::collections::BTreeSet<i64>> = std::collections::BTreeMap::new();
        for row in rows {
            let key: i64 = row.get(0).unwrap().as_string().parse().unwrap();
            groups.entry(row.group_id()).or_default().insert(key);
        }
        let mut partitions: Vec<_> = groups.into_values().collect();
        partitions.sort();
        partitions
    }

    proptest::proptest! {
        #[test]
        fn grouping_partitions_are_invariant_under_row_permutation(
            keys in proptest::collection::vec(0i64..5, 0..20),
            seed in 0u64..1000,
        ) {
            let mut permuted = keys.clone();
            // Deterministic shuffle driven by `seed`, avoiding a rng crate dependency.
            for i in (1..permuted.len()).rev() {
                let j = (seed as usize).wrapping_mul(i + 1) % (i + 1);
                permuted.swap(i, j);
            }
            proptest::prop_assert_eq!(partition_by_key(&keys), partition_by_key(&permuted));
        }
    }
}
