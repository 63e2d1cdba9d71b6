//! `Slice` (spec §4.3): `(limit, offset)`, both signed with negative
//! meaning unbounded. An input counter starts at 1; for each input row,
//! skip while `counter < offset+1`, emit while `counter <= offset+limit`,
//! then stop. Output offsets start at 1 (spec §8: `Slice(limit=2,
//! offset=1)` on a 5-row input yields output offsets 1 and 2).

use super::{next_rowsource_id, RowSource, RowSourceOp};
use crate::error::RowSourceError;
use crate::literal::Literal;
use crate::row::{Row, RowSourceId};
use crate::variable::VariablesTable;

pub struct Slice {
    id: RowSourceId,
    inner: Box<RowSource>,
    limit: i64,
    offset: i64,
    input_counter: i64,
    next_output_offset: u64,
    finished: bool,
    preserve: bool,
}

impl Slice {
    pub fn new(inner: RowSource, limit: i64, offset: i64) -> Self {
        Slice {
            id: next_rowsource_id(),
            inner: Box::new(inner),
            limit,
            offset,
            input_counter: 1,
            next_output_offset: 1,
            finished: false,
            preserve: false,
        }
    }

    fn upper_bound(&self) -> Option<i64> {
        if self.limit < 0 {
            None
        } else {
            Some(self.offset.max(0) + self.limit)
        }
    }
}

impl RowSourceOp for Slice {
    fn init(&mut self) -> Result<(), RowSourceError> {
        self.inner.init()
    }

    fn ensure_variables(&mut self) -> Result<(), RowSourceError> {
        self.inner.ensure_variables()
    }

    fn read_row(&mut self) -> Result<Option<Row>, RowSourceError> {
        if self.finished {
            return Ok(None);
        }
        let lower_bound = self.offset.max(0) + 1;
        loop {
            let Some(row) = self.inner.read_row()? else {
                self.finished = true;
                return Ok(None);
            };
            let counter = self.input_counter;
            self.input_counter += 1;
            if counter < lower_bound {
                continue;
            }
            if let Some(upper) = self.upper_bound() {
                if counter > upper {
                    self.finished = true;
                    return Ok(None);
                }
            }
            let mut row = row;
            row.set_offset(self.next_output_offset);
            self.next_output_offset += 1;
            return Ok(Some(row));
        }
    }

    fn reset(&mut self) -> Result<(), RowSourceError> {
        if !self.preserve {
            return Err(RowSourceError::ResetNotSupported);
        }
        self.inner.reset()?;
        self.input_counter = 1;
        self.next_output_offset = 1;
        self.finished = false;
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

    fn five_rows() -> RowSource {
        let mut vars = VariablesTable::new();
        vars.insert_named("x");
        let rows = (1..=5)
            .map(|v| {
                let mut row = Row::new(1, 1, 0);
                row.set(0, Some(Literal::integer(v)));
                row
            })
            .collect();
        RowSource::Sequence(Sequence::new(rows, vars))
    }

    #[test]
    fn limit_2_offset_1_yields_indices_2_and_3() {
        let mut op = Slice::new(five_rows(), 2, 1);
        op.init().unwrap();
        let first = op.read_row().unwrap().unwrap();
        assert_eq!(first.get(0).unwrap().as_string(), "2");
        assert_eq!(first.offset(), 1);
        let second = op.read_row().unwrap().unwrap();
        assert_eq!(second.get(0).unwrap().as_string(), "3");
        assert_eq!(second.offset(), 2);
        assert!(op.read_row().unwrap().is_none());
    }

    #[test]
    fn negative_limit_is_unbounded() {
        let mut op = Slice::new(five_rows(), -1, 3);
        op.init().unwrap();
        let mut values = Vec::new();
        while let Some(row) = op.read_row().unwrap() {
            values.push(row.get(0).unwrap().as_string());
        }
        assert_eq!(values, vec!["4", "5"]);
    }

    fn numbered_rows(n: i64) -> RowSource {
        let mut vars = VariablesTable::new();
        vars.insert_named("x");
        let rows = (1..=n)
            .map(|v| {
                let mut row = Row::new(1, 1, 0);
                row.set(0, Some(Literal::integer(v)));
                row
            })
            .collect();
        RowSource::Sequence(Sequence::new(rows, vars))
    }

    proptest::proptest! {
        #[test]
        fn output_offsets_are_a_contiguous_one_based_run_of_the_requested_length(
            n in 0i64..20,
            limit in -1i64..20,
            offset in 0i64..20,
        ) {
            let mut op = Slice::new(numbered_rows(n), limit, offset);
            op.init().unwrap();
            let rows = op.read_all_rows().unwrap();

            let remaining = (n - offset).max(0) as usize;
            let expected_len = if limit < 0 { remaining } else { remaining.min(limit as usize) };
            proptest::prop_assert_eq!(rows.len(), expected_len);
            for (i, row) in rows.iter().enumerate() {
                proptest::prop_assert_eq!(row.offset(), (i + 1) as u64);
                let expected_value = offset + i as i64 + 1;
                proptest::prop_assert_eq!(row.get(0).unwrap().as_string(), expected_value.to_string());
            }
        }
    }
}
