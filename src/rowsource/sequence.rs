//! `Sequence` (spec §4.2: "Row-sequence"): owns a fixed vector of rows
//! and a variables table. `read_row` pops from the front; `reset`
//! restarts from the head if `preserve` was requested.

use super::{next_rowsource_id, RowSource};
use crate::error::RowSourceError;
use crate::literal::Literal;
use crate::row::{Row, RowSourceId};
use crate::variable::VariablesTable;

pub struct Sequence {
    id: RowSourceId,
    rows: Vec<Row>,
    cursor: usize,
    preserve: bool,
    variables: VariablesTable,
    next_offset: u64,
}

impl Sequence {
    pub fn new(rows: Vec<Row>, variables: VariablesTable) -> Self {
        Sequence {
            id: next_rowsource_id(),
            rows,
            cursor: 0,
            preserve: false,
            variables,
            next_offset: 0,
        }
    }
}

impl super::RowSourceOp for Sequence {
    fn init(&mut self) -> Result<(), RowSourceError> {
        Ok(())
    }

    fn ensure_variables(&mut self) -> Result<(), RowSourceError> {
        Ok(())
    }

    fn read_row(&mut self) -> Result<Option<Row>, RowSourceError> {
        if self.cursor >= self.rows.len() {
            return Ok(None);
        }
        let mut row = self.rows[self.cursor].clone();
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

    fn get_inner_rowsource(&self, _i: usize) -> Option<&RowSource> {
        None
    }

    fn set_origin(&mut self, _term: Option<Literal>) {}

    fn size(&self) -> usize {
        self.variables.size()
    }

    fn variables(&self) -> &VariablesTable {
        &self.variables
    }
}
