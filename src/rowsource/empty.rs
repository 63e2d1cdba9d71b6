//! The `Empty` leaf (spec §4.2): zero columns, produces no rows. Used
//! as the collapse target for a constant-false filter or join
//! constraint (spec §4.3, §4.5, §9).

use super::RowSource;
use crate::error::RowSourceError;
use crate::literal::Literal;
use crate::row::Row;
use crate::variable::VariablesTable;

pub struct Empty {
    variables: VariablesTable,
}

impl Empty {
    pub fn new() -> Self {
        Empty { variables: VariablesTable::new() }
    }
}

impl Default for Empty {
    fn default() -> Self {
        Empty::new()
    }
}

impl super::RowSourceOp for Empty {
    fn init(&mut self) -> Result<(), RowSourceError> {
        Ok(())
    }

    fn ensure_variables(&mut self) -> Result<(), RowSourceError> {
        Ok(())
    }

    fn read_row(&mut self) -> Result<Option<Row>, RowSourceError> {
        Ok(None)
    }

    fn reset(&mut self) -> Result<(), RowSourceError> {
        Ok(())
    }

    fn set_requirements(&mut self, _preserve: bool) {}

    fn get_inner_rowsource(&self, _i: usize) -> Option<&RowSource> {
        None
    }

    fn set_origin(&mut self, _term: Option<Literal>) {}

    fn size(&self) -> usize {
        0
    }

    fn variables(&self) -> &VariablesTable {
        &self.variables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rowsource::RowSourceOp;

    #[test]
    fn produces_no_rows() {
        let mut op = Empty::new();
        op.init().unwrap();
        assert!(op.read_row().unwrap().is_none());
    }
}
