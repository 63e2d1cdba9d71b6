//! `Project` (spec §4.3): a fixed variable list; for each input row,
//! build an output row by copying by-name into the declared output
//! positions. A declared name absent from the input stays unbound.

use super::{next_rowsource_id, RowSource, RowSourceOp};
use crate::error::RowSourceError;
use crate::literal::Literal;
use crate::row::{Row, RowSourceId};
use crate::variable::VariablesTable;

pub struct Project {
    id: RowSourceId,
    inner: Box<RowSource>,
    declared_names: Vec<String>,
    /// `input_offset[output_position]`, resolved in `ensure_variables`.
    input_offset: Vec<Option<usize>>,
    variables: VariablesTable,
    next_offset: u64,
    origin: Option<Literal>,
}

impl Project {
    pub fn new(inner: RowSource, declared_names: Vec<String>) -> Self {
        Project {
            id: next_rowsource_id(),
            inner: Box::new(inner),
            declared_names,
            input_offset: Vec::new(),
            variables: VariablesTable::new(),
            next_offset: 0,
            origin: None,
        }
    }
}

impl RowSourceOp for Project {
    fn init(&mut self) -> Result<(), RowSourceError> {
        self.inner.init()
    }

    fn ensure_variables(&mut self) -> Result<(), RowSourceError> {
        self.inner.ensure_variables()?;
        if !self.input_offset.is_empty() {
            return Ok(());
        }
        let inner_vars = self.inner.variables();
        let mut variables = VariablesTable::new();
        let mut mapping = Vec::with_capacity(self.declared_names.len());
        for name in &self.declared_names {
            variables.insert_named(name.clone());
            mapping.push(inner_vars.offset_of(name));
        }
        self.input_offset = mapping;
        self.variables = variables;
        Ok(())
    }

    fn read_row(&mut self) -> Result<Option<Row>, RowSourceError> {
        let Some(input) = self.inner.read_row()? else {
            return Ok(None);
        };
        let values = self
            .input_offset
            .iter()
            .map(|offset| offset.and_then(|o| input.get(o).cloned()))
            .collect();
        let mut output = Row::from_values(values, self.id, self.next_offset);
        self.next_offset += 1;
        output.set_group_id(input.group_id());
        Ok(Some(output))
    }

    fn reset(&mut self) -> Result<(), RowSourceError> {
        self.inner.reset()?;
        self.next_offset = 0;
        Ok(())
    }

    fn set_requirements(&mut self, preserve: bool) {
        self.inner.set_requirements(preserve);
    }

    fn get_inner_rowsource(&self, i: usize) -> Option<&RowSource> {
        if i == 0 {
            Some(&self.inner)
        } else {
            None
        }
    }

    fn set_origin(&mut self, term: Option<Literal>) {
        self.origin = term;
    }

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
    use crate::rowsource::sequence::Sequence;

    fn input() -> RowSource {
        let mut vars = VariablesTable::new();
        vars.insert_named("x");
        vars.insert_named("y");
        let mut row = Row::new(2, 1, 0);
        row.set(0, Some(Literal::integer(1)));
        row.set(1, Some(Literal::integer(2)));
        RowSource::Sequence(Sequence::new(vec![row], vars))
    }

    #[test]
    fn copies_declared_names_by_position() {
        let mut op = Project::new(input(), vec!["y".to_string(), "z".to_string()]);
        op.ensure_variables().unwrap();
        let row = op.read_row().unwrap().unwrap();
        assert_eq!(row.get(0).unwrap().as_string(), "2");
        assert!(row.is_unbound(1));
    }
}
