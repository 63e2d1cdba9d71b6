//! `Union` (spec §4.6): concatenates two inputs. Output schema is
//! `vars(left) ∪ vars(right)` in left-then-right order, duplicates
//! merged. Left rows are padded to output size in place; right rows are
//! resized and permuted through a precomputed mapping. `read_all_rows`
//! is a bulk specialization: collect both sides, transform right rows,
//! append, and renumber offsets.

use super::{next_rowsource_id, RowSource, RowSourceOp};
use crate::error::RowSourceError;
use crate::execution::{check_batch, ResourceLimits};
use crate::literal::Literal;
use crate::row::{Row, RowSourceId};
use crate::variable::VariablesTable;

enum Side {
    Left,
    Right,
}

pub struct Union {
    id: RowSourceId,
    left: Box<RowSource>,
    right: Box<RowSource>,
    current_side: Side,
    variables: VariablesTable,
    /// `right_mapping[right_offset] = output_offset`.
    right_mapping: Vec<usize>,
    next_offset: u64,
    preserve: bool,
    limits: Option<ResourceLimits>,
}

impl Union {
    pub fn new(left: RowSource, right: RowSource) -> Self {
        Union {
            id: next_rowsource_id(),
            left: Box::new(left),
            right: Box::new(right),
            current_side: Side::Left,
            variables: VariablesTable::new(),
            right_mapping: Vec::new(),
            next_offset: 0,
            preserve: false,
            limits: None,
        }
    }

    /// Bound the number of rows `read_all_rows` may buffer across both
    /// sides (spec §5).
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    fn project_right(&self, right: &Row) -> Row {
        let mut values: Vec<Option<Literal>> = vec![None; self.variables.size()];
        for (right_offset, &output_offset) in self.right_mapping.iter().enumerate() {
            values[output_offset] = right.get(right_offset).cloned();
        }
        Row::from_values(values, self.id, 0)
    }
}

impl RowSourceOp for Union {
    fn init(&mut self) -> Result<(), RowSourceError> {
        self.left.init()?;
        self.right.init()
    }

    fn ensure_variables(&mut self) -> Result<(), RowSourceError> {
        self.left.ensure_variables()?;
        self.right.ensure_variables()?;
        if !self.right_mapping.is_empty() || self.right.size() == 0 {
            if self.variables.size() == 0 {
                self.variables = self.left.variables().clone();
            }
            return Ok(());
        }
        let mut variables = self.left.variables().clone();
        let right_vars = self.right.variables();
        let mut mapping = Vec::with_capacity(self.right.size());
        for offset in 0..self.right.size() {
            let name = right_vars
                .get_by_offset(offset)
                .map(|v| v.name.clone())
                .unwrap_or_else(|| format!(".right{offset}"));
            let output_offset = variables.offset_of(&name).unwrap_or_else(|| variables.insert_named(name));
            mapping.push(output_offset);
        }
        self.right_mapping = mapping;
        self.variables = variables;
        Ok(())
    }

    fn read_row(&mut self) -> Result<Option<Row>, RowSourceError> {
        loop {
            match self.current_side {
                Side::Left => match self.left.read_row()? {
                    Some(row) => {
                        let mut values = row.values().to_vec();
                        values.resize(self.variables.size(), None);
                        let mut out = Row::from_values(values, self.id, self.next_offset);
                        self.next_offset += 1;
                        out.set_group_id(row.group_id());
                        return Ok(Some(out));
                    }
                    None => self.current_side = Side::Right,
                },
                Side::Right => match self.right.read_row()? {
                    Some(row) => {
                        let mut out = self.project_right(&row);
                        out.set_offset(self.next_offset);
                        self.next_offset += 1;
                        return Ok(Some(out));
                    }
                    None => return Ok(None),
                },
            }
        }
    }

    fn read_all_rows(&mut self) -> Result<Vec<Row>, RowSourceError> {
        let mut rows = Vec::new();
        while let Side::Left = self.current_side {
            match self.left.read_row()? {
                Some(row) => {
                    let group_id = row.group_id();
                    let mut values = row.values().to_vec();
                    values.resize(self.variables.size(), None);
                    let mut out = Row::from_values(values, self.id, 0);
                    out.set_group_id(group_id);
                    rows.push(out);
                }
                None => self.current_side = Side::Right,
            }
        }
        for row in self.right.read_all_rows()? {
            rows.push(self.project_right(&row));
        }
        if let Some(limits) = &self.limits {
            check_batch(limits, &rows).map_err(|source| RowSourceError::ResourceLimit { operator: "union", source })?;
        }
        for row in &mut rows {
            row.set_offset(self.next_offset);
            self.next_offset += 1;
        }
        Ok(rows)
    }

    fn reset(&mut self) -> Result<(), RowSourceError> {
        if !self.preserve {
            return Err(RowSourceError::ResetNotSupported);
        }
        self.left.reset()?;
        self.right.reset()?;
        self.current_side = Side::Left;
        self.next_offset = 0;
        Ok(())
    }

    fn set_requirements(&mut self, preserve: bool) {
        self.preserve = preserve;
        self.left.set_requirements(preserve);
        self.right.set_requirements(preserve);
    }

    fn get_inner_rowsource(&self, i: usize) -> Option<&RowSource> {
        match i {
            0 => Some(&self.left),
            1 => Some(&self.right),
            _ => None,
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
