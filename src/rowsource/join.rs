//! `Join` (spec §4.5): natural (inner) and left-outer, as a nested-loop
//! `INIT_RIGHT → READ_RIGHT → (INIT_RIGHT | FINISHED)` state machine.
//! Compatibility and the right-to-output column mapping are precomputed
//! in `ensure_variables`; a constant constraint collapses in `init()`
//! (false → empty, true → constraint dropped).

use super::{next_rowsource_id, RowSource, RowSourceOp};
use crate::error::RowSourceError;
use crate::execution::{check_batch, ResourceLimits};
use crate::expr::Expr;
use crate::literal::{CompareFlags, Literal};
use crate::row::{Row, RowSourceId};
use crate::variable::VariablesTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Natural,
    LeftOuter,
}

#[derive(PartialEq, Eq)]
enum State {
    InitRight,
    ReadRight,
    Finished,
}

pub struct Join {
    id: RowSourceId,
    left: Box<RowSource>,
    right: Box<RowSource>,
    kind: JoinKind,
    constraint: Option<Expr>,
    compare_flags: CompareFlags,
    collapsed_empty: bool,
    variables: VariablesTable,
    /// `right_mapping[right_offset] = output_offset`.
    right_mapping: Vec<usize>,
    left_size: usize,
    state: State,
    current_left: Option<Row>,
    left_has_match: bool,
    /// The right side, buffered once and replayed for every left row
    /// (spec §4.5's nested-loop shape); `None` until `init()` fills it.
    right_buffer: Option<Vec<Row>>,
    right_cursor: usize,
    preserve: bool,
    next_offset: u64,
    limits: Option<ResourceLimits>,
}

impl Join {
    pub fn new(left: RowSource, right: RowSource, kind: JoinKind, constraint: Option<Expr>) -> Self {
        Join {
            id: next_rowsource_id(),
            left: Box::new(left),
            right: Box::new(right),
            kind,
            constraint,
            compare_flags: CompareFlags::default(),
            collapsed_empty: false,
            variables: VariablesTable::new(),
            right_mapping: Vec::new(),
            left_size: 0,
            state: State::InitRight,
            current_left: None,
            left_has_match: false,
            right_buffer: None,
            right_cursor: 0,
            preserve: false,
            next_offset: 0,
            limits: None,
        }
    }

    /// Bound the number of rows the right side may buffer for the
    /// nested-loop scan (spec §5).
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    fn merge(&self, left: &Row, right: &Row) -> Option<Row> {
        let mut values: Vec<Option<Literal>> = vec![None; self.variables.size()];
        for i in 0..self.left_size {
            values[i] = left.get(i).cloned();
        }
        for (right_offset, &output_offset) in self.right_mapping.iter().enumerate() {
            let Some(right_value) = right.get(right_offset) else { continue };
            if output_offset < self.left_size {
                if let Some(left_value) = values[output_offset].clone() {
                    if !left_value.value_equals(right_value, self.compare_flags) {
                        return None;
                    }
                }
            }
            values[output_offset] = Some(right_value.clone());
        }
        Some(Row::from_values(values, self.id, 0))
    }

    fn pad_left(&self, left: &Row) -> Row {
        let mut values: Vec<Option<Literal>> = left.values().to_vec();
        values.resize(self.variables.size(), None);
        Row::from_values(values, self.id, 0)
    }
}

impl RowSourceOp for Join {
    fn init(&mut self) -> Result<(), RowSourceError> {
        self.left.init()?;
        self.right.init()?;
        if let Some(expr) = &self.constraint {
            match expr.constant_bool() {
                Some(false) => self.collapsed_empty = true,
                Some(true) => self.constraint = None,
                None => {}
            }
        }
        if !self.collapsed_empty {
            let rows = self.right.read_all_rows()?;
            if let Some(limits) = &self.limits {
                check_batch(limits, &rows).map_err(|source| RowSourceError::ResourceLimit { operator: "join", source })?;
            }
            self.right_buffer = Some(rows);
        }
        Ok(())
    }

    fn ensure_variables(&mut self) -> Result<(), RowSourceError> {
        self.left.ensure_variables()?;
        self.right.ensure_variables()?;
        if !self.right_mapping.is_empty() || self.right.size() == 0 {
            if self.variables.size() == 0 {
                self.variables = self.left.variables().clone();
                self.left_size = self.variables.size();
            }
            return Ok(());
        }
        let mut variables = self.left.variables().clone();
        self.left_size = variables.size();
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
        if self.collapsed_empty {
            return Ok(None);
        }
        loop {
            match self.state {
                State::Finished => return Ok(None),
                State::InitRight => {
                    let Some(left_row) = self.left.read_row()? else {
                        self.state = State::Finished;
                        return Ok(None);
                    };
                    self.right_cursor = 0;
                    self.current_left = Some(left_row);
                    self.left_has_match = false;
                    self.state = State::ReadRight;
                }
                State::ReadRight => {
                    let left_row = self.current_left.clone().expect("InitRight always sets current_left");
                    let next_right = self.right_buffer.as_ref().and_then(|buf| buf.get(self.right_cursor)).cloned();
                    if next_right.is_some() {
                        self.right_cursor += 1;
                    }
                    match next_right {
                        Some(right_row) => {
                            let Some(merged) = self.merge(&left_row, &right_row) else {
                                continue;
                            };
                            if let Some(expr) = &self.constraint {
                                let ok = expr.eval(&merged, self.compare_flags).and_then(|l| l.as_boolean()).unwrap_or(false);
                                if !ok {
                                    continue;
                                }
                            }
                            self.left_has_match = true;
                            let mut merged = merged;
                            merged.set_offset(self.next_offset);
                            self.next_offset += 1;
                            return Ok(Some(merged));
                        }
                        None => {
                            self.state = State::InitRight;
                            if self.kind == JoinKind::LeftOuter && !self.left_has_match {
                                let mut padded = self.pad_left(&left_row);
                                padded.set_offset(self.next_offset);
                                self.next_offset += 1;
                                return Ok(Some(padded));
                            }
                        }
                    }
                }
            }
        }
    }

    fn reset(&mut self) -> Result<(), RowSourceError> {
        if !self.preserve {
            return Err(RowSourceError::ResetNotSupported);
        }
        self.left.reset()?;
        self.state = State::InitRight;
        self.current_left = None;
        self.right_cursor = 0;
        self.next_offset = 0;
        Ok(())
    }

    fn set_requirements(&mut self, preserve: bool) {
        self.preserve = preserve;
        self.left.set_requirements(preserve);
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
