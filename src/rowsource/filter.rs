//! `Filter` (spec §4.3): evaluates a boolean expression against each
//! row's bindings. A row where the expression errors is treated as
//! `false` (SPARQL effective-boolean-value semantics — an arithmetic
//! error is a falsy result, not a fatal one). A constant expression is
//! detected in `init()` and collapses the operator to pass-through or
//! drop-all (spec §9).

use super::{next_rowsource_id, RowSource, RowSourceOp};
use crate::error::RowSourceError;
use crate::expr::Expr;
use crate::literal::{CompareFlags, Literal};
use crate::row::{Row, RowSourceId};
use crate::variable::VariablesTable;

enum Collapsed {
    None,
    PassThrough,
    DropAll,
}

pub struct Filter {
    id: RowSourceId,
    inner: Box<RowSource>,
    predicate: Expr,
    compare_flags: CompareFlags,
    collapsed: Collapsed,
    next_offset: u64,
    origin: Option<Literal>,
}

impl Filter {
    pub fn new(inner: RowSource, predicate: Expr) -> Self {
        Filter {
            id: next_rowsource_id(),
            inner: Box::new(inner),
            predicate,
            compare_flags: CompareFlags::default(),
            collapsed: Collapsed::None,
            next_offset: 0,
            origin: None,
        }
    }
}

impl RowSourceOp for Filter {
    fn init(&mut self) -> Result<(), RowSourceError> {
        self.inner.init()?;
        self.collapsed = match self.predicate.constant_bool() {
            Some(true) => Collapsed::PassThrough,
            Some(false) => Collapsed::DropAll,
            None => Collapsed::None,
        };
        Ok(())
    }

    fn ensure_variables(&mut self) -> Result<(), RowSourceError> {
        self.inner.ensure_variables()
    }

    fn read_row(&mut self) -> Result<Option<Row>, RowSourceError> {
        if matches!(self.collapsed, Collapsed::DropAll) {
            return Ok(None);
        }
        loop {
            let Some(mut row) = self.inner.read_row()? else {
                return Ok(None);
            };
            let keep = match self.collapsed {
                Collapsed::PassThrough => true,
                Collapsed::DropAll => unreachable!(),
                Collapsed::None => self
                    .predicate
                    .eval(&row, self.compare_flags)
                    .and_then(|l| l.as_boolean())
                    .unwrap_or(false),
            };
            if keep {
                row.set_offset(self.next_offset);
                self.next_offset += 1;
                return Ok(Some(row));
            }
        }
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
        self.inner.size()
    }

    fn variables(&self) -> &VariablesTable {
        self.inner.variables()
    }
}
