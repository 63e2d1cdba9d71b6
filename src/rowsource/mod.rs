//! The rowsource framework (spec §4.1): a pull-based operator contract
//! modeled as a sum type over a fixed set of operator kinds known at
//! build time, plus one trait carrying the framework hooks every kind
//! implements. This deliberately avoids open-ended plugin polymorphism
//! (spec §9) — adding an operator kind means adding a match arm, not
//! registering a new trait object.

pub mod aggregate;
pub mod empty;
pub mod filter;
pub mod graph;
pub mod groupby;
pub mod join;
pub mod project;
pub mod sequence;
pub mod slice;
pub mod union;

use crate::error::RowSourceError;
use crate::literal::Literal;
use crate::row::{Row, RowSourceId};
use crate::variable::VariablesTable;
use std::cell::Cell;

/// Monotonically-increasing id allocator, one id per constructed
/// rowsource, used to stamp [`Row::rowsource`].
fn next_rowsource_id() -> RowSourceId {
    thread_local! {
        static NEXT: Cell<RowSourceId> = const { Cell::new(1) };
    }
    NEXT.with(|n| {
        let id = n.get();
        n.set(id + 1);
        id
    })
}

/// The framework hooks every operator kind implements (spec §4.1).
pub trait RowSourceOp {
    /// One-time setup: pre-read first rows, pre-evaluate constant
    /// sub-expressions. Idempotent; subsequent calls are no-ops.
    fn init(&mut self) -> Result<(), RowSourceError>;

    /// Compute and publish this operator's output variables and size.
    /// Idempotent. Must ensure its inputs' variables first.
    fn ensure_variables(&mut self) -> Result<(), RowSourceError>;

    /// Produce the next row, or `None` at end-of-stream.
    fn read_row(&mut self) -> Result<Option<Row>, RowSourceError>;

    /// Default implementation loops `read_row`; operators may override
    /// when bulk reads are cheaper (Union does).
    fn read_all_rows(&mut self) -> Result<Vec<Row>, RowSourceError> {
        let mut rows = Vec::new();
        while let Some(row) = self.read_row()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Return to the start of the stream. Only valid if this operator
    /// previously called `set_requirements(true)` on its inputs.
    fn reset(&mut self) -> Result<(), RowSourceError>;

    /// Signal that the caller may `reset()` later, so inputs must
    /// retain rather than discard consumed rows.
    fn set_requirements(&mut self, preserve: bool);

    /// Structural inspection: the i-th input, or `None`.
    fn get_inner_rowsource(&self, i: usize) -> Option<&RowSource>;

    /// Stamp a provenance term onto produced rows (used by `Graph`
    /// iteration pipelines binding the named-graph variable).
    fn set_origin(&mut self, term: Option<Literal>);

    fn size(&self) -> usize;

    fn variables(&self) -> &VariablesTable;
}

/// The sum type over operator kinds.
pub enum RowSource {
    Empty(empty::Empty),
    Sequence(sequence::Sequence),
    Project(Box<project::Project>),
    Filter(Box<filter::Filter>),
    Slice(Box<slice::Slice>),
    Graph(Box<graph::Graph>),
    Join(Box<join::Join>),
    Union(Box<union::Union>),
    GroupBy(Box<groupby::GroupBy>),
    Aggregate(Box<aggregate::Aggregate>),
}

macro_rules! dispatch {
    ($self:expr, $op:ident $args:tt) => {
        match $self {
            RowSource::Empty(op) => op.$op $args,
            RowSource::Sequence(op) => op.$op $args,
            RowSource::Project(op) => op.$op $args,
            RowSource::Filter(op) => op.$op $args,
            RowSource::Slice(op) => op.$op $args,
            RowSource::Graph(op) => op.$op $args,
            RowSource::Join(op) => op.$op $args,
            RowSource::Union(op) => op.$op $args,
            RowSource::GroupBy(op) => op.$op $args,
            RowSource::Aggregate(op) => op.$op $args,
        }
    };
}

impl RowSourceOp for RowSource {
    fn init(&mut self) -> Result<(), RowSourceError> {
        dispatch!(self, init())
    }

    fn ensure_variables(&mut self) -> Result<(), RowSourceError> {
        dispatch!(self, ensure_variables())
    }

    fn read_row(&mut self) -> Result<Option<Row>, RowSourceError> {
        dispatch!(self, read_row())
    }

    fn read_all_rows(&mut self) -> Result<Vec<Row>, RowSourceError> {
        dispatch!(self, read_all_rows())
    }

    fn reset(&mut self) -> Result<(), RowSourceError> {
        dispatch!(self, reset())
    }

    fn set_requirements(&mut self, preserve: bool) {
        dispatch!(self, set_requirements(preserve))
    }

    fn get_inner_rowsource(&self, i: usize) -> Option<&RowSource> {
        dispatch!(self, get_inner_rowsource(i))
    }

    fn set_origin(&mut self, term: Option<Literal>) {
        dispatch!(self, set_origin(term))
    }

    fn size(&self) -> usize {
        dispatch!(self, size())
    }

    fn variables(&self) -> &VariablesTable {
        dispatch!(self, variables())
    }
}
