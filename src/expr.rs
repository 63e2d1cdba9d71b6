//! Expression evaluation against a [`Row`].
//!
//! Filter predicates, join constraints, GroupBy key tuples and
//! aggregation argument tuples are all instances of the same small
//! expression language: column references, constants, arithmetic, and
//! boolean/comparison combinators. Evaluation never panics; every
//! failure mode is a [`TypeError`], which callers downgrade per SPARQL
//! "error-as-skip"/"effective boolean false" semantics (spec §9) rather
//! than propagate.

use crate::literal::{CompareFlags, Literal};
use crate::row::Row;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// The expression tree. `Column` references a row offset rather than a
/// variable name — the operator that owns an `Expr` resolves names to
/// offsets once, during `ensure_variables`, rather than resolving names
/// on every row.
#[derive(Debug, Clone)]
pub enum Expr {
    Column(usize),
    Literal(Literal),
    Arithmetic { op: ArithOp, left: Box<Expr>, right: Box<Expr> },
    Compare { op: CompareOp, left: Box<Expr>, right: Box<Expr> },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Bound(usize),
    True,
    False,
}

impl Expr {
    pub fn eval(&self, row: &Row, flags: CompareFlags) -> Result<Literal, crate::error::TypeError> {
        use crate::error::TypeError;
        match self {
            Expr::Column(offset) => row
                .get(*offset)
                .cloned()
                .ok_or_else(|| TypeError::CoercionFailed(format!("column {offset} is unbound"))),
            Expr::Literal(l) => Ok(l.clone()),
            Expr::Arithmetic { op, left, right } => {
                let l = left.eval(row, flags)?;
                let r = right.eval(row, flags)?;
                match op {
                    ArithOp::Add => l.add(&r),
                    ArithOp::Sub => l.subtract(&r),
                    ArithOp::Mul => l.multiply(&r),
                    ArithOp::Div => l.divide(&r),
                }
            }
            Expr::Compare { op, left, right } => {
                let l = left.eval(row, flags)?;
                let r = right.eval(row, flags)?;
                let ordering = l.compare(&r, flags)?;
                Ok(Literal::boolean(matches_ordering(*op, ordering)))
            }
            Expr::And(a, b) => {
                let l = a.eval(row, flags)?.as_boolean()?;
                if !l {
                    return Ok(Literal::boolean(false));
                }
                Ok(Literal::boolean(b.eval(row, flags)?.as_boolean()?))
            }
            Expr::Or(a, b) => {
                let l = a.eval(row, flags)?.as_boolean()?;
                if l {
                    return Ok(Literal::boolean(true));
                }
                Ok(Literal::boolean(b.eval(row, flags)?.as_boolean()?))
            }
            Expr::Not(a) => Ok(Literal::boolean(!a.eval(row, flags)?.as_boolean()?)),
            Expr::Bound(offset) => Ok(Literal::boolean(!row.is_unbound(*offset))),
            Expr::True => Ok(Literal::boolean(true)),
            Expr::False => Ok(Literal::boolean(false)),
        }
    }

    /// `Some(true/false)` when this expression is a constant that does
    /// not reference any column, used by Join/Filter `init()` to
    /// collapse a constant constraint (spec §4.5, §4.3, §9).
    pub fn constant_bool(&self) -> Option<bool> {
        match self {
            Expr::True => Some(true),
            Expr::False => Some(false),
            Expr::Literal(l) => l.as_boolean().ok(),
            Expr::Not(inner) => inner.constant_bool().map(|b| !b),
            Expr::And(a, b) => match (a.constant_bool(), b.constant_bool()) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            Expr::Or(a, b) => match (a.constant_bool(), b.constant_bool()) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn referenced_columns(&self, out: &mut Vec<usize>) {
        match self {
            Expr::Column(offset) | Expr::Bound(offset) => out.push(*offset),
            Expr::Literal(_) | Expr::True | Expr::False => {}
            Expr::Arithmetic { left, right, .. } | Expr::Compare { left, right, .. } => {
                left.referenced_columns(out);
                right.referenced_columns(out);
            }
            Expr::And(a, b) | Expr::Or(a, b) => {
                a.referenced_columns(out);
                b.referenced_columns(out);
            }
            Expr::Not(a) => a.referenced_columns(out),
        }
    }
}

fn matches_ordering(op: CompareOp, ordering: Ordering) -> bool {
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    }
}

/// Evaluate a tuple of expressions against a row, per-expression, for
/// GroupBy keys and aggregate argument lists. Each slot is `None` when
/// that expression errored (SPARQL "list-eval-E": skip the argument,
/// don't fail the whole tuple).
pub fn eval_tuple(exprs: &[Expr], row: &Row, flags: CompareFlags) -> Vec<Option<Literal>> {
    exprs.iter().map(|e| e.eval(row, flags).ok()).collect()
}
