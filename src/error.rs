//! Crate-wide error taxonomy.
//!
//! Mirrors the error classes a caller needs to distinguish per the
//! engine's failure model: a type error inside expression evaluation, a
//! schema mismatch surfaced by the comparison engine, a parse error at a
//! source boundary (results JSON, XSD lexical forms), resource exhaustion
//! while an operator materializes rows, and a comparison timeout.

use std::io;
use thiserror::Error;

/// Errors produced while evaluating literal arithmetic, equality or
/// ordering. Callers at the query level degrade most of these to
/// "effective boolean false" (filters) or "skip this argument"
/// (aggregates) rather than propagating them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("values of type {left} and {right} are not comparable")]
    NotComparable { left: String, right: String },

    #[error("operator '{op}' is not defined for type {ty}")]
    UnsupportedOperation { op: String, ty: String },

    #[error("arithmetic overflow evaluating '{op}'")]
    Overflow { op: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("cannot coerce {0} to the requested type")]
    CoercionFailed(String),
}

/// Errors raised by the XSD date/dateTime parser.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DateTimeParseError {
    #[error("malformed lexical form at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: String },

    #[error("year 0000 is not a valid XSD year")]
    YearZero,

    #[error("month {0} is out of range 1..=12")]
    MonthOutOfRange(u8),

    #[error("day {day} is out of range for month {month} of year {year}")]
    DayOutOfRange { year: i64, month: u8, day: u8 },

    #[error("hour {0} is out of range 0..=24")]
    HourOutOfRange(u8),

    #[error("hour 24 requires minute and second to both be zero")]
    Hour24NotMidnight,

    #[error("minute {0} is out of range 0..=59")]
    MinuteOutOfRange(u8),

    #[error("second {0} is out of range 0..=59")]
    SecondOutOfRange(u8),

    #[error("timezone hour {0} is out of range 0..=14")]
    TimezoneHourOutOfRange(i8),

    #[error("timezone hour 14 requires minute to be zero")]
    TimezoneHour14NotWhole,

    #[error("timezone minute {0} is out of range 0..=59")]
    TimezoneMinuteOutOfRange(i8),
}

/// A single difference recorded while comparing results, at the
/// granularity the comparison engine emits (§4.9). Owned by whichever
/// `ComparisonOutcome` produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Difference {
    Cell {
        description: String,
        expected: String,
        actual: String,
    },
    Triple {
        description: String,
        expected: String,
        actual: String,
    },
}

/// Errors that abort a results-reader boundary call (JSON parsing, file
/// I/O for the comparator CLI).
#[derive(Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error at {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed results document: {0}")]
    Malformed(String),

    #[error("unsupported result kind for this operation: {0}")]
    UnsupportedResultKind(String),
}

/// Errors surfaced by the rowsource framework itself: invariant
/// violations that are fatal for the subtree rather than a single row
/// (spec §7 "Propagation").
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowSourceError {
    #[error("reset() called on a rowsource that did not receive set_requirements(preserve=true)")]
    ResetNotSupported,

    #[error("out of memory materializing rows for {operator}")]
    OutOfMemory { operator: &'static str },

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("type error while evaluating an expression: {0}")]
    Type(#[from] TypeError),

    #[error("resource limit exceeded materializing rows for {operator}: {source}")]
    ResourceLimit {
        operator: &'static str,
        #[source]
        source: ResourceError,
    },
}

/// Resource exhaustion raised by the execution-hardening layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    #[error("row limit exceeded: materialized {materialized}, limit {limit}")]
    RowLimitExceeded { materialized: usize, limit: usize },

    #[error("memory limit exceeded: used {used_bytes} bytes, limit {limit_bytes} bytes")]
    MemoryLimitExceeded { used_bytes: usize, limit_bytes: usize },
}

/// Graph-isomorphism search exceeded its wall-clock bound (spec §5, §7).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("graph isomorphism search exceeded the configured time bound")]
pub struct GraphIsoTimeout;
