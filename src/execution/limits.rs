//! Resource limits enforced while an operator materializes rows (spec
//! §5): GroupBy's full drain, Join's nested-loop right-side buffer,
//! Union's `read_all`. Checking is cooperative — operators call
//! [`ResourceLimits::check_rows`] / [`MemoryTracker::add`] themselves
//! at the points where they grow a buffer.
//!
//! The engine is single-threaded (spec §5), so the tracker uses a plain
//! `Cell` rather than an atomic.

use crate::error::ResourceError;
use crate::row::Row;
use std::cell::Cell;

/// Limits applied to a single materialization point.
#[derive(Debug, Clone, Copy)]
pub struct ResourceLimits {
    pub max_materialized_rows: usize,
    pub max_memory_bytes: usize,
}

impl ResourceLimits {
    pub fn check_rows(&self, materialized: usize) -> Result<(), ResourceError> {
        if materialized > self.max_materialized_rows {
            return Err(ResourceError::RowLimitExceeded {
                materialized,
                limit: self.max_materialized_rows,
            });
        }
        Ok(())
    }
}

impl From<&crate::config::ExecutionLimitsConfig> for ResourceLimits {
    fn from(config: &crate::config::ExecutionLimitsConfig) -> Self {
        ResourceLimits {
            max_materialized_rows: config.max_materialized_rows,
            max_memory_bytes: config.max_memory_bytes,
        }
    }
}

/// Tracks a running byte estimate against a limit. Operators add an
/// approximate per-row footprint as they buffer rows; the estimate need
/// not be exact, only monotonic and bounded.
#[derive(Debug)]
pub struct MemoryTracker {
    used_bytes: Cell<usize>,
    limit_bytes: usize,
}

impl MemoryTracker {
    pub fn new(limit_bytes: usize) -> Self {
        MemoryTracker {
            used_bytes: Cell::new(0),
            limit_bytes,
        }
    }

    pub fn add(&self, bytes: usize) -> Result<(), ResourceError> {
        let used = self.used_bytes.get() + bytes;
        self.used_bytes.set(used);
        if used > self.limit_bytes {
            return Err(ResourceError::MemoryLimitExceeded {
                used_bytes: used,
                limit_bytes: self.limit_bytes,
            });
        }
        Ok(())
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes.get()
    }
}

/// Rough per-row memory footprint: fixed `Row` overhead plus the
/// lexical length of each bound value. Doesn't need to be exact, only
/// monotonic and cheap to compute per row.
pub fn estimate_row_bytes(row: &Row) -> usize {
    let mut bytes = std::mem::size_of::<Row>();
    for value in row.values().iter().flatten() {
        bytes += value.as_string().len();
    }
    bytes
}

/// Checks a freshly materialized batch of rows against both the row-count
/// and memory limits in one call, the shape every materialization point
/// (GroupBy's drain, Join's right buffer, Union's `read_all`) needs.
pub fn check_batch(limits: &ResourceLimits, rows: &[Row]) -> Result<(), ResourceError> {
    limits.check_rows(rows.len())?;
    let tracker = MemoryTracker::new(limits.max_memory_bytes);
    for row in rows {
        tracker.add(estimate_row_bytes(row))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_limit_is_enforced() {
        let limits = ResourceLimits { max_materialized_rows: 10, max_memory_bytes: usize::MAX };
        assert!(limits.check_rows(10).is_ok());
        assert!(limits.check_rows(11).is_err());
    }

    #[test]
    fn memory_tracker_accumulates_and_errors_past_limit() {
        let tracker = MemoryTracker::new(100);
        assert!(tracker.add(60).is_ok());
        assert!(tracker.add(60).is_err());
        assert_eq!(tracker.used_bytes(), 120);
    }

    #[test]
    fn check_batch_rejects_past_the_memory_limit_even_under_the_row_limit() {
        let limits = ResourceLimits { max_materialized_rows: 100, max_memory_bytes: 8 };
        let rows = vec![Row::from_values(vec![Some(crate::literal::Literal::integer(123456789))], 0, 0)];
        assert!(check_batch(&limits, &rows).is_err());
    }

    #[test]
    fn check_batch_rejects_past_the_row_limit_even_under_the_memory_limit() {
        let limits = ResourceLimits { max_materialized_rows: 1, max_memory_bytes: usize::MAX };
        let rows = vec![Row::from_values(vec![], 0, 0), Row::from_values(vec![], 0, 0)];
        assert!(check_batch(&limits, &rows).is_err());
    }
}
