//! Execution hardening: resource limits on row/byte materialization and
//! the wall-clock bound honored by graph-isomorphism comparison (spec
//! §5). Nothing here is part of the operator contract itself — these
//! are the guards a caller wires around it.

mod limits;
mod timeout;

pub use limits::{check_batch, estimate_row_bytes, MemoryTracker, ResourceLimits};
pub use timeout::{CancelHandle, QueryTimeout, TimeoutError};
