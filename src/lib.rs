//! # Rowsource Execution Engine
//!
//! A streaming, pull-based operator tree for evaluating query-algebra
//! plans, plus the two subsystems built directly on top of it: a
//! grouped/aggregated execution layer and a results comparison engine.
//!
//! ## Pipeline Architecture
//!
//! ```text
//!              ┌──────────────┐
//!              │   RowSource  │   init / ensure_variables / read_row
//!              │  (operator   │   reset / set_requirements
//!              │    tree)     │   get_inner_rowsource / set_origin
//!              └──────┬───────┘
//!                     │ pull, one row at a time
//!       ┌─────────────┼─────────────────────────┐
//!       │             │                         │
//! ┌─────▼─────┐ ┌─────▼─────┐           ┌───────▼───────┐
//! │  Project  │ │  Filter   │    ...    │    GroupBy     │
//! │  Slice    │ │  Union    │           │   Aggregate    │
//! │  Join     │ │  Graph    │           │ (batches, then │
//! │ (in-order)│ │           │           │  streams again)│
//! └───────────┘ └───────────┘           └────────────────┘
//!                     │
//!              ┌──────▼───────┐
//!              │   Dataset    │   triples backing Graph leaves
//!              └──────────────┘
//! ```
//!
//! Every node is one variant of the [`rowsource::RowSource`] enum rather
//! than a trait object: the operator set is closed (spec §9), so a sum
//! type gives exhaustiveness checking at each call site instead of
//! open-ended dynamic dispatch. [`rowsource::RowSourceOp`] is the shared
//! contract every variant implements.
//!
//! Two subsystems sit downstream of the pipeline rather than inside it:
//! [`results`] models what a finished query produces (booleans, bindings,
//! graphs) and how to read that back in from SPARQL-Results-JSON;
//! [`comparison`] decides whether two such results are equal under a
//! configurable policy, including blank-node matching and
//! graph-isomorphism dispatch.

pub mod comparison;
pub mod config;
pub mod dataset;
pub mod error;
pub mod execution;
pub mod expr;
pub mod literal;
pub mod logging;
pub mod results;
pub mod row;
pub mod rowsource;
pub mod scope;
pub mod triple;
pub mod variable;

pub use config::Config;
pub use error::{DateTimeParseError, Difference, ResourceError, ResultsError, RowSourceError, TypeError};
pub use literal::{CompareFlags, Literal};
pub use results::QueryResult;
pub use row::Row;
pub use rowsource::{RowSource, RowSourceOp};
pub use scope::{QueryScope, ScopeRegion};
pub use triple::Triple;
pub use variable::{Variable, VariablesTable};
