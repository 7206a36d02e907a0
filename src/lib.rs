//! # hda
//!
//! Compiles analytics requests against a compiled data design into a single
//! fan-out safe SQL statement.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          Design document (JSON, trusted)                 │
//! │  (base table, joins, columns, aggregates, timeframes)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [model]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Design (Rust Types)                     │
//! └─────────────────────────────────────────────────────────┘
//!                          │  ◄── request payload (JSON)
//!                          ▼ [query::resolve]
//! ┌─────────────────────────────────────────────────────────┐
//! │         Query (join order, filters, order, limit)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [planner]
//! ┌─────────────────────────────────────────────────────────┐
//! │   base_join → base_<t> → <t>_stats → result (CTEs)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql]
//! ┌─────────────────────────────────────────────────────────┐
//! │        SQL text + column headers / names                 │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod compile;
pub mod config;
pub mod error;
pub mod model;
pub mod planner;
pub mod query;
pub mod sql;

// Re-export SQL submodules at crate level
pub use sql::dialect;
pub use sql::expr;
pub use sql::token;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compile::{compile, compile_json, CompileOptions};
    pub use crate::dialect::{Dialect, SqlDialect};
    pub use crate::error::{HdaError, HdaResult, StructuralError, ValidationError};
    pub use crate::model::{
        Aggregate, AggregateType, Cardinality, Column, ColumnRef, ColumnType, Design, Join,
        JoinKind, Table, TimePeriod, Timeframe,
    };
    pub use crate::planner::HdaOutput;
    pub use crate::query::{
        Direction, Filter, FilterExpression, JoinRequest, OrderRequest, Query, QueryRequest,
        TimeframeRequest,
    };
}

// Also export at crate root for convenience
pub use compile::{compile, compile_json, CompileOptions};
pub use dialect::Dialect;
pub use error::{HdaError, HdaResult};
pub use model::Design;
pub use planner::HdaOutput;
pub use query::{Query, QueryRequest};
