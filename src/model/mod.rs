//! Entity model: tables, their columns, aggregates and timeframes, and the
//! designs that join them together.
//!
//! Every entity keeps its children in a map keyed by name; lookups return a
//! typed [`ModelError::NotFound`] instead of panicking.

pub mod aggregate;
pub mod column;
pub mod design;
pub mod document;
pub mod error;
pub mod join;
pub mod table;
pub mod template;
pub mod timeframe;
pub mod types;

pub use aggregate::Aggregate;
pub use column::Column;
pub use design::Design;
pub use document::{
    AggregateDocument, ColumnDocument, DesignDocument, JoinDocument, JoinKeyDocument,
    TableDocument, TimeframeDocument,
};
pub use error::{EntityKind, ModelError, ModelResult};
pub use join::{ColumnRef, Join, JoinKey};
pub use table::Table;
pub use template::SqlTemplate;
pub use timeframe::Timeframe;
pub use types::{AggregateType, Cardinality, ColumnType, JoinKind, TimePeriod};
