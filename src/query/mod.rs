//! Query requests and their resolution against a design.
//!
//! A [`QueryRequest`] is the deserialized JSON payload. [`Query::new`] checks
//! every name it mentions and produces the join order the planner works from.

pub mod attributes;
pub mod filter;
pub mod request;
pub mod resolve;

pub use attributes::{Attribute, AttributeRole, AttributeSet};
pub use filter::{Filter, FilterExpression, FilterSet};
pub use request::{
    Direction, JoinRequest, LimitValue, OrderRequest, QueryRequest, TimeframeRequest,
};
pub use resolve::{JoinOrderEntry, Query, ResolvedOrder};
