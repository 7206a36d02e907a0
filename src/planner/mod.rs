//! SQL planner - turns a resolved [`Query`](crate::query::Query) into one
//! fan-out safe statement.
//!
//! Joining a table to a one-to-many child repeats the parent's rows, so a
//! plain `GROUP BY` over the join would over-count the parent's aggregates.
//! The planner computes every table's aggregates in its own CTE, over rows
//! made unique by that table's primary key, and joins the per-table results
//! back together on the requested dimensions.

pub mod hda;

pub use hda::{HdaOutput, HdaPlanner};
