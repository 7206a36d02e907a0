//! SQL generation module.
//!
//! A small type-safe SQL builder. Stages are assembled as [`query::Query`]
//! values and rendered once, so quoting and layout rules live in one place.
//!
//! - [`query`] - SELECT / CTE builder
//! - [`expr`] - Expression AST and builder DSL
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations
//! - [`validate`] - sqlparser-backed syntax check of emitted SQL

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;
pub mod validate;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    and_all, avg, cast, coalesce, col, count, count_distinct, extract, func, lit_bool, lit_float,
    lit_int, lit_null, lit_str, max, min, raw_sql, star, sum, table_col, BinaryOperator, Expr,
    ExprExt, Literal, UnaryOperator,
};
pub use query::{
    Cte, Join, JoinType, LimitOffset, OrderByExpr, Query, SelectExpr, SortDir, TableRef,
};
pub use token::{Token, TokenStream};
