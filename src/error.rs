//! Crate-level error type for query compilation.
//!
//! Every failure is raised before any SQL text is rendered: compilation
//! either produces a complete statement or one of these errors.

use thiserror::Error;

use crate::model::{EntityKind, ModelError};

/// A request that is well-formed JSON but cannot be compiled as asked.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("request selects no columns, timeframes or aggregates")]
    EmptyRequest,

    #[error("join '{0}' is requested more than once")]
    DuplicateJoin(String),

    #[error("limit must be a positive integer, got '{0}'")]
    InvalidLimit(String),

    #[error("cannot order by '{0}': it is not part of the result")]
    UnknownOrder(String),

    #[error("filter on '{table}' but that table is not part of the query")]
    FilterOutsideQuery { table: String },

    #[error("aggregate filter on '{0}' but that aggregate is not requested")]
    UnrequestedAggregate(String),

    #[error("filter on '{column}': {message}")]
    InvalidFilter { column: String, message: String },
}

/// A request whose shape cannot be turned into a fan-out safe statement.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StructuralError {
    #[error("join '{join}' hangs off '{requires}', which is not joined before it")]
    JoinOutOfOrder { join: String, requires: String },

    #[error("join '{0}' has no join keys")]
    MissingJoinKey(String),

    #[error("table '{0}' needs a primary key to aggregate it without fan-out")]
    MissingPrimaryKey(String),

    #[error("stage name '{0}' is produced twice")]
    StageNameCollision(String),

    #[error("alias '{0}' is bound to two different expressions")]
    AliasCollision(String),

    #[error("result column '{0}' is produced twice")]
    DuplicateResultColumn(String),
}

/// Errors from compiling a request against a design.
#[derive(Debug, Error)]
pub enum HdaError {
    #[error("{kind} '{name}' not found in {scope}")]
    NotFound {
        kind: EntityKind,
        name: String,
        scope: String,
    },

    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("cannot build query: {0}")]
    Structural(#[from] StructuralError),

    #[error("design error: {0}")]
    Model(ModelError),

    #[error("failed to parse request: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<ModelError> for HdaError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::NotFound { kind, name, scope } => HdaError::NotFound { kind, name, scope },
            other => HdaError::Model(other),
        }
    }
}

pub type HdaResult<T> = Result<T, HdaError>;
