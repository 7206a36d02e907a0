//! Errors raised by the entity model.

use thiserror::Error;

/// The kind of model entity a lookup or mutation was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Design,
    Table,
    Column,
    Aggregate,
    Timeframe,
    Period,
    Join,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntityKind::Design => "design",
            EntityKind::Table => "table",
            EntityKind::Column => "column",
            EntityKind::Aggregate => "aggregate",
            EntityKind::Timeframe => "timeframe",
            EntityKind::Period => "period",
            EntityKind::Join => "join",
        };
        write!(f, "{}", s)
    }
}

/// Errors from looking up, adding or loading model entities.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("{kind} '{name}' not found in {scope}")]
    NotFound {
        kind: EntityKind,
        name: String,
        scope: String,
    },

    #[error("duplicate {kind} '{name}' in {scope}")]
    Duplicate {
        kind: EntityKind,
        name: String,
        scope: String,
    },

    #[error("invalid design '{design}': {message}")]
    Invalid { design: String, message: String },

    #[error("failed to parse design document: {0}")]
    Parse(String),
}

impl ModelError {
    pub(crate) fn not_found(kind: EntityKind, name: &str, scope: &str) -> Self {
        ModelError::NotFound {
            kind,
            name: name.to_string(),
            scope: scope.to_string(),
        }
    }

    pub(crate) fn duplicate(kind: EntityKind, name: &str, scope: &str) -> Self {
        ModelError::Duplicate {
            kind,
            name: name.to_string(),
            scope: scope.to_string(),
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Parse(err.to_string())
    }
}

pub type ModelResult<T> = Result<T, ModelError>;
