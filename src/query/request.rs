//! The request payload, parsed eagerly into typed values.
//!
//! Fields the compiler does not know (`run`, UI state, ...) are ignored.

use serde::{Deserialize, Serialize};

use super::filter::FilterSet;
use crate::error::ValidationError;
use crate::model::TimePeriod;
use crate::sql::query::SortDir;

/// An analytical request against one design.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryRequest {
    /// Name of the base table. Must be the design's base table.
    pub table: String,
    pub columns: Vec<String>,
    pub aggregates: Vec<String>,
    pub timeframes: Vec<TimeframeRequest>,
    pub joins: Vec<JoinRequest>,
    pub order: Option<OrderRequest>,
    pub limit: Option<LimitValue>,
    pub filters: FilterSet,
}

impl QueryRequest {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Default::default()
        }
    }

    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_aggregates(mut self, aggregates: &[&str]) -> Self {
        self.aggregates = aggregates.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_join(mut self, join: JoinRequest) -> Self {
        self.joins.push(join);
        self
    }
}

/// Columns and aggregates requested from one joined table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinRequest {
    pub name: String,
    pub columns: Vec<String>,
    pub aggregates: Vec<String>,
    pub timeframes: Vec<TimeframeRequest>,
}

impl JoinRequest {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_aggregates(mut self, aggregates: &[&str]) -> Self {
        self.aggregates = aggregates.iter().map(|a| a.to_string()).collect();
        self
    }
}

/// A timeframe cut into one or more periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeRequest {
    pub name: String,
    #[serde(default)]
    pub periods: Vec<TimePeriod>,
}

/// `"count"`, `"users.count"` or `{"column": "count", "direction": "desc"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderRequest {
    Name(String),
    Spec {
        column: String,
        #[serde(default)]
        direction: Direction,
    },
}

impl OrderRequest {
    pub fn column(&self) -> &str {
        match self {
            OrderRequest::Name(name) => name,
            OrderRequest::Spec { column, .. } => column,
        }
    }

    pub fn direction(&self) -> SortDir {
        match self {
            OrderRequest::Name(_) => SortDir::Asc,
            OrderRequest::Spec { direction, .. } => (*direction).into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl From<Direction> for SortDir {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Asc => SortDir::Asc,
            Direction::Desc => SortDir::Desc,
        }
    }
}

/// Row limit, sent either as a number or as a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LimitValue {
    Number(i64),
    Text(String),
}

impl LimitValue {
    /// The limit as a positive row count.
    pub fn rows(&self) -> Result<u64, ValidationError> {
        let parsed = match self {
            LimitValue::Number(n) => Some(*n),
            LimitValue::Text(s) => s.trim().parse::<i64>().ok(),
        };
        match parsed {
            Some(n) if n > 0 => Ok(n as u64),
            _ => Err(ValidationError::InvalidLimit(self.to_string())),
        }
    }
}

impl std::fmt::Display for LimitValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitValue::Number(n) => write!(f, "{}", n),
            LimitValue::Text(s) => f.write_str(s),
        }
    }
}
