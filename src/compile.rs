//! End-to-end compilation from a design and a request to SQL.
//!
//! This module provides the high-level API:
//!
//! ```text
//! design JSON → Design ─┐
//!                       ├→ Query (join order) → HDA planner → SQL
//! request JSON ─────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use hda::compile::{compile_json, CompileOptions};
//! use hda::sql::Dialect;
//!
//! let design = std::fs::read_to_string("gitflix.design.json")?;
//! let request = r#"{"table": "users", "columns": ["gender"], "aggregates": ["count"]}"#;
//!
//! let options = CompileOptions::default().with_dialect(Dialect::Postgres);
//! let output = compile_json(&design, request, &options)?;
//! println!("{}", output.sql);
//! ```

use crate::config::{Settings, SettingsError};
use crate::error::HdaResult;
use crate::model::Design;
use crate::planner::HdaOutput;
use crate::query::{Query, QueryRequest};
use crate::sql::Dialect;

// ============================================================================
// Options
// ============================================================================

/// Options for compilation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileOptions {
    /// SQL dialect to generate.
    pub dialect: Dialect,

    /// Limit applied when the request has none.
    pub default_limit: Option<u64>,

    /// Upper bound for any limit, requested or default.
    pub max_limit: Option<u64>,
}

impl CompileOptions {
    /// Build options from loaded settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        Ok(Self {
            dialect: settings.sql.dialect_type()?,
            default_limit: settings.query.default_limit,
            max_limit: settings.query.max_limit,
        })
    }

    /// Set the SQL dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set the default limit.
    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = Some(limit);
        self
    }

    /// Set the maximum limit.
    pub fn with_max_limit(mut self, limit: u64) -> Self {
        self.max_limit = Some(limit);
        self
    }
}

// ============================================================================
// Compilation Functions
// ============================================================================

/// Compile a parsed request against a design.
pub fn compile(
    design: &Design,
    request: &QueryRequest,
    options: &CompileOptions,
) -> HdaResult<HdaOutput> {
    Query::new(design, request)?.hda_query_with(options)
}

/// Compile from the JSON design document and request payload.
///
/// The design is validated before the request is resolved.
pub fn compile_json(
    design_json: &str,
    request_json: &str,
    options: &CompileOptions,
) -> HdaResult<HdaOutput> {
    let design = Design::from_json(design_json)?;
    let request = QueryRequest::from_json(request_json)?;
    compile(&design, &request, options)
}
