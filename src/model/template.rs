//! `{{table}}` SQL templates.
//!
//! Column, aggregate and timeframe definitions carry a SQL fragment in which
//! `{{table}}` stands for the owning table. Substitution is structural: the
//! placeholder (and a directly following `.column`) become quoted identifier
//! expressions, everything else is kept verbatim.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::sql::expr::{col, raw_sql, table_col, Expr};

/// `{{table}}` with an optional `.identifier` suffix.
static TABLE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*table\s*\}\}(?:\.([A-Za-z_][A-Za-z0-9_]*))?").unwrap()
});

/// A SQL fragment with `{{table}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqlTemplate(String);

impl SqlTemplate {
    pub fn new(sql: impl Into<String>) -> Self {
        SqlTemplate(sql.into())
    }

    /// The template reading column `name` of the owning table.
    pub fn for_column(name: &str) -> Self {
        SqlTemplate(format!("{{{{table}}}}.{}", name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The column read when the template is exactly `{{table}}.<column>`.
    pub fn simple_column(&self) -> Option<&str> {
        let sql = self.0.trim();
        let caps = TABLE_PLACEHOLDER.captures(sql)?;
        let whole = caps.get(0)?;
        if whole.start() != 0 || whole.end() != sql.len() {
            return None;
        }
        caps.get(1).map(|m| m.as_str())
    }

    /// Whether the template mentions `{{table}}` at all.
    pub fn references_table(&self) -> bool {
        TABLE_PLACEHOLDER.is_match(&self.0)
    }

    /// Substitute `table` and return the resulting expression.
    ///
    /// `{{table}}.x` becomes `"table"."x"` and a bare `{{table}}` becomes
    /// `"table"`.
    pub fn render(&self, table: &str) -> Expr {
        if let Some(column) = self.simple_column() {
            return table_col(table, column);
        }

        let sql = self.0.trim();
        let mut parts = Vec::new();
        let mut last = 0;
        for caps in TABLE_PLACEHOLDER.captures_iter(sql) {
            let Some(whole) = caps.get(0) else { continue };
            if whole.start() > last {
                parts.push(raw_sql(&sql[last..whole.start()]));
            }
            parts.push(match caps.get(1) {
                Some(column) => table_col(table, column.as_str()),
                None => col(table),
            });
            last = whole.end();
        }
        if last < sql.len() {
            parts.push(raw_sql(&sql[last..]));
        }

        match parts.len() {
            1 => parts.remove(0),
            _ => Expr::Template(parts),
        }
    }
}

impl From<&str> for SqlTemplate {
    fn from(sql: &str) -> Self {
        SqlTemplate::new(sql)
    }
}

impl std::fmt::Display for SqlTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
