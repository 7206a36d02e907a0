//! Dimension columns.

use inflector::Inflector;

use super::template::SqlTemplate;
use super::types::{ColumnType, TimePeriod};
use crate::sql::expr::Expr;

/// A dimension column of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Name of the owning table (the name it is referenced by in SQL).
    pub table: String,
    pub name: String,
    pub column_type: ColumnType,
    pub sql: SqlTemplate,
    pub label: String,
    pub description: Option<String>,
    pub hidden: bool,
    /// Time bucket applied on top of `sql`, set for timeframe period columns.
    pub period: Option<TimePeriod>,
}

impl Column {
    /// A string column reading `{{table}}.<name>`, labelled after its name.
    pub fn new(table: &str, name: &str) -> Self {
        Self {
            table: table.to_string(),
            name: name.to_string(),
            column_type: ColumnType::default(),
            sql: SqlTemplate::for_column(name),
            label: name.to_title_case(),
            description: None,
            hidden: false,
            period: None,
        }
    }

    pub fn column_name(&self) -> &str {
        &self.name
    }

    /// `<table>.<name>`, unique within one compiled query.
    pub fn alias(&self) -> String {
        format!("{}.{}", self.table, self.name)
    }

    /// Take type, sql, label and description from `source`.
    ///
    /// The name and owning table are left untouched.
    pub fn copy_metadata(&mut self, source: &Column) {
        self.column_type = source.column_type;
        self.sql = source.sql.clone();
        self.label = source.label.clone();
        self.description = source.description.clone();
        self.period = source.period;
    }

    /// The column's SQL with the owning table substituted.
    pub fn expr(&self) -> Expr {
        let base = self.sql.render(&self.table);
        match self.period {
            Some(period) => period.apply(base),
            None => base,
        }
    }
}
