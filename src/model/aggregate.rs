//! Aggregates: named aggregation functions over a table attribute.

use inflector::Inflector;

use super::template::SqlTemplate;
use super::types::AggregateType;
use crate::sql::expr::{coalesce, col, lit_int, Expr};

/// An aggregate of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    /// Name of the owning table.
    pub table: String,
    pub name: String,
    pub aggregate_type: AggregateType,
    pub sql: SqlTemplate,
    pub label: String,
    pub description: Option<String>,
}

impl Aggregate {
    pub fn new(table: &str, name: &str, aggregate_type: AggregateType) -> Self {
        Self {
            table: table.to_string(),
            name: name.to_string(),
            aggregate_type,
            sql: SqlTemplate::for_column(name),
            label: name.to_title_case(),
            description: None,
        }
    }

    pub fn column_name(&self) -> &str {
        &self.name
    }

    /// `<table>.<name>`
    pub fn alias(&self) -> String {
        format!("{}.{}", self.table, self.name)
    }

    /// Name of the raw attribute this aggregate reads.
    ///
    /// `{{table}}.minutes` reads `minutes`. Any other template is fetched as
    /// a computed attribute named `<name>_input`.
    pub fn source_column(&self) -> String {
        match self.sql.simple_column() {
            Some(column) => column.to_string(),
            None => format!("{}_input", self.name),
        }
    }

    /// `<table>.<source_column>`, the alias of the attribute in `base_join`.
    pub fn column_alias(&self) -> String {
        format!("{}.{}", self.table, self.source_column())
    }

    /// Expression producing the raw attribute in the base join.
    pub fn source_expr(&self) -> Expr {
        self.sql.render(&self.table)
    }

    /// `COALESCE(<FN>("<source>"),0)` over a stage that exposes the raw
    /// input under the alias `source`, usually [`Aggregate::column_alias`].
    pub fn stats_expr(&self, source: &str) -> Expr {
        coalesce(vec![self.aggregate_type.apply(col(source)), lit_int(0)])
    }

    /// Take type, sql, label and description from `source`.
    pub fn copy_metadata(&mut self, source: &Aggregate) {
        self.aggregate_type = source.aggregate_type;
        self.sql = source.sql.clone();
        self.label = source.label.clone();
        self.description = source.description.clone();
    }
}
