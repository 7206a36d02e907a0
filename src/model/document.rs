//! Serialized form of a compiled design.
//!
//! The model compiler hands over one JSON document per design. These types
//! mirror that document and convert into the entity model. Unknown fields
//! are ignored.

use serde::{Deserialize, Serialize};

use super::aggregate::Aggregate;
use super::column::Column;
use super::design::Design;
use super::error::{ModelError, ModelResult};
use super::join::{ColumnRef, Join};
use super::table::Table;
use super::template::SqlTemplate;
use super::timeframe::Timeframe;
use super::types::{AggregateType, Cardinality, ColumnType, JoinKind, TimePeriod};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignDocument {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub table: TableDocument,
    #[serde(default)]
    pub joins: Vec<JoinDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDocument {
    pub name: String,
    #[serde(default)]
    pub sql_table_name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub columns: Vec<ColumnDocument>,
    #[serde(default)]
    pub aggregates: Vec<AggregateDocument>,
    #[serde(default)]
    pub timeframes: Vec<TimeframeDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDocument {
    pub name: String,
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
    #[serde(default)]
    pub sql: Option<SqlTemplate>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    /// Shorthand for listing the column in the table's `primary_key`.
    #[serde(default)]
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub aggregate_type: AggregateType,
    #[serde(default)]
    pub sql: Option<SqlTemplate>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeDocument {
    pub name: String,
    #[serde(default)]
    pub sql: Option<SqlTemplate>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub periods: Vec<TimePeriod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinDocument {
    pub name: String,
    #[serde(default)]
    pub relationship: Cardinality,
    #[serde(default)]
    pub kind: JoinKind,
    pub on: Vec<JoinKeyDocument>,
    pub table: TableDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinKeyDocument {
    /// `<table>.<column>` on the base table or an earlier join.
    pub left: String,
    /// Column of the joined table.
    pub right: String,
}

impl DesignDocument {
    /// Convert into the entity model without cross-entity validation.
    pub fn into_design(self) -> ModelResult<Design> {
        let mut design = Design::new(&self.name, self.table.into_table()?);
        if let Some(label) = self.label {
            design.label = label;
        }
        design.description = self.description;

        for join in self.joins {
            let mut entity = Join::new(&join.name, join.table.into_table()?, join.relationship)
                .with_kind(join.kind);
            for key in join.on {
                let left = ColumnRef::parse(&key.left).ok_or_else(|| ModelError::Invalid {
                    design: self.name.clone(),
                    message: format!(
                        "join '{}' key '{}' must be written as <table>.<column>",
                        join.name, key.left
                    ),
                })?;
                entity = entity.with_key(left, &key.right);
            }
            design.add_join(entity)?;
        }

        Ok(design)
    }
}

impl TableDocument {
    pub fn into_table(self) -> ModelResult<Table> {
        let mut table = Table::new(&self.name);
        table.sql_table_name = self.sql_table_name;
        if let Some(label) = self.label {
            table.label = label;
        }
        table.description = self.description;
        table.primary_key = self.primary_key;

        for doc in self.columns {
            let mut column = Column::new(&self.name, &doc.name);
            column.column_type = doc.column_type;
            if let Some(sql) = doc.sql {
                column.sql = sql;
            }
            if let Some(label) = doc.label {
                column.label = label;
            }
            column.description = doc.description;
            column.hidden = doc.hidden;
            if doc.primary_key && !table.primary_key.contains(&doc.name) {
                table.primary_key.push(doc.name.clone());
            }
            table.add_column(column)?;
        }

        for doc in self.aggregates {
            let mut aggregate = Aggregate::new(&self.name, &doc.name, doc.aggregate_type);
            if let Some(sql) = doc.sql {
                aggregate.sql = sql;
            }
            if let Some(label) = doc.label {
                aggregate.label = label;
            }
            aggregate.description = doc.description;
            table.add_aggregate(aggregate)?;
        }

        for doc in self.timeframes {
            let mut timeframe = Timeframe::new(&self.name, &doc.name);
            if let Some(sql) = doc.sql {
                timeframe.sql = sql;
            }
            if let Some(label) = doc.label {
                timeframe.label = label;
            }
            timeframe.description = doc.description;
            timeframe.periods = doc.periods;
            table.add_timeframe(timeframe)?;
        }

        Ok(table)
    }
}
