//! Timeframes: time attributes that are requested through period buckets.

use inflector::Inflector;

use super::column::Column;
use super::error::{EntityKind, ModelError, ModelResult};
use super::template::SqlTemplate;
use super::types::{ColumnType, TimePeriod};

#[derive(Debug, Clone, PartialEq)]
pub struct Timeframe {
    pub table: String,
    pub name: String,
    pub sql: SqlTemplate,
    pub label: String,
    pub description: Option<String>,
    /// Allowed periods. Empty means every period.
    pub periods: Vec<TimePeriod>,
}

impl Timeframe {
    pub fn new(table: &str, name: &str) -> Self {
        Self {
            table: table.to_string(),
            name: name.to_string(),
            sql: SqlTemplate::for_column(name),
            label: name.to_title_case(),
            description: None,
            periods: Vec::new(),
        }
    }

    pub fn supports(&self, period: TimePeriod) -> bool {
        self.periods.is_empty() || self.periods.contains(&period)
    }

    /// The unbucketed time value as a column named after the timeframe.
    pub fn raw_column(&self) -> Column {
        let mut column = Column::new(&self.table, &self.name);
        column.column_type = ColumnType::Time;
        column.sql = self.sql.clone();
        column.label = self.label.clone();
        column.description = self.description.clone();
        column
    }

    /// Derive the dimension column `<timeframe>_<period>`.
    pub fn period_column(&self, period: TimePeriod) -> ModelResult<Column> {
        if !self.supports(period) {
            return Err(ModelError::not_found(
                EntityKind::Period,
                period.as_str(),
                &format!("timeframe '{}.{}'", self.table, self.name),
            ));
        }

        let mut column = Column::new(&self.table, &format!("{}_{}", self.name, period));
        column.copy_metadata(&self.raw_column());
        column.column_type = period.column_type();
        column.label = format!("{} {}", self.label, period.as_str().to_title_case());
        column.period = Some(period);
        Ok(column)
    }
}
