//! Tables: the owners of columns, aggregates and timeframes.

use std::collections::BTreeMap;

use inflector::Inflector;

use super::aggregate::Aggregate;
use super::column::Column;
use super::error::{EntityKind, ModelError, ModelResult};
use super::timeframe::Timeframe;
use crate::sql::query::TableRef;

/// A table of the design.
///
/// `name` is the name the table is referenced by in requests and in the
/// generated SQL. For joined tables it is the join name.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    /// Physical `schema.table` when it differs from `name`.
    pub sql_table_name: Option<String>,
    pub label: String,
    pub description: Option<String>,
    /// Primary key column names, in key order.
    pub primary_key: Vec<String>,
    columns: BTreeMap<String, Column>,
    aggregates: BTreeMap<String, Aggregate>,
    timeframes: BTreeMap<String, Timeframe>,
}

impl Table {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sql_table_name: None,
            label: name.to_title_case(),
            description: None,
            primary_key: Vec::new(),
            columns: BTreeMap::new(),
            aggregates: BTreeMap::new(),
            timeframes: BTreeMap::new(),
        }
    }

    pub fn with_sql_table_name(mut self, sql_table_name: &str) -> Self {
        self.sql_table_name = Some(sql_table_name.to_string());
        self
    }

    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    fn scope(&self) -> String {
        format!("table '{}'", self.name)
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Add a column. The column is re-owned by this table.
    pub fn add_column(&mut self, mut column: Column) -> ModelResult<()> {
        if self.columns.contains_key(&column.name) {
            return Err(ModelError::duplicate(
                EntityKind::Column,
                &column.name,
                &self.scope(),
            ));
        }
        column.table = self.name.clone();
        self.columns.insert(column.name.clone(), column);
        Ok(())
    }

    pub fn get_column(&self, name: &str) -> ModelResult<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| ModelError::not_found(EntityKind::Column, name, &self.scope()))
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    /// The primary key columns, in key order.
    pub fn primary_keys(&self) -> ModelResult<Vec<&Column>> {
        self.primary_key
            .iter()
            .map(|name| self.get_column(name))
            .collect()
    }

    // =========================================================================
    // Aggregates
    // =========================================================================

    pub fn add_aggregate(&mut self, mut aggregate: Aggregate) -> ModelResult<()> {
        if self.aggregates.contains_key(&aggregate.name) {
            return Err(ModelError::duplicate(
                EntityKind::Aggregate,
                &aggregate.name,
                &self.scope(),
            ));
        }
        aggregate.table = self.name.clone();
        self.aggregates.insert(aggregate.name.clone(), aggregate);
        Ok(())
    }

    pub fn get_aggregate(&self, name: &str) -> ModelResult<&Aggregate> {
        self.aggregates
            .get(name)
            .ok_or_else(|| ModelError::not_found(EntityKind::Aggregate, name, &self.scope()))
    }

    pub fn aggregates(&self) -> impl Iterator<Item = &Aggregate> {
        self.aggregates.values()
    }

    // =========================================================================
    // Timeframes
    // =========================================================================

    pub fn add_timeframe(&mut self, mut timeframe: Timeframe) -> ModelResult<()> {
        if self.timeframes.contains_key(&timeframe.name) {
            return Err(ModelError::duplicate(
                EntityKind::Timeframe,
                &timeframe.name,
                &self.scope(),
            ));
        }
        timeframe.table = self.name.clone();
        self.timeframes.insert(timeframe.name.clone(), timeframe);
        Ok(())
    }

    pub fn get_timeframe(&self, name: &str) -> ModelResult<&Timeframe> {
        self.timeframes
            .get(name)
            .ok_or_else(|| ModelError::not_found(EntityKind::Timeframe, name, &self.scope()))
    }

    pub fn timeframes(&self) -> impl Iterator<Item = &Timeframe> {
        self.timeframes.values()
    }

    // =========================================================================
    // SQL
    // =========================================================================

    /// FROM/JOIN reference: the physical table aliased to `name` when they differ.
    pub fn table_ref(&self) -> TableRef {
        let physical = self.sql_table_name.as_deref().unwrap_or(&self.name);
        let table = TableRef::parse(physical);
        if table.schema.is_some() || table.table != self.name {
            table.with_alias(&self.name)
        } else {
            table
        }
    }

    /// Rename the table, re-owning every attribute.
    pub(crate) fn rename(&mut self, name: &str) {
        if self.sql_table_name.is_none() && self.name != name {
            self.sql_table_name = Some(self.name.clone());
        }
        self.name = name.to_string();
        for column in self.columns.values_mut() {
            column.table = name.to_string();
        }
        for aggregate in self.aggregates.values_mut() {
            aggregate.table = name.to_string();
        }
        for timeframe in self.timeframes.values_mut() {
            timeframe.table = name.to_string();
        }
    }
}
