//! Designs: a base table plus the joins reachable from it.

use inflector::Inflector;

use super::column::Column;
use super::document::DesignDocument;
use super::error::{EntityKind, ModelError, ModelResult};
use super::join::Join;
use super::table::Table;

/// The compiled schema of one analytical subject.
///
/// A design is immutable once loaded; queries borrow it.
#[derive(Debug, Clone, PartialEq)]
pub struct Design {
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    table: Table,
    /// In declaration order.
    joins: Vec<Join>,
}

impl Design {
    pub fn new(name: &str, table: Table) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_title_case(),
            description: None,
            table,
            joins: Vec::new(),
        }
    }

    /// Parse and validate a compiled design document.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let document: DesignDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Build and validate a design from its document form.
    pub fn from_document(document: DesignDocument) -> ModelResult<Self> {
        let design = document.into_design()?;
        design.validate()?;
        Ok(design)
    }

    fn scope(&self) -> String {
        format!("design '{}'", self.name)
    }

    /// The base table.
    pub fn base_table(&self) -> &Table {
        &self.table
    }

    pub fn add_join(&mut self, join: Join) -> ModelResult<()> {
        if join.name == self.table.name || self.joins.iter().any(|j| j.name == join.name) {
            return Err(ModelError::duplicate(
                EntityKind::Join,
                &join.name,
                &self.scope(),
            ));
        }
        self.joins.push(join);
        Ok(())
    }

    /// Base table followed by the table of every join.
    pub fn tables(&self) -> Vec<&Table> {
        std::iter::once(&self.table)
            .chain(self.joins.iter().map(|j| &j.table))
            .collect()
    }

    /// Joins in the order they were declared.
    pub fn joins(&self) -> impl Iterator<Item = &Join> {
        self.joins.iter()
    }

    pub fn get_table(&self, name: &str) -> ModelResult<&Table> {
        if self.table.name == name {
            return Ok(&self.table);
        }
        self.joins
            .iter()
            .find(|j| j.name == name)
            .map(|j| &j.table)
            .ok_or_else(|| ModelError::not_found(EntityKind::Table, name, &self.scope()))
    }

    pub fn get_join(&self, name: &str) -> ModelResult<&Join> {
        self.joins
            .iter()
            .find(|j| j.name == name)
            .ok_or_else(|| ModelError::not_found(EntityKind::Join, name, &self.scope()))
    }

    /// The `(left, right)` column pairs of a join condition.
    pub fn key_columns<'a>(&'a self, join: &'a Join) -> ModelResult<Vec<(&'a Column, &'a Column)>> {
        join.on
            .iter()
            .map(|key| -> ModelResult<(&Column, &Column)> {
                let left = self.get_table(&key.left.table)?.get_column(&key.left.column)?;
                let right = join.table.get_column(&key.right)?;
                Ok((left, right))
            })
            .collect()
    }

    /// Check that every key and primary key resolves.
    pub fn validate(&self) -> ModelResult<()> {
        let invalid = |message: String| ModelError::Invalid {
            design: self.name.clone(),
            message,
        };

        for table in self.tables() {
            table
                .primary_keys()
                .map_err(|e| invalid(format!("bad primary key: {}", e)))?;
        }

        for join in self.joins() {
            if join.on.is_empty() {
                return Err(invalid(format!("join '{}' has no join keys", join.name)));
            }
            if join.depends_on().any(|t| t == join.name) {
                return Err(invalid(format!("join '{}' is keyed on itself", join.name)));
            }
            self.key_columns(join)
                .map_err(|e| invalid(format!("join '{}': {}", join.name, e)))?;
        }

        log::debug!(
            "validated design '{}' ({} tables)",
            self.name,
            self.joins.len() + 1
        );
        Ok(())
    }
}
