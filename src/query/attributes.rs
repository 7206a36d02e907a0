//! Attributes fetched by the base join.
//!
//! Each attribute is one aliased select item of `base_join`. The same raw
//! column can be needed for several reasons (a dimension that is also a join
//! key, say); it is fetched once and remembers every role.

use crate::model::{Aggregate, Column};
use crate::sql::expr::Expr;

/// Why an attribute is part of the base join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeRole {
    /// Requested grouping column.
    Dimension,
    /// Raw input of a requested aggregate.
    AggregateSource,
    /// Column used in a join condition.
    JoinKey,
    /// Primary key column of a staged table.
    Identity,
}

/// One aliased column of the base join.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub table: String,
    pub name: String,
    /// `<table>.<name>`, unique within the base join.
    pub alias: String,
    pub expr: Expr,
    pub roles: Vec<AttributeRole>,
}

impl Attribute {
    pub fn from_column(column: &Column, role: AttributeRole) -> Self {
        Self {
            table: column.table.clone(),
            name: column.name.clone(),
            alias: column.alias(),
            expr: column.expr(),
            roles: vec![role],
        }
    }

    pub fn from_aggregate(aggregate: &Aggregate) -> Self {
        Self {
            table: aggregate.table.clone(),
            name: aggregate.source_column(),
            alias: aggregate.column_alias(),
            expr: aggregate.source_expr(),
            roles: vec![AttributeRole::AggregateSource],
        }
    }

    pub fn has_role(&self, role: AttributeRole) -> bool {
        self.roles.contains(&role)
    }
}

/// Insertion-ordered set of attributes, unique by alias.
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
    attributes: Vec<Attribute>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute. An alias that is already present keeps its first
    /// definition and gains the new roles.
    pub fn insert(&mut self, attribute: Attribute) {
        match self.attributes.iter_mut().find(|a| a.alias == attribute.alias) {
            Some(existing) => {
                for role in attribute.roles {
                    if !existing.roles.contains(&role) {
                        existing.roles.push(role);
                    }
                }
            }
            None => self.attributes.push(attribute),
        }
    }

    pub fn get(&self, alias: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.alias == alias)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.get(alias).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    /// Attributes of one table, in insertion order.
    pub fn for_table<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a Attribute> {
        self.attributes.iter().filter(move |a| a.table == table)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
