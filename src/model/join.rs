//! Joins between the base table and related tables.

use super::table::Table;
use super::types::{Cardinality, JoinKind};

/// A `<table>.<column>` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: &str, column: &str) -> Self {
        Self {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    /// Parse `table.column`. `None` when the reference is not qualified.
    pub fn parse(s: &str) -> Option<Self> {
        let (table, column) = s.trim().split_once('.')?;
        if table.is_empty() || column.is_empty() {
            return None;
        }
        Some(Self::new(table, column))
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// One equality of a join condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinKey {
    /// Column of a table that participates before the joined table.
    pub left: ColumnRef,
    /// Column of the joined table.
    pub right: String,
}

/// A related table reachable from the base table.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Name used in requests and as the SQL alias of the joined table.
    pub name: String,
    pub table: Table,
    pub relationship: Cardinality,
    pub kind: JoinKind,
    pub on: Vec<JoinKey>,
}

impl Join {
    /// Create a join. The joined table is renamed to the join name.
    pub fn new(name: &str, mut table: Table, relationship: Cardinality) -> Self {
        table.rename(name);
        Self {
            name: name.to_string(),
            table,
            relationship,
            kind: JoinKind::default(),
            on: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: JoinKind) -> Self {
        self.kind = kind;
        self
    }

    /// Add `left = <join>.right` to the join condition.
    pub fn with_key(mut self, left: ColumnRef, right: &str) -> Self {
        self.on.push(JoinKey {
            left,
            right: right.to_string(),
        });
        self
    }

    /// Tables this join hangs off.
    pub fn depends_on(&self) -> impl Iterator<Item = &str> {
        self.on.iter().map(|key| key.left.table.as_str())
    }
}
