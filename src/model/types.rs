//! Closed enumerations used by the entity model.

use serde::{Deserialize, Serialize};

use crate::sql::expr::{avg, cast, count, count_distinct, extract, max, min, sum, Expr};
use crate::sql::query::JoinType;

/// Value type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    #[default]
    String,
    #[serde(alias = "integer", alias = "decimal", alias = "float")]
    Number,
    Date,
    #[serde(alias = "timestamp", alias = "datetime")]
    Time,
    #[serde(alias = "bool")]
    Boolean,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Number => "number",
            ColumnType::Date => "date",
            ColumnType::Time => "time",
            ColumnType::Boolean => "boolean",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregation function of an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateType {
    Count,
    CountDistinct,
    Sum,
    #[serde(alias = "average", alias = "mean")]
    Avg,
    Min,
    Max,
}

impl AggregateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateType::Count => "count",
            AggregateType::CountDistinct => "count_distinct",
            AggregateType::Sum => "sum",
            AggregateType::Avg => "avg",
            AggregateType::Min => "min",
            AggregateType::Max => "max",
        }
    }

    /// Wrap `input` in this aggregation function.
    pub fn apply(&self, input: Expr) -> Expr {
        match self {
            AggregateType::Count => count(input),
            AggregateType::CountDistinct => count_distinct(input),
            AggregateType::Sum => sum(input),
            AggregateType::Avg => avg(input),
            AggregateType::Min => min(input),
            AggregateType::Max => max(input),
        }
    }
}

impl std::fmt::Display for AggregateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cardinality of a join, seen from the table it is joined onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Each left row matches any number of joined rows.
    #[default]
    OneToMany,
    /// Many left rows share one joined row.
    ManyToOne,
    /// At most one joined row per left row and vice versa.
    OneToOne,
}

impl Cardinality {
    /// Whether joining multiplies the rows of the left side.
    pub fn fans_out(&self) -> bool {
        matches!(self, Cardinality::OneToMany)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::OneToMany => "one_to_many",
            Cardinality::ManyToOne => "many_to_one",
            Cardinality::OneToOne => "one_to_one",
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SQL join flavour used in the base join stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    #[default]
    Left,
    Inner,
}

impl From<JoinKind> for JoinType {
    fn from(kind: JoinKind) -> Self {
        match kind {
            JoinKind::Left => JoinType::Left,
            JoinKind::Inner => JoinType::Inner,
        }
    }
}

/// Bucket a timeframe can be cut into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePeriod {
    Date,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
    #[serde(alias = "dow")]
    DayOfWeek,
}

impl TimePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::Date => "date",
            TimePeriod::Hour => "hour",
            TimePeriod::Day => "day",
            TimePeriod::Week => "week",
            TimePeriod::Month => "month",
            TimePeriod::Quarter => "quarter",
            TimePeriod::Year => "year",
            TimePeriod::DayOfWeek => "day_of_week",
        }
    }

    /// Type of the values produced by [`TimePeriod::apply`].
    pub fn column_type(&self) -> ColumnType {
        match self {
            TimePeriod::Date => ColumnType::Date,
            _ => ColumnType::Number,
        }
    }

    /// Bucket a time expression into this period.
    pub fn apply(&self, input: Expr) -> Expr {
        match self {
            TimePeriod::Date => cast(input, "date"),
            TimePeriod::Hour => extract("hour", input),
            TimePeriod::Day => extract("day", input),
            TimePeriod::Week => extract("week", input),
            TimePeriod::Month => extract("month", input),
            TimePeriod::Quarter => extract("quarter", input),
            TimePeriod::Year => extract("year", input),
            TimePeriod::DayOfWeek => extract("dow", input),
        }
    }
}

impl std::fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
