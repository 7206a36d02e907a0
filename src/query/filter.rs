//! Request filters.
//!
//! Column filters restrict the rows entering the base join. Aggregate filters
//! restrict the final result on computed aggregate values. Values always
//! become escaped SQL literals.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::sql::expr::{lit_bool, lit_float, lit_int, lit_str, BinaryOperator, Expr, ExprExt};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSet {
    pub columns: Vec<Filter>,
    pub aggregates: Vec<Filter>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.aggregates.is_empty()
    }
}

/// One predicate on a column or aggregate of a participating table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(alias = "table")]
    pub table_name: String,
    /// Column or aggregate name.
    #[serde(alias = "name")]
    pub key: String,
    pub expression: FilterExpression,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterExpression {
    EqualTo,
    NotEqualTo,
    GreaterThan,
    GreaterOrEqualThan,
    LessThan,
    LessOrEqualThan,
    Like,
    IsNull,
    IsNotNull,
}

impl FilterExpression {
    /// Build the predicate `target <op> value`.
    ///
    /// `column` names the target in error messages.
    pub fn apply(
        &self,
        target: Expr,
        value: Option<&Value>,
        column: &str,
    ) -> Result<Expr, ValidationError> {
        let invalid = |message: &str| ValidationError::InvalidFilter {
            column: column.to_string(),
            message: message.to_string(),
        };

        let op = match self {
            FilterExpression::IsNull => return Ok(target.is_null()),
            FilterExpression::IsNotNull => return Ok(target.is_not_null()),
            FilterExpression::EqualTo => BinaryOperator::Eq,
            FilterExpression::NotEqualTo => BinaryOperator::Ne,
            FilterExpression::GreaterThan => BinaryOperator::Gt,
            FilterExpression::GreaterOrEqualThan => BinaryOperator::Gte,
            FilterExpression::LessThan => BinaryOperator::Lt,
            FilterExpression::LessOrEqualThan => BinaryOperator::Lte,
            FilterExpression::Like => BinaryOperator::Like,
        };

        let value = match value {
            None | Some(Value::Null) => return Err(invalid("expression needs a value")),
            Some(v) => v,
        };

        let literal = match (self, value) {
            (FilterExpression::Like, Value::String(pattern)) => lit_str(pattern),
            (FilterExpression::Like, _) => return Err(invalid("like needs a string pattern")),
            _ => to_literal(value)
                .ok_or_else(|| invalid("value must be a string, number or boolean"))?,
        };
        Ok(target.binary(op, literal))
    }
}

fn to_literal(value: &Value) -> Option<Expr> {
    match value {
        Value::String(s) => Some(lit_str(s)),
        Value::Bool(b) => Some(lit_bool(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(lit_int(i)),
            None => n.as_f64().filter(|f| f.is_finite()).map(lit_float),
        },
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
