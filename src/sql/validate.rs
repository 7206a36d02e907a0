//! Syntax validation of emitted SQL.
//!
//! Generated queries are re-parsed with sqlparser-rs so that a rendering
//! regression surfaces as an error instead of a database round trip. Used by
//! the test suites and by `hda compile --check`.

use sqlparser::dialect::{DuckDbDialect, GenericDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;

use super::dialect::Dialect;

/// Validates that a SQL string is syntactically valid for the given dialect.
///
/// ```ignore
/// use hda::sql::validate::validate_sql;
/// use hda::sql::Dialect;
///
/// validate_sql("SELECT * FROM \"result\"", Dialect::Postgres).unwrap();
/// ```
pub fn validate_sql(sql: &str, dialect: Dialect) -> Result<(), String> {
    let parser_dialect: Box<dyn sqlparser::dialect::Dialect> = match dialect {
        Dialect::Ansi => Box::new(GenericDialect {}), // sqlparser has no strict ANSI dialect
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::DuckDb => Box::new(DuckDbDialect {}),
    };

    Parser::parse_sql(&*parser_dialect, sql)
        .map(|_| ())
        .map_err(|e| format!("Invalid SQL for {}: {}\nSQL: {}", dialect, e, sql))
}
