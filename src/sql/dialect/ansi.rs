//! ANSI SQL dialect - the default target.
//!
//! Double-quoted identifiers, uppercase boolean literals and SQL:2008
//! `FETCH FIRST n ROWS ONLY` pagination.

use super::super::token::TokenStream;
use super::helpers;
use super::SqlDialect;

/// ANSI SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Ansi;

impl SqlDialect for Ansi {
    fn name(&self) -> &'static str {
        "ansi"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_upper(b)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_fetch_first(limit, offset)
    }
}
