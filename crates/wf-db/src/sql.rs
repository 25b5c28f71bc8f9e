//! Small SQL helpers for identifier quoting.

/// Quote an identifier for DuckDB, escaping embedded double quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
