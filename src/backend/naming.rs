use convert_case::{Case, Casing};

/// Derives a table name from a type's short name.
///
/// `InvoiceLine` becomes `invoice_line`; any path prefix is dropped.
pub fn table_name(type_name: &str) -> String {
    let short = type_name.rsplit("::").next().unwrap_or(type_name);
    short.to_case(Case::Snake)
}

/// Quotes a string as a SQL identifier (table/column name).
///
/// Embedded double quotes are doubled.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Escapes a string for inclusion in a SQL literal.
///
/// Replaces single quotes with double single quotes.
pub fn sql_escape_string(value: &str) -> String {
    value.replace('\'', "''")
}

pub fn quote_literal(value: &str) -> String {
    format!("'{}'", sql_escape_string(value))
}
