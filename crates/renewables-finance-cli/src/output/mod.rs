pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Result keys holding one row per period or year, in lookup order.
const ROW_KEYS: [&str; 3] = ["periods", "years", "statements"];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The per-period rows of a result, if it has any.
fn result_rows(result: &Map<String, Value>) -> Option<&[Value]> {
    ROW_KEYS.iter().find_map(|k| match result.get(*k) {
        Some(Value::Array(rows)) if rows.first().is_some_and(Value::is_object) => {
            Some(rows.as_slice())
        }
        _ => None,
    })
}

/// Column names of the scalar fields in the first row.
fn scalar_columns(rows: &[Value]) -> Vec<String> {
    match rows.first() {
        Some(Value::Object(first)) => first
            .iter()
            .filter(|(_, v)| !v.is_array() && !v.is_object())
            .map(|(k, _)| k.clone())
            .collect(),
        _ => Vec::new(),
    }
}
