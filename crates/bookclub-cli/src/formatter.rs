//! Output formatters for command results.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use serde_json::Value;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format rows of a table or view. Each row is a JSON object.
    fn format_rows(&self, source: &str, rows: &[Value]) -> String;

    /// Format a mutation result.
    fn format_mutation_result(&self, affected: usize, message: &str) -> String;

    /// Format an error message.
    fn format_error(&self, error: &str) -> String;

    /// Format a simple message.
    fn format_message(&self, message: &str) -> String;

    /// Format the list of tables and views.
    fn format_catalog(&self, tables: &[&str], views: &[&str]) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_rows(&self, source: &str, rows: &[Value]) -> String {
        if rows.is_empty() {
            return format!("{}: no rows", source);
        }

        let columns = column_names(rows);
        let mut table = Table::new();
        table.set_header(columns.iter().map(Cell::new).collect::<Vec<_>>());

        for row in rows {
            let cells: Vec<Cell> = columns
                .iter()
                .map(|col| Cell::new(format_value(row.get(col).unwrap_or(&Value::Null))))
                .collect();
            table.add_row(cells);
        }

        format!("{}\n{} row(s)", table, rows.len())
    }

    fn format_mutation_result(&self, affected: usize, message: &str) -> String {
        if message.is_empty() {
            format!("{} row(s) affected", affected)
        } else {
            format!("{} row(s) affected: {}", affected, message)
        }
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}", error)
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }

    fn format_catalog(&self, tables: &[&str], views: &[&str]) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Name", "Kind"]);

        for name in tables {
            table.add_row(vec![*name, "table"]);
        }
        for name in views {
            table.add_row(vec![*name, "view"]);
        }

        table.to_string()
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_rows(&self, _source: &str, rows: &[Value]) -> String {
        serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_mutation_result(&self, affected: usize, message: &str) -> String {
        serde_json::json!({
            "affected": affected,
            "message": message
        })
        .to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({
            "error": error
        })
        .to_string()
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({
            "message": message
        })
        .to_string()
    }

    fn format_catalog(&self, tables: &[&str], views: &[&str]) -> String {
        serde_json::json!({
            "tables": tables,
            "views": views
        })
        .to_string()
    }
}

/// Column names in first-seen order across all rows.
fn column_names(rows: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        if let Value::Object(fields) = row {
            for name in fields.keys() {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.clone());
                }
            }
        }
    }
    columns
}

/// Format a value for a table cell.
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{:.2}", f),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
