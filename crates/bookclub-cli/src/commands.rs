//! REPL dot-command handling.

use crate::formatter::{self, OutputFormat};
use bookclub_core::{Database, EntityKind, ViewKind};

/// Result of executing a command.
pub enum CommandResult {
    /// Exit the REPL.
    Exit,
    /// Output to display.
    Output(String),
    /// Change the output format.
    SetFormat(OutputFormat),
    /// Show history.
    ShowHistory,
    /// Clear screen.
    Clear,
}

/// Parse and execute a dot-command.
pub fn handle_command(line: &str, db: &Database, format: OutputFormat) -> CommandResult {
    let line = line.trim();
    let parts: Vec<&str> = line.splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let arg = parts.get(1).map(|s| s.trim());

    match command.as_str() {
        ".exit" | ".quit" | ".q" => CommandResult::Exit,

        ".help" | ".h" | ".?" => CommandResult::Output(get_help()),

        ".clear" | ".cls" => CommandResult::Clear,

        ".status" => {
            let config = db.config();
            let location = if config.temporary {
                "temporary store".to_string()
            } else {
                config.path.display().to_string()
            };
            let engine = db.store().engine();
            let size = engine.size_on_disk().unwrap_or(0);
            let opened = if engine.was_recovered() { "recovered" } else { "new" };
            CommandResult::Output(format!(
                "{} ({}, commit {}, {} bytes on disk)",
                location,
                opened,
                db.store().read().seq(),
                size
            ))
        }

        ".format" => {
            if let Some(fmt) = arg {
                match fmt.to_lowercase().as_str() {
                    "table" => CommandResult::SetFormat(OutputFormat::Table),
                    "json" => CommandResult::SetFormat(OutputFormat::Json),
                    _ => CommandResult::Output(format!(
                        "Unknown format '{}'. Use: table, json",
                        fmt
                    )),
                }
            } else {
                CommandResult::Output(format!("Current format: {}", format))
            }
        }

        ".tables" => {
            let tables: Vec<&str> = EntityKind::ALL.iter().map(|k| k.name()).collect();
            let views: Vec<&str> = ViewKind::ALL.iter().map(|v| v.name()).collect();
            CommandResult::Output(formatter::create_formatter(format).format_catalog(&tables, &views))
        }

        ".count" => match arg.map(|name| name.parse::<EntityKind>()) {
            Some(Ok(kind)) => CommandResult::Output(format!("{}: {}", kind, db.count(kind))),
            Some(Err(e)) => CommandResult::Output(e.to_string()),
            None => CommandResult::Output("Usage: .count <table>".to_string()),
        },

        ".verify" => {
            let problems = db.verify_aggregates();
            if problems.is_empty() {
                CommandResult::Output("derived data is consistent".to_string())
            } else {
                CommandResult::Output(problems.join("\n"))
            }
        }

        ".history" => CommandResult::ShowHistory,

        _ => CommandResult::Output(format!("Unknown command: {}", command)),
    }
}

/// Check if a line is a dot-command.
pub fn is_command(line: &str) -> bool {
    line.trim().starts_with('.')
}

/// Get help text for REPL commands.
fn get_help() -> String {
    r#"REPL Commands
=============

.status               Show the store location and commit sequence
.tables               List tables and views
.count <table>        Count the rows of a table
.verify               Recompute derived data and report differences
.format [type]        Get or set output format (table, json)
.history              Show command history
.clear                Clear the screen
.help                 Show this help message
.exit / .quit         Exit the REPL

Commands
========
One JSON object per line, tagged by "op":

  {"op": "create", "target": "users", "fields": {"username": "ann"}}
  {"op": "update", "target": "friend_requests", "key": 3, "fields": {"status": "confirmed"}}
  {"op": "delete", "target": "user_book_listing", "key": [1, 2]}
  {"op": "purge", "target": "users", "key": 1}
  {"op": "get", "target": "books", "key": 2}
  {"op": "list", "target": "clubs", "limit": 20}
  {"op": "query", "view": "books_top_rated", "filter": {"club_id": 4}, "limit": 10}
  {"op": "stats", "book_id": 2}
  {"op": "verify"}
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_command() {
        assert!(is_command(".exit"));
        assert!(is_command(".help"));
        assert!(is_command("  .status"));
        assert!(!is_command(r#"{"op": "verify"}"#));
    }

    #[test]
    fn test_count() {
        let db = Database::temporary().unwrap();
        match handle_command(".count users", &db, OutputFormat::Table) {
            CommandResult::Output(out) => assert_eq!(out, "users: 0"),
            _ => panic!("expected output"),
        }
        match handle_command(".count shelves", &db, OutputFormat::Table) {
            CommandResult::Output(out) => assert!(out.contains("unknown")),
            _ => panic!("expected output"),
        }
    }

    #[test]
    fn test_status_reports_fresh_store() {
        let db = Database::temporary().unwrap();
        match handle_command(".status", &db, OutputFormat::Table) {
            CommandResult::Output(out) => {
                assert!(out.starts_with("temporary store (new, commit 0,"), "{out}")
            }
            _ => panic!("expected output"),
        }
    }

    #[test]
    fn test_format_switch() {
        let db = Database::temporary().unwrap();
        assert!(matches!(
            handle_command(".format json", &db, OutputFormat::Table),
            CommandResult::SetFormat(OutputFormat::Json)
        ));
    }
}
