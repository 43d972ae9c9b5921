//! Command parsing and execution.
//!
//! A command is one JSON object tagged by `op`:
//!
//! ```text
//! {"op": "create", "target": "users", "fields": {"username": "ann"}}
//! {"op": "update", "target": "users", "key": 1, "fields": {"description": "hi"}}
//! {"op": "delete", "target": "user_book_listing", "key": [1, 2]}
//! {"op": "query", "view": "books_top_rated", "filter": {"club_id": 3}, "limit": 10}
//! ```

use crate::formatter::Formatter;
use bookclub_core::catalog::UnknownName;
use bookclub_core::{Database, Fields, Id, RowKey, Target, ViewFilter, ViewKind};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Execution errors.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The line is not a valid command.
    #[error("invalid command: {0}")]
    Parse(#[from] serde_json::Error),

    /// Unknown table or view name.
    #[error(transparent)]
    UnknownTarget(#[from] UnknownName),

    /// The operation needs a table, not a view (or the other way round).
    #[error("`{op}` is not supported on `{target}`")]
    Unsupported { op: &'static str, target: Target },

    /// Error reported by the store.
    #[error(transparent)]
    Store(#[from] bookclub_core::Error),
}

/// One command.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Command {
    Create {
        target: String,
        fields: Fields,
    },
    Update {
        target: String,
        key: RowKey,
        fields: Fields,
    },
    Delete {
        target: String,
        key: RowKey,
    },
    Purge {
        target: String,
        key: RowKey,
    },
    Get {
        target: String,
        key: RowKey,
    },
    List {
        target: String,
        #[serde(default)]
        limit: Option<usize>,
    },
    Query {
        view: String,
        #[serde(default)]
        filter: ViewFilter,
        #[serde(default)]
        limit: Option<usize>,
    },
    Stats {
        book_id: Id,
    },
    Verify,
}

/// Parse a command line.
pub fn parse(input: &str) -> Result<Command, ExecuteError> {
    Ok(serde_json::from_str(input)?)
}

fn target(name: &str) -> Result<Target, ExecuteError> {
    Ok(name.parse()?)
}

fn view(name: &str) -> Result<ViewKind, ExecuteError> {
    match target(name)? {
        Target::View(view) => Ok(view),
        other => Err(ExecuteError::Unsupported {
            op: "query",
            target: other,
        }),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ExecuteError> {
    Ok(serde_json::to_value(value)?)
}

/// Execute a command line and return formatted output.
pub fn execute(
    db: &Database,
    input: &str,
    formatter: &dyn Formatter,
) -> Result<String, ExecuteError> {
    match parse(input)? {
        Command::Create { target: name, fields } => {
            let key = db.create_fields(target(&name)?, fields)?;
            Ok(formatter.format_mutation_result(1, &format!("created {} {}", name, key)))
        }
        Command::Update {
            target: name,
            key,
            fields,
        } => {
            db.update_fields(target(&name)?, key, fields)?;
            Ok(formatter.format_mutation_result(1, &format!("updated {} {}", name, key)))
        }
        Command::Delete { target: name, key } => {
            db.delete(target(&name)?, key)?;
            Ok(formatter.format_mutation_result(1, &format!("deleted {} {}", name, key)))
        }
        Command::Purge { target: name, key } => {
            let result = db.purge(target(&name)?, key)?;
            let message = format!(
                "purged {} {} ({} removed, {} nullified)",
                name,
                key,
                result.deleted.len(),
                result.nullified.len()
            );
            Ok(formatter.format_mutation_result(result.affected_count(), &message))
        }
        Command::Get { target: name, key } => match target(&name)? {
            Target::Entity(kind) => {
                let row = db.get(kind, key)?;
                Ok(formatter.format_rows(&name, &[Value::Object(row.to_fields()?)]))
            }
            other => Err(ExecuteError::Unsupported {
                op: "get",
                target: other,
            }),
        },
        Command::List { target: name, limit } => {
            let rows = match target(&name)? {
                Target::Entity(kind) => db
                    .list(kind)
                    .into_iter()
                    .take(limit.unwrap_or(usize::MAX))
                    .map(|row| row.to_fields().map(Value::Object))
                    .collect::<Result<Vec<_>, _>>()?,
                Target::View(view) => db
                    .query(view, &ViewFilter::default(), limit)
                    .iter()
                    .map(to_json)
                    .collect::<Result<Vec<_>, _>>()?,
            };
            Ok(formatter.format_rows(&name, &rows))
        }
        Command::Query {
            view: name,
            filter,
            limit,
        } => {
            let rows = db
                .query(view(&name)?, &filter, limit)
                .iter()
                .map(to_json)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(formatter.format_rows(&name, &rows))
        }
        Command::Stats { book_id } => {
            let stats = db.book_statistics(book_id)?;
            let mut row = to_json(&stats)?;
            if let Value::Object(fields) = &mut row {
                fields.insert("rating".to_string(), to_json(&stats.rating())?);
            }
            Ok(formatter.format_rows(ViewKind::BookStatistics.name(), &[row]))
        }
        Command::Verify => {
            let problems = db.verify_aggregates();
            if problems.is_empty() {
                Ok(formatter.format_message("derived data is consistent"))
            } else {
                Ok(formatter.format_message(&problems.join("\n")))
            }
        }
    }
}
