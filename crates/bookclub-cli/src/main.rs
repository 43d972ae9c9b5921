//! Bookclub Command-Line Client
//!
//! Opens a book club store and runs JSON commands against it, one-shot,
//! from a script or interactively.

mod commands;
mod completer;
mod executor;
mod formatter;
mod repl;

use bookclub_core::{Database, StoreConfig};
use clap::Parser;
use formatter::OutputFormat;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Bookclub Command-Line Client
#[derive(Parser, Debug)]
#[command(name = "bookclub")]
#[command(version, about = "Book club store command-line client")]
pub struct Args {
    /// Store directory
    #[arg(short = 'd', long, default_value = "./bookclub_data")]
    pub data_path: PathBuf,

    /// Use a scratch store that is discarded on exit
    #[arg(long)]
    pub temporary: bool,

    /// Execute a single command and exit
    #[arg(short = 'c', long)]
    pub command: Option<String>,

    /// Execute commands from file
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Attempts before a conflicting command gives up
    #[arg(long)]
    pub max_retries: Option<u32>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bookclub=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn store_config(args: &Args) -> StoreConfig {
    let config = if args.temporary {
        StoreConfig::temporary()
    } else {
        StoreConfig::new(&args.data_path)
    };
    match args.max_retries {
        Some(retries) => config.with_max_conflict_retries(retries),
        None => config,
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open(store_config(&args))?;
    info!(
        path = %db.config().path.display(),
        temporary = db.config().temporary,
        seq = db.store().read().seq(),
        "store opened"
    );

    let result = if let Some(command) = &args.command {
        run_command_mode(&db, command, args.format)
    } else if let Some(file) = &args.file {
        run_script_mode(&db, file, args.format)
    } else {
        repl::run(&db, args.format)
    };

    db.flush()?;
    result
}

/// Execute a single command and exit.
fn run_command_mode(
    db: &Database,
    command: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let formatter = formatter::create_formatter(format);
    let output = executor::execute(db, command, &*formatter)?;
    println!("{}", output);
    Ok(())
}

/// Execute commands from a file, one per line.
fn run_script_mode(
    db: &Database,
    file: &Path,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(file)?;
    let formatter = formatter::create_formatter(format);

    let statements = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with("//") && !l.starts_with('#'));

    let mut failures = 0;
    for statement in statements {
        match executor::execute(db, statement, &*formatter) {
            Ok(output) => {
                if !output.is_empty() {
                    println!("{}", output);
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("{}", formatter.format_error(&format!("'{}': {}", statement, e)));
            }
        }
    }

    if failures > 0 {
        warn!(script = %file.display(), failures, "script finished with failures");
        return Err(format!("{} command(s) failed", failures).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_config_retries() {
        let args = Args::parse_from(["bookclub", "--temporary", "--max-retries", "3"]);
        let config = store_config(&args);
        assert!(config.temporary);
        assert_eq!(config.max_conflict_retries, 3);
    }

    #[test]
    fn test_script_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("seed.jsonl");
        std::fs::write(
            &script,
            concat!(
                "# seed\n",
                "{\"op\": \"create\", \"target\": \"users\", \"fields\": {\"username\": \"ann\"}}\n",
                "{\"op\": \"create\", \"target\": \"users\", \"fields\": {\"username\": \"ann\"}}\n",
            ),
        )
        .unwrap();

        let db = Database::temporary().unwrap();
        let err = run_script_mode(&db, &script, OutputFormat::Json).unwrap_err();
        assert_eq!(err.to_string(), "1 command(s) failed");
        assert_eq!(db.count(bookclub_core::EntityKind::User), 1);
    }
}
