//! Tab completion for the REPL.

use bookclub_core::{EntityKind, ViewKind};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;

/// Bookclub REPL helper with completion support.
pub struct BookclubHelper {
    /// Table and view names.
    targets: Vec<&'static str>,
}

impl BookclubHelper {
    pub fn new() -> Self {
        let targets = EntityKind::ALL
            .iter()
            .map(|k| k.name())
            .chain(ViewKind::ALL.iter().map(|v| v.name()))
            .collect();
        Self { targets }
    }
}

impl Default for BookclubHelper {
    fn default() -> Self {
        Self::new()
    }
}

/// Dot-commands for completion.
const DOT_COMMANDS: &[&str] = &[
    ".status",
    ".tables",
    ".count",
    ".verify",
    ".format",
    ".history",
    ".clear",
    ".help",
    ".exit",
    ".quit",
];

/// Command operations.
const OPERATIONS: &[&str] = &[
    "create", "update", "delete", "purge", "get", "list", "query", "stats", "verify",
];

/// Enum values accepted by the store.
const VALUES: &[&str] = &[
    "pending", "reading", "complete", "liked", "disliked", "rejected", "confirmed",
];

fn matching(candidates: &[&str], word: &str) -> Vec<Pair> {
    candidates
        .iter()
        .filter(|c| c.starts_with(word))
        .map(|c| Pair {
            display: c.to_string(),
            replacement: c.to_string(),
        })
        .collect()
}

impl Completer for BookclubHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_to_cursor = &line[..pos];

        // Dot commands at start of line
        if line_to_cursor.trim_start().starts_with('.') && !line_to_cursor.contains(' ') {
            return Ok((0, matching(DOT_COMMANDS, line_to_cursor.trim())));
        }

        // Only complete inside a string literal.
        let Some(quote) = line_to_cursor.rfind('"') else {
            return Ok((pos, Vec::new()));
        };
        if line_to_cursor.matches('"').count() % 2 == 0 {
            return Ok((pos, Vec::new()));
        }
        let word_start = quote + 1;
        let word = &line_to_cursor[word_start..];
        let before = line_to_cursor[..quote].trim_end();

        let candidates: &[&str] = if before.ends_with("\"op\":") {
            OPERATIONS
        } else if before.ends_with("\"target\":") || before.ends_with("\"view\":") {
            self.targets.as_slice()
        } else if before.ends_with(':') {
            VALUES
        } else {
            return Ok((pos, Vec::new()));
        };

        Ok((word_start, matching(candidates, word)))
    }
}

impl Hinter for BookclubHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for BookclubHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: rustyline::highlight::CmdKind) -> bool {
        false
    }
}

impl Validator for BookclubHelper {}

impl Helper for BookclubHelper {}

#[cfg(test)]
mod tests {
    use super::*;
    use rustyline::history::DefaultHistory;

    fn complete(line: &str) -> Vec<String> {
        let helper = BookclubHelper::new();
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);
        let (_, pairs) = helper.complete(line, line.len(), &ctx).unwrap();
        pairs.into_iter().map(|p| p.replacement).collect()
    }

    #[test]
    fn test_dot_commands() {
        assert_eq!(complete(".ve"), vec![".verify"]);
    }

    #[test]
    fn test_operations() {
        assert_eq!(complete(r#"{"op": "pu"#), vec!["purge"]);
    }

    #[test]
    fn test_targets() {
        let names = complete(r#"{"op": "list", "target": "club"#);
        assert!(names.contains(&"clubs".to_string()));
        assert!(names.contains(&"club_user_link".to_string()));
        assert!(names.contains(&"club_members".to_string()));
    }

    #[test]
    fn test_outside_string() {
        assert!(complete(r#"{"op": "list", "#).is_empty());
    }
}
