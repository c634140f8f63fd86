use std::error::Error;
use std::fmt::{self, Display};

use colored::Colorize;

/// Position of a single byte offset in the original source, used to render the
/// caret-underlined snippets in [`ParseError`]'s `Display` impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub index: usize,
}

impl Position {
    pub(crate) fn new(line: u32, column: u32, index: usize) -> Self {
        Self { line, column, index }
    }
}

fn render_snippet(source: &str, pos: Position, len: usize, message: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let line_idx = pos.line.saturating_sub(1) as usize;
    let line_str = lines.get(line_idx).copied().unwrap_or("");

    let margin = format!("{}", pos.line).len();
    let margin_fill = " ".repeat(margin);

    let col = pos.column.saturating_sub(1) as usize;
    let caret_len = len.max(1);
    let padding = " ".repeat(col);
    let carets = "^".repeat(caret_len).red();

    format!(
        "{margin_fill} |\n{line} |{line_str}\n{margin_fill} |{padding}{carets} {message}",
        line = pos.line
    )
}

/// The three fatal fault kinds that can propagate out of [`LanguageRule::parse`](crate::language::LanguageRule::parse).
///
/// No-match is an entirely separate, expected control-flow outcome (see [`crate::outcome::Outcome`])
/// and never surfaces as a `ParseError`.
#[derive(Debug, Clone)]
pub enum ParseError {
    /// No `TokenRule` in the active alphabet matched a non-empty prefix at this offset.
    IllegalInput { position: Position, source: String },
    /// The top rule succeeded but a non-skippable lexeme remained unconsumed.
    UnexpectedInput {
        position: Position,
        text: String,
        source: String,
    },
    /// The top rule produced no-match against the whole input.
    ParseFailed { position: Position, source: String },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::IllegalInput { position, .. } => *position,
            ParseError::UnexpectedInput { position, .. } => *position,
            ParseError::ParseFailed { position, .. } => *position,
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::IllegalInput { position, source } => f.write_str(&render_snippet(
                source,
                *position,
                1,
                &format!(
                    "illegal input at {}:{}",
                    position.line, position.column
                ),
            )),
            ParseError::UnexpectedInput {
                position,
                text,
                source,
            } => f.write_str(&render_snippet(
                source,
                *position,
                text.len(),
                &format!("unexpected '{text}'"),
            )),
            ParseError::ParseFailed { position, source } => f.write_str(&render_snippet(
                source,
                *position,
                1,
                "parse failed here",
            )),
        }
    }
}

impl Error for ParseError {}
