use std::sync::Arc;

use log::trace;

use crate::error::{ParseError, Position};
use crate::lexeme::Lexeme;
use crate::token::{TokenList, TokenRuleInner};

/// Lazy lexer and backtracking cursor.
///
/// Owns the source string, the active token alphabet, and a growing lexeme vector that is
/// extended on demand and never truncated by rollback: already-produced lexemes are reused by
/// any retry, so each byte of the source is tokenised at most once regardless of how much the
/// combinators above backtrack.
pub struct Input {
    source: Arc<str>,
    tokens: TokenList,
    lexemes: Vec<Lexeme>,
    /// -1 means "no lexeme consumed yet"; otherwise the index into `lexemes` of the last
    /// consumed (non-skippable) lexeme.
    lex_position: i64,
    last_index: usize,
    stack: Vec<i64>,
    current_line: u32,
    current_column: u32,
    furthest_lexeme: Option<Lexeme>,
}

impl Input {
    pub fn new(source: impl Into<Arc<str>>, tokens: TokenList) -> Self {
        Self {
            source: source.into(),
            tokens,
            lexemes: Vec::new(),
            lex_position: -1,
            last_index: 0,
            stack: Vec::new(),
            current_line: 1,
            current_column: 1,
            furthest_lexeme: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn lex_position(&self) -> i64 {
        self.lex_position
    }

    /// The position just past whatever has been consumed so far, for error reporting when no
    /// lexeme has ever been observed (e.g. an empty input).
    fn start_position(&self) -> Position {
        Position::new(1, 1, 0)
    }

    pub fn furthest_position(&self) -> Position {
        match &self.furthest_lexeme {
            Some(lex) => Position::new(lex.line(), lex.column(), lex.index()),
            None => self.start_position(),
        }
    }

    pub fn furthest_text(&self) -> String {
        match &self.furthest_lexeme {
            Some(lex) => lex.text().to_string(),
            None => String::new(),
        }
    }

    pub fn illegal_input_error(&self, position: Position) -> ParseError {
        ParseError::IllegalInput {
            position,
            source: self.source.to_string(),
        }
    }

    pub fn unexpected_input_error(&self) -> ParseError {
        ParseError::UnexpectedInput {
            position: self.furthest_position(),
            text: self.furthest_text(),
            source: self.source.to_string(),
        }
    }

    pub fn parse_failed_error(&self) -> ParseError {
        ParseError::ParseFailed {
            position: self.furthest_position(),
            source: self.source.to_string(),
        }
    }

    // --- save / rollback / commit ---------------------------------------------------------

    pub fn save(&mut self) {
        self.stack.push(self.lex_position);
        trace!("save at lex_position={}", self.lex_position);
    }

    pub fn rollback(&mut self) {
        let restored = self.stack.pop().expect("rollback without matching save");
        trace!("rollback to lex_position={restored}");
        self.lex_position = restored;
    }

    pub fn commit(&mut self) {
        self.stack.pop().expect("commit without matching save");
        trace!("commit at lex_position={}", self.lex_position);
    }

    /// Runs `body` under the save/rollback/commit discipline every fallible combinator must
    /// honour: rolls back on `Ok(Outcome::NoMatch)` or `Err`, commits otherwise.
    pub fn protect<T>(
        &mut self,
        body: impl FnOnce(&mut Input) -> Result<crate::outcome::Outcome<T>, ParseError>,
    ) -> Result<crate::outcome::Outcome<T>, ParseError> {
        self.save();
        let result = body(self);
        match &result {
            Ok(crate::outcome::Outcome::Match(_)) => self.commit(),
            Ok(crate::outcome::Outcome::NoMatch) => self.rollback(),
            Err(_) => self.rollback(),
        }
        result
    }

    // --- peek / next ------------------------------------------------------------------------

    pub fn peek(&mut self) -> Result<Option<Lexeme>, ParseError> {
        self.next_lexeme(false, None)
    }

    pub fn next(&mut self) -> Result<Option<Lexeme>, ParseError> {
        self.next_lexeme(true, None)
    }

    pub(crate) fn peek_required(
        &mut self,
        rule: &Arc<TokenRuleInner>,
    ) -> Result<Option<Lexeme>, ParseError> {
        self.next_lexeme(false, Some(rule))
    }

    pub(crate) fn next_required(
        &mut self,
        rule: &Arc<TokenRuleInner>,
    ) -> Result<Option<Lexeme>, ParseError> {
        self.next_lexeme(true, Some(rule))
    }

    /// Optional memory-bound extension: discard lexemes already committed past,
    /// reclaiming their memory. Only safe with no outstanding `save()`s, since rollback targets
    /// are indices into `lexemes`.
    pub fn cut(&mut self) {
        if !self.stack.is_empty() || self.lex_position < 0 {
            return;
        }
        let cut_through = self.lex_position as usize;
        self.lexemes.drain(0..=cut_through);
        self.lex_position = -1;
    }

    /// The shared implementation behind `peek`/`next`.
    fn next_lexeme(
        &mut self,
        update_position: bool,
        required: Option<&Arc<TokenRuleInner>>,
    ) -> Result<Option<Lexeme>, ParseError> {
        let mut scan = (self.lex_position + 1) as usize;
        loop {
            if scan >= self.lexemes.len() {
                match self.extend()? {
                    true => continue,
                    false => return Ok(None),
                }
            }

            let lex = &self.lexemes[scan];
            let bypass_skip = required.is_some_and(|r| lex.is_rule(r));
            if lex.rule.skippable && !bypass_skip {
                scan += 1;
                continue;
            }

            let lex = self.lexemes[scan].clone();
            if self.furthest_lexeme.as_ref().is_none_or(|f| lex.index() >= f.index()) {
                self.furthest_lexeme = Some(lex.clone());
            }
            if update_position {
                self.lex_position = scan as i64;
            }
            return Ok(Some(lex));
        }
    }

    /// Tries every active `TokenRule` at `last_index`, in priority order, accepting the first
    /// non-empty match. Returns `Ok(true)` if a lexeme was produced, `Ok(false)` at end of input.
    fn extend(&mut self) -> Result<bool, ParseError> {
        if self.last_index >= self.source.len() {
            return Ok(false);
        }

        let slice = &self.source[self.last_index..];
        for rule in &self.tokens.rules {
            if let Some(m) = rule.inner.pattern.find(slice) {
                if m.start() == 0 && !m.as_str().is_empty() {
                    let text = m.as_str().to_string();
                    let index = self.last_index;
                    let line = self.current_line;
                    let column = self.current_column;

                    for ch in text.chars() {
                        if ch == '\n' {
                            self.current_line += 1;
                            self.current_column = 1;
                        } else {
                            self.current_column += 1;
                        }
                    }
                    self.last_index += text.len();

                    trace!("matched {:?} as {} at {}:{}", text, rule.inner.name, line, column);
                    self.lexemes.push(Lexeme::new(text, rule.inner.clone(), index, line, column));
                    return Ok(true);
                }
            }
        }

        Err(self.illegal_input_error(Position::new(
            self.current_line,
            self.current_column,
            self.last_index,
        )))
    }
}
