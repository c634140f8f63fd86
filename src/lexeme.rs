use std::sync::Arc;

use crate::token::TokenRuleInner;

/// A single occurrence of a [`TokenRule`](crate::token::TokenRule) in the source.
///
/// Created exclusively by [`Input`](crate::input::Input) while it extends its lexeme
/// vector; never mutated afterwards. Identity of the owning rule is an `Arc` pointer
/// comparison, not a value comparison, so two rules with identical patterns still match
/// distinct lexemes.
#[derive(Debug, Clone)]
pub struct Lexeme {
    pub(crate) text: String,
    pub(crate) rule: Arc<TokenRuleInner>,
    pub(crate) index: usize,
    pub(crate) line: u32,
    pub(crate) column: u32,
}

impl Lexeme {
    pub(crate) fn new(text: String, rule: Arc<TokenRuleInner>, index: usize, line: u32, column: u32) -> Self {
        Self {
            text,
            rule,
            index,
            line,
            column,
        }
    }

    /// The exact source text this lexeme matched.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset of the first character of this lexeme in the source.
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based source line of the first character of this lexeme.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 1-based source column of the first character of this lexeme.
    pub fn column(&self) -> u32 {
        self.column
    }

    pub(crate) fn is_rule(&self, rule: &Arc<TokenRuleInner>) -> bool {
        Arc::ptr_eq(&self.rule, rule)
    }
}
