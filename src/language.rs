use log::debug;

use crate::error::ParseError;
use crate::input::Input;
use crate::outcome::Outcome;
use crate::rule::Rule;
use crate::token::TokenList;

/// Binds a top-level [`Rule`] to a [`TokenList`]; the crate's single entry point.
pub struct LanguageRule<T> {
    top: Rule<T>,
    tokens: TokenList,
}

impl<T: 'static> LanguageRule<T> {
    pub fn new(top: Rule<T>, tokens: TokenList) -> Self {
        Self { top, tokens }
    }

    /// Parses `source` end to end.
    ///
    /// Raises [`ParseError::ParseFailed`] if the top rule produced no-match, or
    /// [`ParseError::UnexpectedInput`] if it matched but a non-skippable lexeme remains; both
    /// cite the furthest lexeme ever observed during the attempt, which is more informative than
    /// the cursor position after a partial rollback.
    pub fn parse(&self, source: &str) -> Result<T, ParseError> {
        let mut input = Input::new(source, self.tokens.clone());

        let result = self.top.exec(&mut input)?;

        let value = match result {
            Outcome::Match(v) => v,
            Outcome::NoMatch => {
                let err = input.parse_failed_error();
                debug!("parse failed: {err}");
                return Err(err);
            }
        };

        match input.peek()? {
            Some(_) => {
                let err = input.unexpected_input_error();
                debug!("unexpected trailing input: {err}");
                Err(err)
            }
            None => {
                debug!("parse succeeded, consuming the whole input");
                Ok(value)
            }
        }
    }
}

/// Convenience constructor for building a [`LanguageRule`].
pub fn language<T: 'static>(top: Rule<T>, tokens: TokenList) -> LanguageRule<T> {
    LanguageRule::new(top, tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{one_or_more, zero_or_more};
    use crate::token::regex;

    #[test]
    fn empty_input_on_pure_repetition_succeeds_empty() {
        let mut tokens = TokenList::new();
        let num = tokens.add_named("num", regex(r"[0-9]+"));
        let grammar = language(zero_or_more(num.rule()), tokens);
        let result = grammar.parse("").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn empty_input_on_required_token_fails() {
        let mut tokens = TokenList::new();
        let num = tokens.add_named("num", regex(r"[0-9]+"));
        let grammar = language(one_or_more(num.rule()), tokens);
        let err = grammar.parse("").unwrap_err();
        assert!(matches!(err, ParseError::ParseFailed { .. }));
        assert_eq!(err.position().line, 1);
        assert_eq!(err.position().column, 1);
    }

    #[test]
    fn skippable_only_input_behaves_as_empty() {
        let mut tokens = TokenList::new();
        tokens.skip(regex(r"\s+"));
        let num = tokens.add_named("num", regex(r"[0-9]+"));
        let grammar = language(zero_or_more(num.rule()), tokens);
        let result = grammar.parse("   \t  ").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn leftover_input_raises_unexpected_input() {
        let mut tokens = TokenList::new();
        tokens.skip(regex(r"\s+"));
        let num = tokens.add_named("num", regex(r"[0-9]+"));
        let grammar = language(num.rule(), tokens);
        let err = grammar.parse("1 2").unwrap_err();
        match err {
            ParseError::UnexpectedInput { text, .. } => assert_eq!(text, "2"),
            other => panic!("expected UnexpectedInput, got {other:?}"),
        }
    }
}
