//! A typed parser-combinator library built from two coupled subsystems:
//!
//! - [`input::Input`], a lazy, backtracking lexer that slices a source string into a growing
//!   sequence of typed [`lexeme::Lexeme`]s on demand, keyed by a set of regex [`token::TokenRule`]s.
//! - [`rule::Rule`], a combinator algebra building a recursive-descent parser with unlimited
//!   backtracking over that lazy lexeme sequence.
//!
//! The two meet at [`language::LanguageRule`], which binds a top-level `Rule` to a `TokenList`
//! and exposes `parse(source) -> Result<T, ParseError>`.
//!
//! This is recursive-descent with backtracking, not a GLR or Earley parser: left-recursive
//! grammars are not supported and must be rewritten as a head term followed by a repetition of
//! tails (e.g. `E = T (op T)*` instead of `E = E op T | T`).

mod error;
mod input;
mod language;
mod lexeme;
mod outcome;
mod rule;
mod token;

pub use error::{ParseError, Position};
pub use input::Input;
pub use language::{language, LanguageRule};
pub use lexeme::Lexeme;
pub use outcome::Outcome;
pub use rule::{
    any, either, forward, list, look_ahead, not, one_or_more, optional, pure, sequence,
    zero_or_more, Rule, RuleResult,
};
pub use token::{regex, Pattern, TokenList, TokenRule};
