use std::sync::Arc;

use regex::Regex;

use crate::lexeme::Lexeme;
use crate::outcome::Outcome;
use crate::rule::{Rule, RuleResult};

/// A pattern handed to [`TokenList::add`]/[`TokenList::skip`].
///
/// Plain `&str` is treated as a literal and regex-quoted before compilation;
/// call [`regex`] explicitly to supply a pattern that should be compiled as-is.
pub enum Pattern<'a> {
    Literal(&'a str),
    Regex(&'a str),
}

impl<'a> From<&'a str> for Pattern<'a> {
    fn from(value: &'a str) -> Self {
        Pattern::Literal(value)
    }
}

/// Wrap a pattern so [`TokenList::add`]/[`TokenList::skip`] compile it as a regular expression
/// instead of escaping it as a literal.
pub fn regex(pattern: &str) -> Pattern<'_> {
    Pattern::Regex(pattern)
}

fn compile(pattern: Pattern<'_>) -> Regex {
    let source = match pattern {
        Pattern::Literal(lit) => regex::escape(lit),
        Pattern::Regex(pat) => pat.to_string(),
    };
    // anchored at the start of whatever slice we search: callers always pass
    // `&source[last_index..]`, which is the equivalent of "sticky" matching.
    Regex::new(&format!("^(?:{source})")).unwrap_or_else(|e| {
        panic!("invalid token pattern {source:?}: {e}");
    })
}

#[derive(Debug)]
pub(crate) struct TokenRuleInner {
    pub(crate) name: String,
    pub(crate) pattern: Regex,
    pub(crate) skippable: bool,
}

/// A named, compiled regex pattern; the smallest unit the lexer recognises.
///
/// Identity is by `Arc` pointer, not by pattern equality — two `TokenRule`s built
/// from the same pattern string are still distinct rules, and a [`Lexeme`] only matches the
/// exact `TokenRule` that produced it.
#[derive(Clone)]
pub struct TokenRule {
    pub(crate) inner: Arc<TokenRuleInner>,
}

impl std::fmt::Debug for TokenRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRule")
            .field("name", &self.inner.name)
            .field("skippable", &self.inner.skippable)
            .finish()
    }
}

impl TokenRule {
    fn new(name: impl Into<String>, pattern: Pattern<'_>, skippable: bool) -> Self {
        Self {
            inner: Arc::new(TokenRuleInner {
                name: name.into(),
                pattern: compile(pattern),
                skippable,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn is_skippable(&self) -> bool {
        self.inner.skippable
    }

    /// Rule<Lexeme> that matches iff the next non-skippable lexeme was produced by this rule.
    ///
    /// If this rule is itself marked skippable, the peek/consume bypasses the skip filter for
    /// this single lookup only (the "temporarily non-skippable" contract), with
    /// no mutation of shared grammar state — see `Input::next_lexeme`'s `required` parameter.
    pub fn rule(&self) -> Rule<Lexeme> {
        let inner = self.inner.clone();
        Rule::primitive(move |input| -> RuleResult<Lexeme> {
            match input.peek_required(&inner)? {
                Some(lex) if lex.is_rule(&inner) => {
                    input.next_required(&inner)?;
                    Ok(Outcome::Match(lex))
                }
                _ => Ok(Outcome::NoMatch),
            }
        })
        .named(self.inner.name.clone())
    }

    /// Transforms to the matched text on success.
    pub fn text(&self) -> Rule<String> {
        self.rule()
            .transform(|lex| Outcome::Match(lex.text().to_string()))
    }

    /// Transforms to the lexeme iff its text fully matches any of the given literal/regex
    /// patterns, else signals no-match (the derived `.as(patterns…)` operator).
    pub fn matching<'a, I>(&self, patterns: I) -> Rule<Lexeme>
    where
        I: IntoIterator<Item = Pattern<'a>>,
    {
        let compiled: Vec<Regex> = patterns
            .into_iter()
            .map(|p| {
                let source = match p {
                    Pattern::Literal(lit) => regex::escape(lit),
                    Pattern::Regex(pat) => pat.to_string(),
                };
                Regex::new(&format!("^(?:{source})$")).unwrap_or_else(|e| {
                    panic!("invalid matching pattern {source:?}: {e}");
                })
            })
            .collect();

        self.rule().transform(move |lex| {
            if compiled.iter().any(|re| re.is_match(lex.text())) {
                Outcome::Match(lex)
            } else {
                Outcome::NoMatch
            }
        })
    }
}

/// Ordered collection of [`TokenRule`]s: the active alphabet a lexer tries, in priority order.
#[derive(Clone, Default)]
pub struct TokenList {
    pub(crate) rules: Vec<TokenRule>,
}

impl TokenList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a non-skippable rule and returns it.
    pub fn add<'a>(&mut self, pattern: impl Into<Pattern<'a>>) -> TokenRule {
        self.add_named(format!("token{}", self.rules.len()), pattern)
    }

    /// Same as [`TokenList::add`] but with an explicit diagnostic name.
    pub fn add_named<'a>(&mut self, name: impl Into<String>, pattern: impl Into<Pattern<'a>>) -> TokenRule {
        let rule = TokenRule::new(name, pattern.into(), false);
        self.rules.push(rule.clone());
        rule
    }

    /// Appends a skippable rule (e.g. whitespace, comments) and returns it.
    pub fn skip<'a>(&mut self, pattern: impl Into<Pattern<'a>>) -> TokenRule {
        self.skip_named(format!("skip{}", self.rules.len()), pattern)
    }

    /// Same as [`TokenList::skip`] but with an explicit diagnostic name.
    pub fn skip_named<'a>(&mut self, name: impl Into<String>, pattern: impl Into<Pattern<'a>>) -> TokenRule {
        let rule = TokenRule::new(name, pattern.into(), true);
        self.rules.push(rule.clone());
        rule
    }
}
