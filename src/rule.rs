use std::ops::{BitOr, Not};
use std::rc::Rc;

use log::trace;

use crate::error::ParseError;
use crate::input::Input;
use crate::outcome::Outcome;

pub type RuleResult<T> = Result<Outcome<T>, ParseError>;

type RuleBody<T> = Rc<dyn Fn(&mut Input) -> RuleResult<T>>;

/// A parser combinator producing a typed result `T`.
///
/// Rules are values: cheap to clone (an `Rc`-backed closure), composable with the operators and
/// free functions in this module, and referentially transparent — executing the same `Rule`
/// twice against the same `Input` state produces the same result and the same final state.
pub struct Rule<T> {
    body: RuleBody<T>,
    name: Option<String>,
    /// `true` for combinators that already apply their own save/rollback/commit discipline
    /// internally (Sequence, Either, Transform over a protected inner rule, …) — `exec` skips
    /// wrapping those in another layer of `protect`.
    self_protecting: bool,
}

/// Manual impl: `Rule<T>` is cheap to clone (an `Rc`-backed closure) regardless of whether `T`
/// itself is `Clone` — a derived impl would incorrectly require `T: Clone`.
impl<T> Clone for Rule<T> {
    fn clone(&self) -> Self {
        Self {
            body: self.body.clone(),
            name: self.name.clone(),
            self_protecting: self.self_protecting,
        }
    }
}

impl<T: 'static> Rule<T> {
    /// Builds a rule from a primitive body that does not need save/rollback wrapping applied to
    /// it from the outside (`TokenRule::rule`, `Any`, `Forward`, `LookAhead`, `Not` all fall in
    /// this category because they manage position restoration themselves).
    pub(crate) fn primitive(body: impl Fn(&mut Input) -> RuleResult<T> + 'static) -> Self {
        Self {
            body: Rc::new(body),
            name: None,
            self_protecting: true,
        }
    }

    /// Builds a rule whose body must be wrapped in save/rollback/commit by `exec` — every
    /// fallible combinator (`Sequence`, `Either`, `Transform`, …) falls in this category.
    fn fallible(body: impl Fn(&mut Input) -> RuleResult<T> + 'static) -> Self {
        Self {
            body: Rc::new(body),
            name: None,
            self_protecting: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn exec(&self, input: &mut Input) -> RuleResult<T> {
        if self.self_protecting {
            return (self.body)(input);
        }
        let body = self.body.clone();
        input.protect(move |input| body(input))
    }

    /// Applies `f` to a successful match, threading `NoMatch` through unchanged; see
    /// [`Rule::tf`] for the short alias.
    pub fn transform<U: 'static>(self, f: impl Fn(T) -> Outcome<U> + 'static) -> Rule<U> {
        let name = self.name.clone();
        let rule = Rule::fallible(move |input| match self.exec(input)? {
            Outcome::Match(v) => Ok(f(v)),
            Outcome::NoMatch => Ok(Outcome::NoMatch),
        });
        match name {
            Some(n) => rule.named(n),
            None => rule,
        }
    }

    /// Short alias for [`Rule::transform`].
    pub fn tf<U: 'static>(self, f: impl Fn(T) -> Outcome<U> + 'static) -> Rule<U> {
        self.transform(f)
    }

    /// Unconditional map: convenience for transforms that can't fail.
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> Rule<U> {
        self.transform(move |v| Outcome::Match(f(v)))
    }

    /// `ZeroOrMore(self)`: matches `self` until no-match; always succeeds, possibly empty.
    pub fn many(self) -> Rule<Vec<T>> {
        zero_or_more(self)
    }

    /// `OneOrMore(self)`: as `many` but no-match on an empty sequence.
    pub fn many1(self) -> Rule<Vec<T>> {
        one_or_more(self)
    }

    /// `Optional(self)`.
    pub fn opt(self) -> Rule<Option<T>> {
        optional(self)
    }

    /// `LookAhead(self)`.
    pub fn look_ahead(self) -> Rule<T> {
        look_ahead(self)
    }

    /// `List(self, sep)`.
    pub fn list<S: 'static>(self, sep: Rule<S>) -> Rule<Vec<T>> {
        list(self, sep)
    }
}

/// `Sequence(r1, r2)`, exposed as `>>` for sequencing.
impl<A: 'static, B: 'static> std::ops::Shr<Rule<B>> for Rule<A> {
    type Output = Rule<(A, B)>;

    fn shr(self, next: Rule<B>) -> Self::Output {
        Rule::fallible(move |input| match self.exec(input)? {
            Outcome::Match(a) => match next.exec(input)? {
                Outcome::Match(b) => Ok(Outcome::Match((a, b))),
                Outcome::NoMatch => Ok(Outcome::NoMatch),
            },
            Outcome::NoMatch => Ok(Outcome::NoMatch),
        })
    }
}

/// `Either(r1, r2)`: tries `self` first, then `rhs`; commits on first success.
impl<T: 'static> BitOr<Rule<T>> for Rule<T> {
    type Output = Rule<T>;

    fn bitor(self, rhs: Rule<T>) -> Self::Output {
        Rule::fallible(move |input| match self.exec(input)? {
            m @ Outcome::Match(_) => Ok(m),
            Outcome::NoMatch => rhs.exec(input),
        })
    }
}

/// `Optional(r)`, exposed as `!r`.
impl<T: 'static> Not for Rule<T> {
    type Output = Rule<Option<T>>;

    fn not(self) -> Self::Output {
        optional(self)
    }
}

/// `Either` over a closed set of alternatives with a single result type.
pub fn either<T: 'static>(rules: Vec<Rule<T>>) -> Rule<T> {
    Rule::fallible(move |input| {
        for rule in &rules {
            if let Outcome::Match(v) = rule.exec(input)? {
                return Ok(Outcome::Match(v));
            }
        }
        Ok(Outcome::NoMatch)
    })
}

/// `Sequence(r1, …, rn)` over a homogeneous vector, producing `Vec<T>` rather than a tuple; use
/// `>>` (or the `seq!` macro) when the element types differ.
pub fn sequence<T: 'static>(rules: Vec<Rule<T>>) -> Rule<Vec<T>> {
    Rule::fallible(move |input| {
        let mut out = Vec::with_capacity(rules.len());
        for rule in &rules {
            match rule.exec(input)? {
                Outcome::Match(v) => out.push(v),
                Outcome::NoMatch => return Ok(Outcome::NoMatch),
            }
        }
        Ok(Outcome::Match(out))
    })
}

/// `ZeroOrMore(r)`: runs `r` until no-match; always succeeds. Detects zero-length matches (by
/// comparing `lex_position` before/after each iteration) and stops to avoid infinite loops, per
/// an optional memory-bound extension.
pub fn zero_or_more<T: 'static>(rule: Rule<T>) -> Rule<Vec<T>> {
    Rule::primitive(move |input| {
        let mut out = Vec::new();
        loop {
            let before = input.lex_position();
            match rule.exec(input)? {
                Outcome::Match(v) => {
                    out.push(v);
                    if input.lex_position() == before {
                        trace!("zero_or_more: inner rule matched without progress, stopping");
                        break;
                    }
                }
                Outcome::NoMatch => break,
            }
        }
        Ok(Outcome::Match(out))
    })
}

/// `OneOrMore(r)`: as [`zero_or_more`] but no-match on an empty result.
pub fn one_or_more<T: 'static>(rule: Rule<T>) -> Rule<Vec<T>> {
    let many = zero_or_more(rule);
    Rule::primitive(move |input| match many.exec(input)? {
        Outcome::Match(v) if v.is_empty() => Ok(Outcome::NoMatch),
        other => Ok(other),
    })
}

/// `Optional(r)`: `r`'s result on success, `None` on no-match; never fails.
pub fn optional<T: 'static>(rule: Rule<T>) -> Rule<Option<T>> {
    Rule::primitive(move |input| match rule.exec(input)? {
        Outcome::Match(v) => Ok(Outcome::Match(Some(v))),
        Outcome::NoMatch => Ok(Outcome::Match(None)),
    })
}

/// `LookAhead(r)`: runs `r`, always restores position, keeps the outcome.
pub fn look_ahead<T: 'static>(rule: Rule<T>) -> Rule<T> {
    Rule::primitive(move |input| {
        input.save();
        let result = rule.exec(input);
        input.rollback();
        result
    })
}

/// `Not(r)`: runs `r`, always restores position; no-match iff `r` matched.
pub fn not<T: 'static>(rule: Rule<T>) -> Rule<()> {
    Rule::primitive(move |input| {
        input.save();
        let matched = rule.exec(input)?.is_match();
        input.rollback();
        if matched {
            Ok(Outcome::NoMatch)
        } else {
            Ok(Outcome::Match(()))
        }
    })
}

/// `Forward(|| rule)`: resolves the inner rule lazily at exec time, enabling mutually recursive
/// grammars that a strict host language otherwise can't express directly.
pub fn forward<T: 'static>(f: impl Fn() -> Rule<T> + 'static) -> Rule<T> {
    Rule::primitive(move |input| f().exec(input))
}

/// `List(r, sep)`: equivalent to `Sequence(r, ZeroOrMore(Sequence(sep, r))).transform(flatten)`
/// once the referenced rule is known.
pub fn list<T: 'static, S: 'static>(rule: Rule<T>, sep: Rule<S>) -> Rule<Vec<T>> {
    let tail = sep >> rule.clone();
    let tail = zero_or_more(tail);
    (rule >> tail).map(|(first, rest)| {
        let mut out = Vec::with_capacity(rest.len() + 1);
        out.push(first);
        out.extend(rest.into_iter().map(|(_, item)| item));
        out
    })
}

/// `Any`: consumes one lexeme of any kind; no-match at EOF.
pub fn any() -> Rule<crate::lexeme::Lexeme> {
    Rule::primitive(|input| match input.next()? {
        Some(lex) => Ok(Outcome::Match(lex)),
        None => Ok(Outcome::NoMatch),
    })
}

/// Convenience for a rule that always matches without consuming anything, useful as a neutral
/// element when building up `seq!`/`either!` chains programmatically.
pub fn pure<T: Clone + 'static>(value: T) -> Rule<T> {
    Rule::primitive(move |_input| Ok(Outcome::Match(value.clone())))
}

/// Flattens a chain of `>>`-built nested tuples into a flat n-tuple, mirroring how `List`
/// flattens its `Sequence`/`ZeroOrMore` expansion. Supports 2 through 6 elements; reach for
/// nested tuples directly or `sequence`/`Vec` for longer sequences.
#[macro_export]
macro_rules! seq {
    ($a:expr, $b:expr) => {
        ($a >> $b)
    };
    ($a:expr, $b:expr, $c:expr) => {
        ($a >> $b >> $c).map(|((a, b), c)| (a, b, c))
    };
    ($a:expr, $b:expr, $c:expr, $d:expr) => {
        ($a >> $b >> $c >> $d).map(|(((a, b), c), d)| (a, b, c, d))
    };
    ($a:expr, $b:expr, $c:expr, $d:expr, $e:expr) => {
        ($a >> $b >> $c >> $d >> $e).map(|((((a, b), c), d), e)| (a, b, c, d, e))
    };
    ($a:expr, $b:expr, $c:expr, $d:expr, $e:expr, $f:expr) => {
        ($a >> $b >> $c >> $d >> $e >> $f).map(|(((((a, b), c), d), e), f)| (a, b, c, d, e, f))
    };
}

/// Tries each alternative in order, committing on the first success — a variadic-feeling
/// wrapper over repeated `|`.
#[macro_export]
macro_rules! either {
    ($a:expr, $b:expr) => {
        ($a | $b)
    };
    ($a:expr, $b:expr, $($rest:expr),+) => {
        ($a | $crate::either!($b, $($rest),+))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{regex, TokenList};

    fn digits() -> (TokenList, crate::token::TokenRule, crate::token::TokenRule) {
        let mut tokens = TokenList::new();
        tokens.skip(regex(r"\s+"));
        let num = tokens.add_named("num", regex(r"[0-9]+"));
        let plus = tokens.add_named("plus", "+");
        (tokens, num, plus)
    }

    #[test]
    fn sequence_rolls_back_on_first_failure() {
        let (tokens, num, plus) = digits();
        let grammar = num.rule() >> plus.rule();
        let mut input = Input::new("1 2", tokens);
        let result = grammar.exec(&mut input).unwrap();
        assert!(matches!(result, Outcome::NoMatch));
        assert_eq!(input.lex_position(), -1);
    }

    #[test]
    fn either_commits_on_first_success() {
        let (tokens, num, plus) = digits();
        let grammar = plus.rule().map(|_| ()) | num.rule().map(|_| ());
        let mut input = Input::new("7", tokens);
        let result = grammar.exec(&mut input).unwrap();
        assert!(matches!(result, Outcome::Match(())));
        assert_eq!(input.lex_position(), 0);
    }

    #[test]
    fn zero_or_more_on_no_match_consumes_nothing() {
        let (tokens, num, _plus) = digits();
        let grammar = num.rule().many();
        let mut input = Input::new("+ + +", tokens);
        let result = grammar.exec(&mut input).unwrap();
        match result {
            Outcome::Match(v) => assert!(v.is_empty()),
            Outcome::NoMatch => panic!("zero_or_more must never fail"),
        }
        assert_eq!(input.lex_position(), -1);
    }

    #[test]
    fn one_or_more_fails_on_empty() {
        let (tokens, num, _plus) = digits();
        let grammar = num.rule().many1();
        let mut input = Input::new("", tokens);
        let result = grammar.exec(&mut input).unwrap();
        assert!(matches!(result, Outcome::NoMatch));
    }

    #[test]
    fn look_ahead_never_advances() {
        let (tokens, num, _plus) = digits();
        let grammar = num.rule().look_ahead();
        let mut input = Input::new("42", tokens);
        let result = grammar.exec(&mut input).unwrap();
        assert!(matches!(result, Outcome::Match(_)));
        assert_eq!(input.lex_position(), -1);
    }

    #[test]
    fn not_succeeds_iff_inner_fails() {
        let (tokens, _num, plus) = digits();
        let grammar = not(plus.rule());
        let mut input = Input::new("42", tokens);
        let result = grammar.exec(&mut input).unwrap();
        assert!(matches!(result, Outcome::Match(())));
        assert_eq!(input.lex_position(), -1);

        let (tokens2, _num2, plus2) = digits();
        let grammar2 = not(plus2.rule());
        let mut input2 = Input::new("+", tokens2);
        let result2 = grammar2.exec(&mut input2).unwrap();
        assert!(matches!(result2, Outcome::NoMatch));
        assert_eq!(input2.lex_position(), -1);
    }

    #[test]
    fn list_collects_separated_items() {
        let (tokens, num, plus) = digits();
        let grammar = num.rule().map(|l| l.text().to_string()).list(plus.rule());
        let mut input = Input::new("1 + 2 + 3", tokens);
        let result = grammar.exec(&mut input).unwrap();
        match result {
            Outcome::Match(items) => assert_eq!(items, vec!["1", "2", "3"]),
            Outcome::NoMatch => panic!("expected a match"),
        }
    }
}
