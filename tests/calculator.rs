//! Integration tests for a small arithmetic calculator grammar. This file is a *client* of
//! `pegc`'s public API — the grammar itself is not part of the library surface, only an example
//! of composing `Rule`s and a `TokenList` into a working parser.

use std::cell::RefCell;
use std::rc::Rc;

use pegc::{either, forward, language, regex, Outcome, ParseError, Rule, TokenList, TokenRule};
use pretty_assertions::assert_eq;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

/// Left-associative `operand (op operand)*` fold — the rewrite required for
/// left-recursive grammars (`E = E op T | T` becomes `E = T (op T)*`).
fn binary_level(operand: Rule<f64>, ops: Vec<(TokenRule, Op)>) -> Rule<f64> {
    let op_rule = either(
        ops.into_iter()
            .map(|(tok, op)| tok.rule().map(move |_| op))
            .collect(),
    );

    (operand.clone() >> (op_rule >> operand).many()).map(|(first, rest)| {
        rest.into_iter().fold(first, |acc, (op, rhs)| match op {
            Op::Add => acc + rhs,
            Op::Sub => acc - rhs,
            Op::Mul => acc * rhs,
            Op::Div => acc / rhs,
        })
    })
}

fn calculator() -> (Rule<f64>, TokenList) {
    let mut tokens = TokenList::new();
    tokens.skip_named("whitespace", regex(r"\s+"));
    let num = tokens.add_named("num", regex(r"[0-9]+(\.[0-9]+)?"));
    let plus = tokens.add_named("plus", "+");
    let minus = tokens.add_named("minus", "-");
    let star = tokens.add_named("star", "*");
    let slash = tokens.add_named("slash", "/");
    let lparen = tokens.add_named("lparen", "(");
    let rparen = tokens.add_named("rparen", ")");

    // `expr` recurses through `atom` via a parenthesised group, but Rust evaluates `let`
    // bindings strictly, so `atom` can't reference `expr` before it exists. `forward` defers
    // resolution to exec time; the cell is filled in once `expr` is built.
    let expr_cell: Rc<RefCell<Option<Rule<f64>>>> = Rc::new(RefCell::new(None));
    let expr_ref = {
        let expr_cell = expr_cell.clone();
        forward(move || {
            expr_cell
                .borrow()
                .clone()
                .expect("expr forward reference resolved before expr was built")
        })
    };

    let number = num.rule().transform(|lex| {
        lex.text()
            .parse::<f64>()
            .map(Outcome::Match)
            .unwrap_or(Outcome::NoMatch)
    });
    let parenthesised = (lparen.rule() >> expr_ref >> rparen.rule()).map(|((_, e), _)| e);
    let atom = number | parenthesised;

    let term = binary_level(atom, vec![(star, Op::Mul), (slash, Op::Div)]);
    let expr = binary_level(term, vec![(plus, Op::Add), (minus, Op::Sub)]);

    expr_cell.replace(Some(expr.clone()));
    (expr, tokens)
}

#[test]
fn simple_addition() {
    let (top, tokens) = calculator();
    let grammar = language(top, tokens);
    assert_eq!(grammar.parse("1 + 2").unwrap(), 3.0);
}

#[test]
fn nested_parens_and_precedence() {
    let (top, tokens) = calculator();
    let grammar = language(top, tokens);
    assert_eq!(
        grammar.parse("  2 * (2 + 1)   + 10 / 2    ").unwrap(),
        11.0
    );
}

#[test]
fn left_associative_subtraction() {
    let (top, tokens) = calculator();
    let grammar = language(top, tokens);
    assert_eq!(grammar.parse("10 - 2 - 3").unwrap(), 5.0);
}

#[test]
fn trailing_operator_fails_to_parse() {
    // The grammar successfully parses "2 + 3 * 2"; the repetition inside `binary_level` then
    // tries the trailing "+" as another operator, finds no operand after it, and rolls that
    // attempt back — leaving the dangling "+" as unconsumed input rather than a failure of the
    // top rule itself. That is exactly the UnexpectedInput case (top rule
    // succeeded, non-skippable lexeme remains), not ParseFailed (top rule itself no-matched).
    let (top, tokens) = calculator();
    let grammar = language(top, tokens);
    let err = grammar.parse("2 + 3 * 2\n+\n").unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedInput { .. }));
}

#[test]
fn unmatchable_byte_raises_illegal_input() {
    let (top, tokens) = calculator();
    let grammar = language(top, tokens);
    let err = grammar.parse("  52 !  ").unwrap_err();
    match err {
        ParseError::IllegalInput { position, .. } => {
            assert_eq!(position.line, 1);
            assert_eq!(position.column, 6);
        }
        other => panic!("expected IllegalInput, got {other:?}"),
    }
}

#[test]
fn empty_input_raises_parse_failed_at_start() {
    let (top, tokens) = calculator();
    let grammar = language(top, tokens);
    let err = grammar.parse("").unwrap_err();
    match err {
        ParseError::ParseFailed { position, .. } => {
            assert_eq!(position.line, 1);
            assert_eq!(position.column, 1);
        }
        other => panic!("expected ParseFailed, got {other:?}"),
    }
}
