//! Property tests for the lexer and the expression grammar.

use modl_language::test_utils::static_context;
use modl_language::{parser, BinaryOp, Expr, Lexer, TokenKind, UnaryOp};
use proptest::prelude::*;

// ── Precedence round-trip ───────────────────────────────────────────
//
// Render a flat chain `atom op atom op ...`, evaluate it with an
// independent reference evaluator, and check the parsed tree agrees to
// 1e-10 relative error.

fn eval_tree(expr: &Expr<'_>) -> f64 {
    match expr {
        Expr::Integer { value, .. } => *value as f64,
        Expr::Real { value, .. } => *value,
        Expr::Unary { op, operand, .. } => match op {
            UnaryOp::Plus => eval_tree(operand),
            UnaryOp::Minus => -eval_tree(operand),
            UnaryOp::Exp => eval_tree(operand).exp(),
            UnaryOp::Log => eval_tree(operand).ln(),
            UnaryOp::Abs => eval_tree(operand).abs(),
        },
        Expr::Binary { op, lhs, rhs, .. } => {
            let (a, b) = (eval_tree(lhs), eval_tree(rhs));
            match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Pow => a.powf(b),
                _ => panic!("unexpected operator in arithmetic chain"),
            }
        }
        other => panic!("unexpected node in arithmetic chain: {other:?}"),
    }
}

/// Reference evaluation of `atoms[0] ops[0] atoms[1] ...` with the
/// language's precedence: `* /` over `+ -`, `^` tightest and
/// right-associative, unary minus inside the atom.
fn eval_reference(atoms: &[f64], ops: &[char]) -> f64 {
    // Fold the `^` chains first (right to left), then `* /`, then `+ -`.
    let mut values: Vec<f64> = atoms.to_vec();
    let mut operators: Vec<char> = ops.to_vec();

    while let Some(pos) = operators.iter().rposition(|&op| op == '^') {
        let folded = values[pos].powf(values[pos + 1]);
        values[pos] = folded;
        values.remove(pos + 1);
        operators.remove(pos);
    }
    while let Some(pos) = operators.iter().position(|&op| op == '*' || op == '/') {
        let folded = if operators[pos] == '*' {
            values[pos] * values[pos + 1]
        } else {
            values[pos] / values[pos + 1]
        };
        values[pos] = folded;
        values.remove(pos + 1);
        operators.remove(pos);
    }
    while let Some(pos) = operators.iter().position(|&op| op == '+' || op == '-') {
        let folded = if operators[pos] == '+' {
            values[pos] + values[pos + 1]
        } else {
            values[pos] - values[pos + 1]
        };
        values[pos] = folded;
        values.remove(pos + 1);
        operators.remove(pos);
    }
    values[0]
}

proptest! {
    #[test]
    fn arithmetic_chains_round_trip(
        signs in prop::collection::vec(prop::bool::ANY, 1..7),
        raw_atoms in prop::collection::vec(1i64..9, 1..7),
        raw_ops in prop::collection::vec(prop::sample::select(vec!['+', '-', '*', '/', '^']), 0..6),
    ) {
        let count = raw_atoms.len().min(raw_ops.len() + 1);
        let atoms = &raw_atoms[..count];
        let ops = &raw_ops[..count - 1];

        let mut text = String::new();
        let mut signed_atoms = Vec::new();
        for (i, atom) in atoms.iter().enumerate() {
            let negate = signs[i % signs.len()];
            if i > 0 {
                text.push(' ');
                text.push(ops[i - 1]);
                text.push(' ');
            }
            if negate {
                text.push('-');
            }
            text.push_str(&atom.to_string());
            signed_atoms.push(if negate { -(*atom as f64) } else { *atom as f64 });
        }

        let expected = eval_reference(&signed_atoms, ops);
        prop_assume!(expected.is_finite());

        let (ctx, interner) = static_context();
        let expr = parser::parse_expression(&text, interner, ctx)
            .unwrap_or_else(|e| panic!("'{text}' should parse: {e}"));
        let actual = eval_tree(expr);
        prop_assume!(actual.is_finite());

        let tolerance = 1e-10 * expected.abs().max(1.0);
        prop_assert!(
            (actual - expected).abs() <= tolerance,
            "'{text}': parsed {actual}, reference {expected}"
        );
    }
}

#[test]
fn power_chains_match_the_reference_evaluator() {
    // Spot checks pinning right-associativity of the reference itself.
    assert_eq!(eval_reference(&[2.0, 3.0, 2.0], &['^', '^']), 512.0);
    assert_eq!(eval_reference(&[2.0, 3.0, 4.0], &['+', '*']), 14.0);
    assert_eq!(eval_reference(&[24.0, 4.0, 2.0], &['/', '/']), 3.0);
}

// ── Lexer: whitespace and comments between tokens are inert ─────────

fn token_kinds(source: &str) -> Vec<TokenKind> {
    let mut lexer = Lexer::new(source);
    let mut kinds = Vec::new();
    loop {
        let token = lexer.get();
        if token.kind == TokenKind::Eof {
            break;
        }
        kinds.push(token.kind);
    }
    kinds
}

proptest! {
    #[test]
    fn whitespace_and_comments_do_not_change_the_kind_stream(
        choices in prop::collection::vec(0usize..6, 40),
    ) {
        let tokens = [
            "NEURON", "{", "SUFFIX", "kdr", "}", "SOLVE", "states", "METHOD",
            "cnexp", "~", "A", "+", "B", "<->", "C", "(", "k1", ",", "k2", ")",
            "a", "=", "3e2", "*", "2", "^", "x", "<=", "y", "!=", "12", "if",
            "else", "LOCAL", "t", "->", "0.5", "abs", "q_1", "CONSERVE",
        ];
        let separators = [" ", "  ", "\t", "\n", " : comment\n", " ? also a comment\n"];

        let baseline = token_kinds(&tokens.join(" "));

        let mut padded = String::new();
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                padded.push_str(separators[choices[i % choices.len()] % separators.len()]);
            }
            padded.push_str(token);
        }
        prop_assert_eq!(token_kinds(&padded), baseline);
    }
}

// ── Stoichiometric invariant ────────────────────────────────────────

proptest! {
    #[test]
    fn stoich_term_count_tracks_identifier_count(
        plan in prop::collection::vec(
            (prop::bool::ANY, prop::option::of(0i64..40), 0usize..6),
            1..8,
        ),
    ) {
        let species = ["A", "B", "C", "x", "y", "s1"];
        let mut text = String::new();
        let mut expected = Vec::new();
        for (i, (negative, coeff, which)) in plan.iter().enumerate() {
            if i > 0 {
                text.push_str(" + ");
            }
            if *negative {
                text.push('-');
            }
            if let Some(c) = coeff {
                text.push_str(&c.to_string());
            }
            text.push_str(species[which % species.len()]);
            let magnitude = coeff.unwrap_or(1);
            expected.push(if *negative { -magnitude } else { magnitude });
        }

        let (ctx, interner) = static_context();
        let stoich = parser::parse_stoich_expression(&text, interner, ctx)
            .unwrap_or_else(|e| panic!("'{text}' should parse: {e}"));
        let terms = stoich.as_stoich().unwrap();

        // One term per identifier consumed.
        prop_assert_eq!(terms.len(), plan.len());
        let coeffs: Vec<i64> = terms
            .iter()
            .map(|t| t.as_stoich_term().unwrap().0)
            .collect();
        prop_assert_eq!(coeffs, expected);
    }

    #[test]
    fn unweighted_stoich_absolute_sum_equals_identifier_count(
        signs in prop::collection::vec(prop::bool::ANY, 1..8),
    ) {
        let species = ["A", "B", "C", "D", "E", "F", "G", "H"];
        let mut text = String::new();
        for (i, negative) in signs.iter().enumerate() {
            if i > 0 {
                text.push_str(if *negative { " - " } else { " + " });
            } else if *negative {
                text.push('-');
            }
            text.push_str(species[i]);
        }

        let (ctx, interner) = static_context();
        let stoich = parser::parse_stoich_expression(&text, interner, ctx)
            .unwrap_or_else(|e| panic!("'{text}' should parse: {e}"));
        let terms = stoich.as_stoich().unwrap();

        let total: i64 = terms
            .iter()
            .map(|t| t.as_stoich_term().unwrap().0.abs())
            .sum();
        prop_assert_eq!(total, signs.len() as i64);
    }
}
