//! Helpers for driving single grammars in tests.
//!
//! Parsed trees borrow the arenas they were allocated into. Tests rarely
//! want to thread those lifetimes through, so [`static_context`] leaks a
//! fresh set of arenas (and an interner) per call, yielding `'static` trees.
//! Leaking is fine in tests; each test process discards everything at exit.

use crate::ast::{AstContext, Expr};
use modl_base::{Arena, Interner, Symbol};

/// A leaked arena set plus interner with `'static` lifetime.
pub fn static_context() -> (AstContext<'static>, &'static mut Interner) {
    let exprs: &'static Arena<Expr<'static>> = Box::leak(Box::new(Arena::new()));
    let refs: &'static Arena<&'static Expr<'static>> = Box::leak(Box::new(Arena::new()));
    let names: &'static Arena<Symbol> = Box::leak(Box::new(Arena::new()));
    let interner: &'static mut Interner = Box::leak(Box::new(Interner::new()));
    (AstContext::new(exprs, refs, names), interner)
}

/// Parses an expression with a fresh leaked context, panicking on failure.
#[macro_export]
macro_rules! parse_expr {
    ($text:expr) => {{
        let (ctx, interner) = $crate::test_utils::static_context();
        $crate::parser::parse_expression($text, interner, ctx).expect("expression should parse")
    }};
}
