//! Expression grammar: precedence climbing.
//!
//! The table, loosest to tightest:
//!
//! | level | operators            | associativity |
//! |-------|----------------------|---------------|
//! | 2     | `< <= > >= == !=`    | left          |
//! | 3     | `+ -`                | left          |
//! | 4     | `* /`                | left          |
//! | 5     | `^`                  | right         |
//!
//! Prefix `+`/`-` bind tighter than `^`, so `-2^2` is `(-2)^2`. Assignment is
//! not an operator here at all; it belongs to the line-expression grammar, so
//! `(x=3)` fails at the `=`.

use super::{describe, Parser};
use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::token::TokenKind;
use modl_base::{Diagnostic, ParseResult};

/// Infix operator, its precedence, and whether it is right-associative.
fn binary_operator(kind: TokenKind) -> Option<(BinaryOp, u8, bool)> {
    let entry = match kind {
        TokenKind::Lt => (BinaryOp::Lt, 2, false),
        TokenKind::Le => (BinaryOp::Le, 2, false),
        TokenKind::Gt => (BinaryOp::Gt, 2, false),
        TokenKind::Ge => (BinaryOp::Ge, 2, false),
        TokenKind::Eq => (BinaryOp::Eq, 2, false),
        TokenKind::Ne => (BinaryOp::Ne, 2, false),
        TokenKind::Plus => (BinaryOp::Add, 3, false),
        TokenKind::Minus => (BinaryOp::Sub, 3, false),
        TokenKind::Star => (BinaryOp::Mul, 4, false),
        TokenKind::Slash => (BinaryOp::Div, 4, false),
        TokenKind::Caret => (BinaryOp::Pow, 5, true),
        _ => return None,
    };
    Some(entry)
}

pub trait ExpressionParsing<'s, 'a, 'int> {
    fn parse_expression(&mut self) -> ParseResult<&'a Expr<'a>>;
    fn parse_binary_expr(&mut self, min_prec: u8) -> ParseResult<&'a Expr<'a>>;
    fn parse_unary_expr(&mut self) -> ParseResult<&'a Expr<'a>>;
    fn parse_primary_expr(&mut self) -> ParseResult<&'a Expr<'a>>;
    fn parse_call_args(&mut self) -> ParseResult<Vec<&'a Expr<'a>>>;
}

impl<'s, 'a, 'int> ExpressionParsing<'s, 'a, 'int> for Parser<'s, 'a, 'int> {
    fn parse_expression(&mut self) -> ParseResult<&'a Expr<'a>> {
        self.parse_binary_expr(0)
    }

    fn parse_binary_expr(&mut self, min_prec: u8) -> ParseResult<&'a Expr<'a>> {
        let mut lhs = self.parse_unary_expr()?;
        while let Some((op, prec, right_assoc)) = binary_operator(self.peek().kind) {
            if prec < min_prec {
                break;
            }
            self.advance();
            let next_min = if right_assoc { prec } else { prec + 1 };
            let rhs = self.parse_binary_expr(next_min)?;
            lhs = self.ctx.alloc(Expr::Binary {
                op,
                lhs,
                rhs,
                location: lhs.location(),
            });
        }
        Ok(lhs)
    }

    fn parse_unary_expr(&mut self) -> ParseResult<&'a Expr<'a>> {
        let token = self.peek();
        let op = match token.kind {
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Minus => UnaryOp::Minus,
            _ => return self.parse_primary_expr(),
        };
        self.advance();
        let operand = self.parse_unary_expr()?;
        Ok(self.ctx.alloc(Expr::Unary {
            op,
            operand,
            location: token.location,
        }))
    }

    fn parse_primary_expr(&mut self) -> ParseResult<&'a Expr<'a>> {
        let token = self.peek();
        match token.kind {
            TokenKind::Integer => {
                self.advance();
                let value: i64 = token.spelling.parse().map_err(|_| {
                    Diagnostic::new(
                        format!("integer literal '{}' is out of range", token.spelling),
                        token.location,
                    )
                })?;
                Ok(self.ctx.alloc(Expr::Integer {
                    value,
                    location: token.location,
                }))
            }
            TokenKind::Real => {
                self.advance();
                let value: f64 = token.spelling.parse().map_err(|_| {
                    Diagnostic::new(
                        format!("malformed real literal '{}'", token.spelling),
                        token.location,
                    )
                })?;
                Ok(self.ctx.alloc(Expr::Real {
                    value,
                    location: token.location,
                }))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Identifier => {
                self.advance();
                let name = self.intern(token);
                if self.check(TokenKind::LParen) {
                    let args = self.parse_call_args()?;
                    Ok(self.ctx.alloc(Expr::Call {
                        callee: name,
                        args: self.ctx.alloc_refs(args),
                        location: token.location,
                    }))
                } else if self.eat(TokenKind::Prime) {
                    Ok(self.ctx.alloc(Expr::Derivative {
                        name,
                        location: token.location,
                    }))
                } else {
                    Ok(self.ctx.alloc(Expr::Identifier {
                        name,
                        location: token.location,
                    }))
                }
            }
            TokenKind::Exp | TokenKind::Log | TokenKind::Abs => {
                self.advance();
                let op = match token.kind {
                    TokenKind::Exp => UnaryOp::Exp,
                    TokenKind::Log => UnaryOp::Log,
                    _ => UnaryOp::Abs,
                };
                self.expect(TokenKind::LParen, "'('")?;
                let operand = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(self.ctx.alloc(Expr::Unary {
                    op,
                    operand,
                    location: token.location,
                }))
            }
            TokenKind::Min | TokenKind::Max => {
                self.advance();
                let op = if token.kind == TokenKind::Min {
                    BinaryOp::Min
                } else {
                    BinaryOp::Max
                };
                self.expect(TokenKind::LParen, "'('")?;
                let lhs = self.parse_expression()?;
                self.expect(TokenKind::Comma, "','")?;
                let rhs = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(self.ctx.alloc(Expr::Binary {
                    op,
                    lhs,
                    rhs,
                    location: token.location,
                }))
            }
            TokenKind::Error => Err(self.lex_failure()),
            _ => Err(Diagnostic::new(
                format!("unexpected {} in expression", describe(&token)),
                token.location,
            )),
        }
    }

    fn parse_call_args(&mut self) -> ParseResult<Vec<&'a Expr<'a>>> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if self.eat(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(args)
    }
}
