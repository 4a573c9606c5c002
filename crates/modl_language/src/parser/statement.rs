//! Blocks and statements.
//!
//! A block is `{ stmt* }`. Statement dispatch keys on the first token of the
//! line; anything that is not a keyword form is a line expression, meaning a
//! single expression or an assignment. Nested blocks exist only behind if/else; a
//! free-standing `{` is rejected.

use super::expression::ExpressionParsing;
use super::kinetic::KineticParsing;
use super::{describe, Parser};
use crate::ast::Expr;
use crate::token::TokenKind;
use modl_base::{Diagnostic, ParseResult};

pub trait StatementParsing<'s, 'a, 'int> {
    fn parse_block(&mut self, is_nested: bool) -> ParseResult<&'a Expr<'a>>;
    fn parse_statement(&mut self) -> ParseResult<&'a Expr<'a>>;
    fn parse_if(&mut self) -> ParseResult<&'a Expr<'a>>;
    fn parse_local(&mut self) -> ParseResult<&'a Expr<'a>>;
    fn parse_line_expression(&mut self) -> ParseResult<&'a Expr<'a>>;
    fn expect_statement_end(&mut self) -> ParseResult<()>;
}

impl<'s, 'a, 'int> StatementParsing<'s, 'a, 'int> for Parser<'s, 'a, 'int> {
    fn parse_block(&mut self, is_nested: bool) -> ParseResult<&'a Expr<'a>> {
        let brace = self.expect(TokenKind::LBrace, "'{'")?;
        let mut statements = Vec::new();
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    return Err(Diagnostic::new(
                        "unbalanced braces: block is not closed",
                        token.location,
                    ))
                }
                TokenKind::Error => return Err(self.lex_failure()),
                _ => {
                    let statement = self.parse_statement()?;
                    // Brace-closed statements delimit themselves; everything
                    // else must end the line.
                    if !matches!(statement, Expr::If { .. } | Expr::Initial { .. }) {
                        self.expect_statement_end()?;
                    }
                    statements.push(statement);
                }
            }
        }
        Ok(self.ctx.alloc(Expr::Block {
            statements: self.ctx.alloc_refs(statements),
            is_nested,
            location: brace.location,
        }))
    }

    fn parse_statement(&mut self) -> ParseResult<&'a Expr<'a>> {
        let token = self.peek();
        match token.kind {
            TokenKind::Local => self.parse_local(),
            TokenKind::Solve => self.parse_solve(),
            TokenKind::Conductance => self.parse_conductance(),
            TokenKind::If => self.parse_if(),
            TokenKind::Conserve => self.parse_conserve_expression(),
            TokenKind::Tilde => self.parse_reaction_expression(),
            TokenKind::Initial => {
                self.advance();
                let body = self.parse_block(true)?;
                Ok(self.ctx.alloc(Expr::Initial {
                    body,
                    location: token.location,
                }))
            }
            TokenKind::LBrace => Err(Diagnostic::new(
                "free-standing blocks are not statements",
                token.location,
            )),
            TokenKind::Error => Err(self.lex_failure()),
            _ => self.parse_line_expression(),
        }
    }

    fn parse_if(&mut self) -> ParseResult<&'a Expr<'a>> {
        let keyword = self.expect(TokenKind::If, "'if'")?;
        self.expect(TokenKind::LParen, "'('")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')'")?;
        let then_branch = self.parse_block(true)?;
        let else_branch = if self.eat(TokenKind::Else) {
            if self.check(TokenKind::If) {
                Some(self.parse_if()?)
            } else {
                Some(self.parse_block(true)?)
            }
        } else {
            None
        };
        Ok(self.ctx.alloc(Expr::If {
            condition,
            then_branch,
            else_branch,
            location: keyword.location,
        }))
    }

    fn parse_local(&mut self) -> ParseResult<&'a Expr<'a>> {
        let keyword = self.expect(TokenKind::Local, "LOCAL")?;
        let mut names = Vec::new();
        loop {
            let token = self.expect(TokenKind::Identifier, "a variable name")?;
            let name = self.intern(token);
            if names.contains(&name) {
                return Err(Diagnostic::new(
                    format!("duplicate LOCAL variable '{}'", token.spelling),
                    token.location,
                ));
            }
            names.push(name);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(self.ctx.alloc(Expr::Local {
            names: self.ctx.alloc_names(names),
            location: keyword.location,
        }))
    }

    fn parse_line_expression(&mut self) -> ParseResult<&'a Expr<'a>> {
        let lhs = self.parse_expression()?;
        if !self.check(TokenKind::Assign) {
            return Ok(lhs);
        }
        let equals = self.advance();
        if !lhs.is_lvalue() {
            return Err(Diagnostic::new(
                "left-hand side of assignment is not assignable",
                equals.location,
            ));
        }
        let rhs = self.parse_expression()?;
        Ok(self.ctx.alloc(Expr::Assign {
            lhs,
            rhs,
            location: lhs.location(),
        }))
    }

    /// A statement ends at the line break: the next token must sit on a
    /// later line, close the block, or end the input.
    fn expect_statement_end(&mut self) -> ParseResult<()> {
        let previous = self.lexer.current().location;
        let next = self.peek();
        if matches!(next.kind, TokenKind::RBrace | TokenKind::Eof) {
            return Ok(());
        }
        if next.location.line == previous.line {
            return Err(Diagnostic::new(
                format!("expected end of statement, found {}", describe(&next)),
                next.location,
            ));
        }
        Ok(())
    }
}
