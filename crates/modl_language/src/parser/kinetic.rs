//! Kinetic-scheme grammars.
//!
//! Stoichiometric expressions are signed integer-weighted sums of species
//! names. The coefficient must tokenise as an integer: `0A` and `12A` are a
//! coefficient and a species, while `0.2A` and `3e2` fail because the lexer
//! classifies them as reals before this grammar ever sees them.

use super::expression::ExpressionParsing;
use super::{describe, Parser};
use crate::ast::{Expr, IonKind, SolveMethod};
use crate::token::TokenKind;
use modl_base::{Diagnostic, Location, ParseResult};

pub trait KineticParsing<'s, 'a, 'int> {
    fn parse_solve(&mut self) -> ParseResult<&'a Expr<'a>>;
    fn parse_conductance(&mut self) -> ParseResult<&'a Expr<'a>>;
    fn parse_stoich_term(&mut self) -> ParseResult<&'a Expr<'a>>;
    fn parse_stoich_expression(&mut self) -> ParseResult<&'a Expr<'a>>;
    fn parse_reaction_expression(&mut self) -> ParseResult<&'a Expr<'a>>;
    fn parse_conserve_expression(&mut self) -> ParseResult<&'a Expr<'a>>;
    fn stoich_term_tail(&mut self, negative: bool, location: Location)
        -> ParseResult<&'a Expr<'a>>;
}

impl<'s, 'a, 'int> KineticParsing<'s, 'a, 'int> for Parser<'s, 'a, 'int> {
    /// `SOLVE name (METHOD cnexp|sparse)?`
    fn parse_solve(&mut self) -> ParseResult<&'a Expr<'a>> {
        let keyword = self.expect(TokenKind::Solve, "SOLVE")?;
        let block_token = self.expect(TokenKind::Identifier, "a block name")?;
        let block = self.intern(block_token);
        let method = if self.eat(TokenKind::Method) {
            let token = self.peek();
            match token.kind {
                TokenKind::Cnexp => {
                    self.advance();
                    SolveMethod::Cnexp
                }
                TokenKind::Sparse => {
                    self.advance();
                    SolveMethod::Sparse
                }
                _ => {
                    return Err(Diagnostic::new(
                        format!(
                            "expected an integration method (cnexp or sparse), found {}",
                            describe(&token)
                        ),
                        token.location,
                    ))
                }
            }
        } else {
            SolveMethod::None
        };
        Ok(self.ctx.alloc(Expr::Solve {
            block,
            method,
            location: keyword.location,
        }))
    }

    /// `CONDUCTANCE gname (USEION ion)?`
    fn parse_conductance(&mut self) -> ParseResult<&'a Expr<'a>> {
        let keyword = self.expect(TokenKind::Conductance, "CONDUCTANCE")?;
        let variable_token = self.expect(TokenKind::Identifier, "a conductance variable")?;
        let variable = self.intern(variable_token);
        let ion = if self.eat(TokenKind::UseIon) {
            let token = self.expect(TokenKind::Identifier, "an ion name")?;
            IonKind::from_name(token.spelling, self.interner)
        } else {
            IonKind::Nonspecific
        };
        Ok(self.ctx.alloc(Expr::Conductance {
            variable,
            ion,
            location: keyword.location,
        }))
    }

    /// One stoichiometric term: `(-)? (integer)? identifier`.
    fn parse_stoich_term(&mut self) -> ParseResult<&'a Expr<'a>> {
        let location = self.peek().location;
        let negative = self.eat(TokenKind::Minus);
        self.stoich_term_tail(negative, location)
    }

    fn stoich_term_tail(
        &mut self,
        negative: bool,
        location: Location,
    ) -> ParseResult<&'a Expr<'a>> {
        let token = self.peek();
        let coefficient = match token.kind {
            TokenKind::Integer => {
                self.advance();
                token.spelling.parse::<i64>().map_err(|_| {
                    Diagnostic::new(
                        format!(
                            "stoichiometric coefficient '{}' is out of range",
                            token.spelling
                        ),
                        token.location,
                    )
                })?
            }
            TokenKind::Real => {
                return Err(Diagnostic::new(
                    format!(
                        "stoichiometric coefficient must be an integer, found '{}'",
                        token.spelling
                    ),
                    token.location,
                ))
            }
            _ => 1,
        };
        let ident_token = self.expect(TokenKind::Identifier, "a species name")?;
        let ident = self.intern(ident_token);
        Ok(self.ctx.alloc(Expr::StoichTerm {
            coefficient: if negative { -coefficient } else { coefficient },
            ident,
            location,
        }))
    }

    /// Possibly empty `term ((+|-) term)*`; a `-` separator negates the term
    /// it introduces.
    fn parse_stoich_expression(&mut self) -> ParseResult<&'a Expr<'a>> {
        let location = self.peek().location;
        let mut terms = Vec::new();
        if matches!(
            self.peek().kind,
            TokenKind::Minus | TokenKind::Integer | TokenKind::Identifier
        ) {
            terms.push(self.parse_stoich_term()?);
            loop {
                if self.eat(TokenKind::Plus) {
                    terms.push(self.parse_stoich_term()?);
                } else if self.check(TokenKind::Minus) {
                    let minus = self.advance();
                    terms.push(self.stoich_term_tail(true, minus.location)?);
                } else {
                    break;
                }
            }
        }
        Ok(self.ctx.alloc(Expr::Stoich {
            terms: self.ctx.alloc_refs(terms),
            location,
        }))
    }

    /// `~ stoich <-> stoich (fwd, rev)`
    fn parse_reaction_expression(&mut self) -> ParseResult<&'a Expr<'a>> {
        let tilde = self.expect(TokenKind::Tilde, "'~'")?;
        let lhs = self.parse_stoich_expression()?;
        let token = self.peek();
        if token.kind == TokenKind::Arrow {
            return Err(Diagnostic::new(
                "one-directional reactions are not supported, use '<->'",
                token.location,
            ));
        }
        self.expect(TokenKind::ReactionArrow, "'<->'")?;
        let rhs = self.parse_stoich_expression()?;
        self.expect(TokenKind::LParen, "'(' before the rate pair")?;
        let fwd_rate = self.parse_expression()?;
        self.expect(TokenKind::Comma, "',' between forward and reverse rates")?;
        let rev_rate = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(self.ctx.alloc(Expr::Reaction {
            lhs,
            rhs,
            fwd_rate,
            rev_rate,
            location: tilde.location,
        }))
    }

    /// `CONSERVE stoich = expr`; the left side may be empty.
    fn parse_conserve_expression(&mut self) -> ParseResult<&'a Expr<'a>> {
        let keyword = self.expect(TokenKind::Conserve, "CONSERVE")?;
        let lhs = self.parse_stoich_expression()?;
        self.expect(TokenKind::Assign, "'=' after the conserved quantity")?;
        let rhs = self.parse_expression()?;
        Ok(self.ctx.alloc(Expr::Conserve {
            lhs,
            rhs,
            location: keyword.location,
        }))
    }
}
