//! Two-pass recursive-descent parser.
//!
//! The parser owns a [`Lexer`] and drives it with single-token lookahead.
//! [`parse_module`] runs the full pipeline:
//!
//! 1. **Descriptive pass**: top-level dispatch on the leading keyword.
//!    TITLE, NEURON, STATE, PARAMETER, ASSIGNED, and UNITS blocks are
//!    interpreted and recorded on the [`Module`]; procedural blocks are
//!    registered by name/kind/position and skipped with brace counting.
//! 2. **Procedural pass**: for each registered block a fresh lexer is
//!    resumed at the recorded offset and the body is parsed into an AST
//!    attached to the block's symbol.
//!
//! Grammar mini-parsers live in the sibling modules and extend [`Parser`]
//! through traits: [`ExpressionParsing`], [`StatementParsing`],
//! [`KineticParsing`], [`DescriptiveParsing`]. Each of them is also reachable
//! directly through the free entry points at the bottom of this module, which
//! is how the test suites drive individual grammars.
//!
//! On the first failure a diagnostic is recorded and the enclosing construct
//! unwinds; the descriptive pass resynchronises at the next top-level
//! keyword, the procedural pass stops.

mod descriptive;
mod expression;
mod kinetic;
mod statement;


pub use descriptive::DescriptiveParsing;
pub use expression::ExpressionParsing;
pub use kinetic::KineticParsing;
pub use statement::StatementParsing;

use crate::ast::symbol::{BlockSpan, ProcedureKind, SymbolEntry};
use crate::ast::{AstContext, Expr};
use crate::lexer::Lexer;
use crate::module::Module;
use crate::token::{Token, TokenKind};
use modl_base::{Diagnostic, Interner, Location, ParseResult, Status, Symbol};
use tracing::trace;

pub struct Parser<'s, 'a, 'int> {
    pub(super) source: &'s str,
    pub(super) lexer: Lexer<'s>,
    pub(super) interner: &'int mut Interner,
    pub(super) ctx: AstContext<'a>,
}

impl<'s, 'a, 'int> Parser<'s, 'a, 'int> {
    pub fn new(source: &'s str, interner: &'int mut Interner, ctx: AstContext<'a>) -> Self {
        Self {
            source,
            lexer: Lexer::new(source),
            interner,
            ctx,
        }
    }

    pub fn location(&self) -> Location {
        self.lexer.location()
    }

    pub fn status(&self) -> Status {
        self.lexer.status()
    }

    // ── Token plumbing ──────────────────────────────────────────────

    pub(super) fn peek(&mut self) -> Token<'s> {
        self.lexer.peek()
    }

    pub(super) fn advance(&mut self) -> Token<'s> {
        self.lexer.get()
    }

    pub(super) fn check(&mut self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Consumes the next token when it has `kind`.
    pub(super) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// The sole point where a token mismatch becomes a diagnostic.
    pub(super) fn expect(&mut self, kind: TokenKind, hint: &str) -> ParseResult<Token<'s>> {
        let token = self.peek();
        if token.kind == kind {
            return Ok(self.advance());
        }
        if token.kind == TokenKind::Error {
            return Err(self.lex_failure());
        }
        Err(Diagnostic::new(
            format!("expected {hint}, found {}", describe(&token)),
            token.location,
        ))
    }

    /// Surfaces the diagnostic behind an `Error` token.
    pub(super) fn lex_failure(&mut self) -> Diagnostic {
        let location = self.lexer.location();
        self.lexer
            .take_diagnostic()
            .unwrap_or_else(|| Diagnostic::new("invalid input", location))
    }

    pub(super) fn intern(&mut self, token: Token<'s>) -> Symbol {
        self.interner.intern(token.spelling)
    }

    // ── Pass 1: descriptive scan ────────────────────────────────────

    fn run_descriptive_pass(&mut self, module: &mut Module<'a>) {
        loop {
            let token = self.peek();
            let step = match token.kind {
                TokenKind::Eof => break,
                TokenKind::Title => self.parse_title(module),
                TokenKind::Neuron => self.parse_neuron_block(module),
                TokenKind::State => self.parse_state_block(module),
                TokenKind::Parameter => self.parse_parameter_block(module),
                TokenKind::Assigned => self.parse_assigned_block(module),
                TokenKind::Units => self.parse_units_block(module),
                kind if kind.starts_procedural_block() => {
                    self.register_procedural_block(module)
                }
                TokenKind::Error => Err(self.lex_failure()),
                _ => Err(Diagnostic::new(
                    format!(
                        "expected a top-level block keyword, found {}",
                        describe(&token)
                    ),
                    token.location,
                )),
            };
            if let Err(diagnostic) = step {
                trace!(%diagnostic, "descriptive pass resynchronising");
                module.set_error(diagnostic);
                self.skip_to_top_level();
            }
        }
    }

    /// After an error, scan forward to the next block keyword.
    fn skip_to_top_level(&mut self) {
        loop {
            let token = self.peek();
            if token.kind == TokenKind::Eof || token.kind.starts_top_level_block() {
                break;
            }
            self.advance();
        }
    }

    /// Records a procedural block's name, kind, formals, and body position,
    /// skipping the body itself with brace counting.
    fn register_procedural_block(&mut self, module: &mut Module<'a>) -> ParseResult<()> {
        let keyword = self.advance();
        let kind = match keyword.kind {
            TokenKind::Procedure | TokenKind::Function => ProcedureKind::Normal,
            TokenKind::NetReceive => ProcedureKind::NetReceive,
            TokenKind::Initial => ProcedureKind::Initial,
            TokenKind::Breakpoint => ProcedureKind::Breakpoint,
            TokenKind::Kinetic => ProcedureKind::Kinetic,
            TokenKind::Derivative => ProcedureKind::Derivative,
            TokenKind::Linear => ProcedureKind::Linear,
            _ => unreachable!("caller checked for a procedural keyword"),
        };

        // INITIAL and BREAKPOINT blocks are anonymous; register them under
        // fixed names so downstream passes can find them.
        let (name, location) = match keyword.kind {
            TokenKind::Initial => (self.interner.intern("initial"), keyword.location),
            TokenKind::Breakpoint => (self.interner.intern("breakpoint"), keyword.location),
            TokenKind::NetReceive => (self.interner.intern("net_receive"), keyword.location),
            _ => {
                let name_token = self.expect(TokenKind::Identifier, "a block name")?;
                (self.intern(name_token), name_token.location)
            }
        };

        let args = if self.check(TokenKind::LParen) {
            self.parse_formals()?
        } else {
            Vec::new()
        };

        let offset = self.lexer.peek_start();
        let brace = self.expect(TokenKind::LBrace, "'{'")?;
        let block = BlockSpan {
            offset,
            location: brace.location,
        };
        self.skip_braced_block()?;

        let entry = if keyword.kind == TokenKind::Function {
            SymbolEntry::Function {
                name,
                args,
                body: None,
                location,
                block: Some(block),
            }
        } else {
            SymbolEntry::Procedure {
                name,
                kind,
                args,
                body: None,
                location,
                block: Some(block),
            }
        };
        module.declare(entry, self.interner)
    }

    /// `(name (unit)?, ...)` formal list; units are checked for shape and
    /// discarded.
    pub(super) fn parse_formals(&mut self) -> ParseResult<Vec<Symbol>> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if self.eat(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            let token = self.expect(TokenKind::Identifier, "an argument name")?;
            let name = self.intern(token);
            if args.contains(&name) {
                return Err(Diagnostic::new(
                    format!("duplicate argument '{}'", token.spelling),
                    token.location,
                ));
            }
            args.push(name);
            if self.check(TokenKind::LParen) {
                self.parse_unit_text()?;
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(args)
    }

    /// Skips a block whose `{` has already been consumed.
    fn skip_braced_block(&mut self) -> ParseResult<()> {
        let mut depth = 1usize;
        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                TokenKind::Eof => {
                    return Err(Diagnostic::new(
                        "unbalanced braces: block is not closed",
                        token.location,
                    ))
                }
                TokenKind::Error => return Err(self.lex_failure()),
                _ => {}
            }
        }
    }

    // ── Pass 2: procedural bodies ───────────────────────────────────

    fn run_procedural_pass(&mut self, module: &mut Module<'a>) {
        let targets: Vec<(Symbol, BlockSpan)> = module
            .symbols()
            .iter()
            .filter_map(|(name, entry)| match entry {
                SymbolEntry::Procedure {
                    block: Some(span), ..
                }
                | SymbolEntry::Function {
                    block: Some(span), ..
                } => Some((*name, *span)),
                _ => None,
            })
            .collect();

        for (name, span) in targets {
            trace!(block = self.interner.resolve(name), "parsing procedural body");
            self.lexer = Lexer::resume(self.source, span.offset, span.location);
            match self.parse_block(false) {
                Ok(body) => module.attach_body(name, body),
                Err(diagnostic) => {
                    module.set_error(diagnostic);
                    return;
                }
            }
        }
    }

    /// `PROCEDURE name(args) { ... }`, header and body in one sweep.
    pub fn parse_procedure_definition(&mut self) -> ParseResult<SymbolEntry<'a>> {
        self.expect(TokenKind::Procedure, "PROCEDURE")?;
        let name_token = self.expect(TokenKind::Identifier, "a procedure name")?;
        let name = self.intern(name_token);
        let args = if self.check(TokenKind::LParen) {
            self.parse_formals()?
        } else {
            Vec::new()
        };
        let body = self.parse_block(false)?;
        Ok(SymbolEntry::Procedure {
            name,
            kind: ProcedureKind::Normal,
            args,
            body: Some(body),
            location: name_token.location,
            block: None,
        })
    }

    /// `FUNCTION name(args) { ... }`, header and body in one sweep.
    pub fn parse_function_definition(&mut self) -> ParseResult<SymbolEntry<'a>> {
        self.expect(TokenKind::Function, "FUNCTION")?;
        let name_token = self.expect(TokenKind::Identifier, "a function name")?;
        let name = self.intern(name_token);
        let args = if self.check(TokenKind::LParen) {
            self.parse_formals()?
        } else {
            Vec::new()
        };
        let body = self.parse_block(false)?;
        Ok(SymbolEntry::Function {
            name,
            args,
            body: Some(body),
            location: name_token.location,
            block: None,
        })
    }
}

/// How a token reads in a diagnostic.
pub(super) fn describe(token: &Token<'_>) -> String {
    match token.kind {
        TokenKind::Eof => "end of input".to_string(),
        TokenKind::Error => format!("invalid input '{}'", token.spelling),
        _ => format!("'{}'", token.spelling),
    }
}

// ── Entry points ────────────────────────────────────────────────────
//
// Each grammar is callable on its own; the test suites lean on these.

/// Parses a whole mechanism description: descriptive pass, variable
/// installation, then the procedural pass. Never fails outright: a failed
/// parse comes back as a module with `Status::Error` and a first error.
#[tracing::instrument(skip_all, fields(module = name))]
pub fn parse_module<'a>(
    name: &str,
    source: &str,
    interner: &mut Interner,
    ctx: AstContext<'a>,
) -> Module<'a> {
    let mut module = Module::new(name, source);
    let mut parser = Parser::new(source, interner, ctx);

    parser.run_descriptive_pass(&mut module);
    if module.status().is_happy() {
        if let Err(diagnostic) = parser.add_variables_to_symbols(&mut module) {
            module.set_error(diagnostic);
        }
    }
    if module.status().is_happy() {
        parser.run_procedural_pass(&mut module);
    }
    trace!(status = ?module.status(), symbols = module.symbols().len(), "parse finished");
    module
}

pub fn parse_expression<'a>(
    text: &str,
    interner: &mut Interner,
    ctx: AstContext<'a>,
) -> ParseResult<&'a Expr<'a>> {
    ExpressionParsing::parse_expression(&mut Parser::new(text, interner, ctx))
}

pub fn parse_line_expression<'a>(
    text: &str,
    interner: &mut Interner,
    ctx: AstContext<'a>,
) -> ParseResult<&'a Expr<'a>> {
    StatementParsing::parse_line_expression(&mut Parser::new(text, interner, ctx))
}

pub fn parse_procedure<'a>(
    text: &str,
    interner: &mut Interner,
    ctx: AstContext<'a>,
) -> ParseResult<SymbolEntry<'a>> {
    Parser::new(text, interner, ctx).parse_procedure_definition()
}

pub fn parse_function<'a>(
    text: &str,
    interner: &mut Interner,
    ctx: AstContext<'a>,
) -> ParseResult<SymbolEntry<'a>> {
    Parser::new(text, interner, ctx).parse_function_definition()
}

pub fn parse_solve<'a>(
    text: &str,
    interner: &mut Interner,
    ctx: AstContext<'a>,
) -> ParseResult<&'a Expr<'a>> {
    KineticParsing::parse_solve(&mut Parser::new(text, interner, ctx))
}

pub fn parse_conductance<'a>(
    text: &str,
    interner: &mut Interner,
    ctx: AstContext<'a>,
) -> ParseResult<&'a Expr<'a>> {
    KineticParsing::parse_conductance(&mut Parser::new(text, interner, ctx))
}

pub fn parse_if<'a>(
    text: &str,
    interner: &mut Interner,
    ctx: AstContext<'a>,
) -> ParseResult<&'a Expr<'a>> {
    StatementParsing::parse_if(&mut Parser::new(text, interner, ctx))
}

pub fn parse_local<'a>(
    text: &str,
    interner: &mut Interner,
    ctx: AstContext<'a>,
) -> ParseResult<&'a Expr<'a>> {
    StatementParsing::parse_local(&mut Parser::new(text, interner, ctx))
}

pub fn parse_stoich_term<'a>(
    text: &str,
    interner: &mut Interner,
    ctx: AstContext<'a>,
) -> ParseResult<&'a Expr<'a>> {
    KineticParsing::parse_stoich_term(&mut Parser::new(text, interner, ctx))
}

pub fn parse_stoich_expression<'a>(
    text: &str,
    interner: &mut Interner,
    ctx: AstContext<'a>,
) -> ParseResult<&'a Expr<'a>> {
    KineticParsing::parse_stoich_expression(&mut Parser::new(text, interner, ctx))
}

pub fn parse_reaction_expression<'a>(
    text: &str,
    interner: &mut Interner,
    ctx: AstContext<'a>,
) -> ParseResult<&'a Expr<'a>> {
    KineticParsing::parse_reaction_expression(&mut Parser::new(text, interner, ctx))
}

pub fn parse_conserve_expression<'a>(
    text: &str,
    interner: &mut Interner,
    ctx: AstContext<'a>,
) -> ParseResult<&'a Expr<'a>> {
    KineticParsing::parse_conserve_expression(&mut Parser::new(text, interner, ctx))
}

/// Parses a lone STATE block into `module`.
pub fn parse_state_block<'a>(
    text: &str,
    module: &mut Module<'a>,
    interner: &mut Interner,
    ctx: AstContext<'a>,
) -> ParseResult<()> {
    DescriptiveParsing::parse_state_block(&mut Parser::new(text, interner, ctx), module)
}
