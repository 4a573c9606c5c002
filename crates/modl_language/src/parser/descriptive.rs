//! Descriptive blocks: TITLE, NEURON, STATE, PARAMETER, ASSIGNED, UNITS.
//!
//! These populate the [`Module`] directly; no AST is built. Units are
//! collected as raw text between parentheses (`(mA/cm2)` is three tokens,
//! stored as one string) and are never interpreted.

use super::{describe, Parser};
use crate::ast::symbol::{SymbolEntry, VariableKind};
use crate::ast::IonKind;
use crate::module::{Ion, Module, UnitDef, VariableDef};
use crate::token::TokenKind;
use modl_base::{Diagnostic, Location, ParseResult};

pub trait DescriptiveParsing<'s, 'a, 'int> {
    fn parse_title(&mut self, module: &mut Module<'a>) -> ParseResult<()>;
    fn parse_neuron_block(&mut self, module: &mut Module<'a>) -> ParseResult<()>;
    fn parse_state_block(&mut self, module: &mut Module<'a>) -> ParseResult<()>;
    fn parse_parameter_block(&mut self, module: &mut Module<'a>) -> ParseResult<()>;
    fn parse_assigned_block(&mut self, module: &mut Module<'a>) -> ParseResult<()>;
    fn parse_units_block(&mut self, module: &mut Module<'a>) -> ParseResult<()>;
    fn add_variables_to_symbols(&mut self, module: &mut Module<'a>) -> ParseResult<()>;
    fn parse_unit_text(&mut self) -> ParseResult<String>;
    fn parse_signed_number(&mut self) -> ParseResult<f64>;
    fn parse_name_list(&mut self) -> ParseResult<Vec<String>>;
}

impl<'s, 'a, 'int> DescriptiveParsing<'s, 'a, 'int> for Parser<'s, 'a, 'int> {
    /// `TITLE free text to the end of the line`
    fn parse_title(&mut self, module: &mut Module<'a>) -> ParseResult<()> {
        self.expect(TokenKind::Title, "TITLE")?;
        let text = self.lexer.rest_of_line();
        module.set_title(text);
        Ok(())
    }

    fn parse_neuron_block(&mut self, module: &mut Module<'a>) -> ParseResult<()> {
        self.expect(TokenKind::Neuron, "NEURON")?;
        self.expect(TokenKind::LBrace, "'{'")?;
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::RBrace => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::Suffix => {
                    self.advance();
                    let name = self.expect(TokenKind::Identifier, "a mechanism name")?;
                    module.neuron_info_mut().suffix = Some(name.spelling.to_string());
                }
                TokenKind::PointProcess => {
                    self.advance();
                    let name = self.expect(TokenKind::Identifier, "a point process name")?;
                    module.neuron_info_mut().point_process = Some(name.spelling.to_string());
                }
                TokenKind::NonspecificCurrent => {
                    self.advance();
                    let names = self.parse_name_list()?;
                    module.neuron_info_mut().nonspecific_currents.extend(names);
                }
                TokenKind::UseIon => {
                    self.advance();
                    let ion = self.parse_useion_clause()?;
                    module.neuron_info_mut().ion_deps.push(ion);
                }
                TokenKind::Range => {
                    self.advance();
                    let names = self.parse_name_list()?;
                    module.neuron_info_mut().range.extend(names);
                }
                TokenKind::Global => {
                    self.advance();
                    let names = self.parse_name_list()?;
                    module.neuron_info_mut().global.extend(names);
                }
                TokenKind::Eof => {
                    return Err(Diagnostic::new(
                        "unbalanced braces: NEURON block is not closed",
                        token.location,
                    ))
                }
                TokenKind::Error => return Err(self.lex_failure()),
                _ => {
                    return Err(Diagnostic::new(
                        format!("unexpected {} in NEURON block", describe(&token)),
                        token.location,
                    ))
                }
            }
        }
    }

    /// `STATE { name (unit)? ... }`
    fn parse_state_block(&mut self, module: &mut Module<'a>) -> ParseResult<()> {
        self.expect(TokenKind::State, "STATE")?;
        self.expect(TokenKind::LBrace, "'{'")?;
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::RBrace => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::Identifier => {
                    self.advance();
                    let name = self.intern(token);
                    let unit = if self.check(TokenKind::LParen) {
                        Some(self.parse_unit_text()?)
                    } else {
                        None
                    };
                    module.add_state_var(VariableDef {
                        name,
                        kind: VariableKind::State,
                        unit,
                        default: None,
                        range: None,
                        location: token.location,
                    });
                }
                TokenKind::Eof => {
                    return Err(Diagnostic::new(
                        "unbalanced braces: STATE block is not closed",
                        token.location,
                    ))
                }
                TokenKind::Error => return Err(self.lex_failure()),
                _ => {
                    return Err(Diagnostic::new(
                        format!("unexpected {} in STATE block", describe(&token)),
                        token.location,
                    ))
                }
            }
        }
    }

    /// `PARAMETER { name = literal (unit)? (<lo, hi>)? ... }`
    fn parse_parameter_block(&mut self, module: &mut Module<'a>) -> ParseResult<()> {
        self.expect(TokenKind::Parameter, "PARAMETER")?;
        self.expect(TokenKind::LBrace, "'{'")?;
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::RBrace => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::Identifier => {
                    self.advance();
                    let name = self.intern(token);
                    self.expect(TokenKind::Assign, "'='")?;
                    let default = self.parse_signed_number()?;
                    let unit = if self.check(TokenKind::LParen) {
                        Some(self.parse_unit_text()?)
                    } else {
                        None
                    };
                    let range = if self.eat(TokenKind::Lt) {
                        let lo = self.parse_signed_number()?;
                        self.expect(TokenKind::Comma, "','")?;
                        let hi = self.parse_signed_number()?;
                        self.expect(TokenKind::Gt, "'>'")?;
                        Some((lo, hi))
                    } else {
                        None
                    };
                    module.add_parameter(VariableDef {
                        name,
                        kind: VariableKind::Parameter,
                        unit,
                        default: Some(default),
                        range,
                        location: token.location,
                    });
                }
                TokenKind::Eof => {
                    return Err(Diagnostic::new(
                        "unbalanced braces: PARAMETER block is not closed",
                        token.location,
                    ))
                }
                TokenKind::Error => return Err(self.lex_failure()),
                _ => {
                    return Err(Diagnostic::new(
                        format!("unexpected {} in PARAMETER block", describe(&token)),
                        token.location,
                    ))
                }
            }
        }
    }

    /// `ASSIGNED { name (unit)? ... }`
    fn parse_assigned_block(&mut self, module: &mut Module<'a>) -> ParseResult<()> {
        self.expect(TokenKind::Assigned, "ASSIGNED")?;
        self.expect(TokenKind::LBrace, "'{'")?;
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::RBrace => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::Identifier => {
                    self.advance();
                    let name = self.intern(token);
                    let unit = if self.check(TokenKind::LParen) {
                        Some(self.parse_unit_text()?)
                    } else {
                        None
                    };
                    module.add_assigned(VariableDef {
                        name,
                        kind: VariableKind::Assigned,
                        unit,
                        default: None,
                        range: None,
                        location: token.location,
                    });
                }
                TokenKind::Eof => {
                    return Err(Diagnostic::new(
                        "unbalanced braces: ASSIGNED block is not closed",
                        token.location,
                    ))
                }
                TokenKind::Error => return Err(self.lex_failure()),
                _ => {
                    return Err(Diagnostic::new(
                        format!("unexpected {} in ASSIGNED block", describe(&token)),
                        token.location,
                    ))
                }
            }
        }
    }

    /// `UNITS { (unit) = (unit) ... }`, stored verbatim, never interpreted.
    fn parse_units_block(&mut self, module: &mut Module<'a>) -> ParseResult<()> {
        self.expect(TokenKind::Units, "UNITS")?;
        self.expect(TokenKind::LBrace, "'{'")?;
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::RBrace => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::LParen => {
                    let from = self.parse_unit_text()?;
                    self.expect(TokenKind::Assign, "'='")?;
                    let to = self.parse_unit_text()?;
                    module.add_unit(UnitDef { from, to });
                }
                TokenKind::Eof => {
                    return Err(Diagnostic::new(
                        "unbalanced braces: UNITS block is not closed",
                        token.location,
                    ))
                }
                TokenKind::Error => return Err(self.lex_failure()),
                _ => {
                    return Err(Diagnostic::new(
                        format!("unexpected {} in UNITS block", describe(&token)),
                        token.location,
                    ))
                }
            }
        }
    }

    /// Installs every declared variable into the symbol table. Procedural
    /// names are already present, so clashes across sections and with block
    /// names surface here.
    fn add_variables_to_symbols(&mut self, module: &mut Module<'a>) -> ParseResult<()> {
        let declared: Vec<VariableDef> = module
            .state_vars()
            .iter()
            .chain(module.parameters())
            .chain(module.assigned())
            .cloned()
            .collect();
        for def in declared {
            module.declare(
                SymbolEntry::Variable {
                    name: def.name,
                    kind: def.kind,
                    unit: def.unit,
                    default: def.default,
                    range: def.range,
                    location: def.location,
                },
                self.interner,
            )?;
        }

        // Ion currents and potentials named in USEION clauses resolve as
        // indexed variables unless the module declared them itself.
        let ion_vars: Vec<String> = module
            .neuron_info()
            .ion_deps
            .iter()
            .flat_map(|ion| ion.read.iter().chain(ion.write.iter()).cloned())
            .collect();
        for var in ion_vars {
            let name = self.interner.intern(&var);
            if module.symbol(name).is_none() {
                module.declare(
                    SymbolEntry::Variable {
                        name,
                        kind: VariableKind::Ion,
                        unit: None,
                        default: None,
                        range: None,
                        location: Location::start(),
                    },
                    self.interner,
                )?;
            }
        }
        Ok(())
    }

    /// Raw text between `(` and `)`, concatenated without separators.
    fn parse_unit_text(&mut self) -> ParseResult<String> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut text = String::new();
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::RParen => {
                    self.advance();
                    return Ok(text);
                }
                TokenKind::Eof => {
                    return Err(Diagnostic::new("unterminated unit", token.location))
                }
                TokenKind::Error => return Err(self.lex_failure()),
                _ => {
                    self.advance();
                    text.push_str(token.spelling);
                }
            }
        }
    }

    fn parse_signed_number(&mut self) -> ParseResult<f64> {
        let negative = self.eat(TokenKind::Minus);
        let token = self.peek();
        let value: f64 = match token.kind {
            TokenKind::Integer | TokenKind::Real => {
                self.advance();
                token.spelling.parse().map_err(|_| {
                    Diagnostic::new(
                        format!("malformed numeric literal '{}'", token.spelling),
                        token.location,
                    )
                })?
            }
            TokenKind::Error => return Err(self.lex_failure()),
            _ => {
                return Err(Diagnostic::new(
                    format!("expected a numeric literal, found {}", describe(&token)),
                    token.location,
                ))
            }
        };
        Ok(if negative { -value } else { value })
    }

    /// `name (, name)*`
    fn parse_name_list(&mut self) -> ParseResult<Vec<String>> {
        let mut names = Vec::new();
        loop {
            let token = self.expect(TokenKind::Identifier, "a name")?;
            names.push(token.spelling.to_string());
            if !self.eat(TokenKind::Comma) {
                return Ok(names);
            }
        }
    }
}

impl<'s, 'a, 'int> Parser<'s, 'a, 'int> {
    /// `USEION ion (READ names)? (WRITE names)? (VALENCE int)?`
    fn parse_useion_clause(&mut self) -> ParseResult<Ion> {
        let ion_token = self.expect(TokenKind::Identifier, "an ion name")?;
        if !IonKind::from_name(ion_token.spelling, self.interner).is_standard() {
            return Err(Diagnostic::new(
                format!("unknown ion '{}' in USEION", ion_token.spelling),
                ion_token.location,
            ));
        }
        let mut ion = Ion {
            name: ion_token.spelling.to_string(),
            read: Vec::new(),
            write: Vec::new(),
            valence: None,
        };
        if self.eat(TokenKind::Read) {
            ion.read = self.parse_name_list()?;
        }
        if self.eat(TokenKind::Write) {
            ion.write = self.parse_name_list()?;
        }
        if self.eat(TokenKind::Valence) {
            let negative = self.eat(TokenKind::Minus);
            let token = self.expect(TokenKind::Integer, "an integer valence")?;
            let value: i64 = token.spelling.parse().map_err(|_| {
                Diagnostic::new(
                    format!("malformed VALENCE '{}'", token.spelling),
                    token.location,
                )
            })?;
            ion.valence = Some(if negative { -value } else { value });
        }
        Ok(ion)
    }
}
