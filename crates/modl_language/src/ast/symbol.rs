//! Symbol table entries.
//!
//! Pass 1 registers every top-level name it sees (procedural blocks by
//! name/kind/position, declared variables by section) and pass 2 attaches
//! parsed bodies to the procedural entries.

use super::Expr;
use modl_base::{Location, Symbol};
use serde::Serialize;

/// What flavor of procedural block a procedure entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureKind {
    Normal,
    Initial,
    Breakpoint,
    Kinetic,
    Derivative,
    Linear,
    NetReceive,
}

/// Where a variable was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    State,
    Parameter,
    Assigned,
    Local,
    /// Indexed ion variable implied by a USEION clause (`ena`, `ica`, ...).
    Ion,
}

/// Start of a procedural block body: byte offset of the opening brace and
/// its line/column. Pass 2 resumes a lexer here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    pub offset: usize,
    pub location: Location,
}

/// A named top-level entity of a module.
#[derive(Debug)]
pub enum SymbolEntry<'a> {
    Procedure {
        name: Symbol,
        kind: ProcedureKind,
        /// Declared formals; for NET_RECEIVE these are the event arguments.
        args: Vec<Symbol>,
        body: Option<&'a Expr<'a>>,
        location: Location,
        block: Option<BlockSpan>,
    },
    Function {
        name: Symbol,
        args: Vec<Symbol>,
        body: Option<&'a Expr<'a>>,
        location: Location,
        block: Option<BlockSpan>,
    },
    Variable {
        name: Symbol,
        kind: VariableKind,
        unit: Option<String>,
        default: Option<f64>,
        range: Option<(f64, f64)>,
        location: Location,
    },
}

impl<'a> SymbolEntry<'a> {
    pub fn name(&self) -> Symbol {
        match self {
            SymbolEntry::Procedure { name, .. }
            | SymbolEntry::Function { name, .. }
            | SymbolEntry::Variable { name, .. } => *name,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            SymbolEntry::Procedure { location, .. }
            | SymbolEntry::Function { location, .. }
            | SymbolEntry::Variable { location, .. } => *location,
        }
    }

    /// Parsed body of a procedure or function, once pass 2 has run.
    pub fn body(&self) -> Option<&'a Expr<'a>> {
        match self {
            SymbolEntry::Procedure { body, .. } | SymbolEntry::Function { body, .. } => *body,
            SymbolEntry::Variable { .. } => None,
        }
    }

    pub fn as_procedure(&self) -> Option<(ProcedureKind, &[Symbol])> {
        match self {
            SymbolEntry::Procedure { kind, args, .. } => Some((*kind, args.as_slice())),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<VariableKind> {
        match self {
            SymbolEntry::Variable { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// True for entries a CallExpr may resolve to.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            SymbolEntry::Procedure { .. } | SymbolEntry::Function { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modl_base::Interner;

    #[test]
    fn entry_queries_follow_the_variant() {
        let mut interner = Interner::new();
        let rates = interner.intern("rates");
        let gbar = interner.intern("gbar");

        let proc = SymbolEntry::Procedure {
            name: rates,
            kind: ProcedureKind::Normal,
            args: vec![interner.intern("v")],
            body: None,
            location: Location::start(),
            block: None,
        };
        let var = SymbolEntry::Variable {
            name: gbar,
            kind: VariableKind::Parameter,
            unit: Some("S/cm2".to_string()),
            default: Some(0.01),
            range: None,
            location: Location::start(),
        };

        assert!(proc.is_callable());
        assert_eq!(proc.as_procedure().map(|(k, _)| k), Some(ProcedureKind::Normal));
        assert!(proc.as_variable().is_none());

        assert!(!var.is_callable());
        assert_eq!(var.as_variable(), Some(VariableKind::Parameter));
        assert_eq!(var.name(), gbar);
    }
}
