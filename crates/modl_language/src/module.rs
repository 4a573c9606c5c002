//! The parsed module.
//!
//! A [`Module`] is what the front-end hands to downstream passes: the
//! descriptive facts gathered in pass 1 (title, NEURON metadata, declared
//! variables, unit equations) plus the symbol table whose procedural entries
//! carry the ASTs built in pass 2. The symbol map preserves declaration
//! order so downstream emission is deterministic.

use crate::ast::symbol::{SymbolEntry, VariableKind};
use indexmap::IndexMap;
use modl_base::{Diagnostic, Interner, Location, Status, Symbol};
use serde::Serialize;

/// One USEION clause of the NEURON block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ion {
    pub name: String,
    pub read: Vec<String>,
    pub write: Vec<String>,
    pub valence: Option<i64>,
}

/// Everything the NEURON block declares about the mechanism.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NeuronInfo {
    /// Density mechanism name, from SUFFIX.
    pub suffix: Option<String>,
    /// Point process name, from POINT_PROCESS.
    pub point_process: Option<String>,
    pub nonspecific_currents: Vec<String>,
    pub ion_deps: Vec<Ion>,
    pub range: Vec<String>,
    pub global: Vec<String>,
}

/// A variable declared in a STATE, PARAMETER, or ASSIGNED section.
#[derive(Debug, Clone)]
pub struct VariableDef {
    pub name: Symbol,
    pub kind: VariableKind,
    pub unit: Option<String>,
    pub default: Option<f64>,
    pub range: Option<(f64, f64)>,
    pub location: Location,
}

/// One `(unit) = (unit)` equation from a UNITS block. Stored, not
/// interpreted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitDef {
    pub from: String,
    pub to: String,
}

/// Output of a full two-pass parse.
pub struct Module<'a> {
    name: String,
    source: String,
    title: String,
    neuron: NeuronInfo,
    symbols: IndexMap<Symbol, SymbolEntry<'a>>,
    state_vars: Vec<VariableDef>,
    parameters: Vec<VariableDef>,
    assigned: Vec<VariableDef>,
    units: Vec<UnitDef>,
    error: Option<Diagnostic>,
}

impl<'a> Module<'a> {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            title: String::new(),
            neuron: NeuronInfo::default(),
            symbols: IndexMap::new(),
            state_vars: Vec::new(),
            parameters: Vec::new(),
            assigned: Vec::new(),
            units: Vec::new(),
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn status(&self) -> Status {
        if self.error.is_some() {
            Status::Error
        } else {
            Status::Happy
        }
    }

    pub fn first_error(&self) -> Option<&Diagnostic> {
        self.error.as_ref()
    }

    /// Records a diagnostic; only the first one sticks.
    pub fn set_error(&mut self, diagnostic: Diagnostic) {
        if self.error.is_none() {
            self.error = Some(diagnostic);
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn neuron_info(&self) -> &NeuronInfo {
        &self.neuron
    }

    pub fn neuron_info_mut(&mut self) -> &mut NeuronInfo {
        &mut self.neuron
    }

    /// The symbol table, in declaration order.
    pub fn symbols(&self) -> &IndexMap<Symbol, SymbolEntry<'a>> {
        &self.symbols
    }

    pub fn symbol(&self, name: Symbol) -> Option<&SymbolEntry<'a>> {
        self.symbols.get(&name)
    }

    /// Looks a symbol up by spelling, without interning.
    pub fn symbol_named(&self, interner: &Interner, name: &str) -> Option<&SymbolEntry<'a>> {
        self.symbols.get(&interner.get(name)?)
    }

    /// Inserts an entry, diagnosing a clash with an earlier declaration.
    pub fn declare(&mut self, entry: SymbolEntry<'a>, interner: &Interner) -> Result<(), Diagnostic> {
        let name = entry.name();
        if let Some(previous) = self.symbols.get(&name) {
            let message = format!(
                "duplicate declaration of '{}' (first declared at {})",
                interner.resolve(name),
                previous.location(),
            );
            return Err(Diagnostic::new(message, entry.location()));
        }
        self.symbols.insert(name, entry);
        Ok(())
    }

    /// Overwrites the body of the procedural entry `name`.
    pub fn attach_body(&mut self, name: Symbol, parsed: &'a crate::ast::Expr<'a>) {
        match self.symbols.get_mut(&name) {
            Some(SymbolEntry::Procedure { body, .. }) | Some(SymbolEntry::Function { body, .. }) => {
                *body = Some(parsed);
            }
            _ => {}
        }
    }

    pub fn state_vars(&self) -> &[VariableDef] {
        &self.state_vars
    }

    pub fn parameters(&self) -> &[VariableDef] {
        &self.parameters
    }

    pub fn assigned(&self) -> &[VariableDef] {
        &self.assigned
    }

    pub fn units(&self) -> &[UnitDef] {
        &self.units
    }

    pub fn add_state_var(&mut self, def: VariableDef) {
        self.state_vars.push(def);
    }

    pub fn add_parameter(&mut self, def: VariableDef) {
        self.parameters.push(def);
    }

    pub fn add_assigned(&mut self, def: VariableDef) {
        self.assigned.push(def);
    }

    pub fn add_unit(&mut self, unit: UnitDef) {
        self.units.push(unit);
    }

    /// Procedural entries in declaration order.
    pub fn procedures(&self) -> impl Iterator<Item = &SymbolEntry<'a>> {
        self.symbols
            .values()
            .filter(|entry| matches!(entry, SymbolEntry::Procedure { .. }))
    }

    pub fn functions(&self) -> impl Iterator<Item = &SymbolEntry<'a>> {
        self.symbols
            .values()
            .filter(|entry| matches!(entry, SymbolEntry::Function { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::symbol::ProcedureKind;

    #[test]
    fn first_error_wins() {
        let mut module = Module::new("kd", "");
        module.set_error(Diagnostic::new("first", Location::new(1, 1)));
        module.set_error(Diagnostic::new("second", Location::new(2, 1)));
        assert_eq!(module.first_error().unwrap().message, "first");
        assert_eq!(module.status(), Status::Error);
    }

    #[test]
    fn declare_rejects_duplicates() {
        let mut interner = Interner::new();
        let m = interner.intern("m");
        let mut module = Module::new("kd", "");

        let var = |loc| SymbolEntry::Variable {
            name: m,
            kind: VariableKind::State,
            unit: None,
            default: None,
            range: None,
            location: loc,
        };
        module.declare(var(Location::new(1, 1)), &interner).unwrap();
        let err = module
            .declare(var(Location::new(5, 3)), &interner)
            .unwrap_err();
        assert!(err.message.contains("duplicate declaration of 'm'"));
        assert_eq!(err.location, Location::new(5, 3));
    }

    #[test]
    fn symbols_keep_declaration_order() {
        let mut interner = Interner::new();
        let mut module = Module::new("kd", "");
        for name in ["rates", "n", "gbar"] {
            let sym = interner.intern(name);
            let entry = if name == "rates" {
                SymbolEntry::Procedure {
                    name: sym,
                    kind: ProcedureKind::Normal,
                    args: Vec::new(),
                    body: None,
                    location: Location::start(),
                    block: None,
                }
            } else {
                SymbolEntry::Variable {
                    name: sym,
                    kind: VariableKind::Parameter,
                    unit: None,
                    default: None,
                    range: None,
                    location: Location::start(),
                }
            };
            module.declare(entry, &interner).unwrap();
        }
        let order: Vec<&str> = module
            .symbols()
            .keys()
            .map(|s| interner.resolve(*s))
            .collect();
        assert_eq!(order, vec!["rates", "n", "gbar"]);
    }
}
