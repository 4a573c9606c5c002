//! Abstract syntax tree.
//!
//! A single arena-allocated sum type, [`Expr`], covers every construct that
//! can appear inside a procedural block: literals, arithmetic, calls, blocks,
//! conditionals, and the kinetic forms (stoichiometries, reactions,
//! conservation laws). Statements *are* expressions here; a block is an
//! ordered slice of them.
//!
//! The tree is strictly a tree: every node is allocated once into the
//! [`AstContext`] arenas and referenced by exactly one parent. Identifier
//! nodes carry interned names only; binding them to symbols is a later
//! pass's job.

pub mod symbol;

use modl_base::{Arena, Interner, Location, Symbol};
use serde::Serialize;

/// Prefix operators and the single-argument intrinsics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Exp,
    Log,
    Abs,
}

/// Infix operators and the two-argument intrinsics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    Min,
    Max,
}

/// Integration method named by a SOLVE statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveMethod {
    Cnexp,
    Sparse,
    #[default]
    None,
}

/// Ion species a CONDUCTANCE statement may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IonKind {
    Na,
    K,
    Ca,
    Cl,
    Mg,
    Nonspecific,
    /// A species outside the standard table, kept by name.
    Other(Symbol),
}

impl IonKind {
    /// Looks up a species by its source spelling (`na`, `k`, ...).
    /// Unrecognised spellings are carried as [`IonKind::Other`].
    pub fn from_name(name: &str, interner: &mut Interner) -> IonKind {
        match name {
            "na" => IonKind::Na,
            "k" => IonKind::K,
            "ca" => IonKind::Ca,
            "cl" => IonKind::Cl,
            "mg" => IonKind::Mg,
            _ => IonKind::Other(interner.intern(name)),
        }
    }

    /// True for the species in the standard table (everything but `Other`).
    pub fn is_standard(self) -> bool {
        !matches!(self, IonKind::Other(_))
    }
}

/// An expression or statement node. Every variant records where it starts.
#[derive(Debug)]
pub enum Expr<'a> {
    Integer {
        value: i64,
        location: Location,
    },
    Real {
        value: f64,
        location: Location,
    },
    Identifier {
        name: Symbol,
        location: Location,
    },
    /// `x'` on the left of an assignment in a DERIVATIVE block.
    Derivative {
        name: Symbol,
        location: Location,
    },
    Call {
        callee: Symbol,
        args: &'a [&'a Expr<'a>],
        location: Location,
    },
    Unary {
        op: UnaryOp,
        operand: &'a Expr<'a>,
        location: Location,
    },
    Binary {
        op: BinaryOp,
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
        location: Location,
    },
    /// Statement-level assignment. The lhs is checked to be an lvalue when
    /// the node is built.
    Assign {
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
        location: Location,
    },
    Block {
        statements: &'a [&'a Expr<'a>],
        is_nested: bool,
        location: Location,
    },
    If {
        condition: &'a Expr<'a>,
        /// Always a `Block`.
        then_branch: &'a Expr<'a>,
        /// A `Block`, or another `If` for an `else if` chain.
        else_branch: Option<&'a Expr<'a>>,
        location: Location,
    },
    Local {
        names: &'a [Symbol],
        location: Location,
    },
    Solve {
        block: Symbol,
        method: SolveMethod,
        location: Location,
    },
    Conductance {
        variable: Symbol,
        ion: IonKind,
        location: Location,
    },
    /// One signed term of a stoichiometric expression; the sign lives in the
    /// coefficient.
    StoichTerm {
        coefficient: i64,
        ident: Symbol,
        location: Location,
    },
    /// Possibly empty sum of `StoichTerm`s.
    Stoich {
        terms: &'a [&'a Expr<'a>],
        location: Location,
    },
    Reaction {
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
        fwd_rate: &'a Expr<'a>,
        rev_rate: &'a Expr<'a>,
        location: Location,
    },
    Conserve {
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
        location: Location,
    },
    /// `INITIAL { ... }` nested inside a procedural block.
    Initial {
        body: &'a Expr<'a>,
        location: Location,
    },
}

impl<'a> Expr<'a> {
    pub fn location(&self) -> Location {
        match self {
            Expr::Integer { location, .. }
            | Expr::Real { location, .. }
            | Expr::Identifier { location, .. }
            | Expr::Derivative { location, .. }
            | Expr::Call { location, .. }
            | Expr::Unary { location, .. }
            | Expr::Binary { location, .. }
            | Expr::Assign { location, .. }
            | Expr::Block { location, .. }
            | Expr::If { location, .. }
            | Expr::Local { location, .. }
            | Expr::Solve { location, .. }
            | Expr::Conductance { location, .. }
            | Expr::StoichTerm { location, .. }
            | Expr::Stoich { location, .. }
            | Expr::Reaction { location, .. }
            | Expr::Conserve { location, .. }
            | Expr::Initial { location, .. } => *location,
        }
    }

    /// Numeric value of an `Integer` or `Real` node.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expr::Integer { value, .. } => Some(*value as f64),
            Expr::Real { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_identifier(&self) -> Option<Symbol> {
        match self {
            Expr::Identifier { name, .. } => Some(*name),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<(BinaryOp, &'a Expr<'a>, &'a Expr<'a>)> {
        match self {
            Expr::Binary { op, lhs, rhs, .. } => Some((*op, *lhs, *rhs)),
            _ => None,
        }
    }

    pub fn as_assign(&self) -> Option<(&'a Expr<'a>, &'a Expr<'a>)> {
        match self {
            Expr::Assign { lhs, rhs, .. } => Some((*lhs, *rhs)),
            _ => None,
        }
    }

    /// Statements of a `Block`, with its nesting flag.
    pub fn as_block(&self) -> Option<(&'a [&'a Expr<'a>], bool)> {
        match self {
            Expr::Block {
                statements,
                is_nested,
                ..
            } => Some((*statements, *is_nested)),
            _ => None,
        }
    }

    pub fn as_if(&self) -> Option<(&'a Expr<'a>, &'a Expr<'a>, Option<&'a Expr<'a>>)> {
        match self {
            Expr::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => Some((*condition, *then_branch, *else_branch)),
            _ => None,
        }
    }

    pub fn as_stoich(&self) -> Option<&'a [&'a Expr<'a>]> {
        match self {
            Expr::Stoich { terms, .. } => Some(*terms),
            _ => None,
        }
    }

    pub fn as_stoich_term(&self) -> Option<(i64, Symbol)> {
        match self {
            Expr::StoichTerm {
                coefficient, ident, ..
            } => Some((*coefficient, *ident)),
            _ => None,
        }
    }

    /// True for expressions that may stand on the left of `=`.
    pub fn is_lvalue(&self) -> bool {
        matches!(self, Expr::Identifier { .. } | Expr::Derivative { .. })
    }
}

/// Typed arenas the parser allocates into.
///
/// Cheap to copy; the arenas themselves live outside the parser so the tree
/// outlives it.
#[derive(Clone, Copy)]
pub struct AstContext<'a> {
    pub exprs: &'a Arena<Expr<'a>>,
    pub refs: &'a Arena<&'a Expr<'a>>,
    pub names: &'a Arena<Symbol>,
}

impl<'a> AstContext<'a> {
    pub fn new(
        exprs: &'a Arena<Expr<'a>>,
        refs: &'a Arena<&'a Expr<'a>>,
        names: &'a Arena<Symbol>,
    ) -> Self {
        Self { exprs, refs, names }
    }

    pub fn alloc(&self, expr: Expr<'a>) -> &'a Expr<'a> {
        self.exprs.alloc(expr)
    }

    pub fn alloc_refs(&self, items: Vec<&'a Expr<'a>>) -> &'a [&'a Expr<'a>] {
        self.refs.alloc_slice(items)
    }

    pub fn alloc_names(&self, items: Vec<Symbol>) -> &'a [Symbol] {
        self.names.alloc_slice(items)
    }
}
