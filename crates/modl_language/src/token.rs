//! Tokens of the mechanism description language.
//!
//! The lexer tags every scanned lexeme with a [`TokenKind`]. Reserved words
//! are recognised here, by exact spelling: the block keywords are upper-case
//! (`NEURON`, `KINETIC`, ...) while the intrinsic and method names are
//! lower-case (`exp`, `cnexp`, ...). Anything else that scans as a word is an
//! [`TokenKind::Identifier`].

use modl_base::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    Integer,
    Real,
    Identifier,
    Str,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Prime,
    Tilde,

    // Comparisons
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,

    // Arrows
    Arrow,
    ReactionArrow,

    // Descriptive block keywords
    Title,
    Neuron,
    Suffix,
    PointProcess,
    NonspecificCurrent,
    UseIon,
    Read,
    Write,
    Valence,
    Range,
    Global,
    State,
    Parameter,
    Assigned,
    Units,

    // Procedural block keywords
    Procedure,
    Function,
    NetReceive,
    Initial,
    Breakpoint,
    Kinetic,
    Derivative,
    Linear,

    // Statement keywords
    Local,
    Solve,
    Method,
    Conductance,
    Conserve,
    If,
    Else,

    // Intrinsics and solver methods
    Min,
    Max,
    Exp,
    Log,
    Abs,
    Cnexp,
    Sparse,

    Eof,
    Error,
}

impl TokenKind {
    /// Display name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Integer => "integer literal",
            TokenKind::Real => "real literal",
            TokenKind::Identifier => "identifier",
            TokenKind::Str => "string literal",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Assign => "'='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Caret => "'^'",
            TokenKind::Prime => "'''",
            TokenKind::Tilde => "'~'",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::Eq => "'=='",
            TokenKind::Ne => "'!='",
            TokenKind::Arrow => "'->'",
            TokenKind::ReactionArrow => "'<->'",
            TokenKind::Title => "TITLE",
            TokenKind::Neuron => "NEURON",
            TokenKind::Suffix => "SUFFIX",
            TokenKind::PointProcess => "POINT_PROCESS",
            TokenKind::NonspecificCurrent => "NONSPECIFIC_CURRENT",
            TokenKind::UseIon => "USEION",
            TokenKind::Read => "READ",
            TokenKind::Write => "WRITE",
            TokenKind::Valence => "VALENCE",
            TokenKind::Range => "RANGE",
            TokenKind::Global => "GLOBAL",
            TokenKind::State => "STATE",
            TokenKind::Parameter => "PARAMETER",
            TokenKind::Assigned => "ASSIGNED",
            TokenKind::Units => "UNITS",
            TokenKind::Procedure => "PROCEDURE",
            TokenKind::Function => "FUNCTION",
            TokenKind::NetReceive => "NET_RECEIVE",
            TokenKind::Initial => "INITIAL",
            TokenKind::Breakpoint => "BREAKPOINT",
            TokenKind::Kinetic => "KINETIC",
            TokenKind::Derivative => "DERIVATIVE",
            TokenKind::Linear => "LINEAR",
            TokenKind::Local => "LOCAL",
            TokenKind::Solve => "SOLVE",
            TokenKind::Method => "METHOD",
            TokenKind::Conductance => "CONDUCTANCE",
            TokenKind::Conserve => "CONSERVE",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::Min => "min",
            TokenKind::Max => "max",
            TokenKind::Exp => "exp",
            TokenKind::Log => "log",
            TokenKind::Abs => "abs",
            TokenKind::Cnexp => "cnexp",
            TokenKind::Sparse => "sparse",
            TokenKind::Eof => "end of input",
            TokenKind::Error => "invalid input",
        }
    }

    /// True for the keywords that open a procedural block at top level.
    pub fn starts_procedural_block(self) -> bool {
        matches!(
            self,
            TokenKind::Procedure
                | TokenKind::Function
                | TokenKind::NetReceive
                | TokenKind::Initial
                | TokenKind::Breakpoint
                | TokenKind::Kinetic
                | TokenKind::Derivative
                | TokenKind::Linear
        )
    }

    /// True for any keyword that may begin a top-level block.
    pub fn starts_top_level_block(self) -> bool {
        self.starts_procedural_block()
            || matches!(
                self,
                TokenKind::Title
                    | TokenKind::Neuron
                    | TokenKind::State
                    | TokenKind::Parameter
                    | TokenKind::Assigned
                    | TokenKind::Units
            )
    }
}

/// Reserved-word table. Compile-time immutable, consulted once per scanned word.
pub fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "TITLE" => TokenKind::Title,
        "NEURON" => TokenKind::Neuron,
        "SUFFIX" => TokenKind::Suffix,
        "POINT_PROCESS" => TokenKind::PointProcess,
        "NONSPECIFIC_CURRENT" => TokenKind::NonspecificCurrent,
        "USEION" => TokenKind::UseIon,
        "READ" => TokenKind::Read,
        "WRITE" => TokenKind::Write,
        "VALENCE" => TokenKind::Valence,
        "RANGE" => TokenKind::Range,
        "GLOBAL" => TokenKind::Global,
        "STATE" => TokenKind::State,
        "PARAMETER" => TokenKind::Parameter,
        "ASSIGNED" => TokenKind::Assigned,
        "UNITS" => TokenKind::Units,
        "PROCEDURE" => TokenKind::Procedure,
        "FUNCTION" => TokenKind::Function,
        "NET_RECEIVE" => TokenKind::NetReceive,
        "INITIAL" => TokenKind::Initial,
        "BREAKPOINT" => TokenKind::Breakpoint,
        "KINETIC" => TokenKind::Kinetic,
        "DERIVATIVE" => TokenKind::Derivative,
        "LINEAR" => TokenKind::Linear,
        "LOCAL" => TokenKind::Local,
        "SOLVE" => TokenKind::Solve,
        "METHOD" => TokenKind::Method,
        "CONDUCTANCE" => TokenKind::Conductance,
        "CONSERVE" => TokenKind::Conserve,
        "if" | "IF" => TokenKind::If,
        "else" | "ELSE" => TokenKind::Else,
        "min" => TokenKind::Min,
        "max" => TokenKind::Max,
        "exp" => TokenKind::Exp,
        "log" => TokenKind::Log,
        "abs" => TokenKind::Abs,
        "cnexp" => TokenKind::Cnexp,
        "sparse" => TokenKind::Sparse,
        _ => return None,
    };
    Some(kind)
}

/// A scanned lexeme: kind, raw spelling, and where it starts.
///
/// The spelling borrows the source buffer; tokens are `Copy` and carry no
/// owned data.
#[derive(Debug, Clone, Copy)]
pub struct Token<'s> {
    pub kind: TokenKind,
    pub spelling: &'s str,
    pub location: Location,
}

impl<'s> Token<'s> {
    pub fn new(kind: TokenKind, spelling: &'s str, location: Location) -> Self {
        Self {
            kind,
            spelling,
            location,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}
