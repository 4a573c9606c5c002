//! # modl-base
//!
//! Structural atoms for the modl front-end.
//!
//! This crate provides the foundational types the rest of the pipeline builds
//! upon:
//!
//! - [`Arena`] - bump allocation for stable AST references
//! - [`Interner`]/[`Symbol`] - string interning for O(1) name equality
//! - [`Location`] - line/column tracking in source text
//! - [`Diagnostic`]/[`ParseResult`] - errors carrying their source location
//!
//! It knows nothing about the mechanism description language itself; higher
//! crates supply tokens, grammar, and the module model.

pub mod arena;
pub mod error;
pub mod intern;
pub mod location;

pub use arena::Arena;
pub use error::{Diagnostic, ParseResult, Status};
pub use intern::{Interner, Symbol};
pub use location::Location;
