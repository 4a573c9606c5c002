//! Diagnostics with source locations.
//!
//! The front-end reports the first failure it encounters and unwinds; a
//! [`Diagnostic`] is that failure, pinned to the [`Location`] where it was
//! detected. Fallible parse operations return [`ParseResult`].

use crate::location::Location;
use std::fmt;

/// A parse failure with the position where it was detected.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub message: String,
    pub location: Location,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, location: Location) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.location)
    }
}

impl std::error::Error for Diagnostic {}

/// Alias for `std::result::Result<T, Diagnostic>`.
pub type ParseResult<T> = std::result::Result<T, Diagnostic>;

/// Health of a lexer, parser, or parsed module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Happy,
    Error,
}

impl Status {
    pub fn is_happy(self) -> bool {
        self == Status::Happy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_message_and_position() {
        let d = Diagnostic::new("unexpected token '}'", Location::new(3, 8));
        let shown = d.to_string();
        assert!(shown.contains("unexpected token '}'"));
        assert!(shown.contains("3:8"));
    }

    #[test]
    fn status_defaults_to_happy() {
        assert!(Status::default().is_happy());
        assert!(!Status::Error.is_happy());
    }
}
