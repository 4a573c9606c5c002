//! Line/column positions in source text.
//!
//! Every token, AST node, and diagnostic carries a [`Location`]. Lines and
//! columns are 1-based; column counts bytes from the start of the line, which
//! is exact for the ASCII sources the language accepts.

use std::fmt;

/// A 1-based line/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// The position of the first byte of a buffer.
    pub fn start() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_is_line_one_column_one() {
        let loc = Location::start();
        assert_eq!(loc.line, 1);
        assert_eq!(loc.column, 1);
        assert_eq!(loc, Location::default());
    }

    #[test]
    fn display_is_line_colon_column() {
        assert_eq!(Location::new(4, 17).to_string(), "4:17");
    }

    #[test]
    fn locations_order_by_line_then_column() {
        assert!(Location::new(2, 9) < Location::new(3, 1));
        assert!(Location::new(3, 1) < Location::new(3, 2));
    }
}
