//! Source-context rendering for diagnostics.
//!
//! A bare [`Diagnostic`] displays as `message at line:column`; this module
//! adds the compiler-style rendering with the offending line and a caret
//! underneath:
//!
//! ```text
//! error: unexpected token '}'
//!
//!    3 | SOLVE states METHOD }
//!      |                     ^
//! ```

use crate::style::Style;
use modl_base::Diagnostic;

/// Renders `diagnostic` against the source it came from.
pub fn render_with_source(diagnostic: &Diagnostic, source: &str) -> String {
    let line_no = diagnostic.location.line as usize;
    let column = diagnostic.location.column as usize;
    let line = source.lines().nth(line_no.saturating_sub(1)).unwrap_or("");

    let header = format!(
        "{}: {}",
        Style::bold_red("error"),
        diagnostic.message
    );
    let gutter = Style::blue(&format!("{:4}", line_no));
    let pipe = Style::blue("|");
    let caret = format!("{}{}", " ".repeat(column.saturating_sub(1)), Style::red("^"));

    format!("{header}\n\n{gutter} {pipe} {line}\n     {pipe} {caret}")
}
