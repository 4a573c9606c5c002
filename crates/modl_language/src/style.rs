//! ANSI styling for rendered diagnostics.

/// ANSI escape code helpers. Every wrapper resets at the end.
pub struct Style;

impl Style {
    pub const RESET: &'static str = "\x1b[0m";
    pub const BOLD: &'static str = "\x1b[1m";
    pub const RED: &'static str = "\x1b[31m";
    pub const BLUE: &'static str = "\x1b[34m";

    pub fn red(s: &str) -> String {
        format!("{}{}{}", Self::RED, s, Self::RESET)
    }

    pub fn blue(s: &str) -> String {
        format!("{}{}{}", Self::BLUE, s, Self::RESET)
    }

    pub fn bold_red(s: &str) -> String {
        format!("{}{}{}{}", Self::BOLD, Self::RED, s, Self::RESET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrappers_reset_at_the_end() {
        let shown = Style::red("bad");
        assert!(shown.starts_with("\x1b[31m"));
        assert!(shown.ends_with("\x1b[0m"));
        assert!(shown.contains("bad"));
    }
}
