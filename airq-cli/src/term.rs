//! ANSI escapes the report and the progress indicator rely on.

use airq_core::Severity;

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const MAGENTA: &str = "\x1b[35m";
pub const CYAN: &str = "\x1b[36m";
pub const RESET: &str = "\x1b[0m";

pub const HIDE_CURSOR: &str = "\x1b[?25l";
pub const SHOW_CURSOR: &str = "\x1b[?25h";
pub const ERASE_LINE: &str = "\x1b[2K\r";

/// Colored marker printed next to every severity.
pub const DOT: char = '\u{25CF}';

pub fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Good => CYAN,
        Severity::Fair => GREEN,
        Severity::Moderate => YELLOW,
        Severity::Poor => RED,
        Severity::VeryPoor => MAGENTA,
    }
}

/// `●` wrapped in the severity's color.
pub fn dot(severity: Severity) -> String {
    format!("{}{DOT}{RESET}", severity_color(severity))
}
