//! ANSI color constants for terminal output.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Horizontal rule framing command output.
pub fn rule() -> String {
    "─".repeat(50)
}

/// Flush stdout, ignoring errors.
pub fn flush_stdout() {
    use std::io::Write;
    let _ = std::io::stdout().flush();
}
