//! Terminal text helpers.

use regex::Regex;
use std::sync::LazyLock;

/// Regex to strip ANSI escape codes from strings.
static ANSI_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B\[[0-9;?]*[a-zA-Z]").expect("Invalid ANSI regex"));

/// Strip ANSI escape codes from a string.
///
/// # Example
/// ```
/// use gumploop_core::text::strip_ansi;
///
/// let input = "text \x1B[90mgrayed\x1B[0m normal";
/// assert_eq!(strip_ansi(input), "text grayed normal");
/// ```
pub fn strip_ansi(s: &str) -> String {
    ANSI_REGEX.replace_all(s, "").to_string()
}

/// Returns the last `n` non-blank lines of a snapshot, oldest first.
pub fn tail_lines(s: &str, n: usize) -> Vec<&str> {
    let mut lines: Vec<&str> = s
        .lines()
        .rev()
        .filter(|l| !l.trim().is_empty())
        .take(n)
        .collect();
    lines.reverse();
    lines
}
