//! Whitespace helpers used when validating and formatting option arguments.
//!
//! Only space, tab, line feed, carriage return and form feed count as
//! whitespace here. Other Unicode whitespace is left untouched.

/// Returns true for the characters treated as whitespace in option arguments.
#[must_use]
pub const fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

/// Returns true if the string is empty or contains only whitespace.
#[must_use]
pub fn is_blank(s: &str) -> bool {
    s.chars().all(is_whitespace)
}

/// Removes every whitespace character from the string, including interior ones.
#[must_use]
pub fn remove(s: &str) -> String {
    s.chars().filter(|&c| !is_whitespace(c)).collect()
}
