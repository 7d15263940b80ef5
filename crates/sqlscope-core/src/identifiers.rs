//! SQL identifier validation and quoting.
//!
//! Table and column names pass through [`is_valid_identifier`] when a mapping
//! is built, and generated SQL quotes them with [`quote_ident`] so reserved
//! words like `user` stay usable as table names.

/// Check that a name is a plain SQL identifier: ASCII alphanumeric or
/// underscore, non-empty, not starting with a digit.
///
/// # Examples
///
/// ```
/// use sqlscope_core::is_valid_identifier;
///
/// assert!(is_valid_identifier("users"));
/// assert!(is_valid_identifier("user_name"));
/// assert!(!is_valid_identifier("123table"));
/// assert!(!is_valid_identifier("drop table--"));
/// assert!(!is_valid_identifier(""));
/// ```
#[inline]
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quote a SQL identifier using ANSI double-quoting.
///
/// Embedded double-quotes are escaped by doubling them.
///
/// # Examples
///
/// ```
/// use sqlscope_core::quote_ident;
///
/// assert_eq!(quote_ident("users"), "\"users\"");
/// assert_eq!(quote_ident("select"), "\"select\""); // SQL keyword
/// ```
#[inline]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
