//! Canonical positional placeholders (`$1`, `$2`, ...) and their embedded-store spelling.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

/// Matches a quoted literal or identifier (left alone) or a canonical placeholder (captured number).
fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"'(?:[^']|'')*'|"(?:[^"]|"")*"|\$(\d+)"#).expect("placeholder pattern is valid")
    })
}

/// Rewrite `$n` into the embedded store's numbered `?n` token. Quoted text is never touched.
pub fn to_numbered_question(sql: &str) -> Cow<'_, str> {
    token_pattern().replace_all(sql, |caps: &Captures<'_>| match caps.get(1) {
        Some(n) => format!("?{}", n.as_str()),
        None => caps[0].to_string(),
    })
}
