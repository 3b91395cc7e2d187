//! Privacy redaction applied before any text leaves the core.

use std::sync::LazyLock;

use regex::Regex;

/// A compiled redaction rule.
struct RedactionPattern {
    regex: Regex,
    replacement: &'static str,
}

fn pattern(regex_str: &str, replacement: &'static str) -> RedactionPattern {
    RedactionPattern {
        regex: Regex::new(regex_str).expect("Invalid redaction regex pattern"),
        replacement,
    }
}

/// Order matters: SSNs before phone numbers, both before bare digits in
/// addresses.
static REDACTION_PATTERNS: LazyLock<Vec<RedactionPattern>> = LazyLock::new(|| {
    vec![
        pattern(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b", "[EMAIL]"),
        pattern(r"\b\d{3}-\d{2}-\d{4}\b", "[SSN]"),
        pattern(
            r"(?:\+?\d{1,2}[\s.-]?)?\(?\b\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b",
            "[PHONE]",
        ),
        pattern(
            r"(?i)\b\d{1,5}\s+(?:[a-z]+\s+){1,3}(?:street|st|avenue|ave|road|rd|lane|ln|drive|boulevard|blvd|court|ct|way)\b\.?",
            "[ADDRESS]",
        ),
        pattern(r"(?i)\b(my name is|i am called|i'm called)\s+[a-z]+(?:\s+[a-z]+)?", "$1 [NAME]"),
        pattern(r"\b(?:Mr|Mrs|Ms|Dr)\.?\s+[A-Z][a-z]+", "[NAME]"),
    ]
});

/// Replace emails, SSNs, phone numbers, street addresses and self-introduced
/// names with placeholder tags.
pub fn redact(text: &str) -> String {
    let mut out = text.to_string();
    for rule in REDACTION_PATTERNS.iter() {
        out = rule.regex.replace_all(&out, rule.replacement).into_owned();
    }
    out
}

/// Redact and then cap at `max_chars` characters (ellipsis when cut).
pub fn redacted_excerpt(text: &str, max_chars: usize) -> String {
    let redacted = redact(text);
    if redacted.chars().count() <= max_chars {
        return redacted;
    }
    let cut: String = redacted.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}
