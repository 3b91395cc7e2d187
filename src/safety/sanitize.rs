use super::types::SafetyError;

/// Query text after cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedInput {
    /// Cleaned text with original casing. Only ever shown redacted.
    pub display: String,
    /// Lower-cased `display`; what every matcher runs against. Never
    /// truncated.
    pub normalized: String,
    /// `display` capped at the configured length on a word boundary. Only
    /// the generator prompt is built from it.
    pub prompt: String,
    /// What was changed (for audit, no query content).
    pub modifications: Vec<InputModificationKind>,
}

impl SanitizedInput {
    pub fn was_modified(&self) -> bool {
        !self.modifications.is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.display.chars().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputModificationKind {
    InvisibleUnicodeRemoved,
    ControlCharacterRemoved,
    QuotesNormalized,
    WhitespaceCollapsed,
    PromptTruncated,
}

/// Clean a raw query before any pattern matching.
///
/// `max_chars` caps only the prompt text. Matching always sees the whole
/// query so a phrase past the cap still escalates. Empty output is an
/// error: the caller treats it as malformed input.
pub fn sanitize_input(raw: &str, max_chars: usize) -> Result<SanitizedInput, SafetyError> {
    let mut modifications = Vec::new();
    let mut text = raw.to_string();

    let mut step = |text: &mut String, f: fn(&str) -> String, kind: InputModificationKind| {
        let next = f(text.as_str());
        if next != *text {
            modifications.push(kind);
            *text = next;
        }
    };

    step(&mut text, remove_invisible_unicode, InputModificationKind::InvisibleUnicodeRemoved);
    step(&mut text, remove_control_characters, InputModificationKind::ControlCharacterRemoved);
    step(&mut text, normalize_quotes, InputModificationKind::QuotesNormalized);
    step(&mut text, collapse_whitespace, InputModificationKind::WhitespaceCollapsed);

    if text.is_empty() {
        return Err(SafetyError::EmptyInput);
    }

    let prompt = if text.chars().count() > max_chars {
        modifications.push(InputModificationKind::PromptTruncated);
        truncate_at_word_boundary(&text, max_chars)
    } else {
        text.clone()
    };

    if !modifications.is_empty() {
        tracing::debug!(modifications = modifications.len(), "Query sanitized");
    }

    Ok(SanitizedInput {
        normalized: text.to_lowercase(),
        prompt,
        display: text,
        modifications,
    })
}

fn remove_invisible_unicode(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(
                *c,
                '\u{200B}'..='\u{200F}'
                | '\u{202A}'..='\u{202E}'
                | '\u{2060}'..='\u{2064}'
                | '\u{2066}'..='\u{2069}'
                | '\u{FEFF}'
                | '\u{00AD}'
                | '\u{034F}'
                | '\u{061C}'
                | '\u{180E}'
            )
        })
        .collect()
}

/// Newlines and tabs survive here; whitespace collapsing folds them later.
fn remove_control_characters(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Typographic apostrophes and quotes to ASCII so "can’t breathe" matches.
fn normalize_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{02BC}' | '\u{2032}' | '`' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
            other => other,
        })
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max` chars, backing off to the last whitespace.
fn truncate_at_word_boundary(text: &str, max: usize) -> String {
    let cut = match text.char_indices().nth(max) {
        Some((idx, _)) => idx,
        None => return text.to_string(),
    };
    let truncated = &text[..cut];
    match truncated.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => truncated[..pos].to_string(),
        _ => truncated.to_string(),
    }
}
