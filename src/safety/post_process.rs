//! Response post-processor for generated text that was allowed through.
//!
//! Literal, case-insensitive rewrites of overconfident and medical-term
//! phrasing, then an emergency or mental-health banner when the context
//! calls for one.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::types::DisclaimerPack;
use crate::models::{DisclaimerCategory, NoticeType};
use crate::rules::tables::{MEDICAL_TERM_REWRITES, OVERCONFIDENT_REWRITES};
use crate::rules::EmergencyContacts;

struct Rewrite {
    pattern: Regex,
    replacement: &'static str,
}

fn compile(table: &'static [(&'static str, &'static str)]) -> Vec<Rewrite> {
    table
        .iter()
        .map(|&(phrase, replacement)| Rewrite {
            pattern: Regex::new(&format!(r"(?i)\b{}\b", regex::escape(phrase)))
                .expect("Invalid rewrite regex pattern"),
            replacement,
        })
        .collect()
}

static OVERCONFIDENT: LazyLock<Vec<Rewrite>> = LazyLock::new(|| compile(OVERCONFIDENT_REWRITES));
static MEDICAL_TERMS: LazyLock<Vec<Rewrite>> = LazyLock::new(|| compile(MEDICAL_TERM_REWRITES));

/// Context flags that decide which banner is appended.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostProcessContext<'a> {
    pub emergency: bool,
    pub mental_health: bool,
    pub contacts: Option<&'a EmergencyContacts>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostProcessed {
    pub text: String,
    pub rewrites_applied: usize,
    pub banners: Vec<NoticeType>,
    pub disclaimer_pack: DisclaimerPack,
}

/// Keep a leading capital when the matched phrase had one.
fn match_case(matched: &str, replacement: &str) -> String {
    let upper = matched.chars().next().is_some_and(char::is_uppercase);
    if !upper {
        return replacement.to_string();
    }
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn apply(rewrites: &[Rewrite], text: String, count: &mut usize) -> String {
    rewrites.iter().fold(text, |acc, rule| {
        let hits = rule.pattern.find_iter(&acc).count();
        if hits == 0 {
            return acc;
        }
        *count += hits;
        rule.pattern
            .replace_all(&acc, |caps: &Captures| match_case(&caps[0], rule.replacement))
            .into_owned()
    })
}

/// Hedge generated text and append any required banner.
pub fn post_process(text: &str, ctx: &PostProcessContext<'_>) -> PostProcessed {
    let mut rewrites_applied = 0;
    let hedged = apply(&OVERCONFIDENT, text.to_string(), &mut rewrites_applied);
    let mut out = apply(&MEDICAL_TERMS, hedged, &mut rewrites_applied);

    let mut banners = Vec::new();
    let mut categories = vec![DisclaimerCategory::General];
    let emergency_number = ctx.contacts.map_or("your local emergency number", |c| c.emergency.as_str());

    if ctx.emergency {
        out.push_str(&format!(
            "\n\nIMPORTANT: If you think this may be an emergency, call {emergency_number} now."
        ));
        banners.push(NoticeType::Emergency);
        categories.push(DisclaimerCategory::Emergency);
    }
    if ctx.mental_health {
        let line = ctx
            .contacts
            .and_then(|c| c.crisis.as_deref())
            .unwrap_or(emergency_number);
        out.push_str(&format!(
            "\n\nIf you are struggling, support is available any time at {line}. You are not alone."
        ));
        banners.push(NoticeType::MentalHealth);
        categories.push(DisclaimerCategory::MentalHealth);
    }

    if rewrites_applied > 0 {
        tracing::debug!(rewrites = rewrites_applied, "Generated response hedged");
    }

    PostProcessed {
        text: out,
        rewrites_applied,
        banners,
        disclaimer_pack: DisclaimerPack::for_categories(&categories),
    }
}
