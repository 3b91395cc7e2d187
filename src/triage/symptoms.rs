//! Symptom Extractor.
//!
//! Literal substring containment over three tables in fixed order. No
//! tokenization: "chest" inside a longer word still matches.

use super::types::DetectedSymptom;
use crate::rules::tables::{
    SymptomPattern, EMERGENCY_KEYWORDS, EMERGENCY_SYMPTOMS, SYMPTOM_CATALOGUE, URGENT_SYMPTOMS,
};

/// Extract deduplicated symptoms from lower-cased, trimmed text.
///
/// The first pattern that yields a name decides that symptom's category and
/// severity; later tables never overwrite it.
pub fn extract_symptoms(text: &str) -> Vec<DetectedSymptom> {
    let mut found: Vec<DetectedSymptom> = Vec::new();

    for table in [EMERGENCY_SYMPTOMS, URGENT_SYMPTOMS, SYMPTOM_CATALOGUE] {
        for pattern in table.iter().filter(|p| text.contains(p.pattern)) {
            if found.iter().any(|s| s.name == pattern.name) {
                continue;
            }
            found.push(to_symptom(pattern));
        }
    }

    tracing::debug!(count = found.len(), "Symptom extraction complete");
    found
}

/// Emergency keywords present in the text, in table order.
pub fn scan_emergency_keywords(text: &str) -> Vec<&'static str> {
    EMERGENCY_KEYWORDS
        .iter()
        .copied()
        .filter(|kw| text.contains(*kw))
        .collect()
}

fn to_symptom(pattern: &SymptomPattern) -> DetectedSymptom {
    DetectedSymptom {
        name: pattern.name.to_string(),
        category: pattern.category,
        severity: pattern.severity,
    }
}
