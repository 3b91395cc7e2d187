//! Mental-Health Crisis Assessor.

use super::types::CrisisAssessment;
use crate::models::CrisisSeverity;
use crate::rules::tables::CRISIS_TRIGGERS;

/// Scan lower-cased text for crisis trigger phrases.
///
/// Any high-severity trigger fixes the severity to high regardless of the
/// order in which triggers matched.
pub fn assess_crisis(text: &str) -> CrisisAssessment {
    let mut triggers = Vec::new();
    let mut severity: Option<CrisisSeverity> = None;

    for trigger in CRISIS_TRIGGERS.iter().filter(|t| text.contains(t.phrase)) {
        triggers.push(trigger.phrase.to_string());
        severity = severity.max(Some(trigger.severity));
    }

    if !triggers.is_empty() {
        tracing::warn!(
            trigger_count = triggers.len(),
            severity = ?severity,
            "Mental-health crisis indicators detected"
        );
    }

    CrisisAssessment {
        is_crisis: !triggers.is_empty(),
        severity,
        triggers,
    }
}
