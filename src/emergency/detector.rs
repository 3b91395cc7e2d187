//! Emergency Detector.
//!
//! Runs on the raw (normalized) query independently of triage. Sources are
//! checked in priority order: medical, trauma, mental-health crisis, then
//! the concerning-but-subtler list. The first source that matches decides
//! the emergency type; severity is the highest any source reached.

use super::messages::{emergency_message, immediate_actions};
use super::types::EmergencyDetection;
use crate::models::{CrisisSeverity, Demographics, EmergencySeverity, EmergencyType};
use crate::rules::resolve_contacts;
use crate::rules::tables::{CONCERNING_PATTERNS, MEDICAL_EMERGENCY_PATTERNS, TRAUMA_EMERGENCY_PATTERNS};
use crate::triage::crisis::assess_crisis;

#[derive(Default)]
struct Findings {
    emergency_type: Option<EmergencyType>,
    severity: Option<EmergencySeverity>,
    patterns: Vec<String>,
    requires_services: bool,
}

impl Findings {
    fn record(&mut self, kind: EmergencyType, severity: EmergencySeverity, matched: Vec<&str>) {
        if matched.is_empty() {
            return;
        }
        if self.emergency_type.is_none() {
            self.emergency_type = Some(kind);
        }
        self.severity = self.severity.max(Some(severity));
        self.patterns.extend(matched.into_iter().map(str::to_string));
    }
}

fn matching<'a>(text: &str, patterns: &'a [&'a str]) -> Vec<&'a str> {
    patterns.iter().copied().filter(|p| text.contains(*p)).collect()
}

/// Detect emergencies in lower-cased text for a region.
pub fn detect_emergency(text: &str, region: &str, demographics: &Demographics) -> EmergencyDetection {
    let mut findings = Findings::default();

    let medical = matching(text, MEDICAL_EMERGENCY_PATTERNS);
    if !medical.is_empty() {
        findings.requires_services = true;
    }
    findings.record(EmergencyType::Medical, EmergencySeverity::Critical, medical);

    let trauma = matching(text, TRAUMA_EMERGENCY_PATTERNS);
    if !trauma.is_empty() {
        findings.requires_services = true;
    }
    findings.record(EmergencyType::Trauma, EmergencySeverity::Critical, trauma);

    let crisis = assess_crisis(text);
    if crisis.is_crisis {
        let high = crisis.severity == Some(CrisisSeverity::High);
        let severity = if high {
            EmergencySeverity::Critical
        } else {
            EmergencySeverity::High
        };
        findings.requires_services |= high;
        let triggers: Vec<&str> = crisis.triggers.iter().map(String::as_str).collect();
        findings.record(EmergencyType::MentalHealth, severity, triggers);
    }

    let concerning = matching(text, CONCERNING_PATTERNS);
    findings.record(EmergencyType::Medical, EmergencySeverity::Moderate, concerning);

    let contacts = resolve_contacts(region);
    let is_emergency = findings.severity >= Some(EmergencySeverity::High);
    let actions = immediate_actions(
        findings.emergency_type,
        findings.severity,
        &contacts,
        demographics.is_pediatric(),
    );
    let message = emergency_message(findings.emergency_type, findings.severity, &contacts);

    if is_emergency {
        tracing::warn!(
            emergency_type = ?findings.emergency_type,
            severity = ?findings.severity,
            pattern_count = findings.patterns.len(),
            requires_services = findings.requires_services,
            "Emergency detected"
        );
    }

    EmergencyDetection {
        is_emergency,
        emergency_type: findings.emergency_type,
        severity: findings.severity,
        triggered_patterns: findings.patterns,
        requires_emergency_services: findings.requires_services,
        emergency_contacts: contacts,
        immediate_actions: actions,
        emergency_message: message,
    }
}
