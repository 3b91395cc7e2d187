//! Provider-facing summary and the two rendered texts that accompany it.

use std::collections::BTreeMap;

use super::types::{PriorityScore, ProviderSummary, RiskAssessment, TriageSnapshot};
use crate::emergency::EmergencyDetection;
use crate::models::{Demographics, ProviderType, SymptomCategory};
use crate::rules::redact::redacted_excerpt;
use crate::triage::TriageResult;

const BASE_RELIABILITY: f32 = 0.5;
const PER_SYMPTOM_RELIABILITY: f32 = 0.1;
const SYMPTOM_RELIABILITY_CAP: f32 = 0.9;
const DEMOGRAPHICS_BONUS: f32 = 0.1;
const SHORT_INPUT_PENALTY: f32 = 0.2;
const SHORT_INPUT_CHARS: usize = 10;

/// Reliability in `0.1..=1.0`, rounded to two decimals.
pub fn reliability_score(symptom_count: usize, demographics: &Demographics, input_chars: usize) -> f32 {
    let mut score = (BASE_RELIABILITY + PER_SYMPTOM_RELIABILITY * symptom_count as f32)
        .min(SYMPTOM_RELIABILITY_CAP);
    if !demographics.is_empty() {
        score += DEMOGRAPHICS_BONUS;
    }
    if input_chars < SHORT_INPUT_CHARS {
        score -= SHORT_INPUT_PENALTY;
    }
    (score.clamp(0.1, 1.0) * 100.0).round() / 100.0
}

pub fn build_summary(
    triage: &TriageResult,
    detection: &EmergencyDetection,
    demographics: &Demographics,
    display_text: &str,
    excerpt_chars: usize,
) -> ProviderSummary {
    let mut symptom_categories: BTreeMap<SymptomCategory, Vec<String>> = BTreeMap::new();
    for s in &triage.symptoms {
        symptom_categories
            .entry(s.category)
            .or_default()
            .push(s.name.clone());
    }

    ProviderSummary {
        age: demographics.age,
        sex: demographics.sex.clone(),
        chief_complaint: redacted_excerpt(display_text, excerpt_chars),
        triage: TriageSnapshot {
            level: triage.level,
            reasons: triage.reasons.clone(),
            safety_flags: triage.safety_flags.clone(),
            is_high_risk: triage.is_high_risk,
        },
        symptom_categories,
        risk: RiskAssessment {
            emergency_type: detection.emergency_type,
            emergency_severity: detection.severity,
            requires_emergency_services: detection.requires_emergency_services,
            mental_health_crisis: triage.mental_health_crisis,
            crisis_severity: triage.crisis.severity,
            highest_symptom_severity: triage.severity_assessment.highest,
            severe_symptom_count: triage.severity_assessment.severe_or_worse(),
        },
        reliability_score: reliability_score(
            triage.symptoms.len(),
            demographics,
            display_text.chars().count(),
        ),
    }
}

fn provider_label(provider: ProviderType) -> &'static str {
    match provider {
        ProviderType::Emergency => "Emergency services",
        ProviderType::MentalHealth => "Mental health crisis team",
        ProviderType::Urgent => "Urgent care",
        ProviderType::Routine => "Primary care",
    }
}

fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

pub fn render_provider_message(
    summary: &ProviderSummary,
    provider: ProviderType,
    score: PriorityScore,
    routed: bool,
) -> String {
    let mut lines = Vec::with_capacity(8);
    let disposition = if routed { "referral" } else { "no referral" };
    lines.push(format!(
        "[Priority {}/{}] {} {}",
        score.value(),
        PriorityScore::MAX,
        provider_label(provider),
        disposition
    ));
    lines.push(format!("Triage level: {}", summary.triage.level));

    let age = summary
        .age
        .map_or_else(|| "unknown".to_string(), |a| a.to_string());
    let sex = summary.sex.as_deref().unwrap_or("unknown");
    lines.push(format!("Patient: age {age}, sex {sex}"));

    let symptoms: Vec<String> = summary
        .symptom_categories
        .iter()
        .map(|(cat, names)| format!("{} ({})", names.join(", "), cat))
        .collect();
    lines.push(format!("Symptoms: {}", join_or(&symptoms, "none identified")));
    lines.push(format!(
        "Safety flags: {}",
        join_or(&summary.triage.safety_flags, "none")
    ));
    if let Some(kind) = summary.risk.emergency_type {
        let severity = summary
            .risk
            .emergency_severity
            .map_or("unknown", |s| s.as_str());
        lines.push(format!("Emergency assessment: {kind} ({severity})"));
    }
    lines.push(format!("Chief complaint: {}", summary.chief_complaint));
    lines.push(format!("Summary reliability: {:.2}", summary.reliability_score));
    lines.join("\n")
}

pub fn render_patient_guidance(
    provider: ProviderType,
    routed: bool,
    detection: &EmergencyDetection,
) -> String {
    let contacts = &detection.emergency_contacts;
    match (provider, routed) {
        (ProviderType::Emergency, _) => format!(
            "Please call {} or go to the nearest emergency department now. Do not wait for symptoms to improve.",
            contacts.emergency
        ),
        (ProviderType::MentalHealth, _) => format!(
            "Please reach out for support now. You can call {} at any time, or {} if you are in immediate danger.",
            contacts.crisis.as_deref().unwrap_or(contacts.emergency.as_str()),
            contacts.emergency
        ),
        (ProviderType::Urgent, _) => format!(
            "Please contact your doctor or an urgent care clinic within the next few hours. If things get worse, call {}.",
            contacts.emergency
        ),
        (ProviderType::Routine, true) => {
            "Please book an appointment with your doctor to talk about these symptoms.".to_string()
        }
        (ProviderType::Routine, false) => {
            "Keep an eye on how you feel. Contact a healthcare provider if symptoms get worse, last longer than expected, or new ones appear.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo(age: Option<u32>) -> Demographics {
        Demographics { age, sex: None }
    }

    #[test]
    fn reliability_base() {
        assert_eq!(reliability_score(0, &demo(None), 40), 0.5);
    }

    #[test]
    fn reliability_symptoms_capped() {
        assert_eq!(reliability_score(2, &demo(None), 40), 0.7);
        assert_eq!(reliability_score(9, &demo(None), 40), 0.9);
    }

    #[test]
    fn reliability_demographics_bonus_reaches_ceiling() {
        assert_eq!(reliability_score(9, &demo(Some(40)), 40), 1.0);
    }

    #[test]
    fn reliability_short_input_penalty() {
        assert_eq!(reliability_score(0, &demo(None), 3), 0.3);
    }

    #[test]
    fn guidance_uses_region_numbers() {
        let detection = EmergencyDetection::none(crate::rules::resolve_contacts("NZ"));
        let text = render_patient_guidance(ProviderType::Emergency, true, &detection);
        assert!(text.contains("111"));
        let text = render_patient_guidance(ProviderType::MentalHealth, true, &detection);
        assert!(text.contains("1737"));
    }

    #[test]
    fn guidance_unrouted_routine_is_self_care() {
        let detection = EmergencyDetection::none(crate::rules::resolve_contacts("US"));
        let text = render_patient_guidance(ProviderType::Routine, false, &detection);
        assert!(text.contains("Keep an eye"));
    }
}
