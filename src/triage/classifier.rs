//! Triage Classifier.
//!
//! One pass, seeded at NON_URGENT, strictly escalating:
//! 1. emergency symptoms / emergency keywords
//! 2. mental-health crisis
//! 3. severity roll-up
//! 4. red-flag list
//! 5. conservative bias
//! 6. demographic escalation
//!
//! Reasons and flags from every step are kept in arrival order.

use super::bias::{apply_conservative_bias, BiasContext};
use super::crisis::assess_crisis;
use super::symptoms::{extract_symptoms, scan_emergency_keywords};
use super::types::{
    DetectedSymptom, TriageResult, TriageState, FLAG_EMERGENCY_SYMPTOMS, FLAG_GERIATRIC,
    FLAG_MENTAL_HEALTH_CRISIS, FLAG_MULTIPLE_MODERATE, FLAG_PEDIATRIC, FLAG_RED_FLAG,
    FLAG_SEVERE_SYMPTOMS, FLAG_SUICIDE_RISK,
};
use crate::models::{CrisisSeverity, Demographics, Severity, TriageLevel};
use crate::rules::RuleRepository;

pub struct TriageClassifier<'r> {
    rules: &'r RuleRepository,
}

impl<'r> TriageClassifier<'r> {
    pub fn new(rules: &'r RuleRepository) -> Self {
        Self { rules }
    }

    /// Classify normalized (lower-cased, trimmed) text.
    pub fn classify(&self, text: &str, demographics: &Demographics) -> TriageResult {
        let symptoms = extract_symptoms(text);
        let crisis = assess_crisis(text);
        let mut state = TriageState::new();

        // Step 1: emergency-tagged patterns
        let emergency_symptoms: Vec<&str> = symptoms
            .iter()
            .filter(|s| s.severity == Severity::Emergency)
            .map(|s| s.name.as_str())
            .collect();
        let emergency_keywords = scan_emergency_keywords(text);
        if !emergency_symptoms.is_empty() || !emergency_keywords.is_empty() {
            state.escalate_to_at_least(TriageLevel::Emergency);
            state.add_flag(FLAG_EMERGENCY_SYMPTOMS);
            let mut matched: Vec<&str> = emergency_symptoms;
            matched.extend(emergency_keywords);
            state.add_reason(format!("Emergency symptoms detected: {}", matched.join(", ")));
        }

        // Step 2: mental-health crisis always reaches the top level
        if crisis.is_crisis {
            state.escalate_to_at_least(TriageLevel::Emergency);
            state.add_flag(FLAG_MENTAL_HEALTH_CRISIS);
            state.add_reason("Mental-health crisis indicators present");
            if crisis.severity == Some(CrisisSeverity::High) {
                state.add_flag(FLAG_SUICIDE_RISK);
                state.add_reason("High-severity crisis language (possible suicide risk)");
            }
        }

        // Step 3: severity roll-up
        apply_severity_rollup(&mut state, &symptoms);

        // Step 4: red flags
        for flag in self.rules.red_flags().matches(text) {
            state.escalate_to_at_least(flag.level);
            state.add_flag(FLAG_RED_FLAG);
            state.add_reason(format!("Red flag ({}): {}", flag.level, flag.reason));
        }

        // Step 5: conservative bias
        let ctx = BiasContext {
            text,
            crisis: &crisis,
            demographics,
            distinct_symptoms: symptoms.len(),
        };
        apply_conservative_bias(&mut state, &ctx);

        // Step 6: demographic escalation
        apply_demographic_escalation(&mut state, demographics, symptoms.len());

        let result = TriageResult::new(state, symptoms, crisis);
        tracing::info!(
            level = %result.level,
            symptom_count = result.symptom_names.len(),
            flag_count = result.safety_flags.len(),
            reason_count = result.reasons.len(),
            "Triage classification complete"
        );
        result
    }
}

fn apply_severity_rollup(state: &mut TriageState, symptoms: &[DetectedSymptom]) {
    let has = |sev: Severity| symptoms.iter().any(|s| s.severity == sev);
    let moderate_count = symptoms
        .iter()
        .filter(|s| s.severity == Severity::Moderate)
        .count();

    if has(Severity::Emergency) {
        state.escalate_to_at_least(TriageLevel::Emergency);
        state.add_reason("Severity roll-up: emergency-severity symptom present");
    } else if has(Severity::Severe) && state.level() == TriageLevel::NonUrgent {
        state.escalate_to_at_least(TriageLevel::Urgent);
        state.add_flag(FLAG_SEVERE_SYMPTOMS);
        state.add_reason("Severity roll-up: severe symptom present");
    } else if moderate_count >= 2 && state.level() == TriageLevel::NonUrgent {
        state.escalate_to_at_least(TriageLevel::Urgent);
        state.add_flag(FLAG_MULTIPLE_MODERATE);
        state.add_reason(format!(
            "Severity roll-up: {moderate_count} moderate symptoms present"
        ));
    }
}

fn apply_demographic_escalation(
    state: &mut TriageState,
    demographics: &Demographics,
    symptom_count: usize,
) {
    if state.level() != TriageLevel::NonUrgent {
        return;
    }
    if demographics.is_pediatric() && symptom_count >= 1 {
        state.escalate_to_at_least(TriageLevel::Urgent);
        state.add_flag(FLAG_PEDIATRIC);
        state.add_reason("Pediatric patient with symptoms");
    } else if demographics.is_geriatric() && symptom_count > 1 {
        state.escalate_to_at_least(TriageLevel::Urgent);
        state.add_flag(FLAG_GERIATRIC);
        state.add_reason("Geriatric patient with multiple symptoms");
    }
}
