//! ATD Router: decides whether the query goes to a human provider, which
//! kind, and how urgently.
//!
//! Rules run in a fixed order against a single `PriorityScore`. Every step
//! either leaves the score alone or raises it, so the final score is the
//! highest any step reached.

use std::collections::BTreeSet;

use super::summary::{build_summary, render_patient_guidance, render_provider_message};
use super::types::*;
use crate::config::DEFAULT_EXCERPT_CHARS;
use crate::emergency::EmergencyDetection;
use crate::models::{Demographics, ProviderType, TriageLevel};
use crate::rules::tables::{HIGH_RISK_PAIRS, MULTI_SYMPTOM_THRESHOLD};
use crate::triage::TriageResult;

const EMERGENCY_SCORE: u8 = 10;
const URGENT_SCORE: u8 = 7;
const PEDIATRIC_FLOOR: u8 = 5;
const GERIATRIC_FLOOR: u8 = 4;
const SEVERE_SYMPTOM_THRESHOLD: usize = 2;
const SEVERE_SYMPTOM_POINTS: u8 = 2;

/// Mutable routing decision for one query.
#[derive(Debug)]
struct RoutingState {
    route: bool,
    provider: ProviderType,
    score: PriorityScore,
    flags: BTreeSet<String>,
}

impl RoutingState {
    fn new() -> Self {
        Self {
            route: false,
            provider: ProviderType::Routine,
            score: PriorityScore::new(),
            flags: BTreeSet::new(),
        }
    }

    fn flag(&mut self, flag: impl Into<String>) {
        self.flags.insert(flag.into());
    }
}

pub struct AtdRouter {
    excerpt_chars: usize,
}

impl AtdRouter {
    pub fn new(excerpt_chars: usize) -> Self {
        Self { excerpt_chars }
    }

    /// Route one assessed query.
    ///
    /// `display_text` is the sanitized query before lower-casing; only a
    /// redacted excerpt of it reaches the provider summary.
    pub fn route(
        &self,
        triage: &TriageResult,
        detection: &EmergencyDetection,
        demographics: &Demographics,
        display_text: &str,
    ) -> AtdRoutingResult {
        let mut state = RoutingState::new();
        let symptom_count = triage.symptoms.len();

        // 1. Emergency from either source.
        if triage.level == TriageLevel::Emergency || detection.is_emergency {
            state.score.raise_to(EMERGENCY_SCORE);
            state.route = true;
            if detection.is_mental_health() {
                state.provider = ProviderType::MentalHealth;
                state.flag(CLINICAL_MENTAL_HEALTH);
            } else {
                state.provider = ProviderType::Emergency;
                state.flag(CLINICAL_EMERGENCY);
            }
        } else if triage.level == TriageLevel::Urgent {
            // 2. Urgent.
            state.score.raise_to(URGENT_SCORE);
            state.route = true;
            state.provider = ProviderType::Urgent;
            state.flag(CLINICAL_URGENT);
            if symptom_count >= MULTI_SYMPTOM_THRESHOLD {
                state.score.add(1);
                state.flag(CLINICAL_COMPLEX);
            }
        }

        // 3. Demographics.
        if demographics.is_pediatric() && symptom_count >= 1 {
            state.score.add(1);
            state.score.raise_to(PEDIATRIC_FLOOR);
            state.route = true;
            state.flag(CLINICAL_PEDIATRIC);
        } else if demographics.is_geriatric() && symptom_count > 1 {
            state.score.add(1);
            state.score.raise_to(GERIATRIC_FLOOR);
            state.route = true;
            state.flag(CLINICAL_GERIATRIC);
        }

        // 4. Multiple severe symptoms.
        if triage.severity_assessment.severe_or_worse() >= SEVERE_SYMPTOM_THRESHOLD {
            state.score.add(SEVERE_SYMPTOM_POINTS);
            state.route = true;
            state.flag(CLINICAL_MULTIPLE_SEVERE);
        }

        // 5. High-risk co-occurrence.
        for &(a, b) in HIGH_RISK_PAIRS {
            if has_fragment(&triage.symptom_names, a) && has_fragment(&triage.symptom_names, b) {
                state.score.add(1);
                state.route = true;
                if state.provider == ProviderType::Routine {
                    state.provider = ProviderType::Urgent;
                }
                state.flag(format!("{CLINICAL_HIGH_RISK_PREFIX}:{a}+{b}"));
                tracing::debug!(pair_a = a, pair_b = b, "High-risk symptom pair present");
            }
        }

        let summary = build_summary(triage, detection, demographics, display_text, self.excerpt_chars);
        let provider_message = render_provider_message(&summary, state.provider, state.score, state.route);
        let patient_guidance = render_patient_guidance(state.provider, state.route, detection);

        tracing::info!(
            route = state.route,
            provider = state.provider.as_str(),
            priority = state.score.value(),
            clinical_flags = state.flags.len(),
            "ATD routing complete"
        );

        AtdRoutingResult {
            route_to_provider: state.route,
            provider_type: state.provider,
            priority_score: state.score,
            clinical_flags: state.flags,
            structured_data: summary,
            provider_message,
            patient_guidance,
        }
    }
}

impl Default for AtdRouter {
    fn default() -> Self {
        Self::new(DEFAULT_EXCERPT_CHARS)
    }
}

fn has_fragment(names: &[String], fragment: &str) -> bool {
    names.iter().any(|n| n.contains(fragment))
}
