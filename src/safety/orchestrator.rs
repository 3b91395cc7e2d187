//! Safety Orchestrator: the single entry point of the safety layer.
//!
//! sanitize → triage → emergency detection → ATD routing → reconcile →
//! notices → fallback → analytics.
//!
//! `evaluate` never fails. Malformed input gets the ambiguous-input
//! fallback; any error or panic inside the assessment becomes a
//! conservative failure verdict that blocks AI output.

use std::collections::{BTreeMap, BTreeSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use super::fallback::{generate_fallback, FallbackContext};
use super::post_process::{post_process, PostProcessContext};
use super::sanitize::{sanitize_input, SanitizedInput};
use super::types::*;
use crate::analytics::{AnalyticsEvent, AnalyticsSink};
use crate::config::SafetyConfig;
use crate::emergency::{detect_emergency, EmergencyDetection};
use crate::generator::{build_prompt, GeneratorError, ResponseGenerator};
use crate::models::{Demographics, NoticeType, ProviderType, TriageLevel};
use crate::routing::types::{RiskAssessment, TriageSnapshot};
use crate::routing::{AtdRouter, AtdRoutingResult, PriorityScore, ProviderSummary};
use crate::rules::{resolve_contacts, EmergencyContacts, RuleRepository};
use crate::triage::types::{TriageState, FLAG_ASSESSMENT_FAILED, FLAG_EMERGENCY_SYMPTOMS};
use crate::triage::{CrisisAssessment, TriageClassifier, TriageResult};

/// Flag substrings that count toward the blocking threshold.
const CRITICAL_FLAG_MARKERS: &[&str] = &["EMERGENCY", "CRISIS", "SUICIDE"];
const CRITICAL_FLAG_BLOCK_THRESHOLD: usize = 2;
const FAILURE_PRIORITY: u8 = 5;

pub struct SafetyOrchestrator {
    rules: Arc<RuleRepository>,
    config: SafetyConfig,
    router: AtdRouter,
    sink: Option<Arc<dyn AnalyticsSink>>,
}

impl SafetyOrchestrator {
    pub fn new(rules: Arc<RuleRepository>, config: SafetyConfig) -> Self {
        let router = AtdRouter::new(config.excerpt_chars);
        Self {
            rules,
            config,
            router,
            sink: None,
        }
    }

    /// Load rules as configured (red-flag file or built-in table).
    pub fn from_config(config: SafetyConfig) -> Self {
        let rules = Arc::new(RuleRepository::from_config(&config));
        Self::new(rules, config)
    }

    pub fn with_sink(mut self, sink: Arc<dyn AnalyticsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn rules(&self) -> &RuleRepository {
        &self.rules
    }

    pub fn config(&self) -> &SafetyConfig {
        &self.config
    }

    /// Evaluate one query. `None` stands for absent or non-text input.
    pub fn evaluate(&self, user_input: Option<&str>, options: &EvaluateOptions) -> SafetyVerdict {
        self.evaluate_inner(user_input, options).0
    }

    /// JSON boundary: any non-string `user_input` is malformed input.
    pub fn evaluate_request(&self, request: &SafetyRequest) -> SafetyVerdict {
        self.evaluate(request.user_input.as_str(), &request.options)
    }

    /// Evaluate, then either return the fallback or generate and
    /// post-process a response. The generator is never called for a
    /// blocked verdict.
    pub fn respond(
        &self,
        user_input: Option<&str>,
        options: &EvaluateOptions,
        generator: &dyn ResponseGenerator,
    ) -> SafeResponse {
        let (mut verdict, input) = self.evaluate_inner(user_input, options);
        let contacts = verdict.emergency_detection.emergency_contacts.clone();

        let input = match input {
            Some(input) if !verdict.should_block_ai => input,
            _ => return fallback_response(verdict),
        };

        let generated = generator
            .generate(&build_prompt(&input.prompt))
            .and_then(|text| {
                if text.trim().is_empty() {
                    Err(GeneratorError::EmptyOutput)
                } else {
                    Ok(text)
                }
            });

        match generated {
            Ok(text) => {
                let ctx = PostProcessContext {
                    emergency: verdict.emergency_protocol
                        || verdict.emergency_detection.severity.is_some(),
                    mental_health: verdict.triage_result.mental_health_crisis
                        || verdict.emergency_detection.is_mental_health(),
                    contacts: Some(&contacts),
                };
                let processed = post_process(&text, &ctx);
                SafeResponse {
                    verdict,
                    text: processed.text,
                    ai_generated: true,
                    disclaimer_pack: processed.disclaimer_pack,
                    rewrites_applied: processed.rewrites_applied,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Response generation failed, using fallback");
                let fallback = generate_fallback(&FallbackContext {
                    text: &input.normalized,
                    triage: Some(&verdict.triage_result),
                    detection: Some(&verdict.emergency_detection),
                    contacts: &contacts,
                    technical_failure: true,
                    safety_concern: false,
                });
                verdict.requires_human_review |= fallback.requires_human_intervention;
                verdict.fallback_response = Some(fallback);
                fallback_response(verdict)
            }
        }
    }

    // ── Pipeline ────────────────────────────────────────────

    fn evaluate_inner(
        &self,
        user_input: Option<&str>,
        options: &EvaluateOptions,
    ) -> (SafetyVerdict, Option<SanitizedInput>) {
        let region = self.region(options);
        let demographics = &options.demographics;

        let sanitized = user_input
            .ok_or(SafetyError::MalformedInput)
            .and_then(|raw| sanitize_input(raw, self.config.max_input_length));

        let (verdict, input) = match sanitized {
            Err(e) => {
                tracing::warn!(error = %e, "Unusable input, returning clarification fallback");
                (self.malformed_verdict(&region, demographics), None)
            }
            Ok(input) => {
                let verdict = self.guarded(&region, || self.assess(&input, &region, demographics));
                (verdict, Some(input))
            }
        };

        self.emit(&verdict, &region, options.session_id.as_deref(), input.as_ref());
        (verdict, input)
    }

    /// Run `f`, converting an error or a panic into the failure verdict.
    fn guarded<F>(&self, region: &str, f: F) -> SafetyVerdict
    where
        F: FnOnce() -> Result<SafetyVerdict, SafetyError>,
    {
        let outcome = catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|panic| {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(SafetyError::Panicked(message))
        });

        match outcome {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::error!(error = %e, "Safety assessment failed, returning conservative verdict");
                failure_verdict(resolve_contacts(region))
            }
        }
    }

    fn assess(
        &self,
        input: &SanitizedInput,
        region: &str,
        demographics: &Demographics,
    ) -> Result<SafetyVerdict, SafetyError> {
        let text = input.normalized.as_str();

        let triage = TriageClassifier::new(&self.rules).classify(text, demographics);
        let detection = detect_emergency(text, region, demographics);
        let atd = self.router.route(&triage, &detection, demographics, &input.display);

        let emergency_protocol = triage.emergency_protocol || detection.is_emergency;
        let should_block_ai = should_block(&triage, &detection);
        let safety_notices = build_notices(&triage, &detection, &atd, emergency_protocol);

        let fallback_response = should_block_ai.then(|| {
            generate_fallback(&FallbackContext {
                text,
                triage: Some(&triage),
                detection: Some(&detection),
                contacts: &detection.emergency_contacts,
                technical_failure: false,
                safety_concern: true,
            })
        });

        let verdict = SafetyVerdict {
            triage_warning: triage_warning(&triage),
            should_block_ai,
            requires_human_review: should_block_ai || atd.route_to_provider,
            emergency_protocol,
            route_to_provider: atd.route_to_provider,
            priority_score: atd.priority_score,
            fallback_response,
            safety_notices,
            triage_result: triage,
            emergency_detection: detection,
            atd_routing: atd,
        };

        check_contract(&verdict)?;

        tracing::info!(
            level = verdict.triage_result.level.as_str(),
            emergency_protocol = verdict.emergency_protocol,
            blocked = verdict.should_block_ai,
            routed = verdict.route_to_provider,
            priority = verdict.priority_score.value(),
            notices = verdict.safety_notices.len(),
            "Safety verdict"
        );
        Ok(verdict)
    }

    /// Missing, non-text or empty input.
    fn malformed_verdict(&self, region: &str, demographics: &Demographics) -> SafetyVerdict {
        let contacts = resolve_contacts(region);
        let triage = TriageResult::new(TriageState::new(), Vec::new(), CrisisAssessment::default());
        let detection = EmergencyDetection::none(contacts.clone());
        let atd = self.router.route(&triage, &detection, demographics, "");
        let fallback = generate_fallback(&FallbackContext {
            text: "",
            triage: None,
            detection: None,
            contacts: &contacts,
            technical_failure: false,
            safety_concern: false,
        });

        SafetyVerdict {
            safety_notices: vec![SafetyNotice::new(
                NoticeType::Clarification,
                "We couldn't read your message. Please describe what's going on in your own words.",
            )],
            triage_warning: None,
            should_block_ai: true,
            requires_human_review: true,
            emergency_protocol: false,
            route_to_provider: atd.route_to_provider,
            priority_score: atd.priority_score,
            fallback_response: Some(fallback),
            triage_result: triage,
            emergency_detection: detection,
            atd_routing: atd,
        }
    }

    fn region(&self, options: &EvaluateOptions) -> String {
        options
            .region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(&self.config.default_region)
            .to_ascii_uppercase()
    }

    fn emit(
        &self,
        verdict: &SafetyVerdict,
        region: &str,
        session_id: Option<&str>,
        input: Option<&SanitizedInput>,
    ) {
        if !self.config.analytics_enabled {
            return;
        }
        let Some(sink) = &self.sink else {
            return;
        };
        let event = AnalyticsEvent::from_verdict(
            verdict,
            region,
            session_id,
            input.map(|i| i.display.as_str()),
            self.config.excerpt_chars,
        );
        if let Err(e) = sink.record(event) {
            tracing::warn!(error = %e, "Analytics emission failed");
        }
    }
}

impl Default for SafetyOrchestrator {
    fn default() -> Self {
        Self::new(Arc::new(RuleRepository::builtin()), SafetyConfig::default())
    }
}

// ── Reconciliation ──────────────────────────────────────────

fn should_block(triage: &TriageResult, detection: &EmergencyDetection) -> bool {
    let critical_flags = triage
        .safety_flags
        .iter()
        .filter(|f| CRITICAL_FLAG_MARKERS.iter().any(|m| f.contains(m)))
        .count();

    detection.is_emergency
        || triage.emergency_protocol
        || (triage.mental_health_crisis && detection.is_critical())
        || critical_flags >= CRITICAL_FLAG_BLOCK_THRESHOLD
}

fn check_contract(verdict: &SafetyVerdict) -> Result<(), SafetyError> {
    if verdict.emergency_protocol
        && !verdict.has_notice(NoticeType::Emergency)
        && !verdict.has_notice(NoticeType::MentalHealth)
    {
        return Err(SafetyError::StageFailed(
            "emergency protocol without an emergency notice".into(),
        ));
    }
    if verdict.should_block_ai && verdict.fallback_response.is_none() {
        return Err(SafetyError::StageFailed("blocked verdict without fallback".into()));
    }
    Ok(())
}

fn triage_warning(triage: &TriageResult) -> Option<TriageWarning> {
    let message = match triage.level {
        TriageLevel::NonUrgent => return None,
        TriageLevel::Urgent => "These symptoms need prompt medical attention.",
        TriageLevel::Emergency => "These symptoms may need emergency care.",
    };
    Some(TriageWarning {
        level: triage.level,
        message: message.to_string(),
        reasons: triage.reasons.clone(),
    })
}

// ── Notices ─────────────────────────────────────────────────

fn build_notices(
    triage: &TriageResult,
    detection: &EmergencyDetection,
    atd: &AtdRoutingResult,
    emergency_protocol: bool,
) -> Vec<SafetyNotice> {
    let contacts = &detection.emergency_contacts;
    let mut notices = Vec::new();

    let crisis = triage.mental_health_crisis || detection.is_mental_health();
    if crisis {
        let notice = if detection.is_mental_health() {
            SafetyNotice::new(NoticeType::MentalHealth, detection.emergency_message.clone())
                .with_actions(detection.immediate_actions.clone())
        } else {
            let line = contacts.crisis.as_deref().unwrap_or(contacts.emergency.as_str());
            SafetyNotice::new(
                NoticeType::MentalHealth,
                format!("Support is available any time at {line}. You are not alone."),
            )
            .with_actions(vec![format!("Call or text {line}")])
        };
        notices.push(notice);
    }

    let medical = triage.has_flag(FLAG_EMERGENCY_SYMPTOMS)
        || (detection.is_emergency && !detection.is_mental_health())
        || (triage.emergency_protocol && !triage.mental_health_crisis);
    if emergency_protocol && (medical || !crisis) {
        let message = if detection.is_emergency && !detection.is_mental_health() {
            detection.emergency_message.clone()
        } else {
            format!("These symptoms may be a medical emergency. Call {} now.", contacts.emergency)
        };
        let actions = if detection.is_mental_health() {
            vec![format!("Call {} now", contacts.emergency)]
        } else {
            detection.immediate_actions.clone()
        };
        notices.push(SafetyNotice::new(NoticeType::Emergency, message).with_actions(actions));
    } else if triage.is_high_risk && !emergency_protocol {
        notices.push(SafetyNotice::new(
            NoticeType::Urgent,
            "Your symptoms should be checked by a healthcare professional soon.",
        ));
    }

    if atd.route_to_provider {
        notices.push(SafetyNotice::new(NoticeType::ProviderReferral, atd.patient_guidance.clone()));
    }
    notices
}

// ── Failure paths ───────────────────────────────────────────

fn fallback_response(verdict: SafetyVerdict) -> SafeResponse {
    let (text, disclaimer_pack) = match &verdict.fallback_response {
        Some(f) => (f.response.clone(), f.disclaimer_pack.clone()),
        None => (String::new(), DisclaimerPack::default()),
    };
    SafeResponse {
        verdict,
        text,
        ai_generated: false,
        disclaimer_pack,
        rewrites_applied: 0,
    }
}

/// Conservative verdict for an assessment that could not complete. Built
/// without touching any pipeline stage.
fn failure_verdict(contacts: EmergencyContacts) -> SafetyVerdict {
    let mut state = TriageState::new();
    state.escalate_to_at_least(TriageLevel::Urgent);
    state.add_flag(FLAG_ASSESSMENT_FAILED);
    state.add_reason("Assessment could not be completed");
    let triage = TriageResult::new(state, Vec::new(), CrisisAssessment::default());

    let mut score = PriorityScore::new();
    score.raise_to(FAILURE_PRIORITY);
    let guidance = format!(
        "Please contact a healthcare provider about your concern. In an emergency, call {}.",
        contacts.emergency
    );
    let atd = AtdRoutingResult {
        route_to_provider: true,
        provider_type: ProviderType::Urgent,
        priority_score: score,
        clinical_flags: BTreeSet::from([FLAG_ASSESSMENT_FAILED.to_string()]),
        structured_data: ProviderSummary {
            age: None,
            sex: None,
            chief_complaint: String::new(),
            triage: TriageSnapshot {
                level: triage.level,
                reasons: triage.reasons.clone(),
                safety_flags: triage.safety_flags.clone(),
                is_high_risk: triage.is_high_risk,
            },
            symptom_categories: BTreeMap::new(),
            risk: RiskAssessment {
                emergency_type: None,
                emergency_severity: None,
                requires_emergency_services: false,
                mental_health_crisis: false,
                crisis_severity: None,
                highest_symptom_severity: None,
                severe_symptom_count: 0,
            },
            reliability_score: 0.1,
        },
        provider_message: "Automated assessment unavailable. Manual review required.".to_string(),
        patient_guidance: guidance,
    };

    let mut fallback = generate_fallback(&FallbackContext {
        text: "",
        triage: None,
        detection: None,
        contacts: &contacts,
        technical_failure: true,
        safety_concern: false,
    });
    fallback.fallback_reason = "Internal assessment error".to_string();

    SafetyVerdict {
        safety_notices: vec![SafetyNotice::new(
            NoticeType::AssessmentUnavailable,
            "We were unable to assess your message. Please contact a healthcare provider if you are concerned.",
        )],
        triage_warning: triage_warning(&triage),
        should_block_ai: true,
        requires_human_review: true,
        emergency_protocol: false,
        route_to_provider: true,
        priority_score: score,
        fallback_response: Some(fallback),
        triage_result: triage,
        emergency_detection: EmergencyDetection::none(contacts),
        atd_routing: atd,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::analytics::test_support::{FailingSink, MemorySink};
    use crate::models::{EmergencyType, FallbackType};
    use crate::routing::types::CLINICAL_PEDIATRIC;
    use crate::triage::types::{FLAG_MENTAL_HEALTH_CRISIS, FLAG_PEDIATRIC};

    fn orchestrator() -> SafetyOrchestrator {
        SafetyOrchestrator::default()
    }

    fn with_age(age: u32) -> EvaluateOptions {
        EvaluateOptions {
            demographics: Demographics {
                age: Some(age),
                sex: None,
            },
            ..Default::default()
        }
    }

    fn eval(text: &str, options: &EvaluateOptions) -> SafetyVerdict {
        orchestrator().evaluate(Some(text), options)
    }

    const CORPUS: &[&str] = &[
        "I have chest pain and can't breathe",
        "I have a mild headache",
        "my baby has a fever",
        "I want to end my life tonight",
        "I feel hopeless lately",
        "my chest feels tight",
        "short of breath when climbing stairs",
        "high fever, confusion and a rash",
        "worst headache of my life with blurred vision",
        "he was in a car accident and is bleeding heavily",
        "some chest tightness after running",
        "cough, sore throat, runny nose and fatigue",
        "what dose of ibuprofen is safe",
        "she fainted twice today",
        "I took an overdose of pills",
        "my knee hurts a bit",
        "",
        "   ",
        "\u{200B}\u{FEFF}",
    ];

    fn demographics_grid() -> Vec<EvaluateOptions> {
        vec![EvaluateOptions::default(), with_age(1), with_age(30), with_age(80)]
    }

    // =================================================================
    // SCENARIOS
    // =================================================================

    #[test]
    fn scenario_a_chest_pain_and_breathing() {
        let v = eval("I have chest pain and can't breathe", &EvaluateOptions::default());
        assert_eq!(v.triage_result.level, TriageLevel::Emergency);
        assert_eq!(v.emergency_detection.emergency_type, Some(EmergencyType::Medical));
        assert!(v.route_to_provider);
        assert_eq!(v.atd_routing.provider_type, ProviderType::Emergency);
        assert_eq!(v.priority_score.value(), 10);
        assert!(v.should_block_ai);
        assert_eq!(
            v.fallback_response.as_ref().map(|f| f.fallback_type),
            Some(FallbackType::Emergency)
        );
    }

    #[test]
    fn scenario_b_mild_headache_adult() {
        let v = eval("I have a mild headache", &with_age(30));
        assert_eq!(v.triage_result.level, TriageLevel::NonUrgent);
        assert!(!v.triage_result.is_high_risk);
        assert!(!v.route_to_provider);
        assert!(!v.should_block_ai);
        assert!(v.fallback_response.is_none());
        assert!(v.triage_warning.is_none());
        assert!(!v.requires_human_review);
    }

    #[test]
    fn scenario_c_pediatric_fever() {
        let v = eval("my baby has a fever", &with_age(1));
        assert!(v.triage_result.has_flag(FLAG_PEDIATRIC));
        assert!(v.triage_result.level >= TriageLevel::Urgent);
        assert!(v.route_to_provider);
        assert!(v.priority_score.value() >= 5);
        assert!(v.triage_warning.is_some());
    }

    #[test]
    fn scenario_d_suicidal_intent() {
        let v = eval("I want to end my life tonight", &EvaluateOptions::default());
        assert_eq!(v.triage_result.level, TriageLevel::Emergency);
        assert!(v.triage_result.mental_health_crisis);
        assert_eq!(v.safety_notices[0].notice_type, NoticeType::MentalHealth);
        assert!(v.should_block_ai);
        assert_eq!(
            v.fallback_response.as_ref().map(|f| f.fallback_type),
            Some(FallbackType::MentalHealth)
        );
    }

    // =================================================================
    // PROPERTIES
    // =================================================================

    #[test]
    fn demographics_never_lower_the_level() {
        for text in CORPUS {
            let base = eval(text, &EvaluateOptions::default()).triage_result.level;
            for options in demographics_grid() {
                let level = eval(text, &options).triage_result.level;
                assert!(level >= base, "{text:?} with {:?}", options.demographics);
            }
        }
    }

    #[test]
    fn either_detector_triggers_emergency_protocol_and_block() {
        for text in CORPUS {
            for options in demographics_grid() {
                let v = eval(text, &options);
                if v.triage_result.level == TriageLevel::Emergency || v.emergency_detection.is_emergency {
                    assert!(v.emergency_protocol, "{text:?}");
                    assert!(v.should_block_ai, "{text:?}");
                }
            }
        }
    }

    #[test]
    fn priority_score_within_bounds() {
        for text in CORPUS {
            for options in demographics_grid() {
                let score = eval(text, &options).priority_score.value();
                assert!((1..=10).contains(&score), "{text:?} -> {score}");
            }
        }
    }

    #[test]
    fn output_contract_holds() {
        for text in CORPUS {
            for options in demographics_grid() {
                let v = eval(text, &options);
                if v.emergency_protocol {
                    assert!(
                        v.has_notice(NoticeType::Emergency) || v.has_notice(NoticeType::MentalHealth),
                        "{text:?}"
                    );
                }
                if v.should_block_ai {
                    assert!(v.fallback_response.is_some(), "{text:?}");
                }
                assert_eq!(v.requires_human_review, v.should_block_ai || v.route_to_provider);
            }
        }
    }

    #[test]
    fn high_crisis_phrases_dominate() {
        for phrase in ["kill myself", "end my life", "suicidal", "want to die"] {
            let text = format!("I have a mild cough and I {phrase}");
            let v = eval(&text, &EvaluateOptions::default());
            assert_eq!(v.triage_result.level, TriageLevel::Emergency, "{phrase}");
            assert!(v.triage_result.mental_health_crisis);
            assert!(v.triage_result.has_flag(FLAG_MENTAL_HEALTH_CRISIS));
            let fallback_type = v.fallback_response.as_ref().map(|f| f.fallback_type);
            assert!(matches!(
                fallback_type,
                Some(FallbackType::MentalHealth) | Some(FallbackType::Emergency)
            ));
        }
    }

    // =================================================================
    // FAIL-SAFE
    // =================================================================

    #[test]
    fn missing_input_blocks_with_general_fallback() {
        let v = orchestrator().evaluate(None, &EvaluateOptions::default());
        assert!(v.should_block_ai);
        assert!(v.requires_human_review);
        let fallback = v.fallback_response.expect("fallback");
        assert_eq!(fallback.fallback_type, FallbackType::General);
        assert!(fallback.follow_up_questions.is_some());
        assert_eq!(v.safety_notices[0].notice_type, NoticeType::Clarification);
    }

    #[test]
    fn non_string_json_input_blocks() {
        for value in [serde_json::json!(42), serde_json::json!(null), serde_json::json!({"a": 1})] {
            let request = SafetyRequest {
                user_input: value,
                options: EvaluateOptions::default(),
            };
            let v = orchestrator().evaluate_request(&request);
            assert!(v.should_block_ai);
            let kind = v.fallback_response.map(|f| f.fallback_type);
            assert!(matches!(kind, Some(FallbackType::General) | Some(FallbackType::TechnicalError)));
        }
    }

    #[test]
    fn whitespace_only_input_is_malformed() {
        let v = eval("  \n\t ", &EvaluateOptions::default());
        assert!(v.should_block_ai);
        assert_eq!(v.triage_result.level, TriageLevel::NonUrgent);
    }

    #[test]
    fn panic_becomes_failure_verdict() {
        let o = orchestrator();
        let v = o.guarded("UK", || panic!("boom"));
        assert!(v.should_block_ai);
        assert!(v.requires_human_review);
        assert!(v.triage_result.has_flag(FLAG_ASSESSMENT_FAILED));
        assert_eq!(v.safety_notices[0].notice_type, NoticeType::AssessmentUnavailable);
        let fallback = v.fallback_response.expect("fallback");
        assert_eq!(fallback.fallback_type, FallbackType::TechnicalError);
        assert!(fallback.response.contains("999"));
    }

    #[test]
    fn stage_error_becomes_failure_verdict() {
        let o = orchestrator();
        let v = o.guarded("US", || Err(SafetyError::StageFailed("routing".into())));
        assert!(v.should_block_ai);
        assert!(v.route_to_provider);
        assert_eq!(v.priority_score.value(), FAILURE_PRIORITY);
    }

    #[test]
    fn malformed_demographics_never_discard_the_text() {
        for age in ["0.5", "-1", "\"two\""] {
            let raw = format!(
                r#"{{"userInput": "my baby is not breathing", "options": {{"demographics": {{"age": {age}}}}}}}"#
            );
            let request: SafetyRequest = serde_json::from_str(&raw).unwrap();
            let v = orchestrator().evaluate_request(&request);
            assert_eq!(v.triage_result.level, TriageLevel::Emergency, "age {age}");
            assert!(v.emergency_protocol, "age {age}");
            assert!(v.has_notice(NoticeType::Emergency), "age {age}");
            assert!(v.route_to_provider, "age {age}");
        }
    }

    #[test]
    fn fractional_infant_age_keeps_pediatric_routing() {
        let request: SafetyRequest = serde_json::from_str(
            r#"{"userInput": "my baby has a fever", "options": {"demographics": {"age": 0.5}}}"#,
        )
        .unwrap();
        let v = orchestrator().evaluate_request(&request);
        assert!(v.triage_result.has_flag(FLAG_PEDIATRIC));
        assert!(v.atd_routing.clinical_flags.contains(CLINICAL_PEDIATRIC));
        assert!(v.priority_score.value() >= 5);
    }

    // =================================================================
    // OPTIONS
    // =================================================================

    #[test]
    fn region_selects_contacts() {
        let options = EvaluateOptions {
            region: Some("au".into()),
            ..Default::default()
        };
        let v = eval("he is unconscious", &options);
        assert_eq!(v.emergency_detection.emergency_contacts.emergency, "000");
        assert!(v.fallback_response.unwrap().response.contains("000"));
    }

    #[test]
    fn unknown_region_falls_back_to_us() {
        let options = EvaluateOptions {
            region: Some("ZZ".into()),
            ..Default::default()
        };
        let v = eval("he is unconscious", &options);
        assert_eq!(v.emergency_detection.emergency_contacts.emergency, "911");
    }

    #[test]
    fn emergency_past_the_length_cap_still_escalates() {
        let o = orchestrator();
        let text = format!(
            "{} and now crushing chest pain",
            "I have had a long week at work ".repeat(70)
        );
        assert!(text.chars().count() > o.config().max_input_length);
        let v = o.evaluate(Some(&text), &EvaluateOptions::default());
        assert_eq!(v.triage_result.level, TriageLevel::Emergency);
        assert!(v.emergency_protocol);
        assert!(v.should_block_ai);
        assert!(v.emergency_detection.is_emergency);
    }

    #[test]
    fn crisis_past_a_small_cap_still_escalates() {
        let config = SafetyConfig {
            max_input_length: 20,
            ..Default::default()
        };
        let o = SafetyOrchestrator::new(Arc::new(RuleRepository::builtin()), config);
        let v = o.evaluate(
            Some("my knee hurts a lot today and i want to end my life"),
            &EvaluateOptions::default(),
        );
        assert!(v.triage_result.mental_health_crisis);
        assert!(v.should_block_ai);
    }

    #[test]
    fn generator_receives_capped_prompt() {
        let config = SafetyConfig {
            max_input_length: 20,
            ..Default::default()
        };
        let o = SafetyOrchestrator::new(Arc::new(RuleRepository::builtin()), config);
        let seen = RefCell::new(String::new());
        let generator = |prompt: &str| -> Result<String, GeneratorError> {
            *seen.borrow_mut() = prompt.to_string();
            Ok("Rest and ice the knee.".into())
        };
        let r = o.respond(
            Some("my knee hurts a lot today and it keeps clicking"),
            &EvaluateOptions::default(),
            &generator,
        );
        assert!(r.ai_generated);
        assert_eq!(*seen.borrow(), build_prompt("my knee hurts a lot"));
    }

    // =================================================================
    // RESPOND
    // =================================================================

    #[test]
    fn blocked_verdict_never_calls_generator() {
        let calls = Cell::new(0);
        let generator = |_: &str| -> Result<String, GeneratorError> {
            calls.set(calls.get() + 1);
            Ok("You have a cold.".into())
        };
        let r = orchestrator().respond(
            Some("I have chest pain"),
            &EvaluateOptions::default(),
            &generator,
        );
        assert_eq!(calls.get(), 0);
        assert!(!r.ai_generated);
        assert!(r.text.contains("911"));
    }

    #[test]
    fn generated_text_is_post_processed() {
        let generator =
            |_: &str| -> Result<String, GeneratorError> { Ok("You have a common cold.".into()) };
        let r = orchestrator().respond(Some("I have a cough"), &EvaluateOptions::default(), &generator);
        assert!(r.ai_generated);
        assert_eq!(r.text, "You may have a common cold.");
        assert_eq!(r.rewrites_applied, 1);
    }

    #[test]
    fn generator_failure_yields_technical_fallback() {
        let generator = |_: &str| -> Result<String, GeneratorError> {
            Err(GeneratorError::Unavailable("offline".into()))
        };
        let r = orchestrator().respond(Some("I have a cough"), &EvaluateOptions::default(), &generator);
        assert!(!r.ai_generated);
        let fallback = r.verdict.fallback_response.expect("fallback");
        assert_eq!(fallback.fallback_type, FallbackType::TechnicalError);
    }

    #[test]
    fn empty_generation_counts_as_failure() {
        let generator = |_: &str| -> Result<String, GeneratorError> { Ok("   ".into()) };
        let r = orchestrator().respond(Some("I have a cough"), &EvaluateOptions::default(), &generator);
        assert!(!r.ai_generated);
    }

    #[test]
    fn concerning_symptoms_get_emergency_banner() {
        let generator = |_: &str| -> Result<String, GeneratorError> { Ok("Rest well.".into()) };
        let r = orchestrator().respond(
            Some("some chest tightness after running"),
            &EvaluateOptions::default(),
            &generator,
        );
        assert!(r.ai_generated);
        assert!(r.text.contains("call 911"));
    }

    // =================================================================
    // CONCURRENCY
    // =================================================================

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn orchestrator_is_shareable_across_threads() {
        assert_send_sync::<SafetyOrchestrator>();
        assert_send_sync::<RuleRepository>();
        assert_send_sync::<SafetyVerdict>();
    }

    #[test]
    fn parallel_evaluations_match_sequential() {
        const THREADS: usize = 4;
        let sink = Arc::new(MemorySink::default());
        let o = orchestrator().with_sink(sink.clone());
        let expected: Vec<SafetyVerdict> = CORPUS
            .iter()
            .map(|text| o.evaluate(Some(text), &with_age(80)))
            .collect();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(|| {
                        CORPUS
                            .iter()
                            .map(|text| o.evaluate(Some(text), &with_age(80)))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });

        assert_eq!(sink.events.lock().unwrap().len(), CORPUS.len() * (THREADS + 1));
    }

    // =================================================================
    // ANALYTICS
    // =================================================================

    #[test]
    fn one_event_per_evaluation() {
        let sink = Arc::new(MemorySink::default());
        let o = orchestrator().with_sink(sink.clone());
        o.evaluate(Some("I have a cough"), &EvaluateOptions::default());
        o.evaluate(None, &EvaluateOptions::default());
        assert_eq!(sink.events.lock().unwrap().len(), 2);
    }

    #[test]
    fn analytics_failure_never_fails_verdict() {
        let o = orchestrator().with_sink(Arc::new(FailingSink));
        let v = o.evaluate(Some("I have chest pain"), &EvaluateOptions::default());
        assert!(v.should_block_ai);
    }

    #[test]
    fn analytics_can_be_disabled() {
        let sink = Arc::new(MemorySink::default());
        let config = SafetyConfig {
            analytics_enabled: false,
            ..Default::default()
        };
        let o = SafetyOrchestrator::new(Arc::new(RuleRepository::builtin()), config)
            .with_sink(sink.clone());
        o.evaluate(Some("I have a cough"), &EvaluateOptions::default());
        assert!(sink.events.lock().unwrap().is_empty());
    }

    #[test]
    fn verdict_serializes_with_wire_names() {
        let v = eval("I want to end my life tonight", &EvaluateOptions::default());
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["triage_result"]["level"], "EMERGENCY");
        assert_eq!(json["safety_notices"][0]["type"], "mental_health");
        assert_eq!(json["priority_score"], 10);
    }
}
