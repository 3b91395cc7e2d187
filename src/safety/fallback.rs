//! Fallback engine: the canned response shown instead of AI output.
//!
//! Strict priority, first match wins:
//! emergency > mental-health crisis > urgent level > technical failure >
//! safety concern > ambiguous input.

use super::types::{DisclaimerPack, FallbackResponse};
use crate::emergency::EmergencyDetection;
use crate::models::{DisclaimerCategory, FallbackType, TriageLevel};
use crate::rules::tables::{BREATH_FRAGMENT, CHEST_FRAGMENT};
use crate::rules::EmergencyContacts;
use crate::triage::TriageResult;

const MEDICATION_TERMS: &[&str] = &[
    "medication",
    "medicine",
    "prescription",
    "dose",
    "dosage",
    "pill",
    "tablet",
    "drug",
    "mg",
    "antibiotic",
];

const CLARIFYING_QUESTIONS: &[&str] = &[
    "What symptoms are you experiencing?",
    "When did they start, and are they getting better or worse?",
    "How severe are they on a scale from 1 to 10?",
    "Is this about you or someone else, and how old are they?",
];

/// Everything the fallback engine may consult. Assessment parts are
/// optional so malformed input and internal failures can still get a
/// fallback.
pub struct FallbackContext<'a> {
    /// Lower-cased query text, empty when there was none.
    pub text: &'a str,
    pub triage: Option<&'a TriageResult>,
    pub detection: Option<&'a EmergencyDetection>,
    pub contacts: &'a EmergencyContacts,
    /// The response generator failed or the assessment itself errored.
    pub technical_failure: bool,
    /// AI output is being suppressed for a safety reason.
    pub safety_concern: bool,
}

impl FallbackContext<'_> {
    fn is_medical_emergency(&self) -> bool {
        let detected = self
            .detection
            .is_some_and(|d| d.is_emergency && !d.is_mental_health());
        let triaged = self
            .triage
            .is_some_and(|t| t.level == TriageLevel::Emergency && !t.mental_health_crisis);
        detected || triaged
    }

    fn is_crisis(&self) -> bool {
        self.triage.is_some_and(|t| t.mental_health_crisis)
            || self.detection.is_some_and(|d| d.is_mental_health())
    }

    fn is_elevated(&self) -> bool {
        self.triage.is_some_and(|t| t.level >= TriageLevel::Urgent)
    }

    fn mentions_medication(&self) -> bool {
        self.text
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| MEDICATION_TERMS.iter().any(|t| word.starts_with(t)))
    }

    fn crisis_line(&self) -> &str {
        self.contacts
            .crisis
            .as_deref()
            .unwrap_or(self.contacts.emergency.as_str())
    }
}

/// Build the fallback for this query. Never fails.
pub fn generate_fallback(ctx: &FallbackContext<'_>) -> FallbackResponse {
    let fallback = if ctx.is_medical_emergency() {
        emergency_fallback(ctx)
    } else if ctx.is_crisis() {
        crisis_fallback(ctx)
    } else if ctx.is_elevated() {
        urgent_fallback(ctx)
    } else if ctx.technical_failure {
        technical_fallback(ctx)
    } else if ctx.safety_concern {
        safety_concern_fallback(ctx)
    } else {
        ambiguous_fallback()
    };

    tracing::info!(
        fallback_type = fallback.fallback_type.as_str(),
        human_intervention = fallback.requires_human_intervention,
        "Fallback response generated"
    );
    fallback
}

fn emergency_fallback(ctx: &FallbackContext<'_>) -> FallbackResponse {
    let emergency = ctx.contacts.emergency.as_str();
    let (response, mut actions, reason) = if ctx.text.contains(CHEST_FRAGMENT) {
        (
            format!(
                "Chest pain or pressure can be a sign of a heart attack. Call {emergency} now. \
                 Do not drive yourself to the hospital."
            ),
            vec![
                format!("Call {emergency} immediately"),
                "Stop any activity and sit or lie down".to_string(),
                "If you are not allergic and a dispatcher advises it, chew an aspirin".to_string(),
                "Unlock the door so responders can reach you".to_string(),
            ],
            "Emergency: chest symptoms",
        )
    } else if ctx.text.contains(BREATH_FRAGMENT) {
        (
            format!(
                "Serious trouble breathing is a medical emergency. Call {emergency} now."
            ),
            vec![
                format!("Call {emergency} immediately"),
                "Sit upright and try to stay calm".to_string(),
                "Use a prescribed rescue inhaler or epinephrine auto-injector if you have one".to_string(),
                "Loosen tight clothing around the neck and chest".to_string(),
            ],
            "Emergency: breathing difficulty",
        )
    } else {
        (
            format!(
                "What you describe may be a medical emergency. Please call {emergency} or go to the \
                 nearest emergency department now."
            ),
            vec![
                format!("Call {emergency} immediately"),
                "Do not wait to see if symptoms improve".to_string(),
                "Stay with someone until help arrives".to_string(),
            ],
            "Emergency: symptoms require immediate care",
        )
    };

    let mut reason = reason.to_string();
    if let Some(d) = ctx.detection.filter(|d| !d.triggered_patterns.is_empty()) {
        reason = format!("{reason} ({})", d.triggered_patterns.join(", "));
    }
    if let Some(poison) = ctx.contacts.poison.as_deref() {
        if ctx.text.contains("overdose") || ctx.text.contains("poison") {
            actions.push(format!("Poison control: {poison}"));
        }
    }

    FallbackResponse {
        response,
        fallback_type: FallbackType::Emergency,
        disclaimer_pack: DisclaimerPack::for_categories(&[
            DisclaimerCategory::Emergency,
            DisclaimerCategory::General,
        ]),
        requires_human_intervention: true,
        recommended_actions: actions,
        follow_up_questions: None,
        fallback_reason: reason,
    }
}

fn crisis_fallback(ctx: &FallbackContext<'_>) -> FallbackResponse {
    let line = ctx.crisis_line();
    let emergency = ctx.contacts.emergency.as_str();
    FallbackResponse {
        response: format!(
            "I'm really sorry you're feeling this way. You don't have to go through it alone. \
             Please reach out to {line} now to talk with someone who can help. If you are in \
             immediate danger, call {emergency}."
        ),
        fallback_type: FallbackType::MentalHealth,
        disclaimer_pack: DisclaimerPack::for_categories(&[
            DisclaimerCategory::MentalHealth,
            DisclaimerCategory::General,
        ]),
        requires_human_intervention: true,
        recommended_actions: vec![
            format!("Call or text {line}"),
            "Reach out to someone you trust and tell them how you feel".to_string(),
            "Stay somewhere safe and away from anything you could use to hurt yourself".to_string(),
            format!("Call {emergency} if you are in immediate danger"),
        ],
        follow_up_questions: None,
        fallback_reason: "Mental-health crisis indicators".to_string(),
    }
}

fn urgent_fallback(ctx: &FallbackContext<'_>) -> FallbackResponse {
    let emergency = ctx.contacts.emergency.as_str();
    FallbackResponse {
        response: format!(
            "Your symptoms should be checked by a healthcare professional soon. Please contact \
             your doctor or an urgent care clinic today. If symptoms get worse, call {emergency}."
        ),
        fallback_type: FallbackType::General,
        disclaimer_pack: DisclaimerPack::for_categories(&[
            DisclaimerCategory::Provider,
            DisclaimerCategory::General,
        ]),
        requires_human_intervention: true,
        recommended_actions: vec![
            "Contact your doctor or an urgent care clinic today".to_string(),
            "Write down your symptoms and when they started".to_string(),
            format!("Call {emergency} if symptoms suddenly get worse"),
        ],
        follow_up_questions: None,
        fallback_reason: "Urgent triage level".to_string(),
    }
}

fn technical_fallback(ctx: &FallbackContext<'_>) -> FallbackResponse {
    let emergency = ctx.contacts.emergency.as_str();
    FallbackResponse {
        response: format!(
            "We couldn't safely assess your message right now. If you are worried about your \
             health, please contact a healthcare provider. In an emergency, call {emergency}."
        ),
        fallback_type: FallbackType::TechnicalError,
        disclaimer_pack: DisclaimerPack::for_categories(&[DisclaimerCategory::General]),
        requires_human_intervention: true,
        recommended_actions: vec![
            "Try again in a few minutes".to_string(),
            "Contact a healthcare provider if you are concerned".to_string(),
        ],
        follow_up_questions: None,
        fallback_reason: "Technical failure".to_string(),
    }
}

fn safety_concern_fallback(ctx: &FallbackContext<'_>) -> FallbackResponse {
    if ctx.mentions_medication() {
        return FallbackResponse {
            response: "Questions about medicines and doses are best answered by your pharmacist \
                       or prescriber, who know your full history."
                .to_string(),
            fallback_type: FallbackType::Medication,
            disclaimer_pack: DisclaimerPack::for_categories(&[
                DisclaimerCategory::Medication,
                DisclaimerCategory::General,
            ]),
            requires_human_intervention: false,
            recommended_actions: vec![
                "Ask your pharmacist or prescriber".to_string(),
                "Do not change or stop a medication without medical advice".to_string(),
            ],
            follow_up_questions: None,
            fallback_reason: "Safety concern: medication question".to_string(),
        };
    }
    FallbackResponse {
        response: "This is something a healthcare professional should look at with you directly."
            .to_string(),
        fallback_type: FallbackType::General,
        disclaimer_pack: DisclaimerPack::for_categories(&[
            DisclaimerCategory::Provider,
            DisclaimerCategory::General,
        ]),
        requires_human_intervention: false,
        recommended_actions: vec!["Contact your doctor to discuss your concern".to_string()],
        follow_up_questions: None,
        fallback_reason: "Safety concern".to_string(),
    }
}

fn ambiguous_fallback() -> FallbackResponse {
    FallbackResponse {
        response: "I want to make sure I understand. Could you tell me a bit more about what's \
                   going on?"
            .to_string(),
        fallback_type: FallbackType::General,
        disclaimer_pack: DisclaimerPack::for_categories(&[DisclaimerCategory::General]),
        requires_human_intervention: false,
        recommended_actions: vec!["Describe your symptoms in your own words".to_string()],
        follow_up_questions: Some(CLARIFYING_QUESTIONS.iter().map(|q| q.to_string()).collect()),
        fallback_reason: "Ambiguous or missing input".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emergency::detect_emergency;
    use crate::models::Demographics;
    use crate::rules::{resolve_contacts, RuleRepository};
    use crate::triage::TriageClassifier;

    fn fallback_for(text: &str, technical_failure: bool, safety_concern: bool) -> FallbackResponse {
        let rules = RuleRepository::builtin();
        let demographics = Demographics::default();
        let triage = TriageClassifier::new(&rules).classify(text, &demographics);
        let detection = detect_emergency(text, "US", &demographics);
        let contacts = resolve_contacts("US");
        generate_fallback(&FallbackContext {
            text,
            triage: Some(&triage),
            detection: Some(&detection),
            contacts: &contacts,
            technical_failure,
            safety_concern,
        })
    }

    #[test]
    fn chest_emergency_gets_chest_script() {
        let f = fallback_for("i have chest pain", false, true);
        assert_eq!(f.fallback_type, FallbackType::Emergency);
        assert!(f.response.contains("heart attack"));
        assert!(f.fallback_reason.contains("chest pain"));
        assert!(f.requires_human_intervention);
    }

    #[test]
    fn breathing_emergency_gets_breathing_script() {
        let f = fallback_for("i can't breathe", false, true);
        assert_eq!(f.fallback_type, FallbackType::Emergency);
        assert!(f.response.contains("breathing"));
    }

    #[test]
    fn generic_emergency_includes_number() {
        let f = fallback_for("she had a seizure", false, true);
        assert_eq!(f.fallback_type, FallbackType::Emergency);
        assert!(f.response.contains("911"));
    }

    #[test]
    fn overdose_adds_poison_control() {
        let f = fallback_for("i think he took an overdose", false, true);
        assert!(f.recommended_actions.iter().any(|a| a.contains("1-800-222-1222")));
    }

    #[test]
    fn crisis_gets_mental_health() {
        let f = fallback_for("i want to kill myself", false, true);
        assert_eq!(f.fallback_type, FallbackType::MentalHealth);
        assert!(f.response.contains("988"));
        assert_eq!(
            f.disclaimer_pack.categories,
            vec![DisclaimerCategory::MentalHealth, DisclaimerCategory::General]
        );
    }

    #[test]
    fn urgent_beats_technical_failure() {
        let f = fallback_for("i have a high fever", true, false);
        assert_eq!(f.fallback_type, FallbackType::General);
        assert_eq!(f.fallback_reason, "Urgent triage level");
    }

    #[test]
    fn technical_failure_when_nothing_elevated() {
        let f = fallback_for("i have a cough", true, false);
        assert_eq!(f.fallback_type, FallbackType::TechnicalError);
    }

    #[test]
    fn medication_safety_concern() {
        let f = fallback_for("what dose of my medication should i take", false, true);
        assert_eq!(f.fallback_type, FallbackType::Medication);
    }

    #[test]
    fn ambiguous_default_asks_questions() {
        let contacts = resolve_contacts("US");
        let f = generate_fallback(&FallbackContext {
            text: "",
            triage: None,
            detection: None,
            contacts: &contacts,
            technical_failure: false,
            safety_concern: false,
        });
        assert_eq!(f.fallback_type, FallbackType::General);
        assert!(f.follow_up_questions.is_some_and(|q| !q.is_empty()));
    }

    #[test]
    fn disclaimer_text_is_always_empty() {
        for text in ["i have chest pain", "i want to die", "i have a cough"] {
            let f = fallback_for(text, true, true);
            assert!(f.disclaimer_pack.disclaimers.is_empty());
            assert!(f.disclaimer_pack.atd_notices.is_empty());
            assert!(!f.disclaimer_pack.categories.is_empty());
        }
    }
}
