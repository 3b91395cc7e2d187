//! User-facing templates for the emergency detector.
//!
//! Pure presentation: selected by (type, severity) and filled with the
//! region's contact numbers.

use crate::models::{EmergencySeverity, EmergencyType};
use crate::rules::EmergencyContacts;

fn crisis_line(contacts: &EmergencyContacts) -> &str {
    contacts.crisis.as_deref().unwrap_or(contacts.emergency.as_str())
}

/// Ordered list of immediate actions.
pub fn immediate_actions(
    emergency_type: Option<EmergencyType>,
    severity: Option<EmergencySeverity>,
    contacts: &EmergencyContacts,
    pediatric: bool,
) -> Vec<String> {
    let emergency = contacts.emergency.as_str();
    let mut actions: Vec<String> = match (emergency_type, severity) {
        (Some(EmergencyType::Medical), Some(EmergencySeverity::Critical)) => vec![
            format!("Call {emergency} or your local emergency number now"),
            "Do not drive yourself to the hospital".into(),
            "Stay on the line and follow the dispatcher's instructions".into(),
            "Unlock the door and keep your phone nearby".into(),
        ],
        (Some(EmergencyType::Trauma), Some(EmergencySeverity::Critical)) => vec![
            format!("Call {emergency} now"),
            "Apply firm, steady pressure to any bleeding".into(),
            "Do not move the person if a head, neck or spine injury is possible".into(),
            "Keep the person warm and still until help arrives".into(),
        ],
        (Some(EmergencyType::MentalHealth), Some(EmergencySeverity::Critical)) => vec![
            format!(
                "Call {} or {emergency} right now",
                crisis_line(contacts)
            ),
            "Stay with someone you trust, or ask someone to come to you".into(),
            "Move away from anything you could use to hurt yourself".into(),
        ],
        (Some(EmergencyType::MentalHealth), _) => vec![
            format!(
                "Reach out to {} to talk with a trained counselor",
                crisis_line(contacts)
            ),
            "Tell someone you trust how you are feeling".into(),
            format!("If you feel unsafe at any point, call {emergency}"),
        ],
        (Some(_), Some(EmergencySeverity::Moderate)) => vec![
            "Contact your doctor or an urgent care clinic today".into(),
            format!("Call {emergency} if symptoms suddenly get worse"),
        ],
        (Some(_), _) => vec![
            format!("Call {emergency} or go to the nearest emergency department"),
            "Do not wait to see if symptoms improve".into(),
        ],
        (None, _) => Vec::new(),
    };

    if pediatric && !actions.is_empty() {
        actions.insert(0, "Stay with the child and keep them calm".into());
    }
    actions
}

/// Short banner text for the detected situation. Empty when nothing was found.
pub fn emergency_message(
    emergency_type: Option<EmergencyType>,
    severity: Option<EmergencySeverity>,
    contacts: &EmergencyContacts,
) -> String {
    let emergency = contacts.emergency.as_str();
    match (emergency_type, severity) {
        (Some(EmergencyType::MentalHealth), Some(EmergencySeverity::Critical)) => format!(
            "You deserve support right now. Please call {} or {emergency} immediately. You are not alone.",
            crisis_line(contacts)
        ),
        (Some(EmergencyType::MentalHealth), _) => format!(
            "It sounds like you are going through a lot. Support is available at {}, any time.",
            crisis_line(contacts)
        ),
        (Some(EmergencyType::Trauma), Some(EmergencySeverity::Critical)) => format!(
            "This may be a serious injury. Call {emergency} now."
        ),
        (Some(_), Some(EmergencySeverity::Critical)) => format!(
            "These symptoms may be a medical emergency. Call {emergency} now."
        ),
        (Some(_), Some(EmergencySeverity::Moderate)) => format!(
            "These symptoms should be checked by a healthcare professional soon. If they get worse, call {emergency}."
        ),
        (Some(_), _) => format!(
            "These symptoms need prompt medical attention. Call {emergency} if you are unsure."
        ),
        (None, _) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::resolve_contacts;

    #[test]
    fn medical_critical_uses_region_number() {
        let uk = resolve_contacts("UK");
        let actions = immediate_actions(
            Some(EmergencyType::Medical),
            Some(EmergencySeverity::Critical),
            &uk,
            false,
        );
        assert!(actions[0].contains("999"));
        assert!(emergency_message(
            Some(EmergencyType::Medical),
            Some(EmergencySeverity::Critical),
            &uk
        )
        .contains("999"));
    }

    #[test]
    fn mental_health_uses_crisis_line() {
        let us = resolve_contacts("US");
        let actions = immediate_actions(
            Some(EmergencyType::MentalHealth),
            Some(EmergencySeverity::High),
            &us,
            false,
        );
        assert!(actions[0].contains("988"));
    }

    #[test]
    fn crisis_line_falls_back_to_emergency_number() {
        let contacts = EmergencyContacts {
            emergency: "112".into(),
            crisis: None,
            poison: None,
        };
        let msg = emergency_message(
            Some(EmergencyType::MentalHealth),
            Some(EmergencySeverity::High),
            &contacts,
        );
        assert!(msg.contains("112"));
    }

    #[test]
    fn pediatric_prepends_child_action() {
        let actions = immediate_actions(
            Some(EmergencyType::Trauma),
            Some(EmergencySeverity::Critical),
            &resolve_contacts("US"),
            true,
        );
        assert!(actions[0].contains("child"));
        assert_eq!(actions.len(), 5);
    }

    #[test]
    fn nothing_detected_yields_empty() {
        let us = resolve_contacts("US");
        assert!(immediate_actions(None, None, &us, true).is_empty());
        assert!(emergency_message(None, None, &us).is_empty());
    }

    #[test]
    fn templates_are_deterministic() {
        let us = resolve_contacts("US");
        let a = immediate_actions(Some(EmergencyType::Medical), Some(EmergencySeverity::Moderate), &us, false);
        let b = immediate_actions(Some(EmergencyType::Medical), Some(EmergencySeverity::Moderate), &us, false);
        assert_eq!(a, b);
    }
}
