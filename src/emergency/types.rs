use serde::{Deserialize, Serialize};

use crate::models::{EmergencySeverity, EmergencyType};
use crate::rules::EmergencyContacts;

/// Outcome of the independent emergency pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyDetection {
    /// True iff severity is HIGH or CRITICAL.
    pub is_emergency: bool,
    pub emergency_type: Option<EmergencyType>,
    /// `None` when nothing matched.
    pub severity: Option<EmergencySeverity>,
    pub triggered_patterns: Vec<String>,
    pub requires_emergency_services: bool,
    pub emergency_contacts: EmergencyContacts,
    pub immediate_actions: Vec<String>,
    pub emergency_message: String,
}

impl EmergencyDetection {
    /// A detection with nothing found, used by failure verdicts.
    pub fn none(contacts: EmergencyContacts) -> Self {
        Self {
            is_emergency: false,
            emergency_type: None,
            severity: None,
            triggered_patterns: Vec::new(),
            requires_emergency_services: false,
            emergency_contacts: contacts,
            immediate_actions: Vec::new(),
            emergency_message: String::new(),
        }
    }

    pub fn is_mental_health(&self) -> bool {
        self.emergency_type == Some(EmergencyType::MentalHealth)
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Some(EmergencySeverity::Critical)
    }
}
