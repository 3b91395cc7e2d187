use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    CrisisSeverity, EmergencySeverity, EmergencyType, ProviderType, Severity, SymptomCategory,
    TriageLevel,
};

// Clinical flags raised by the router. Distinct from triage safety flags.
pub const CLINICAL_EMERGENCY: &str = "EMERGENCY_PRESENTATION";
pub const CLINICAL_MENTAL_HEALTH: &str = "MENTAL_HEALTH_EMERGENCY";
pub const CLINICAL_URGENT: &str = "URGENT_PRESENTATION";
pub const CLINICAL_COMPLEX: &str = "COMPLEX_MULTI_SYMPTOM";
pub const CLINICAL_PEDIATRIC: &str = "PEDIATRIC_PATIENT";
pub const CLINICAL_GERIATRIC: &str = "GERIATRIC_MULTI_SYMPTOM";
pub const CLINICAL_MULTIPLE_SEVERE: &str = "MULTIPLE_SEVERE_SYMPTOMS";
pub const CLINICAL_HIGH_RISK_PREFIX: &str = "HIGH_RISK_COMBINATION";

// ---------------------------------------------------------------------------
// PriorityScore
// ---------------------------------------------------------------------------

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Priority score {0} outside {min}..={max}", min = PriorityScore::MIN, max = PriorityScore::MAX)]
pub struct PriorityOutOfRange(pub u8);

/// Provider priority in `1..=10`. Only ever moves up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PriorityScore(u8);

impl PriorityScore {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new() -> Self {
        Self(Self::MIN)
    }

    /// Capped addition.
    pub fn add(&mut self, points: u8) {
        self.0 = self.0.saturating_add(points).min(Self::MAX);
    }

    /// Raise to at least `floor` (capped).
    pub fn raise_to(&mut self, floor: u8) {
        self.0 = self.0.max(floor.min(Self::MAX));
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for PriorityScore {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<u8> for PriorityScore {
    type Error = PriorityOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(PriorityOutOfRange(value))
        }
    }
}

impl From<PriorityScore> for u8 {
    fn from(score: PriorityScore) -> u8 {
        score.0
    }
}

// ---------------------------------------------------------------------------
// Provider summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageSnapshot {
    pub level: TriageLevel,
    pub reasons: Vec<String>,
    pub safety_flags: Vec<String>,
    pub is_high_risk: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub emergency_type: Option<EmergencyType>,
    pub emergency_severity: Option<EmergencySeverity>,
    pub requires_emergency_services: bool,
    pub mental_health_crisis: bool,
    pub crisis_severity: Option<CrisisSeverity>,
    pub highest_symptom_severity: Option<Severity>,
    pub severe_symptom_count: usize,
}

/// Provider-facing handoff record. Contains no unredacted free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub age: Option<u32>,
    pub sex: Option<String>,
    /// Redacted, truncated excerpt of the query.
    pub chief_complaint: String,
    pub triage: TriageSnapshot,
    pub symptom_categories: BTreeMap<SymptomCategory, Vec<String>>,
    pub risk: RiskAssessment,
    /// How much the provider can lean on this summary, `0.1..=1.0`.
    pub reliability_score: f32,
}

// ---------------------------------------------------------------------------
// AtdRoutingResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtdRoutingResult {
    pub route_to_provider: bool,
    pub provider_type: ProviderType,
    pub priority_score: PriorityScore,
    pub clinical_flags: BTreeSet<String>,
    pub structured_data: ProviderSummary,
    pub provider_message: String,
    pub patient_guidance: String,
}
