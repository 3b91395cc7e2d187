use serde::{Deserialize, Serialize};

use crate::models::{CrisisSeverity, Severity, SymptomCategory, TriageLevel};

// ---------------------------------------------------------------------------
// Safety flag tags
// ---------------------------------------------------------------------------

pub const FLAG_EMERGENCY_SYMPTOMS: &str = "EMERGENCY_SYMPTOMS_DETECTED";
pub const FLAG_MENTAL_HEALTH_CRISIS: &str = "MENTAL_HEALTH_CRISIS";
pub const FLAG_SUICIDE_RISK: &str = "SUICIDE_RISK";
pub const FLAG_SEVERE_SYMPTOMS: &str = "SEVERE_SYMPTOMS";
pub const FLAG_MULTIPLE_MODERATE: &str = "MULTIPLE_MODERATE_SYMPTOMS";
pub const FLAG_RED_FLAG: &str = "RED_FLAG_DETECTED";
pub const FLAG_CHEST_CONCERN: &str = "CONSERVATIVE_CHEST_CONCERN";
pub const FLAG_BREATHING_CONCERN: &str = "CONSERVATIVE_BREATHING_CONCERN";
pub const FLAG_CRISIS_INDICATOR: &str = "CONSERVATIVE_CRISIS_INDICATOR";
pub const FLAG_MULTI_SYMPTOM: &str = "CONSERVATIVE_MULTI_SYMPTOM";
pub const FLAG_PEDIATRIC: &str = "PEDIATRIC_ESCALATION";
pub const FLAG_GERIATRIC: &str = "GERIATRIC_ESCALATION";
pub const FLAG_ASSESSMENT_FAILED: &str = "ASSESSMENT_FAILED";

// ---------------------------------------------------------------------------
// DetectedSymptom
// ---------------------------------------------------------------------------

/// A symptom found in the query. Identity is `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedSymptom {
    pub name: String,
    pub category: SymptomCategory,
    pub severity: Severity,
}

// ---------------------------------------------------------------------------
// CrisisAssessment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisAssessment {
    pub is_crisis: bool,
    pub severity: Option<CrisisSeverity>,
    /// Matched trigger phrases in table order.
    pub triggers: Vec<String>,
}

// ---------------------------------------------------------------------------
// SeverityAssessment
// ---------------------------------------------------------------------------

/// Per-severity counts plus the single highest severity observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityAssessment {
    pub mild: usize,
    pub moderate: usize,
    pub severe: usize,
    pub emergency: usize,
    pub highest: Option<Severity>,
}

impl SeverityAssessment {
    pub fn from_symptoms(symptoms: &[DetectedSymptom]) -> Self {
        let mut out = Self::default();
        for s in symptoms {
            match s.severity {
                Severity::Mild => out.mild += 1,
                Severity::Moderate => out.moderate += 1,
                Severity::Severe => out.severe += 1,
                Severity::Emergency => out.emergency += 1,
            }
            out.highest = out.highest.max(Some(s.severity));
        }
        out
    }

    /// Symptoms at `Severe` or above.
    pub fn severe_or_worse(&self) -> usize {
        self.severe + self.emergency
    }
}

// ---------------------------------------------------------------------------
// TriageState
// ---------------------------------------------------------------------------

/// Accumulator for one classification run. The level can only go up;
/// reasons and flags are append-only.
#[derive(Debug, Clone)]
pub struct TriageState {
    level: TriageLevel,
    reasons: Vec<String>,
    flags: Vec<String>,
}

impl TriageState {
    pub fn new() -> Self {
        Self {
            level: TriageLevel::NonUrgent,
            reasons: Vec::new(),
            flags: Vec::new(),
        }
    }

    pub fn level(&self) -> TriageLevel {
        self.level
    }

    /// Raise to `target` if currently below it. Returns whether it moved.
    pub fn escalate_to_at_least(&mut self, target: TriageLevel) -> bool {
        if target > self.level {
            self.level = target;
            true
        } else {
            false
        }
    }

    /// Raise by exactly one step. No-op at EMERGENCY.
    pub fn escalate_one_step(&mut self) -> bool {
        let next = self.level.next();
        self.escalate_to_at_least(next)
    }

    pub fn add_reason(&mut self, reason: impl Into<String>) {
        self.reasons.push(reason.into());
    }

    /// Flags behave as an insertion-ordered set.
    pub fn add_flag(&mut self, flag: &str) {
        if !self.flags.iter().any(|f| f == flag) {
            self.flags.push(flag.to_string());
        }
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn into_parts(self) -> (TriageLevel, Vec<String>, Vec<String>) {
        (self.level, self.reasons, self.flags)
    }
}

impl Default for TriageState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// TriageResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResult {
    pub level: TriageLevel,
    /// One entry per rule that fired, in firing order.
    pub reasons: Vec<String>,
    /// Insertion-ordered, duplicate-free.
    pub safety_flags: Vec<String>,
    /// `level != NON_URGENT`.
    pub is_high_risk: bool,
    pub symptoms: Vec<DetectedSymptom>,
    pub symptom_names: Vec<String>,
    pub severity_assessment: SeverityAssessment,
    /// `level == EMERGENCY`.
    pub emergency_protocol: bool,
    pub mental_health_crisis: bool,
    pub crisis: CrisisAssessment,
}

impl TriageResult {
    pub fn new(
        state: TriageState,
        symptoms: Vec<DetectedSymptom>,
        crisis: CrisisAssessment,
    ) -> Self {
        let (level, reasons, safety_flags) = state.into_parts();
        let symptom_names = symptoms.iter().map(|s| s.name.clone()).collect();
        let severity_assessment = SeverityAssessment::from_symptoms(&symptoms);
        Self {
            level,
            reasons,
            safety_flags,
            is_high_risk: level != TriageLevel::NonUrgent,
            symptoms,
            symptom_names,
            severity_assessment,
            emergency_protocol: level == TriageLevel::Emergency,
            mental_health_crisis: crisis.is_crisis,
            crisis,
        }
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.safety_flags.iter().any(|f| f == flag)
    }
}
