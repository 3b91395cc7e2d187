use serde::{Deserialize, Serialize};

use super::ParseEnumError;

/// Macro to generate an ordered enum with as_str + std::str::FromStr pattern.
///
/// Variant declaration order is the total order used by `PartialOrd`/`Ord`,
/// and the string form is also the serde wire form.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ParseEnumError {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(
    /// Three-tier urgency. Escalation is the only permitted transition.
    TriageLevel {
        NonUrgent => "NON_URGENT",
        Urgent => "URGENT",
        Emergency => "EMERGENCY",
    }
);

impl TriageLevel {
    /// One step up the ladder. `Emergency` is absorbing.
    pub fn next(self) -> Self {
        match self {
            Self::NonUrgent => Self::Urgent,
            Self::Urgent | Self::Emergency => Self::Emergency,
        }
    }
}

str_enum!(
    /// Per-symptom severity.
    Severity {
        Mild => "mild",
        Moderate => "moderate",
        Severe => "severe",
        Emergency => "emergency",
    }
);

str_enum!(SymptomCategory {
    Cardiovascular => "cardiovascular",
    Respiratory => "respiratory",
    Neurological => "neurological",
    MentalHealth => "mental_health",
    Trauma => "trauma",
    Pain => "pain",
    Infection => "infection",
    Gastrointestinal => "gastrointestinal",
    Allergic => "allergic",
    Toxicological => "toxicological",
    General => "general",
});

str_enum!(CrisisSeverity {
    Medium => "medium",
    High => "high",
});

str_enum!(EmergencyType {
    Medical => "medical",
    MentalHealth => "mental_health",
    Trauma => "trauma",
});

str_enum!(
    /// Severity as reported by the emergency detector.
    EmergencySeverity {
        Moderate => "moderate",
        High => "high",
        Critical => "critical",
    }
);

str_enum!(ProviderType {
    Routine => "routine",
    Urgent => "urgent",
    MentalHealth => "mental_health",
    Emergency => "emergency",
});

str_enum!(FallbackType {
    Emergency => "emergency",
    General => "general",
    MentalHealth => "mental_health",
    Medication => "medication",
    TechnicalError => "technical_error",
});

str_enum!(NoticeType {
    MentalHealth => "mental_health",
    Emergency => "emergency",
    Urgent => "urgent",
    ProviderReferral => "provider_referral",
    AssessmentUnavailable => "assessment_unavailable",
    Clarification => "clarification",
});

str_enum!(
    /// Which disclaimer the UI must render. The core never renders the text.
    DisclaimerCategory {
        General => "general",
        Emergency => "emergency",
        MentalHealth => "mental_health",
        Medication => "medication",
        Provider => "provider",
    }
);
