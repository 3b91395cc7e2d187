//! Conservative Bias Engine.
//!
//! A fixed, ordered rule list folded over the current triage level. Each
//! firing rule raises the level by exactly one step; EMERGENCY absorbs.
//! Rules see the level as updated by earlier rules in the same pass.

use super::types::{
    CrisisAssessment, TriageState, FLAG_BREATHING_CONCERN, FLAG_CHEST_CONCERN,
    FLAG_CRISIS_INDICATOR, FLAG_GERIATRIC, FLAG_MULTI_SYMPTOM, FLAG_PEDIATRIC,
};
use crate::models::Demographics;
use crate::rules::tables::{
    BREATH_FRAGMENT, CHEST_FRAGMENT, CHEST_PAIN_PHRASE, MULTI_SYMPTOM_THRESHOLD,
};

/// Everything a bias predicate may look at.
pub struct BiasContext<'a> {
    /// Lower-cased query text.
    pub text: &'a str,
    pub crisis: &'a CrisisAssessment,
    pub demographics: &'a Demographics,
    pub distinct_symptoms: usize,
}

enum BiasCondition {
    /// Mentions "chest" but not the literal "chest pain".
    AmbiguousChest,
    BreathingConcern,
    CrisisIndicator,
    Pediatric,
    Geriatric,
    MultiSymptom { threshold: usize },
}

struct BiasRule {
    id: &'static str,
    condition: BiasCondition,
    flag: &'static str,
    reason: &'static str,
}

static BIAS_RULES: &[BiasRule] = &[
    BiasRule {
        id: "CB-CHEST",
        condition: BiasCondition::AmbiguousChest,
        flag: FLAG_CHEST_CONCERN,
        reason: "Conservative bias: ambiguous chest symptom mentioned",
    },
    BiasRule {
        id: "CB-BREATH",
        condition: BiasCondition::BreathingConcern,
        flag: FLAG_BREATHING_CONCERN,
        reason: "Conservative bias: breathing concern mentioned",
    },
    BiasRule {
        id: "CB-CRISIS",
        condition: BiasCondition::CrisisIndicator,
        flag: FLAG_CRISIS_INDICATOR,
        reason: "Conservative bias: mental-health crisis indicator present",
    },
    BiasRule {
        id: "CB-PEDIATRIC",
        condition: BiasCondition::Pediatric,
        flag: FLAG_PEDIATRIC,
        reason: "Conservative bias: pediatric patient",
    },
    BiasRule {
        id: "CB-GERIATRIC",
        condition: BiasCondition::Geriatric,
        flag: FLAG_GERIATRIC,
        reason: "Conservative bias: geriatric patient",
    },
    BiasRule {
        id: "CB-MULTI",
        condition: BiasCondition::MultiSymptom {
            threshold: MULTI_SYMPTOM_THRESHOLD,
        },
        flag: FLAG_MULTI_SYMPTOM,
        reason: "Conservative bias: multiple distinct symptoms reported",
    },
];

impl BiasCondition {
    fn matches(&self, ctx: &BiasContext<'_>) -> bool {
        match self {
            Self::AmbiguousChest => {
                ctx.text.contains(CHEST_FRAGMENT) && !ctx.text.contains(CHEST_PAIN_PHRASE)
            }
            Self::BreathingConcern => ctx.text.contains(BREATH_FRAGMENT),
            Self::CrisisIndicator => ctx.crisis.is_crisis,
            Self::Pediatric => ctx.demographics.is_pediatric(),
            Self::Geriatric => ctx.demographics.is_geriatric(),
            Self::MultiSymptom { threshold } => ctx.distinct_symptoms >= *threshold,
        }
    }
}

/// Fold the bias rules over `state`. Returns the ids of rules that raised
/// the level.
pub fn apply_conservative_bias(state: &mut TriageState, ctx: &BiasContext<'_>) -> Vec<&'static str> {
    let mut fired = Vec::new();

    for rule in BIAS_RULES {
        if !rule.condition.matches(ctx) {
            continue;
        }
        let from = state.level();
        if state.escalate_one_step() {
            tracing::warn!(
                rule_id = rule.id,
                from = %from,
                to = %state.level(),
                "Conservative bias escalation"
            );
            state.add_reason(rule.reason);
            state.add_flag(rule.flag);
            fired.push(rule.id);
        }
    }

    fired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TriageLevel;

    fn run(
        text: &str,
        age: Option<u32>,
        distinct_symptoms: usize,
        crisis: bool,
        start: TriageLevel,
    ) -> (TriageState, Vec<&'static str>) {
        let crisis = CrisisAssessment {
            is_crisis: crisis,
            ..CrisisAssessment::default()
        };
        let demographics = Demographics { age, sex: None };
        let ctx = BiasContext {
            text,
            crisis: &crisis,
            demographics: &demographics,
            distinct_symptoms,
        };
        let mut state = TriageState::new();
        state.escalate_to_at_least(start);
        let fired = apply_conservative_bias(&mut state, &ctx);
        (state, fired)
    }

    #[test]
    fn ambiguous_chest_escalates_one_step() {
        let (state, fired) = run("tightness in my chest", Some(40), 0, false, TriageLevel::NonUrgent);
        assert_eq!(state.level(), TriageLevel::Urgent);
        assert_eq!(fired, vec!["CB-CHEST"]);
    }

    #[test]
    fn literal_chest_pain_is_not_ambiguous() {
        let (_, fired) = run("chest pain", Some(40), 1, false, TriageLevel::NonUrgent);
        assert!(!fired.contains(&"CB-CHEST"));
    }

    #[test]
    fn sequential_fold_compounds() {
        let (state, fired) = run(
            "chest feels tight and short of breath",
            Some(40),
            0,
            false,
            TriageLevel::NonUrgent,
        );
        assert_eq!(state.level(), TriageLevel::Emergency);
        assert_eq!(fired, vec!["CB-CHEST", "CB-BREATH"]);
    }

    #[test]
    fn emergency_absorbs() {
        let (state, fired) = run("chest and breath", Some(5), 4, true, TriageLevel::Emergency);
        assert_eq!(state.level(), TriageLevel::Emergency);
        assert!(fired.is_empty());
        assert!(state.reasons().is_empty());
    }

    #[test]
    fn pediatric_flag_recorded() {
        let (state, fired) = run("my baby has a fever", Some(1), 1, false, TriageLevel::NonUrgent);
        assert_eq!(state.level(), TriageLevel::Urgent);
        assert_eq!(fired, vec!["CB-PEDIATRIC"]);
        assert!(state.flags().iter().any(|f| f == FLAG_PEDIATRIC));
    }

    #[test]
    fn geriatric_and_multi_symptom() {
        let (state, fired) = run("cough, fever, fatigue", Some(80), 3, false, TriageLevel::NonUrgent);
        assert_eq!(fired, vec!["CB-GERIATRIC", "CB-MULTI"]);
        assert_eq!(state.level(), TriageLevel::Emergency);
    }

    #[test]
    fn adult_with_nothing_is_untouched() {
        let (state, fired) = run("i have a mild headache", Some(30), 1, false, TriageLevel::NonUrgent);
        assert_eq!(state.level(), TriageLevel::NonUrgent);
        assert!(fired.is_empty());
    }

    #[test]
    fn never_lowers_level() {
        for start in [TriageLevel::NonUrgent, TriageLevel::Urgent, TriageLevel::Emergency] {
            for text in ["", "chest", "breath", "chest pain"] {
                for age in [None, Some(3), Some(40), Some(90)] {
                    let (state, _) = run(text, age, 5, false, start);
                    assert!(state.level() >= start);
                }
            }
        }
    }
}
