use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::emergency::EmergencyDetection;
use crate::models::lenient::lenient;
use crate::models::{Demographics, DisclaimerCategory, FallbackType, NoticeType, TriageLevel};
use crate::routing::{AtdRoutingResult, PriorityScore};
use crate::triage::TriageResult;

/// Safety pipeline errors. Never cross the orchestrator boundary: each one
/// is converted into a conservative verdict.
#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Input is missing or not text")]
    MalformedInput,

    #[error("Input is empty after sanitization")]
    EmptyInput,

    #[error("Assessment stage failed: {0}")]
    StageFailed(String),

    #[error("Assessment panicked: {0}")]
    Panicked(String),
}

// ---------------------------------------------------------------------------
// Request side
// ---------------------------------------------------------------------------

/// Per-call options. All optional; a field with the wrong shape is
/// dropped rather than failing the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluateOptions {
    #[serde(deserialize_with = "lenient")]
    pub region: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub demographics: Demographics,
    #[serde(alias = "sessionId", deserialize_with = "lenient")]
    pub session_id: Option<String>,
}

/// JSON boundary request. `user_input` is any JSON value so a non-string
/// payload degrades to the ambiguous-input fallback instead of failing to
/// parse. Malformed `options` never discard the text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafetyRequest {
    #[serde(default, alias = "userInput")]
    pub user_input: serde_json::Value,
    #[serde(default, deserialize_with = "lenient")]
    pub options: EvaluateOptions,
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// Disclaimer text is rendered by the UI. The core only signals which
/// categories apply; `disclaimers` and `atd_notices` stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclaimerPack {
    pub disclaimers: Vec<String>,
    pub atd_notices: Vec<String>,
    pub categories: Vec<DisclaimerCategory>,
}

impl DisclaimerPack {
    pub fn for_categories(categories: &[DisclaimerCategory]) -> Self {
        Self {
            disclaimers: Vec::new(),
            atd_notices: Vec::new(),
            categories: categories.to_vec(),
        }
    }
}

/// Canned, non-AI response shown when generated output is suppressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackResponse {
    pub response: String,
    #[serde(rename = "type")]
    pub fallback_type: FallbackType,
    pub disclaimer_pack: DisclaimerPack,
    pub requires_human_intervention: bool,
    pub recommended_actions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_questions: Option<Vec<String>>,
    pub fallback_reason: String,
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyNotice {
    #[serde(rename = "type")]
    pub notice_type: NoticeType,
    pub message: String,
    pub is_visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_actions: Option<Vec<String>>,
}

impl SafetyNotice {
    pub fn new(notice_type: NoticeType, message: impl Into<String>) -> Self {
        Self {
            notice_type,
            message: message.into(),
            is_visible: true,
            recommended_actions: None,
        }
    }

    pub fn with_actions(mut self, actions: Vec<String>) -> Self {
        if !actions.is_empty() {
            self.recommended_actions = Some(actions);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageWarning {
    pub level: TriageLevel,
    pub message: String,
    pub reasons: Vec<String>,
}

/// The only object returned across the core/UI boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyVerdict {
    pub triage_result: TriageResult,
    pub emergency_detection: EmergencyDetection,
    pub atd_routing: AtdRoutingResult,
    pub safety_notices: Vec<SafetyNotice>,
    pub triage_warning: Option<TriageWarning>,
    pub should_block_ai: bool,
    pub requires_human_review: bool,
    pub emergency_protocol: bool,
    pub route_to_provider: bool,
    pub priority_score: PriorityScore,
    pub fallback_response: Option<FallbackResponse>,
}

impl SafetyVerdict {
    pub fn has_notice(&self, notice_type: NoticeType) -> bool {
        self.safety_notices.iter().any(|n| n.notice_type == notice_type)
    }
}

/// Outcome of the respond flow: either the post-processed generated text or
/// a fallback, always alongside the verdict that decided it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeResponse {
    pub verdict: SafetyVerdict,
    pub text: String,
    pub ai_generated: bool,
    pub disclaimer_pack: DisclaimerPack,
    pub rewrites_applied: usize,
}
