pub mod types;
pub mod sanitize;
pub mod fallback;
pub mod post_process;
pub mod orchestrator;

pub use orchestrator::SafetyOrchestrator;
pub use types::{
    DisclaimerPack, EvaluateOptions, FallbackResponse, SafeResponse, SafetyError, SafetyNotice,
    SafetyRequest, SafetyVerdict, TriageWarning,
};
