pub mod types;
pub mod symptoms;
pub mod crisis;
pub mod bias;
pub mod classifier;

pub use classifier::TriageClassifier;
pub use types::{CrisisAssessment, DetectedSymptom, SeverityAssessment, TriageResult};
