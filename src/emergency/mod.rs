pub mod types;
pub mod messages;
pub mod detector;

pub use detector::detect_emergency;
pub use types::EmergencyDetection;
