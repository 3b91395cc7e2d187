pub mod types;
pub mod summary;
pub mod atd;

pub use atd::AtdRouter;
pub use types::{AtdRoutingResult, PriorityScore, ProviderSummary};
