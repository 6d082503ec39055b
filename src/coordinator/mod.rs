//! Cross-tab coordination: navigation history, analysis dedup, the
//! classifier round trip, and verdict delivery.

pub mod classifier;
pub mod history;
pub mod service;

pub use classifier::{AnalysisClient, AnalysisOutcome, AnalysisRequest};
pub use history::{AnalysisKey, AnalysisLedger, TabHistory};
pub use service::{Coordinator, CoordinatorHandle};
