//! Patient-facing interpretation of a report's persisted results: an
//! AI-generated plain-language payload when the external service is
//! available, a deterministic rule-based summary otherwise. AI failure is
//! never user-visible — the deterministic path is the floor.

pub mod generator;
pub mod prompt;
pub mod types;

pub use generator::{generate_insights, ResultPayload};
pub use prompt::INSIGHTS_PROMPT;
pub use types::{ActionItem, InsightPayload, KeyResult, RecommendedTest, Triage};
