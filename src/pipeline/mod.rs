//! PDF ingestion pipeline: text extraction, analyte extraction (AI-assisted
//! or rule-based), date normalization, result materialization, and insight
//! generation. Every stage degrades to the next tier rather than failing the
//! upload; only input validation surfaces errors to the API boundary.

pub mod ai;
pub mod catalog;
pub mod extraction;
pub mod insight;
pub mod materialize;
pub mod vision;

pub use catalog::{AnalyteCatalog, AnalyteSpec};
pub use extraction::{AnalyteReading, DocumentParser, ExtractionPayload};
pub use materialize::{compute_flag, materialize_results, to_result_payloads, MaterializedResult};
