pub mod date;
pub mod fallback;
pub mod orchestrator;
pub mod pdf;
pub mod rules;
pub mod types;

pub use date::parse_report_date;
pub use fallback::generate_fallback_readings;
pub use orchestrator::DocumentParser;
pub use pdf::extract_text_lossy;
pub use rules::extract_readings;
pub use types::{AnalyteReading, ExtractionPayload};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),
}
