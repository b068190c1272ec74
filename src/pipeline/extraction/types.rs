use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One extracted (value, unit, reference range, timestamp) observation of an
/// analyte. Readings whose value cannot be read as a number are dropped
/// before this type is constructed, never defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyteReading {
    pub name: String,
    pub value: f64,
    pub unit: Option<String>,
    pub ref_min: Option<f64>,
    pub ref_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub measured_at: DateTime<FixedOffset>,
    /// Original text snippet the reading was taken from, for traceability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_line: Option<String>,
}

/// The unified output of one pipeline run. Immutable once returned; always
/// carries at least one reading and a timezone-aware report date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionPayload {
    pub report_date: DateTime<FixedOffset>,
    pub lab_name: String,
    pub analytes: Vec<AnalyteReading>,
    pub summary: String,
    pub uncertainties: Vec<String>,
    /// Extracted text, capped at 10,000 characters for storage.
    pub raw_text: String,
}
