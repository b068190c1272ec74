use serde::Deserialize;

/// Structured scan of one lab document as returned by the AI parser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentScan {
    pub lab_name: Option<String>,
    /// ISO-8601 string; normalized to a timezone-aware timestamp by the
    /// orchestrator.
    pub report_date: Option<String>,
    #[serde(default)]
    pub analytes: Vec<ScannedAnalyte>,
    #[serde(default)]
    pub uncertainties: Vec<String>,
}

/// One analyte as reported by the AI parser. The value is kept as raw JSON;
/// the orchestrator coerces it to a number and drops the analyte when that
/// fails.
#[derive(Debug, Clone, Deserialize)]
pub struct ScannedAnalyte {
    pub name: Option<String>,
    #[serde(default)]
    pub value: serde_json::Value,
    pub unit: Option<String>,
    pub ref_min: Option<f64>,
    pub ref_max: Option<f64>,
    pub method: Option<String>,
    pub measured_at: Option<String>,
    pub raw_line: Option<String>,
}
