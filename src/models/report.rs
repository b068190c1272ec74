use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub org_name: String,
    pub issued_at: DateTime<FixedOffset>,
    /// Path of the stored PDF relative to the data directory.
    pub pdf_path: Option<String>,
    /// Upload metadata: filename, size, content type, raw extracted text.
    pub raw_json: serde_json::Value,
    /// Full extraction payload as returned by the ingestion pipeline.
    pub parsed_fields: serde_json::Value,
    /// Insight payload; empty object until analysis has run.
    pub insights: serde_json::Value,
    pub analysis_generated_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<Utc>,
}
