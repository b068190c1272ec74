use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ResultFlag;

/// One persisted analyte measurement with its computed reference-range flag.
///
/// `ref_min <= ref_max` is enforced by the storage schema when both bounds
/// are present; a result with missing bounds carries the `not_available` flag
/// rather than a flag computed against a fabricated range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultValue {
    pub id: Uuid,
    pub report_id: Uuid,
    pub analyte_id: Uuid,
    pub value: f64,
    pub unit: String,
    pub ref_min: Option<f64>,
    pub ref_max: Option<f64>,
    pub flag: ResultFlag,
    pub measured_at: DateTime<FixedOffset>,
}
