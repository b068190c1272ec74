//! Repository layer — entity-scoped database operations.

mod alert;
mod analyte;
mod patient;
mod report;
mod result_value;
mod user;

use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

use super::DatabaseError;

pub use alert::*;
pub use analyte::*;
pub use patient::*;
pub use report::*;
pub use result_value::*;
pub use user::*;

fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

fn parse_timestamp(s: &str) -> Result<DateTime<FixedOffset>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad timestamp {s}: {e}")))
}

fn parse_utc_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    parse_timestamp(s).map(|dt| dt.with_timezone(&Utc))
}

fn parse_json(s: &str) -> serde_json::Value {
    serde_json::from_str(s).unwrap_or_else(|_| serde_json::json!({}))
}
