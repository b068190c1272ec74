//! Result materialization: converts pipeline readings into persisted
//! measurement records, computing the reference-range flag for each.

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{get_or_create_analyte, insert_result_value};
use crate::db::DatabaseError;
use crate::models::enums::ResultFlag;
use crate::models::{Report, ResultValue};
use crate::pipeline::extraction::AnalyteReading;
use crate::pipeline::insight::ResultPayload;

/// A persisted result paired with its catalog entry's name.
#[derive(Debug, Clone)]
pub struct MaterializedResult {
    pub analyte_name: String,
    pub result: ResultValue,
}

/// Classify a value against its reference range with strict inequality.
///
/// A result with no usable bounds is `not_available` rather than compared
/// against a fabricated range; with a single bound, only a violation of that
/// bound is conclusive.
pub fn compute_flag(value: f64, ref_min: Option<f64>, ref_max: Option<f64>) -> ResultFlag {
    match (ref_min, ref_max) {
        (Some(min), _) if value < min => ResultFlag::Low,
        (_, Some(max)) if value > max => ResultFlag::High,
        (Some(_), Some(_)) => ResultFlag::Normal,
        _ => ResultFlag::NotAvailable,
    }
}

/// Persist one result record per reading, resolving (or creating) the analyte
/// catalog entry by name.
///
/// An inverted reference range would violate the storage constraint; such
/// ranges are discarded and the result is stored as `not_available` instead
/// of failing the upload.
pub fn materialize_results(
    conn: &Connection,
    report: &Report,
    readings: &[AnalyteReading],
) -> Result<Vec<MaterializedResult>, DatabaseError> {
    let mut persisted = Vec::with_capacity(readings.len());

    for reading in readings {
        let analyte = get_or_create_analyte(
            conn,
            &reading.name,
            reading.unit.as_deref().unwrap_or(""),
            "Auto-created",
        )?;

        let (ref_min, ref_max) = match (reading.ref_min, reading.ref_max) {
            (Some(min), Some(max)) if min > max => {
                tracing::warn!(
                    analyte = %reading.name,
                    ref_min = min,
                    ref_max = max,
                    "inverted reference range discarded"
                );
                (None, None)
            }
            bounds => bounds,
        };

        let result = ResultValue {
            id: Uuid::new_v4(),
            report_id: report.id,
            analyte_id: analyte.id,
            value: reading.value,
            unit: reading
                .unit
                .clone()
                .unwrap_or_else(|| analyte.unit.clone()),
            ref_min,
            ref_max,
            flag: compute_flag(reading.value, ref_min, ref_max),
            measured_at: reading.measured_at,
        };
        insert_result_value(conn, &result)?;

        persisted.push(MaterializedResult {
            analyte_name: analyte.name,
            result,
        });
    }

    Ok(persisted)
}

/// Project persisted results into the numeric payloads the insight generator
/// consumes.
pub fn to_result_payloads(results: &[MaterializedResult]) -> Vec<ResultPayload> {
    results
        .iter()
        .map(|m| ResultPayload {
            analyte: m.analyte_name.clone(),
            value: m.result.value,
            unit: Some(m.result.unit.clone()).filter(|u| !u.is_empty()),
            ref_min: m.result.ref_min,
            ref_max: m.result.ref_max,
            flag: m.result.flag,
            measured_at: m.result.measured_at.to_rfc3339(),
        })
        .collect()
}
