use std::str::FromStr;

use rusqlite::{params, params_from_iter, Connection};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::ResultFlag;
use crate::models::ResultValue;

pub fn insert_result_value(conn: &Connection, result: &ResultValue) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO result_values (id, report_id, analyte_id, value, unit,
         ref_min, ref_max, flag, measured_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            result.id.to_string(),
            result.report_id.to_string(),
            result.analyte_id.to_string(),
            result.value,
            result.unit,
            result.ref_min,
            result.ref_max,
            result.flag.as_str(),
            result.measured_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn list_results_for_report(
    conn: &Connection,
    report_id: &Uuid,
) -> Result<Vec<ResultValue>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, report_id, analyte_id, value, unit, ref_min, ref_max, flag, measured_at
         FROM result_values WHERE report_id = ?1 ORDER BY measured_at, id",
    )?;
    let rows = stmt.query_map(params![report_id.to_string()], |row| Ok(result_row(row)))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(result_from_row(row??)?);
    }
    Ok(results)
}

pub fn list_results(conn: &Connection) -> Result<Vec<ResultValue>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, report_id, analyte_id, value, unit, ref_min, ref_max, flag, measured_at
         FROM result_values ORDER BY measured_at DESC",
    )?;
    let rows = stmt.query_map([], |row| Ok(result_row(row)))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(result_from_row(row??)?);
    }
    Ok(results)
}

/// Results across every report belonging to the given account's patients.
pub fn list_results_for_user(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<ResultValue>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT v.id, v.report_id, v.analyte_id, v.value, v.unit, v.ref_min, v.ref_max,
                v.flag, v.measured_at
         FROM result_values v
         JOIN reports r ON r.id = v.report_id
         JOIN patients p ON p.id = r.patient_id
         WHERE p.user_id = ?1 ORDER BY v.measured_at DESC",
    )?;
    let rows = stmt.query_map(params![user_id.to_string()], |row| Ok(result_row(row)))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(result_from_row(row??)?);
    }
    Ok(results)
}

/// Whose results a trend query covers.
pub enum TrendScope {
    User(Uuid),
    Patient(Uuid),
}

/// One measurement in an analyte's time series.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TrendPoint {
    pub analyte_name: String,
    pub analyte_unit: String,
    pub value: f64,
    pub unit: String,
    pub ref_min: Option<f64>,
    pub ref_max: Option<f64>,
    pub flag: String,
    pub measured_at: String,
    pub report_id: String,
    pub report_issued_at: String,
}

/// Time-ordered measurements for the named analytes within the given scope.
pub fn list_trend_points(
    conn: &Connection,
    analyte_names: &[String],
    scope: &TrendScope,
) -> Result<Vec<TrendPoint>, DatabaseError> {
    if analyte_names.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders: Vec<String> = (1..=analyte_names.len())
        .map(|i| format!("?{i}"))
        .collect();
    let scope_param = analyte_names.len() + 1;
    let scope_clause = match scope {
        TrendScope::User(_) => format!("p.user_id = ?{scope_param}"),
        TrendScope::Patient(_) => format!("r.patient_id = ?{scope_param}"),
    };

    let sql = format!(
        "SELECT a.name, a.unit, v.value, v.unit, v.ref_min, v.ref_max, v.flag,
                v.measured_at, r.id, r.issued_at
         FROM result_values v
         JOIN analytes a ON a.id = v.analyte_id
         JOIN reports r ON r.id = v.report_id
         JOIN patients p ON p.id = r.patient_id
         WHERE a.name IN ({}) AND {scope_clause}
         ORDER BY v.measured_at, r.issued_at, v.id",
        placeholders.join(", "),
    );

    let scope_id = match scope {
        TrendScope::User(id) | TrendScope::Patient(id) => id.to_string(),
    };
    let bound: Vec<String> = analyte_names
        .iter()
        .cloned()
        .chain(std::iter::once(scope_id))
        .collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(bound.iter()), |row| {
        Ok(TrendPoint {
            analyte_name: row.get(0)?,
            analyte_unit: row.get(1)?,
            value: row.get(2)?,
            unit: row.get(3)?,
            ref_min: row.get(4)?,
            ref_max: row.get(5)?,
            flag: row.get(6)?,
            measured_at: row.get(7)?,
            report_id: row.get(8)?,
            report_issued_at: row.get(9)?,
        })
    })?;

    let mut points = Vec::new();
    for row in rows {
        points.push(row?);
    }
    Ok(points)
}

struct ResultRow {
    id: String,
    report_id: String,
    analyte_id: String,
    value: f64,
    unit: String,
    ref_min: Option<f64>,
    ref_max: Option<f64>,
    flag: String,
    measured_at: String,
}

fn result_row(row: &rusqlite::Row<'_>) -> Result<ResultRow, rusqlite::Error> {
    Ok(ResultRow {
        id: row.get(0)?,
        report_id: row.get(1)?,
        analyte_id: row.get(2)?,
        value: row.get(3)?,
        unit: row.get(4)?,
        ref_min: row.get(5)?,
        ref_max: row.get(6)?,
        flag: row.get(7)?,
        measured_at: row.get(8)?,
    })
}

fn result_from_row(row: ResultRow) -> Result<ResultValue, DatabaseError> {
    Ok(ResultValue {
        id: parse_uuid(&row.id)?,
        report_id: parse_uuid(&row.report_id)?,
        analyte_id: parse_uuid(&row.analyte_id)?,
        value: row.value,
        unit: row.unit,
        ref_min: row.ref_min,
        ref_max: row.ref_max,
        flag: ResultFlag::from_str(&row.flag)?,
        measured_at: parse_timestamp(&row.measured_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{get_or_create_analyte, insert_patient, insert_report};
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::Sex;
    use crate::models::{Patient, Report};
    use chrono::{NaiveDate, Utc};

    struct Fixture {
        user_id: Uuid,
        report_id: Uuid,
    }

    fn seed(conn: &Connection) -> Fixture {
        let user_id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO users (id, username, password_hash, role, created_at)
             VALUES (?1, ?2, 'h', 'patient', ?3)",
            params![
                user_id.to_string(),
                format!("user-{user_id}"),
                Utc::now().to_rfc3339()
            ],
        )
        .unwrap();
        let patient = Patient {
            id: Uuid::new_v4(),
            user_id: Some(user_id),
            name: "Test".into(),
            sex: Sex::Male,
            birth_date: NaiveDate::from_ymd_opt(1970, 6, 1).unwrap(),
            created_at: Utc::now(),
        };
        insert_patient(conn, &patient).unwrap();
        let report = Report {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            org_name: "Lab".into(),
            issued_at: Utc::now().fixed_offset(),
            pdf_path: None,
            raw_json: serde_json::json!({}),
            parsed_fields: serde_json::json!({}),
            insights: serde_json::json!({}),
            analysis_generated_at: None,
            created_at: Utc::now(),
        };
        insert_report(conn, &report).unwrap();
        Fixture {
            user_id,
            report_id: report.id,
        }
    }

    fn sample_result(conn: &Connection, report_id: Uuid, name: &str, value: f64) -> ResultValue {
        let analyte = get_or_create_analyte(conn, name, "mg/dL", "").unwrap();
        ResultValue {
            id: Uuid::new_v4(),
            report_id,
            analyte_id: analyte.id,
            value,
            unit: "mg/dL".into(),
            ref_min: Some(70.0),
            ref_max: Some(100.0),
            flag: ResultFlag::Normal,
            measured_at: Utc::now().fixed_offset(),
        }
    }

    #[test]
    fn insert_and_list_round_trip() {
        let conn = open_memory_database().unwrap();
        let fx = seed(&conn);
        let result = sample_result(&conn, fx.report_id, "glucose", 95.0);
        insert_result_value(&conn, &result).unwrap();

        let fetched = list_results_for_report(&conn, &fx.report_id).unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].value, 95.0);
        assert_eq!(fetched[0].flag, ResultFlag::Normal);
    }

    #[test]
    fn user_scope_excludes_other_accounts() {
        let conn = open_memory_database().unwrap();
        let mine = seed(&conn);
        let other = seed(&conn);
        insert_result_value(&conn, &sample_result(&conn, mine.report_id, "glucose", 95.0)).unwrap();
        insert_result_value(&conn, &sample_result(&conn, other.report_id, "glucose", 88.0))
            .unwrap();

        let results = list_results_for_user(&conn, &mine.user_id).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].value, 95.0);
    }

    #[test]
    fn trend_points_filter_by_name_and_scope() {
        let conn = open_memory_database().unwrap();
        let fx = seed(&conn);
        insert_result_value(&conn, &sample_result(&conn, fx.report_id, "glucose", 95.0)).unwrap();
        insert_result_value(&conn, &sample_result(&conn, fx.report_id, "hdl", 45.0)).unwrap();
        insert_result_value(&conn, &sample_result(&conn, fx.report_id, "ldl", 130.0)).unwrap();

        let points = list_trend_points(
            &conn,
            &["glucose".to_string(), "hdl".to_string()],
            &TrendScope::User(fx.user_id),
        )
        .unwrap();
        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| p.analyte_name != "ldl"));

        let empty = list_trend_points(&conn, &[], &TrendScope::User(fx.user_id)).unwrap();
        assert!(empty.is_empty());
    }
}
