use chrono::{DateTime, FixedOffset};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{parse_json, parse_timestamp, parse_utc_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::Report;

pub fn insert_report(conn: &Connection, report: &Report) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO reports (id, patient_id, org_name, issued_at, pdf_path,
         raw_json, parsed_fields, insights, analysis_generated_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            report.id.to_string(),
            report.patient_id.to_string(),
            report.org_name,
            report.issued_at.to_rfc3339(),
            report.pdf_path,
            report.raw_json.to_string(),
            report.parsed_fields.to_string(),
            report.insights.to_string(),
            report.analysis_generated_at.map(|dt| dt.to_rfc3339()),
            report.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_report(conn: &Connection, id: &Uuid) -> Result<Option<Report>, DatabaseError> {
    let mut stmt = conn.prepare(&select_sql("WHERE id = ?1"))?;
    let result = stmt.query_row(params![id.to_string()], |row| Ok(report_row(row)));
    match result {
        Ok(row) => Ok(Some(report_from_row(row?)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_reports(conn: &Connection) -> Result<Vec<Report>, DatabaseError> {
    collect_reports(conn, &select_sql("ORDER BY issued_at DESC"), &[])
}

pub fn list_reports_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Report>, DatabaseError> {
    collect_reports(
        conn,
        &select_sql("WHERE patient_id = ?1 ORDER BY issued_at DESC"),
        &[&patient_id.to_string()],
    )
}

/// Reports for all patient profiles linked to the given account.
pub fn list_reports_for_user(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<Report>, DatabaseError> {
    collect_reports(
        conn,
        "SELECT r.id, r.patient_id, r.org_name, r.issued_at, r.pdf_path,
                r.raw_json, r.parsed_fields, r.insights, r.analysis_generated_at, r.created_at
         FROM reports r JOIN patients p ON p.id = r.patient_id
         WHERE p.user_id = ?1 ORDER BY r.issued_at DESC",
        &[&user_id.to_string()],
    )
}

/// Attach the generated insight payload once analysis has run.
pub fn update_report_insights(
    conn: &Connection,
    id: &Uuid,
    insights: &serde_json::Value,
    generated_at: DateTime<FixedOffset>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE reports SET insights = ?2, analysis_generated_at = ?3 WHERE id = ?1",
        params![
            id.to_string(),
            insights.to_string(),
            generated_at.to_rfc3339()
        ],
    )?;
    Ok(())
}

pub fn delete_report(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM reports WHERE id = ?1", params![id.to_string()])?;
    Ok(())
}

fn select_sql(suffix: &str) -> String {
    format!(
        "SELECT id, patient_id, org_name, issued_at, pdf_path,
         raw_json, parsed_fields, insights, analysis_generated_at, created_at
         FROM reports {suffix}"
    )
}

fn collect_reports(
    conn: &Connection,
    sql: &str,
    sql_params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Report>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(sql_params, |row| Ok(report_row(row)))?;

    let mut reports = Vec::new();
    for row in rows {
        reports.push(report_from_row(row??)?);
    }
    Ok(reports)
}

struct ReportRow {
    id: String,
    patient_id: String,
    org_name: String,
    issued_at: String,
    pdf_path: Option<String>,
    raw_json: String,
    parsed_fields: String,
    insights: String,
    analysis_generated_at: Option<String>,
    created_at: String,
}

fn report_row(row: &rusqlite::Row<'_>) -> Result<ReportRow, rusqlite::Error> {
    Ok(ReportRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        org_name: row.get(2)?,
        issued_at: row.get(3)?,
        pdf_path: row.get(4)?,
        raw_json: row.get(5)?,
        parsed_fields: row.get(6)?,
        insights: row.get(7)?,
        analysis_generated_at: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn report_from_row(row: ReportRow) -> Result<Report, DatabaseError> {
    Ok(Report {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        org_name: row.org_name,
        issued_at: parse_timestamp(&row.issued_at)?,
        pdf_path: row.pdf_path,
        raw_json: parse_json(&row.raw_json),
        parsed_fields: parse_json(&row.parsed_fields),
        insights: parse_json(&row.insights),
        analysis_generated_at: row
            .analysis_generated_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()?,
        created_at: parse_utc_timestamp(&row.created_at)?,
    })
}
