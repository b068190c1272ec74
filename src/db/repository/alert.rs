use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{parse_utc_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::{AlertLevel, AlertStatus};
use crate::models::Alert;

pub fn insert_alert(conn: &Connection, alert: &Alert) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO alerts (id, patient_id, report_id, level, rule_key, message,
         status, created_at, closed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            alert.id.to_string(),
            alert.patient_id.map(|id| id.to_string()),
            alert.report_id.map(|id| id.to_string()),
            alert.level.as_str(),
            alert.rule_key,
            alert.message,
            alert.status.as_str(),
            alert.created_at.to_rfc3339(),
            alert.closed_at.map(|dt| dt.to_rfc3339()),
        ],
    )?;
    Ok(())
}

pub fn list_alerts(conn: &Connection) -> Result<Vec<Alert>, DatabaseError> {
    collect_alerts(conn, &select_sql("ORDER BY created_at DESC"), &[])
}

/// Alerts attached to the account's patients directly or via their reports.
pub fn list_alerts_for_user(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<Alert>, DatabaseError> {
    collect_alerts(
        conn,
        "SELECT al.id, al.patient_id, al.report_id, al.level, al.rule_key, al.message,
                al.status, al.created_at, al.closed_at
         FROM alerts al
         LEFT JOIN patients p ON p.id = al.patient_id
         LEFT JOIN reports r ON r.id = al.report_id
         LEFT JOIN patients rp ON rp.id = r.patient_id
         WHERE p.user_id = ?1 OR rp.user_id = ?1
         ORDER BY al.created_at DESC",
        &[&user_id.to_string()],
    )
}

fn select_sql(suffix: &str) -> String {
    format!(
        "SELECT id, patient_id, report_id, level, rule_key, message, status, created_at, closed_at
         FROM alerts {suffix}"
    )
}

fn collect_alerts(
    conn: &Connection,
    sql: &str,
    sql_params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Alert>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(sql_params, |row| Ok(alert_row(row)))?;

    let mut alerts = Vec::new();
    for row in rows {
        alerts.push(alert_from_row(row??)?);
    }
    Ok(alerts)
}

struct AlertRow {
    id: String,
    patient_id: Option<String>,
    report_id: Option<String>,
    level: String,
    rule_key: String,
    message: String,
    status: String,
    created_at: String,
    closed_at: Option<String>,
}

fn alert_row(row: &rusqlite::Row<'_>) -> Result<AlertRow, rusqlite::Error> {
    Ok(AlertRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        report_id: row.get(2)?,
        level: row.get(3)?,
        rule_key: row.get(4)?,
        message: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        closed_at: row.get(8)?,
    })
}

fn alert_from_row(row: AlertRow) -> Result<Alert, DatabaseError> {
    Ok(Alert {
        id: parse_uuid(&row.id)?,
        patient_id: row.patient_id.and_then(|s| Uuid::parse_str(&s).ok()),
        report_id: row.report_id.and_then(|s| Uuid::parse_str(&s).ok()),
        level: AlertLevel::from_str(&row.level)?,
        rule_key: row.rule_key,
        message: row.message,
        status: AlertStatus::from_str(&row.status)?,
        created_at: parse_utc_timestamp(&row.created_at)?,
        closed_at: row
            .closed_at
            .as_deref()
            .map(parse_utc_timestamp)
            .transpose()?,
    })
}
