use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{parse_utc_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::Sex;
use crate::models::Patient;

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, user_id, name, sex, birth_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            patient.id.to_string(),
            patient.user_id.map(|id| id.to_string()),
            patient.name,
            patient.sex.as_str(),
            patient.birth_date.to_string(),
            patient.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, sex, birth_date, created_at FROM patients WHERE id = ?1",
    )?;
    let result = stmt.query_row(params![id.to_string()], |row| Ok(patient_row(row)));
    match result {
        Ok(row) => Ok(Some(patient_from_row(row?)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, sex, birth_date, created_at FROM patients ORDER BY name",
    )?;
    let rows = stmt.query_map([], |row| Ok(patient_row(row)))?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row??)?);
    }
    Ok(patients)
}

pub fn list_patients_for_user(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, sex, birth_date, created_at
         FROM patients WHERE user_id = ?1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![user_id.to_string()], |row| Ok(patient_row(row)))?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row??)?);
    }
    Ok(patients)
}

/// The uploader's own patient profile; uploads are rejected when this is None.
pub fn first_patient_for_user(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Option<Patient>, DatabaseError> {
    Ok(list_patients_for_user(conn, user_id)?.into_iter().next())
}

struct PatientRow {
    id: String,
    user_id: Option<String>,
    name: String,
    sex: String,
    birth_date: String,
    created_at: String,
}

fn patient_row(row: &rusqlite::Row<'_>) -> Result<PatientRow, rusqlite::Error> {
    Ok(PatientRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        sex: row.get(3)?,
        birth_date: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: parse_uuid(&row.id)?,
        user_id: row.user_id.and_then(|s| Uuid::parse_str(&s).ok()),
        name: row.name,
        sex: Sex::from_str(&row.sex)?,
        birth_date: NaiveDate::parse_from_str(&row.birth_date, "%Y-%m-%d").unwrap_or_default(),
        created_at: parse_utc_timestamp(&row.created_at)?,
    })
}
