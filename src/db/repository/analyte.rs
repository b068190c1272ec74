use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::DatabaseError;
use crate::models::Analyte;

pub fn insert_analyte(conn: &Connection, analyte: &Analyte) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO analytes (id, name, unit, description) VALUES (?1, ?2, ?3, ?4)",
        params![
            analyte.id.to_string(),
            analyte.name,
            analyte.unit,
            analyte.description,
        ],
    )?;
    Ok(())
}

pub fn get_analyte_by_name(
    conn: &Connection,
    name: &str,
) -> Result<Option<Analyte>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT id, name, unit, description FROM analytes WHERE name = ?1")?;
    let result = stmt.query_row(params![name], |row| Ok(analyte_row(row)));
    match result {
        Ok(row) => Ok(Some(analyte_from_row(row?)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Resolve a catalog entry by name, creating it when the name is new.
/// Unit and description only apply to newly created rows.
pub fn get_or_create_analyte(
    conn: &Connection,
    name: &str,
    unit: &str,
    description: &str,
) -> Result<Analyte, DatabaseError> {
    if let Some(existing) = get_analyte_by_name(conn, name)? {
        return Ok(existing);
    }
    let analyte = Analyte {
        id: Uuid::new_v4(),
        name: name.to_string(),
        unit: unit.to_string(),
        description: description.to_string(),
    };
    insert_analyte(conn, &analyte)?;
    Ok(analyte)
}

pub fn list_analytes(conn: &Connection) -> Result<Vec<Analyte>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name, unit, description FROM analytes ORDER BY name")?;
    let rows = stmt.query_map([], |row| Ok(analyte_row(row)))?;

    let mut analytes = Vec::new();
    for row in rows {
        analytes.push(analyte_from_row(row??)?);
    }
    Ok(analytes)
}

struct AnalyteRow {
    id: String,
    name: String,
    unit: String,
    description: String,
}

fn analyte_row(row: &rusqlite::Row<'_>) -> Result<AnalyteRow, rusqlite::Error> {
    Ok(AnalyteRow {
        id: row.get(0)?,
        name: row.get(1)?,
        unit: row.get(2)?,
        description: row.get(3)?,
    })
}

fn analyte_from_row(row: AnalyteRow) -> Result<Analyte, DatabaseError> {
    Ok(Analyte {
        id: parse_uuid(&row.id)?,
        name: row.name,
        unit: row.unit,
        description: row.description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn get_or_create_is_idempotent() {
        let conn = open_memory_database().unwrap();
        let first = get_or_create_analyte(&conn, "glucose", "mg/dL", "Auto-created").unwrap();
        let second = get_or_create_analyte(&conn, "glucose", "mmol/L", "ignored").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.unit, "mg/dL");
    }

    #[test]
    fn list_orders_by_name() {
        let conn = open_memory_database().unwrap();
        get_or_create_analyte(&conn, "ldl", "mg/dL", "").unwrap();
        get_or_create_analyte(&conn, "glucose", "mg/dL", "").unwrap();
        let names: Vec<String> = list_analytes(&conn)
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["glucose", "ldl"]);
    }
}
