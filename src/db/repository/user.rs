use std::str::FromStr;

use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{parse_utc_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::Role;
use crate::models::User;

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, username, password_hash, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id.to_string(),
            user.username,
            user.password_hash,
            user.role.as_str(),
            user.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<User>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password_hash, role, created_at FROM users WHERE username = ?1",
    )?;
    let result = stmt.query_row(params![username], |row| Ok(user_row(row)));
    match result {
        Ok(row) => Ok(Some(user_from_row(row?)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Store a hashed bearer token for a user. The plaintext token never
/// touches the database.
pub fn insert_auth_token(
    conn: &Connection,
    token_hash: &str,
    user_id: &Uuid,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO auth_tokens (token_hash, user_id, created_at) VALUES (?1, ?2, ?3)",
        params![token_hash, user_id.to_string(), Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

/// Resolve a hashed bearer token to its user, or None when the token is unknown.
pub fn get_user_by_token_hash(
    conn: &Connection,
    token_hash: &str,
) -> Result<Option<User>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.username, u.password_hash, u.role, u.created_at
         FROM auth_tokens t JOIN users u ON u.id = t.user_id
         WHERE t.token_hash = ?1",
    )?;
    let result = stmt.query_row(params![token_hash], |row| Ok(user_row(row)));
    match result {
        Ok(row) => Ok(Some(user_from_row(row?)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

struct UserRow {
    id: String,
    username: String,
    password_hash: String,
    role: String,
    created_at: String,
}

fn user_row(row: &rusqlite::Row<'_>) -> Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        role: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn user_from_row(row: UserRow) -> Result<User, DatabaseError> {
    Ok(User {
        id: parse_uuid(&row.id)?,
        username: row.username,
        password_hash: row.password_hash,
        role: Role::from_str(&row.role)?,
        created_at: parse_utc_timestamp(&row.created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn sample_user(username: &str, role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash: "hash".into(),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_fetch_by_username() {
        let conn = open_memory_database().unwrap();
        let user = sample_user("ana", Role::Patient);
        insert_user(&conn, &user).unwrap();

        let fetched = get_user_by_username(&conn, "ana").unwrap().unwrap();
        assert_eq!(fetched.id, user.id);
        assert_eq!(fetched.role, Role::Patient);
    }

    #[test]
    fn duplicate_username_rejected() {
        let conn = open_memory_database().unwrap();
        insert_user(&conn, &sample_user("ana", Role::Patient)).unwrap();
        assert!(insert_user(&conn, &sample_user("ana", Role::Doctor)).is_err());
    }

    #[test]
    fn token_resolves_to_user() {
        let conn = open_memory_database().unwrap();
        let user = sample_user("dr_g", Role::Doctor);
        insert_user(&conn, &user).unwrap();
        insert_auth_token(&conn, "abcd1234", &user.id).unwrap();

        let fetched = get_user_by_token_hash(&conn, "abcd1234").unwrap().unwrap();
        assert_eq!(fetched.username, "dr_g");

        assert!(get_user_by_token_hash(&conn, "unknown").unwrap().is_none());
    }
}
