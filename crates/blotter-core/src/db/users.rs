//! User registration lookups.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::model::{User, UserId};

/// Insert a user and return it with its assigned id.
///
/// # Errors
///
/// Returns an error if the name or email is already taken, or the insert
/// fails.
pub fn create_user(conn: &Connection, name: &str, email: &str, at_us: i64) -> Result<User> {
    conn.execute(
        "INSERT INTO users (name, email, created_at_us) VALUES (?1, ?2, ?3)",
        params![name, email, at_us],
    )
    .with_context(|| format!("create user '{name}'"))?;

    Ok(User {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        email: email.to_string(),
        created_at_us: at_us,
    })
}

/// Fetch a user by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_user(conn: &Connection, user_id: UserId) -> Result<Option<User>> {
    conn.query_row(
        "SELECT id, name, email, created_at_us FROM users WHERE id = ?1",
        params![user_id],
        |row| {
            Ok(User {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                created_at_us: row.get(3)?,
            })
        },
    )
    .optional()
    .with_context(|| format!("get_user {user_id}"))
}

/// True if a user with this exact name exists.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn user_name_exists(conn: &Connection, name: &str) -> Result<bool> {
    exists(conn, "SELECT EXISTS(SELECT 1 FROM users WHERE name = ?1)", name)
}

/// True if a user with this email exists (case-insensitive).
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn user_mail_exists(conn: &Connection, email: &str) -> Result<bool> {
    exists(
        conn,
        "SELECT EXISTS(SELECT 1 FROM users WHERE lower(email) = lower(?1))",
        email,
    )
}

fn exists(conn: &Connection, sql: &str, value: &str) -> Result<bool> {
    conn.query_row(sql, params![value], |row| row.get(0))
        .with_context(|| format!("existence check for '{value}'"))
}
