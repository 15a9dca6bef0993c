//! Per-user categories and their article counts.

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::model::{Category, UserId};

/// Upsert each category for `user_id`, bumping `article_count` by one.
///
/// Runs on whatever transaction `conn` is currently in.
///
/// # Errors
///
/// Returns an error if any upsert fails.
pub fn save_or_bump(conn: &Connection, user_id: UserId, names: &[String], at_us: i64) -> Result<()> {
    let mut stmt = conn
        .prepare(
            "INSERT INTO category (user_id, name, article_count, created_at_us)
             VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(user_id, name) DO UPDATE SET article_count = article_count + 1",
        )
        .context("prepare category upsert")?;

    for name in names {
        stmt.execute(params![user_id, name, at_us])
            .with_context(|| format!("upsert category '{name}' for user {user_id}"))?;
    }
    Ok(())
}

/// Take one article away from each named category of `user_id`, dropping
/// categories that no longer hold any article.
///
/// Runs on whatever transaction `conn` is currently in.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub fn release(conn: &Connection, user_id: UserId, names: &[String]) -> Result<()> {
    let mut decrement = conn
        .prepare(
            "UPDATE category SET article_count = article_count - 1
             WHERE user_id = ?1 AND name = ?2 AND article_count > 0",
        )
        .context("prepare category release")?;

    for name in names {
        decrement
            .execute(params![user_id, name])
            .with_context(|| format!("release category '{name}' for user {user_id}"))?;
    }

    conn.execute(
        "DELETE FROM category WHERE user_id = ?1 AND article_count = 0",
        params![user_id],
    )
    .context("drop empty categories")?;
    Ok(())
}

/// All categories of a user, ordered by name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn user_categories(conn: &Connection, user_id: UserId) -> Result<Vec<Category>> {
    let mut stmt = conn
        .prepare(
            "SELECT user_id, name, article_count FROM category
             WHERE user_id = ?1 ORDER BY name",
        )
        .context("prepare user_categories")?;

    let rows = stmt
        .query_map(params![user_id], |row| {
            Ok(Category {
                user_id: row.get(0)?,
                name: row.get(1)?,
                article_count: row.get(2)?,
            })
        })
        .context("execute user_categories")?;

    let mut categories = Vec::new();
    for row in rows {
        categories.push(row.context("read category row")?);
    }
    Ok(categories)
}
