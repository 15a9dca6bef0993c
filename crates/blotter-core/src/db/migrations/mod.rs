//! SQLite schema migrations for the blotter store.

use super::schema;
use rusqlite::{Connection, Transaction, params, types::Type};

/// Latest schema version understood by this binary.
pub const LATEST_SCHEMA_VERSION: u32 = 2;

const MIGRATIONS: &[(u32, &str)] = &[(1, schema::MIGRATION_V1_SQL), (2, schema::MIGRATION_V2_SQL)];

/// Read `PRAGMA user_version` and convert it to a Rust `u32`.
///
/// # Errors
///
/// Returns an error if querying SQLite fails or the version value cannot be
/// represented as `u32`.
pub fn current_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    u32::try_from(version).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(error))
    })
}

/// Apply all pending migrations in ascending order, one transaction each.
///
/// Returns the schema version after migrating.
///
/// # Errors
///
/// Returns an error if any migration fails; earlier ones stay applied.
pub fn migrate(conn: &mut Connection) -> rusqlite::Result<u32> {
    let from = current_schema_version(conn)?;
    let pending = MIGRATIONS.iter().filter(|(version, _)| *version > from);

    let mut reached = from;
    for &(version, sql) in pending {
        let tx = conn.transaction()?;
        apply(&tx, version, sql)?;
        tx.commit()?;
        tracing::debug!(from, version, "applied store migration");
        reached = version;
    }

    Ok(reached)
}

fn apply(tx: &Transaction<'_>, version: u32, sql: &str) -> rusqlite::Result<()> {
    tx.execute_batch(sql)?;
    tx.pragma_update(None, "user_version", i64::from(version))?;
    tx.execute(
        "UPDATE store_meta SET schema_version = ?1 WHERE id = 1",
        [i64::from(version)],
    )?;
    tx.execute(
        "INSERT OR REPLACE INTO store_migration (version, applied_at_us) VALUES (?1, ?2)",
        params![i64::from(version), super::now_us()],
    )?;
    Ok(())
}

/// Versions recorded in `store_migration`, ascending.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn applied_migrations(conn: &Connection) -> rusqlite::Result<Vec<u32>> {
    let mut stmt = conn.prepare("SELECT version FROM store_migration ORDER BY version")?;
    let rows = stmt.query_map([], |row| row.get::<_, u32>(0))?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::{LATEST_SCHEMA_VERSION, applied_migrations, current_schema_version, migrate};
    use crate::db::schema;
    use rusqlite::{Connection, params};

    fn sqlite_object_exists(
        conn: &Connection,
        object_type: &str,
        object_name: &str,
    ) -> rusqlite::Result<bool> {
        conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            )",
            params![object_type, object_name],
            |row| row.get(0),
        )
    }

    #[test]
    fn migrate_empty_db_to_latest() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;

        let applied = migrate(&mut conn)?;
        assert_eq!(applied, LATEST_SCHEMA_VERSION);
        assert_eq!(current_schema_version(&conn)?, LATEST_SCHEMA_VERSION);

        for table in [
            "users",
            "article",
            "category",
            "article_view",
            "article_like",
            "store_meta",
            "store_migration",
        ] {
            assert!(sqlite_object_exists(&conn, "table", table)?, "missing {table}");
        }

        for index in schema::REQUIRED_INDEXES {
            assert!(
                sqlite_object_exists(&conn, "index", index)?,
                "missing expected index {index}"
            );
        }

        Ok(())
    }

    #[test]
    fn migrate_is_idempotent() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;

        assert_eq!(migrate(&mut conn)?, LATEST_SCHEMA_VERSION);
        assert_eq!(migrate(&mut conn)?, LATEST_SCHEMA_VERSION);

        let meta_rows: i64 =
            conn.query_row("SELECT COUNT(*) FROM store_meta", [], |row| row.get(0))?;
        assert_eq!(meta_rows, 1);

        let schema_version: i64 = conn.query_row(
            "SELECT schema_version FROM store_meta WHERE id = 1",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(schema_version, i64::from(LATEST_SCHEMA_VERSION));
        assert_eq!(applied_migrations(&conn)?, vec![1, 2]);

        Ok(())
    }

    #[test]
    fn migrate_upgrades_from_v1_keeping_rows() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;

        conn.execute_batch(schema::MIGRATION_V1_SQL)?;
        conn.pragma_update(None, "user_version", 1_i64)?;
        conn.execute(
            "INSERT INTO article (user_id, title, view_count, created_at_us)
             VALUES (3, 'Seeded before indexes', 5, 1)",
            [],
        )?;

        assert_eq!(migrate(&mut conn)?, LATEST_SCHEMA_VERSION);

        let views: i64 = conn.query_row(
            "SELECT view_count FROM article WHERE title = 'Seeded before indexes'",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(views, 5);
        assert!(sqlite_object_exists(&conn, "index", "idx_article_created")?);
        assert_eq!(applied_migrations(&conn)?, vec![2]);

        Ok(())
    }

    #[test]
    fn counters_reject_negative_values() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;
        migrate(&mut conn)?;
        conn.execute(
            "INSERT INTO article (user_id, title, created_at_us) VALUES (1, 'zero', 1)",
            [],
        )?;

        let result = conn.execute("UPDATE article SET like_count = like_count - 1", []);
        assert!(result.is_err(), "like_count must not go below zero");
        Ok(())
    }
}
