//! Fault-injection tests for counter rollback.
//!
//! Failures are injected with `RAISE(ABORT)` triggers so the real store
//! fails mid-transaction at a chosen step.

use blotter_core::counter::CounterCoordinator;
use blotter_core::db;
use blotter_core::error::{CounterError, ErrorCode};
use blotter_core::model::ViewerIdentity;
use rusqlite::Connection;

fn seeded() -> Connection {
    let conn = db::open_in_memory().expect("open store");
    conn.execute(
        "INSERT INTO article (id, user_id, title, view_count, like_count, created_at_us)
         VALUES (1, 7, 'Fragile', 10, 0, 1)",
        [],
    )
    .expect("insert article");
    conn
}

fn inject(conn: &Connection, name: &str, timing: &str) {
    conn.execute_batch(&format!(
        "CREATE TRIGGER {name} {timing}
         BEGIN SELECT RAISE(ABORT, 'injected failure: {name}'); END;"
    ))
    .expect("install trigger");
}

fn counts(conn: &Connection) -> (i64, i64) {
    conn.query_row(
        "SELECT view_count, like_count FROM article WHERE id = 1",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .expect("read counts")
}

fn like_row(conn: &Connection, user_id: i64) -> Option<String> {
    conn.query_row(
        "SELECT state FROM article_like WHERE article_id = 1 AND user_id = ?1",
        [user_id],
        |row| row.get(0),
    )
    .ok()
}

#[test]
fn like_update_failure_leaves_counter_and_ledger_untouched() {
    let mut conn = seeded();
    assert_eq!(
        CounterCoordinator::new(&mut conn)
            .toggle_like(1, 3)
            .expect("initial like"),
        1
    );
    assert_eq!(counts(&conn).1, 1);
    assert_eq!(like_row(&conn, 3).as_deref(), Some("active"));

    inject(&conn, "fail_like_update", "BEFORE UPDATE OF like_count ON article");

    let err = CounterCoordinator::new(&mut conn)
        .toggle_like(1, 3)
        .expect_err("injected failure");
    assert!(matches!(err, CounterError::Store(_)));
    assert_eq!(err.code(), ErrorCode::StoreUnavailable);

    assert!(conn.is_autocommit(), "transaction must be closed");
    assert_eq!(counts(&conn).1, 1);
    assert_eq!(like_row(&conn, 3).as_deref(), Some("active"));
}

#[test]
fn ledger_insert_failure_undoes_counter_bump() {
    let mut conn = seeded();
    inject(&conn, "fail_like_insert", "BEFORE INSERT ON article_like");

    let err = CounterCoordinator::new(&mut conn)
        .toggle_like(1, 4)
        .expect_err("injected failure");
    assert!(matches!(err, CounterError::Store(_)));

    assert_eq!(counts(&conn).1, 0);
    assert_eq!(like_row(&conn, 4), None);
}

#[test]
fn ledger_flip_failure_undoes_counter_decrement() {
    let mut conn = seeded();
    CounterCoordinator::new(&mut conn)
        .toggle_like(1, 5)
        .expect("initial like");
    inject(&conn, "fail_like_flip", "BEFORE UPDATE ON article_like");

    CounterCoordinator::new(&mut conn)
        .toggle_like(1, 5)
        .expect_err("injected failure");

    assert_eq!(counts(&conn).1, 1);
    assert_eq!(like_row(&conn, 5).as_deref(), Some("active"));
}

#[test]
fn view_ledger_failure_undoes_view_bump() {
    let mut conn = seeded();
    inject(&conn, "fail_view_insert", "BEFORE INSERT ON article_view");

    let err = CounterCoordinator::new(&mut conn)
        .increment_view(1, &ViewerIdentity::User(9))
        .expect_err("injected failure");
    assert!(matches!(err, CounterError::Store(_)));
    assert_eq!(counts(&conn).0, 10);

    conn.execute_batch("DROP TRIGGER fail_view_insert;")
        .expect("drop trigger");
    assert!(
        CounterCoordinator::new(&mut conn)
            .increment_view(1, &ViewerIdentity::User(9))
            .expect("retry after fault cleared"),
        "a failed attempt must not have been recorded"
    );
    assert_eq!(counts(&conn).0, 11);
}

#[test]
fn view_update_failure_surfaces_store_error() {
    let mut conn = seeded();
    inject(&conn, "fail_view_update", "BEFORE UPDATE OF view_count ON article");

    let err = CounterCoordinator::new(&mut conn)
        .increment_view(1, &ViewerIdentity::User(9))
        .expect_err("injected failure");
    assert!(matches!(err, CounterError::Store(_)));

    let views: i64 = conn
        .query_row("SELECT COUNT(*) FROM article_view", [], |row| row.get(0))
        .expect("count ledger rows");
    assert_eq!(views, 0);
    assert_eq!(counts(&conn).0, 10);
}
