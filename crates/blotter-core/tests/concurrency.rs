//! Interleaving tests: concurrent counter transactions on one file-backed
//! store, one connection per simulated request.

use std::sync::{Arc, Barrier, mpsc};
use std::thread;
use std::time::Duration;

use blotter_core::counter::CounterCoordinator;
use blotter_core::db::{self, DEFAULT_BUSY_TIMEOUT};
use blotter_core::ledger::Ledger;
use blotter_core::model::{ViewEvent, ViewerIdentity};
use rusqlite::{Connection, TransactionBehavior};
use tempfile::TempDir;

fn setup() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("blotter.db");
    let conn = db::open_store(&path, DEFAULT_BUSY_TIMEOUT).expect("open store");
    conn.execute(
        "INSERT INTO article (id, user_id, title, view_count, like_count, created_at_us)
         VALUES (1, 7, 'Contended', 0, 0, 1)",
        [],
    )
    .expect("insert article");
    (dir, path)
}

fn open(path: &std::path::Path) -> Connection {
    db::open_store(path, DEFAULT_BUSY_TIMEOUT).expect("open connection")
}

fn counts(path: &std::path::Path) -> (i64, i64) {
    open(path)
        .query_row(
            "SELECT view_count, like_count FROM article WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .expect("read counts")
}

#[test]
fn simultaneous_views_by_same_viewer_count_once() {
    let (_dir, path) = setup();
    let workers = 6;
    let barrier = Arc::new(Barrier::new(workers));

    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let mut conn = open(&path);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                CounterCoordinator::new(&mut conn)
                    .increment_view(1, &ViewerIdentity::User(42))
                    .expect("view transaction")
            })
        })
        .collect();

    let applied = handles
        .into_iter()
        .map(|h| h.join().expect("worker panicked"))
        .filter(|applied| *applied)
        .count();

    assert_eq!(applied, 1, "exactly one request may count the view");
    assert_eq!(counts(&path).0, 1);
}

#[test]
fn view_waits_for_delayed_commit_then_sees_it() {
    let (_dir, path) = setup();
    let viewer = ViewerIdentity::User(42);
    let (ready_tx, ready_rx) = mpsc::channel::<()>();

    let mut slow = open(&path);
    let mut fast = open(&path);

    let racer = thread::spawn(move || {
        ready_rx.recv().expect("slow writer signalled");
        CounterCoordinator::new(&mut fast)
            .increment_view(1, &ViewerIdentity::User(42))
            .expect("racing view")
    });

    {
        let tx = slow
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .expect("begin slow transaction");
        let ledger = Ledger::new(&tx);
        assert!(!ledger.has_viewed(1, &viewer).expect("check"));
        tx.execute(
            "UPDATE article SET view_count = view_count + 1 WHERE user_id = 7 AND id = 1",
            [],
        )
        .expect("bump");
        ledger
            .record_view(&ViewEvent::new(1, &viewer, None, 1))
            .expect("record");

        ready_tx.send(()).expect("signal racer");
        thread::sleep(Duration::from_millis(200));
        tx.commit().expect("delayed commit");
    }

    let raced = racer.join().expect("racer panicked");
    assert!(!raced, "second request must observe the committed ledger row");
    assert_eq!(counts(&path).0, 1);
}

#[test]
fn simultaneous_likes_by_distinct_users_all_apply() {
    let (_dir, path) = setup();
    let users: Vec<i64> = (1..=5).collect();
    let barrier = Arc::new(Barrier::new(users.len()));

    let handles: Vec<_> = users
        .iter()
        .map(|&user| {
            let mut conn = open(&path);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                CounterCoordinator::new(&mut conn)
                    .toggle_like(1, user)
                    .expect("like transaction")
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("worker panicked"), 1);
    }
    assert_eq!(counts(&path).1, 5);
}
