//! Duplicate-suppression ledger.
//!
//! Records which (article, viewer) views and (article, user) likes have
//! already been counted. Every call goes through the caller's open
//! [`Transaction`], so checks and writes see the same snapshot as the
//! counter update they guard.

use rusqlite::{OptionalExtension, Transaction, params};

use crate::error::CounterError;
use crate::model::{ArticleId, LikeEvent, LikeState, UserId, ViewEvent, ViewerIdentity};

/// Ledger operations bound to one transaction.
pub struct Ledger<'a, 'conn> {
    tx: &'a Transaction<'conn>,
}

impl<'a, 'conn> Ledger<'a, 'conn> {
    #[must_use]
    pub const fn new(tx: &'a Transaction<'conn>) -> Self {
        Self { tx }
    }

    /// True iff a view is already recorded for the pair.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::Store`] if the query fails.
    pub fn has_viewed(
        &self,
        article_id: ArticleId,
        viewer: &ViewerIdentity,
    ) -> Result<bool, CounterError> {
        let exists: bool = self.tx.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM article_view WHERE article_id = ?1 AND viewer_key = ?2
            )",
            params![article_id, viewer.key()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Insert a view row.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::ConstraintViolation`] if the pair is already
    /// recorded, or [`CounterError::Store`] for any other failure.
    pub fn record_view(&self, event: &ViewEvent) -> Result<(), CounterError> {
        let inserted = self.tx.execute(
            "INSERT INTO article_view (article_id, user_id, ip, viewer_key, created_at_us)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.article_id,
                event.user_id,
                event.ip,
                event.viewer_key,
                event.created_at_us
            ],
        );

        match inserted {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(CounterError::ConstraintViolation {
                article_id: event.article_id,
                actor: event.viewer_key.clone(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Current like state for the pair, `None` if the user never liked it.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::Store`] if the query fails or the stored
    /// state is unreadable.
    pub fn like_state(
        &self,
        article_id: ArticleId,
        user_id: UserId,
    ) -> Result<Option<LikeState>, CounterError> {
        let raw: Option<String> = self
            .tx
            .query_row(
                "SELECT state FROM article_like WHERE article_id = ?1 AND user_id = ?2",
                params![article_id, user_id],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|s| {
            s.parse::<LikeState>().map_err(|e| {
                CounterError::Store(rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                ))
            })
        })
        .transpose()
    }

    /// True iff an active like exists for the pair.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::Store`] if the query fails.
    pub fn has_liked(&self, article_id: ArticleId, user_id: UserId) -> Result<bool, CounterError> {
        Ok(self.like_state(article_id, user_id)? == Some(LikeState::Active))
    }

    /// Insert an active like if the pair has no row, otherwise flip the
    /// existing row. Returns the state now stored.
    ///
    /// `event.state` is ignored when a row already exists; the stored state
    /// is always the opposite of the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::Store`] if the write fails.
    pub fn record_or_toggle_like(&self, event: &LikeEvent) -> Result<LikeState, CounterError> {
        let Some(prior) = self.like_state(event.article_id, event.user_id)? else {
            self.tx.execute(
                "INSERT INTO article_like (article_id, user_id, state, created_at_us, updated_at_us)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![
                    event.article_id,
                    event.user_id,
                    LikeState::Active.as_str(),
                    event.created_at_us
                ],
            )?;
            return Ok(LikeState::Active);
        };

        let next = prior.toggled();
        self.tx.execute(
            "UPDATE article_like SET state = ?3, updated_at_us = ?4
             WHERE article_id = ?1 AND user_id = ?2",
            params![
                event.article_id,
                event.user_id,
                next.as_str(),
                event.created_at_us
            ],
        )?;
        Ok(next)
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use rusqlite::Connection;

    fn test_db() -> Connection {
        let conn = db::open_in_memory().expect("open in-memory store");
        conn.execute(
            "INSERT INTO article (id, user_id, title, created_at_us) VALUES (1, 7, 'First', 1)",
            [],
        )
        .expect("insert article");
        conn
    }

    fn like(user_id: UserId) -> LikeEvent {
        LikeEvent {
            article_id: 1,
            user_id,
            state: LikeState::Active,
            created_at_us: 10,
        }
    }

    #[test]
    fn view_is_recorded_once() {
        let mut conn = test_db();
        let tx = conn.transaction().expect("begin");
        let ledger = Ledger::new(&tx);
        let viewer = ViewerIdentity::User(3);

        assert!(!ledger.has_viewed(1, &viewer).expect("check"));
        ledger
            .record_view(&ViewEvent::new(1, &viewer, None, 5))
            .expect("record");
        assert!(ledger.has_viewed(1, &viewer).expect("check"));
    }

    #[test]
    fn duplicate_view_is_constraint_violation() {
        let mut conn = test_db();
        let tx = conn.transaction().expect("begin");
        let ledger = Ledger::new(&tx);
        let viewer = ViewerIdentity::resolve(0, Some("10.1.1.1")).expect("viewer");
        let event = ViewEvent::new(1, &viewer, Some("10.1.1.1"), 5);

        ledger.record_view(&event).expect("first insert");
        let err = ledger.record_view(&event).expect_err("second insert must fail");
        assert!(matches!(err, CounterError::ConstraintViolation { article_id: 1, .. }));
    }

    #[test]
    fn views_are_scoped_per_article_and_viewer() {
        let mut conn = test_db();
        conn.execute(
            "INSERT INTO article (id, user_id, title, created_at_us) VALUES (2, 7, 'Second', 1)",
            [],
        )
        .expect("insert second article");
        let tx = conn.transaction().expect("begin");
        let ledger = Ledger::new(&tx);
        let alice = ViewerIdentity::User(3);
        let bob = ViewerIdentity::User(4);

        ledger
            .record_view(&ViewEvent::new(1, &alice, None, 5))
            .expect("record");
        assert!(!ledger.has_viewed(2, &alice).expect("other article"));
        assert!(!ledger.has_viewed(1, &bob).expect("other viewer"));
    }

    #[test]
    fn like_toggles_single_row() {
        let mut conn = test_db();
        let tx = conn.transaction().expect("begin");
        let ledger = Ledger::new(&tx);

        assert_eq!(ledger.like_state(1, 3).expect("state"), None);
        assert_eq!(
            ledger.record_or_toggle_like(&like(3)).expect("like"),
            LikeState::Active
        );
        assert!(ledger.has_liked(1, 3).expect("has_liked"));
        assert_eq!(
            ledger.record_or_toggle_like(&like(3)).expect("unlike"),
            LikeState::Retracted
        );
        assert!(!ledger.has_liked(1, 3).expect("has_liked"));
        assert_eq!(
            ledger.record_or_toggle_like(&like(3)).expect("relike"),
            LikeState::Active
        );

        let rows: i64 = tx
            .query_row(
                "SELECT COUNT(*) FROM article_like WHERE article_id = 1 AND user_id = 3",
                [],
                |row| row.get(0),
            )
            .expect("count rows");
        assert_eq!(rows, 1);
    }

    #[test]
    fn rollback_discards_ledger_writes() {
        let mut conn = test_db();
        {
            let tx = conn.transaction().expect("begin");
            Ledger::new(&tx)
                .record_or_toggle_like(&like(3))
                .expect("like");
            tx.rollback().expect("rollback");
        }
        let tx = conn.transaction().expect("begin");
        assert_eq!(Ledger::new(&tx).like_state(1, 3).expect("state"), None);
    }
}
