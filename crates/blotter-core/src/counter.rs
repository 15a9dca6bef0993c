//! Counter transaction coordinator.
//!
//! Each call runs one `BEGIN IMMEDIATE` transaction through four phases:
//!
//! ```text
//! Started -> Checked -> Mutated -> Committed
//!    \          \          \
//!     +----------+----------+--> RolledBack
//! ```
//!
//! `Started` ends once the ledger has been consulted, `Checked` once the
//! owning user is resolved, `Mutated` once the aggregate counter has been
//! updated. The ledger write and the commit happen in `Mutated`. Any error
//! rolls the whole transaction back and is returned unchanged; nothing is
//! retried.

use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use std::fmt;
use tracing::{debug, info, warn};

use crate::db::now_us;
use crate::error::CounterError;
use crate::ledger::Ledger;
use crate::model::{ArticleId, LikeEvent, LikeState, UserId, ViewEvent, ViewerIdentity};

/// Where a counter transaction is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Started,
    Checked,
    Mutated,
    Committed,
    RolledBack,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Started => "started",
            Self::Checked => "checked",
            Self::Mutated => "mutated",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        })
    }
}

/// Which aggregate column a transaction adjusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Counter {
    Views,
    Likes,
}

impl Counter {
    const fn update_sql(self) -> &'static str {
        match self {
            Self::Views => {
                "UPDATE article SET view_count = view_count + ?1 WHERE user_id = ?2 AND id = ?3"
            }
            Self::Likes => {
                "UPDATE article SET like_count = like_count + ?1 WHERE user_id = ?2 AND id = ?3"
            }
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Views => "view_count",
            Self::Likes => "like_count",
        }
    }
}

/// Runs view and like counter transactions against one connection.
///
/// The coordinator borrows the connection mutably for its lifetime, so a
/// request handler owns exactly one transaction at a time.
pub struct CounterCoordinator<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> CounterCoordinator<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Count a view of `article_id` by `viewer`.
    ///
    /// Returns `Ok(false)` without touching anything when the viewer was
    /// already counted.
    ///
    /// # Errors
    ///
    /// [`CounterError::NotFound`] / [`CounterError::ArticleMissing`] when the
    /// article or its owner is missing, [`CounterError::ConstraintViolation`]
    /// if the ledger insert collides, [`CounterError::Store`] otherwise.
    pub fn increment_view(
        &mut self,
        article_id: ArticleId,
        viewer: &ViewerIdentity,
    ) -> Result<bool, CounterError> {
        self.increment_view_from(article_id, viewer, None)
    }

    /// Like [`increment_view`](Self::increment_view), also storing the
    /// request's network address on the ledger row.
    ///
    /// # Errors
    ///
    /// Same as [`increment_view`](Self::increment_view).
    pub fn increment_view_from(
        &mut self,
        article_id: ArticleId,
        viewer: &ViewerIdentity,
        ip: Option<&str>,
    ) -> Result<bool, CounterError> {
        let address = match (ip, viewer) {
            (Some(ip), _) => Some(ip.to_string()),
            (None, ViewerIdentity::Address(addr)) => Some(addr.to_string()),
            (None, ViewerIdentity::User(_)) => None,
        };

        let tx = begin(self.conn)?;
        let mut phase = Phase::Started;
        let outcome = apply_view(&tx, article_id, viewer, address.as_deref(), &mut phase);

        match outcome {
            Ok(true) => {
                commit(tx, &mut phase)?;
                info!(article_id, viewer = %viewer, "view counted");
                Ok(true)
            }
            Ok(false) => {
                rollback(tx, &mut phase);
                debug!(article_id, viewer = %viewer, "view already counted");
                Ok(false)
            }
            Err(err) => {
                warn!(article_id, viewer = %viewer, phase = %phase, error = %err, "view transaction failed");
                rollback(tx, &mut phase);
                Err(err)
            }
        }
    }

    /// Toggle `user_id`'s like on `article_id`.
    ///
    /// Returns `+1` when the article became liked and `-1` when the like was
    /// retracted. Never returns `0` on success.
    ///
    /// # Errors
    ///
    /// [`CounterError::InvalidActor`] for anonymous users (no transaction is
    /// opened), otherwise the same errors as
    /// [`increment_view`](Self::increment_view). On error neither the counter
    /// nor the ledger row has changed.
    pub fn toggle_like(
        &mut self,
        article_id: ArticleId,
        user_id: UserId,
    ) -> Result<i32, CounterError> {
        if user_id <= 0 {
            return Err(CounterError::InvalidActor(format!(
                "likes require a signed-in user, got user id {user_id}"
            )));
        }

        let tx = begin(self.conn)?;
        let mut phase = Phase::Started;

        match apply_like(&tx, article_id, user_id, &mut phase) {
            Ok(delta) => {
                commit(tx, &mut phase)?;
                info!(article_id, user_id, delta, "like toggled");
                Ok(delta)
            }
            Err(err) => {
                warn!(article_id, user_id, phase = %phase, error = %err, "like transaction failed");
                rollback(tx, &mut phase);
                Err(err)
            }
        }
    }
}

fn begin(conn: &mut Connection) -> Result<Transaction<'_>, CounterError> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

fn commit(tx: Transaction<'_>, phase: &mut Phase) -> Result<(), CounterError> {
    // A failed commit drops the transaction, which rolls it back.
    match tx.commit() {
        Ok(()) => {
            *phase = Phase::Committed;
            Ok(())
        }
        Err(err) => {
            *phase = Phase::RolledBack;
            warn!(error = %err, "commit failed");
            Err(err.into())
        }
    }
}

fn rollback(tx: Transaction<'_>, phase: &mut Phase) {
    if let Err(err) = tx.rollback() {
        warn!(error = %err, "rollback failed; connection drop will discard the transaction");
    }
    *phase = Phase::RolledBack;
}

fn apply_view(
    tx: &Transaction<'_>,
    article_id: ArticleId,
    viewer: &ViewerIdentity,
    ip: Option<&str>,
    phase: &mut Phase,
) -> Result<bool, CounterError> {
    let ledger = Ledger::new(tx);
    if ledger.has_viewed(article_id, viewer)? {
        return Ok(false);
    }
    advance(phase, Phase::Checked);

    let owner = resolve_owner(tx, article_id)?;
    bump(tx, Counter::Views, 1, owner, article_id)?;
    advance(phase, Phase::Mutated);

    ledger.record_view(&ViewEvent::new(article_id, viewer, ip, now_us()))?;
    Ok(true)
}

fn apply_like(
    tx: &Transaction<'_>,
    article_id: ArticleId,
    user_id: UserId,
    phase: &mut Phase,
) -> Result<i32, CounterError> {
    let ledger = Ledger::new(tx);
    let prior = ledger.like_state(article_id, user_id)?;
    advance(phase, Phase::Checked);

    let owner = resolve_owner(tx, article_id)?;
    let target = prior.map_or(LikeState::Active, LikeState::toggled);
    let delta = target.delta_from(prior);
    bump(tx, Counter::Likes, delta, owner, article_id)?;
    advance(phase, Phase::Mutated);

    let stored = ledger.record_or_toggle_like(&LikeEvent {
        article_id,
        user_id,
        state: target,
        created_at_us: now_us(),
    })?;
    if stored != target {
        return Err(CounterError::ConstraintViolation {
            article_id,
            actor: format!("user:{user_id}"),
        });
    }
    Ok(delta)
}

fn advance(phase: &mut Phase, next: Phase) {
    debug!(from = %phase, to = %next, "counter phase");
    *phase = next;
}

/// Owner of the article, rejecting missing rows and non-positive owners.
fn resolve_owner(tx: &Transaction<'_>, article_id: ArticleId) -> Result<UserId, CounterError> {
    let owner: Option<UserId> = tx
        .query_row(
            "SELECT user_id FROM article WHERE id = ?1",
            params![article_id],
            |row| row.get(0),
        )
        .optional()?;

    match owner {
        None => Err(CounterError::NotFound { article_id }),
        Some(owner_id) if owner_id <= 0 => Err(CounterError::ArticleMissing {
            article_id,
            owner_id,
        }),
        Some(owner_id) => Ok(owner_id),
    }
}

fn bump(
    tx: &Transaction<'_>,
    counter: Counter,
    delta: i32,
    owner: UserId,
    article_id: ArticleId,
) -> Result<(), CounterError> {
    let changed = tx.execute(counter.update_sql(), params![delta, owner, article_id])?;
    if changed == 0 {
        return Err(CounterError::NotFound { article_id });
    }
    debug!(article_id, counter = counter.name(), delta, "counter adjusted");
    Ok(())
}
