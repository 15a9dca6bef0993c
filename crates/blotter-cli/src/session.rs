//! Request identity for CLI commands.
//!
//! - user id: `--user` flag > `BLOTTER_USER` env; absent means anonymous (`0`)
//! - address: `--ip` flag > `BLOTTER_REAL_IP` env
//!
//! Mutating commands that need a signed-in user call [`require_user`].

use blotter_core::error::ErrorCode;
use blotter_core::model::event::IdentityError;
use blotter_core::model::{UserId, ViewerIdentity};
use std::env;

/// Errors from session resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionError {
    pub message: String,
    pub code: ErrorCode,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SessionError {}

impl From<IdentityError> for SessionError {
    fn from(err: IdentityError) -> Self {
        Self {
            message: format!("{err}; pass --ip or set BLOTTER_REAL_IP"),
            code: ErrorCode::InvalidActor,
        }
    }
}

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
}

struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Identity of the caller for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// `0` when anonymous.
    pub user_id: UserId,
    pub ip: Option<String>,
}

impl Session {
    pub const fn is_anonymous(&self) -> bool {
        self.user_id <= 0
    }

    /// Dedup identity for counting a view, keeping the reason it could not
    /// be resolved.
    pub fn identity(&self) -> Result<ViewerIdentity, IdentityError> {
        ViewerIdentity::resolve(self.user_id, self.ip.as_deref())
    }

    /// Dedup identity for counting a view.
    pub fn viewer(&self) -> Result<ViewerIdentity, SessionError> {
        self.identity().map_err(SessionError::from)
    }
}

fn resolve_session_with(
    user_flag: Option<i64>,
    ip_flag: Option<&str>,
    env: &dyn EnvReader,
) -> Result<Session, SessionError> {
    let user_id = match user_flag {
        Some(id) => id,
        None => match env.get("BLOTTER_USER") {
            Some(raw) => raw.trim().parse::<UserId>().map_err(|_| SessionError {
                message: format!("BLOTTER_USER must be a numeric user id, got '{raw}'"),
                code: ErrorCode::InvalidActor,
            })?,
            None => 0,
        },
    };

    if user_id < 0 {
        return Err(SessionError {
            message: format!("user id must not be negative, got {user_id}"),
            code: ErrorCode::InvalidActor,
        });
    }

    let ip = ip_flag
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| env.get("BLOTTER_REAL_IP").map(|s| s.trim().to_string()));

    Ok(Session { user_id, ip })
}

/// Resolve the caller's session from flags and the environment.
///
/// # Errors
///
/// Returns an error if `BLOTTER_USER` is not numeric or the id is negative.
pub fn resolve_session(
    user_flag: Option<i64>,
    ip_flag: Option<&str>,
) -> Result<Session, SessionError> {
    resolve_session_with(user_flag, ip_flag, &RealEnv)
}

/// Resolve the session and insist on a signed-in user.
///
/// # Errors
///
/// Returns an error when the caller is anonymous.
pub fn require_user(
    user_flag: Option<i64>,
    ip_flag: Option<&str>,
) -> Result<Session, SessionError> {
    let session = resolve_session(user_flag, ip_flag)?;
    if session.is_anonymous() {
        return Err(SessionError {
            message: "a signed-in user is required for this command. \
                      Set --user or BLOTTER_USER."
                .to_string(),
            code: ErrorCode::InvalidActor,
        });
    }
    Ok(session)
}
