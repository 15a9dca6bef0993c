use std::fmt;

use crate::model::{ArticleId, UserId};

/// Machine-readable error codes surfaced in the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    ArticleNotFound,
    ArticleNotExist,
    UserNotFound,
    InvalidActor,
    DuplicateLedgerEntry,
    StoreUnavailable,
    InvalidInput,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::ArticleNotFound => "E2001",
            Self::ArticleNotExist => "E2002",
            Self::UserNotFound => "E2003",
            Self::InvalidActor => "E2004",
            Self::DuplicateLedgerEntry => "E3001",
            Self::StoreUnavailable => "E5001",
            Self::InvalidInput => "E6001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Numeric form of [`code`](Self::code) used by the `code` envelope field.
    #[must_use]
    pub const fn number(self) -> i32 {
        match self {
            Self::NotInitialized => 1001,
            Self::ConfigParseError => 1002,
            Self::ArticleNotFound => 2001,
            Self::ArticleNotExist => 2002,
            Self::UserNotFound => 2003,
            Self::InvalidActor => 2004,
            Self::DuplicateLedgerEntry => 3001,
            Self::StoreUnavailable => 5001,
            Self::InvalidInput => 6001,
            Self::InternalUnexpected => 9001,
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::ArticleNotFound => "Article not found",
            Self::ArticleNotExist => "Article does not exist",
            Self::UserNotFound => "User not found",
            Self::InvalidActor => "No usable actor identity",
            Self::DuplicateLedgerEntry => "Action already recorded",
            Self::StoreUnavailable => "Datastore error",
            Self::InvalidInput => "Invalid input",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `blot init` to initialize this directory."),
            Self::ConfigParseError => Some("Fix syntax in .blotter/config.toml and retry."),
            Self::ArticleNotFound | Self::ArticleNotExist => {
                Some("Use `blot article list` to see available articles.")
            }
            Self::UserNotFound => Some("Register with `blot user register` first."),
            Self::InvalidActor => Some("Pass --user, or --ip for anonymous views."),
            Self::DuplicateLedgerEntry => None,
            Self::StoreUnavailable => Some("Retry once the database is no longer busy."),
            Self::InvalidInput => None,
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failures of a counter transaction.
///
/// The "already counted" outcome is not an error; it is reported as
/// `Ok(false)` by [`crate::counter::CounterCoordinator::increment_view`].
#[derive(Debug, thiserror::Error)]
pub enum CounterError {
    /// No article row matched the id.
    #[error("article {article_id} not found")]
    NotFound { article_id: ArticleId },

    /// A row exists but its owner id is not a valid user id.
    #[error("article {article_id} does not exist (owner id {owner_id})")]
    ArticleMissing {
        article_id: ArticleId,
        owner_id: UserId,
    },

    /// A ledger uniqueness rule would have been broken.
    #[error("ledger already holds an entry for article {article_id} and {actor}")]
    ConstraintViolation { article_id: ArticleId, actor: String },

    /// The caller supplied no identity the ledger can key on.
    #[error("invalid actor: {0}")]
    InvalidActor(String),

    /// Any underlying datastore failure during begin, exec, or commit.
    #[error("datastore error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl CounterError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::ArticleNotFound,
            Self::ArticleMissing { .. } => ErrorCode::ArticleNotExist,
            Self::ConstraintViolation { .. } => ErrorCode::DuplicateLedgerEntry,
            Self::InvalidActor(_) => ErrorCode::InvalidActor,
            Self::Store(_) => ErrorCode::StoreUnavailable,
        }
    }

    /// True for errors caused by a missing or structurally invalid article.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::ArticleMissing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{CounterError, ErrorCode};
    use std::collections::HashSet;

    const ALL: [ErrorCode; 10] = [
        ErrorCode::NotInitialized,
        ErrorCode::ConfigParseError,
        ErrorCode::ArticleNotFound,
        ErrorCode::ArticleNotExist,
        ErrorCode::UserNotFound,
        ErrorCode::InvalidActor,
        ErrorCode::DuplicateLedgerEntry,
        ErrorCode::StoreUnavailable,
        ErrorCode::InvalidInput,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn number_matches_string_code() {
        for code in ALL {
            assert_eq!(code.code(), format!("E{}", code.number()));
        }
    }

    #[test]
    fn not_found_and_missing_are_distinct() {
        let missing = CounterError::NotFound { article_id: 7 };
        let invalid = CounterError::ArticleMissing {
            article_id: 7,
            owner_id: 0,
        };
        assert!(missing.is_not_found());
        assert!(invalid.is_not_found());
        assert_ne!(missing.code(), invalid.code());
        assert_eq!(invalid.code(), ErrorCode::ArticleNotExist);
    }
}
