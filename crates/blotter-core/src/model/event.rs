//! Ledger entries and the identities they are keyed on.

use serde::{Deserialize, Serialize};
use std::{fmt, net::IpAddr, str::FromStr};

use super::{ArticleId, UserId};

/// Validity of a like row. Unliking flips the row instead of deleting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeState {
    Active,
    Retracted,
}

impl LikeState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Retracted => "retracted",
        }
    }

    /// The opposite state.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Retracted,
            Self::Retracted => Self::Active,
        }
    }

    /// Counter delta implied by moving from `prior` (absent = never liked)
    /// into `self`.
    #[must_use]
    pub const fn delta_from(self, prior: Option<Self>) -> i32 {
        match (prior, self) {
            (None | Some(Self::Retracted), Self::Active) => 1,
            (Some(Self::Active), Self::Retracted) => -1,
            _ => 0,
        }
    }
}

impl fmt::Display for LikeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl FromStr for LikeState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "retracted" => Ok(Self::Retracted),
            _ => Err(ParseEnumError {
                expected: "like state",
                got: s.to_string(),
            }),
        }
    }
}

/// Who a view is counted against.
///
/// Authenticated readers are keyed by user id alone; the address they came
/// from is recorded but ignored for de-duplication. Anonymous readers are
/// keyed by their network address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerIdentity {
    User(UserId),
    Address(IpAddr),
}

/// Reason a viewer identity could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("anonymous viewer has no network address")]
    MissingAddress,
    #[error("invalid network address '{0}'")]
    InvalidAddress(String),
}

impl ViewerIdentity {
    /// Pick the dedup identity for a request.
    ///
    /// # Errors
    ///
    /// Returns an error when the actor is anonymous and `ip` is absent,
    /// blank, or not an IP address.
    pub fn resolve(user_id: UserId, ip: Option<&str>) -> Result<Self, IdentityError> {
        if user_id > 0 {
            return Ok(Self::User(user_id));
        }
        let raw = ip.map(str::trim).filter(|s| !s.is_empty());
        let Some(raw) = raw else {
            return Err(IdentityError::MissingAddress);
        };
        raw.parse::<IpAddr>()
            .map(Self::Address)
            .map_err(|_| IdentityError::InvalidAddress(raw.to_string()))
    }

    /// Ledger key stored in `article_view.viewer_key`.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::User(id) => format!("user:{id}"),
            Self::Address(addr) => format!("ip:{addr}"),
        }
    }

    /// User id for the ledger row, `0` when anonymous.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        match self {
            Self::User(id) => *id,
            Self::Address(_) => 0,
        }
    }
}

impl fmt::Display for ViewerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// One counted view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewEvent {
    pub article_id: ArticleId,
    pub user_id: UserId,
    pub ip: Option<String>,
    pub viewer_key: String,
    pub created_at_us: i64,
}

impl ViewEvent {
    #[must_use]
    pub fn new(
        article_id: ArticleId,
        viewer: &ViewerIdentity,
        ip: Option<&str>,
        created_at_us: i64,
    ) -> Self {
        Self {
            article_id,
            user_id: viewer.user_id(),
            ip: ip.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string),
            viewer_key: viewer.key(),
            created_at_us,
        }
    }
}

/// The single like row for an (article, user) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeEvent {
    pub article_id: ArticleId,
    pub user_id: UserId,
    pub state: LikeState,
    pub created_at_us: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_state_serializes_as_stored_text() {
        let json = serde_json::to_string(&LikeState::Retracted).expect("serialize");
        assert_eq!(json, "\"retracted\"");
        let back: LikeState = serde_json::from_str("\"active\"").expect("deserialize");
        assert_eq!(back, LikeState::Active);
    }

    #[test]
    fn delta_follows_transition() {
        assert_eq!(LikeState::Active.delta_from(None), 1);
        assert_eq!(LikeState::Active.delta_from(Some(LikeState::Retracted)), 1);
        assert_eq!(LikeState::Retracted.delta_from(Some(LikeState::Active)), -1);
        assert_eq!(LikeState::Active.delta_from(Some(LikeState::Active)), 0);
    }

    #[test]
    fn like_state_parse_roundtrip() {
        for state in [LikeState::Active, LikeState::Retracted] {
            assert_eq!(state.as_str().parse::<LikeState>(), Ok(state));
        }
        assert!("valid".parse::<LikeState>().is_err());
    }

    #[test]
    fn authenticated_viewer_ignores_address() {
        let viewer = ViewerIdentity::resolve(12, Some("10.0.0.1")).expect("resolve");
        assert_eq!(viewer, ViewerIdentity::User(12));
        assert_eq!(viewer.key(), "user:12");
    }

    #[test]
    fn anonymous_viewer_uses_address() {
        let viewer = ViewerIdentity::resolve(0, Some(" 192.168.1.7 ")).expect("resolve");
        assert_eq!(viewer.key(), "ip:192.168.1.7");
        assert_eq!(viewer.user_id(), 0);
    }

    #[test]
    fn anonymous_without_address_is_rejected() {
        assert_eq!(
            ViewerIdentity::resolve(0, None),
            Err(IdentityError::MissingAddress)
        );
        assert_eq!(
            ViewerIdentity::resolve(-3, Some("  ")),
            Err(IdentityError::MissingAddress)
        );
        assert!(matches!(
            ViewerIdentity::resolve(0, Some("not-an-ip")),
            Err(IdentityError::InvalidAddress(_))
        ));
    }

    #[test]
    fn view_event_carries_key_and_ip() {
        let viewer = ViewerIdentity::User(5);
        let event = ViewEvent::new(9, &viewer, Some("::1"), 42);
        assert_eq!(event.viewer_key, "user:5");
        assert_eq!(event.user_id, 5);
        assert_eq!(event.ip.as_deref(), Some("::1"));
    }
}
