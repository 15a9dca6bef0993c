use serde::{Deserialize, Serialize};

use super::UserId;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at_us: i64,
}

/// A category owned by a user, with the number of articles filed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub user_id: UserId,
    pub name: String,
    pub article_count: i64,
}
