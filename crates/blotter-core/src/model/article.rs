use serde::{Deserialize, Serialize};

use super::{ArticleId, UserId};

/// A persisted article with its aggregate counters.
///
/// `view_count` and `like_count` are only ever changed by
/// [`crate::counter::CounterCoordinator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub user_id: UserId,
    pub title: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub content: String,
    pub view_count: i64,
    pub like_count: i64,
    pub created_at_us: i64,
    /// Whether the reading user currently likes this article. Not persisted.
    #[serde(default)]
    pub has_like: bool,
}

/// Input for [`crate::db::articles::save_article`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewArticle {
    pub user_id: UserId,
    pub title: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub content: String,
}

impl NewArticle {
    /// Build from raw comma-separated tag/category lists.
    #[must_use]
    pub fn from_raw(
        user_id: UserId,
        title: &str,
        tags: &str,
        categories: &str,
        content: &str,
    ) -> Self {
        Self {
            user_id,
            title: title.trim().to_string(),
            tags: split_list(tags),
            categories: split_list(categories),
            content: content.to_string(),
        }
    }
}

/// Split a comma list: trim entries, drop empties and repeats, keep order.
#[must_use]
pub fn split_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() || out.iter().any(|seen| seen == part) {
            continue;
        }
        out.push(part.to_string());
    }
    out
}

/// Inverse of [`split_list`] for storage.
#[must_use]
pub fn join_list(values: &[String]) -> String {
    values.join(",")
}
