//! Article reads and writes.
//!
//! Counters are read here but never written; see [`crate::counter`].

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::collections::HashSet;

use super::categories;
use super::pagination::Pagination;
use crate::model::article::{join_list, split_list};
use crate::model::{Article, ArticleId, LikeState, NewArticle, UserId};

const ARTICLE_COLUMNS: &str =
    "id, user_id, title, tags, categories, content, view_count, like_count, created_at_us";

fn row_to_article(row: &Row<'_>) -> rusqlite::Result<Article> {
    let tags: String = row.get(3)?;
    let categories: String = row.get(4)?;
    Ok(Article {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        tags: split_list(&tags),
        categories: split_list(&categories),
        content: row.get(5)?,
        view_count: row.get(6)?,
        like_count: row.get(7)?,
        created_at_us: row.get(8)?,
        has_like: false,
    })
}

/// Insert an article and file it under its categories in one transaction.
///
/// Counters start at zero.
///
/// # Errors
///
/// Returns an error if any statement fails; nothing is written in that case.
pub fn save_article(conn: &mut Connection, article: &NewArticle, at_us: i64) -> Result<Article> {
    let tx = conn.transaction().context("begin save_article")?;

    tx.execute(
        "INSERT INTO article (user_id, title, tags, categories, content, created_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            article.user_id,
            article.title,
            join_list(&article.tags),
            join_list(&article.categories),
            article.content,
            at_us
        ],
    )
    .context("insert article")?;
    let id = tx.last_insert_rowid();

    categories::save_or_bump(&tx, article.user_id, &article.categories, at_us)?;

    tx.commit().context("commit save_article")?;
    tracing::info!(article_id = id, user_id = article.user_id, "article saved");

    Ok(Article {
        id,
        user_id: article.user_id,
        title: article.title.clone(),
        tags: article.tags.clone(),
        categories: article.categories.clone(),
        content: article.content.clone(),
        view_count: 0,
        like_count: 0,
        created_at_us: at_us,
        has_like: false,
    })
}

/// Replace an article's title, tags, categories, and content.
///
/// Only the owner (`edit.user_id`) may edit; returns `Ok(None)` when no
/// article with that id belongs to them. Counters and `created_at_us` are
/// kept. Category counts move with the edit: dropped categories lose one
/// article (and disappear at zero), added ones gain one.
///
/// # Errors
///
/// Returns an error if any statement fails; nothing is written in that case.
pub fn update_article(
    conn: &mut Connection,
    article_id: ArticleId,
    edit: &NewArticle,
    at_us: i64,
) -> Result<Option<Article>> {
    let tx = conn.transaction().context("begin update_article")?;

    let Some(before) = get_article_for_owner(&tx, edit.user_id, article_id)? else {
        return Ok(None);
    };

    tx.execute(
        "UPDATE article SET title = ?1, tags = ?2, categories = ?3, content = ?4
         WHERE user_id = ?5 AND id = ?6",
        params![
            edit.title,
            join_list(&edit.tags),
            join_list(&edit.categories),
            edit.content,
            edit.user_id,
            article_id
        ],
    )
    .context("update article")?;

    let dropped: Vec<String> = before
        .categories
        .iter()
        .filter(|c| !edit.categories.contains(c))
        .cloned()
        .collect();
    let added: Vec<String> = edit
        .categories
        .iter()
        .filter(|c| !before.categories.contains(c))
        .cloned()
        .collect();
    categories::release(&tx, edit.user_id, &dropped)?;
    categories::save_or_bump(&tx, edit.user_id, &added, at_us)?;

    let after = get_article(&tx, article_id)?
        .with_context(|| format!("article {article_id} vanished during update"))?;
    tx.commit().context("commit update_article")?;
    tracing::info!(
        article_id,
        user_id = edit.user_id,
        dropped = dropped.len(),
        added = added.len(),
        "article updated"
    );

    Ok(Some(after))
}

/// Fetch an article by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_article(conn: &Connection, article_id: ArticleId) -> Result<Option<Article>> {
    conn.query_row(
        &format!("SELECT {ARTICLE_COLUMNS} FROM article WHERE id = ?1"),
        params![article_id],
        row_to_article,
    )
    .optional()
    .with_context(|| format!("get_article {article_id}"))
}

/// Fetch an article only if `user_id` owns it.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_article_for_owner(
    conn: &Connection,
    user_id: UserId,
    article_id: ArticleId,
) -> Result<Option<Article>> {
    conn.query_row(
        &format!("SELECT {ARTICLE_COLUMNS} FROM article WHERE user_id = ?1 AND id = ?2"),
        params![user_id, article_id],
        row_to_article,
    )
    .optional()
    .with_context(|| format!("get_article_for_owner {user_id}/{article_id}"))
}

/// The most recently inserted article.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn last_article(conn: &Connection) -> Result<Option<Article>> {
    conn.query_row(
        &format!("SELECT {ARTICLE_COLUMNS} FROM article ORDER BY id DESC LIMIT 1"),
        [],
        row_to_article,
    )
    .optional()
    .context("last_article")
}

/// Fill `page` with articles, newest first.
///
/// When `viewer` is a signed-in user, each article's `has_like` reflects
/// that user's active likes.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn list_articles(
    conn: &Connection,
    page: &mut Pagination<Article>,
    viewer: UserId,
) -> Result<()> {
    fill_page(conn, page, None, viewer)
}

/// Like [`list_articles`], restricted to articles filed under `category`.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn list_articles_by_category(
    conn: &Connection,
    category: &str,
    page: &mut Pagination<Article>,
    viewer: UserId,
) -> Result<()> {
    fill_page(conn, page, Some(category), viewer)
}

fn fill_page(
    conn: &Connection,
    page: &mut Pagination<Article>,
    category: Option<&str>,
    viewer: UserId,
) -> Result<()> {
    let filter = if category.is_some() {
        " WHERE instr(',' || categories || ',', ',' || ?1 || ',') > 0"
    } else {
        ""
    };

    let total: i64 = conn
        .query_row(
            &format!("SELECT COUNT(*) FROM article{filter}"),
            params_from_iter(category.iter()),
            |row| row.get(0),
        )
        .context("count articles")?;
    page.total = u64::try_from(total).unwrap_or(0);

    let sql = format!(
        "SELECT {ARTICLE_COLUMNS} FROM article{filter} \
         ORDER BY created_at_us DESC, id DESC LIMIT {} OFFSET {}",
        page.page_size,
        page.offset()
    );
    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("prepare article listing: {sql}"))?;
    let rows = stmt
        .query_map(params_from_iter(category.iter()), row_to_article)
        .context("execute article listing")?;

    let mut articles = Vec::new();
    for row in rows {
        articles.push(row.context("read article row")?);
    }

    if viewer > 0 && !articles.is_empty() {
        let ids: Vec<ArticleId> = articles.iter().map(|a| a.id).collect();
        let liked = like_signs(conn, viewer, &ids)?;
        for article in &mut articles {
            article.has_like = liked.contains(&article.id);
        }
    }

    page.set_data(articles);
    Ok(())
}

/// Subset of `article_ids` that `user_id` currently likes.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn like_signs(
    conn: &Connection,
    user_id: UserId,
    article_ids: &[ArticleId],
) -> Result<HashSet<ArticleId>> {
    if article_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let placeholders: Vec<String> = (0..article_ids.len()).map(|i| format!("?{}", i + 3)).collect();
    let sql = format!(
        "SELECT article_id FROM article_like \
         WHERE user_id = ?1 AND state = ?2 AND article_id IN ({})",
        placeholders.join(", ")
    );

    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::with_capacity(article_ids.len() + 2);
    values.push(Box::new(user_id));
    values.push(Box::new(LikeState::Active.as_str()));
    for id in article_ids {
        values.push(Box::new(*id));
    }

    let mut stmt = conn.prepare(&sql).context("prepare like_signs")?;
    let rows = stmt
        .query_map(params_from_iter(values.iter().map(AsRef::as_ref)), |row| {
            row.get::<_, ArticleId>(0)
        })
        .context("execute like_signs")?;

    let mut liked = HashSet::new();
    for row in rows {
        liked.insert(row.context("read like_signs row")?);
    }
    Ok(liked)
}
