use crate::cmd::{ensure_registered, fail, fail_session, open_project};
use crate::output::{OutputMode, ResponseBody, pretty_kv, render_success};
use crate::session;
use crate::validate;
use anyhow::Context as _;
use blotter_core::db::{self, articles};
use blotter_core::error::ErrorCode;
use blotter_core::model::article::join_list;
use blotter_core::model::{Article, ArticleId, NewArticle};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Article id.
    pub id: ArticleId,

    /// New title.
    #[arg(long)]
    pub title: Option<String>,

    /// New comma-separated tags (empty clears them).
    #[arg(long)]
    pub tags: Option<String>,

    /// New comma-separated categories (empty clears them).
    #[arg(long)]
    pub categories: Option<String>,

    /// New article body.
    #[arg(long, conflicts_with = "content_file")]
    pub content: Option<String>,

    /// Read the new article body from a file.
    #[arg(long)]
    pub content_file: Option<PathBuf>,
}

/// Execute `blot article edit <id>`. Only the fields given are changed;
/// counters are untouched.
///
/// # Errors
///
/// Returns an error if the caller is anonymous, unknown, or not the owner,
/// the article is missing, validation fails, or the store write fails.
pub fn run_edit(
    args: &EditArgs,
    user_flag: Option<i64>,
    ip_flag: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let session = match session::require_user(user_flag, ip_flag) {
        Ok(s) => s,
        Err(e) => return fail_session(output, &e),
    };
    info!(
        command = "article.edit",
        article_id = args.id,
        user_id = session.user_id,
        "request"
    );

    if let Err(e) = validate::validate_article_id(args.id) {
        return fail(output, &e.to_response());
    }
    if let Some(title) = &args.title
        && let Err(e) = validate::validate_title(title)
    {
        return fail(output, &e.to_response());
    }

    let content = match (&args.content, &args.content_file) {
        (Some(content), _) => Some(content.clone()),
        (None, Some(path)) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        (None, None) => None,
    };

    let mut project = open_project(project_root, output)?;
    ensure_registered(&project.conn, session.user_id, output)?;

    let Some(current) =
        articles::get_article_for_owner(&project.conn, session.user_id, args.id)?
    else {
        let body = if articles::get_article(&project.conn, args.id)?.is_some() {
            ResponseBody::error_code(
                ErrorCode::InvalidActor,
                format!("article {} belongs to another user", args.id),
            )
        } else {
            ResponseBody::error_code(
                ErrorCode::ArticleNotFound,
                format!("article {} not found", args.id),
            )
        };
        return fail(output, &body);
    };

    let edit = NewArticle::from_raw(
        session.user_id,
        args.title.as_deref().unwrap_or(&current.title),
        args.tags.as_deref().unwrap_or(&join_list(&current.tags)),
        args.categories
            .as_deref()
            .unwrap_or(&join_list(&current.categories)),
        content.as_deref().unwrap_or(&current.content),
    );
    for category in &edit.categories {
        if let Err(e) = validate::validate_category(category) {
            return fail(output, &e.to_response());
        }
    }

    let Some(article) = articles::update_article(&mut project.conn, args.id, &edit, db::now_us())?
    else {
        return fail(
            output,
            &ResponseBody::error_code(
                ErrorCode::ArticleNotFound,
                format!("article {} not found", args.id),
            ),
        );
    };

    render_success(output, &ResponseBody::ok("updated", article), |a: &Article, w| {
        writeln!(w, "Updated article {}", a.id)?;
        pretty_kv(w, "Title", &a.title)?;
        if !a.categories.is_empty() {
            pretty_kv(w, "Categories", a.categories.join(", "))?;
        }
        if !a.tags.is_empty() {
            pretty_kv(w, "Tags", a.tags.join(", "))?;
        }
        Ok(())
    })
}
