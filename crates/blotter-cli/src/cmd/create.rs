use crate::cmd::{ensure_registered, fail, fail_session, open_project};
use crate::output::{OutputMode, ResponseBody, pretty_kv, render_success};
use crate::session;
use crate::validate;
use anyhow::Context as _;
use blotter_core::db::{self, articles};
use blotter_core::model::{Article, NewArticle};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Article title.
    #[arg(long)]
    pub title: String,

    /// Comma-separated tags.
    #[arg(long, default_value = "")]
    pub tags: String,

    /// Comma-separated categories.
    #[arg(long, default_value = "")]
    pub categories: String,

    /// Article body.
    #[arg(long, conflicts_with = "content_file")]
    pub content: Option<String>,

    /// Read the article body from a file.
    #[arg(long)]
    pub content_file: Option<PathBuf>,
}

/// Execute `blot article create`. The article is owned by the signed-in
/// user; counters start at zero.
///
/// # Errors
///
/// Returns an error if the caller is anonymous or unknown, validation fails,
/// or the store write fails.
pub fn run_create(
    args: &CreateArgs,
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
        command = "article.create",
        user_id = session.user_id,
        title = %args.title,
        categories = %args.categories,
        "request"
    );

    if let Err(e) = validate::validate_title(&args.title) {
        return fail(output, &e.to_response());
    }

    let content = match (&args.content, &args.content_file) {
        (Some(content), _) => content.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => String::new(),
    };

    let new_article = NewArticle::from_raw(
        session.user_id,
        &args.title,
        &args.tags,
        &args.categories,
        &content,
    );
    for category in &new_article.categories {
        if let Err(e) = validate::validate_category(category) {
            return fail(output, &e.to_response());
        }
    }

    let mut project = open_project(project_root, output)?;

    ensure_registered(&project.conn, session.user_id, output)?;

    let article = articles::save_article(&mut project.conn, &new_article, db::now_us())?;
    info!(article_id = article.id, user_id = article.user_id, "article created");

    render_success(output, &ResponseBody::ok("created", article), |a: &Article, w| {
        writeln!(w, "Created article {}", a.id)?;
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
