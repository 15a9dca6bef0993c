use crate::cmd::{ensure_registered, fail, fail_session, open_project};
use crate::output::{OutputMode, ResponseBody, render_success};
use crate::session;
use crate::validate;
use blotter_core::counter::CounterCoordinator;
use blotter_core::db::articles;
use blotter_core::model::ArticleId;
use clap::Args;
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Args, Debug)]
pub struct LikeArgs {
    /// Article id.
    pub id: ArticleId,
}

#[derive(Debug, Serialize)]
pub struct LikeOutcome {
    pub article_id: ArticleId,
    /// `1` when liked, `-1` when the like was retracted.
    pub delta: i32,
    pub liked: bool,
    pub like_count: i64,
}

/// Execute `blot article like <id>`: toggle the caller's like.
///
/// # Errors
///
/// Returns an error when the caller is anonymous or unregistered, the
/// article is missing, or the store fails.
pub fn run_like(
    args: &LikeArgs,
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
        command = "article.like",
        article_id = args.id,
        user_id = session.user_id,
        "request"
    );

    if let Err(e) = validate::validate_article_id(args.id) {
        return fail(output, &e.to_response());
    }

    let mut project = open_project(project_root, output)?;
    ensure_registered(&project.conn, session.user_id, output)?;
    let delta = match CounterCoordinator::new(&mut project.conn).toggle_like(args.id, session.user_id)
    {
        Ok(delta) => delta,
        Err(e) => return fail(output, &ResponseBody::from(&e)),
    };

    let like_count = articles::get_article(&project.conn, args.id)?
        .map_or(0, |a| a.like_count);

    let liked = delta > 0;
    let message = if liked { "liked" } else { "like retracted" };
    let body = ResponseBody::ok(
        message,
        LikeOutcome {
            article_id: args.id,
            delta,
            liked,
            like_count,
        },
    );
    render_success(output, &body, |l, w| match output {
        OutputMode::Text => writeln!(w, "{}\t{}\t{}", l.article_id, l.delta, l.like_count),
        OutputMode::Pretty | OutputMode::Json => writeln!(
            w,
            "Article {}: {} ({} likes)",
            l.article_id, message, l.like_count
        ),
    })
}
