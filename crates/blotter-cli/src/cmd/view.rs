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
pub struct ViewArgs {
    /// Article id.
    pub id: ArticleId,
}

#[derive(Debug, Serialize)]
pub struct ViewOutcome {
    pub article_id: ArticleId,
    /// `false` when this viewer was already counted.
    pub applied: bool,
    pub view_count: i64,
}

/// Execute `blot article view <id>`: count one view for the caller.
///
/// A repeat view is a success with `applied = false`.
///
/// # Errors
///
/// Returns an error when the caller has no identity (anonymous without an
/// address) or is signed in as an unknown user, the article is missing, or
/// the store fails.
pub fn run_view(
    args: &ViewArgs,
    user_flag: Option<i64>,
    ip_flag: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let session = match session::resolve_session(user_flag, ip_flag) {
        Ok(s) => s,
        Err(e) => return fail_session(output, &e),
    };
    info!(
        command = "article.view",
        article_id = args.id,
        user_id = session.user_id,
        ip = ?session.ip,
        "request"
    );

    if let Err(e) = validate::validate_article_id(args.id) {
        return fail(output, &e.to_response());
    }
    let viewer = match session.viewer() {
        Ok(v) => v,
        Err(e) => return fail_session(output, &e),
    };

    let mut project = open_project(project_root, output)?;
    if !session.is_anonymous() {
        ensure_registered(&project.conn, session.user_id, output)?;
    }
    let applied = match CounterCoordinator::new(&mut project.conn).increment_view_from(
        args.id,
        &viewer,
        session.ip.as_deref(),
    ) {
        Ok(applied) => applied,
        Err(e) => return fail(output, &ResponseBody::from(&e)),
    };

    let view_count = articles::get_article(&project.conn, args.id)?
        .map_or(0, |a| a.view_count);

    let message = if applied { "view counted" } else { "already counted" };
    let body = ResponseBody::ok(
        message,
        ViewOutcome {
            article_id: args.id,
            applied,
            view_count,
        },
    );
    render_success(output, &body, |v, w| match output {
        OutputMode::Text => writeln!(w, "{}\t{}\t{}", v.article_id, v.applied, v.view_count),
        OutputMode::Pretty | OutputMode::Json => writeln!(
            w,
            "Article {}: {} ({} views)",
            v.article_id, message, v.view_count
        ),
    })
}
