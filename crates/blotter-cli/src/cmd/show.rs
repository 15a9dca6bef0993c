//! `blot article show` and `blot article last`.
//!
//! Opening an article counts a view for the caller, the same as a reader
//! landing on the article page. `--no-count` reads without counting.

use crate::cmd::{ensure_registered, fail, fail_session, open_project};
use crate::output::{
    OutputMode, ResponseBody, micros_to_local, pretty_kv, pretty_rule, render_success,
};
use crate::session::{self, Session, SessionError};
use crate::validate;
use blotter_core::counter::CounterCoordinator;
use blotter_core::db::articles;
use blotter_core::error::ErrorCode;
use blotter_core::model::event::IdentityError;
use blotter_core::model::{Article, ArticleId};
use clap::Args;
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Article id.
    pub id: ArticleId,

    /// Read without counting a view.
    #[arg(long)]
    pub no_count: bool,
}

/// Article detail plus whether this read was counted.
#[derive(Debug, Serialize)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub article: Article,
    pub view_counted: bool,
}

/// Execute `blot article show <id>`.
///
/// # Errors
///
/// Returns an error if the article does not exist or the store fails.
pub fn run_show(
    args: &ShowArgs,
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
        command = "article.show",
        article_id = args.id,
        user_id = session.user_id,
        ip = ?session.ip,
        no_count = args.no_count,
        "request"
    );

    if let Err(e) = validate::validate_article_id(args.id) {
        return fail(output, &e.to_response());
    }

    let mut project = open_project(project_root, output)?;
    if articles::get_article(&project.conn, args.id)?.is_none() {
        return fail(output, &not_found(args.id));
    }

    let view_counted = if args.no_count {
        false
    } else {
        count_view(&mut project.conn, args.id, &session, output)?
    };

    let Some(article) = articles::get_article(&project.conn, args.id)? else {
        return fail(output, &not_found(args.id));
    };
    render_detail(&project.conn, article, view_counted, &session, output)
}

/// Execute `blot article last`: the most recently created article. Does not
/// count a view.
///
/// # Errors
///
/// Returns an error if the store is empty or fails.
pub fn run_last(
    user_flag: Option<i64>,
    ip_flag: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let session = match session::resolve_session(user_flag, ip_flag) {
        Ok(s) => s,
        Err(e) => return fail_session(output, &e),
    };
    info!(command = "article.last", user_id = session.user_id, "request");

    let project = open_project(project_root, output)?;
    let Some(article) = articles::last_article(&project.conn)? else {
        return fail(
            output,
            &ResponseBody::error_code(ErrorCode::ArticleNotFound, "no articles yet"),
        );
    };
    render_detail(&project.conn, article, false, &session, output)
}

fn not_found(article_id: ArticleId) -> ResponseBody<()> {
    ResponseBody::error_code(
        ErrorCode::ArticleNotFound,
        format!("article {article_id} not found"),
    )
}

/// Count a view for the caller. Anonymous callers without an address are
/// served without counting; a malformed address is rejected.
fn count_view(
    conn: &mut Connection,
    article_id: ArticleId,
    session: &Session,
    output: OutputMode,
) -> anyhow::Result<bool> {
    let viewer = match session.identity() {
        Ok(viewer) => viewer,
        Err(IdentityError::MissingAddress) => {
            debug!(article_id, "anonymous read without address; view not counted");
            return Ok(false);
        }
        Err(e) => return fail_session(output, &SessionError::from(e)),
    };
    if !session.is_anonymous() {
        ensure_registered(conn, session.user_id, output)?;
    }
    match CounterCoordinator::new(conn).increment_view_from(
        article_id,
        &viewer,
        session.ip.as_deref(),
    ) {
        Ok(applied) => Ok(applied),
        Err(e) => fail(output, &ResponseBody::from(&e)),
    }
}

fn render_detail(
    conn: &Connection,
    mut article: Article,
    view_counted: bool,
    session: &Session,
    output: OutputMode,
) -> anyhow::Result<()> {
    if !session.is_anonymous() {
        article.has_like = articles::like_signs(conn, session.user_id, &[article.id])?
            .contains(&article.id);
    }

    let body = ResponseBody::ok(
        "ok",
        ArticleDetail {
            article,
            view_counted,
        },
    );
    render_success(output, &body, |detail, w| {
        let a = &detail.article;
        match output {
            OutputMode::Text => writeln!(
                w,
                "{}\t{}\t{}\t{}\t{}",
                a.id, a.title, a.view_count, a.like_count, a.has_like
            ),
            OutputMode::Pretty | OutputMode::Json => {
                writeln!(w, "#{} {}", a.id, a.title)?;
                pretty_rule(w)?;
                pretty_kv(w, "Author", a.user_id.to_string())?;
                pretty_kv(w, "Created", micros_to_local(a.created_at_us))?;
                if !a.categories.is_empty() {
                    pretty_kv(w, "Categories", a.categories.join(", "))?;
                }
                if !a.tags.is_empty() {
                    pretty_kv(w, "Tags", a.tags.join(", "))?;
                }
                pretty_kv(w, "Views", a.view_count.to_string())?;
                let liked = if a.has_like { " (you like this)" } else { "" };
                pretty_kv(w, "Likes", format!("{}{liked}", a.like_count))?;
                if !a.content.is_empty() {
                    pretty_rule(w)?;
                    writeln!(w, "{}", a.content)?;
                }
                Ok(())
            }
        }
    })
}
