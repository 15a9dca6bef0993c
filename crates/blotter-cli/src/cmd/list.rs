use crate::cmd::{fail, fail_session, open_project};
use crate::output::{OutputMode, ResponseBody, micros_to_local, pretty_rule, render_success};
use crate::session;
use crate::validate;
use blotter_core::db::articles;
use blotter_core::db::pagination::Pagination;
use blotter_core::model::Article;
use clap::Args;
use std::path::Path;
use tracing::info;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Page number, starting at 1.
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Rows per page (defaults to `[articles] page_size`).
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Only articles filed under this category.
    #[arg(long)]
    pub category: Option<String>,
}

/// Execute `blot article list`, newest first. Signed-in callers get
/// `has_like` filled in per article.
///
/// # Errors
///
/// Returns an error if the session is malformed or the query fails.
pub fn run_list(
    args: &ListArgs,
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
        command = "article.list",
        user_id = session.user_id,
        page = args.page,
        category = ?args.category,
        "request"
    );

    if let Some(category) = &args.category
        && let Err(e) = validate::validate_category(category)
    {
        return fail(output, &e.to_response());
    }

    let project = open_project(project_root, output)?;
    let page_size = args
        .page_size
        .unwrap_or(project.config.articles.page_size);
    let mut page: Pagination<Article> = Pagination::new(args.page, page_size);

    match &args.category {
        Some(category) => articles::list_articles_by_category(
            &project.conn,
            category,
            &mut page,
            session.user_id,
        )?,
        None => articles::list_articles(&project.conn, &mut page, session.user_id)?,
    }

    render_success(output, &ResponseBody::ok("ok", page), |page, w| {
        if page.data.is_empty() {
            return writeln!(w, "No articles.");
        }
        match output {
            OutputMode::Text => {
                for a in &page.data {
                    writeln!(
                        w,
                        "{}\t{}\t{}\t{}\t{}",
                        a.id, a.title, a.view_count, a.like_count, a.has_like
                    )?;
                }
            }
            OutputMode::Pretty | OutputMode::Json => {
                writeln!(
                    w,
                    "Page {} of {} ({} articles)",
                    page.page,
                    page.total_pages(),
                    page.total
                )?;
                pretty_rule(w)?;
                for a in &page.data {
                    let liked = if a.has_like { " *" } else { "" };
                    writeln!(w, "#{:<5} {}{liked}", a.id, a.title)?;
                    writeln!(
                        w,
                        "       {} views, {} likes, {}",
                        a.view_count,
                        a.like_count,
                        micros_to_local(a.created_at_us)
                    )?;
                }
                if page.has_next() {
                    pretty_rule(w)?;
                    writeln!(w, "More: --page {}", page.page + 1)?;
                }
            }
        }
        Ok(())
    })
}
