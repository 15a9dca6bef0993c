use crate::cmd::{fail_session, open_project};
use crate::output::{OutputMode, ResponseBody, pretty_rule, render_success};
use crate::session;
use blotter_core::db::categories;
use blotter_core::model::UserId;
use clap::Args;
use std::path::Path;
use tracing::info;

#[derive(Args, Debug)]
pub struct CategoriesArgs {
    /// List another user's categories instead of your own.
    #[arg(long)]
    pub owner: Option<UserId>,
}

/// Execute `blot categories`: category names with article counts.
///
/// # Errors
///
/// Returns an error when no owner can be determined or the query fails.
pub fn run_categories(
    args: &CategoriesArgs,
    user_flag: Option<i64>,
    ip_flag: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let owner = match args.owner {
        Some(owner) => owner,
        None => match session::require_user(user_flag, ip_flag) {
            Ok(s) => s.user_id,
            Err(e) => return fail_session(output, &e),
        },
    };
    info!(command = "categories", owner, "request");

    let project = open_project(project_root, output)?;
    let list = categories::user_categories(&project.conn, owner)?;

    render_success(output, &ResponseBody::ok("ok", list), |list, w| {
        if list.is_empty() {
            return writeln!(w, "No categories.");
        }
        if output == OutputMode::Pretty {
            writeln!(w, "Categories of user {owner}")?;
            pretty_rule(w)?;
        }
        for c in list {
            writeln!(w, "{}\t{}", c.name, c.article_count)?;
        }
        Ok(())
    })
}
