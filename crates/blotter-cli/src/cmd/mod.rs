pub mod categories;
pub mod create;
pub mod edit;
pub mod init;
pub mod like;
pub mod list;
pub mod show;
pub mod user;
pub mod view;

use crate::output::{OutputMode, ResponseBody, render_error};
use crate::session::SessionError;
use blotter_core::config::{self, PROJECT_DIR, ProjectConfig};
use blotter_core::db::{self, users};
use blotter_core::error::ErrorCode;
use blotter_core::model::UserId;
use rusqlite::Connection;
use std::path::Path;

/// An opened project: its store connection and loaded config.
pub struct Project {
    pub conn: Connection,
    pub config: ProjectConfig,
}

/// Render `body` as the command's failure and return it as an error.
pub fn fail<T>(output: OutputMode, body: &ResponseBody<()>) -> anyhow::Result<T> {
    render_error(output, body)?;
    Err(anyhow::anyhow!("{}", body.message))
}

pub fn fail_session<T>(output: OutputMode, err: &SessionError) -> anyhow::Result<T> {
    fail(output, &ResponseBody::error_code(err.code, err.message.clone()))
}

/// Open the project store under `project_root`, applying migrations.
///
/// # Errors
///
/// Renders and returns an error if the project is not initialized, its
/// config is malformed, or the store cannot be opened.
pub fn open_project(project_root: &Path, output: OutputMode) -> anyhow::Result<Project> {
    if !project_root.join(PROJECT_DIR).is_dir() {
        return fail(
            output,
            &ResponseBody::error_code(
                ErrorCode::NotInitialized,
                format!("no {PROJECT_DIR}/ directory in {}", project_root.display()),
            ),
        );
    }

    let config = match config::load_project_config(project_root) {
        Ok(config) => config,
        Err(e) => {
            return fail(
                output,
                &ResponseBody::error_code(ErrorCode::ConfigParseError, format!("{e:#}")),
            );
        }
    };

    let path = config.database.resolve_path(project_root);
    match db::open_store(&path, config.database.busy_timeout()) {
        Ok(conn) => Ok(Project { conn, config }),
        Err(e) => fail(
            output,
            &ResponseBody::error_code(ErrorCode::StoreUnavailable, format!("{e:#}")),
        ),
    }
}

/// Fail with `UserNotFound` unless `user_id` is a registered user.
///
/// # Errors
///
/// Renders and returns an error for unknown users or store failures.
pub fn ensure_registered(
    conn: &Connection,
    user_id: UserId,
    output: OutputMode,
) -> anyhow::Result<()> {
    if users::get_user(conn, user_id)?.is_none() {
        return fail(
            output,
            &ResponseBody::error_code(ErrorCode::UserNotFound, format!("user {user_id} not found")),
        );
    }
    Ok(())
}
