use crate::cmd::fail;
use crate::output::{OutputMode, ResponseBody, pretty_kv, render_success};
use anyhow::{Context as _, Result};
use blotter_core::config::{self, PROJECT_DIR};
use blotter_core::db::{self, migrations};
use blotter_core::error::ErrorCode;
use clap::Args;
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite the config even if `.blotter/` already exists.
    #[arg(long)]
    pub force: bool,
}

const GITIGNORE: &str = "blotter.db\nblotter.db-wal\nblotter.db-shm\n";

#[derive(Debug, Serialize)]
pub struct InitReport {
    pub project_dir: String,
    pub database: String,
    pub schema_version: u32,
    /// Migration versions recorded in the store.
    pub migrations: Vec<u32>,
}

/// Execute `blot init`. Creates the project skeleton:
///
/// ```text
/// .blotter/
///   config.toml   (default project config)
///   .gitignore    (store files)
///   blotter.db    (migrated store)
/// ```
///
/// # Errors
///
/// Returns an error if `.blotter/` already exists and `--force` is not set,
/// or if any filesystem or store operation fails.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project_dir = project_root.join(PROJECT_DIR);

    if project_dir.exists() && !args.force {
        return fail(
            output,
            &ResponseBody::error_code(
                ErrorCode::InvalidInput,
                format!("{PROJECT_DIR}/ already exists. Use `blot init --force` to reinitialize."),
            ),
        );
    }

    std::fs::create_dir_all(&project_dir)
        .with_context(|| format!("Failed to create {}", project_dir.display()))?;

    let config_path = project_dir.join("config.toml");
    std::fs::write(&config_path, config::default_project_toml()?)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    let gitignore_path = project_dir.join(".gitignore");
    std::fs::write(&gitignore_path, GITIGNORE)
        .with_context(|| format!("Failed to write {}", gitignore_path.display()))?;

    let project_config = config::load_project_config(project_root)?;
    let db_path = project_config.database.resolve_path(project_root);
    let conn = db::open_store(&db_path, project_config.database.busy_timeout())?;
    let schema_version = migrations::current_schema_version(&conn)?;
    let applied = migrations::applied_migrations(&conn)?;

    info!(path = %project_dir.display(), schema_version, "project initialized");

    let body = ResponseBody::ok(
        "initialized",
        InitReport {
            project_dir: project_dir.display().to_string(),
            database: db_path.display().to_string(),
            schema_version,
            migrations: applied,
        },
    );
    render_success(output, &body, |report, w| {
        writeln!(w, "Initialized blotter project")?;
        pretty_kv(w, "Directory", &report.project_dir)?;
        pretty_kv(w, "Database", &report.database)?;
        pretty_kv(w, "Schema", report.schema_version.to_string())
    })
}
