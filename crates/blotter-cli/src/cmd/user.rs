//! `blot user`: registration and availability checks.

use crate::cmd::{fail, open_project};
use crate::output::{OutputMode, ResponseBody, micros_to_local, pretty_kv, render_success};
use crate::validate;
use blotter_core::db::{self, users};
use blotter_core::error::ErrorCode;
use blotter_core::model::User;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a new user.
    Register(RegisterArgs),
    /// Check whether a user name is taken.
    CheckName {
        /// Name to look up.
        name: String,
    },
    /// Check whether an email address is taken (case-insensitive).
    CheckMail {
        /// Address to look up.
        email: String,
    },
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct Availability {
    pub value: String,
    pub exists: bool,
}

/// Dispatch `blot user <subcommand>`.
///
/// # Errors
///
/// Returns an error if validation fails, the name or email is taken, or the
/// store fails.
pub fn run_user(command: &UserCommand, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    match command {
        UserCommand::Register(args) => run_register(args, output, project_root),
        UserCommand::CheckName { name } => {
            info!(command = "user.check-name", name = %name, "request");
            let project = open_project(project_root, output)?;
            let exists = users::user_name_exists(&project.conn, name)?;
            render_availability(output, name, exists)
        }
        UserCommand::CheckMail { email } => {
            info!(command = "user.check-mail", email = %email, "request");
            let project = open_project(project_root, output)?;
            let exists = users::user_mail_exists(&project.conn, email)?;
            render_availability(output, email, exists)
        }
    }
}

fn run_register(args: &RegisterArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    info!(command = "user.register", name = %args.name, email = %args.email, "request");

    if let Err(e) = validate::validate_user_name(&args.name) {
        return fail(output, &e.to_response());
    }
    if let Err(e) = validate::validate_email(&args.email) {
        return fail(output, &e.to_response());
    }

    let project = open_project(project_root, output)?;

    if users::user_name_exists(&project.conn, &args.name)? {
        return fail(
            output,
            &ResponseBody::error_code(
                ErrorCode::InvalidInput,
                format!("user name '{}' is already taken", args.name),
            ),
        );
    }
    if users::user_mail_exists(&project.conn, &args.email)? {
        return fail(
            output,
            &ResponseBody::error_code(
                ErrorCode::InvalidInput,
                format!("email '{}' is already registered", args.email),
            ),
        );
    }

    let user = users::create_user(&project.conn, &args.name, &args.email, db::now_us())?;
    info!(user_id = user.id, "user registered");

    render_success(output, &ResponseBody::ok("registered", user), |user: &User, w| {
        writeln!(w, "Registered user {}", user.id)?;
        pretty_kv(w, "Name", &user.name)?;
        pretty_kv(w, "Email", &user.email)?;
        pretty_kv(w, "Created", micros_to_local(user.created_at_us))
    })
}

fn render_availability(output: OutputMode, value: &str, exists: bool) -> anyhow::Result<()> {
    let message = if exists { "taken" } else { "available" };
    let body = ResponseBody::ok(
        message,
        Availability {
            value: value.to_string(),
            exists,
        },
    );
    render_success(output, &body, |a, w| {
        writeln!(w, "{}\t{}", a.value, if a.exists { "taken" } else { "available" })
    })
}
