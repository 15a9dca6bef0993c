#![forbid(unsafe_code)]

mod cmd;
mod output;
mod session;
mod validate;

use blotter_core::config;
use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "blot: articles with exactly-once view and like counters",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit the JSON response envelope instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Act as this user id (overrides BLOTTER_USER).
    #[arg(long, global = true)]
    user: Option<i64>,

    /// Client network address (overrides BLOTTER_REAL_IP).
    #[arg(long, global = true)]
    ip: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn user_flag(&self) -> Option<i64> {
        self.user
    }

    fn ip_flag(&self) -> Option<&str> {
        self.ip.as_deref()
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Initialize a blotter project",
        long_about = "Create .blotter/ in the current directory with a default config and a migrated store.",
        after_help = "EXAMPLES:\n    blot init\n    blot init --force --json"
    )]
    Init(cmd::init::InitArgs),

    #[command(about = "Register users and check name or email availability")]
    User {
        #[command(subcommand)]
        command: cmd::user::UserCommand,
    },

    #[command(about = "Create, read, view, and like articles")]
    Article {
        #[command(subcommand)]
        command: ArticleCommand,
    },

    #[command(
        about = "List categories with article counts",
        after_help = "EXAMPLES:\n    blot --user 1 categories\n    blot categories --owner 3"
    )]
    Categories(cmd::categories::CategoriesArgs),
}

#[derive(Subcommand, Debug)]
enum ArticleCommand {
    #[command(
        about = "Create an article owned by the signed-in user",
        after_help = "EXAMPLES:\n    blot --user 1 article create --title \"Hello\" --categories rust,db"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        about = "Edit an article you own; only the given fields change",
        after_help = "EXAMPLES:\n    blot --user 1 article edit 7 --title \"Hello again\" --categories rust"
    )]
    Edit(cmd::edit::EditArgs),

    #[command(about = "List articles, newest first")]
    List(cmd::list::ListArgs),

    #[command(
        about = "Show an article and count a view",
        after_help = "EXAMPLES:\n    blot --user 2 article show 7\n    blot article show 7 --no-count"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        about = "Count a view once per viewer",
        after_help = "EXAMPLES:\n    blot --user 2 article view 7\n    blot --ip 203.0.113.9 article view 7"
    )]
    View(cmd::view::ViewArgs),

    #[command(
        about = "Toggle the signed-in user's like",
        after_help = "EXAMPLES:\n    blot --user 2 article like 7"
    )]
    Like(cmd::like::LikeArgs),

    #[command(about = "Show the most recently created article")]
    Last,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("BLOTTER_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "blotter=debug,info"
        } else {
            "blotter=info,warn"
        })
    });

    let format = env::var("BLOTTER_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = std::env::current_dir()?;
    let output: OutputMode = config::resolve_config(&project_root, cli.json)
        .map_or_else(
            |_| {
                if cli.json {
                    OutputMode::Json
                } else {
                    OutputMode::Pretty
                }
            },
            |c| c.resolved_output.parse().unwrap_or(OutputMode::Pretty),
        );

    let user = cli.user_flag();
    let ip = cli.ip_flag();

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, output, &project_root),
        Commands::User { command } => cmd::user::run_user(command, output, &project_root),
        Commands::Article { command } => match command {
            ArticleCommand::Create(args) => {
                cmd::create::run_create(args, user, ip, output, &project_root)
            }
            ArticleCommand::Edit(args) => cmd::edit::run_edit(args, user, ip, output, &project_root),
            ArticleCommand::List(args) => cmd::list::run_list(args, user, ip, output, &project_root),
            ArticleCommand::Show(args) => cmd::show::run_show(args, user, ip, output, &project_root),
            ArticleCommand::View(args) => cmd::view::run_view(args, user, ip, output, &project_root),
            ArticleCommand::Like(args) => cmd::like::run_like(args, user, ip, output, &project_root),
            ArticleCommand::Last => cmd::show::run_last(user, ip, output, &project_root),
        },
        Commands::Categories(args) => {
            cmd::categories::run_categories(args, user, ip, output, &project_root)
        }
    }
}
