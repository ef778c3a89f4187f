//! Ledger Lens CLI - bookkeeping insights in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ledger_core::LogEvent;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{ask, auth, compare, config, dashboard, import, list, logs, status};

/// Ledger Lens - bookkeeping insights in your terminal
#[derive(Parser)]
#[command(name = "lens", version, about, long_about = None)]
struct Cli {
    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value_t = LevelFilter::WARN)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show storage, session and data summary
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import transactions from a CSV export
    Import {
        /// Path to CSV file
        file: PathBuf,
        /// Add the rows to the existing transactions instead of replacing them
        #[arg(long)]
        append: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List transactions matching a filter
    List {
        #[command(flatten)]
        filter: list::FilterArgs,
        /// Maximum number of rows to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show income, expenses and top categories for a month
    Dashboard {
        /// Month to show (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<String>,
        /// Number of months in the expense trend
        #[arg(long, default_value = "6")]
        trend: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare a month's expenses with the previous month or the same month last year
    Compare {
        /// Month to compare (YYYY-MM), defaults to the latest month with data
        #[arg(long)]
        month: Option<String>,
        /// Compare with the same month last year
        #[arg(long)]
        yoy: bool,
        /// Skip the AI explanation
        #[arg(long)]
        no_ai: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask a question about your transactions
    Ask {
        /// The question (read from stdin when omitted)
        question: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Log in to the backend
    Login {
        /// Account email
        #[arg(long)]
        email: Option<String>,
    },

    /// Create a backend account
    Register {
        /// Account email
        #[arg(long)]
        email: Option<String>,
        /// Display name
        #[arg(long)]
        name: Option<String>,
    },

    /// Log out of the backend
    Logout,

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: Option<config::ConfigCommands>,
    },

    /// View and manage the usage log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Status { .. } => "status",
            Commands::Import { .. } => "import",
            Commands::List { .. } => "list",
            Commands::Dashboard { .. } => "dashboard",
            Commands::Compare { .. } => "compare",
            Commands::Ask { .. } => "ask",
            Commands::Login { .. } => "login",
            Commands::Register { .. } => "register",
            Commands::Logout => "logout",
            Commands::Config { .. } => "config",
            Commands::Logs { .. } => "logs",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    let name = cli.command.name();
    let result = run(cli.command).await;
    let logger = commands::get_logger();

    match result {
        Ok(()) => {
            commands::log_event(&logger, LogEvent::new("command_executed").with_command(name));
            ExitCode::SUCCESS
        }
        Err(e) => {
            let message = commands::describe_error(&e);
            if commands::is_auth_expired(&e) {
                commands::log_event(&logger, LogEvent::new("auth_expired").with_command(name));
            }
            commands::log_event(
                &logger,
                LogEvent::new("command_failed")
                    .with_command(name)
                    .with_error(message.as_str()),
            );
            output::error(&message);
            ExitCode::FAILURE
        }
    }
}

/// Initializes the tracing subscriber. RUST_LOG wins over `--log-level`.
fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!("ledger_core={},lens={}", level, level)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Status { json } => status::run(json).await,
        Commands::Import { file, append, json } => import::run(&file, append, json).await,
        Commands::List { filter, limit, json } => list::run(filter, limit, json).await,
        Commands::Dashboard { month, trend, json } => {
            dashboard::run(month.as_deref(), trend, json).await
        }
        Commands::Compare { month, yoy, no_ai, json } => {
            compare::run(month.as_deref(), yoy, !no_ai, json).await
        }
        Commands::Ask { question, json } => ask::run(question, json).await,
        Commands::Login { email } => auth::login(email).await,
        Commands::Register { email, name } => auth::register(email, name).await,
        Commands::Logout => auth::logout(),
        Commands::Config { command } => config::run(command),
        Commands::Logs { command } => logs::run(command),
    }
}
