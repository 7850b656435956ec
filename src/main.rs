// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Datalex CLI - browse the sustainability regulation catalog

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use datalex::commands::{
    self, admin::AdminAction, export::ExportFormat, list::FilterArgs, lookup::LookupTable,
    AppContext,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "datalex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "DATALEX_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Reference data directory override
    #[arg(long, env = "DATALEX_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Catalog API base URL override
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true)]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search and filter the catalog
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Show at most this many rows
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show one regulation in detail
    Show {
        /// Regulation id
        id: String,
    },

    /// Place the filtered regulations on municipality coordinates
    Map {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Ask a question about one document
    Chat {
        /// Document id
        document_id: String,

        /// Question
        question: String,
    },

    /// Ask a natural-language question about the whole catalog
    Ask {
        /// Question
        question: String,
    },

    /// Log in to the chat assistant
    Login {
        /// Account email
        email: String,

        /// Account password
        #[arg(long, env = "DATALEX_CHAT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Upload a PDF to the document service
    Upload {
        /// PDF file
        path: PathBuf,
    },

    /// Send feedback about the catalog
    Feedback {
        /// Comments
        message: String,

        /// Contact email
        #[arg(long)]
        email: Option<String>,
    },

    /// Manage rows in the hosted backend
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },

    /// Print a reference table
    Lookup {
        /// Table to print
        #[arg(value_enum)]
        table: LookupTable,

        /// Parent region / province, or code(s) to describe
        parent: Option<String>,
    },

    /// Export the filtered regulations
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config {
        /// Configuration key (omit to print everything)
        key: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn init_logging(verbose: u8, quiet: bool, configured: &str) {
    let level = match verbose {
        0 if quiet => "error",
        0 => configured,
        1 => "debug",
        _ => "trace",
    };
    let filter = if verbose == 0 && !quiet {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        datalex::config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
        config.api_url().context("Invalid --api-url")?;
    }

    init_logging(cli.verbose, cli.quiet, &config.log_level);

    let ctx = AppContext {
        config,
        json: cli.json,
        color: !cli.no_color,
    };

    // Execute command
    match cli.command {
        Commands::List { filters, limit } => commands::list::run(&ctx, &filters, limit).await,
        Commands::Show { id } => commands::show::run(&ctx, &id).await,
        Commands::Map { filters } => commands::map::run(&ctx, &filters).await,
        Commands::Chat { document_id, question } => {
            commands::chat::run_chat(&ctx, &document_id, &question).await
        }
        Commands::Ask { question } => commands::chat::run_ask(&ctx, &question).await,
        Commands::Login { email, password } => commands::chat::run_login(&ctx, &email, password).await,
        Commands::Upload { path } => commands::chat::run_upload(&ctx, &path).await,
        Commands::Feedback { message, email } => {
            commands::chat::run_feedback(&ctx, email.as_deref(), &message).await
        }
        Commands::Admin { action } => commands::admin::run(&ctx, &action).await,
        Commands::Lookup { table, parent } => commands::lookup::run(&ctx, table, parent.as_deref()),
        Commands::Export { filters, format, output } => {
            commands::export::run(&ctx, &filters, format, output.as_deref()).await
        }
        Commands::Config { key } => commands::config::run(&ctx, key.as_deref()),
        Commands::Completions { shell } => commands::completions::run(shell, &mut Cli::command()),
    }
}
