//! Cellar CLI - Command-line interface for cell store operations

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

#[derive(Parser)]
#[command(name = "cellar")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Store location; `:memory:` or a prefix for `<location>_cell.db`
    #[arg(short, long, default_value = "./data/cells")]
    location: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append a new cell version
    Put {
        row_key: String,
        column_name: String,
        ref_key: i64,

        /// Cell body; reads stdin when neither this nor --file is given
        body: Option<String>,

        /// Read the body from a file
        #[arg(short, long, conflicts_with = "body")]
        file: Option<PathBuf>,
    },

    /// Read one exact cell version
    Get {
        row_key: String,
        column_name: String,
        ref_key: i64,
    },

    /// Read the highest version of a column
    Latest { row_key: String, column_name: String },

    /// Print cells after a cursor
    Scan {
        /// Cursor dimension: added_at or created_at
        #[arg(short, long, default_value = "added_at")]
        dimension: String,

        /// Cursor value; cells strictly after it are printed
        #[arg(short, long, default_value = "0")]
        after: String,

        /// Page size
        #[arg(short, long, default_value_t = 100)]
        limit: usize,

        /// Keep paging until caught up
        #[arg(long)]
        all: bool,
    },

    /// Store information and status
    Status,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let code = match cli.command {
        Commands::Put {
            row_key,
            column_name,
            ref_key,
            body,
            file,
        } => {
            commands::put::execute(&cli.location, &row_key, &column_name, ref_key, body, file)?
        }
        Commands::Get {
            row_key,
            column_name,
            ref_key,
        } => {
            commands::get::execute(&cli.location, &row_key, &column_name, Some(ref_key))?
        }
        Commands::Latest {
            row_key,
            column_name,
        } => {
            commands::get::execute(&cli.location, &row_key, &column_name, None)?
        }
        Commands::Scan {
            dimension,
            after,
            limit,
            all,
        } => {
            commands::scan::execute(&cli.location, &dimension, &after, limit, all)?;
            0
        }
        Commands::Status => {
            commands::status::execute(&cli.location)?;
            0
        }
    };

    Ok(ExitCode::from(code))
}
