mod commands;
mod diagnostics;
mod watch;

use std::path::PathBuf;
use std::process::ExitCode;

use bundlegroups::types::GroupLimit;
use clap::{Parser, Subcommand};

use crate::commands::OutputFormat;

#[derive(Parser)]
#[command(name = "bundlegroups", version, about = "Find mergeable runs of asset references in HTML")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-scan markup and compare against .bundlegroups.lock (exit 0/1/2)
    Check {
        /// Maximum references per group: a count, `unbounded`, or `false`
        #[arg(long)]
        limit: Option<GroupLimit>,
    },
    /// Scan all markup and record the groups in .bundlegroups.lock
    Init {
        /// Maximum references per group: a count, `unbounded`, or `false`
        #[arg(long)]
        limit: Option<GroupLimit>,
    },
    /// Print the reference groups of the given files, or of every markup file
    Scan {
        /// Markup files to scan; defaults to every discovered file
        paths: Vec<PathBuf>,
        /// Maximum references per group: a count, `unbounded`, or `false`
        #[arg(long)]
        limit: Option<GroupLimit>,
        /// Output format
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Scan, then re-scan whenever markup changes
    Watch {
        /// Maximum references per group: a count, `unbounded`, or `false`
        #[arg(long)]
        limit: Option<GroupLimit>,
        /// Output format
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { limit } => commands::check(limit),
        Commands::Init { limit } => commands::init(limit).map(|()| return ExitCode::SUCCESS),
        Commands::Scan { paths, limit, format } => {
            commands::scan(&paths, limit, format).map(|()| return ExitCode::SUCCESS)
        },
        Commands::Watch { limit, format } => watch::run(limit, format),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(3_u8)
        },
    };
}
