//! `perimeter` operator CLI.
//!
//! Config inspection and offline snapshot tooling. Nothing here talks to a
//! region monitor; everything runs on files.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use perimeter_config::EngineConfig;

#[derive(Parser)]
#[command(name = "perimeter")]
#[command(about = "Perimeter fence engine tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> platform -> local overrides)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Validate the typed engine config and report unused keys
    ConfigCheck {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Fail when any config key is not consumed
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// Persisted snapshot utilities
    Snapshot {
        #[command(subcommand)]
        cmd: SnapshotCmd,
    },
}

#[derive(Subcommand)]
enum SnapshotCmd {
    /// Decode a snapshot file and print its fences
    Show {
        #[arg(long)]
        file: String,
    },

    /// Reconcile a snapshot file against a set of live region ids
    Reconcile {
        #[arg(long)]
        file: String,

        /// Region identifier the platform still monitors (repeatable)
        #[arg(long = "live")]
        live: Vec<String>,
    },
}

fn main() -> Result<()> {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();
    init_tracing(&default_log_filter(&cli.cmd));

    match cli.cmd {
        Commands::ConfigHash { paths } => commands::config::config_hash(&paths)?,

        Commands::ConfigCheck {
            config_paths,
            strict,
        } => commands::config::config_check(&config_paths, strict)?,

        Commands::Snapshot { cmd } => match cmd {
            SnapshotCmd::Show { file } => commands::snapshot::show(&file)?,
            SnapshotCmd::Reconcile { file, live } => commands::snapshot::reconcile(&file, &live)?,
        },
    }

    Ok(())
}

/// `logging.filter` from the config being checked, else `info`.
/// `RUST_LOG` still wins over both.
fn default_log_filter(cmd: &Commands) -> String {
    match cmd {
        Commands::ConfigCheck { config_paths, .. } => {
            let refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
            EngineConfig::load(&refs)
                .map(|c| c.logging.filter)
                .unwrap_or_else(|_| "info".to_string())
        }
        _ => "info".to_string(),
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}
