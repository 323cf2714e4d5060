//! CLI argument definitions for the Dossier binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// SQLite database (default, durable)
    Sqlite,
    /// In-memory with JSON persistence (for development and ephemeral deployments)
    Inmemory,
}

/// Dossier versioned JSON document server
#[derive(Parser, Debug)]
#[command(name = "dossier")]
#[command(about = "Dossier: versioned JSON documents with patch-based history")]
#[command(version)]
pub struct Cli {
    /// Emit machine-readable JSON instead of human output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the Dossier server
    Serve(ServeArgs),
    /// Check health of a running Dossier server
    Health(HealthArgs),
    /// Show what a data directory holds
    Info(InfoArgs),
}

/// Storage selection shared by commands that open a backend
#[derive(clap::Args, Debug, Clone)]
pub struct BackendArgs {
    /// Storage backend to use
    #[arg(short, long, default_value = "sqlite", env = "DOSSIER_BACKEND")]
    pub backend: Backend,

    /// Data directory for storage files.
    /// For SQLite: stores dossier.db
    /// For InMemory: stores dossier.json
    #[arg(short = 'D', long, env = "DOSSIER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080, env = "DOSSIER_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "DOSSIER_HOST")]
    pub host: String,

    #[command(flatten)]
    pub backend_config: BackendArgs,

    /// Milliseconds a mutation lease is held before it may be reclaimed
    #[arg(long, default_value_t = dossier::constants::DEFAULT_LEASE_TIMEOUT_MS, env = "DOSSIER_LEASE_TIMEOUT_MS")]
    pub lease_timeout_ms: u64,

    /// Keep at most this many revisions per document (unbounded if unset)
    #[arg(long, env = "DOSSIER_MAX_REVISIONS")]
    pub max_revisions: Option<usize>,

    /// Diff arrays without emitting move operations
    #[arg(long)]
    pub no_move_detection: bool,
}

/// Arguments for the health command
#[derive(clap::Args, Debug)]
pub struct HealthArgs {
    /// Base URL of the server to check
    #[arg(long, default_value = "http://127.0.0.1:8080", env = "DOSSIER_URL")]
    pub url: String,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,
}

/// Arguments for the info command
#[derive(clap::Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub backend_config: BackendArgs,
}
