//! # CLI Interface
//!
//! Defines the command-line argument structure for `mintgate-server`
//! using `clap` derive. Two subcommands: `run` and `version`.

use clap::{Parser, Subcommand};

/// Mintgate verification API server.
///
/// Issues per-session signing challenges, verifies wallet signatures over
/// them, and forwards approved NFT metadata to the pinning service.
#[derive(Parser, Debug)]
#[command(
    name = "mintgate-server",
    about = "Mintgate verification API server",
    version,
    propagate_version = true
)]
pub struct MintgateCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the server binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the API server.
    Run(RunArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Address to bind the HTTP listener on.
    #[arg(long, env = "MINTGATE_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Port for the verification API.
    #[arg(long, short = 'p', env = "MINTGATE_PORT", default_value_t = 3001)]
    pub port: u16,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "MINTGATE_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}
