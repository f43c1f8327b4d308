// Copyright (c) 2026 Mintgate Labs. MIT License.
// See LICENSE for details.

//! # Mintgate Verification Server
//!
//! Entry point for the `mintgate-server` binary. Parses CLI arguments,
//! initializes logging, loads configuration from the environment, and
//! serves the challenge/response verification API.
//!
//! The binary supports two subcommands:
//!
//! - `run`     — start the verification server
//! - `version` — print build version information

mod api;
mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;

use mintgate_core::config::AppConfig;
use mintgate_core::pinning::PinataClient;

use cli::{Commands, MintgateCli};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = MintgateCli::parse();

    match cli.command {
        Commands::Run(args) => run_server(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the verification server: loads config, wires the Pinata client,
/// and serves the API until a shutdown signal arrives.
async fn run_server(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "mintgate_server=info,mintgate_core=info,tower_http=debug",
        LogFormat::from_str_lossy(&args.log_format),
    );

    let config = Arc::new(
        AppConfig::from_env().context("failed to load configuration from the environment")?,
    );

    tracing::info!(
        bind = %args.bind,
        port = args.port,
        contract = %config.contract_address,
        challenge_ttl_secs = config.challenge_ttl_secs,
        "starting mintgate-server"
    );

    // --- Pinning collaborator ---
    let pinner = Arc::new(PinataClient::new(&config));

    // --- Application state ---
    let app_state = api::AppState { config, pinner };

    // --- API server ---
    let router = api::create_router(app_state);
    let addr = format!("{}:{}", args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", addr))?;
    tracing::info!("API server listening on {}", addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(listener, router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("mintgate-server stopped");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("mintgate-server {}", env!("CARGO_PKG_VERSION"));
    println!("rustc           {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
