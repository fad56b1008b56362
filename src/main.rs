// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! ciconf - CI configuration resolver

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ciconf::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ciconf=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    let config = cli.config.as_path();

    // Dispatch to command handlers
    match cli.command {
        Commands::Validate { format } => {
            ciconf::cli::validate::run(config, format, cli.verbose).await
        }
        Commands::Resolve { id, all, format } => {
            ciconf::cli::resolve::run(config, id, all, format, cli.verbose).await
        }
        Commands::Graph { format } => ciconf::cli::graph::run(config, format, cli.verbose).await,
        Commands::Params { scope, key, raw } => {
            ciconf::cli::params::run(config, scope, key, raw, cli.verbose).await
        }
        Commands::Tree => ciconf::cli::tree::run(config, cli.verbose).await,
        Commands::Cleanup { id } => ciconf::cli::cleanup::run(config, id, cli.verbose).await,
        Commands::Watch { debounce } => {
            ciconf::cli::watch::run(config, debounce, cli.verbose).await
        }
    }
}
