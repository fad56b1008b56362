// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Resolve command - print resolved snapshots

use colored::Colorize;
use miette::Result;
use std::path::Path;

use super::{load_registry, SnapshotFormat};
use crate::resolve::Resolver;
use crate::utils::print_error_suggestion;

/// Run the resolve command
pub async fn run(
    config: &Path,
    id: Option<String>,
    all: bool,
    format: SnapshotFormat,
    verbose: bool,
) -> Result<()> {
    let registry = load_registry(config)?;
    let resolver = Resolver::new(&registry);

    let (output, fingerprint) = match id.filter(|_| !all) {
        Some(id) => {
            let snapshot = resolver.resolve_configuration(&id).inspect_err(|e| {
                if verbose {
                    print_error_suggestion(e);
                }
            })?;
            let output = match format {
                SnapshotFormat::Yaml => snapshot.to_yaml()?,
                SnapshotFormat::Json => snapshot.to_json()?,
            };
            (output, snapshot.fingerprint()?)
        }
        None => {
            let pipeline = resolver.resolve_pipeline().inspect_err(|e| {
                if verbose {
                    print_error_suggestion(e);
                }
            })?;
            for warning in &pipeline.warnings {
                eprintln!("{} {}", "⚠".yellow(), warning.message);
            }
            let output = match format {
                SnapshotFormat::Yaml => pipeline.to_yaml()?,
                SnapshotFormat::Json => pipeline.to_json()?,
            };
            (output, pipeline.fingerprint()?)
        }
    };

    println!("{}", output.trim_end());

    if verbose {
        eprintln!("{} {}", "fingerprint:".dimmed(), fingerprint);
    }

    Ok(())
}
