// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Watch command - re-validate on declaration changes

use colored::Colorize;
use miette::Result;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::Path;
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};
use tracing::warn;

use super::load_registry;
use crate::model::DECLARATION_EXTENSIONS;
use crate::resolve::Validator;
use crate::utils::{print_diagnostic, print_header, print_info};

/// Run the watch command
pub async fn run(config: &Path, debounce_ms: u64, verbose: bool) -> Result<()> {
    if !config.exists() {
        return Err(crate::errors::ConfError::DeclarationsNotFound {
            path: config.to_path_buf(),
        }
        .into());
    }

    print_header("Starting watch mode...");
    print_info(&format!("Watching {} (debounce: {}ms)", config.display(), debounce_ms));
    println!("Press {} to exit.", "Ctrl+C".cyan());
    println!();

    let (tx, rx) = channel();

    let mut debouncer = new_debouncer(Duration::from_millis(debounce_ms), tx)
        .map_err(|e| miette::miette!("Failed to create file watcher: {}", e))?;

    // a single file is watched through its directory
    let (target, mode) = if config.is_dir() {
        (config.to_path_buf(), RecursiveMode::Recursive)
    } else {
        let parent = config
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        (parent.to_path_buf(), RecursiveMode::NonRecursive)
    };

    debouncer
        .watcher()
        .watch(&target, mode)
        .map_err(|e| miette::miette!("Failed to start watching: {}", e))?;

    revalidate(config, verbose);

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant: Vec<_> = events
                    .iter()
                    .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
                    .filter(|e| is_declaration(config, &e.path))
                    .collect();

                if relevant.is_empty() {
                    continue;
                }

                println!();
                println!("{}", "─".repeat(50).dimmed());
                println!(
                    "{}: {} file(s) changed",
                    "Change detected".yellow(),
                    relevant.len()
                );
                if verbose {
                    for event in &relevant {
                        println!("  {}", event.path.display());
                    }
                }
                println!();

                revalidate(config, verbose);
            }
            Ok(Err(e)) => {
                warn!("watch error: {:?}", e);
            }
            Err(e) => {
                eprintln!("{}: {}", "Channel error".red(), e);
                break;
            }
        }
    }

    Ok(())
}

fn is_declaration(config: &Path, changed: &Path) -> bool {
    if config.is_file() {
        return changed.file_name() == config.file_name();
    }
    changed
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DECLARATION_EXTENSIONS.contains(&ext))
}

fn revalidate(config: &Path, verbose: bool) {
    let start = Instant::now();

    let registry = match load_registry(config) {
        Ok(registry) => registry,
        Err(e) => {
            warn!("reload failed: {}", e);
            eprintln!("{}: {:?}", "Failed to load declarations".red(), e);
            return;
        }
    };

    let report = Validator::new(&registry).run();
    for diagnostic in &report.diagnostics {
        print_diagnostic(diagnostic, verbose);
    }

    let elapsed = start.elapsed().as_secs_f64();
    if report.is_valid() {
        println!(
            "{} ({} configuration(s), {:.2}s)",
            "Declarations are valid".green(),
            registry.build_configs().len(),
            elapsed
        );
    } else {
        println!(
            "{} ({} error(s), {:.2}s)",
            "Validation failed".red(),
            report.errors().count(),
            elapsed
        );
    }
}
