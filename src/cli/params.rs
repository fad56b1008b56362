// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Params command - inspect parameters visible from a scope

use colored::Colorize;
use miette::Result;
use std::path::Path;

use super::load_registry;
use crate::params::{ParameterStore, Scope};
use crate::utils::{print_error_suggestion, print_header};

/// Run the params command
pub async fn run(
    config: &Path,
    scope_id: String,
    key: Option<String>,
    raw: bool,
    verbose: bool,
) -> Result<()> {
    let registry = load_registry(config)?;
    let scope = Scope::of(&registry, &scope_id)?;
    let store = ParameterStore::new(&registry);

    if let Some(key) = key {
        let value = if raw {
            store
                .lookup(&scope, &key)?
                .map(|origin| origin.value)
                .ok_or_else(|| miette::miette!("'{}' is not defined in {}", key, scope))?
        } else {
            store.resolve(&scope, &key).inspect_err(|e| {
                if verbose {
                    print_error_suggestion(e);
                }
            })?
        };
        println!("{}", value);
        return Ok(());
    }

    print_header(&format!("Parameters of {}", scope));

    let effective = store.effective(&scope)?;
    let mut session = store.session(&scope)?;
    let width = effective.keys().map(|k| k.len()).max().unwrap_or(0);

    for (key, origin) in &effective {
        let shown = if raw {
            origin.value.clone()
        } else {
            match session.resolve(key) {
                Ok(value) => value,
                Err(e) => format!("{} {}", "✗".red(), e),
            }
        };
        let source = format!("({})", origin.defined_in.id());
        println!("  {:width$}  {}  {}", key, shown, source.dimmed(), width = width);
    }

    let runtime = session.runtime_references();
    if !runtime.is_empty() && !raw {
        println!();
        println!(
            "  {} {}",
            "runtime:".dimmed(),
            runtime.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }

    Ok(())
}
