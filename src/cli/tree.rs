// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Tree command - print the project hierarchy

use colored::Colorize;
use miette::Result;
use std::path::Path;

use super::load_registry;
use crate::errors::{ConfError, ConfResult, EntityKind};
use crate::registry::Registry;

/// Run the tree command
pub async fn run(config: &Path, verbose: bool) -> Result<()> {
    let registry = load_registry(config)?;
    let mut out = String::new();
    render(&registry, &registry.root().id, "", true, true, verbose, &mut out)?;
    print!("{}", out);
    Ok(())
}

fn render(
    registry: &Registry,
    id: &str,
    prefix: &str,
    last: bool,
    root: bool,
    verbose: bool,
    out: &mut String,
) -> ConfResult<()> {
    let project = registry
        .project(id)
        .ok_or_else(|| ConfError::UnknownEntity { id: id.to_string() })?;

    let (branch, child_prefix) = if root {
        (String::new(), String::new())
    } else if last {
        (format!("{}└── ", prefix), format!("{}    ", prefix))
    } else {
        (format!("{}├── ", prefix), format!("{}│   ", prefix))
    };
    out.push_str(&format!("{}{} {}\n", branch, project.id.bold(), project.name.dimmed()));

    let owned: Vec<_> = registry
        .owned_by(id)?
        .into_iter()
        .filter(|(_, kind)| verbose || *kind == EntityKind::BuildConfiguration)
        .collect();
    let children = registry.children(id)?;

    for (i, (entity, kind)) in owned.iter().enumerate() {
        let is_last = i + 1 == owned.len() && children.is_empty();
        let connector = if is_last { "└── " } else { "├── " };
        let label = match kind {
            EntityKind::BuildConfiguration => entity.green().to_string(),
            other => format!("{} {}", entity, format!("[{}]", other).dimmed()),
        };
        out.push_str(&format!("{}{}{}\n", child_prefix, connector, label));
    }

    for (i, child) in children.iter().enumerate() {
        render(
            registry,
            &child.id,
            &child_prefix,
            i + 1 == children.len(),
            false,
            verbose,
            out,
        )?;
    }

    Ok(())
}
