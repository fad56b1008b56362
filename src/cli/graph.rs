// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Graph command - visualize the build dependency graph

use colored::Colorize;
use miette::Result;
use std::path::Path;

use super::{load_registry, GraphFormat};
use crate::graph::BuildGraph;

/// Run the graph command
pub async fn run(config: &Path, format: GraphFormat, verbose: bool) -> Result<()> {
    let registry = load_registry(config)?;
    let graph = BuildGraph::from_registry(&registry);

    let output = match format {
        GraphFormat::Text => graph.to_text()?,
        GraphFormat::Dot => graph.to_dot(),
        GraphFormat::Mermaid => graph.to_mermaid(),
    };

    print!("{}", output);

    // stdout carries only the rendering
    if verbose {
        for dangling in graph.dangling() {
            eprintln!("{} {}", "⚠".yellow(), dangling.to_error());
        }
    }

    Ok(())
}
