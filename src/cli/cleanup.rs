// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Cleanup command - show effective retention rules

use colored::Colorize;
use miette::Result;
use std::path::Path;

use super::load_registry;
use crate::model::StatusFilter;
use crate::utils::{print_header, print_info};

/// Run the cleanup command
pub async fn run(config: &Path, id: String, _verbose: bool) -> Result<()> {
    let registry = load_registry(config)?;
    let rules = registry.effective_cleanup(&id)?;

    print_header(&format!("Cleanup rules for {}", id));

    if rules.is_empty() {
        println!("  {}", "No cleanup rules apply; history is kept forever".dimmed());
        return Ok(());
    }

    for effective in &rules {
        let rule = &effective.rule;
        let mut line = format!("keep {}", rule.keep);
        match rule.status {
            StatusFilter::Any => {}
            StatusFilter::Successful => line.push_str(" of successful builds"),
            StatusFilter::Failed => line.push_str(" of failed builds"),
        }
        if !rule.tags.is_empty() {
            line.push_str(&format!(" tagged {}", rule.tags.join(", ")));
        }
        if rule.preserve_artifacts {
            line.push_str(", artifacts preserved");
        }

        let origin = match &rule.id {
            Some(rule_id) => format!("({} from {})", rule_id, effective.defined_in),
            None => format!("(from {})", effective.defined_in),
        };
        print_info(&format!("{} {}", line, origin.dimmed()));
    }

    Ok(())
}
