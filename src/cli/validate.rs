// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Validate command - check every declaration

use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use super::{load_registry, OutputFormat};
use crate::registry::Registry;
use crate::resolve::{ValidationReport, Validator};
use crate::utils::{print_diagnostic, print_section, print_success};

/// Run the validate command
pub async fn run(config: &Path, format: OutputFormat, verbose: bool) -> Result<()> {
    let registry = load_registry(config)?;
    let report = Validator::new(&registry).run();

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Text => print_report(&registry, &report, verbose),
    }

    if report.is_valid() {
        Ok(())
    } else {
        Err(miette::miette!(
            "Validation failed with {} error(s)",
            report.errors().count()
        ))
    }
}

fn print_report(registry: &Registry, report: &ValidationReport, verbose: bool) {
    println!("{}", "Validating declarations...".bold());
    println!();
    print_success(&format!(
        "Loaded {} project(s), {} build configuration(s)",
        registry.projects().len(),
        registry.build_configs().len()
    ));

    if report.errors().next().is_some() {
        print_section(&"Errors".red().bold().to_string());
        for diagnostic in report.errors() {
            print_diagnostic(diagnostic, verbose);
        }
    }

    if report.has_warnings() {
        print_section(&"Warnings".yellow().bold().to_string());
        for diagnostic in report.warnings() {
            print_diagnostic(diagnostic, verbose);
        }
    }

    println!();
    if !report.is_valid() {
        return;
    }
    if report.has_warnings() {
        println!("{}", "Declarations are valid but have warnings.".yellow().bold());
    } else {
        println!("{}", "Declarations are valid!".green().bold());
    }
}
