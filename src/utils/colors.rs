// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Terminal output helpers
//!
//! Provides consistent styling across the CLI.

use colored::Colorize;

use crate::errors::{ConfError, RecoverySuggestion};
use crate::resolve::{Diagnostic, Severity};

/// Print a styled header
pub fn print_header(title: &str) {
    println!("{}", title.bold());
    println!("{}", "═".repeat(title.chars().count().max(40)));
}

/// Print a styled section
pub fn print_section(title: &str) {
    println!();
    println!("{}:", title.bold());
}

/// Print a success check
pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green(), msg);
}

/// Print an error cross
pub fn print_error(msg: &str) {
    println!("  {} {}", "✗".red(), msg);
}

/// Print a warning
pub fn print_warning(msg: &str) {
    println!("  {} {}", "⚠".yellow(), msg);
}

/// Print an info item
pub fn print_info(msg: &str) {
    println!("  {} {}", "→".blue(), msg);
}

/// Print a validation finding, with its help text when verbose
pub fn print_diagnostic(diagnostic: &Diagnostic, verbose: bool) {
    let location = diagnostic
        .entity
        .as_deref()
        .map(|e| format!("{} ", e.cyan()))
        .unwrap_or_default();
    let line = format!("{}{}", location, diagnostic.message);

    match diagnostic.severity {
        Severity::Error => print_error(&line),
        Severity::Warning => print_warning(&line),
    }

    if verbose {
        println!("      {}", diagnostic.code.dimmed());
        if let Some(help) = &diagnostic.help {
            println!("      {} {}", "help:".blue(), help);
        }
    }
}

/// Print a recovery suggestion block
pub fn print_suggestion(suggestion: &RecoverySuggestion) {
    println!();
    println!("{} {}", "Suggestion:".blue().bold(), suggestion.action);
    for step in &suggestion.steps {
        println!("  • {}", step);
    }
    for command in &suggestion.commands {
        println!("    {}", command.cyan());
    }
}

/// Print the suggestion for `err`, if there is one
pub fn print_error_suggestion(err: &ConfError) {
    if let Some(suggestion) = err.suggestion() {
        print_suggestion(&suggestion);
    }
}
