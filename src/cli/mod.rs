// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for ciconf.

pub mod cleanup;
pub mod graph;
pub mod params;
pub mod resolve;
pub mod tree;
pub mod validate;
pub mod watch;

use clap::{Parser, Subcommand, ValueEnum};
use miette::Result;
use std::path::{Path, PathBuf};

use crate::model::DeclarationSet;
use crate::registry::Registry;

/// CI configuration resolver
///
/// Load declarative project trees, validate them and resolve build
/// configurations into self-contained snapshots.
#[derive(Parser, Debug)]
#[clap(
    name = "ciconf",
    version,
    about = "Resolve declarative CI project trees into validated build pipeline snapshots",
    long_about = None,
    after_help = "Examples:\n\
        ciconf validate                       Check every declaration\n\
        ciconf resolve MavenBuild             Resolve one build configuration\n\
        ciconf resolve --all --format json    Resolve the whole pipeline\n\
        ciconf graph --format mermaid         Show the build graph\n\
        ciconf params MavenBuild              Show visible parameters\n\n\
        See 'ciconf <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Declaration file or directory
    #[clap(
        short,
        long,
        global = true,
        env = "CICONF_CONFIG",
        default_value = ".ciconf.yaml",
        value_name = "PATH"
    )]
    pub config: PathBuf,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate every declaration and report all problems
    Validate {
        /// Output format
        #[clap(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Resolve build configurations into snapshots
    Resolve {
        /// Build configuration id (omit with --all)
        #[clap(required_unless_present = "all")]
        id: Option<String>,

        /// Resolve every configuration in build order
        #[clap(short, long, conflicts_with = "id")]
        all: bool,

        /// Snapshot format
        #[clap(short, long, value_enum, default_value = "yaml")]
        format: SnapshotFormat,
    },

    /// Show the build dependency graph
    Graph {
        /// Output format
        #[clap(short, long, value_enum, default_value = "text")]
        format: GraphFormat,
    },

    /// Show parameters visible from a project, template or configuration
    Params {
        /// Entity id to resolve from
        scope: String,

        /// Single parameter to resolve
        key: Option<String>,

        /// Show raw values and where they are defined
        #[clap(long)]
        raw: bool,
    },

    /// Show the project tree
    Tree,

    /// Show the cleanup rules in force for an entity
    Cleanup {
        /// Project or build configuration id
        id: String,
    },

    /// Watch mode - re-validate on declaration changes
    Watch {
        /// Debounce delay in milliseconds
        #[clap(long, default_value = "500")]
        debounce: u64,
    },
}

/// Output format for validate
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Serialization format for snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SnapshotFormat {
    Yaml,
    Json,
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

/// Load declarations from `path` and build the registry
pub fn load_registry(path: &Path) -> Result<Registry> {
    let set = DeclarationSet::from_path(path)?;
    Ok(Registry::load(set)?)
}
