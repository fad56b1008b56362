// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! # ciconf - CI configuration resolver
//!
//! `ciconf` loads a declarative tree of CI projects, build configurations,
//! templates, VCS roots and agent pools, then resolves each build
//! configuration into a self-contained, deterministic snapshot.
//!
//! ## Features
//!
//! - **Hierarchical parameters** - `%name%` references resolved against the
//!   closest enclosing scope
//! - **Template inheritance** - keyed merge of steps, triggers and dependencies
//! - **Build graph** - artifact and finish-build dependencies with cycle detection
//! - **Validation** - every problem reported at once, in declaration order
//!
//! ## Quick Start
//!
//! ```bash
//! # Check every declaration
//! ciconf validate -c demos/business-unit.yaml
//!
//! # Resolve one build configuration
//! ciconf resolve MavenBuild -c demos/business-unit.yaml
//!
//! # Show the build graph
//! ciconf graph --format mermaid -c demos/business-unit.yaml
//! ```
//!
//! ## Library use
//!
//! ```no_run
//! use ciconf::{DeclarationSet, Registry, Resolver};
//! use std::path::Path;
//!
//! # fn main() -> ciconf::ConfResult<()> {
//! let set = DeclarationSet::from_path(Path::new(".ciconf.yaml"))?;
//! let registry = Registry::load(set)?;
//! let pipeline = Resolver::new(&registry).resolve_pipeline()?;
//! println!("{}", pipeline.to_yaml()?);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod errors;
pub mod graph;
pub mod model;
pub mod params;
pub mod registry;
pub mod resolve;
pub mod utils;

// Re-export commonly used types
pub use errors::{ConfError, ConfResult};
pub use graph::BuildGraph;
pub use model::DeclarationSet;
pub use registry::Registry;
pub use resolve::{validate, Diagnostic, PipelineSnapshot, ResolvedBuildConfig, Resolver};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
