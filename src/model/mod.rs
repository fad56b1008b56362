// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Declaration data model
//!
//! Plain serde structs for every entity a declaration set can contain.
//! Nothing here resolves or validates; see `registry` and `resolve`.

mod build;
mod declarations;
mod project;
mod vcs;

pub use build::*;
pub use declarations::{DeclarationSet, ResolverSettings, DECLARATION_EXTENSIONS};
pub use project::*;
pub use vcs::*;
