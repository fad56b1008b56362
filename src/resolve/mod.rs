// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Resolution of build configurations into snapshots, and validation

mod engine;
mod expand;
mod snapshot;
mod validation;

pub use engine::Resolver;
pub use expand::Interpolate;
pub use snapshot::{PipelineSnapshot, ResolvedBuildConfig, ResolvedVcs};
pub use validation::{validate, Diagnostic, Severity, ValidationReport, Validator};
