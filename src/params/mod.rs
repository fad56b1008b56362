// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Hierarchical parameters and `%placeholder%` interpolation

pub mod interpolate;
mod store;

pub use store::{ParamOrigin, ParamSession, ParameterStore, Scope};
