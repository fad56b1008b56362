// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Utility modules
//!
//! Common utilities for the ciconf CLI.

pub mod colors;

pub use colors::*;
