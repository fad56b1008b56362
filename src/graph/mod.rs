// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Build dependency & trigger graph

mod dag;
mod render;

pub use dag::{BuildGraph, DanglingEdge, EdgeKind, GraphEdge};
