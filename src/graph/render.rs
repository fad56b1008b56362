// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Text, DOT and Mermaid renderings of the build graph

use petgraph::visit::EdgeRef;

use super::dag::{BuildGraph, EdgeKind};
use crate::errors::ConfResult;

impl BuildGraph {
    /// Numbered build order with each configuration's upstreams
    pub fn to_text(&self) -> ConfResult<String> {
        let order = self.topological_order()?;
        let isolated = self.isolated();
        let mut out = String::new();

        for (i, id) in order.iter().enumerate() {
            let name = self
                .node(id)
                .map(|n| n.name.as_str())
                .unwrap_or(id.as_str());
            out.push_str(&format!("{}. {} ({})", i + 1, id, name));

            let upstream = self.dependencies(id).unwrap_or_default();
            if !upstream.is_empty() {
                out.push_str(&format!(" [after: {}]", upstream.join(", ")));
            }
            if isolated.contains(&id.as_str()) {
                out.push_str(" [manual]");
            }
            out.push('\n');
        }

        Ok(out)
    }

    /// Graphviz DOT; finish-build edges are dashed
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph builds {\n");
        out.push_str("    rankdir=LR;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for node in self.graph.node_indices() {
            let weight = &self.graph[node];
            out.push_str(&format!(
                "    \"{}\" [label=\"{}\"];\n",
                weight.id,
                escape_dot(&weight.name)
            ));
        }

        if self.graph.edge_count() > 0 {
            out.push('\n');
        }

        for edge in self.graph.edge_references() {
            let from = &self.graph[edge.source()].id;
            let to = &self.graph[edge.target()].id;
            match edge.weight() {
                EdgeKind::Artifact => {
                    out.push_str(&format!("    \"{}\" -> \"{}\";\n", from, to));
                }
                EdgeKind::FinishBuild => {
                    out.push_str(&format!(
                        "    \"{}\" -> \"{}\" [style=dashed, label=\"finish\"];\n",
                        from, to
                    ));
                }
            }
        }

        out.push_str("}\n");
        out
    }

    /// Mermaid flowchart; finish-build edges are dotted
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for node in self.graph.node_indices() {
            let weight = &self.graph[node];
            out.push_str(&format!(
                "    {}[\"{}\"]\n",
                weight.id,
                weight.name.replace('"', "#quot;")
            ));
        }

        for edge in self.graph.edge_references() {
            let from = &self.graph[edge.source()].id;
            let to = &self.graph[edge.target()].id;
            let arrow = match edge.weight() {
                EdgeKind::Artifact => "-->|artifacts|",
                EdgeKind::FinishBuild => "-.->|finish|",
            };
            out.push_str(&format!("    {} {} {}\n", from, arrow, to));
        }

        out
    }
}

fn escape_dot(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
