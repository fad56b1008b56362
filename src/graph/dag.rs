// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Build dependency graph
//!
//! One node per build configuration and one edge per artifact dependency or
//! finish-build trigger, pointing from the upstream configuration to the one
//! that waits for it.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::debug;

use crate::errors::{ConfError, ConfResult, ReferenceKind};
use crate::model::BuildConfiguration;
use crate::registry::Registry;

/// Why one configuration waits for another
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Artifact dependency
    Artifact,
    /// Finish-build trigger
    FinishBuild,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Artifact => write!(f, "artifact"),
            Self::FinishBuild => write!(f, "finish_build"),
        }
    }
}

/// An upstream → downstream edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

/// A reference that names no existing entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingEdge {
    pub entity: String,
    pub reference: String,
    pub kind: ReferenceKind,
}

impl DanglingEdge {
    pub fn to_error(&self) -> ConfError {
        ConfError::DanglingReference {
            entity: self.entity.clone(),
            reference: self.reference.clone(),
            kind: self.kind,
        }
    }
}

/// Node payload
#[derive(Debug, Clone)]
pub(crate) struct BuildNode {
    pub(crate) id: String,
    pub(crate) name: String,
    has_triggers: bool,
    has_source_trigger: bool,
    has_dependencies: bool,
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    New,
    OnStack,
    Done,
}

/// Dependency and trigger graph over every build configuration
#[derive(Debug, Clone)]
pub struct BuildGraph {
    pub(crate) graph: DiGraph<BuildNode, EdgeKind>,
    name_to_index: HashMap<String, NodeIndex>,
    dangling: Vec<DanglingEdge>,
}

impl BuildGraph {
    /// Build the graph from the (template-merged) configurations of `registry`.
    ///
    /// Nodes are added in declaration order, so a node's index is its
    /// declaration position. Unknown templates or upstream configurations are
    /// recorded as dangling instead of failing.
    pub fn from_registry(registry: &Registry) -> Self {
        let mut graph = DiGraph::new();
        let mut name_to_index = HashMap::new();
        let mut dangling = Vec::new();

        let configs: Vec<BuildConfiguration> = registry
            .build_configs()
            .into_iter()
            .map(|bc| match registry.effective_build_config(&bc.id) {
                Ok(effective) => effective,
                Err(_) => {
                    if let Some(template) = &bc.template {
                        dangling.push(DanglingEdge {
                            entity: bc.id.clone(),
                            reference: template.clone(),
                            kind: ReferenceKind::Template,
                        });
                    }
                    bc.clone()
                }
            })
            .collect();

        for bc in &configs {
            let settings = &bc.settings;
            let node = graph.add_node(BuildNode {
                id: bc.id.clone(),
                name: bc.name.clone(),
                has_triggers: !settings.triggers.is_empty(),
                has_source_trigger: settings.triggers.iter().any(|t| t.is_source()),
                has_dependencies: !settings.dependencies.is_empty(),
            });
            name_to_index.insert(bc.id.clone(), node);
        }

        for bc in &configs {
            let downstream = name_to_index[&bc.id];
            let upstreams = bc
                .settings
                .dependencies
                .iter()
                .map(|d| (d.source.as_str(), EdgeKind::Artifact))
                .chain(
                    bc.settings
                        .triggers
                        .iter()
                        .filter_map(|t| t.upstream().map(|u| (u, EdgeKind::FinishBuild))),
                );

            for (upstream, kind) in upstreams {
                match name_to_index.get(upstream) {
                    Some(&from) => {
                        let exists = graph
                            .edges_connecting(from, downstream)
                            .any(|e| *e.weight() == kind);
                        if !exists {
                            graph.add_edge(from, downstream, kind);
                        }
                    }
                    None => dangling.push(DanglingEdge {
                        entity: bc.id.clone(),
                        reference: upstream.to_string(),
                        kind: ReferenceKind::UpstreamBuild,
                    }),
                }
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            dangling = dangling.len(),
            "built dependency graph"
        );

        Self {
            graph,
            name_to_index,
            dangling,
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.name_to_index.contains_key(id)
    }

    pub(crate) fn node(&self, id: &str) -> Option<&BuildNode> {
        self.name_to_index.get(id).map(|n| &self.graph[*n])
    }

    /// Node ids in declaration order
    pub fn ids(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .map(|n| self.graph[n].id.as_str())
            .collect()
    }

    /// Every edge, in insertion order
    pub fn edges(&self) -> Vec<GraphEdge> {
        self.graph
            .edge_references()
            .map(|e| GraphEdge {
                from: self.graph[e.source()].id.clone(),
                to: self.graph[e.target()].id.clone(),
                kind: *e.weight(),
            })
            .collect()
    }

    /// References to configurations or templates that do not exist
    pub fn dangling(&self) -> &[DanglingEdge] {
        &self.dangling
    }

    /// Fail with the first cycle found, if any
    pub fn validate(&self) -> ConfResult<()> {
        match self.cycles().into_iter().next() {
            Some(path) => Err(ConfError::CycleDetected { path }),
            None => Ok(()),
        }
    }

    /// Successor nodes, each once, in declaration order
    fn successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let set: BTreeSet<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect();
        set.into_iter().collect()
    }

    /// One cycle per back edge, found by depth-first search from each node in
    /// declaration order. Each path starts and ends with the same id.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut state = vec![Visit::New; self.graph.node_count()];
        let mut cycles = Vec::new();

        for start in self.graph.node_indices() {
            if state[start.index()] != Visit::New {
                continue;
            }

            state[start.index()] = Visit::OnStack;
            let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> =
                vec![(start, self.successors(start), 0)];

            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                let next = frame.1.get(frame.2).copied();
                frame.2 += 1;

                let Some(target) = next else {
                    state[node.index()] = Visit::Done;
                    stack.pop();
                    continue;
                };

                match state[target.index()] {
                    Visit::New => {
                        state[target.index()] = Visit::OnStack;
                        stack.push((target, self.successors(target), 0));
                    }
                    Visit::OnStack => {
                        let pos = stack
                            .iter()
                            .position(|(n, _, _)| *n == target)
                            .unwrap_or(0);
                        let mut path: Vec<String> = stack[pos..]
                            .iter()
                            .map(|(n, _, _)| self.graph[*n].id.clone())
                            .collect();
                        path.push(self.graph[target].id.clone());
                        cycles.push(path);
                    }
                    Visit::Done => {}
                }
            }
        }

        cycles
    }

    /// Ids in dependency order, ties broken by declaration order
    pub fn topological_order(&self) -> ConfResult<Vec<String>> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| self.graph.edges_directed(n, Direction::Incoming).count())
            .collect();

        let mut ready: BTreeSet<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|n| in_degree[n.index()] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(node) = ready.pop_first() {
            order.push(self.graph[node].id.clone());
            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                let target = edge.target();
                in_degree[target.index()] -= 1;
                if in_degree[target.index()] == 0 {
                    ready.insert(target);
                }
            }
        }

        if order.len() < self.graph.node_count() {
            let path = self.cycles().into_iter().next().unwrap_or_default();
            return Err(ConfError::CycleDetected { path });
        }

        Ok(order)
    }

    /// Configurations with neither triggers nor artifact dependencies
    pub fn isolated(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .map(|n| &self.graph[n])
            .filter(|n| !n.has_triggers && !n.has_dependencies)
            .map(|n| n.id.as_str())
            .collect()
    }

    /// Configurations started by a VCS or schedule trigger
    pub fn sources(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .map(|n| &self.graph[n])
            .filter(|n| n.has_source_trigger)
            .map(|n| n.id.as_str())
            .collect()
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Option<Vec<String>> {
        let node = self.name_to_index.get(id)?;
        let set: BTreeSet<NodeIndex> = self.graph.neighbors_directed(*node, direction).collect();
        Some(set.into_iter().map(|n| self.graph[n].id.clone()).collect())
    }

    /// Direct upstream configurations of `id`
    pub fn dependencies(&self, id: &str) -> Option<Vec<String>> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Direct downstream configurations of `id`
    pub fn dependents(&self, id: &str) -> Option<Vec<String>> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Whether `a` waits, directly or transitively, for `b`
    pub fn depends_on(&self, a: &str, b: &str) -> bool {
        let (Some(node_a), Some(node_b)) = (self.name_to_index.get(a), self.name_to_index.get(b))
        else {
            return false;
        };
        a != b && petgraph::algo::has_path_connecting(&self.graph, *node_b, *node_a, None)
    }
}
