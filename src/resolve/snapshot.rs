// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Resolved, self-contained configuration snapshots

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::validation::Diagnostic;
use crate::errors::ConfResult;
use crate::graph::GraphEdge;
use crate::model::{
    AgentRequirement, ArtifactDependency, ArtifactRule, FailureConditions, Feature, Step, Trigger,
    VcsRoot,
};
use crate::registry::EffectiveCleanupRule;

/// A VCS root attached to a resolved configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedVcs {
    #[serde(flatten)]
    pub root: VcsRoot,
    pub clean_checkout: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checkout_rules: Vec<String>,
}

/// A build configuration with its template merged and every placeholder
/// substituted, except runtime parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedBuildConfig {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Owning project
    pub project: String,
    /// Root-first project ids down to the owner
    pub project_path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Every visible parameter, resolved
    pub params: BTreeMap<String, String>,
    pub vcs: Vec<ResolvedVcs>,
    pub steps: Vec<Step>,
    pub triggers: Vec<Trigger>,
    pub dependencies: Vec<ArtifactDependency>,
    /// Direct upstream configurations
    pub upstream: Vec<String>,
    pub requirements: Vec<AgentRequirement>,
    /// Declared agent pools meeting every requirement
    pub compatible_pools: Vec<String>,
    pub artifact_rules: Vec<ArtifactRule>,
    pub features: Vec<Feature>,
    pub failure_conditions: FailureConditions,
    pub cleanup: Vec<EffectiveCleanupRule>,
    /// Runtime parameters left as placeholders
    pub runtime_parameters: BTreeSet<String>,
}

impl ResolvedBuildConfig {
    /// BLAKE3 hash of the canonical JSON form
    pub fn fingerprint(&self) -> ConfResult<String> {
        fingerprint(self)
    }

    pub fn to_yaml(&self) -> ConfResult<String> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    pub fn to_json(&self) -> ConfResult<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }
}

/// Every configuration resolved, in build order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSnapshot {
    /// Configuration ids in topological order
    pub order: Vec<String>,
    pub configurations: Vec<ResolvedBuildConfig>,
    pub edges: Vec<GraphEdge>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Diagnostic>,
}

impl PipelineSnapshot {
    /// Snapshot of configuration `id`, if part of the pipeline
    pub fn get(&self, id: &str) -> Option<&ResolvedBuildConfig> {
        self.configurations.iter().find(|c| c.id == id)
    }

    /// BLAKE3 hash over configurations and edges; warnings do not count
    pub fn fingerprint(&self) -> ConfResult<String> {
        fingerprint(&(&self.configurations, &self.edges))
    }

    pub fn to_yaml(&self) -> ConfResult<String> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    pub fn to_json(&self) -> ConfResult<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }
}

fn fingerprint<T: Serialize>(value: &T) -> ConfResult<String> {
    let canonical = serde_json::to_vec(value)?;
    Ok(blake3::hash(&canonical).to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: &str, param: &str) -> ResolvedBuildConfig {
        ResolvedBuildConfig {
            id: id.into(),
            name: id.into(),
            description: None,
            project: "_Root".into(),
            project_path: vec!["_Root".into()],
            template: None,
            params: [("x".to_string(), param.to_string())].into_iter().collect(),
            vcs: vec![],
            steps: vec![],
            triggers: vec![],
            dependencies: vec![],
            upstream: vec![],
            requirements: vec![],
            compatible_pools: vec![],
            artifact_rules: vec![],
            features: vec![],
            failure_conditions: FailureConditions::default(),
            cleanup: vec![],
            runtime_parameters: BTreeSet::new(),
        }
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = snapshot("Build", "1");
        let b = snapshot("Build", "1");
        let c = snapshot("Build", "2");

        let fp = a.fingerprint().unwrap();
        assert_eq!(fp.len(), 64);
        assert_eq!(fp, b.fingerprint().unwrap());
        assert_ne!(fp, c.fingerprint().unwrap());
    }

    #[test]
    fn test_serialized_forms() {
        let snap = snapshot("Build", "1");
        let yaml = snap.to_yaml().unwrap();
        assert!(yaml.contains("id: Build"));
        assert!(!yaml.contains("description"));

        let json: serde_json::Value = serde_json::from_str(&snap.to_json().unwrap()).unwrap();
        assert_eq!(json["params"]["x"], "1");
        assert_eq!(json["project_path"][0], "_Root");
    }
}
