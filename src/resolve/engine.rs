// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Resolution engine

use tracing::{debug, info};

use super::expand::Interpolate;
use super::snapshot::{PipelineSnapshot, ResolvedBuildConfig, ResolvedVcs};
use super::validation::Diagnostic;
use crate::errors::{ConfError, ConfResult, ReferenceKind};
use crate::graph::BuildGraph;
use crate::model::{AgentRequirement, BuildConfiguration};
use crate::params::{ParameterStore, Scope};
use crate::registry::Registry;

/// Produces resolved snapshots from a loaded registry
pub struct Resolver<'r> {
    registry: &'r Registry,
    graph: BuildGraph,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            graph: BuildGraph::from_registry(registry),
        }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn graph(&self) -> &BuildGraph {
        &self.graph
    }

    /// Every reference of `config` that names a missing VCS root or
    /// upstream configuration
    pub fn dangling_references(&self, config: &BuildConfiguration) -> Vec<ConfError> {
        let settings = &config.settings;
        let dangling = |reference: &str, kind| ConfError::DanglingReference {
            entity: config.id.clone(),
            reference: reference.to_string(),
            kind,
        };

        let roots = settings
            .vcs
            .iter()
            .filter(|v| self.registry.vcs_root(&v.root).is_none())
            .map(|v| dangling(&v.root, ReferenceKind::VcsRoot));

        let upstreams = settings
            .dependencies
            .iter()
            .map(|d| d.source.as_str())
            .chain(settings.triggers.iter().filter_map(|t| t.upstream()))
            .filter(|u| self.registry.build_config(u).is_none())
            .map(|u| dangling(u, ReferenceKind::UpstreamBuild));

        roots.chain(upstreams).collect()
    }

    /// Fail on the first dangling reference of `config`
    pub fn check_references(&self, config: &BuildConfiguration) -> ConfResult<()> {
        match self.dangling_references(config).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Declared agent pools satisfying all of `requirements`
    pub fn compatible_pools(&self, requirements: &[AgentRequirement]) -> Vec<String> {
        self.registry
            .agent_pools()
            .filter(|pool| requirements.iter().all(|r| r.is_satisfied_by(&pool.properties)))
            .map(|pool| pool.id.clone())
            .collect()
    }

    /// Resolve one build configuration into a snapshot
    pub fn resolve_configuration(&self, id: &str) -> ConfResult<ResolvedBuildConfig> {
        let registry = self.registry;
        let effective = registry.effective_build_config(id)?;
        self.check_references(&effective)?;

        let store = ParameterStore::new(registry);
        let mut session = store.session(&Scope::BuildConfiguration(id.to_string()))?;
        let settings = &effective.settings;

        let params = session.resolve_all()?;

        let mut vcs = Vec::with_capacity(settings.vcs.len());
        for attachment in &settings.vcs {
            let root = registry.vcs_root(&attachment.root).ok_or_else(|| {
                ConfError::DanglingReference {
                    entity: id.to_string(),
                    reference: attachment.root.clone(),
                    kind: ReferenceKind::VcsRoot,
                }
            })?;
            let attachment = attachment.interpolate(&mut session)?;
            vcs.push(ResolvedVcs {
                root: root.interpolate(&mut session)?,
                clean_checkout: attachment.clean_checkout,
                checkout_rules: attachment.checkout_rules,
            });
        }

        let steps = settings.steps.interpolate(&mut session)?;
        let triggers = settings.triggers.interpolate(&mut session)?;
        let dependencies = settings.dependencies.interpolate(&mut session)?;
        let requirements = settings.requirements.interpolate(&mut session)?;
        let artifact_rules = settings.artifact_rules.interpolate(&mut session)?;
        let features = settings.features.interpolate(&mut session)?;

        check_patterns(id, &requirements)?;
        self.check_agent_properties(id, &requirements)?;
        let compatible_pools = self.compatible_pools(&requirements);

        let project_path: Vec<String> = registry
            .project_path(id)?
            .into_iter()
            .map(|p| p.id.clone())
            .collect();

        let snapshot = ResolvedBuildConfig {
            id: effective.id.clone(),
            name: effective.name.clone(),
            description: effective.description.clone(),
            project: project_path.last().cloned().unwrap_or_default(),
            project_path,
            template: effective.template.clone(),
            params,
            vcs,
            steps,
            triggers,
            dependencies,
            upstream: self.graph.dependencies(id).unwrap_or_default(),
            requirements,
            compatible_pools,
            artifact_rules,
            features,
            failure_conditions: settings.failure_conditions.clone(),
            cleanup: registry.effective_cleanup(id)?,
            runtime_parameters: session.runtime_references().clone(),
        };

        debug!(
            id = %id,
            params = snapshot.params.len(),
            steps = snapshot.steps.len(),
            "resolved configuration"
        );
        Ok(snapshot)
    }

    /// With agent pools declared, every property a requirement inspects must
    /// be reported by at least one pool
    fn check_agent_properties(&self, id: &str, requirements: &[AgentRequirement]) -> ConfResult<()> {
        let pools: Vec<_> = self.registry.agent_pools().collect();
        if pools.is_empty() {
            return Ok(());
        }

        for requirement in requirements.iter().filter(|r| !r.expects_absence()) {
            let property = requirement.property();
            if !pools.iter().any(|p| p.properties.contains_key(property)) {
                return Err(ConfError::DanglingReference {
                    entity: id.to_string(),
                    reference: property.to_string(),
                    kind: ReferenceKind::AgentProperty,
                });
            }
        }

        Ok(())
    }

    /// Resolve every configuration in build order
    pub fn resolve_pipeline(&self) -> ConfResult<PipelineSnapshot> {
        self.graph.validate()?;
        let order = self.graph.topological_order()?;

        let configurations = order
            .iter()
            .map(|id| self.resolve_configuration(id))
            .collect::<ConfResult<Vec<_>>>()?;

        let mut warnings: Vec<Diagnostic> = self
            .graph
            .isolated()
            .into_iter()
            .map(Diagnostic::isolated)
            .collect();
        if self.registry.agent_pools().next().is_some() {
            warnings.extend(
                configurations
                    .iter()
                    .filter(|c| c.compatible_pools.is_empty())
                    .map(|c| Diagnostic::no_compatible_pool(&c.id)),
            );
        }

        info!(
            configurations = configurations.len(),
            edges = self.graph.edges().len(),
            warnings = warnings.len(),
            "resolved pipeline"
        );

        Ok(PipelineSnapshot {
            order,
            configurations,
            edges: self.graph.edges(),
            warnings,
        })
    }
}

/// `matches` requirements must carry a valid regex once interpolated
fn check_patterns(id: &str, requirements: &[AgentRequirement]) -> ConfResult<()> {
    for requirement in requirements {
        if let AgentRequirement::Matches { name, pattern } = requirement {
            regex::Regex::new(pattern).map_err(|e| ConfError::InvalidDeclaration {
                reason: format!(
                    "Build configuration '{}' requires '{}' to match invalid pattern '{}': {}",
                    id, name, pattern, e
                ),
                help: Some("Fix the `pattern` of the `matches` requirement".to_string()),
            })?;
        }
    }
    Ok(())
}
