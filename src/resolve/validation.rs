// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Whole-registry validation
//!
//! Unlike resolution, validation does not stop at the first problem: it
//! collects every error and warning it can find, in declaration order.

use miette::Diagnostic as MietteDiagnostic;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use super::engine::Resolver;
use crate::errors::{ConfError, ReferenceKind};
use crate::model::Runner;
use crate::params::{ParameterStore, Scope};
use crate::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Stable code, e.g. `ciconf::cycle_detected`
    pub code: String,
    /// Entity the finding is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl Diagnostic {
    /// An error finding from `err`; `context` names the entity being checked
    pub fn from_error(err: &ConfError, context: Option<&str>) -> Self {
        Self {
            severity: Severity::Error,
            code: err
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "ciconf::error".to_string()),
            entity: context.or_else(|| err.entity()).map(String::from),
            message: err.to_string(),
            help: err.help().map(|h| h.to_string()),
        }
    }

    pub fn warning(code: &str, entity: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: format!("ciconf::{}", code),
            entity: Some(entity.to_string()),
            message: message.into(),
            help: None,
        }
    }

    pub fn isolated(id: &str) -> Self {
        Self::warning(
            "isolated_configuration",
            id,
            format!(
                "Build configuration '{}' has no triggers and no dependencies; it only runs when started manually",
                id
            ),
        )
    }

    pub fn no_compatible_pool(id: &str) -> Self {
        Self::warning(
            "no_compatible_pool",
            id,
            format!("No declared agent pool satisfies every requirement of '{}'", id),
        )
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.severity, self.code)?;
        if let Some(entity) = &self.entity {
            write!(f, " {}", entity)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Result of validating a registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, err: &ConfError, context: Option<&str>) {
        self.diagnostics.push(Diagnostic::from_error(err, context));
    }

    pub fn add_warning(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }
}

/// Collect every diagnostic for `registry`, errors first
pub fn validate(registry: &Registry) -> Vec<Diagnostic> {
    Validator::new(registry).run().diagnostics
}

/// Registry validator
pub struct Validator<'r> {
    resolver: Resolver<'r>,
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            resolver: Resolver::new(registry),
        }
    }

    pub fn run(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        let registry = self.resolver.registry();
        let graph = self.resolver.graph();

        for dangling in graph.dangling() {
            report.add_error(&dangling.to_error(), Some(&dangling.entity));
        }

        for path in graph.cycles() {
            report.add_error(&ConfError::CycleDetected { path }, None);
        }

        let mut attached_roots = BTreeSet::new();
        let mut used_templates = BTreeSet::new();

        for bc in registry.build_configs() {
            if let Some(template) = &bc.template {
                used_templates.insert(template.as_str());
            }

            // A missing template is already reported by the graph
            let Ok(effective) = registry.effective_build_config(&bc.id) else {
                continue;
            };

            for attachment in &effective.settings.vcs {
                attached_roots.insert(attachment.root.clone());
            }

            for step in &effective.settings.steps {
                if let Runner::Script { content } = &step.runner {
                    if content.trim().is_empty() {
                        report.add_warning(Diagnostic::warning(
                            "empty_script",
                            &bc.id,
                            format!("Step '{}' of '{}' has an empty script", step.label(), bc.id),
                        ));
                    }
                }
            }

            let dangling = self.resolver.dangling_references(&effective);
            if !dangling.is_empty() {
                for err in dangling.iter().filter(|e| {
                    matches!(
                        e,
                        ConfError::DanglingReference {
                            kind: ReferenceKind::VcsRoot,
                            ..
                        }
                    )
                }) {
                    report.add_error(err, Some(&bc.id));
                }
                continue;
            }

            match self.resolver.resolve_configuration(&bc.id) {
                Ok(snapshot) => {
                    if registry.agent_pools().next().is_some()
                        && snapshot.compatible_pools.is_empty()
                    {
                        report.add_warning(Diagnostic::no_compatible_pool(&bc.id));
                    }
                }
                Err(err) => report.add_error(&err, Some(&bc.id)),
            }
        }

        self.check_project_params(&mut report);

        for id in graph.isolated() {
            report.add_warning(Diagnostic::isolated(id));
        }

        for root in registry.vcs_roots() {
            if !attached_roots.contains(&root.id) {
                report.add_warning(Diagnostic::warning(
                    "unused_vcs_root",
                    &root.id,
                    format!("VCS root '{}' is not attached to any build configuration", root.id),
                ));
            }
        }

        for template in registry.templates() {
            if !used_templates.contains(template.id.as_str()) {
                report.add_warning(Diagnostic::warning(
                    "unused_template",
                    &template.id,
                    format!("Template '{}' is not used by any build configuration", template.id),
                ));
            }
        }

        report.diagnostics.sort_by_key(|d| d.severity);
        report
    }

    /// Parameters of projects without build configurations are never
    /// resolved otherwise
    fn check_project_params(&self, report: &mut ValidationReport) {
        let registry = self.resolver.registry();
        let store = ParameterStore::new(registry);

        for project in registry.projects() {
            let empty = registry
                .descendant_build_configs(&project.id)
                .map(|bcs| bcs.is_empty())
                .unwrap_or(false);
            if !empty {
                continue;
            }

            let mut session = match store.session(&Scope::Project(project.id.clone())) {
                Ok(session) => session,
                Err(err) => {
                    report.add_error(&err, Some(&project.id));
                    continue;
                }
            };

            // Inherited keys are checked where they are declared
            for key in project.params.keys() {
                if let Err(err) = session.resolve(key) {
                    report.add_error(&err, Some(&project.id));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeclarationSet;

    fn load(yaml: &str) -> Registry {
        Registry::load(DeclarationSet::from_yaml(yaml).unwrap()).unwrap()
    }

    const BROKEN: &str = r#"
projects:
  - id: _Root
    name: Root
    params:
      a: "%b%"
      b: "%a%"
    vcs_roots:
      - { id: Unused, url: "https://example.com/unused.git" }
    templates:
      - { id: Orphan }
    projects:
      - id: Empty
        name: Empty
        params:
          broken: "%missing.key%"
      - id: Apps
        name: Apps
        build_configs:
          - id: A
            name: A
            dependencies: [{ source: B }]
            vcs: [{ root: NoSuchRoot }]
          - id: B
            name: B
            dependencies: [{ source: A }]
            triggers: [{ type: finish_build, upstream: Ghost }]
          - id: Lonely
            name: Lonely
            steps:
              - runner: { type: script, content: "  " }
"#;

    fn codes(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.code.as_str()).collect()
    }

    #[test]
    fn test_collects_all_problems() {
        let registry = load(BROKEN);
        let diagnostics = validate(&registry);
        let codes = codes(&diagnostics);

        assert!(codes.contains(&"ciconf::dangling_reference"));
        assert!(codes.contains(&"ciconf::cycle_detected"));
        assert!(codes.contains(&"ciconf::cyclic_reference"));
        assert!(codes.contains(&"ciconf::unresolved_parameter"));
        assert!(codes.contains(&"ciconf::isolated_configuration"));
        assert!(codes.contains(&"ciconf::unused_vcs_root"));
        assert!(codes.contains(&"ciconf::unused_template"));
        assert!(codes.contains(&"ciconf::empty_script"));

        let dangling: Vec<_> = diagnostics
            .iter()
            .filter(|d| d.code == "ciconf::dangling_reference")
            .filter_map(|d| d.entity.as_deref())
            .collect();
        assert_eq!(dangling, vec!["B", "A"]);

        let cycle = diagnostics
            .iter()
            .find(|d| d.code == "ciconf::cycle_detected")
            .unwrap();
        assert!(cycle.message.contains("A → B → A"));
    }

    #[test]
    fn test_errors_sorted_before_warnings() {
        let diagnostics = validate(&load(BROKEN));
        let first_warning = diagnostics.iter().position(|d| !d.is_error()).unwrap();
        assert!(diagnostics[first_warning..].iter().all(|d| !d.is_error()));
    }

    #[test]
    fn test_validate_is_idempotent() {
        let registry = load(BROKEN);
        assert_eq!(validate(&registry), validate(&registry));

        let reloaded = load(BROKEN);
        assert_eq!(validate(&registry), validate(&reloaded));
    }

    #[test]
    fn test_clean_registry_is_valid() {
        let registry = load(
            r#"
projects:
  - id: _Root
    name: Root
    params:
      unit: tb
    vcs_roots:
      - { id: Repo, url: "https://example.com/%unit%.git" }
    build_configs:
      - id: Build
        name: Build
        vcs: [{ root: Repo }]
        triggers: [{ type: vcs }]
        steps:
          - runner: { type: script, content: "make VERSION=%build.number%" }
"#,
        );

        let report = Validator::new(&registry).run();
        assert!(report.is_valid(), "{:?}", report.diagnostics);
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic::isolated("Backup");
        assert!(diagnostic
            .to_string()
            .starts_with("warning[ciconf::isolated_configuration] Backup:"));
    }
}
