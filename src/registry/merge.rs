// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Template inheritance

use super::Registry;
use crate::errors::{ConfError, ConfResult, ReferenceKind};
use crate::model::{BuildConfiguration, BuildSettings, FailureConditions};

impl Registry {
    /// Build configuration `id` with its template merged in
    pub fn effective_build_config(&self, id: &str) -> ConfResult<BuildConfiguration> {
        let bc = self
            .build_config(id)
            .ok_or_else(|| ConfError::UnknownEntity { id: id.to_string() })?;

        let Some(template_id) = &bc.template else {
            return Ok(bc.clone());
        };

        let template = self
            .template(template_id)
            .ok_or_else(|| ConfError::DanglingReference {
                entity: id.to_string(),
                reference: template_id.clone(),
                kind: ReferenceKind::Template,
            })?;

        Ok(BuildConfiguration {
            settings: merge_settings(&template.settings, &bc.settings, &bc.disabled),
            ..bc.clone()
        })
    }
}

/// Merge `local` settings over `inherited` ones.
///
/// Keyed entries replace their inherited counterpart in place, new ones are
/// appended. Inherited entries whose key is in `disabled` are dropped first.
pub fn merge_settings(
    inherited: &BuildSettings,
    local: &BuildSettings,
    disabled: &[String],
) -> BuildSettings {
    let is_disabled = |key: Option<&str>| key.is_some_and(|k| disabled.iter().any(|d| d == k));

    let mut params = inherited.params.clone();
    params.extend(local.params.iter().map(|(k, v)| (k.clone(), v.clone())));

    BuildSettings {
        params,
        vcs: merge_keyed(&inherited.vcs, &local.vcs, |v| Some(v.root.as_str()), is_disabled),
        steps: merge_keyed(&inherited.steps, &local.steps, |s| s.id.as_deref(), is_disabled),
        triggers: merge_keyed(&inherited.triggers, &local.triggers, |t| t.id(), is_disabled),
        dependencies: merge_keyed(
            &inherited.dependencies,
            &local.dependencies,
            |d| Some(d.source.as_str()),
            is_disabled,
        ),
        requirements: merge_keyed(
            &inherited.requirements,
            &local.requirements,
            |r| Some(r.property()),
            is_disabled,
        ),
        artifact_rules: replace_unless_empty(&inherited.artifact_rules, &local.artifact_rules),
        features: merge_keyed(&inherited.features, &local.features, |f| f.id.as_deref(), is_disabled),
        failure_conditions: merge_failure_conditions(
            &inherited.failure_conditions,
            &local.failure_conditions,
        ),
    }
}

fn merge_keyed<T: Clone>(
    inherited: &[T],
    local: &[T],
    key: impl Fn(&T) -> Option<&str>,
    is_disabled: impl Fn(Option<&str>) -> bool,
) -> Vec<T> {
    let mut out: Vec<T> = inherited
        .iter()
        .filter(|item| !is_disabled(key(item)))
        .cloned()
        .collect();

    for item in local {
        let existing = key(item).and_then(|k| out.iter().position(|o| key(o) == Some(k)));
        match existing {
            Some(pos) => out[pos] = item.clone(),
            None => out.push(item.clone()),
        }
    }

    out
}

fn replace_unless_empty<T: Clone>(inherited: &[T], local: &[T]) -> Vec<T> {
    if local.is_empty() {
        inherited.to_vec()
    } else {
        local.to_vec()
    }
}

fn merge_failure_conditions(
    inherited: &FailureConditions,
    local: &FailureConditions,
) -> FailureConditions {
    FailureConditions {
        error_message: local.error_message.or(inherited.error_message),
        nonzero_exit_code: local.nonzero_exit_code.or(inherited.nonzero_exit_code),
        execution_timeout_min: local.execution_timeout_min.or(inherited.execution_timeout_min),
        metric_changes: replace_unless_empty(&inherited.metric_changes, &local.metric_changes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeclarationSet, Runner};

    const DECLS: &str = r#"
projects:
  - id: _Root
    name: Root
    templates:
      - id: MavenTemplate
        params:
          maven.goals: clean package
          java.version: "11"
        steps:
          - id: build
            runner: { type: maven, goals: "%maven.goals%" }
          - id: report
            runner: { type: script, content: echo report }
        triggers:
          - id: onCommit
            type: vcs
        requirements:
          - kind: exists
            name: env.JAVA_HOME
        artifact_rules: ["target/*.jar"]
        failure_conditions:
          nonzero_exit_code: true
          execution_timeout_min: 30
    build_configs:
      - id: Build
        name: Build
        template: MavenTemplate
        disabled: [report]
        params:
          java.version: "17"
        steps:
          - id: build
            runner: { type: maven, goals: clean verify }
          - id: publish
            runner: { type: script, content: ./publish.sh }
        failure_conditions:
          execution_timeout_min: 10
      - id: Plain
        name: Plain
        template: MavenTemplate
      - id: Broken
        name: Broken
        template: Missing
"#;

    fn registry() -> Registry {
        Registry::load(DeclarationSet::from_yaml(DECLS).unwrap()).unwrap()
    }

    #[test]
    fn test_local_fields_override_template() {
        let effective = registry().effective_build_config("Build").unwrap();
        let settings = &effective.settings;

        assert_eq!(settings.params["java.version"], "17");
        assert_eq!(settings.params["maven.goals"], "clean package");

        let steps: Vec<_> = settings.steps.iter().filter_map(|s| s.id.as_deref()).collect();
        assert_eq!(steps, vec!["build", "publish"]);
        match &settings.steps[0].runner {
            Runner::Maven { goals, .. } => assert_eq!(goals, "clean verify"),
            other => panic!("unexpected runner {other:?}"),
        }

        assert_eq!(settings.failure_conditions.execution_timeout_min, Some(10));
        assert_eq!(settings.failure_conditions.nonzero_exit_code, Some(true));
        assert_eq!(settings.artifact_rules.len(), 1);
        assert_eq!(settings.triggers.len(), 1);
    }

    #[test]
    fn test_template_only_configuration() {
        let effective = registry().effective_build_config("Plain").unwrap();
        assert_eq!(effective.settings.steps.len(), 2);
        assert_eq!(effective.settings.requirements.len(), 1);
    }

    #[test]
    fn test_missing_template_is_dangling() {
        match registry().effective_build_config("Broken").unwrap_err() {
            ConfError::DanglingReference {
                entity,
                reference,
                kind,
            } => {
                assert_eq!(entity, "Broken");
                assert_eq!(reference, "Missing");
                assert_eq!(kind, ReferenceKind::Template);
            }
            other => panic!("expected dangling reference, got {other:?}"),
        }
    }
}
