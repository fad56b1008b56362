// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Cleanup rule inheritance along the project tree

use serde::Serialize;

use super::Registry;
use crate::errors::ConfResult;
use crate::model::CleanupRule;

/// A cleanup rule in force for some entity, with the project declaring it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveCleanupRule {
    #[serde(flatten)]
    pub rule: CleanupRule,
    pub defined_in: String,
}

impl Registry {
    /// Cleanup rules that apply to `id`, root-most first.
    ///
    /// Rules are collected from the closest project upwards until a project
    /// with `inherit_cleanup: false`. A closer rule replaces an outer rule
    /// with the same id at the outer rule's position.
    pub fn effective_cleanup(&self, id: &str) -> ConfResult<Vec<EffectiveCleanupRule>> {
        let path = self.project_path(id)?;

        let start = path
            .iter()
            .rposition(|p| !p.inherit_cleanup)
            .unwrap_or(0);

        let mut out: Vec<EffectiveCleanupRule> = Vec::new();
        for project in &path[start..] {
            for rule in &project.cleanup {
                let effective = EffectiveCleanupRule {
                    rule: rule.clone(),
                    defined_in: project.id.clone(),
                };
                let existing = rule.id.as_ref().and_then(|rid| {
                    out.iter()
                        .position(|e| e.rule.id.as_ref() == Some(rid))
                });
                match existing {
                    Some(pos) => out[pos] = effective,
                    None => out.push(effective),
                }
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeclarationSet, Retention};

    const DECLS: &str = r#"
projects:
  - id: _Root
    name: Root
    cleanup:
      - { id: history, keep: { days: 30 } }
      - { id: failed, keep: { builds: 5 }, status: failed }
    projects:
      - id: Team
        name: Team
        cleanup:
          - { id: history, keep: { days: 90 } }
          - { keep: { builds: 100 }, tags: [release] }
        build_configs:
          - { id: TeamBuild, name: Build }
        projects:
          - id: Sandbox
            name: Sandbox
            inherit_cleanup: false
            cleanup:
              - { keep: { days: 1 } }
            build_configs:
              - { id: SandboxBuild, name: Build }
"#;

    fn registry() -> Registry {
        Registry::load(DeclarationSet::from_yaml(DECLS).unwrap()).unwrap()
    }

    #[test]
    fn test_closer_rule_overrides_by_id() {
        let rules = registry().effective_cleanup("TeamBuild").unwrap();
        assert_eq!(rules.len(), 3);

        assert_eq!(rules[0].rule.id.as_deref(), Some("history"));
        assert_eq!(rules[0].rule.keep, Retention::Days(90));
        assert_eq!(rules[0].defined_in, "Team");

        assert_eq!(rules[1].rule.id.as_deref(), Some("failed"));
        assert_eq!(rules[1].defined_in, "_Root");
        assert_eq!(rules[2].rule.tags, vec!["release"]);
    }

    #[test]
    fn test_inheritance_cut_off() {
        let rules = registry().effective_cleanup("SandboxBuild").unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].rule.keep, Retention::Days(1));
        assert_eq!(rules[0].defined_in, "Sandbox");
    }

    #[test]
    fn test_root_project_rules() {
        let rules = registry().effective_cleanup("_Root").unwrap();
        assert_eq!(rules.len(), 2);
    }
}
