// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Projects, agent pools and cleanup rules

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::build::{BuildConfiguration, Params, Template};
use super::vcs::VcsRoot;

/// A project as held by the registry (children are tracked by the registry)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Globally unique id
    pub id: String,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub params: Params,

    /// Cleanup rules for this project's subtree
    #[serde(default)]
    pub cleanup: Vec<CleanupRule>,

    /// Whether rules of ancestor projects still apply here
    #[serde(default = "default_true")]
    pub inherit_cleanup: bool,
}

fn default_true() -> bool {
    true
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            params: Params::new(),
            cleanup: Vec::new(),
            inherit_cleanup: true,
        }
    }

    /// Builder-style parameter definition
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// A project as written in a declaration file
///
/// Children may be nested under `projects`, or declared elsewhere with an
/// explicit `parent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDecl {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Parent project id; `None` for the root or for nested projects
    #[serde(default)]
    pub parent: Option<String>,

    #[serde(default)]
    pub params: Params,

    #[serde(default)]
    pub cleanup: Vec<CleanupRule>,

    #[serde(default = "default_true")]
    pub inherit_cleanup: bool,

    #[serde(default)]
    pub vcs_roots: Vec<VcsRoot>,

    #[serde(default)]
    pub agent_pools: Vec<AgentPool>,

    #[serde(default)]
    pub templates: Vec<Template>,

    #[serde(default)]
    pub build_configs: Vec<BuildConfiguration>,

    /// Nested sub-projects, in order
    #[serde(default)]
    pub projects: Vec<ProjectDecl>,
}

/// Entities a project owns, split out of a [`ProjectDecl`]
#[derive(Debug, Clone, Default)]
pub struct ProjectContents {
    pub vcs_roots: Vec<VcsRoot>,
    pub agent_pools: Vec<AgentPool>,
    pub templates: Vec<Template>,
    pub build_configs: Vec<BuildConfiguration>,
}

impl ProjectDecl {
    /// Split into the project itself, what it owns, and its nested children
    pub fn split(self) -> (Project, ProjectContents, Vec<ProjectDecl>) {
        let project = Project {
            id: self.id,
            name: self.name,
            description: self.description,
            params: self.params,
            cleanup: self.cleanup,
            inherit_cleanup: self.inherit_cleanup,
        };
        let contents = ProjectContents {
            vcs_roots: self.vcs_roots,
            agent_pools: self.agent_pools,
            templates: self.templates,
            build_configs: self.build_configs,
        };
        (project, contents, self.projects)
    }
}

/// A declared set of agents and the properties they report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPool {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// Build history retention rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupRule {
    /// Rule id; a descendant rule with the same id overrides this one
    #[serde(default)]
    pub id: Option<String>,

    /// How much history to keep
    pub keep: Retention,

    /// Builds the rule applies to
    #[serde(default)]
    pub status: StatusFilter,

    /// Only builds carrying one of these tags
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub preserve_artifacts: bool,
}

/// Retention period or count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RetentionDecl", into = "RetentionDecl")]
pub enum Retention {
    Days(u32),
    Builds(u32),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RetentionDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    builds: Option<u32>,
}

impl TryFrom<RetentionDecl> for Retention {
    type Error = String;

    fn try_from(decl: RetentionDecl) -> Result<Self, Self::Error> {
        match (decl.days, decl.builds) {
            (Some(days), None) => Ok(Self::Days(days)),
            (None, Some(builds)) => Ok(Self::Builds(builds)),
            (Some(_), Some(_)) => Err("keep takes either `days` or `builds`, not both".into()),
            (None, None) => Err("keep needs `days` or `builds`".into()),
        }
    }
}

impl From<Retention> for RetentionDecl {
    fn from(retention: Retention) -> Self {
        match retention {
            Retention::Days(days) => Self {
                days: Some(days),
                builds: None,
            },
            Retention::Builds(builds) => Self {
                days: None,
                builds: Some(builds),
            },
        }
    }
}

impl std::fmt::Display for Retention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Days(n) => write!(f, "{} days", n),
            Self::Builds(n) => write!(f, "{} builds", n),
        }
    }
}

/// Build status a cleanup rule applies to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    Any,
    Successful,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cleanup_rules() {
        let yaml = r#"
- id: KEEP_RULE_1
  keep: { days: 30 }
  status: successful
- id: KEEP_RULE_2
  keep: { builds: 10 }
  status: failed
- keep: { days: 14 }
  tags: [release]
  preserve_artifacts: true
"#;
        let rules: Vec<CleanupRule> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rules[0].keep, Retention::Days(30));
        assert_eq!(rules[1].keep, Retention::Builds(10));
        assert_eq!(rules[1].status, StatusFilter::Failed);
        assert!(rules[2].preserve_artifacts);
        assert_eq!(rules[2].status, StatusFilter::Any);
    }

    #[test]
    fn test_retention_rejects_both_forms() {
        let result: Result<CleanupRule, _> =
            serde_yaml::from_str("keep: { days: 3, builds: 4 }");
        assert!(result.is_err());
    }

    #[test]
    fn test_split_project_decl() {
        let yaml = r#"
id: JavaApplications
name: Java Applications
params:
  java.version.default: "17"
vcs_roots:
  - id: JavaRepo
    url: https://example.com/java.git
build_configs:
  - id: MavenBuild
    name: Maven Build
projects:
  - id: Libraries
    name: Libraries
"#;
        let decl: ProjectDecl = serde_yaml::from_str(yaml).unwrap();
        let (project, contents, children) = decl.split();
        assert_eq!(project.params["java.version.default"], "17");
        assert!(project.inherit_cleanup);
        assert_eq!(contents.vcs_roots[0].id, "JavaRepo");
        assert_eq!(contents.build_configs[0].id, "MavenBuild");
        assert_eq!(children[0].id, "Libraries");
    }
}
