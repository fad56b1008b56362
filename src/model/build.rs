// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Build configuration and template definitions
//!
//! A [`BuildConfiguration`] and a [`Template`] carry the same
//! [`BuildSettings`] body; template inheritance is a merge of two such
//! bodies (see `registry::merge`).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use super::vcs::BranchFilter;

/// Parameter table of a scope
pub type Params = BTreeMap<String, String>;

/// A named, runnable pipeline definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfiguration {
    /// Globally unique id
    pub id: String,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Template this configuration inherits from
    #[serde(default)]
    pub template: Option<String>,

    /// Ids of inherited steps, triggers, features or requirement properties to drop
    #[serde(default)]
    pub disabled: Vec<String>,

    #[serde(flatten)]
    pub settings: BuildSettings,
}

/// A reusable partial build configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Globally unique id
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(flatten)]
    pub settings: BuildSettings,
}

/// Settings shared by build configurations and templates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildSettings {
    #[serde(default)]
    pub params: Params,

    /// Attached VCS roots
    #[serde(default)]
    pub vcs: Vec<VcsAttachment>,

    /// Steps in execution order
    #[serde(default)]
    pub steps: Vec<Step>,

    #[serde(default)]
    pub triggers: Vec<Trigger>,

    /// Artifact dependencies on upstream configurations
    #[serde(default)]
    pub dependencies: Vec<ArtifactDependency>,

    /// Agent requirements
    #[serde(default)]
    pub requirements: Vec<AgentRequirement>,

    /// Published artifacts, in order
    #[serde(default)]
    pub artifact_rules: Vec<ArtifactRule>,

    /// Build features (report processing, coverage, ...)
    #[serde(default)]
    pub features: Vec<Feature>,

    #[serde(default)]
    pub failure_conditions: FailureConditions,
}

/// A VCS root attached to a configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsAttachment {
    /// Id of the VCS root
    pub root: String,

    #[serde(default)]
    pub clean_checkout: bool,

    /// `+:src => dest` style checkout rules
    #[serde(default)]
    pub checkout_rules: Vec<String>,
}

/// A single build step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Step id, used to override inherited steps
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    /// What the step runs
    pub runner: Runner,

    #[serde(default)]
    pub execution_policy: ExecutionPolicy,
}

impl Step {
    /// Runner type name
    pub fn runner_name(&self) -> &str {
        match &self.runner {
            Runner::Script { .. } => "script",
            Runner::Maven { .. } => "maven",
            Runner::Gradle { .. } => "gradle",
            Runner::Docker { .. } => "docker",
        }
    }

    /// Label for diagnostics: name, id, or runner type
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or_else(|| self.runner_name())
    }
}

/// What a step runs
///
/// Script contents and runner arguments are opaque payloads; only their
/// `%placeholders%` are substituted during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Runner {
    /// Shell script
    Script { content: String },

    /// Maven goals
    Maven {
        goals: String,
        #[serde(default)]
        runner_args: Option<String>,
        #[serde(default)]
        jdk_home: Option<String>,
    },

    /// Gradle tasks
    Gradle {
        tasks: String,
        #[serde(default)]
        gradle_params: Option<String>,
        #[serde(default)]
        wrapper_path: Option<String>,
        #[serde(default)]
        jdk_home: Option<String>,
    },

    /// Docker command
    Docker {
        command: DockerCommand,
        /// Dockerfile path for builds
        #[serde(default)]
        file: Option<String>,
        /// Image names and tags
        #[serde(default)]
        tags: Vec<String>,
        /// Build args or extra command arguments
        #[serde(default)]
        args: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DockerCommand {
    Build,
    Push,
    Other,
}

/// When a step runs relative to earlier failures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPolicy {
    /// Only if the build status is successful so far
    #[default]
    Default,
    /// Only if all previous steps succeeded
    RunIfSuccessful,
    /// Even if some previous steps failed
    RunIfFailed,
    /// Even if the build was stopped
    Always,
}

/// Rule causing a configuration to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Run on VCS changes
    Vcs {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        branch_filter: BranchFilter,
        #[serde(default)]
        per_checkin_triggering: bool,
        #[serde(default)]
        group_checkins_by_committer: bool,
        #[serde(default)]
        quiet_period_secs: Option<u32>,
    },

    /// Run when an upstream configuration finishes
    FinishBuild {
        #[serde(default)]
        id: Option<String>,
        /// Id of the upstream build configuration
        #[serde(alias = "build_type")]
        upstream: String,
        #[serde(default)]
        successful_only: bool,
        #[serde(default)]
        branch_filter: BranchFilter,
    },

    /// Run on a cron schedule
    Schedule {
        #[serde(default)]
        id: Option<String>,
        cron: String,
        #[serde(default)]
        branch_filter: BranchFilter,
        #[serde(default)]
        with_pending_changes_only: bool,
    },
}

impl Trigger {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Vcs { id, .. } | Self::FinishBuild { id, .. } | Self::Schedule { id, .. } => {
                id.as_deref()
            }
        }
    }

    /// Upstream configuration for finish-build triggers
    pub fn upstream(&self) -> Option<&str> {
        match self {
            Self::FinishBuild { upstream, .. } => Some(upstream),
            _ => None,
        }
    }

    /// Whether the trigger starts a chain on its own (no upstream)
    pub fn is_source(&self) -> bool {
        !matches!(self, Self::FinishBuild { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Vcs { .. } => "vcs",
            Self::FinishBuild { .. } => "finish_build",
            Self::Schedule { .. } => "schedule",
        }
    }
}

/// Artifacts fetched from an upstream configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDependency {
    /// Id of the upstream build configuration
    #[serde(alias = "build_type")]
    pub source: String,

    #[serde(default)]
    pub build_rule: BuildRule,

    #[serde(default)]
    pub artifact_rules: Vec<ArtifactRule>,

    #[serde(default)]
    pub clean_destination: bool,
}

/// Which upstream build to take artifacts from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BuildRule {
    #[default]
    LastSuccessful,
    LastFinished,
    LastPinned,
    Tag(String),
    BuildNumber(String),
}

impl FromStr for BuildRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "lastSuccessful" | "last_successful" => Ok(Self::LastSuccessful),
            "lastFinished" | "last_finished" => Ok(Self::LastFinished),
            "lastPinned" | "last_pinned" => Ok(Self::LastPinned),
            other => {
                if let Some(tag) = other.strip_prefix("tag:") {
                    Ok(Self::Tag(tag.trim().to_string()))
                } else if let Some(number) = other.strip_prefix("build:") {
                    Ok(Self::BuildNumber(number.trim().to_string()))
                } else {
                    Err(format!(
                        "Unknown build rule '{}' (expected lastSuccessful, lastFinished, lastPinned, tag:<tag> or build:<number>)",
                        other
                    ))
                }
            }
        }
    }
}

impl TryFrom<String> for BuildRule {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BuildRule> for String {
    fn from(rule: BuildRule) -> Self {
        rule.to_string()
    }
}

impl std::fmt::Display for BuildRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LastSuccessful => write!(f, "lastSuccessful"),
            Self::LastFinished => write!(f, "lastFinished"),
            Self::LastPinned => write!(f, "lastPinned"),
            Self::Tag(tag) => write!(f, "tag:{}", tag),
            Self::BuildNumber(number) => write!(f, "build:{}", number),
        }
    }
}

/// `source => destination` artifact rule
///
/// Accepted as the DSL's one-line form or as a `{source, destination}` map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ArtifactRuleDecl")]
pub struct ArtifactRule {
    pub source: String,
    pub destination: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArtifactRuleDecl {
    Line(String),
    Structured {
        source: String,
        #[serde(default)]
        destination: Option<String>,
    },
}

impl From<ArtifactRuleDecl> for ArtifactRule {
    fn from(decl: ArtifactRuleDecl) -> Self {
        match decl {
            ArtifactRuleDecl::Line(line) => Self::parse(&line),
            ArtifactRuleDecl::Structured {
                source,
                destination,
            } => Self {
                source,
                destination,
            },
        }
    }
}

impl ArtifactRule {
    pub fn parse(line: &str) -> Self {
        match line.split_once("=>") {
            Some((source, destination)) => Self {
                source: source.trim().to_string(),
                destination: Some(destination.trim().to_string()).filter(|d| !d.is_empty()),
            },
            None => Self {
                source: line.trim().to_string(),
                destination: None,
            },
        }
    }
}

impl std::fmt::Display for ArtifactRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.destination {
            Some(dest) => write!(f, "{} => {}", self.source, dest),
            None => write!(f, "{}", self.source),
        }
    }
}

/// Condition an agent must satisfy to run the build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentRequirement {
    Exists { name: String },
    DoesNotExist { name: String },
    Equals { name: String, value: String },
    DoesNotEqual { name: String, value: String },
    Contains { name: String, value: String },
    Matches { name: String, pattern: String },
}

impl AgentRequirement {
    /// The agent property the requirement inspects
    pub fn property(&self) -> &str {
        match self {
            Self::Exists { name }
            | Self::DoesNotExist { name }
            | Self::Equals { name, .. }
            | Self::DoesNotEqual { name, .. }
            | Self::Contains { name, .. }
            | Self::Matches { name, .. } => name,
        }
    }

    /// Whether the requirement only asks for the property to be absent
    pub fn expects_absence(&self) -> bool {
        matches!(self, Self::DoesNotExist { .. } | Self::DoesNotEqual { .. })
    }

    /// Check the requirement against an agent's properties
    pub fn is_satisfied_by(&self, properties: &BTreeMap<String, String>) -> bool {
        let actual = properties.get(self.property());
        match self {
            Self::Exists { .. } => actual.is_some(),
            Self::DoesNotExist { .. } => actual.is_none(),
            Self::Equals { value, .. } => actual == Some(value),
            Self::DoesNotEqual { value, .. } => actual != Some(value),
            Self::Contains { value, .. } => actual.is_some_and(|a| a.contains(value.as_str())),
            Self::Matches { pattern, .. } => match (actual, Regex::new(pattern)) {
                (Some(a), Ok(re)) => re.is_match(a),
                _ => false,
            },
        }
    }
}

impl std::fmt::Display for AgentRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exists { name } => write!(f, "exists({})", name),
            Self::DoesNotExist { name } => write!(f, "does-not-exist({})", name),
            Self::Equals { name, value } => write!(f, "{} == {}", name, value),
            Self::DoesNotEqual { name, value } => write!(f, "{} != {}", name, value),
            Self::Contains { name, value } => write!(f, "{} contains {}", name, value),
            Self::Matches { name, pattern } => write!(f, "{} =~ {}", name, pattern),
        }
    }
}

/// A build feature (report parsing, coverage, performance monitor, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub params: Params,
}

/// Conditions that fail a build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureConditions {
    /// Fail if an error message is logged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<bool>,

    /// Fail if a step exits with a non-zero code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonzero_exit_code: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_timeout_min: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metric_changes: Vec<MetricCondition>,
}

/// Fail when a metric changes relative to a previous build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricCondition {
    /// Metric name, e.g. `test_count` or `coverage`
    pub metric: String,
    pub threshold: u32,
    #[serde(default)]
    pub units: MetricUnit,
    #[serde(default)]
    pub comparison: MetricComparison,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricUnit {
    #[default]
    Percent,
    DefaultUnits,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricComparison {
    #[default]
    Less,
    More,
    Diff,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_configuration() {
        let yaml = r#"
id: JavaApplications_DockerBuild
name: "Docker Build & Push"
template: JavaBuildTemplate
steps:
  - id: RUNNER_1
    name: Build Docker Image
    runner:
      type: docker
      command: build
      file: Dockerfile
      tags:
        - "%business.docker.registry%/java-app:%build.number%"
triggers:
  - type: finish_build
    id: TRIGGER_1
    build_type: JavaApplications_MavenBuild
    successful_only: true
dependencies:
  - source: JavaApplications_MavenBuild
    build_rule: lastSuccessful
    artifact_rules:
      - "artifacts/%business.unit%/*.jar"
requirements:
  - kind: equals
    name: system.agent.name
    value: java-build-agent
  - kind: exists
    name: docker_compose
artifact_rules:
  - "target/*.jar => artifacts/"
"#;

        let bc: BuildConfiguration = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(bc.template.as_deref(), Some("JavaBuildTemplate"));
        assert_eq!(bc.settings.steps[0].runner_name(), "docker");
        assert_eq!(
            bc.settings.triggers[0].upstream(),
            Some("JavaApplications_MavenBuild")
        );
        assert_eq!(bc.settings.dependencies[0].build_rule, BuildRule::LastSuccessful);
        assert_eq!(bc.settings.requirements[1].property(), "docker_compose");
        assert_eq!(
            bc.settings.artifact_rules[0].destination.as_deref(),
            Some("artifacts/")
        );
    }

    #[test]
    fn test_build_rule_forms() {
        assert_eq!("tag:release".parse::<BuildRule>(), Ok(BuildRule::Tag("release".into())));
        assert_eq!("build:42".parse::<BuildRule>(), Ok(BuildRule::BuildNumber("42".into())));
        assert!("sometimes".parse::<BuildRule>().is_err());
        assert_eq!(BuildRule::LastPinned.to_string(), "lastPinned");
    }

    #[test]
    fn test_artifact_rule_forms() {
        let rules: Vec<ArtifactRule> = serde_yaml::from_str(
            r#"
- "target/*.jar => artifacts/app/"
- { source: target/site/jacoco/jacoco.xml, destination: coverage-reports/ }
- logs/*.log
"#,
        )
        .unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[1].source, "target/site/jacoco/jacoco.xml");
        assert_eq!(rules[2].destination, None);
        assert_eq!(rules[0].to_string(), "target/*.jar => artifacts/app/");
    }

    #[test]
    fn test_requirement_satisfaction() {
        let mut props = BTreeMap::new();
        props.insert("system.agent.name".to_string(), "java-build-agent".to_string());
        props.insert("jdk_17".to_string(), "/usr/lib/jvm/17".to_string());

        let eq = AgentRequirement::Equals {
            name: "system.agent.name".into(),
            value: "java-build-agent".into(),
        };
        let exists = AgentRequirement::Exists { name: "jdk_17".into() };
        let missing = AgentRequirement::Exists { name: "helm".into() };
        let absent = AgentRequirement::DoesNotExist { name: "helm".into() };
        let matches = AgentRequirement::Matches {
            name: "jdk_17".into(),
            pattern: "^/usr/lib/jvm/\\d+$".into(),
        };

        assert!(eq.is_satisfied_by(&props));
        assert!(exists.is_satisfied_by(&props));
        assert!(!missing.is_satisfied_by(&props));
        assert!(absent.is_satisfied_by(&props));
        assert!(matches.is_satisfied_by(&props));
    }

    #[test]
    fn test_step_label_fallbacks() {
        let step = Step {
            id: Some("RUNNER_1".into()),
            name: None,
            runner: Runner::Script {
                content: "echo hi".into(),
            },
            execution_policy: ExecutionPolicy::Default,
        };
        assert_eq!(step.label(), "RUNNER_1");
        assert_eq!(step.runner_name(), "script");
    }
}
