// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Placeholder substitution over model types
//!
//! Only content strings are interpolated. Ids, names and references to other
//! entities are left untouched.

use crate::errors::ConfResult;
use crate::model::{
    AgentRequirement, ArtifactDependency, ArtifactRule, BranchFilter, Feature, Params, Runner,
    Step, Trigger, VcsAttachment, VcsRoot,
};
use crate::params::ParamSession;

/// A value whose `%placeholders%` can be substituted
pub trait Interpolate: Sized {
    fn interpolate(&self, session: &mut ParamSession<'_>) -> ConfResult<Self>;
}

impl Interpolate for String {
    fn interpolate(&self, session: &mut ParamSession<'_>) -> ConfResult<Self> {
        session.interpolate(self)
    }
}

impl<T: Interpolate> Interpolate for Option<T> {
    fn interpolate(&self, session: &mut ParamSession<'_>) -> ConfResult<Self> {
        self.as_ref().map(|v| v.interpolate(session)).transpose()
    }
}

impl<T: Interpolate> Interpolate for Vec<T> {
    fn interpolate(&self, session: &mut ParamSession<'_>) -> ConfResult<Self> {
        self.iter().map(|v| v.interpolate(session)).collect()
    }
}

impl Interpolate for Params {
    fn interpolate(&self, session: &mut ParamSession<'_>) -> ConfResult<Self> {
        self.iter()
            .map(|(k, v)| Ok((k.clone(), v.interpolate(session)?)))
            .collect()
    }
}

impl Interpolate for Runner {
    fn interpolate(&self, session: &mut ParamSession<'_>) -> ConfResult<Self> {
        Ok(match self {
            Self::Script { content } => Self::Script {
                content: content.interpolate(session)?,
            },
            Self::Maven {
                goals,
                runner_args,
                jdk_home,
            } => Self::Maven {
                goals: goals.interpolate(session)?,
                runner_args: runner_args.interpolate(session)?,
                jdk_home: jdk_home.interpolate(session)?,
            },
            Self::Gradle {
                tasks,
                gradle_params,
                wrapper_path,
                jdk_home,
            } => Self::Gradle {
                tasks: tasks.interpolate(session)?,
                gradle_params: gradle_params.interpolate(session)?,
                wrapper_path: wrapper_path.interpolate(session)?,
                jdk_home: jdk_home.interpolate(session)?,
            },
            Self::Docker {
                command,
                file,
                tags,
                args,
            } => Self::Docker {
                command: *command,
                file: file.interpolate(session)?,
                tags: tags.interpolate(session)?,
                args: args.interpolate(session)?,
            },
        })
    }
}

impl Interpolate for Step {
    fn interpolate(&self, session: &mut ParamSession<'_>) -> ConfResult<Self> {
        Ok(Self {
            runner: self.runner.interpolate(session)?,
            ..self.clone()
        })
    }
}

impl Interpolate for ArtifactRule {
    fn interpolate(&self, session: &mut ParamSession<'_>) -> ConfResult<Self> {
        Ok(Self {
            source: self.source.interpolate(session)?,
            destination: self.destination.interpolate(session)?,
        })
    }
}

impl Interpolate for AgentRequirement {
    fn interpolate(&self, session: &mut ParamSession<'_>) -> ConfResult<Self> {
        Ok(match self {
            Self::Exists { name } => Self::Exists {
                name: name.interpolate(session)?,
            },
            Self::DoesNotExist { name } => Self::DoesNotExist {
                name: name.interpolate(session)?,
            },
            Self::Equals { name, value } => Self::Equals {
                name: name.interpolate(session)?,
                value: value.interpolate(session)?,
            },
            Self::DoesNotEqual { name, value } => Self::DoesNotEqual {
                name: name.interpolate(session)?,
                value: value.interpolate(session)?,
            },
            Self::Contains { name, value } => Self::Contains {
                name: name.interpolate(session)?,
                value: value.interpolate(session)?,
            },
            Self::Matches { name, pattern } => Self::Matches {
                name: name.interpolate(session)?,
                pattern: pattern.interpolate(session)?,
            },
        })
    }
}

impl Interpolate for BranchFilter {
    fn interpolate(&self, session: &mut ParamSession<'_>) -> ConfResult<Self> {
        self.try_map_patterns(|pattern| session.interpolate(pattern))
    }
}

impl Interpolate for VcsRoot {
    fn interpolate(&self, session: &mut ParamSession<'_>) -> ConfResult<Self> {
        Ok(Self {
            url: self.url.interpolate(session)?,
            branch: self.branch.interpolate(session)?,
            branch_spec: self.branch_spec.interpolate(session)?,
            ..self.clone()
        })
    }
}

impl Interpolate for VcsAttachment {
    fn interpolate(&self, session: &mut ParamSession<'_>) -> ConfResult<Self> {
        Ok(Self {
            checkout_rules: self.checkout_rules.interpolate(session)?,
            ..self.clone()
        })
    }
}

impl Interpolate for Trigger {
    fn interpolate(&self, session: &mut ParamSession<'_>) -> ConfResult<Self> {
        let mut out = self.clone();
        match &mut out {
            Self::Vcs { branch_filter, .. }
            | Self::FinishBuild { branch_filter, .. }
            | Self::Schedule { branch_filter, .. } => {
                *branch_filter = branch_filter.interpolate(session)?;
            }
        }
        Ok(out)
    }
}

impl Interpolate for ArtifactDependency {
    fn interpolate(&self, session: &mut ParamSession<'_>) -> ConfResult<Self> {
        Ok(Self {
            artifact_rules: self.artifact_rules.interpolate(session)?,
            ..self.clone()
        })
    }
}

impl Interpolate for Feature {
    fn interpolate(&self, session: &mut ParamSession<'_>) -> ConfResult<Self> {
        Ok(Self {
            params: self.params.interpolate(session)?,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DockerCommand, Project};
    use crate::params::{ParameterStore, Scope};
    use crate::registry::Registry;

    fn registry() -> Registry {
        Registry::new(
            Project::new("_Root", "Root")
                .with_param("business.unit", "tb")
                .with_param("docker.registry", "registry.example.com/%business.unit%")
                .with_param("default.branch", "main"),
        )
        .unwrap()
    }

    #[test]
    fn test_docker_runner_fields() {
        let registry = registry();
        let store = ParameterStore::new(&registry);
        let mut session = store.session(&Scope::Project("_Root".into())).unwrap();

        let runner = Runner::Docker {
            command: DockerCommand::Push,
            file: None,
            tags: vec!["%docker.registry%/app:%build.number%".into()],
            args: vec![],
        };
        match runner.interpolate(&mut session).unwrap() {
            Runner::Docker { tags, .. } => {
                assert_eq!(tags, vec!["registry.example.com/tb/app:%build.number%"]);
            }
            other => panic!("unexpected runner {other:?}"),
        }
        assert!(session.runtime_references().contains("build.number"));
    }

    #[test]
    fn test_branch_filter_patterns() {
        let registry = registry();
        let store = ParameterStore::new(&registry);
        let mut session = store.session(&Scope::Project("_Root".into())).unwrap();

        let filter = BranchFilter::parse("+:refs/heads/%default.branch%\n-:refs/heads/tmp-*");
        let resolved = filter.interpolate(&mut session).unwrap();
        assert!(resolved.matches("refs/heads/main"));
        assert!(!resolved.matches("refs/heads/tmp-1"));
    }

    #[test]
    fn test_requirement_name_and_value() {
        let registry = registry();
        let store = ParameterStore::new(&registry);
        let mut session = store.session(&Scope::Project("_Root".into())).unwrap();

        let requirement = AgentRequirement::Equals {
            name: "env.UNIT".into(),
            value: "%business.unit%".into(),
        };
        assert_eq!(
            requirement.interpolate(&mut session).unwrap(),
            AgentRequirement::Equals {
                name: "env.UNIT".into(),
                value: "tb".into(),
            }
        );
    }

    #[test]
    fn test_unresolved_placeholder_propagates() {
        let registry = registry();
        let store = ParameterStore::new(&registry);
        let mut session = store.session(&Scope::Project("_Root".into())).unwrap();

        let rule = ArtifactRule::parse("target/*.jar => %missing.dir%");
        assert!(rule.interpolate(&mut session).is_err());
    }
}
