// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for fixing broken declarations.

use super::ReferenceKind;

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Suggest breaking a build dependency cycle
    pub fn fix_build_cycle(path: &[String]) -> Self {
        Self {
            action: "Remove the build dependency cycle".into(),
            steps: vec![
                format!("Detected cycle: {}", path.join(" → ")),
                "Each edge is an artifact dependency or a finish-build trigger".into(),
                "Drop or redirect one edge so that builds form a DAG".into(),
            ],
            commands: vec![
                "# Visualize the build graph:".into(),
                "ciconf graph --format mermaid".into(),
            ],
        }
    }

    /// Suggest fixing a project nested under itself
    pub fn fix_parent_cycle(path: &[String]) -> Self {
        Self {
            action: "Fix the project hierarchy".into(),
            steps: vec![
                format!("Parent chain loops: {}", path.join(" → ")),
                "Point one of these projects at a parent outside the loop".into(),
            ],
            commands: vec!["ciconf tree".into()],
        }
    }

    /// Suggest breaking a parameter reference cycle
    pub fn fix_parameter_cycle(chain: &[String]) -> Self {
        Self {
            action: "Break the parameter reference cycle".into(),
            steps: vec![
                format!("Reference chain: {}", chain.join(" → ")),
                "Give one of these parameters a literal value".into(),
                "Remember that placeholders resolve from the requesting build configuration"
                    .into(),
            ],
            commands: vec![],
        }
    }

    /// Suggest defining a missing parameter
    pub fn define_parameter(key: &str, scope: &str) -> Self {
        Self {
            action: format!("Define parameter '{}'", key),
            steps: vec![
                format!("No definition of '{}' is visible from {}", key, scope),
                "Add it to the build configuration, its template, or an ancestor project".into(),
                "If the build runtime supplies it, add its name to settings.runtime_parameters"
                    .into(),
            ],
            commands: vec![
                "# Show every parameter visible from a scope:".into(),
                "ciconf params <scope-id>".into(),
            ],
        }
    }

    /// Suggest fixing a reference to an undeclared entity
    pub fn fix_dangling_reference(entity: &str, reference: &str, kind: ReferenceKind) -> Self {
        let hint = match kind {
            ReferenceKind::Template => "Declare the template in this or an ancestor project",
            ReferenceKind::VcsRoot => "Declare the VCS root under `vcs_roots` of some project",
            ReferenceKind::UpstreamBuild => {
                "Reference the id of an existing build configuration, not its name"
            }
            ReferenceKind::AgentProperty => {
                "Add the property to an agent pool or relax the requirement"
            }
        };

        Self {
            action: format!("Fix {} reference '{}'", kind, reference),
            steps: vec![
                format!("'{}' references '{}', which is not declared", entity, reference),
                hint.into(),
            ],
            commands: vec!["ciconf tree".into()],
        }
    }

    /// Suggest creating a declaration file
    pub fn create_declarations() -> Self {
        Self {
            action: "Create a declaration file".into(),
            steps: vec![
                "No .ciconf.yaml found in current directory".into(),
                "Create one, or point --config at a file or directory of declarations".into(),
            ],
            commands: vec!["ciconf --config demos/business-unit.yaml validate".into()],
        }
    }
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "→ {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_commands() {
        let suggestion =
            RecoverySuggestion::fix_build_cycle(&["A".into(), "B".into(), "A".into()]);
        let rendered = suggestion.to_string();
        assert!(rendered.starts_with("→ Remove the build dependency cycle"));
        assert!(rendered.contains("A → B → A"));
        assert!(rendered.contains("ciconf graph --format mermaid"));
    }
}
