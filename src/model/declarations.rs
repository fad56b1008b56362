// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Declaration sets and their file formats
//!
//! A declaration set is the complete, static input of one load: the project
//! tree plus resolver settings. It can live in a single YAML/JSON/TOML file
//! or be spread across every such file in a directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::project::ProjectDecl;
use crate::errors::{ConfError, ConfResult};

/// File extensions recognised as declaration files
pub const DECLARATION_EXTENSIONS: [&str; 4] = ["yaml", "yml", "json", "toml"];

/// The complete set of declarations for one load
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclarationSet {
    /// Declaration format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Resolver settings
    #[serde(default)]
    pub settings: Option<ResolverSettings>,

    /// Project declarations; exactly one of them (transitively) is the root
    #[serde(default)]
    pub projects: Vec<ProjectDecl>,
}

fn default_version() -> String {
    "1".to_string()
}

/// Settings that influence resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverSettings {
    /// Glob patterns of parameter names supplied by the build runtime.
    ///
    /// Placeholders matching these are left in place when nothing declares
    /// them, for the scheduler to fill in.
    #[serde(default = "default_runtime_parameters")]
    pub runtime_parameters: Vec<String>,
}

fn default_runtime_parameters() -> Vec<String> {
    vec![
        "build.number".to_string(),
        "build.counter".to_string(),
        "build.vcs.number*".to_string(),
        "teamcity.*".to_string(),
    ]
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            runtime_parameters: default_runtime_parameters(),
        }
    }
}

impl DeclarationSet {
    /// Load from a declaration file or a directory of them
    pub fn from_path(path: &Path) -> ConfResult<Self> {
        if path.is_dir() {
            Self::from_dir(path)
        } else if path.exists() {
            Self::from_file(path)
        } else {
            Err(ConfError::DeclarationsNotFound {
                path: path.to_path_buf(),
            })
        }
    }

    /// Load a single file, choosing the format by extension
    pub fn from_file(path: &Path) -> ConfResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        match extension {
            "yaml" | "yml" => Self::from_yaml(&content),
            "json" => Self::from_json(&content),
            "toml" => Self::from_toml(&content),
            _ => Err(ConfError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Load and merge every declaration file below `dir`, in path order
    pub fn from_dir(dir: &Path) -> ConfResult<Self> {
        let files = Self::discover(dir)?;
        if files.is_empty() {
            return Err(ConfError::DeclarationsNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut merged: Option<Self> = None;
        for file in files {
            debug!(file = %file.display(), "reading declarations");
            let part = Self::from_file(&file)?;
            match merged.as_mut() {
                Some(set) => set.merge(part)?,
                None => merged = Some(part),
            }
        }

        Ok(merged.unwrap_or_default())
    }

    /// Declaration files below `dir`, sorted for a stable merge order
    pub fn discover(dir: &Path) -> ConfResult<Vec<PathBuf>> {
        let mut files = Vec::new();

        for ext in DECLARATION_EXTENSIONS {
            let pattern = dir.join("**").join(format!("*.{}", ext));
            for entry in glob::glob(&pattern.to_string_lossy())?.flatten() {
                if entry.is_file() {
                    files.push(entry);
                }
            }
        }

        files.sort();
        files.dedup();
        Ok(files)
    }

    pub fn from_yaml(yaml: &str) -> ConfResult<Self> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    pub fn from_json(json: &str) -> ConfResult<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }

    pub fn from_toml(text: &str) -> ConfResult<Self> {
        toml::from_str(text).map_err(Into::into)
    }

    /// Append another set's projects; settings may be given only once
    pub fn merge(&mut self, other: Self) -> ConfResult<()> {
        if other.version != self.version {
            return Err(ConfError::InvalidDeclaration {
                reason: format!(
                    "Declaration versions differ: '{}' and '{}'",
                    self.version, other.version
                ),
                help: Some("Use the same `version` in every declaration file".into()),
            });
        }

        match (&self.settings, other.settings) {
            (Some(_), Some(_)) => {
                return Err(ConfError::InvalidDeclaration {
                    reason: "`settings` is declared in more than one file".into(),
                    help: Some("Keep resolver settings in a single declaration file".into()),
                });
            }
            (None, Some(settings)) => self.settings = Some(settings),
            _ => {}
        }

        self.projects.extend(other.projects);
        Ok(())
    }

    /// Effective resolver settings
    pub fn resolver_settings(&self) -> ResolverSettings {
        self.settings.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const ROOT: &str = r#"
version: "1"
projects:
  - id: _Root
    name: Root
    params:
      git.default.branch: main
"#;

    const CHILD: &str = r#"
version: "1"
settings:
  runtime_parameters: ["build.number"]
projects:
  - id: Child
    name: Child
    parent: _Root
"#;

    #[test]
    fn test_parse_yaml_defaults() {
        let set = DeclarationSet::from_yaml(ROOT).unwrap();
        assert_eq!(set.projects.len(), 1);
        assert!(set.settings.is_none());
        assert!(set
            .resolver_settings()
            .runtime_parameters
            .contains(&"teamcity.*".to_string()));
    }

    #[test]
    fn test_load_directory_merges_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("10-root.yaml"), ROOT).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("child.yml"), CHILD).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let set = DeclarationSet::from_path(dir.path()).unwrap();
        let ids: Vec<_> = set.projects.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["_Root", "Child"]);
        assert_eq!(
            set.resolver_settings().runtime_parameters,
            vec!["build.number".to_string()]
        );
    }

    #[test]
    fn test_settings_declared_twice_is_rejected() {
        let mut a = DeclarationSet::from_yaml(CHILD).unwrap();
        let b = DeclarationSet::from_yaml(CHILD).unwrap();
        assert!(matches!(
            a.merge(b),
            Err(ConfError::InvalidDeclaration { .. })
        ));
    }

    #[test]
    fn test_toml_and_json_formats() {
        let toml_text = r#"
version = "1"

[[projects]]
id = "_Root"
name = "Root"

[projects.params]
"docker.registry.url" = "registry.example.com"
"#;
        let set = DeclarationSet::from_toml(toml_text).unwrap();
        assert_eq!(
            set.projects[0].params["docker.registry.url"],
            "registry.example.com"
        );

        let json = r#"{"projects": [{"id": "_Root", "name": "Root"}]}"#;
        let set = DeclarationSet::from_json(json).unwrap();
        assert_eq!(set.version, "1");
    }

    #[test]
    fn test_missing_path() {
        let result = DeclarationSet::from_path(Path::new("/definitely/not/here.yaml"));
        assert!(matches!(result, Err(ConfError::DeclarationsNotFound { .. })));
    }
}
