// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Error types for loading, validating and resolving declarations
//!
//! Every error carries the offending entity id(s), and cycle errors carry
//! the full path, so the author of a declaration can see what to fix.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for ciconf operations
pub type ConfResult<T> = Result<T, ConfError>;

/// Kinds of entity held by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Project,
    BuildConfiguration,
    Template,
    VcsRoot,
    AgentPool,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::BuildConfiguration => write!(f, "build configuration"),
            Self::Template => write!(f, "template"),
            Self::VcsRoot => write!(f, "VCS root"),
            Self::AgentPool => write!(f, "agent pool"),
        }
    }
}

/// What a dangling reference was expected to point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Template,
    VcsRoot,
    UpstreamBuild,
    AgentProperty,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template => write!(f, "template"),
            Self::VcsRoot => write!(f, "VCS root"),
            Self::UpstreamBuild => write!(f, "upstream build configuration"),
            Self::AgentProperty => write!(f, "agent property"),
        }
    }
}

/// Main error type for ciconf
#[derive(Error, Debug, Diagnostic)]
pub enum ConfError {
    // ─────────────────────────────────────────────────────────────────────────
    // Registry Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Duplicate id '{id}': {kind} clashes with an existing {existing}")]
    #[diagnostic(
        code(ciconf::duplicate_id),
        help("Ids are global across the whole project tree; rename one of the entities")
    )]
    DuplicateId {
        id: String,
        kind: EntityKind,
        existing: EntityKind,
    },

    #[error("Parent project '{parent}' of '{child}' does not exist")]
    #[diagnostic(
        code(ciconf::unknown_parent),
        help("Declare project '{parent}' or fix the parent reference of '{child}'")
    )]
    UnknownParent { parent: String, child: String },

    #[error("Project hierarchy contains a cycle: {}", .path.join(" → "))]
    #[diagnostic(
        code(ciconf::cyclic_parent),
        help("A project cannot be nested under itself or one of its descendants")
    )]
    CyclicParent { path: Vec<String> },

    #[error("Invalid id '{id}': {reason}")]
    #[diagnostic(
        code(ciconf::invalid_id),
        help("Ids start with a letter or underscore and contain only letters, digits and underscores")
    )]
    InvalidId { id: String, reason: String },

    #[error("No entity with id '{id}'")]
    #[diagnostic(code(ciconf::unknown_entity))]
    UnknownEntity { id: String },

    #[error("Invalid declarations: {reason}")]
    #[diagnostic(code(ciconf::invalid_declaration))]
    InvalidDeclaration {
        reason: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Parameter Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Parameter '{key}' references itself: {}", .chain.join(" → "))]
    #[diagnostic(
        code(ciconf::cyclic_reference),
        help("Break the chain by giving one of these parameters a literal value")
    )]
    CyclicReference { key: String, chain: Vec<String> },

    #[error("Unresolved parameter '{key}' (requested from {scope})")]
    #[diagnostic(
        code(ciconf::unresolved_parameter),
        help("Define '{key}' in {scope} or one of its ancestor projects")
    )]
    UnresolvedParameter { key: String, scope: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Reference & Graph Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("'{entity}' references unknown {kind} '{reference}'")]
    #[diagnostic(
        code(ciconf::dangling_reference),
        help("Check that '{reference}' is declared and spelled correctly")
    )]
    DanglingReference {
        entity: String,
        reference: String,
        kind: ReferenceKind,
    },

    #[error("Build dependency cycle detected: {}", .path.join(" → "))]
    #[diagnostic(
        code(ciconf::cycle_detected),
        help("Remove one of the artifact dependencies or finish-build triggers in the cycle")
    )]
    CycleDetected { path: Vec<String> },

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Declarations not found: {path}")]
    #[diagnostic(
        code(ciconf::declarations_not_found),
        help("Pass --config with a declaration file or directory, or create .ciconf.yaml")
    )]
    DeclarationsNotFound { path: PathBuf },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(ciconf::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Unsupported declaration format: {path}")]
    #[diagnostic(
        code(ciconf::unsupported_format),
        help("Supported formats: YAML (.yaml, .yml), JSON (.json), TOML (.toml)")
    )]
    UnsupportedFormat { path: PathBuf },

    // ─────────────────────────────────────────────────────────────────────────
    // Parse Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(ciconf::yaml_error))]
    Yaml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(ciconf::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(ciconf::toml_error))]
    Toml { message: String },

    #[error("Glob pattern error: {message}")]
    #[diagnostic(code(ciconf::glob_error))]
    GlobPattern { message: String },
}

impl From<serde_yaml::Error> for ConfError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for ConfError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for ConfError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl From<glob::PatternError> for ConfError {
    fn from(e: glob::PatternError) -> Self {
        Self::GlobPattern { message: e.to_string() }
    }
}

impl ConfError {
    /// Shorthand for an invalid declaration without help text
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidDeclaration {
            reason: reason.into(),
            help: None,
        }
    }

    /// The entity a declaration author should look at first
    pub fn entity(&self) -> Option<&str> {
        match self {
            Self::DuplicateId { id, .. }
            | Self::InvalidId { id, .. }
            | Self::UnknownEntity { id } => Some(id),
            Self::UnknownParent { child, .. } => Some(child),
            Self::DanglingReference { entity, .. } => Some(entity),
            Self::CyclicParent { path } | Self::CycleDetected { path } => {
                path.first().map(String::as_str)
            }
            _ => None,
        }
    }

    /// A concrete recovery suggestion, when one is known
    pub fn suggestion(&self) -> Option<RecoverySuggestion> {
        match self {
            Self::CycleDetected { path } => Some(RecoverySuggestion::fix_build_cycle(path)),
            Self::CyclicParent { path } => Some(RecoverySuggestion::fix_parent_cycle(path)),
            Self::CyclicReference { chain, .. } => {
                Some(RecoverySuggestion::fix_parameter_cycle(chain))
            }
            Self::UnresolvedParameter { key, scope } => {
                Some(RecoverySuggestion::define_parameter(key, scope))
            }
            Self::DanglingReference {
                entity,
                reference,
                kind,
            } => Some(RecoverySuggestion::fix_dangling_reference(
                entity, reference, *kind,
            )),
            Self::DeclarationsNotFound { .. } => Some(RecoverySuggestion::create_declarations()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_contains_path() {
        let err = ConfError::CycleDetected {
            path: vec!["Build".into(), "Deploy".into(), "Build".into()],
        };
        assert_eq!(
            err.to_string(),
            "Build dependency cycle detected: Build → Deploy → Build"
        );
        assert_eq!(err.entity(), Some("Build"));
    }

    #[test]
    fn test_unresolved_parameter_has_suggestion() {
        let err = ConfError::UnresolvedParameter {
            key: "undefined.key".into(),
            scope: "build configuration 'Build'".into(),
        };
        let suggestion = err.suggestion().unwrap();
        assert!(suggestion.action.contains("undefined.key"));
    }

    #[test]
    fn test_diagnostic_codes() {
        let err = ConfError::DanglingReference {
            entity: "Deploy".into(),
            reference: "Missing".into(),
            kind: ReferenceKind::UpstreamBuild,
        };
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("ciconf::dangling_reference"));
    }
}
