// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! VCS roots and branch filters

use glob::Pattern;
use serde::{Deserialize, Serialize};

/// A named source-control location and its checkout policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsRoot {
    /// Globally unique id
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Repository URL (may contain placeholders)
    pub url: String,

    /// Default branch (may contain placeholders)
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Branches monitored in addition to the default branch
    #[serde(default)]
    pub branch_spec: BranchFilter,

    /// Authentication method
    #[serde(default)]
    pub auth: AuthMethod,

    /// How agents check out sources
    #[serde(default)]
    pub checkout_policy: CheckoutPolicy,
}

fn default_branch() -> String {
    "refs/heads/main".to_string()
}

/// Authentication used to reach a VCS root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthMethod {
    #[default]
    Anonymous,
    Password {
        username: String,
        /// A secure token reference such as `credentialsJSON:<id>`, never a literal secret
        password: String,
    },
    SshKey {
        key_name: String,
        #[serde(default)]
        username: Option<String>,
    },
}

/// Agent checkout policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPolicy {
    #[default]
    Auto,
    UseMirrors,
    NoMirrors,
    ShallowClone,
}

/// One `+:pattern` / `-:pattern` line of a branch filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRule {
    pub include: bool,
    pub pattern: String,
}

impl FilterRule {
    /// Parse a single rule line; a line without a `+:`/`-:` prefix is an include
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if let Some(pattern) = line.strip_prefix("+:") {
            Self {
                include: true,
                pattern: pattern.trim().to_string(),
            }
        } else if let Some(pattern) = line.strip_prefix("-:") {
            Self {
                include: false,
                pattern: pattern.trim().to_string(),
            }
        } else {
            Self {
                include: true,
                pattern: line.to_string(),
            }
        }
    }

    fn matches(&self, branch: &str) -> bool {
        match Pattern::new(&self.pattern) {
            Ok(pattern) => pattern.matches(branch),
            Err(_) => self.pattern == branch,
        }
    }
}

impl std::fmt::Display for FilterRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.include { '+' } else { '-' };
        write!(f, "{}:{}", sign, self.pattern)
    }
}

/// Ordered include/exclude branch rules
///
/// Accepted either as a multi-line string (as the CI DSL writes it) or as a
/// list of rule strings. Serializes as a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BranchFilterDecl", into = "Vec<String>")]
pub struct BranchFilter {
    pub rules: Vec<FilterRule>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BranchFilterDecl {
    Lines(String),
    List(Vec<String>),
}

impl From<BranchFilterDecl> for BranchFilter {
    fn from(decl: BranchFilterDecl) -> Self {
        match decl {
            BranchFilterDecl::Lines(text) => Self::parse(&text),
            BranchFilterDecl::List(lines) => Self::from_lines(lines.iter().map(String::as_str)),
        }
    }
}

impl From<BranchFilter> for Vec<String> {
    fn from(filter: BranchFilter) -> Self {
        filter.rules.iter().map(ToString::to_string).collect()
    }
}

impl BranchFilter {
    /// Parse a newline separated rule block, skipping blank lines
    pub fn parse(text: &str) -> Self {
        Self::from_lines(text.lines())
    }

    fn from_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Self {
        Self {
            rules: lines
                .filter(|l| !l.trim().is_empty())
                .map(FilterRule::parse)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether `branch` passes the filter.
    ///
    /// An empty filter accepts everything. Otherwise the most specific
    /// matching rule (longest pattern, later rule on ties) decides, and a
    /// branch no rule matches is rejected.
    pub fn matches(&self, branch: &str) -> bool {
        if self.rules.is_empty() {
            return true;
        }

        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.matches(branch))
            .max_by_key(|(idx, rule)| (rule.pattern.len(), *idx))
            .map(|(_, rule)| rule.include)
            .unwrap_or(false)
    }

    /// Rewrite every pattern with `f`
    pub fn try_map_patterns<E>(
        &self,
        mut f: impl FnMut(&str) -> Result<String, E>,
    ) -> Result<Self, E> {
        let rules = self
            .rules
            .iter()
            .map(|rule| {
                Ok(FilterRule {
                    include: rule.include,
                    pattern: f(&rule.pattern)?,
                })
            })
            .collect::<Result<Vec<_>, E>>()?;
        Ok(Self { rules })
    }
}
