// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Scope-chain parameter lookup and resolution

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use super::interpolate::{self, Segment};
use crate::errors::{ConfError, ConfResult, EntityKind, ReferenceKind};
use crate::model::{Params, Project};
use crate::registry::Registry;

/// Where a parameter lookup starts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Scope {
    Project(String),
    BuildConfiguration(String),
    Template(String),
}

impl Scope {
    pub fn id(&self) -> &str {
        match self {
            Self::Project(id) | Self::BuildConfiguration(id) | Self::Template(id) => id,
        }
    }

    /// The scope of the entity with `id`, whatever its kind
    pub fn of(registry: &Registry, id: &str) -> ConfResult<Self> {
        match registry.kind_of(id) {
            Some(EntityKind::Project) => Ok(Self::Project(id.to_string())),
            Some(EntityKind::BuildConfiguration) => Ok(Self::BuildConfiguration(id.to_string())),
            Some(EntityKind::Template) => Ok(Self::Template(id.to_string())),
            Some(kind) => Err(ConfError::InvalidDeclaration {
                reason: format!("{} '{}' does not define parameters", kind, id),
                help: Some("Use a project, build configuration or template id".into()),
            }),
            None => Err(ConfError::UnknownEntity { id: id.to_string() }),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project(id) => write!(f, "project '{}'", id),
            Self::BuildConfiguration(id) => write!(f, "build configuration '{}'", id),
            Self::Template(id) => write!(f, "template '{}'", id),
        }
    }
}

fn owning_project<'r>(registry: &'r Registry, id: &str) -> ConfResult<&'r Project> {
    registry
        .owner_of(id)
        .ok_or_else(|| ConfError::UnknownEntity { id: id.to_string() })
}

/// A raw parameter value and the scope that declares it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamOrigin {
    pub value: String,
    pub defined_in: Scope,
}

/// Read-only parameter view over a registry
#[derive(Clone, Copy)]
pub struct ParameterStore<'r> {
    registry: &'r Registry,
}

impl<'r> ParameterStore<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Parameter tables visible from `scope`, closest first.
    ///
    /// Build configuration → its template → owning project → ancestors;
    /// template → owning project → ancestors; project → ancestors.
    pub fn chain(&self, scope: &Scope) -> ConfResult<Vec<(Scope, &'r Params)>> {
        let registry = self.registry;
        let mut layers = Vec::new();

        let owner = match scope {
            Scope::Project(id) => {
                let project = registry
                    .project(id)
                    .ok_or_else(|| ConfError::UnknownEntity { id: id.clone() })?;
                layers.push((scope.clone(), &project.params));
                None
            }
            Scope::BuildConfiguration(id) => {
                let bc = registry
                    .build_config(id)
                    .ok_or_else(|| ConfError::UnknownEntity { id: id.clone() })?;
                layers.push((scope.clone(), &bc.settings.params));

                if let Some(template_id) = &bc.template {
                    let template = registry.template(template_id).ok_or_else(|| {
                        ConfError::DanglingReference {
                            entity: id.clone(),
                            reference: template_id.clone(),
                            kind: ReferenceKind::Template,
                        }
                    })?;
                    layers.push((Scope::Template(template_id.clone()), &template.settings.params));
                }

                Some(owning_project(registry, id)?)
            }
            Scope::Template(id) => {
                let template = registry
                    .template(id)
                    .ok_or_else(|| ConfError::UnknownEntity { id: id.clone() })?;
                layers.push((scope.clone(), &template.settings.params));
                Some(owning_project(registry, id)?)
            }
        };

        let start = match owner {
            Some(project) => {
                layers.push((Scope::Project(project.id.clone()), &project.params));
                project.id.as_str()
            }
            None => scope.id(),
        };

        for ancestor in registry.ancestors(start)? {
            layers.push((Scope::Project(ancestor.id.clone()), &ancestor.params));
        }

        Ok(layers)
    }

    /// The raw value of `key` as seen from `scope`, without interpolation
    pub fn lookup(&self, scope: &Scope, key: &str) -> ConfResult<Option<ParamOrigin>> {
        Ok(self
            .chain(scope)?
            .into_iter()
            .find_map(|(defined_in, params)| {
                params.get(key).map(|value| ParamOrigin {
                    value: value.clone(),
                    defined_in,
                })
            }))
    }

    /// Every parameter visible from `scope` with the scope that wins for it
    pub fn effective(&self, scope: &Scope) -> ConfResult<BTreeMap<String, ParamOrigin>> {
        let mut out = BTreeMap::new();
        for (defined_in, params) in self.chain(scope)? {
            for (key, value) in params {
                out.entry(key.clone()).or_insert_with(|| ParamOrigin {
                    value: value.clone(),
                    defined_in: defined_in.clone(),
                });
            }
        }
        Ok(out)
    }

    /// Resolve `key` from `scope`, substituting placeholders recursively
    pub fn resolve(&self, scope: &Scope, key: &str) -> ConfResult<String> {
        self.session(scope)?.resolve(key)
    }

    /// Substitute every placeholder in `text` as seen from `scope`
    pub fn interpolate(&self, scope: &Scope, text: &str) -> ConfResult<String> {
        self.session(scope)?.interpolate(text)
    }

    /// Start a memoizing resolution session for `scope`
    pub fn session(&self, scope: &Scope) -> ConfResult<ParamSession<'r>> {
        Ok(ParamSession {
            registry: self.registry,
            scope: scope.clone(),
            layers: self.chain(scope)?,
            resolved: HashMap::new(),
            runtime_refs: BTreeSet::new(),
        })
    }
}

/// Resolution state for one requesting scope.
///
/// Every placeholder is resolved from the requesting scope, never from the
/// scope that declared the value, so a template value can expand differently
/// per configuration. Resolved keys are memoized for the session.
pub struct ParamSession<'r> {
    registry: &'r Registry,
    scope: Scope,
    layers: Vec<(Scope, &'r Params)>,
    resolved: HashMap<String, String>,
    runtime_refs: BTreeSet<String>,
}

impl<'r> ParamSession<'r> {
    /// The requesting scope
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Runtime parameters left as placeholders so far
    pub fn runtime_references(&self) -> &BTreeSet<String> {
        &self.runtime_refs
    }

    /// Every key visible from the requesting scope
    pub fn visible_keys(&self) -> BTreeSet<&'r str> {
        self.layers
            .iter()
            .flat_map(|&(_, params)| params.keys().map(String::as_str))
            .collect()
    }

    pub fn resolve(&mut self, key: &str) -> ConfResult<String> {
        let mut stack = Vec::new();
        self.resolve_key(key, &mut stack)
    }

    pub fn interpolate(&mut self, text: &str) -> ConfResult<String> {
        let mut stack = Vec::new();
        self.expand(text, &mut stack)
    }

    /// Resolve every visible parameter
    pub fn resolve_all(&mut self) -> ConfResult<BTreeMap<String, String>> {
        let mut out = BTreeMap::new();
        for key in self.visible_keys() {
            let value = self.resolve(key)?;
            out.insert(key.to_string(), value);
        }
        Ok(out)
    }

    fn raw(&self, key: &str) -> Option<&'r str> {
        self.layers
            .iter()
            .find_map(|&(_, params)| params.get(key).map(String::as_str))
    }

    fn resolve_key(&mut self, key: &str, stack: &mut Vec<String>) -> ConfResult<String> {
        if let Some(done) = self.resolved.get(key) {
            return Ok(done.clone());
        }

        if let Some(pos) = stack.iter().position(|k| k == key) {
            let mut chain = stack[pos..].to_vec();
            chain.push(key.to_string());
            return Err(ConfError::CyclicReference {
                key: key.to_string(),
                chain,
            });
        }

        let Some(raw) = self.raw(key) else {
            if self.registry.is_runtime_parameter(key) {
                self.runtime_refs.insert(key.to_string());
                return Ok(interpolate::placeholder(key));
            }
            return Err(ConfError::UnresolvedParameter {
                key: key.to_string(),
                scope: self.scope.to_string(),
            });
        };

        stack.push(key.to_string());
        let value = self.expand(raw, stack)?;
        stack.pop();

        self.resolved.insert(key.to_string(), value.clone());
        Ok(value)
    }

    fn expand(&mut self, text: &str, stack: &mut Vec<String>) -> ConfResult<String> {
        let mut out = String::with_capacity(text.len());
        for segment in interpolate::segments(text) {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                // the escape survives: snapshots stay in placeholder syntax
                Segment::Percent => out.push_str("%%"),
                Segment::Reference(name) => out.push_str(&self.resolve_key(name, stack)?),
            }
        }
        Ok(out)
    }
}
