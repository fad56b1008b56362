// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! Entity registry
//!
//! Owns every declared entity and the project tree. Entities live in per-kind
//! arenas and are addressed through a single global id index, so an id is
//! unique across all kinds. After loading the registry is read-only.

mod cleanup;
mod merge;

pub use cleanup::EffectiveCleanupRule;
pub use merge::merge_settings;

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::errors::{ConfError, ConfResult, EntityKind};
use crate::model::{
    AgentPool, BuildConfiguration, DeclarationSet, Project, ProjectContents, ProjectDecl,
    ResolverSettings, Template, VcsRoot,
};

/// Longest id accepted
pub const MAX_ID_LENGTH: usize = 225;

static ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("id regex is valid"));

/// Check an id against the id syntax
pub fn validate_id(id: &str) -> ConfResult<()> {
    let reason = if id.is_empty() {
        "id must not be empty".to_string()
    } else if id.len() > MAX_ID_LENGTH {
        format!("id is {} characters long, the limit is {}", id.len(), MAX_ID_LENGTH)
    } else if !ID_REGEX.is_match(id) {
        "id contains characters other than letters, digits and underscores".to_string()
    } else {
        return Ok(());
    };

    Err(ConfError::InvalidId {
        id: id.to_string(),
        reason,
    })
}

/// Any entity that can be registered under a project
#[derive(Debug, Clone)]
pub enum Entity {
    Project(Project),
    BuildConfiguration(BuildConfiguration),
    Template(Template),
    VcsRoot(VcsRoot),
    AgentPool(AgentPool),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Self::Project(p) => &p.id,
            Self::BuildConfiguration(b) => &b.id,
            Self::Template(t) => &t.id,
            Self::VcsRoot(v) => &v.id,
            Self::AgentPool(a) => &a.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Project(_) => EntityKind::Project,
            Self::BuildConfiguration(_) => EntityKind::BuildConfiguration,
            Self::Template(_) => EntityKind::Template,
            Self::VcsRoot(_) => EntityKind::VcsRoot,
            Self::AgentPool(_) => EntityKind::AgentPool,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityRef {
    Project(usize),
    BuildConfiguration(usize),
    Template(usize),
    VcsRoot(usize),
    AgentPool(usize),
}

impl EntityRef {
    fn kind(self) -> EntityKind {
        match self {
            Self::Project(_) => EntityKind::Project,
            Self::BuildConfiguration(_) => EntityKind::BuildConfiguration,
            Self::Template(_) => EntityKind::Template,
            Self::VcsRoot(_) => EntityKind::VcsRoot,
            Self::AgentPool(_) => EntityKind::AgentPool,
        }
    }
}

#[derive(Debug, Clone)]
struct ProjectNode {
    project: Project,
    parent: Option<usize>,
    children: Vec<usize>,
    /// Non-project entities in registration order
    owned: Vec<EntityRef>,
}

#[derive(Debug, Clone)]
struct Owned<T> {
    owner: usize,
    item: T,
}

/// The project tree and every entity in it
#[derive(Debug, Clone)]
pub struct Registry {
    projects: Vec<ProjectNode>,
    build_configs: Vec<Owned<BuildConfiguration>>,
    templates: Vec<Owned<Template>>,
    vcs_roots: Vec<Owned<VcsRoot>>,
    agent_pools: Vec<Owned<AgentPool>>,
    index: HashMap<String, EntityRef>,
    settings: ResolverSettings,
    runtime_patterns: Vec<glob::Pattern>,
}

/// A project declaration with its nesting resolved
struct FlatProject {
    project: Project,
    contents: ProjectContents,
    parent: Option<String>,
}

impl Registry {
    /// Create a registry holding only `root`, with default resolver settings
    pub fn new(root: Project) -> ConfResult<Self> {
        validate_id(&root.id)?;

        let mut registry = Self {
            projects: Vec::new(),
            build_configs: Vec::new(),
            templates: Vec::new(),
            vcs_roots: Vec::new(),
            agent_pools: Vec::new(),
            index: HashMap::new(),
            settings: ResolverSettings::default(),
            runtime_patterns: Vec::new(),
        };
        registry.set_settings(ResolverSettings::default())?;
        registry.index.insert(root.id.clone(), EntityRef::Project(0));
        registry.projects.push(ProjectNode {
            project: root,
            parent: None,
            children: Vec::new(),
            owned: Vec::new(),
        });

        Ok(registry)
    }

    /// Replace the resolver settings, compiling runtime parameter patterns
    pub fn set_settings(&mut self, settings: ResolverSettings) -> ConfResult<()> {
        self.runtime_patterns = settings
            .runtime_parameters
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<Result<_, _>>()?;
        self.settings = settings;
        Ok(())
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Build a registry from a declaration set.
    ///
    /// Projects may be nested or refer to their parent by id; either way the
    /// set must describe a single tree.
    pub fn load(set: DeclarationSet) -> ConfResult<Self> {
        let settings = set.resolver_settings();

        let mut flat = Vec::new();
        for decl in set.projects {
            flatten(decl, None, &mut flat)?;
        }

        let ids: Vec<String> = flat.iter().map(|e| e.project.id.clone()).collect();
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for (pos, id) in ids.iter().enumerate() {
            validate_id(id)?;
            if positions.insert(id.as_str(), pos).is_some() {
                return Err(ConfError::DuplicateId {
                    id: id.to_string(),
                    kind: EntityKind::Project,
                    existing: EntityKind::Project,
                });
            }
        }

        for entry in &flat {
            if let Some(parent) = &entry.parent {
                if !positions.contains_key(parent.as_str()) {
                    return Err(ConfError::UnknownParent {
                        parent: parent.clone(),
                        child: entry.project.id.clone(),
                    });
                }
            }
        }

        let parents: Vec<Option<usize>> = flat
            .iter()
            .map(|e| e.parent.as_deref().and_then(|p| positions.get(p).copied()))
            .collect();
        detect_parent_cycle(&flat, &parents)?;

        let roots: Vec<usize> = (0..flat.len()).filter(|&i| parents[i].is_none()).collect();
        let root = match roots.as_slice() {
            [root] => *root,
            [] => {
                return Err(ConfError::InvalidDeclaration {
                    reason: "no root project declared".into(),
                    help: Some("Declare one project without a `parent`".into()),
                })
            }
            many => {
                let names: Vec<_> = many.iter().map(|&i| ids[i].as_str()).collect();
                return Err(ConfError::InvalidDeclaration {
                    reason: format!(
                        "expected exactly one root project, found {}",
                        names.join(", ")
                    ),
                    help: Some("Give every project but the root a `parent`".into()),
                });
            }
        };

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); flat.len()];
        for (pos, parent) in parents.iter().enumerate() {
            if let Some(parent) = parent {
                children[*parent].push(pos);
            }
        }

        let mut slots: Vec<Option<FlatProject>> = flat.into_iter().map(Some).collect();
        let mut registry: Option<Self> = None;
        let mut stack = vec![root];

        while let Some(pos) = stack.pop() {
            let Some(entry) = slots[pos].take() else {
                continue;
            };
            let id = ids[pos].as_str();

            match registry.as_mut() {
                None => registry = Some(Self::new(entry.project)?),
                Some(reg) => {
                    let parent = parents[pos].map(|p| ids[p].as_str()).unwrap_or_default();
                    reg.add_child(parent, entry.project)?;
                }
            }

            if let Some(reg) = registry.as_mut() {
                reg.register_contents(id, entry.contents)?;
            }

            stack.extend(children[pos].iter().rev());
        }

        let mut registry = registry.ok_or_else(|| ConfError::invalid("no projects declared"))?;
        registry.set_settings(settings)?;

        info!(
            projects = registry.projects.len(),
            build_configs = registry.build_configs.len(),
            templates = registry.templates.len(),
            vcs_roots = registry.vcs_roots.len(),
            "loaded declarations"
        );

        Ok(registry)
    }

    fn register_contents(&mut self, owner: &str, contents: ProjectContents) -> ConfResult<()> {
        for root in contents.vcs_roots {
            self.register(owner, Entity::VcsRoot(root))?;
        }
        for pool in contents.agent_pools {
            self.register(owner, Entity::AgentPool(pool))?;
        }
        for template in contents.templates {
            self.register(owner, Entity::Template(template))?;
        }
        for bc in contents.build_configs {
            self.register(owner, Entity::BuildConfiguration(bc))?;
        }
        Ok(())
    }

    /// Register `entity` under project `owner`
    pub fn register(&mut self, owner: &str, entity: Entity) -> ConfResult<()> {
        validate_id(entity.id())?;

        let owner_idx = match self.index.get(owner) {
            Some(EntityRef::Project(idx)) => *idx,
            _ => {
                return Err(ConfError::UnknownParent {
                    parent: owner.to_string(),
                    child: entity.id().to_string(),
                })
            }
        };

        let id = entity.id().to_string();
        if entity.kind() != EntityKind::Project {
            self.ensure_unused(&id, entity.kind())?;
        }

        let entity_ref = match entity {
            Entity::Project(project) => return self.add_child(owner, project),
            Entity::BuildConfiguration(item) => {
                self.build_configs.push(Owned { owner: owner_idx, item });
                EntityRef::BuildConfiguration(self.build_configs.len() - 1)
            }
            Entity::Template(item) => {
                self.templates.push(Owned { owner: owner_idx, item });
                EntityRef::Template(self.templates.len() - 1)
            }
            Entity::VcsRoot(item) => {
                self.vcs_roots.push(Owned { owner: owner_idx, item });
                EntityRef::VcsRoot(self.vcs_roots.len() - 1)
            }
            Entity::AgentPool(item) => {
                self.agent_pools.push(Owned { owner: owner_idx, item });
                EntityRef::AgentPool(self.agent_pools.len() - 1)
            }
        };

        debug!(id = %id, owner = %owner, kind = %entity_ref.kind(), "registered");
        self.projects[owner_idx].owned.push(entity_ref);
        self.index.insert(id, entity_ref);
        Ok(())
    }

    /// Attach `project` as the last child of `parent`
    pub fn add_child(&mut self, parent: &str, project: Project) -> ConfResult<()> {
        validate_id(&project.id)?;

        let parent_idx = match self.index.get(parent) {
            Some(EntityRef::Project(idx)) => *idx,
            _ => {
                return Err(ConfError::UnknownParent {
                    parent: parent.to_string(),
                    child: project.id.clone(),
                })
            }
        };

        let path = self.path_indices(parent_idx);
        if let Some(pos) = path
            .iter()
            .position(|&i| self.projects[i].project.id == project.id)
        {
            let mut cycle: Vec<String> = path[pos..]
                .iter()
                .map(|&i| self.projects[i].project.id.clone())
                .collect();
            cycle.push(project.id.clone());
            return Err(ConfError::CyclicParent { path: cycle });
        }

        self.ensure_unused(&project.id, EntityKind::Project)?;

        let idx = self.projects.len();
        debug!(id = %project.id, parent = %parent, "added project");
        self.index.insert(project.id.clone(), EntityRef::Project(idx));
        self.projects.push(ProjectNode {
            project,
            parent: Some(parent_idx),
            children: Vec::new(),
            owned: Vec::new(),
        });
        self.projects[parent_idx].children.push(idx);
        Ok(())
    }

    fn ensure_unused(&self, id: &str, kind: EntityKind) -> ConfResult<()> {
        match self.index.get(id) {
            Some(existing) => Err(ConfError::DuplicateId {
                id: id.to_string(),
                kind,
                existing: existing.kind(),
            }),
            None => Ok(()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lookups
    // ─────────────────────────────────────────────────────────────────────────

    pub fn root(&self) -> &Project {
        &self.projects[0].project
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn kind_of(&self, id: &str) -> Option<EntityKind> {
        self.index.get(id).map(|r| r.kind())
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        match self.index.get(id) {
            Some(EntityRef::Project(i)) => Some(&self.projects[*i].project),
            _ => None,
        }
    }

    pub fn build_config(&self, id: &str) -> Option<&BuildConfiguration> {
        match self.index.get(id) {
            Some(EntityRef::BuildConfiguration(i)) => Some(&self.build_configs[*i].item),
            _ => None,
        }
    }

    pub fn template(&self, id: &str) -> Option<&Template> {
        match self.index.get(id) {
            Some(EntityRef::Template(i)) => Some(&self.templates[*i].item),
            _ => None,
        }
    }

    pub fn vcs_root(&self, id: &str) -> Option<&VcsRoot> {
        match self.index.get(id) {
            Some(EntityRef::VcsRoot(i)) => Some(&self.vcs_roots[*i].item),
            _ => None,
        }
    }

    pub fn agent_pool(&self, id: &str) -> Option<&AgentPool> {
        match self.index.get(id) {
            Some(EntityRef::AgentPool(i)) => Some(&self.agent_pools[*i].item),
            _ => None,
        }
    }

    /// The project that owns `id`; for a project, its parent
    pub fn owner_of(&self, id: &str) -> Option<&Project> {
        let owner = match *self.index.get(id)? {
            EntityRef::Project(i) => self.projects[i].parent?,
            EntityRef::BuildConfiguration(i) => self.build_configs[i].owner,
            EntityRef::Template(i) => self.templates[i].owner,
            EntityRef::VcsRoot(i) => self.vcs_roots[i].owner,
            EntityRef::AgentPool(i) => self.agent_pools[i].owner,
        };
        Some(&self.projects[owner].project)
    }

    /// Whether `name` is supplied by the build runtime
    pub fn is_runtime_parameter(&self, name: &str) -> bool {
        self.runtime_patterns.iter().any(|p| p.matches(name))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Traversal
    // ─────────────────────────────────────────────────────────────────────────

    fn project_index(&self, id: &str) -> ConfResult<usize> {
        match self.index.get(id) {
            Some(EntityRef::Project(i)) => Ok(*i),
            Some(other) => Err(ConfError::invalid(format!(
                "'{}' is a {}, not a project",
                id,
                other.kind()
            ))),
            None => Err(ConfError::UnknownEntity { id: id.to_string() }),
        }
    }

    /// Root-first project indices ending at `idx`
    fn path_indices(&self, idx: usize) -> Vec<usize> {
        let mut path = vec![idx];
        let mut cur = idx;
        while let Some(parent) = self.projects[cur].parent {
            path.push(parent);
            cur = parent;
        }
        path.reverse();
        path
    }

    /// Direct sub-projects of `id`, in declaration order
    pub fn children(&self, id: &str) -> ConfResult<Vec<&Project>> {
        let idx = self.project_index(id)?;
        Ok(self.projects[idx]
            .children
            .iter()
            .map(|&c| &self.projects[c].project)
            .collect())
    }

    /// Ancestors of project `id`, parent first, root last
    pub fn ancestors(&self, id: &str) -> ConfResult<Vec<&Project>> {
        let idx = self.project_index(id)?;
        let mut out = Vec::new();
        let mut cur = self.projects[idx].parent;
        while let Some(i) = cur {
            out.push(&self.projects[i].project);
            cur = self.projects[i].parent;
        }
        Ok(out)
    }

    /// Projects from the root down to the project holding `id`.
    ///
    /// For a project the path ends with the project itself.
    pub fn project_path(&self, id: &str) -> ConfResult<Vec<&Project>> {
        let idx = match self.index.get(id) {
            Some(EntityRef::Project(i)) => *i,
            Some(_) => {
                let owner = self
                    .owner_of(id)
                    .ok_or_else(|| ConfError::UnknownEntity { id: id.to_string() })?;
                self.project_index(&owner.id)?
            }
            None => return Err(ConfError::UnknownEntity { id: id.to_string() }),
        };
        Ok(self
            .path_indices(idx)
            .into_iter()
            .map(|i| &self.projects[i].project)
            .collect())
    }

    /// Build configurations in the subtree of `id`, pre-order
    pub fn descendant_build_configs(&self, id: &str) -> ConfResult<Vec<&BuildConfiguration>> {
        let idx = self.project_index(id)?;
        let mut out = Vec::new();
        self.collect_build_configs(idx, &mut out);
        Ok(out)
    }

    fn collect_build_configs<'a>(&'a self, idx: usize, out: &mut Vec<&'a BuildConfiguration>) {
        let node = &self.projects[idx];
        for entity in &node.owned {
            if let EntityRef::BuildConfiguration(i) = entity {
                out.push(&self.build_configs[*i].item);
            }
        }
        for &child in &node.children {
            self.collect_build_configs(child, out);
        }
    }

    /// Every build configuration in declaration order
    pub fn build_configs(&self) -> Vec<&BuildConfiguration> {
        let mut out = Vec::new();
        self.collect_build_configs(0, &mut out);
        out
    }

    /// Every project, pre-order from the root
    pub fn projects(&self) -> Vec<&Project> {
        let mut out = Vec::new();
        let mut stack = vec![0];
        while let Some(idx) = stack.pop() {
            out.push(&self.projects[idx].project);
            stack.extend(self.projects[idx].children.iter().rev());
        }
        out
    }

    pub fn templates(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter().map(|t| &t.item)
    }

    pub fn vcs_roots(&self) -> impl Iterator<Item = &VcsRoot> {
        self.vcs_roots.iter().map(|v| &v.item)
    }

    pub fn agent_pools(&self) -> impl Iterator<Item = &AgentPool> {
        self.agent_pools.iter().map(|a| &a.item)
    }

    /// Ids and kinds of the non-project entities `id` owns directly
    pub fn owned_by(&self, id: &str) -> ConfResult<Vec<(&str, EntityKind)>> {
        let idx = self.project_index(id)?;
        Ok(self.projects[idx]
            .owned
            .iter()
            .map(|r| {
                let id = match *r {
                    EntityRef::BuildConfiguration(i) => self.build_configs[i].item.id.as_str(),
                    EntityRef::Template(i) => self.templates[i].item.id.as_str(),
                    EntityRef::VcsRoot(i) => self.vcs_roots[i].item.id.as_str(),
                    EntityRef::AgentPool(i) => self.agent_pools[i].item.id.as_str(),
                    EntityRef::Project(i) => self.projects[i].project.id.as_str(),
                };
                (id, r.kind())
            })
            .collect())
    }

    /// Number of registered entities of every kind
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Flatten nested declarations, pre-order
fn flatten(decl: ProjectDecl, enclosing: Option<&str>, out: &mut Vec<FlatProject>) -> ConfResult<()> {
    let parent = match (enclosing, decl.parent.clone()) {
        (Some(enclosing), Some(explicit)) if explicit != enclosing => {
            return Err(ConfError::InvalidDeclaration {
                reason: format!(
                    "project '{}' is nested in '{}' but declares parent '{}'",
                    decl.id, enclosing, explicit
                ),
                help: Some("Drop `parent` from nested projects".into()),
            });
        }
        (Some(enclosing), _) => Some(enclosing.to_string()),
        (None, explicit) => explicit,
    };

    let (project, contents, nested) = decl.split();
    let id = project.id.clone();
    out.push(FlatProject {
        project,
        contents,
        parent,
    });

    for child in nested {
        flatten(child, Some(&id), out)?;
    }
    Ok(())
}

/// Walk every parent chain, marking the current path, and report the first loop
fn detect_parent_cycle(flat: &[FlatProject], parents: &[Option<usize>]) -> ConfResult<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnPath,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; flat.len()];

    for start in 0..flat.len() {
        let mut path = Vec::new();
        let mut cur = Some(start);

        while let Some(i) = cur {
            match marks[i] {
                Mark::Done => break,
                Mark::OnPath => {
                    let pos = path.iter().position(|&p| p == i).unwrap_or(0);
                    let mut cycle: Vec<String> = path[pos..]
                        .iter()
                        .map(|&p: &usize| flat[p].project.id.clone())
                        .collect();
                    cycle.push(flat[i].project.id.clone());
                    return Err(ConfError::CyclicParent { path: cycle });
                }
                Mark::Unvisited => {
                    marks[i] = Mark::OnPath;
                    path.push(i);
                    cur = parents[i];
                }
            }
        }

        for i in path {
            marks[i] = Mark::Done;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BuildSettings;

    fn bc(id: &str) -> BuildConfiguration {
        BuildConfiguration {
            id: id.into(),
            name: id.into(),
            description: None,
            template: None,
            disabled: vec![],
            settings: BuildSettings::default(),
        }
    }

    const TREE: &str = r#"
projects:
  - id: _Root
    name: Root
    vcs_roots:
      - id: SharedRepo
        url: https://example.com/shared.git
    projects:
      - id: BusinessUnit
        name: Business Unit
        build_configs:
          - id: UnitBuild
            name: Build
      - id: JavaApplications
        name: Java Applications
        build_configs:
          - id: MavenBuild
            name: Maven Build
  - id: Libraries
    name: Libraries
    parent: JavaApplications
    build_configs:
      - id: LibBuild
        name: Library Build
"#;

    fn load(yaml: &str) -> ConfResult<Registry> {
        Registry::load(DeclarationSet::from_yaml(yaml)?)
    }

    #[test]
    fn test_load_nested_and_flat_projects() {
        let registry = load(TREE).unwrap();
        assert_eq!(registry.root().id, "_Root");

        let children: Vec<_> = registry
            .children("_Root")
            .unwrap()
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(children, vec!["BusinessUnit", "JavaApplications"]);

        let ancestors: Vec<_> = registry
            .ancestors("Libraries")
            .unwrap()
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ancestors, vec!["JavaApplications", "_Root"]);
    }

    #[test]
    fn test_descendants_in_declaration_order() {
        let registry = load(TREE).unwrap();
        let ids: Vec<_> = registry.build_configs().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["UnitBuild", "MavenBuild", "LibBuild"]);

        let java: Vec<_> = registry
            .descendant_build_configs("JavaApplications")
            .unwrap()
            .iter()
            .map(|b| b.id.as_str())
            .collect();
        assert_eq!(java, vec!["MavenBuild", "LibBuild"]);
    }

    #[test]
    fn test_project_path_and_owner() {
        let registry = load(TREE).unwrap();
        let path: Vec<_> = registry
            .project_path("LibBuild")
            .unwrap()
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(path, vec!["_Root", "JavaApplications", "Libraries"]);
        assert_eq!(registry.owner_of("SharedRepo").unwrap().id, "_Root");
        assert!(registry.owner_of("_Root").is_none());
        assert_eq!(registry.kind_of("SharedRepo"), Some(EntityKind::VcsRoot));
    }

    #[test]
    fn test_ids_are_global_across_kinds() {
        let mut registry = load(TREE).unwrap();
        let err = registry
            .register("Libraries", Entity::BuildConfiguration(bc("SharedRepo")))
            .unwrap_err();
        match err {
            ConfError::DuplicateId { id, kind, existing } => {
                assert_eq!(id, "SharedRepo");
                assert_eq!(kind, EntityKind::BuildConfiguration);
                assert_eq!(existing, EntityKind::VcsRoot);
            }
            other => panic!("expected duplicate id, got {other:?}"),
        }
    }

    #[test]
    fn test_register_under_unknown_owner() {
        let mut registry = Registry::new(Project::new("_Root", "Root")).unwrap();
        assert!(matches!(
            registry.register("Nope", Entity::BuildConfiguration(bc("Build"))),
            Err(ConfError::UnknownParent { .. })
        ));

        registry
            .register("_Root", Entity::BuildConfiguration(bc("Build")))
            .unwrap();
        // A build configuration is not a valid owner
        assert!(matches!(
            registry.register("Build", Entity::BuildConfiguration(bc("Other"))),
            Err(ConfError::UnknownParent { .. })
        ));
    }

    #[test]
    fn test_add_child_rejects_ancestor() {
        let mut registry = Registry::new(Project::new("_Root", "Root")).unwrap();
        registry.add_child("_Root", Project::new("A", "A")).unwrap();
        registry.add_child("A", Project::new("B", "B")).unwrap();

        let err = registry.add_child("B", Project::new("A", "A again")).unwrap_err();
        match err {
            ConfError::CyclicParent { path } => assert_eq!(path, vec!["A", "B", "A"]),
            other => panic!("expected cyclic parent, got {other:?}"),
        }

        assert!(matches!(
            registry.add_child("B", Project::new("B", "self")),
            Err(ConfError::CyclicParent { .. })
        ));
        assert!(matches!(
            registry.add_child("Missing", Project::new("C", "C")),
            Err(ConfError::UnknownParent { .. })
        ));
    }

    #[test]
    fn test_add_child_duplicate_elsewhere() {
        let mut registry = Registry::new(Project::new("_Root", "Root")).unwrap();
        registry.add_child("_Root", Project::new("A", "A")).unwrap();
        registry.add_child("_Root", Project::new("B", "B")).unwrap();
        assert!(matches!(
            registry.add_child("B", Project::new("A", "A")),
            Err(ConfError::DuplicateId { .. })
        ));
    }

    #[test]
    fn test_load_detects_parent_cycle() {
        let yaml = r#"
projects:
  - { id: _Root, name: Root }
  - { id: A, name: A, parent: B }
  - { id: B, name: B, parent: A }
"#;
        match load(yaml).unwrap_err() {
            ConfError::CyclicParent { path } => {
                assert_eq!(path.first(), path.last());
                assert!(path.contains(&"A".to_string()));
                assert!(path.contains(&"B".to_string()));
            }
            other => panic!("expected cyclic parent, got {other:?}"),
        }
    }

    #[test]
    fn test_load_requires_single_root() {
        let yaml = r#"
projects:
  - { id: One, name: One }
  - { id: Two, name: Two }
"#;
        assert!(matches!(
            load(yaml),
            Err(ConfError::InvalidDeclaration { .. })
        ));
    }

    #[test]
    fn test_load_unknown_parent() {
        let yaml = r#"
projects:
  - { id: _Root, name: Root }
  - { id: Orphan, name: Orphan, parent: Ghost }
"#;
        match load(yaml).unwrap_err() {
            ConfError::UnknownParent { parent, child } => {
                assert_eq!(parent, "Ghost");
                assert_eq!(child, "Orphan");
            }
            other => panic!("expected unknown parent, got {other:?}"),
        }
    }

    #[test]
    fn test_id_syntax() {
        assert!(validate_id("_Root").is_ok());
        assert!(validate_id("JavaApplications_MavenBuild2").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("2fast").is_err());
        assert!(validate_id("has-dash").is_err());
        assert!(validate_id(&"a".repeat(MAX_ID_LENGTH)).is_ok());
        assert!(matches!(
            validate_id(&"a".repeat(MAX_ID_LENGTH + 1)),
            Err(ConfError::InvalidId { .. })
        ));
    }

    #[test]
    fn test_runtime_parameter_patterns() {
        let registry = load(TREE).unwrap();
        assert!(registry.is_runtime_parameter("build.number"));
        assert!(registry.is_runtime_parameter("build.vcs.number.JavaRepo"));
        assert!(registry.is_runtime_parameter("teamcity.build.checkoutDir"));
        assert!(!registry.is_runtime_parameter("business.unit"));
    }

    #[test]
    fn test_registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
