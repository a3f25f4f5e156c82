// src/dag/graph.rs

use std::collections::BTreeMap;

use crate::config::model::ConfigFile;
use crate::errors::{DagwalkError, Result};

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Direct dependencies: vertices that must complete before this one runs.
    deps: Vec<String>,
    /// Direct dependents: vertices that depend on this one.
    dependents: Vec<String>,
}

/// Simple in-memory DAG representation keyed by vertex name.
///
/// This only keeps adjacency information. Acyclicity is checked when a
/// config is validated; graphs built by hand are trusted to be acyclic.
#[derive(Debug, Clone, Default)]
pub struct DagGraph {
    nodes: BTreeMap<String, DagNode>,
}

impl DagGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a DAG from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let mut graph = Self::new();
        for (name, vertex) in cfg.vertex.iter() {
            graph.nodes.insert(
                name.clone(),
                DagNode {
                    deps: vertex.after.clone(),
                    dependents: Vec::new(),
                },
            );
        }
        graph.link_dependents();
        graph
    }

    /// Build a DAG from `(vertex, dependencies)` pairs.
    ///
    /// Fails if a dependency names a vertex that is not in the list, or if a
    /// vertex appears twice.
    pub fn from_edges<'a, I, D>(vertices: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, D)>,
        D: IntoIterator<Item = &'a str>,
    {
        let mut graph = Self::new();
        for (name, deps) in vertices {
            let node = DagNode {
                deps: deps.into_iter().map(str::to_string).collect(),
                dependents: Vec::new(),
            };
            if graph.nodes.insert(name.to_string(), node).is_some() {
                return Err(DagwalkError::ConfigError(format!(
                    "vertex '{}' defined more than once",
                    name
                )));
            }
        }

        for (name, node) in graph.nodes.iter() {
            if let Some(missing) = node.deps.iter().find(|d| !graph.nodes.contains_key(*d)) {
                return Err(DagwalkError::VertexNotFound(format!(
                    "'{}' (dependency of '{}')",
                    missing, name
                )));
            }
        }

        graph.link_dependents();
        Ok(graph)
    }

    /// Populate dependents from the dependency lists.
    fn link_dependents(&mut self) {
        let edges: Vec<(String, String)> = self
            .nodes
            .iter()
            .flat_map(|(name, node)| node.deps.iter().map(move |dep| (dep.clone(), name.clone())))
            .collect();

        for (dep, dependent) in edges {
            if let Some(dep_node) = self.nodes.get_mut(&dep) {
                dep_node.dependents.push(dependent);
            }
        }
    }

    /// All vertex names, sorted.
    pub fn vertices(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Immediate dependencies of a vertex (the vertices listed in its `after`).
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a vertex (vertices that list this one in their `after`).
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Vertices without dependencies.
    pub fn roots(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.deps.is_empty())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Every `(dependency, dependent)` edge.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nodes
            .iter()
            .flat_map(|(name, node)| node.deps.iter().map(move |dep| (dep.as_str(), name.as_str())))
    }
}
