// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DagwalkError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DagwalkError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.vertex))
    }
}

/// Run every semantic check on a raw config.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_vertices(cfg)?;
    validate_global_config(cfg)?;
    validate_vertices(cfg)?;
    validate_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_vertices(cfg: &RawConfigFile) -> Result<()> {
    if cfg.vertex.is_empty() {
        return Err(DagwalkError::ConfigError(
            "config must contain at least one [vertex.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.heartbeat().is_zero() {
        return Err(DagwalkError::ConfigError(
            "[config].heartbeat must be greater than zero".to_string(),
        ));
    }

    if cfg.config.timeout().is_some_and(|t| t.is_zero()) {
        return Err(DagwalkError::ConfigError(
            "[config].timeout must be greater than zero when set".to_string(),
        ));
    }

    if cfg.config.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(DagwalkError::ConfigError(
            "[config].name must not be empty when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_vertices(cfg: &RawConfigFile) -> Result<()> {
    for (name, vertex) in cfg.vertex.iter() {
        if vertex.cmd.trim().is_empty() {
            return Err(DagwalkError::ConfigError(format!(
                "vertex '{}' has an empty `cmd`",
                name
            )));
        }

        if let Some(pattern) = vertex.fail_on_stdout.as_deref() {
            Regex::new(pattern).map_err(|e| {
                DagwalkError::ConfigError(format!(
                    "vertex '{}' has an invalid `fail_on_stdout` regex: {}",
                    name, e
                ))
            })?;
        }

        if vertex.api_version.is_some() && vertex.kind.is_none() {
            return Err(DagwalkError::ConfigError(format!(
                "vertex '{}' sets `api_version` without `kind`",
                name
            )));
        }
    }
    Ok(())
}

fn validate_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, vertex) in cfg.vertex.iter() {
        for (idx, dep) in vertex.after.iter().enumerate() {
            if !cfg.vertex.contains_key(dep) {
                return Err(DagwalkError::ConfigError(format!(
                    "vertex '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(DagwalkError::ConfigError(format!(
                    "vertex '{}' cannot depend on itself in `after`",
                    name
                )));
            }
            // One signal per edge: a repeated entry would need two.
            if vertex.after[..idx].contains(dep) {
                return Err(DagwalkError::ConfigError(format!(
                    "vertex '{}' lists dependency '{}' more than once in `after`",
                    name, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> vertex
    // For:
    //   [vertex.B]
    //   after = ["A"]
    // we add edge A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.vertex.keys() {
        graph.add_node(name.as_str());
    }

    for (name, vertex) in cfg.vertex.iter() {
        for dep in vertex.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(DagwalkError::DagCycle(format!(
                "cycle detected in vertex DAG involving vertex '{}'",
                node
            )))
        }
    }
}
