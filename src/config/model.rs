// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::meta::Gvk;
use crate::types::HumanDuration;
use crate::vertex::DEFAULT_HEARTBEAT;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// heartbeat = "5s"
/// timeout = "10m"
///
/// [vertex.fetch]
/// cmd = "git fetch"
///
/// [vertex."Deployment.v1.apps"]
/// cmd = "kubectl apply -f deploy.yaml"
/// after = ["fetch"]
/// ```
///
/// All sections are optional at the TOML level; [`ConfigFile`] is the
/// validated form the rest of the crate works with.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Execution-wide settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All vertices from `[vertex.<name>]`, keyed by vertex name.
    #[serde(default)]
    pub vertex: BTreeMap<String, VertexConfig>,
}

/// Validated configuration. Only obtainable through
/// `ConfigFile::try_from(raw)` (see `config::validate`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub vertex: BTreeMap<String, VertexConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, vertex: BTreeMap<String, VertexConfig>) -> Self {
        Self { config, vertex }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// How often a vertex waiting on a silent dependency logs that it is
    /// still waiting. Not a deadline.
    #[serde(default = "default_heartbeat")]
    pub heartbeat: HumanDuration,

    /// Optional deadline for the whole execution. When it expires, waiting
    /// vertices give up and running commands are killed.
    #[serde(default)]
    pub timeout: Option<HumanDuration>,

    /// Execution name used in logs and the report. Defaults to the config
    /// file stem.
    #[serde(default)]
    pub name: Option<String>,
}

fn default_heartbeat() -> HumanDuration {
    HumanDuration(DEFAULT_HEARTBEAT)
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            heartbeat: default_heartbeat(),
            timeout: None,
            name: None,
        }
    }
}

impl ConfigSection {
    pub fn heartbeat(&self) -> Duration {
        self.heartbeat.as_duration()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(HumanDuration::as_duration)
    }
}

/// `[vertex.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct VertexConfig {
    /// Shell command run as this vertex's work.
    pub cmd: String,

    /// Dependencies: this vertex waits for every vertex listed here.
    #[serde(default)]
    pub after: Vec<String>,

    /// Regex; if any stdout line matches, the vertex fails even when the
    /// command exits successfully.
    #[serde(default)]
    pub fail_on_stdout: Option<String>,

    /// Explicit identity, e.g. `api_version = "apps/v1"`, `kind = "Deployment"`.
    /// Without `kind`, the identity is parsed from the vertex name.
    #[serde(default)]
    pub api_version: Option<String>,

    #[serde(default)]
    pub kind: Option<String>,

    /// Extra environment variables for the command.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl VertexConfig {
    /// Identity of the vertex called `name`.
    pub fn identity(&self, name: &str) -> Gvk {
        match self.kind.as_deref() {
            Some(kind) => Gvk::from_api_version_kind(self.api_version.as_deref().unwrap_or(""), kind),
            None => Gvk::from_dotted(name),
        }
    }
}
