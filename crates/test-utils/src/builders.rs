#![allow(dead_code)]

use std::collections::BTreeMap;

use dagwalk::config::{ConfigFile, ConfigSection, RawConfigFile, VertexConfig};
use dagwalk::types::HumanDuration;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                vertex: BTreeMap::new(),
            },
        }
    }

    pub fn with_vertex(mut self, name: &str, vertex: VertexConfig) -> Self {
        self.config.vertex.insert(name.to_string(), vertex);
        self
    }

    pub fn heartbeat(mut self, duration: &str) -> Self {
        self.config.config.heartbeat = parse_duration(duration);
        self
    }

    pub fn timeout(mut self, duration: &str) -> Self {
        self.config.config.timeout = Some(parse_duration(duration));
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.config.config.name = Some(name.to_string());
        self
    }

    /// The unvalidated config, for exercising validation errors.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_duration(s: &str) -> HumanDuration {
    s.parse().expect("valid duration in test builder")
}

/// Builder for `VertexConfig`.
pub struct VertexConfigBuilder {
    vertex: VertexConfig,
}

impl VertexConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            vertex: VertexConfig {
                cmd: cmd.to_string(),
                after: vec![],
                fail_on_stdout: None,
                api_version: None,
                kind: None,
                env: BTreeMap::new(),
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.vertex.after.push(dep.to_string());
        self
    }

    pub fn fail_on_stdout(mut self, pattern: &str) -> Self {
        self.vertex.fail_on_stdout = Some(pattern.to_string());
        self
    }

    pub fn api_version(mut self, api_version: &str) -> Self {
        self.vertex.api_version = Some(api_version.to_string());
        self
    }

    pub fn kind(mut self, kind: &str) -> Self {
        self.vertex.kind = Some(kind.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.vertex.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> VertexConfig {
        self.vertex
    }
}
