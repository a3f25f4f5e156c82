// src/work/command.rs

//! Shell-command work function used by the `dagwalk` binary.

use std::collections::{BTreeMap, VecDeque};
use std::process::Stdio;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::model::VertexConfig;
use crate::errors::DagwalkError;
use crate::kv::Kv;
use crate::meta::Gvk;
use crate::work::backend::{VertexWork, WorkFuture};

/// How many trailing stdout lines are kept in the vertex output.
const STDOUT_TAIL: usize = 64;

/// Per-vertex data for [`CommandWork`]. Serialized as the vertex input payload.
#[derive(Debug, Clone, Serialize)]
pub struct CommandVertex {
    pub cmd: String,
    pub identity: Gvk,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_on_stdout: Option<String>,
    #[serde(skip)]
    fail_pattern: Option<Regex>,
}

impl CommandVertex {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            identity: Gvk::default(),
            env: BTreeMap::new(),
            fail_on_stdout: None,
            fail_pattern: None,
        }
    }

    pub fn from_config(name: &str, cfg: &VertexConfig) -> crate::errors::Result<Self> {
        let mut vertex = Self::new(cfg.cmd.clone()).with_identity(cfg.identity(name));
        vertex.env = cfg.env.clone();
        if let Some(pattern) = cfg.fail_on_stdout.as_deref() {
            vertex = vertex.with_fail_on_stdout(pattern)?;
        }
        Ok(vertex)
    }

    pub fn with_identity(mut self, identity: Gvk) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Fail the vertex if any stdout line matches `pattern`.
    pub fn with_fail_on_stdout(mut self, pattern: &str) -> crate::errors::Result<Self> {
        let re = Regex::new(pattern).map_err(|e| {
            DagwalkError::ConfigError(format!("invalid fail_on_stdout regex '{pattern}': {e}"))
        })?;
        self.fail_on_stdout = Some(pattern.to_string());
        self.fail_pattern = Some(re);
        Ok(self)
    }
}

/// Runs each vertex's command through the platform shell.
///
/// The command's exit code and the tail of its stdout are recorded in the
/// shared output store under the vertex name.
#[derive(Debug, Clone)]
pub struct CommandWork {
    execution_name: String,
    outputs: Kv,
}

impl CommandWork {
    pub fn new(execution_name: impl Into<String>, outputs: Kv) -> Self {
        Self {
            execution_name: execution_name.into(),
            outputs,
        }
    }

    async fn run_command(
        &self,
        cancel: CancellationToken,
        vertex: &str,
        data: &CommandVertex,
    ) -> Result<bool> {
        info!(
            execution = %self.execution_name,
            vertex = %vertex,
            cmd = %data.cmd,
            "starting vertex command"
        );

        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&data.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&data.cmd);
            c
        };

        cmd.env("DAGWALK_EXECUTION", &self.execution_name)
            .env("DAGWALK_VERTEX", vertex)
            .env("DAGWALK_KIND", &data.identity.kind)
            .env("DAGWALK_VERSION", &data.identity.version)
            .env("DAGWALK_GROUP", &data.identity.group)
            .envs(&data.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group, so background jobs of the command can be killed
        // together with it.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process for vertex '{}'", vertex))?;
        // The pid doubles as the process group id; `child.id()` is gone once
        // the shell has been reaped.
        let pgid = child.id();

        // Always consume stderr so buffers don't fill; log at debug.
        if let Some(stderr) = child.stderr.take() {
            let vertex_name = vertex.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(vertex = %vertex_name, "stderr: {}", line);
                }
            });
        }

        let stdout_reader = child.stdout.take().map(|stdout| {
            let vertex_name = vertex.to_string();
            let pattern = data.fail_pattern.clone();
            tokio::spawn(async move {
                let mut tail = VecDeque::with_capacity(STDOUT_TAIL);
                let mut matched = false;
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!(vertex = %vertex_name, "stdout: {}", line);
                    if pattern.as_ref().is_some_and(|re| re.is_match(&line)) {
                        warn!(vertex = %vertex_name, line = %line, "stdout matched fail_on_stdout");
                        matched = true;
                    }
                    if tail.len() == STDOUT_TAIL {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
                (Vec::from(tail), matched)
            })
        });

        let status = tokio::select! {
            status_res = child.wait() => status_res
                .with_context(|| format!("waiting for process of vertex '{}'", vertex))?,
            _ = cancel.cancelled() => {
                self.cancel_command(&mut child, pgid, stdout_reader, vertex).await;
                return Ok(false);
            }
        };

        // The shell is gone, but a background job may still hold stdout open.
        let (stdout, matched) = match stdout_reader {
            Some(mut handle) => tokio::select! {
                res = &mut handle => res
                    .with_context(|| format!("reading stdout of vertex '{}'", vertex))?,
                _ = cancel.cancelled() => {
                    self.cancel_command(&mut child, pgid, Some(handle), vertex).await;
                    return Ok(false);
                }
            },
            None => (Vec::new(), false),
        };

        let success = status.success() && !matched;
        info!(
            execution = %self.execution_name,
            vertex = %vertex,
            exit_code = ?status.code(),
            success,
            "vertex command exited"
        );

        self.outputs.add_entry(
            vertex,
            json!({
                "exit_code": status.code(),
                "stdout": stdout,
                "fail_on_stdout_matched": matched,
            }),
        );
        Ok(success)
    }

    /// Kill the command and everything in its process group, then record the
    /// cancellation.
    async fn cancel_command(
        &self,
        child: &mut Child,
        pgid: Option<u32>,
        stdout_reader: Option<JoinHandle<(Vec<String>, bool)>>,
        vertex: &str,
    ) {
        info!(
            execution = %self.execution_name,
            vertex = %vertex,
            "cancellation requested; killing vertex command"
        );

        #[cfg(unix)]
        {
            if let Some(pgid) = pgid {
                // Shell builtin `kill`: a standalone binary is not guaranteed.
                match Command::new("sh")
                    .arg("-c")
                    .arg(format!("kill -s KILL -- -{pgid}"))
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .await
                {
                    Ok(status) if status.success() => {}
                    Ok(status) => {
                        debug!(vertex = %vertex, pgid, ?status, "process group already gone")
                    }
                    Err(e) => warn!(vertex = %vertex, pgid, error = %e, "failed to kill process group"),
                }
            }
        }
        #[cfg(not(unix))]
        let _ = pgid;

        // Already reaped when only a background job was left.
        if let Err(e) = child.kill().await {
            debug!(vertex = %vertex, error = %e, "vertex command already exited");
        }
        if let Some(handle) = stdout_reader {
            handle.abort();
        }
        self.outputs
            .add_entry(vertex, json!({ "exit_code": null, "cancelled": true }));
    }
}

impl VertexWork<CommandVertex> for CommandWork {
    fn run<'a>(
        &'a self,
        cancel: CancellationToken,
        vertex: &'a str,
        data: &'a CommandVertex,
    ) -> WorkFuture<'a> {
        Box::pin(async move {
            match self.run_command(cancel, vertex, data).await {
                Ok(success) => success,
                Err(err) => {
                    error!(
                        execution = %self.execution_name,
                        vertex = %vertex,
                        error = %format!("{err:#}"),
                        "vertex command error"
                    );
                    self.outputs
                        .add_entry(vertex, json!({ "exit_code": null, "error": format!("{err:#}") }));
                    false
                }
            }
        })
    }
}
