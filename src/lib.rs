// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod kv;
pub mod logging;
pub mod meta;
pub mod records;
pub mod signal;
pub mod types;
pub mod vertex;
pub mod work;

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::DagGraph;
use crate::engine::{ExecutionBuilder, ExecutionOptions, ExecutionReport};
use crate::errors::DagwalkError;
use crate::kv::Kv;
use crate::work::{CommandVertex, CommandWork, VertexWork};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - DAG + execution wiring
/// - the shell-command work function
/// - Ctrl-C handling
/// - report output
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let name = execution_name(&args, &cfg);
    let graph = DagGraph::from_config(&cfg);

    let mut options = ExecutionOptions::from_config(&cfg.config);
    if let Some(timeout) = args.timeout {
        options.timeout = Some(timeout.as_duration());
    }

    let outputs = Kv::new();
    let work: Arc<dyn VertexWork<CommandVertex>> =
        Arc::new(CommandWork::new(&name, outputs.clone()));

    let execution = ExecutionBuilder::new(&name)
        .options(options)
        .outputs(outputs)
        .build(&graph, work, |vertex| {
            let vertex_cfg = cfg
                .vertex
                .get(vertex)
                .ok_or_else(|| DagwalkError::VertexNotFound(vertex.to_string()))?;
            CommandVertex::from_config(vertex, vertex_cfg)
        })?;

    // Ctrl-C → cancel the execution; running commands get killed.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            warn!("Ctrl-C received; cancelling execution");
            cancel.cancel();
        });
    }

    let report = execution.run(cancel).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    report.into_result()?;
    Ok(())
}

/// `--name`, else `[config].name`, else the config file stem.
fn execution_name(args: &CliArgs, cfg: &ConfigFile) -> String {
    args.name
        .clone()
        .or_else(|| cfg.config.name.clone())
        .or_else(|| {
            args.config
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "dagwalk".to_string())
}

/// One line per vertex: status, name, duration, reason.
fn print_summary(report: &ExecutionReport) {
    println!(
        "execution {}: {}",
        report.execution,
        if report.success { "succeeded" } else { "failed" }
    );
    for (name, result) in report.vertices.iter() {
        let status = match (result.success, result.was_run()) {
            (true, _) => "ok",
            (false, true) => "FAILED",
            (false, false) => "skipped",
        };
        let took = result
            .start
            .map(|start| format!("{}ms", (result.finish - start).num_milliseconds()))
            .unwrap_or_else(|| "-".to_string());
        println!("  {status:<8} {name:<32} {took:>10}  {}", result.reason);
    }
    if report.cancelled {
        println!("  (execution was cancelled)");
    }
}

/// Simple dry-run output: print vertices, deps, commands and identities.
fn print_dry_run(cfg: &ConfigFile) {
    let graph = DagGraph::from_config(cfg);

    println!("dagwalk dry-run");
    println!("  config.heartbeat = {}", cfg.config.heartbeat);
    match cfg.config.timeout {
        Some(t) => println!("  config.timeout = {t}"),
        None => println!("  config.timeout = none"),
    }
    println!("  roots = {:?}", graph.roots());
    println!();

    println!("vertices ({}):", cfg.vertex.len());
    for (name, vertex) in cfg.vertex.iter() {
        println!("  - {name}");
        println!("      cmd: {}", vertex.cmd);
        if !vertex.after.is_empty() {
            println!("      after: {:?}", vertex.after);
        }
        let identity = vertex.identity(name);
        if !identity.is_empty() {
            println!("      identity: {identity}");
        }
        if let Some(ref pattern) = vertex.fail_on_stdout {
            println!("      fail_on_stdout: {pattern}");
        }
        if !vertex.env.is_empty() {
            println!("      env: {:?}", vertex.env);
        }
        let dependents = graph.dependents_of(name);
        if !dependents.is_empty() {
            println!("      dependents: {:?}", dependents);
        }
    }

    debug!("dry-run complete (no execution)");
}
