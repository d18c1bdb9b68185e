// src/lib.rs

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::{Graph, GraphOptions, OpStatus};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - stage file loading
/// - graph construction from the stages
/// - Ctrl-C and `--timeout` cancellation
/// - the run itself and the printed summary
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    let options = graph_options(&cfg, &args);
    let graph = bootstrap::build_graph(&cfg, options)?;

    if args.dry_run {
        print_dry_run(&cfg, &graph)?;
        return Ok(());
    }

    let token = CancellationToken::new();

    // Ctrl-C → cancel the run; callbacks observe it cooperatively.
    {
        let token = token.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl-C received; cancelling run");
            token.cancel();
        });
    }

    if let Some(secs) = args.timeout {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            warn!(timeout_secs = secs, "run deadline reached; cancelling run");
            token.cancel();
        });
    }

    let result = graph.run(token).await;
    print_summary(&graph)?;
    result?;
    Ok(())
}

/// CLI flags can only switch options on; they never disable what the stage
/// file enables.
fn graph_options(cfg: &ConfigFile, args: &CliArgs) -> GraphOptions {
    let mut options = cfg.config.graph_options();
    options.enable_init |= args.enable_init;
    options.collect_orphans |= args.collect_orphans;
    options
}

/// Print options, layers and the commands of every stage.
fn print_dry_run(cfg: &ConfigFile, graph: &Graph) -> Result<()> {
    let options = graph.options();
    println!("stagedag dry-run");
    println!("  config.enable_init = {}", options.enable_init);
    println!("  config.collect_orphans = {}", options.collect_orphans);
    println!();

    for (depth, layer) in graph.layers()?.iter().enumerate() {
        println!("layer {depth}:");
        for name in layer {
            println!("  - {name}");
            let Some(stage) = cfg.stage.get(name) else {
                continue;
            };
            for file in &stage.files {
                println!("      file: {} ({:?})", file.path.display(), file.encoding);
            }
            for cmd in &stage.commands {
                println!("      cmd: {cmd}");
            }
            let deps = graph.dependencies_of(name);
            if !deps.is_empty() {
                println!("      after: {deps:?}");
            }
            if stage.fatal {
                println!("      fatal: true");
            }
            if stage.background {
                println!("      background: true");
            }
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}

fn print_summary(graph: &Graph) -> Result<()> {
    for (depth, layer) in graph.analyze()?.iter().enumerate() {
        println!("layer {depth}:");
        for report in layer {
            let status = match report.status {
                OpStatus::Pending => "pending",
                OpStatus::Skipped => "skipped",
                OpStatus::Running => "running",
                OpStatus::Succeeded => "ok",
                OpStatus::Failed => "FAILED",
            };
            match &report.error {
                Some(err) => println!("  {:<24} {status}: {err:#}", report.name),
                None => println!("  {:<24} {status}", report.name),
            }
        }
    }
    Ok(())
}
