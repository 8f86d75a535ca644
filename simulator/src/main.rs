use anyhow::Context;
use clap::Parser;
use fieldcore::interface::{AggregationMethod, ResultRecord};
use gui_bridge::bridge::GuiBridge;
use log::info;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::import::{load_workload, Workload};
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Field transform workflow driver")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// JSON inputs: an array, an object of named arrays, or {"frames": [[...]]}
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long, default_value_t = 256)]
    length: usize,
    #[arg(long, default_value_t = 8.0)]
    frequency: f64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Generate this many frames instead of a single field
    #[arg(long, default_value_t = 0)]
    frames: usize,
    /// Reduction applied to each frame (mean_magnitude or entropy)
    #[arg(long)]
    method: Option<AggregationMethod>,
    /// Spread frames across worker threads
    #[arg(long, default_value_t = false)]
    parallel: bool,
    /// Write the result record(s) as JSON
    #[arg(long)]
    output: Option<PathBuf>,
    /// Keep the HTTP bridge alive for incoming requests
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long, default_value = "127.0.0.1:9000")]
    bind: SocketAddr,
}

fn summarize(record: &ResultRecord) {
    let scalars: Vec<String> = record
        .iter()
        .filter_map(|(name, artifact)| artifact.as_scalar().map(|v| format!("{name}={v:.6}")))
        .collect();
    println!(
        "Run -> {} artifacts, scalars [{}]",
        record.len(),
        scalars.join(", ")
    );
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.length, args.frequency, args.seed, args.frames)
    };
    if let Some(method) = args.method {
        workflow_config.method = method;
    }

    let runner = Arc::new(Runner::new(workflow_config.clone()));
    let gui_bridge = GuiBridge::new();

    let workload = match &args.input {
        Some(path) => load_workload(path)?,
        None if workflow_config.frames > 0 => Workload::Frames(
            runner.generate_frames(&workflow_config.generator, workflow_config.frames)?,
        ),
        None => Workload::Single(runner.generate(&workflow_config.generator)?),
    };

    let report = match workload {
        Workload::Single(inputs) => {
            let record = runner.execute(inputs)?;
            summarize(&record);
            gui_bridge.publish(&record);
            serde_json::to_value(&record).context("serializing result record")?
        }
        Workload::Frames(frames) => {
            let records = if args.parallel {
                runner.execute_frames_parallel(&frames)?
            } else {
                runner.execute_frames(&frames)?
            };
            let method = workflow_config.method.as_str();
            let values: Vec<f64> = records
                .iter()
                .filter_map(|record| record.scalar(method))
                .collect();
            println!(
                "Frame run -> {} frames of {} samples, {method} per frame {:?}",
                frames.frame_count(),
                frames.frame_len(),
                values
            );
            if let Some(last) = records.last() {
                gui_bridge.publish(last);
            }
            serde_json::to_value(&records).context("serializing frame records")?
        }
    };

    if let Some(path) = &args.output {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(&report)?;
        fs::write(path, text).with_context(|| format!("writing results to {}", path.display()))?;
        info!("results written to {}", path.display());
    }

    let metrics = runner.metrics();
    info!(
        "metrics: processed={} errors={} frames={}",
        metrics.processed, metrics.errors, metrics.frames
    );

    if args.serve {
        let bound = gui_bridge.spawn(runner.clone(), args.bind)?;
        gui_bridge.publish_status(&format!("HTTP bridge running on {bound} (Ctrl+C to stop)..."));
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
