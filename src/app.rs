//! Application entry points for each subcommand.

use crate::acquisition::{self, AcquisitionReport, HttpSnapshotSource};
use crate::cli::{Command, CommandLineArgs};
use crate::config::RunConfig;
use crate::error::PipelineError;
use crate::metrics;
use crate::pipeline::{self, RunReport};

use std::time::Duration;
use tracing::{event, Level};

/// Download the configured snapshots into the input directory.
pub async fn download(config: &RunConfig) -> Result<AcquisitionReport, PipelineError> {
    let source = HttpSnapshotSource::new(
        config.base_url.clone(),
        Duration::from_secs(config.timeout),
    )?;
    let report =
        acquisition::download_snapshots(&source, &config.input_dir, config.date, &config.hours)
            .await?;
    event!(
        Level::INFO,
        downloaded = report.downloaded.len(),
        missing = ?report.missing,
        "download complete"
    );
    Ok(report)
}

/// Aggregate the snapshots in the input directory.
///
/// Parsing and aggregation are CPU and file bound, so the pipeline runs on the blocking thread
/// pool.
pub async fn aggregate(config: &RunConfig) -> Result<RunReport, PipelineError> {
    let config = config.clone();
    let report = tokio::task::spawn_blocking(move || pipeline::run(&config)).await??;
    println!("{}", serde_json::to_string(&report)?);
    Ok(report)
}

/// Execute the subcommand selected on the command line.
pub async fn execute(args: &CommandLineArgs) -> Result<(), PipelineError> {
    let config = args.run_config()?;
    match args.command {
        Command::Aggregate => {
            aggregate(&config).await?;
        }
        Command::Download => {
            download(&config).await?;
        }
        Command::Run => {
            download(&config).await?;
            aggregate(&config).await?;
        }
    }
    if let Some(path) = &config.metrics_file {
        metrics::write_metrics(path)?;
    }
    Ok(())
}
