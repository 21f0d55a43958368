//! Prometheus metrics.
//!
//! Metrics are collected in a process-local registry and may be written to a file in the text
//! exposition format once a run completes.

use crate::error::PipelineError;

use lazy_static::lazy_static;
use prometheus::{self, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use std::path::Path;

lazy_static! {
    // Registry for holding metric state
    pub static ref REGISTRY: Registry = Registry::new();
    // Snapshot files parsed and aggregated
    pub static ref FILES_PROCESSED: IntCounter = IntCounter::new(
        "pageviews_files_processed", "The number of snapshot files aggregated"
    ).unwrap();
    // Records parsed across all snapshot files
    pub static ref RECORDS_PARSED: IntCounter = IntCounter::new(
        "pageviews_records_parsed", "The number of snapshot records parsed"
    ).unwrap();
    // Snapshot downloads by outcome
    pub static ref DOWNLOADS: IntCounterVec = IntCounterVec::new(
        Opts::new("pageviews_downloads", "The number of snapshot downloads attempted"),
        &["outcome"]
    ).unwrap();
    // Duration of the aggregation phase
    pub static ref AGGREGATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts{
            common_opts: Opts::new("pageviews_aggregation_seconds", "The time taken to parse, aggregate and combine snapshots"),
            buckets: prometheus::exponential_buckets(0.01, 4.0, 10).unwrap(),
        },
    ).unwrap();
}

/// Register all metrics with the registry.
pub fn register_metrics() -> Result<(), PipelineError> {
    REGISTRY.register(Box::new(FILES_PROCESSED.clone()))?;
    REGISTRY.register(Box::new(RECORDS_PARSED.clone()))?;
    REGISTRY.register(Box::new(DOWNLOADS.clone()))?;
    REGISTRY.register(Box::new(AGGREGATION_SECONDS.clone()))?;
    Ok(())
}

/// Render the registry in the text exposition format.
pub fn render() -> Result<String, PipelineError> {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Write the rendered registry to a file.
///
/// # Arguments
///
/// * `path`: Destination file
pub fn write_metrics(path: &Path) -> Result<(), PipelineError> {
    let output = render()?;
    std::fs::write(path, output).map_err(|source| PipelineError::Output {
        path: path.to_owned(),
        source,
    })
}
