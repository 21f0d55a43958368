//! Pipeline driver.
//!
//! Discovers the snapshot files of one day, aggregates each of them, combines the per-file
//! summaries and writes the final summary table as CSV.

use crate::aggregate;
use crate::combine::{self, CombineStrategy};
use crate::config::RunConfig;
use crate::error::PipelineError;
use crate::metrics::AGGREGATION_SECONDS;
use crate::models::{FileSummary, FinalSummary, SnapshotDate, SnapshotName, SNAPSHOT_PREFIX};

use rayon::prelude::*;
use serde::{Serialize, Serializer};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{event, Level};

/// Header row of the output file
pub const OUTPUT_HEADER: [&str; 3] = ["project", "total_views", "mean_processed_views"];

/// Outcome of a successful run
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunReport {
    /// Number of snapshot files aggregated
    pub files: usize,
    /// Number of projects in the output
    pub projects: usize,
    /// Wall-clock duration of parsing, aggregation and combination
    #[serde(rename = "elapsed_seconds", serialize_with = "serialize_seconds")]
    pub elapsed: Duration,
    /// Path of the output file
    pub output: PathBuf,
}

fn serialize_seconds<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Find the snapshot files of a day, restricted to a set of hours.
///
/// Returns paths sorted by file name, which is the enumeration order used for the rest of the run.
///
/// # Arguments
///
/// * `input_dir`: Directory holding the snapshot files
/// * `date`: Day of the snapshots
/// * `hours`: Hours of the day to keep
pub fn discover_snapshots(
    input_dir: &Path,
    date: SnapshotDate,
    hours: &[u8],
) -> Result<Vec<PathBuf>, PipelineError> {
    // Globbing silently yields nothing for a missing directory.
    std::fs::read_dir(input_dir).map_err(|source| PipelineError::InputDir {
        path: input_dir.to_owned(),
        source,
    })?;
    let pattern = format!(
        "{}/{}-{}-*0000.*",
        glob::Pattern::escape(&input_dir.to_string_lossy()),
        SNAPSHOT_PREFIX,
        date.compact()
    );
    let mut paths = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(SnapshotName::parse);
        match name {
            Some(name) if name.date == date && hours.contains(&name.hour) => paths.push(path),
            _ => event!(Level::DEBUG, file = %path.display(), "skipping file"),
        }
    }
    paths.sort();
    Ok(paths)
}

/// Parse and aggregate each file, preserving the order of `paths`.
///
/// # Arguments
///
/// * `paths`: Snapshot files in enumeration order
/// * `use_rayon`: Whether to process files on the Rayon thread pool
pub fn summarise_files(
    paths: &[PathBuf],
    use_rayon: bool,
) -> Result<Vec<FileSummary>, PipelineError> {
    if use_rayon {
        paths
            .par_iter()
            .map(|path| aggregate::aggregate_file(path))
            .collect()
    } else {
        paths
            .iter()
            .map(|path| aggregate::aggregate_file(path))
            .collect()
    }
}

/// Run parsing, aggregation and combination over a list of snapshot files.
///
/// Returns the final summary and the time taken.
pub fn aggregate_snapshots(
    paths: &[PathBuf],
    strategy: CombineStrategy,
    use_rayon: bool,
) -> Result<(FinalSummary, Duration), PipelineError> {
    let start = Instant::now();
    let summaries = summarise_files(paths, use_rayon)?;
    let summary = combine::combine(summaries, strategy);
    let elapsed = start.elapsed();
    AGGREGATION_SECONDS.observe(elapsed.as_secs_f64());
    Ok((summary, elapsed))
}

/// Format a mean for output.
///
/// Integral values keep a trailing `.0` so the column always reads as floating point.
pub fn format_mean(value: f64) -> String {
    let formatted = value.to_string();
    if value.is_finite() && !formatted.contains('.') {
        formatted + ".0"
    } else {
        formatted
    }
}

/// Write the final summary table as CSV.
///
/// The table is written to a temporary file next to `path` which then replaces `path`, so a
/// failed write leaves no partial output.
///
/// # Arguments
///
/// * `path`: Output file
/// * `summary`: Final summary table
pub fn write_summary(path: &Path, summary: &FinalSummary) -> Result<(), PipelineError> {
    let output_error = |source: std::io::Error| PipelineError::Output {
        path: path.to_owned(),
        source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(output_error)?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    let result = write_csv(&tmp_path, summary)
        .and_then(|()| std::fs::rename(&tmp_path, path).map_err(output_error));
    if result.is_err() {
        // The temporary file may not exist.
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}

fn write_csv(path: &Path, summary: &FinalSummary) -> Result<(), PipelineError> {
    let csv_error = |source: csv::Error| PipelineError::OutputCsv {
        path: path.to_owned(),
        source,
    };
    let file = std::fs::File::create(path).map_err(|source| PipelineError::Output {
        path: path.to_owned(),
        source,
    })?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(OUTPUT_HEADER).map_err(csv_error)?;
    for (project, total) in summary {
        let total_views = total.total_views.to_string();
        let mean = format_mean(total.mean_processed_views);
        writer
            .write_record([project.as_str(), total_views.as_str(), mean.as_str()])
            .map_err(csv_error)?;
    }
    let mut file = writer
        .into_inner()
        .map_err(|err| PipelineError::Output {
            path: path.to_owned(),
            source: err.into_error(),
        })?;
    file.flush().map_err(|source| PipelineError::Output {
        path: path.to_owned(),
        source,
    })
}

/// Run the pipeline described by `config`.
///
/// # Arguments
///
/// * `config`: Validated run configuration
#[tracing::instrument(level = "INFO", skip(config), fields(date = %config.date))]
pub fn run(config: &RunConfig) -> Result<RunReport, PipelineError> {
    let paths = discover_snapshots(&config.input_dir, config.date, &config.hours)?;
    if paths.is_empty() {
        event!(
            Level::WARN,
            input_dir = %config.input_dir.display(),
            "no snapshot files found"
        );
    } else {
        event!(Level::INFO, files = paths.len(), "discovered snapshot files");
    }

    let (summary, elapsed) =
        aggregate_snapshots(&paths, config.combine_strategy, config.use_rayon)?;
    event!(
        Level::INFO,
        files = paths.len(),
        projects = summary.len(),
        strategy = %config.combine_strategy,
        "Execution time: {:?}",
        elapsed
    );

    write_summary(&config.output, &summary)?;
    event!(Level::INFO, output = %config.output.display(), "wrote summary");

    Ok(RunReport {
        files: paths.len(),
        projects: summary.len(),
        elapsed,
        output: config.output.clone(),
    })
}
