//! Per-file aggregation.
//!
//! Each record contributes a derived metric, `processed_views = views^2`. Records are grouped by
//! project and each group is reduced to the sum of `views` and the mean of `processed_views`.

use crate::error::PipelineError;
use crate::metrics::FILES_PROCESSED;
use crate::models::{FileSummary, ProjectSummary, RawRecord};
use crate::parser;

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{event, Level};

/// The derived metric of a record.
///
/// Widened to `u128` so that squaring any `u64` view count cannot overflow.
pub fn processed_views(views: u64) -> u128 {
    u128::from(views) * u128::from(views)
}

/// Running totals for one project within one file.
#[derive(Debug, Default)]
struct GroupAccumulator {
    rows: u64,
    total_views: u64,
    processed_views: u128,
}

impl GroupAccumulator {
    fn add(&mut self, views: u64) {
        self.rows += 1;
        self.total_views += views;
        self.processed_views += processed_views(views);
    }

    fn finish(self) -> ProjectSummary {
        // Groups exist only once a record has been added, so rows is never zero.
        ProjectSummary {
            total_views: self.total_views,
            mean_processed_views: self.processed_views as f64 / self.rows as f64,
            rows: self.rows,
        }
    }
}

/// Reduce the records of one file to one summary per project.
///
/// # Arguments
///
/// * `source`: Snapshot file the records were parsed from
/// * `records`: Parsed records of the file
pub fn aggregate_records<I>(source: &Path, records: I) -> FileSummary
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut groups: BTreeMap<String, GroupAccumulator> = BTreeMap::new();
    for record in records {
        groups.entry(record.project).or_default().add(record.views);
    }
    FileSummary {
        source: source.to_owned(),
        projects: groups
            .into_iter()
            .map(|(project, group)| (project, group.finish()))
            .collect(),
    }
}

/// Parse and aggregate one snapshot file.
///
/// # Arguments
///
/// * `path`: Path of the snapshot file
pub fn aggregate_file(path: &Path) -> Result<FileSummary, PipelineError> {
    let records = parser::parse_snapshot(path)?;
    let rows = records.len();
    let summary = aggregate_records(path, records);
    FILES_PROCESSED.inc();
    event!(
        Level::DEBUG,
        file = %path.display(),
        rows,
        projects = summary.len(),
        "aggregated snapshot"
    );
    Ok(summary)
}
