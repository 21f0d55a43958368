//! Combination of per-file summaries.
//!
//! Per-file summaries are grouped by project. Totals are summed. Means are combined according to
//! a [CombineStrategy]: by default the unweighted mean of the per-file means, which is not in
//! general equal to the mean over all rows.

use crate::models::{FileSummary, FinalSummary, ProjectSummary, ProjectTotal};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::Display;

/// How per-file means are combined into a final mean
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, PartialEq, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CombineStrategy {
    /// Unweighted mean of the per-file means
    #[default]
    MeanOfMeans,
    /// Mean over all rows, weighting each per-file mean by its row count
    RowWeighted,
}

/// Running totals for one project across files.
#[derive(Debug, Default)]
struct ProjectAccumulator {
    total_views: u64,
    files: u64,
    mean_sum: f64,
    rows: u64,
    weighted_sum: f64,
}

impl ProjectAccumulator {
    fn add(&mut self, summary: &ProjectSummary) {
        self.total_views += summary.total_views;
        self.files += 1;
        self.mean_sum += summary.mean_processed_views;
        self.rows += summary.rows;
        self.weighted_sum += summary.mean_processed_views * summary.rows as f64;
    }

    fn finish(self, strategy: CombineStrategy) -> ProjectTotal {
        let mean_processed_views = match strategy {
            CombineStrategy::MeanOfMeans => self.mean_sum / self.files as f64,
            CombineStrategy::RowWeighted => self.weighted_sum / self.rows as f64,
        };
        ProjectTotal {
            total_views: self.total_views,
            mean_processed_views,
        }
    }
}

/// Incremental combiner of per-file summaries.
///
/// Summaries may be pushed as they are produced; the result does not depend on the order in
/// which they are pushed, up to floating point rounding.
#[derive(Debug, Default)]
pub struct Combiner {
    strategy: CombineStrategy,
    files: usize,
    projects: BTreeMap<String, ProjectAccumulator>,
}

impl Combiner {
    /// Return a new Combiner
    pub fn new(strategy: CombineStrategy) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    /// Add the summary of one file.
    pub fn push(&mut self, summary: FileSummary) {
        self.files += 1;
        for (project, project_summary) in summary.projects {
            self.projects
                .entry(project)
                .or_default()
                .add(&project_summary);
        }
    }

    /// Number of file summaries pushed so far.
    pub fn files(&self) -> usize {
        self.files
    }

    /// Produce the final summary table.
    pub fn finish(self) -> FinalSummary {
        let strategy = self.strategy;
        self.projects
            .into_iter()
            .map(|(project, accumulator)| (project, accumulator.finish(strategy)))
            .collect()
    }
}

/// Combine an ordered collection of per-file summaries into the final summary table.
///
/// An empty collection yields an empty table.
///
/// # Arguments
///
/// * `summaries`: Per-file summaries, in file enumeration order
/// * `strategy`: How per-file means are combined
pub fn combine<I>(summaries: I, strategy: CombineStrategy) -> FinalSummary
where
    I: IntoIterator<Item = FileSummary>,
{
    let mut combiner = Combiner::new(strategy);
    for summary in summaries {
        combiner.push(summary);
    }
    combiner.finish()
}
