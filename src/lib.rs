//! This crate aggregates hourly page-view snapshot files into per-project summaries.
//!
//! Each snapshot is a compressed, space-delimited text file with one line per page: the project,
//! the page title, the view count and the bytes transferred. For every file the views are squared
//! and averaged per project, then the per-file summaries are combined into one table with the
//! total views and the mean of the per-file means. The table is written as CSV.
//!
//! The pipeline is built on top of a number of open source components.
//!
//! * [csv] reads snapshot records and writes the summary table.
//! * [flate2] and [zune-inflate](zune_inflate) decompress snapshot files.
//! * [Rayon](rayon) optionally spreads parsing and aggregation over a thread pool.
//! * [Tokio](tokio) and [reqwest] download snapshots from the remote archive.
//! * [Serde](serde) and [validator] read and check JSON run configuration.
//! * [tracing] for logging and [prometheus] for metrics.

pub mod acquisition;
pub mod aggregate;
pub mod app;
pub mod cli;
pub mod combine;
pub mod compression;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod parser;
pub mod pipeline;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
