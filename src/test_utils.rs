use crate::combine::CombineStrategy;
use crate::config::{RunConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::models::{FileSummary, ProjectSummary, SnapshotName};

use flate2::read::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use std::io::Read;
use std::path::{Path, PathBuf};
use url::Url;

/// Gzip-compress some bytes.
pub(crate) fn compress_gzip(data: &[u8]) -> Vec<u8> {
    // Adapated from flate2 documentation.
    let mut result = Vec::<u8>::new();
    let mut deflater = GzEncoder::new(data, Compression::fast());
    deflater.read_to_end(&mut result).unwrap();
    result
}

/// Zlib-compress some bytes.
pub(crate) fn compress_zlib(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::<u8>::new();
    let mut deflater = ZlibEncoder::new(data, Compression::fast());
    deflater.read_to_end(&mut result).unwrap();
    result
}

/// Write a gzip snapshot for the given hour of 2024-08-01 containing `lines`.
pub(crate) fn write_snapshot(dir: &Path, hour: u8, lines: &[&str]) -> PathBuf {
    let name = SnapshotName::new("2024-08-01".parse().unwrap(), hour, "gz");
    write_compressed(dir, &name.file_name(), lines)
}

/// Write a gzip file with an arbitrary name containing `lines`.
pub(crate) fn write_compressed(dir: &Path, file_name: &str, lines: &[&str]) -> PathBuf {
    let mut text = lines.join("\n");
    if !lines.is_empty() {
        text.push('\n');
    }
    let path = dir.join(file_name);
    std::fs::write(&path, compress_gzip(text.as_bytes())).unwrap();
    path
}

/// Build a FileSummary from (project, total_views, mean_processed_views, rows) tuples.
pub(crate) fn file_summary(source: &str, projects: &[(&str, u64, f64, u64)]) -> FileSummary {
    FileSummary {
        source: PathBuf::from(source),
        projects: projects
            .iter()
            .map(|(project, total_views, mean_processed_views, rows)| {
                (
                    project.to_string(),
                    ProjectSummary {
                        total_views: *total_views,
                        mean_processed_views: *mean_processed_views,
                        rows: *rows,
                    },
                )
            })
            .collect(),
    }
}

/// Create a RunConfig for 2024-08-01 reading from `input_dir`.
pub(crate) fn get_test_run_config(input_dir: &Path, output: &Path) -> RunConfig {
    RunConfig {
        input_dir: input_dir.to_owned(),
        output: output.to_owned(),
        date: "2024-08-01".parse().unwrap(),
        hours: (0..24).collect(),
        combine_strategy: CombineStrategy::MeanOfMeans,
        use_rayon: false,
        metrics_file: None,
        base_url: Url::parse(DEFAULT_BASE_URL).unwrap(),
        timeout: DEFAULT_TIMEOUT,
    }
}
