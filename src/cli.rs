//! Command Line Interface (CLI) arguments.

use crate::combine::CombineStrategy;
use crate::config::{HourSelection, RunConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::error::PipelineError;
use crate::models::SnapshotDate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use url::Url;
use validator::Validate;

/// Pageview snapshot aggregation command line interface
#[derive(Clone, Debug, Parser)]
#[command(version, about)]
pub struct CommandLineArgs {
    #[command(subcommand)]
    pub command: Command,
    /// Path to a JSON run configuration. Replaces all other run options when given.
    #[arg(long, global = true, env = "PAGEVIEWS_CONFIG")]
    pub config: Option<PathBuf>,
    /// Directory holding the snapshot files
    #[arg(long, global = true, default_value = "dataset", env = "PAGEVIEWS_INPUT_DIR")]
    pub input_dir: PathBuf,
    /// Day of the snapshots, as YYYY-MM-DD
    #[arg(long, global = true, default_value = "2024-08-01", env = "PAGEVIEWS_DATE")]
    pub date: SnapshotDate,
    /// Hours of the day, as a list of hours and ranges, e.g. 0-5,12
    #[arg(long, global = true, default_value = "0-23", env = "PAGEVIEWS_HOURS")]
    pub hours: HourSelection,
    /// Path of the CSV output file
    #[arg(
        long,
        global = true,
        default_value = "output/result.csv",
        env = "PAGEVIEWS_OUTPUT"
    )]
    pub output: PathBuf,
    /// How per-file means are combined into the final mean
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = CombineStrategy::MeanOfMeans,
        env = "PAGEVIEWS_COMBINE_STRATEGY"
    )]
    pub combine_strategy: CombineStrategy,
    /// Whether to use Rayon for parsing and aggregating files.
    #[arg(long, global = true, default_value_t = false, env = "PAGEVIEWS_USE_RAYON")]
    pub use_rayon: bool,
    /// Path to which Prometheus metrics are written after the run
    #[arg(long, global = true, env = "PAGEVIEWS_METRICS_FILE")]
    pub metrics_file: Option<PathBuf>,
    /// Base URL of the snapshot archive
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL, env = "PAGEVIEWS_BASE_URL")]
    pub base_url: Url,
    /// Download timeout in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT, env = "PAGEVIEWS_TIMEOUT")]
    pub timeout: u64,
}

/// Subcommands
#[derive(Clone, Copy, Debug, PartialEq, Subcommand)]
pub enum Command {
    /// Aggregate snapshots already present in the input directory
    Aggregate,
    /// Download snapshots into the input directory
    Download,
    /// Download snapshots, then aggregate them
    Run,
}

impl CommandLineArgs {
    /// Build a validated run configuration.
    ///
    /// When `--config` is given the configuration is read from that JSON file, otherwise it is
    /// built from the other arguments.
    pub fn run_config(&self) -> Result<RunConfig, PipelineError> {
        let config = match &self.config {
            Some(path) => RunConfig::from_json_file(path)?,
            None => RunConfig {
                input_dir: self.input_dir.clone(),
                output: self.output.clone(),
                date: self.date,
                hours: self.hours.0.clone(),
                combine_strategy: self.combine_strategy,
                use_rayon: self.use_rayon,
                metrics_file: self.metrics_file.clone(),
                base_url: self.base_url.clone(),
                timeout: self.timeout,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    use clap::CommandFactory;
    use std::path::Path;

    #[test]
    fn test_command_definition() {
        CommandLineArgs::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = CommandLineArgs::try_parse_from(["pageviews", "aggregate"]).unwrap();
        assert_eq!(Command::Aggregate, args.command);
        assert_eq!(
            test_utils::get_test_run_config(Path::new("dataset"), Path::new("output/result.csv")),
            args.run_config().unwrap()
        );
    }

    #[test]
    fn test_options() {
        let args = CommandLineArgs::try_parse_from([
            "pageviews",
            "run",
            "--input-dir",
            "in",
            "--date",
            "2023-01-31",
            "--hours",
            "1-3,7",
            "--combine-strategy",
            "row-weighted",
            "--use-rayon",
            "--timeout",
            "10",
        ])
        .unwrap();
        assert_eq!(Command::Run, args.command);
        let config = args.run_config().unwrap();
        assert_eq!(PathBuf::from("in"), config.input_dir);
        assert_eq!("20230131", config.date.compact());
        assert_eq!(vec![1, 2, 3, 7], config.hours);
        assert_eq!(CombineStrategy::RowWeighted, config.combine_strategy);
        assert!(config.use_rayon);
        assert_eq!(10, config.timeout);
    }

    #[test]
    fn test_invalid_date() {
        assert!(
            CommandLineArgs::try_parse_from(["pageviews", "aggregate", "--date", "2024-13-01"])
                .is_err()
        );
    }

    #[test]
    fn test_invalid_hours() {
        assert!(
            CommandLineArgs::try_parse_from(["pageviews", "download", "--hours", "22-24"]).is_err()
        );
    }

    #[test]
    fn test_zero_timeout_fails_validation() {
        let args =
            CommandLineArgs::try_parse_from(["pageviews", "download", "--timeout", "0"]).unwrap();
        assert!(matches!(
            args.run_config().unwrap_err(),
            PipelineError::ConfigValidation(_)
        ));
    }

    #[test]
    fn test_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"input_dir": "elsewhere", "output": "out.csv", "date": "2024-08-02", "hours": [4]}"#,
        )
        .unwrap();
        let args = CommandLineArgs::try_parse_from([
            "pageviews",
            "aggregate",
            "--config",
            path.to_str().unwrap(),
        ])
        .unwrap();
        let config = args.run_config().unwrap();
        assert_eq!(PathBuf::from("elsewhere"), config.input_dir);
        assert_eq!(vec![4], config.hours);
    }

    #[test]
    fn test_config_file_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"input_dir": "dataset", "output": "out.csv", "date": "2024-08-02", "hours": []}"#,
        )
        .unwrap();
        let args = CommandLineArgs::try_parse_from([
            "pageviews",
            "aggregate",
            "--config",
            path.to_str().unwrap(),
        ])
        .unwrap();
        assert!(matches!(
            args.run_config().unwrap_err(),
            PipelineError::ConfigValidation(_)
        ));
    }
}
