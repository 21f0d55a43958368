//! Run configuration.
//!
//! A [RunConfig] is constructed once per run, either from command line arguments or from a JSON
//! document, and validated before any work starts.

use crate::combine::CombineStrategy;
use crate::error::PipelineError;
use crate::models::SnapshotDate;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;
use validator::{Validate, ValidationError};

/// Number of hourly snapshots in a day
pub const HOURS_PER_DAY: u8 = 24;

/// Default base URL of the snapshot archive
pub const DEFAULT_BASE_URL: &str = "https://dumps.wikimedia.org/other/pageviews";

/// Default download timeout in seconds
pub const DEFAULT_TIMEOUT: u64 = 300;

/// Configuration of one run
#[derive(Clone, Debug, Deserialize, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Directory holding the snapshot files
    #[validate(custom = "validate_path")]
    pub input_dir: PathBuf,
    /// Path of the CSV output file
    #[validate(custom = "validate_path")]
    pub output: PathBuf,
    /// Day of the snapshots to process
    pub date: SnapshotDate,
    /// Hours of the day to process
    #[validate(
        length(min = 1, message = "hours must not be empty"),
        custom = "validate_hours"
    )]
    pub hours: Vec<u8>,
    /// How per-file means are combined
    #[serde(default)]
    pub combine_strategy: CombineStrategy,
    /// Whether to parse and aggregate files on the Rayon thread pool
    #[serde(default)]
    pub use_rayon: bool,
    /// Optional path to which metrics are written after the run
    #[serde(default)]
    pub metrics_file: Option<PathBuf>,
    /// Base URL of the snapshot archive
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Download timeout in seconds
    #[serde(default = "default_timeout")]
    #[validate(range(min = 1, message = "timeout must be greater than 0"))]
    pub timeout: u64,
}

impl RunConfig {
    /// Read a RunConfig from a JSON file.
    ///
    /// The result is not validated.
    pub fn from_json_file(path: &Path) -> Result<Self, PipelineError> {
        let contents = std::fs::read_to_string(path).map_err(|source| PipelineError::ConfigRead {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| PipelineError::ConfigJson {
            path: path.to_owned(),
            source,
        })
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid")
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT
}

/// Validate that a path is not empty
fn validate_path(path: &Path) -> Result<(), ValidationError> {
    if path.as_os_str().is_empty() {
        return Err(ValidationError::new("path must not be empty"));
    }
    Ok(())
}

/// Validate a set of hours
fn validate_hours(hours: &[u8]) -> Result<(), ValidationError> {
    if let Some(hour) = hours.iter().find(|hour| **hour >= HOURS_PER_DAY) {
        let mut error = ValidationError::new("hours must be between 0 and 23");
        error.add_param("hour".into(), hour);
        return Err(error);
    }
    Ok(())
}

/// A set of hours of the day
///
/// Parsed from a comma-separated list of hours and inclusive ranges, e.g. `0-5,12,18-23`. Hours
/// are returned sorted and without duplicates.
#[derive(Clone, Debug, PartialEq)]
pub struct HourSelection(pub Vec<u8>);

impl FromStr for HourSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut hours = Vec::new();
        for part in s.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            let (start, end) = match part.split_once('-') {
                Some((start, end)) => (parse_hour(start)?, parse_hour(end)?),
                None => {
                    let hour = parse_hour(part)?;
                    (hour, hour)
                }
            };
            if start > end {
                return Err(format!("invalid hour range {:?}", part));
            }
            hours.extend(start..=end);
        }
        if hours.is_empty() {
            return Err("at least one hour must be selected".to_string());
        }
        hours.sort_unstable();
        hours.dedup();
        Ok(Self(hours))
    }
}

fn parse_hour(s: &str) -> Result<u8, String> {
    match s.trim().parse::<u8>() {
        Ok(hour) if hour < HOURS_PER_DAY => Ok(hour),
        _ => Err(format!("invalid hour {:?}, expected 0-23", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;
    use serde_test::{assert_de_tokens, assert_de_tokens_error, Token};

    fn test_config() -> RunConfig {
        test_utils::get_test_run_config(Path::new("dataset"), Path::new("output/result.csv"))
    }

    #[test]
    fn test_required_fields() {
        let config = test_config();
        assert_de_tokens(
            &config,
            &[
                Token::Struct {
                    name: "RunConfig",
                    len: 4,
                },
                Token::Str("input_dir"),
                Token::Str("dataset"),
                Token::Str("output"),
                Token::Str("output/result.csv"),
                Token::Str("date"),
                Token::Str("2024-08-01"),
                Token::Str("hours"),
                Token::Seq { len: Some(24) },
                Token::U8(0),
                Token::U8(1),
                Token::U8(2),
                Token::U8(3),
                Token::U8(4),
                Token::U8(5),
                Token::U8(6),
                Token::U8(7),
                Token::U8(8),
                Token::U8(9),
                Token::U8(10),
                Token::U8(11),
                Token::U8(12),
                Token::U8(13),
                Token::U8(14),
                Token::U8(15),
                Token::U8(16),
                Token::U8(17),
                Token::U8(18),
                Token::U8(19),
                Token::U8(20),
                Token::U8(21),
                Token::U8(22),
                Token::U8(23),
                Token::SeqEnd,
                Token::StructEnd,
            ],
        );
        config.validate().unwrap()
    }

    #[test]
    fn test_missing_date() {
        assert_de_tokens_error::<RunConfig>(
            &[
                Token::Struct {
                    name: "RunConfig",
                    len: 2,
                },
                Token::Str("input_dir"),
                Token::Str("dataset"),
                Token::Str("output"),
                Token::Str("output/result.csv"),
                Token::StructEnd,
            ],
            "missing field `date`",
        )
    }

    #[test]
    fn test_invalid_combine_strategy() {
        assert_de_tokens_error::<RunConfig>(
            &[
                Token::Struct {
                    name: "RunConfig",
                    len: 1,
                },
                Token::Str("combine_strategy"),
                Token::Enum {
                    name: "CombineStrategy",
                },
                Token::Str("median"),
                Token::Unit,
            ],
            "unknown variant `median`, expected `mean-of-means` or `row-weighted`",
        )
    }

    #[test]
    fn test_unknown_field() {
        assert_de_tokens_error::<RunConfig>(&[
            Token::Struct { name: "RunConfig", len: 1 },
            Token::Str("foo"),
            Token::StructEnd
            ],
            "unknown field `foo`, expected one of `input_dir`, `output`, `date`, `hours`, `combine_strategy`, `use_rayon`, `metrics_file`, `base_url`, `timeout`"
        )
    }

    #[test]
    #[should_panic(expected = "hours must not be empty")]
    fn test_empty_hours() {
        let mut config = test_config();
        config.hours = vec![];
        config.validate().unwrap()
    }

    #[test]
    #[should_panic(expected = "hours must be between 0 and 23")]
    fn test_invalid_hour() {
        let mut config = test_config();
        config.hours = vec![1, 24];
        config.validate().unwrap()
    }

    #[test]
    #[should_panic(expected = "path must not be empty")]
    fn test_empty_input_dir() {
        let mut config = test_config();
        config.input_dir = PathBuf::new();
        config.validate().unwrap()
    }

    #[test]
    #[should_panic(expected = "timeout must be greater than 0")]
    fn test_invalid_timeout() {
        let mut config = test_config();
        config.timeout = 0;
        config.validate().unwrap()
    }

    // The following tests use JSON data, to check that the fields map as expected.

    #[test]
    fn test_json_optional_fields() {
        let json = r#"{"input_dir": "in", "output": "out.csv", "date": "2024-08-01", "hours": [3, 4], "combine_strategy": "row-weighted", "use_rayon": true, "metrics_file": "metrics.prom", "base_url": "http://localhost:8080/pageviews", "timeout": 5}"#;
        let config = serde_json::from_str::<RunConfig>(json).unwrap();
        assert_eq!(PathBuf::from("in"), config.input_dir);
        assert_eq!(vec![3, 4], config.hours);
        assert_eq!(CombineStrategy::RowWeighted, config.combine_strategy);
        assert!(config.use_rayon);
        assert_eq!(Some(PathBuf::from("metrics.prom")), config.metrics_file);
        assert_eq!("http://localhost:8080/pageviews", config.base_url.as_str());
        assert_eq!(5, config.timeout);
        config.validate().unwrap()
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"input_dir": "dataset", "output": "output/result.csv", "date": "2024-08-01", "hours": [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23]}"#,
        )
        .unwrap();
        assert_eq!(test_config(), RunConfig::from_json_file(&path).unwrap());
    }

    #[test]
    fn test_from_json_file_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{").unwrap();
        let err = RunConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigJson { .. }));
    }

    #[test]
    fn test_hour_selection() {
        let hours: HourSelection = "0-2, 5,4,18-19,1".parse().unwrap();
        assert_eq!(vec![0, 1, 2, 4, 5, 18, 19], hours.0);
        let all: HourSelection = "0-23".parse().unwrap();
        assert_eq!((0..24).collect::<Vec<u8>>(), all.0);
    }

    #[test]
    fn test_hour_selection_invalid() {
        assert_eq!(
            Err("invalid hour \"24\", expected 0-23".to_string()),
            "0,24".parse::<HourSelection>()
        );
        assert_eq!(
            Err("invalid hour range \"5-3\"".to_string()),
            "5-3".parse::<HourSelection>()
        );
        assert_eq!(
            Err("at least one hour must be selected".to_string()),
            ",".parse::<HourSelection>()
        );
    }
}
