//! Data types and associated functions and methods

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::Date;

/// Prefix shared by all snapshot file names
pub const SNAPSHOT_PREFIX: &str = "pageviews";

/// Extension of the snapshots published by the remote archive
pub const DEFAULT_EXTENSION: &str = "gz";

/// One line of a snapshot file
#[derive(Clone, Debug, PartialEq)]
pub struct RawRecord {
    /// Project (site) the page belongs to; the grouping key
    pub project: String,
    /// Page title
    pub title: String,
    /// Number of views of the page within the hour
    pub views: u64,
    /// Bytes transferred for the page
    pub bytes_transferred: u64,
}

/// Per-file summary of one project
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectSummary {
    /// Sum of `views` over the project's rows
    pub total_views: u64,
    /// Arithmetic mean of `views^2` over the project's rows
    pub mean_processed_views: f64,
    /// Number of rows that contributed to this summary
    pub rows: u64,
}

/// Summary of one snapshot file, keyed and ordered by project
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileSummary {
    /// Snapshot file the summary was computed from
    pub source: PathBuf,
    /// One entry per distinct project in the file
    pub projects: BTreeMap<String, ProjectSummary>,
}

impl FileSummary {
    /// Number of distinct projects in the file.
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Whether the file contained no rows.
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

/// Combined summary of one project across all snapshot files
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectTotal {
    /// Sum of the per-file `total_views`
    pub total_views: u64,
    /// Mean of the per-file `mean_processed_views`, per the combine strategy
    pub mean_processed_views: f64,
}

/// Final summary table, keyed and ordered by project
pub type FinalSummary = BTreeMap<String, ProjectTotal>;

/// Calendar date of a set of snapshots
///
/// Parsed from and displayed as `YYYY-MM-DD`; snapshot file names use the compact `YYYYMMDD`
/// form.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct SnapshotDate(Date);

impl SnapshotDate {
    /// Return a new SnapshotDate
    pub fn new(date: Date) -> Self {
        Self(date)
    }

    /// The underlying calendar date.
    pub fn date(&self) -> Date {
        self.0
    }

    /// The `YYYYMMDD` form used in snapshot file names.
    pub fn compact(&self) -> String {
        format!(
            "{:04}{:02}{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }

    /// Parse the `YYYYMMDD` form used in snapshot file names.
    pub fn from_compact(s: &str) -> Option<Self> {
        let format = format_description!("[year][month][day]");
        Date::parse(s, format).ok().map(Self)
    }
}

impl FromStr for SnapshotDate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = format_description!("[year]-[month]-[day]");
        Date::parse(s, format)
            .map(Self)
            .map_err(|err| format!("invalid date {:?}, expected YYYY-MM-DD: {}", s, err))
    }
}

impl TryFrom<String> for SnapshotDate {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SnapshotDate> for String {
    fn from(value: SnapshotDate) -> Self {
        value.to_string()
    }
}

impl fmt::Display for SnapshotDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

/// Name of one hourly snapshot file
///
/// The naming convention is `pageviews-<YYYYMMDD>-<HH>0000.<extension>`.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotName {
    /// Day of the snapshot
    pub date: SnapshotDate,
    /// Hour of the day, 0-23
    pub hour: u8,
    /// Compression extension, without the leading dot
    pub extension: String,
}

impl SnapshotName {
    /// Return a new SnapshotName
    pub fn new(date: SnapshotDate, hour: u8, extension: &str) -> Self {
        Self {
            date,
            hour,
            extension: extension.to_string(),
        }
    }

    /// Parse a snapshot file name, returning `None` if it does not follow the naming convention.
    pub fn parse(file_name: &str) -> Option<Self> {
        let rest = file_name
            .strip_prefix(SNAPSHOT_PREFIX)?
            .strip_prefix('-')?;
        let (date, rest) = rest.split_once('-')?;
        let (clock, extension) = rest.split_once('.')?;
        if clock.len() != 6 || !clock.ends_with("0000") || extension.is_empty() {
            return None;
        }
        let hour: u8 = clock.get(..2)?.parse().ok()?;
        if hour > 23 {
            return None;
        }
        Some(Self {
            date: SnapshotDate::from_compact(date)?,
            hour,
            extension: extension.to_string(),
        })
    }

    /// The file name under the naming convention.
    pub fn file_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:02}0000.{}",
            SNAPSHOT_PREFIX,
            self.date.compact(),
            self.hour,
            self.extension
        )
    }
}
