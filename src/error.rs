//! Error handling.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{event, Level};
use zune_inflate::errors::InflateDecodeErrors;

/// Pipeline error type
///
/// This type encapsulates the various errors that may abort a run. Each of them is fatal: the
/// run stops and no output is written.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A snapshot file could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The input directory could not be read
    #[error("failed to read input directory {}", .path.display())]
    InputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A snapshot file could not be opened
    #[error("failed to open snapshot {}", .path.display())]
    InputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error listing snapshot files
    #[error("failed to list snapshot files")]
    Glob(#[from] glob::GlobError),

    /// Error building the snapshot file pattern
    #[error("invalid snapshot file pattern")]
    Pattern(#[from] glob::PatternError),

    /// The output file could not be written
    #[error("failed to write output file {}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output table could not be serialised
    #[error("failed to write output file {}", .path.display())]
    OutputCsv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The download directory could not be created
    #[error("failed to create download directory {}", .path.display())]
    DownloadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be read
    #[error("failed to read configuration file {}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for a run configuration
    #[error("failed to parse configuration file {}", .path.display())]
    ConfigJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Error validating the run configuration
    #[error("run configuration is not valid")]
    ConfigValidation(#[from] validator::ValidationErrors),

    /// Error creating the snapshot source
    #[error("failed to create snapshot source")]
    Acquisition(#[from] AcquisitionError),

    /// Error gathering or writing metrics
    #[error("failed to write metrics")]
    Metrics(#[from] prometheus::Error),

    /// Error serialising the run report
    #[error("failed to serialise run report")]
    Report(#[from] serde_json::Error),

    /// A blocking task panicked or was cancelled
    #[error("aggregation task failed")]
    Join(#[from] tokio::task::JoinError),
}

/// Error parsing one snapshot file
///
/// Identifies the offending file and, where known, the 1-based line number. The reason is
/// available as the error source.
#[derive(Debug, Error)]
#[error("failed to parse snapshot {}{}", .path.display(), at_line(.line))]
pub struct ParseError {
    /// Snapshot file being parsed
    pub path: PathBuf,
    /// Line on which the error occurred
    pub line: Option<u64>,
    /// Reason for the failure
    #[source]
    pub kind: ParseErrorKind,
}

impl ParseError {
    /// Return a new ParseError
    ///
    /// # Arguments
    ///
    /// * `path`: Snapshot file being parsed
    /// * `line`: Optional 1-based line number
    /// * `kind`: Reason for the failure
    pub fn new(path: &Path, line: Option<u64>, kind: ParseErrorKind) -> Self {
        Self {
            path: path.to_owned(),
            line,
            kind,
        }
    }
}

fn at_line(line: &Option<u64>) -> String {
    match line {
        Some(line) => format!(" at line {}", line),
        None => String::new(),
    }
}

/// Reason a snapshot file could not be parsed
#[derive(Debug, Error)]
pub enum ParseErrorKind {
    /// Error decompressing data
    #[error("failed to decompress data")]
    DecompressionFlate2(#[source] std::io::Error),

    /// Error decompressing data
    #[error("failed to decompress data")]
    DecompressionZune(#[source] InflateDecodeErrors),

    /// Line does not have the expected number of fields
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    /// Numeric field is not an integer
    #[error("field {field} is not a valid integer: {value:?}")]
    InvalidInteger { field: &'static str, value: String },

    /// Grouping key is not valid UTF-8
    #[error("field {field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    /// Line could not be split into records
    #[error("malformed record: {reason}")]
    Malformed { reason: String },

    /// File extension does not name a supported compression format
    #[error("unsupported compression format {extension:?}")]
    UnsupportedCompression { extension: String },
}

/// Error retrieving one snapshot from the remote archive
///
/// These are never fatal for a run: the snapshot is simply absent from the input set.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// Error sending the request or receiving the body
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Server responded with a non-success status
    #[error("HTTP request failed with status: {status}")]
    Status { status: u16 },

    /// Error building the snapshot URL
    #[error("invalid snapshot URL")]
    Url(#[from] url::ParseError),

    /// Error writing the snapshot to disk
    #[error("failed to write snapshot")]
    Io(#[from] std::io::Error),
}

/// Flatten an error into its message followed by each distinct cause.
///
/// # Arguments
///
/// * `error`: The error that occurred
pub fn report<E>(error: &E) -> Vec<String>
where
    E: std::error::Error + ?Sized,
{
    let mut lines = vec![error.to_string()];
    let mut current = error.source();
    while let Some(source) = current {
        lines.push(source.to_string());
        current = source.source();
    }
    // Remove duplicate entries.
    lines.dedup();
    lines
}

/// Log a fatal error and its causes.
pub fn log_report<E>(error: &E)
where
    E: std::error::Error + ?Sized,
{
    let mut lines = report(error).into_iter();
    if let Some(message) = lines.next() {
        event!(Level::ERROR, "{}", message);
    }
    for cause in lines {
        event!(Level::ERROR, "Caused by: {}", cause);
    }
}
