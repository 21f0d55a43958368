//! Snapshot record parsing.
//!
//! A snapshot is a compressed text file with one record per line and four space-separated
//! fields: `project title views bytes_transferred`. There is no header and no quoting.

use crate::compression::{self, Compression};
use crate::error::{ParseError, ParseErrorKind, PipelineError};
use crate::metrics::RECORDS_PARSED;
use crate::models::RawRecord;

use csv::{ByteRecord, ReaderBuilder};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Number of fields in every snapshot record
pub const FIELD_COUNT: usize = 4;

/// Parse a compressed snapshot file into records.
///
/// The compression format is taken from the file extension. Any malformed line aborts the parse.
///
/// # Arguments
///
/// * `path`: Path of the snapshot file
#[tracing::instrument(level = "DEBUG")]
pub fn parse_snapshot(path: &Path) -> Result<Vec<RawRecord>, PipelineError> {
    let compression =
        Compression::from_path(path).map_err(|kind| ParseError::new(path, None, kind))?;
    let file = File::open(path).map_err(|source| PipelineError::InputFile {
        path: path.to_owned(),
        source,
    })?;
    let reader = compression::decoder(compression, file)
        .map_err(|kind| ParseError::new(path, None, kind))?;
    let records = parse_records(reader, path)?;
    RECORDS_PARSED.inc_by(records.len() as u64);
    Ok(records)
}

/// Parse uncompressed snapshot data into records.
///
/// # Arguments
///
/// * `reader`: Reader of uncompressed snapshot data
/// * `path`: Snapshot the data came from, used in error reports
pub fn parse_records<R: Read>(reader: R, path: &Path) -> Result<Vec<RawRecord>, ParseError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b' ')
        .quoting(false)
        // Field counts are checked per record to report the offending line.
        .flexible(true)
        .from_reader(reader);
    let mut records = Vec::new();
    let mut record = ByteRecord::new();
    loop {
        match reader.read_byte_record(&mut record) {
            Ok(true) => {
                let line = record.position().map(|position| position.line());
                let parsed = parse_record(&record).map_err(|kind| ParseError::new(path, line, kind))?;
                records.push(parsed);
            }
            Ok(false) => break,
            Err(err) => {
                let line = Some(reader.position().line());
                return Err(ParseError::new(path, line, read_error_kind(err)));
            }
        }
    }
    Ok(records)
}

/// Convert one split line into a typed record.
fn parse_record(record: &ByteRecord) -> Result<RawRecord, ParseErrorKind> {
    if record.len() != FIELD_COUNT {
        return Err(ParseErrorKind::FieldCount {
            expected: FIELD_COUNT,
            found: record.len(),
        });
    }
    let project = std::str::from_utf8(&record[0])
        .map_err(|_| ParseErrorKind::InvalidUtf8 { field: "project" })?
        .to_string();
    // Titles are not used for aggregation, so tolerate any encoding.
    let title = String::from_utf8_lossy(&record[1]).into_owned();
    let views = integer_field(&record[2], "views")?;
    let bytes_transferred = integer_field(&record[3], "bytes_transferred")?;
    Ok(RawRecord {
        project,
        title,
        views,
        bytes_transferred,
    })
}

fn integer_field(field: &[u8], name: &'static str) -> Result<u64, ParseErrorKind> {
    std::str::from_utf8(field)
        .ok()
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| ParseErrorKind::InvalidInteger {
            field: name,
            value: String::from_utf8_lossy(field).into_owned(),
        })
}

fn read_error_kind(err: csv::Error) -> ParseErrorKind {
    match err.into_kind() {
        // Errors from the decoder surface as I/O errors of the underlying reader.
        csv::ErrorKind::Io(source) => ParseErrorKind::DecompressionFlate2(source),
        kind => ParseErrorKind::Malformed {
            reason: format!("{:?}", kind),
        },
    }
}
