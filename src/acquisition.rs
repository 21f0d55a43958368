//! Snapshot acquisition.
//!
//! Retrieves hourly snapshots from a remote archive into the input directory. Retrieval is best
//! effort: a snapshot that cannot be retrieved is logged and left out of the input set.

use crate::error::{AcquisitionError, PipelineError};
use crate::metrics::DOWNLOADS;
use crate::models::{SnapshotDate, SnapshotName, DEFAULT_EXTENSION};

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{event, Level};
use url::Url;

/// Snapshot source trait.
///
/// Defines the interface for retrieving the raw bytes of one snapshot.
#[async_trait]
pub trait SnapshotSource {
    /// Retrieve a snapshot.
    ///
    /// Returns the snapshot bytes, unmodified.
    ///
    /// # Arguments
    ///
    /// * `name`: Snapshot to retrieve
    async fn fetch(&self, name: &SnapshotName) -> Result<Bytes, AcquisitionError>;
}

/// HTTP snapshot source.
///
/// Implements [SnapshotSource] for an archive laid out as
/// `<base>/<YYYY>/<YYYY>-<MM>/<file name>`.
#[derive(Debug)]
pub struct HttpSnapshotSource {
    reqwest_client: reqwest::Client,
    base_url: Url,
}

impl HttpSnapshotSource {
    /// Create a new HTTP snapshot source.
    ///
    /// # Arguments
    ///
    /// * `base_url`: Root of the snapshot archive
    /// * `timeout`: Timeout for each request
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, AcquisitionError> {
        let reqwest_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            reqwest_client,
            base_url,
        })
    }

    /// URL of a snapshot within the archive.
    pub fn url(&self, name: &SnapshotName) -> Result<Url, AcquisitionError> {
        let date = name.date.date();
        let url = format!(
            "{}/{:04}/{:04}-{:02}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            date.year(),
            date.year(),
            u8::from(date.month()),
            name.file_name()
        );
        Ok(Url::parse(&url)?)
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    #[tracing::instrument(level = "DEBUG", skip(self), fields(file = %name))]
    async fn fetch(&self, name: &SnapshotName) -> Result<Bytes, AcquisitionError> {
        let url = self.url(name)?;
        let response = self.reqwest_client.get(url).send().await?;
        match response.status() {
            reqwest::StatusCode::OK => Ok(response.bytes().await?),
            status => Err(AcquisitionError::Status {
                status: status.as_u16(),
            }),
        }
    }
}

/// Outcome of a download run
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AcquisitionReport {
    /// Paths of the snapshots written
    pub downloaded: Vec<PathBuf>,
    /// Hours whose snapshot could not be retrieved
    pub missing: Vec<u8>,
}

/// Retrieve one snapshot and write it into `dir`.
async fn download_snapshot<S>(
    source: &S,
    name: &SnapshotName,
    dir: &Path,
) -> Result<PathBuf, AcquisitionError>
where
    S: SnapshotSource + ?Sized,
{
    let data = source.fetch(name).await?;
    let path = dir.join(name.file_name());
    tokio::fs::write(&path, &data).await?;
    Ok(path)
}

/// Retrieve the snapshots of a day into a directory.
///
/// Hours are retrieved one after another. Failures are logged and reported as missing hours;
/// only failure to create `dir` is an error.
///
/// # Arguments
///
/// * `source`: Where to retrieve snapshots from
/// * `dir`: Directory to write snapshots into
/// * `date`: Day of the snapshots
/// * `hours`: Hours of the day to retrieve
pub async fn download_snapshots<S>(
    source: &S,
    dir: &Path,
    date: SnapshotDate,
    hours: &[u8],
) -> Result<AcquisitionReport, PipelineError>
where
    S: SnapshotSource + ?Sized,
{
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| PipelineError::DownloadDir {
            path: dir.to_owned(),
            source,
        })?;
    let mut report = AcquisitionReport::default();
    for &hour in hours {
        let name = SnapshotName::new(date, hour, DEFAULT_EXTENSION);
        event!(Level::DEBUG, file = %name, "downloading snapshot");
        match download_snapshot(source, &name, dir).await {
            Ok(path) => {
                event!(Level::INFO, file = %name, path = %path.display(), "downloaded snapshot");
                DOWNLOADS.with_label_values(&["downloaded"]).inc();
                report.downloaded.push(path);
            }
            Err(err) => {
                event!(Level::WARN, file = %name, error = %err, "failed to download snapshot");
                DOWNLOADS.with_label_values(&["missing"]).inc();
                report.missing.push(hour);
            }
        }
    }
    Ok(report)
}
