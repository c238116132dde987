//! The download run: statistics, links, files.

use crate::config::DownloaderConfig;
use crate::error::DownloadError;
use crate::recording::{CallRecord, FilenameTemplate, recorded_calls, recording_link};
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use zadarma_integration::{
    ApiOperation, ApiResult, BatchOptions, Connector, Dispatcher, FailurePolicy, HttpTransport,
    OperationRequest, Transport, ZadarmaConnector, execute_batch,
};

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadStats {
    /// Recorded calls in the window.
    pub found: usize,
    /// Recordings written to disk.
    pub downloaded: usize,
    /// Recordings that could not be linked, fetched or written.
    pub errors: usize,
}

/// A recorded call paired with its download link, or the reason it has none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDownload {
    pub record: CallRecord,
    pub filename: String,
    pub link: Result<String, String>,
}

/// Returns `(start, end)` covering the `days_back` days before `now`.
///
/// # Errors
///
/// Returns [`DownloadError::Config`] if the window does not fit the calendar.
pub fn statistics_window(
    now: DateTime<Utc>,
    days_back: u32,
) -> Result<(DateTime<Utc>, DateTime<Utc>), DownloadError> {
    TimeDelta::try_days(i64::from(days_back))
        .and_then(|span| now.checked_sub_signed(span))
        .map(|start| (start, now))
        .ok_or_else(|| DownloadError::Config {
            details: format!("days_back {days_back} is out of range"),
        })
}

/// Creates the download folder if needed.
///
/// # Errors
///
/// Returns [`DownloadError::Folder`] if the folder cannot be created.
pub async fn ensure_folder(folder: &Path) -> Result<(), DownloadError> {
    tokio::fs::create_dir_all(folder)
        .await
        .map_err(|e| DownloadError::Folder {
            path: folder.to_path_buf(),
            details: e.to_string(),
        })
}

/// Writes a recording into `folder` and returns its path.
///
/// # Errors
///
/// Returns [`DownloadError::Write`] if the file cannot be written.
pub async fn save_recording(
    folder: &Path,
    filename: &str,
    contents: &[u8],
) -> Result<PathBuf, DownloadError> {
    let path = folder.join(filename);
    tokio::fs::write(&path, contents)
        .await
        .map_err(|e| DownloadError::Write {
            path: path.clone(),
            details: e.to_string(),
        })?;
    Ok(path)
}

/// Downloads every recorded call in a window into a folder.
#[derive(Debug, Clone)]
pub struct Downloader<T = HttpTransport> {
    connector: ZadarmaConnector<T>,
    client: reqwest::Client,
    folder: PathBuf,
    template: FilenameTemplate,
    days_back: u32,
    concurrency: usize,
}

impl Downloader {
    /// Builds a downloader talking to the provider over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Config`] if an HTTP client cannot be built.
    pub fn from_config(config: &DownloaderConfig) -> zadarma_core::Result<Self, DownloadError> {
        let transport =
            HttpTransport::new(config.request_timeout()).map_err(|e| DownloadError::Config {
                details: e.to_string(),
            })?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| DownloadError::Config {
                details: format!("failed to create HTTP client: {e}"),
            })?;

        let dispatcher = Dispatcher::new(transport).with_hosts(config.hosts());
        let connector = ZadarmaConnector::new(Arc::new(dispatcher), config.credentials())
            .with_convention(config.naive_convention());

        Ok(Self::new(connector, client, config))
    }
}

impl<T: Transport> Downloader<T> {
    /// Creates a downloader from a connector and the HTTP client used for files.
    #[must_use]
    pub fn new(
        connector: ZadarmaConnector<T>,
        client: reqwest::Client,
        config: &DownloaderConfig,
    ) -> Self {
        Self {
            connector,
            client,
            folder: config.download_folder.clone(),
            template: FilenameTemplate::new(config.filename_template.clone()),
            days_back: config.days_back,
            concurrency: config.concurrency,
        }
    }

    /// Runs one download pass ending now.
    ///
    /// Per-recording failures are counted, not returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be created or the statistics
    /// request fails.
    #[instrument(skip_all, fields(folder = %self.folder.display(), days_back = self.days_back))]
    pub async fn run(&self) -> zadarma_core::Result<DownloadStats, DownloadError> {
        ensure_folder(&self.folder).await?;

        let planned = self.plan(Utc::now()).await?;
        let mut stats = DownloadStats {
            found: planned.len(),
            ..DownloadStats::default()
        };

        for download in &planned {
            let call_id = download.record.call_id.as_str();
            let link = match &download.link {
                Ok(link) => link,
                Err(reason) => {
                    warn!(call_id, reason = %reason, "no recording link");
                    stats.errors += 1;
                    continue;
                }
            };

            match self.fetch(call_id, link, &download.filename).await {
                Ok(path) => {
                    info!(call_id, path = %path.display(), "recording saved");
                    stats.downloaded += 1;
                }
                Err(e) => {
                    warn!(call_id, error = %e, "recording download failed");
                    stats.errors += 1;
                }
            }
        }

        info!(
            found = stats.found,
            downloaded = stats.downloaded,
            errors = stats.errors,
            "download run finished"
        );
        Ok(stats)
    }

    /// Fetches the recorded calls in the window ending at `now` and their links.
    ///
    /// # Errors
    ///
    /// Returns an error if the statistics request fails or is rejected.
    pub async fn plan(
        &self,
        now: DateTime<Utc>,
    ) -> zadarma_core::Result<Vec<PlannedDownload>, DownloadError> {
        let (start, end) = statistics_window(now, self.days_back)?;
        let records = self.recorded_calls(start, end).await?;
        info!(recorded = records.len(), "found recorded calls");

        if records.is_empty() {
            return Ok(Vec::new());
        }

        let requests: Vec<_> = records
            .iter()
            .map(|record| {
                OperationRequest::new(ApiOperation::RECORDING_LINK)
                    .with_param("call_id", json!(record.call_id))
            })
            .collect();
        let options = BatchOptions::default()
            .with_failure_policy(FailurePolicy::Continue)
            .with_concurrency(self.concurrency);
        let results = execute_batch(&self.connector, &requests, options)
            .await
            .map_err(|e| DownloadError::Links {
                details: e.to_string(),
            })?;

        Ok(records
            .into_iter()
            .zip(results)
            .map(|(record, result)| PlannedDownload {
                filename: self.template.render(&record),
                link: link_from(&result),
                record,
            })
            .collect())
    }

    async fn recorded_calls(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> zadarma_core::Result<Vec<CallRecord>, DownloadError> {
        let request = OperationRequest::new(ApiOperation::CALL_STATISTICS)
            .with_param("start", json!(start.to_rfc3339()))
            .with_param("end", json!(end.to_rfc3339()));

        let result = self
            .connector
            .execute(&request)
            .await
            .map_err(|e| DownloadError::Statistics {
                details: e.to_string(),
            })?;

        Ok(recorded_calls(&result.data)?)
    }

    async fn fetch(
        &self,
        call_id: &str,
        link: &str,
        filename: &str,
    ) -> Result<PathBuf, DownloadError> {
        let fetch_error = |details: String| DownloadError::Fetch {
            call_id: call_id.to_string(),
            details,
        };

        debug!(call_id, filename, "downloading recording");
        let response = self
            .client
            .get(link)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("unexpected status {status}")));
        }

        let contents = response
            .bytes()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        save_recording(&self.folder, filename, &contents).await
    }
}

fn link_from(result: &ApiResult) -> Result<String, String> {
    match result {
        ApiResult::Success { data, .. } => recording_link(data)
            .map(str::to_string)
            .ok_or_else(|| {
                data["message"]
                    .as_str()
                    .unwrap_or("response has no link")
                    .to_string()
            }),
        ApiResult::Failure { error, .. } => Err(error.clone()),
    }
}
