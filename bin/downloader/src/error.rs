//! Downloader errors.

use std::fmt;
use std::path::PathBuf;

/// Errors raised while downloading recordings.
#[derive(Debug)]
pub enum DownloadError {
    /// Configuration could not be loaded or used.
    Config { details: String },
    /// The download folder could not be created.
    Folder { path: PathBuf, details: String },
    /// The statistics request failed.
    Statistics { details: String },
    /// Recording links could not be requested.
    Links { details: String },
    /// The provider answered with a non-success status.
    Rejected { message: String },
    /// A recording could not be fetched.
    Fetch { call_id: String, details: String },
    /// A recording could not be written to disk.
    Write { path: PathBuf, details: String },
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "invalid configuration: {details}"),
            Self::Folder { path, details } => {
                write!(
                    f,
                    "cannot create download folder {}: {details}",
                    path.display()
                )
            }
            Self::Statistics { details } => write!(f, "statistics request failed: {details}"),
            Self::Links { details } => write!(f, "recording link requests failed: {details}"),
            Self::Rejected { message } => write!(f, "provider rejected the request: {message}"),
            Self::Fetch { call_id, details } => {
                write!(f, "cannot fetch recording for call {call_id}: {details}")
            }
            Self::Write { path, details } => {
                write!(f, "cannot write {}: {details}", path.display())
            }
        }
    }
}

impl std::error::Error for DownloadError {}
