//! Zadarma call recording downloader.
//!
//! Fetches call statistics for a recent window, requests a download link
//! for every recorded call, and saves the recordings to a folder.

pub mod config;
pub mod downloader;
pub mod error;
pub mod recording;

pub use config::DownloaderConfig;
pub use downloader::{DownloadStats, Downloader, PlannedDownload};
pub use error::DownloadError;
