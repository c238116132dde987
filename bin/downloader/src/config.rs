//! Downloader configuration.
//!
//! Loaded via the `config` crate from environment variables. Variable
//! names are the upper-cased field names (`API_KEY`, `DAYS_BACK`, ...).
//! Values stay strings until deserialization, so keys and secrets that
//! look numeric keep their exact text.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use zadarma_integration::{
    ApiHosts, Credentials, NaiveDateTimeConvention, PRODUCTION_HOST, SANDBOX_HOST,
};

/// Default recording filename layout.
pub const DEFAULT_FILENAME_TEMPLATE: &str =
    "call_{call_id}_{date}_{time}_{sip}_to_{destination}.wav";

/// Downloader configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloaderConfig {
    /// API key from the provider's account settings.
    pub api_key: String,

    /// API secret paired with the key.
    pub api_secret: String,

    /// Use the sandbox environment.
    #[serde(default)]
    pub sandbox_mode: bool,

    /// How many days back from now to look for recorded calls.
    #[serde(default = "default_days_back")]
    pub days_back: u32,

    /// Folder recordings are written to.
    #[serde(default = "default_download_folder")]
    pub download_folder: PathBuf,

    /// Filename layout; see [`crate::recording::FilenameTemplate`].
    #[serde(default = "default_filename_template")]
    pub filename_template: String,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Maximum number of link requests in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Offset, in seconds east of UTC, for date-times given without one.
    #[serde(default)]
    pub naive_utc_offset: i32,

    /// Production API host.
    #[serde(default = "default_production_host")]
    pub production_host: String,

    /// Sandbox API host.
    #[serde(default = "default_sandbox_host")]
    pub sandbox_host: String,
}

fn default_days_back() -> u32 {
    1
}

fn default_download_folder() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_filename_template() -> String {
    DEFAULT_FILENAME_TEMPLATE.to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_concurrency() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_production_host() -> String {
    PRODUCTION_HOST.to_string()
}

fn default_sandbox_host() -> String {
    SANDBOX_HOST.to_string()
}

impl DownloaderConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::load(config::Environment::default().separator("__"))
    }

    /// Loads configuration from any `config` source.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn load<S>(source: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    /// Returns the API credentials.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.api_key.clone(), self.api_secret.clone())
            .with_sandbox(self.sandbox_mode)
    }

    /// Returns the API hosts.
    #[must_use]
    pub fn hosts(&self) -> ApiHosts {
        ApiHosts {
            production: self.production_host.clone(),
            sandbox: self.sandbox_host.clone(),
        }
    }

    /// Returns the convention for date-times without an offset.
    #[must_use]
    pub const fn naive_convention(&self) -> NaiveDateTimeConvention {
        if self.naive_utc_offset == 0 {
            NaiveDateTimeConvention::Utc
        } else {
            NaiveDateTimeConvention::FixedOffset {
                seconds_east: self.naive_utc_offset,
            }
        }
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Returns the API key prefix that is safe to log.
    #[must_use]
    pub fn masked_api_key(&self) -> String {
        let visible: String = self.api_key.chars().take(4).collect();
        format!("{visible}...")
    }
}
