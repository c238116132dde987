use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zadarma_downloader::{DownloaderConfig, Downloader};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration from environment
    let config = match DownloaderConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        api_key = %config.masked_api_key(),
        sandbox = config.sandbox_mode,
        days_back = config.days_back,
        folder = %config.download_folder.display(),
        "Loaded configuration"
    );

    let downloader = match Downloader::from_config(&config) {
        Ok(downloader) => downloader,
        Err(report) => {
            tracing::error!(error = %report, "Failed to initialize downloader");
            return ExitCode::FAILURE;
        }
    };

    match downloader.run().await {
        Ok(stats) if stats.errors > 0 => {
            tracing::warn!(errors = stats.errors, "Some recordings were not downloaded");
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(report) => {
            tracing::error!(error = %report, "Download run failed");
            ExitCode::FAILURE
        }
    }
}
