mod app;
#[cfg(feature = "camera")]
mod camera;
mod remote;
mod sink;
mod snapshot;

use clap::Parser;
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

/// Camera-driven product showcase kiosk.
#[derive(Debug, Parser)]
#[command(name = "vitrine", version, about)]
pub struct Args {
    /// Config file (defaults to ~/.config/vitrine/config.json, then /etc/vitrine/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Label to product catalog, overrides `catalog.path`
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Classifier endpoint, overrides `classifier.url`
    #[arg(long)]
    pub classifier_url: Option<String>,

    /// Snapshot file refreshed by an external capture tool
    #[arg(long, conflicts_with = "camera")]
    pub snapshot: Option<PathBuf>,

    /// V4L2 device index (needs the `camera` feature)
    #[arg(long)]
    pub camera: Option<i32>,

    /// Evaluation tick in milliseconds
    #[arg(long, default_value_t = 16)]
    pub tick_ms: u64,

    /// Write presentation commands here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let args = Args::parse();
    match app::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
