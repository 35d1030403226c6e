use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;

use vitrine_core::{FrameSource, Kiosk, MonotonicClock, ProductCatalog, VitrineConfig};

use crate::remote::HttpClassifier;
use crate::sink::JsonLinesSink;
use crate::snapshot::SnapshotFrameSource;
use crate::Args;

const SETTLE_TIMEOUT: Duration = Duration::from_secs(2);
const SYSTEM_CONFIG: &str = "/etc/vitrine/config.json";

pub async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    let catalog_path = PathBuf::from(&config.catalog.path);
    let catalog = ProductCatalog::load(config.presentation.idle_label.as_str(), &catalog_path)
        .with_context(|| format!("cannot start without a product catalog ({})", catalog_path.display()))?;
    info!("Loaded {} product(s) from {}", catalog.len(), catalog_path.display());
    for (label, index) in catalog.products() {
        debug!("  {} -> product {}", label, index);
    }

    let classifier = Arc::new(HttpClassifier::new(&config.classifier));
    info!("Classifying frames via {}", config.classifier.url);

    let frames = open_frame_source(&args, &config)?;
    let mut sink = open_sink(args.output.as_deref())?;

    let mut kiosk = Kiosk::from_config(
        &config,
        catalog,
        classifier,
        frames,
        Arc::new(MonotonicClock::new()),
        Handle::current(),
    );

    let mut ticker = tokio::time::interval(Duration::from_millis(args.tick_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        "Kiosk running (poll every {}ms, {} pages per product)",
        config.timing.poll_interval_ms, config.timing.page_count
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                kiosk.tick(&mut sink);
            }
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Shutting down");
                break;
            }
        }
    }

    if tokio::time::timeout(SETTLE_TIMEOUT, kiosk.settle()).await.is_err() {
        warn!("Abandoning classification requests still in flight");
    }
    sink.flush();
    Ok(())
}

fn load_config(args: &Args) -> Result<VitrineConfig> {
    let mut config = match locate_config(args.config.as_deref())? {
        Some(path) => {
            info!("Using config {}", path.display());
            VitrineConfig::load(&path)?
        }
        None => {
            info!("No config file found, using defaults");
            VitrineConfig::default()
        }
    };
    apply_overrides(&mut config, args);
    config.validate()?;
    Ok(config)
}

/// Explicit path, then the user's config directory, then the system one.
fn locate_config(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            bail!("config file {} does not exist", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Some(config_dir) = dirs::config_dir() {
        let user_config = config_dir.join("vitrine").join("config.json");
        if user_config.exists() {
            return Ok(Some(user_config));
        }
    }

    let system_config = PathBuf::from(SYSTEM_CONFIG);
    if system_config.exists() {
        return Ok(Some(system_config));
    }

    Ok(None)
}

fn apply_overrides(config: &mut VitrineConfig, args: &Args) {
    if let Some(ref catalog) = args.catalog {
        config.catalog.path = catalog.to_string_lossy().into_owned();
    }
    if let Some(ref url) = args.classifier_url {
        config.classifier.url = url.clone();
    }
    if let Some(ref snapshot) = args.snapshot {
        config.camera.snapshot_path = snapshot.to_string_lossy().into_owned();
    }
    if let Some(device_id) = args.camera {
        config.camera.device_id = device_id;
        config.camera.snapshot_path.clear();
    }
}

fn open_frame_source(args: &Args, config: &VitrineConfig) -> Result<Box<dyn FrameSource>> {
    if args.camera.is_none() && !config.camera.snapshot_path.is_empty() {
        let path = PathBuf::from(&config.camera.snapshot_path);
        info!("Reading frames from snapshot {}", path.display());
        return Ok(Box::new(SnapshotFrameSource::new(path)));
    }

    #[cfg(feature = "camera")]
    {
        let camera = crate::camera::CameraFrameSource::open(
            config.camera.device_id,
            config.camera.frame_width,
            config.camera.frame_height,
        )?;
        Ok(Box::new(camera))
    }

    #[cfg(not(feature = "camera"))]
    {
        bail!("no frame source: pass --snapshot, or build with `--features camera` to read a camera")
    }
}

fn open_sink(output: Option<&Path>) -> Result<JsonLinesSink<Box<dyn Write + Send>>> {
    let writer: Box<dyn Write + Send> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create command output {}", path.display()))?;
            // Flushed at the end of every command line.
            Box::new(LineWriter::new(file))
        }
        None => Box::new(io::stdout()),
    };
    Ok(JsonLinesSink::new(writer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use vitrine_core::PresentationSink;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["vitrine"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn cli_overrides_config_values() {
        let mut config = VitrineConfig::default();
        let args = args(&[
            "--catalog",
            "/srv/kiosk/database_01.json",
            "--classifier-url",
            "http://model.local/classify",
            "--snapshot",
            "/run/kiosk/frame.jpg",
        ]);
        apply_overrides(&mut config, &args);

        assert_eq!(config.catalog.path, "/srv/kiosk/database_01.json");
        assert_eq!(config.classifier.url, "http://model.local/classify");
        assert_eq!(config.camera.snapshot_path, "/run/kiosk/frame.jpg");
    }

    #[test]
    fn camera_flag_replaces_configured_snapshot() {
        let mut config = VitrineConfig::default();
        config.camera.snapshot_path = "/run/kiosk/frame.jpg".into();
        apply_overrides(&mut config, &args(&["--camera", "2"]));

        assert_eq!(config.camera.device_id, 2);
        assert!(config.camera.snapshot_path.is_empty());
    }

    #[test]
    fn snapshot_and_camera_conflict() {
        let result = Args::try_parse_from(["vitrine", "--snapshot", "a.jpg", "--camera", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("config.json");
        assert!(locate_config(Some(missing.as_path())).is_err());

        std::fs::write(&missing, "{}").unwrap();
        assert_eq!(locate_config(Some(missing.as_path())).unwrap(), Some(missing.clone()));
    }

    #[test]
    fn output_file_sees_each_command_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.jsonl");
        let mut sink = open_sink(Some(path.as_path())).unwrap();

        sink.show_welcome();
        sink.play_loading_cue();

        let written = std::fs::read_to_string(&path).unwrap();
        let commands: Vec<&str> = written.lines().collect();
        assert_eq!(commands.len(), 2);
        assert!(commands[1].contains("play_loading_cue"));
    }

    #[test]
    fn snapshot_source_is_chosen_from_config() {
        let mut config = VitrineConfig::default();
        config.camera.snapshot_path = "/run/kiosk/frame.jpg".into();
        assert!(open_frame_source(&args(&[]), &config).is_ok());
    }
}
