use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::label::IDLE_LABEL;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VitrineConfig {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub presentation: PresentationConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_poll_interval", alias = "pollIntervalMs")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_initial_page_delay", alias = "initialPageDelayMs")]
    pub initial_page_delay_ms: u64,
    #[serde(default = "default_page_display_delay", alias = "pageDisplayDelayMs")]
    pub page_display_delay_ms: u64,
    #[serde(default = "default_page_count", alias = "pageCount")]
    pub page_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentationConfig {
    #[serde(default = "default_idle_label", alias = "idleLabel")]
    pub idle_label: String,
    #[serde(default = "default_brand_color")]
    pub default_brand_color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_classifier_url")]
    pub url: String,
    #[serde(default = "default_classifier_timeout")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default)]
    pub device_id: i32,
    #[serde(default)]
    pub snapshot_path: String,
    #[serde(default = "default_frame_width")]
    pub frame_width: u32,
    #[serde(default = "default_frame_height")]
    pub frame_height: u32,
}

fn default_poll_interval() -> u64 { 2000 }
fn default_initial_page_delay() -> u64 { 1000 }
fn default_page_display_delay() -> u64 { 8000 }
fn default_page_count() -> usize { 4 }
fn default_idle_label() -> String { IDLE_LABEL.to_string() }
fn default_brand_color() -> String { "#96349B".to_string() }
fn default_catalog_path() -> String { "catalog.json".to_string() }
fn default_classifier_url() -> String { "http://127.0.0.1:8000/classify".to_string() }
fn default_classifier_timeout() -> u64 { 5000 }
fn default_frame_width() -> u32 { 640 }
fn default_frame_height() -> u32 { 480 }

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            initial_page_delay_ms: default_initial_page_delay(),
            page_display_delay_ms: default_page_display_delay(),
            page_count: default_page_count(),
        }
    }
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            idle_label: default_idle_label(),
            default_brand_color: default_brand_color(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            url: default_classifier_url(),
            timeout_ms: default_classifier_timeout(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            snapshot_path: String::new(),
            frame_width: default_frame_width(),
            frame_height: default_frame_height(),
        }
    }
}

impl VitrineConfig {
    /// Read a config file, or the defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            let config: VitrineConfig = serde_json::from_str(&content)
                .with_context(|| format!("invalid config file {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.timing.page_count == 0 {
            bail!("timing.page_count must be at least 1");
        }
        if self.timing.poll_interval_ms == 0 {
            bail!("timing.poll_interval_ms must be greater than zero");
        }
        if self.timing.page_display_delay_ms == 0 {
            bail!("timing.page_display_delay_ms must be greater than zero");
        }
        if self.presentation.idle_label.trim().is_empty() {
            bail!("presentation.idle_label must not be empty");
        }
        Ok(())
    }
}
