//! Application Configuration
//!
//! User settings stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::vision::blur::DEFAULT_BLUR_THRESHOLD;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General settings
    pub general: GeneralConfig,
    /// OCR settings
    pub ocr: OcrSettings,
    /// Reference data settings
    pub reference: ReferenceSettings,
    /// Storage settings
    pub storage: StorageSettings,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log filter used when `RUST_LOG` is not set (e.g. "info", "markguard=debug")
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// OCR-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Use the mock OCR provider instead of transcripts
    pub use_mock_ocr: bool,
    /// Laplacian variance below which an image counts as blurry
    pub blur_threshold: f64,
    /// Lines returned by the mock provider
    pub mock_fragments: Vec<String>,
    /// Blur flag returned by the mock provider
    pub mock_blurry: bool,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            use_mock_ocr: false,
            blur_threshold: DEFAULT_BLUR_THRESHOLD,
            mock_fragments: vec![
                "NE555DR".to_string(),
                "TI".to_string(),
                "BATCH2024".to_string(),
            ],
            mock_blurry: false,
        }
    }
}

/// Reference data settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceSettings {
    /// Optional JSON catalog merged over the built-in table
    pub catalog_path: Option<PathBuf>,
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Volatile, per-process
    Memory,
    /// SQLite database file
    #[default]
    Sqlite,
}

/// Storage-related settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Database file; defaults to `scans.db` in the data directory
    pub database_path: Option<PathBuf>,
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Invalid config file {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}
