//! CLI configuration: defaults, then a JSON file, then environment variables.
//!
//! Environment variables:
//! - `PDF_SPLITTER_PAGES_PER_GROUP`: default pages per fragment for `--by range` (default: 1)
//! - `PDF_SPLITTER_MAX_SIZE_MB`: default size ceiling for `--by size` (default: 5)
//! - `PDF_SPLITTER_BUNDLE_NAME`: file name of the ZIP bundle (default: fragmentos_pdf.zip)
//! - `PDF_SPLITTER_COMPRESS`: compress content streams of fragments (default: false)
//! - `PDF_SPLITTER_MAX_SOURCE_MB`: largest accepted input (default: 512)

use directories::ProjectDirs;
use pdf_engine::EngineOptions;
use serde::{Deserialize, Serialize};
use split_core::DEFAULT_BUNDLE_NAME;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    pub default_pages_per_group: u32,
    pub default_max_size_mb: f64,
    pub bundle_name: String,
    pub compress_streams: bool,
    pub max_source_mb: u64,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            default_pages_per_group: 1,
            default_max_size_mb: 5.0,
            bundle_name: DEFAULT_BUNDLE_NAME.to_owned(),
            compress_streams: false,
            max_source_mb: 512,
            thumbnail_width: 150,
            thumbnail_height: 200,
        }
    }
}

impl SplitterConfig {
    /// Resolves the configuration for one run.
    ///
    /// An explicit `path` must exist; the platform default is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env_with(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config = serde_json::from_slice(&bytes)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;

        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// `config.json` in the platform config directory, e.g. `~/.config/pdf-splitter/` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "PdfSplitter", "pdf-splitter")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Overrides fields from variables returned by `lookup`.
    pub fn apply_env_with<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("PDF_SPLITTER_PAGES_PER_GROUP") {
            self.default_pages_per_group = parse_value("PDF_SPLITTER_PAGES_PER_GROUP", &value)?;
        }

        if let Some(value) = lookup("PDF_SPLITTER_MAX_SIZE_MB") {
            self.default_max_size_mb = parse_value("PDF_SPLITTER_MAX_SIZE_MB", &value)?;
        }

        if let Some(value) = lookup("PDF_SPLITTER_BUNDLE_NAME") {
            if value.trim().is_empty() || value.contains(['/', '\\']) {
                return Err(ConfigError::InvalidValue { key: "PDF_SPLITTER_BUNDLE_NAME", value });
            }
            self.bundle_name = value;
        }

        if let Some(value) = lookup("PDF_SPLITTER_COMPRESS") {
            self.compress_streams = match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(ConfigError::InvalidValue { key: "PDF_SPLITTER_COMPRESS", value }),
            };
        }

        if let Some(value) = lookup("PDF_SPLITTER_MAX_SOURCE_MB") {
            self.max_source_mb = parse_value("PDF_SPLITTER_MAX_SOURCE_MB", &value)?;
        }

        Ok(self)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            max_source_bytes: Some(self.max_source_mb.saturating_mul(1024 * 1024)),
            compress_streams: self.compress_streams,
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue { key, value: value.to_owned() })
}
