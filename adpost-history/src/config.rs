use serde::Deserialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing;

use crate::error::{HistoryError, Result};
use crate::services::similarity::DEFAULT_DUPLICATE_THRESHOLD;

/// Environment override for the storage directory.
pub const STORAGE_PATH_ENV: &str = "ADPOST_STORAGE_PATH";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub duplicates: DuplicatesConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
}

impl HistoryConfig {
    /// Read `<root>/config.toml`, falling back to defaults when it is absent.
    /// Relative paths are resolved against `root`.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join("config.toml");
        let mut cfg = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|source| HistoryError::ReadConfig {
                path: path.clone(),
                source,
            })?;
            toml::from_str::<HistoryConfig>(&text).map_err(|source| HistoryError::ParseConfig {
                path: path.clone(),
                source,
            })?
        } else {
            tracing::info!(
                "No config file found at {}. Using HistoryConfig::default().",
                path.display()
            );
            HistoryConfig::default()
        };
        cfg.validate()?;
        cfg.resolve_paths(root);
        Ok(cfg)
    }

    /// Reject values that would silently disable a check.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.duplicates.threshold;
        if !(0.0..1.0).contains(&threshold) {
            return Err(HistoryError::InvalidConfig {
                key: "duplicates.threshold",
                value: threshold.to_string(),
                reason: "must be at least 0 and below 1",
            });
        }
        Ok(())
    }

    /// `load`, then honor `ADPOST_STORAGE_PATH` if set.
    pub fn load_with_env(root: &Path) -> Result<Self> {
        let mut cfg = Self::load(root)?;
        cfg.apply_storage_override(std::env::var_os(STORAGE_PATH_ENV));
        Ok(cfg)
    }

    /// Replace the storage path with `value` when it is set and non-empty.
    /// The override is used as given, not joined onto the config root.
    pub fn apply_storage_override(&mut self, value: Option<OsString>) {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            self.storage.path = PathBuf::from(v);
        }
    }

    fn resolve_paths(&mut self, root: &Path) {
        self.storage.path = absolutize(root, &self.storage.path);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "StorageConfig::default_path")]
    pub path: PathBuf,
}

impl StorageConfig {
    fn default_path() -> PathBuf {
        PathBuf::from("data")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DuplicatesConfig {
    /// Prompts scoring strictly above this are rejected.
    #[serde(default = "DuplicatesConfig::default_threshold")]
    pub threshold: f64,
}

impl DuplicatesConfig {
    fn default_threshold() -> f64 {
        DEFAULT_DUPLICATE_THRESHOLD
    }
}

impl Default for DuplicatesConfig {
    fn default() -> Self {
        Self {
            threshold: Self::default_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    #[serde(default = "RetentionConfig::default_days")]
    pub days: i64,
}

impl RetentionConfig {
    fn default_days() -> i64 {
        30
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            days: Self::default_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportingConfig {
    #[serde(default = "ReportingConfig::default_recent_limit")]
    pub recent_limit: usize,
}

impl ReportingConfig {
    fn default_recent_limit() -> usize {
        10
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            recent_limit: Self::default_recent_limit(),
        }
    }
}

fn absolutize(root: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        root.join(value)
    }
}
