// src/services/status.rs
//! Reporting views over the store: record counts, storage health and the
//! combined status snapshot served to operators.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::records::{CaptionRecord, PostRecord, PromptRecord};
use crate::services::history::CollectionKind;

/// Totals across the four collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    pub prompts: usize,
    pub captions: usize,
    pub images: usize,
    pub posts: usize,
    /// Largest timestamp in any collection, if any record exists.
    pub last_activity: Option<String>,
}

impl HistoryStats {
    pub fn total(&self) -> usize {
        self.prompts + self.captions + self.images + self.posts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Storage-side health: the root directory and every collection file exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub storage_root: PathBuf,
    pub message: String,
    /// File names of collections absent on disk.
    pub missing: Vec<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Health, totals and the most recent records of each reported collection.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub timestamp: String,
    pub health: HealthReport,
    pub stats: HistoryStats,
    pub recent_prompts: Vec<PromptRecord>,
    pub recent_captions: Vec<CaptionRecord>,
    pub recent_posts: Vec<PostRecord>,
}

/// Inspect `root` without creating anything: the directory must exist and
/// hold all four collection files.
pub fn check_storage(root: &Path) -> HealthReport {
    if !root.is_dir() {
        return HealthReport {
            status: HealthStatus::Unhealthy,
            storage_root: root.to_path_buf(),
            message: "Data directory not found".to_string(),
            missing: CollectionKind::ALL.iter().map(|k| k.file_name().to_string()).collect(),
        };
    }
    let missing: Vec<String> = CollectionKind::ALL
        .iter()
        .map(|k| k.file_name())
        .filter(|name| !root.join(name).is_file())
        .map(str::to_owned)
        .collect();

    let (status, message) = if missing.is_empty() {
        (HealthStatus::Healthy, "All storage files present".to_string())
    } else {
        (
            HealthStatus::Unhealthy,
            format!("Storage file(s) not found: {}", missing.join(", ")),
        )
    };
    HealthReport {
        status,
        storage_root: root.to_path_buf(),
        message,
        missing,
    }
}
