// src/services/history.rs
//! ContentHistory: the store facade.
//!
//! Owns one `JsonCollection` per record kind under a single storage root.
//! - Prompts pass the duplicate screen before they are written.
//! - Captions, images and posts are appended unconditionally.
//! - Cleanup prunes each collection independently against one cutoff.
//!
//! Every public operation touches exactly one collection, except cleanup and
//! the reporting views which visit all four in turn.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::Utc;
use serde_json::Value;

use crate::config::HistoryConfig;
use crate::error::{HistoryError, Result};
use crate::records::{CaptionRecord, HistoryRecord, ImageRecord, Metadata, PostRecord, PromptRecord};
use crate::services::collection::JsonCollection;
use crate::services::retention::{self, CleanupReport};
use crate::services::similarity::{DuplicateMatch, DuplicateScreen};
use crate::services::status::{HealthReport, HistoryStats, StatusSnapshot, check_storage};

/// The four record kinds and their file names under the storage root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Prompts,
    Captions,
    Images,
    Posts,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 4] = [
        CollectionKind::Prompts,
        CollectionKind::Captions,
        CollectionKind::Images,
        CollectionKind::Posts,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            CollectionKind::Prompts => "prompts_history.json",
            CollectionKind::Captions => "captions_history.json",
            CollectionKind::Images => "images_history.json",
            CollectionKind::Posts => "posts_history.json",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Prompts => PromptRecord::COLLECTION,
            CollectionKind::Captions => CaptionRecord::COLLECTION,
            CollectionKind::Images => ImageRecord::COLLECTION,
            CollectionKind::Posts => PostRecord::COLLECTION,
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionKind {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        CollectionKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| format!("unknown collection '{raw}' (expected prompts, captions, images or posts)"))
    }
}

/// File-backed content ledger. Safe to share across threads of one process.
pub struct ContentHistory {
    root: PathBuf,
    screen: DuplicateScreen,
    prompts: JsonCollection<PromptRecord>,
    captions: JsonCollection<CaptionRecord>,
    images: JsonCollection<ImageRecord>,
    posts: JsonCollection<PostRecord>,
}

impl ContentHistory {
    /// Open (and initialize) a store at `root` with the default 0.9 screen.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with(root.into(), DuplicateScreen::default())
    }

    /// Open the store described by `cfg`: its storage path and threshold.
    /// The config is validated first, so a hand-built one is checked too.
    pub fn open_with_config(cfg: &HistoryConfig) -> Result<Self> {
        cfg.validate()?;
        Self::open_with(
            cfg.storage.path.clone(),
            DuplicateScreen::new(cfg.duplicates.threshold),
        )
    }

    fn open_with(root: PathBuf, screen: DuplicateScreen) -> Result<Self> {
        let store = Self {
            prompts: JsonCollection::new(root.join(CollectionKind::Prompts.file_name())),
            captions: JsonCollection::new(root.join(CollectionKind::Captions.file_name())),
            images: JsonCollection::new(root.join(CollectionKind::Images.file_name())),
            posts: JsonCollection::new(root.join(CollectionKind::Posts.file_name())),
            screen,
            root,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Ensure the storage directory and all four files exist. Idempotent;
    /// existing files are never touched.
    pub fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|source| HistoryError::CreateDir {
            path: self.root.clone(),
            source,
        })?;
        self.prompts.ensure_exists()?;
        self.captions.ensure_exists()?;
        self.images.ensure_exists()?;
        self.posts.ensure_exists()?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn duplicate_threshold(&self) -> f64 {
        self.screen.threshold()
    }

    // ---------- writes ----------

    /// Record `prompt` unless it is a near-duplicate of a stored prompt.
    /// Returns false on rejection; nothing is written in that case.
    pub fn add_prompt(&self, prompt: &str, metadata: Metadata) -> Result<bool> {
        Ok(self.add_prompt_record(prompt, metadata)?.is_some())
    }

    /// Like `add_prompt`, but hands back the stored record so callers can
    /// use its id for the captions and images derived from it.
    pub fn add_prompt_record(&self, prompt: &str, metadata: Metadata) -> Result<Option<PromptRecord>> {
        let screen = self.screen;
        let outcome = self.prompts.try_append_with(|existing, id, timestamp| {
            let stored = existing.iter().map(|p| (p.id, p.prompt.as_str()));
            match screen.find_duplicate(prompt, stored) {
                Some(hit) => Err(hit),
                None => Ok(PromptRecord {
                    id,
                    prompt: prompt.to_string(),
                    timestamp,
                    metadata,
                }),
            }
        })?;
        match outcome {
            Ok(rec) => Ok(Some(rec)),
            Err(DuplicateMatch { id, score }) => {
                tracing::debug!(matched_id = id, score, "prompt rejected as duplicate");
                Ok(None)
            }
        }
    }

    pub fn add_caption(&self, caption: &str, prompt_id: u64, metadata: Metadata) -> Result<u64> {
        let rec = self.captions.append_with(|id, timestamp| CaptionRecord {
            id,
            prompt_id,
            caption: caption.to_string(),
            timestamp,
            metadata,
        })?;
        Ok(rec.id)
    }

    pub fn add_image(&self, image_path: &str, prompt_id: u64, metadata: Metadata) -> Result<u64> {
        let rec = self.images.append_with(|id, timestamp| ImageRecord {
            id,
            prompt_id,
            image_path: image_path.to_string(),
            timestamp,
            metadata,
        })?;
        Ok(rec.id)
    }

    pub fn add_post(&self, post_data: Value) -> Result<u64> {
        let rec = self.posts.append_with(|id, timestamp| PostRecord {
            id,
            timestamp,
            post_data,
        })?;
        Ok(rec.id)
    }

    // ---------- reads ----------

    pub fn get_recent_prompts(&self, limit: usize) -> Vec<PromptRecord> {
        self.prompts.recent(limit)
    }

    pub fn get_recent_captions(&self, limit: usize) -> Vec<CaptionRecord> {
        self.captions.recent(limit)
    }

    pub fn get_recent_images(&self, limit: usize) -> Vec<ImageRecord> {
        self.images.recent(limit)
    }

    pub fn get_recent_posts(&self, limit: usize) -> Vec<PostRecord> {
        self.posts.recent(limit)
    }

    // ---------- retention ----------

    /// Drop every record not strictly newer than `now - days`. Each
    /// collection is rewritten in full, even when nothing changed. Zero or
    /// negative `days` empties the store.
    pub fn cleanup_old_data(&self, days: i64) -> Result<CleanupReport> {
        let cutoff = retention::cutoff(Utc::now(), days);
        let keep = |ts: &str| retention::is_retained(ts, cutoff);

        let report = CleanupReport {
            days,
            cutoff: retention::format_timestamp(cutoff),
            prompts: self.prompts.retain(|r| keep(r.timestamp()))?.into(),
            captions: self.captions.retain(|r| keep(r.timestamp()))?.into(),
            images: self.images.retain(|r| keep(r.timestamp()))?.into(),
            posts: self.posts.retain(|r| keep(r.timestamp()))?.into(),
        };
        tracing::debug!(
            days,
            cutoff = %report.cutoff,
            removed = report.total_removed(),
            "cleanup finished"
        );
        Ok(report)
    }

    // ---------- reporting ----------

    pub fn stats(&self) -> HistoryStats {
        let prompts = self.prompts.load();
        let captions = self.captions.load();
        let images = self.images.load();
        let posts = self.posts.load();

        let last_activity = newest(&prompts)
            .into_iter()
            .chain(newest(&captions))
            .chain(newest(&images))
            .chain(newest(&posts))
            .max()
            .map(str::to_owned);

        HistoryStats {
            prompts: prompts.len(),
            captions: captions.len(),
            images: images.len(),
            posts: posts.len(),
            last_activity,
        }
    }

    /// Read-only check that the root and all collection files are present.
    pub fn health(&self) -> HealthReport {
        check_storage(&self.root)
    }

    /// Health, totals and the `limit` newest prompts, captions and posts.
    pub fn status(&self, limit: usize) -> StatusSnapshot {
        StatusSnapshot {
            timestamp: retention::format_timestamp(Utc::now()),
            health: self.health(),
            stats: self.stats(),
            recent_prompts: self.get_recent_prompts(limit),
            recent_captions: self.get_recent_captions(limit),
            recent_posts: self.get_recent_posts(limit),
        }
    }
}

fn newest<R: HistoryRecord>(records: &[R]) -> Option<&str> {
    records.iter().map(|r| r.timestamp()).max()
}
