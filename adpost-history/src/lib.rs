//! adpost-history: the content ledger behind the ad posting agent.
//!
//! Four append-only JSON collections (prompts, captions, images, posts) live
//! side by side under one storage root. Prompts are screened for lexical
//! near-duplicates before they are accepted; everything else is appended
//! unconditionally. Retention pruning rewrites each collection independently.

pub mod config;
pub mod error;
pub mod records;
pub mod services;
pub(crate) mod utils;

pub use config::HistoryConfig;
pub use error::{HistoryError, Result};
pub use records::{CaptionRecord, ImageRecord, Metadata, PostRecord, PromptRecord};
pub use services::history::{CollectionKind, ContentHistory};
pub use services::retention::{CleanupReport, PruneCounts};
pub use services::similarity::{DEFAULT_DUPLICATE_THRESHOLD, jaccard_similarity, tokenize};
pub use services::status::{HealthReport, HealthStatus, HistoryStats, StatusSnapshot, check_storage};
