// src/records.rs
//! Record shapes for the four collections.
//!
//! Field names match the on-disk JSON exactly; files written by earlier
//! versions of the agent decode into these types unchanged.

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

/// Caller-defined key/value bag attached to prompts, captions and images.
/// Insertion order is preserved on disk.
pub type Metadata = Map<String, Value>;

// Older writers stored `"metadata": null` when no metadata was given.
fn null_as_empty<'de, D>(de: D) -> Result<Metadata, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Metadata>::deserialize(de).map(Option::unwrap_or_default)
}

/// A prompt accepted by the duplicate screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRecord {
    pub id: u64,
    pub prompt: String,
    pub timestamp: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub metadata: Metadata,
}

/// A generated caption. `prompt_id` is informational and never validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionRecord {
    pub id: u64,
    pub prompt_id: u64,
    pub caption: String,
    pub timestamp: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub metadata: Metadata,
}

/// A generated image reference (local path or URL, stored verbatim).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: u64,
    pub prompt_id: u64,
    pub image_path: String,
    pub timestamp: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub metadata: Metadata,
}

/// A publish attempt: generated content bundled with the platform result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: u64,
    pub timestamp: String,
    pub post_data: Value,
}

/// Common surface the collection layer needs from every record kind.
pub trait HistoryRecord: Serialize + DeserializeOwned + Clone {
    /// Collection label used in errors and log events.
    const COLLECTION: &'static str;

    fn id(&self) -> u64;
    fn timestamp(&self) -> &str;
}

impl HistoryRecord for PromptRecord {
    const COLLECTION: &'static str = "prompts";

    fn id(&self) -> u64 {
        self.id
    }

    fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

impl HistoryRecord for CaptionRecord {
    const COLLECTION: &'static str = "captions";

    fn id(&self) -> u64 {
        self.id
    }

    fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

impl HistoryRecord for ImageRecord {
    const COLLECTION: &'static str = "images";

    fn id(&self) -> u64 {
        self.id
    }

    fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

impl HistoryRecord for PostRecord {
    const COLLECTION: &'static str = "posts";

    fn id(&self) -> u64 {
        self.id
    }

    fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_prompt_without_metadata_decodes() {
        let raw = r#"{"id": 3, "prompt": "Coffee", "timestamp": "2025-01-01T10:00:00.000001"}"#;
        let rec: PromptRecord = serde_json::from_str(raw).expect("decode");
        assert_eq!(rec.id, 3);
        assert!(rec.metadata.is_empty());
    }

    #[test]
    fn null_metadata_decodes_as_empty() {
        let raw = r#"{"id": 2, "prompt_id": 1, "image_path": "a.png", "timestamp": "t", "metadata": null}"#;
        let rec: ImageRecord = serde_json::from_str(raw).expect("decode");
        assert!(rec.metadata.is_empty());

        let raw = r#"{"id": 2, "prompt_id": 1, "image_path": "a.png", "timestamp": "t", "metadata": "x"}"#;
        assert!(serde_json::from_str::<ImageRecord>(raw).is_err());
    }

    #[test]
    fn metadata_keeps_insertion_order() {
        let mut meta = Metadata::new();
        meta.insert("zeta".into(), json!(1));
        meta.insert("alpha".into(), json!({"nested": true}));
        let rec = CaptionRecord {
            id: 1,
            prompt_id: 1,
            caption: "hi".into(),
            timestamp: "t".into(),
            metadata: meta,
        };
        let text = serde_json::to_string(&rec).expect("encode");
        let zeta = text.find("zeta").expect("zeta present");
        let alpha = text.find("alpha").expect("alpha present");
        assert!(zeta < alpha, "metadata order should survive encoding: {text}");
    }
}
