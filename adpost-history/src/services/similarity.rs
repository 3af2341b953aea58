// src/services/similarity.rs
//! Lexical near-duplicate screen for prompts.
//!
//! Texts are lower-cased and split on Unicode whitespace into sets of distinct
//! tokens; similarity is the Jaccard index of the two sets. Punctuation stays
//! attached to its token, so `colombia` and `colombia!` are different words.

use std::collections::HashSet;

/// Prompts scoring strictly above this against any stored prompt are rejected.
pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.9;

/// Lower-case `text` and collect its distinct whitespace-separated tokens.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

/// Jaccard index of the token sets of `a` and `b`; 0.0 when both are empty.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    set_similarity(&tokenize(a), &tokenize(b))
}

fn set_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// A matched stored prompt and its similarity score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuplicateMatch {
    pub id: u64,
    pub score: f64,
}

/// Threshold-based screen. The candidate is tokenized once and compared
/// against every stored text until the first score above the threshold.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateScreen {
    threshold: f64,
}

impl Default for DuplicateScreen {
    fn default() -> Self {
        Self::new(DEFAULT_DUPLICATE_THRESHOLD)
    }
}

impl DuplicateScreen {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn find_duplicate<'a, I>(&self, candidate: &str, existing: I) -> Option<DuplicateMatch>
    where
        I: IntoIterator<Item = (u64, &'a str)>,
    {
        let tokens = tokenize(candidate);
        existing.into_iter().find_map(|(id, text)| {
            let score = set_similarity(&tokens, &tokenize(text));
            (score > self.threshold).then_some(DuplicateMatch { id, score })
        })
    }
}
