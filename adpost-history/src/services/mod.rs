// src/services/mod.rs

pub mod collection;  // one JSON array file: load (with empty fallback), persist, append
pub mod history;     // the store facade: four collections + duplicate screen
pub mod retention;   // cutoff math and timestamp parsing for cleanup
pub mod similarity;  // lexical Jaccard screen for prompts
pub mod status;      // stats, health and status snapshots

pub use history::ContentHistory;
