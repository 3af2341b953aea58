// src/utils/mod.rs
pub mod fsio;
