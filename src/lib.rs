//! Image gallery service for CharacterKB.
//!
//! Resolves a fixed-size, render-safe image gallery for a character by
//! querying an image search provider, probing each candidate concurrently
//! and padding with placeholders. Also forwards search, chat and insight
//! requests to the CharacterKB backend.

pub mod backend;
pub mod config;
pub mod http;
pub mod image_search;
pub mod models;
pub mod probe;
pub mod resolver;
pub mod server;
