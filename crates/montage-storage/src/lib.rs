//! Blob storage for the montage core.
//!
//! This crate provides:
//! - A `BlobCache` capability with R2 and in-memory implementations
//! - JSON cache helpers and deterministic cache keys
//! - Publishing split clip pieces to R2

pub mod cache;
pub mod client;
pub mod error;
pub mod publish;

pub use cache::{
    load_json, resource_stem, shot_clip_cache_key, split_cache_key, store_json, BlobCache,
    InMemoryBlobCache,
};
pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use publish::{published_clip_key, ClipPublisher, R2ClipPublisher};
