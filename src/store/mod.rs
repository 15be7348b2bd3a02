//! Local persistence for mirrored records.
//!
//! The `CacheStore` owns one SQLite table per record category and provides
//! the two queries the sync engine needs: the per-category high-water
//! timestamp and an atomic batched upsert.

pub mod cache;

pub use cache::CacheStore;
