//! Incremental sync of remote records into the local cache.
//!
//! The `SyncEngine` drives one linear pipeline per invocation: for each
//! category, read the stored high-water timestamp, stream the remote delta,
//! and commit it as a single upsert batch. The remote side is reached only
//! through the `RecordSource` trait.

pub mod engine;

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::models::{Category, Resource};

pub use engine::{CategorySummary, SyncEngine};

/// Boundary to the remote collaborator.
///
/// One call yields a lazy, finite, single-pass stream of every record in a
/// category updated strictly after `updated_after`, or the full history when
/// no bound is given. Pagination is the implementor's concern.
pub trait RecordSource {
    fn fetch(
        &self,
        category: Category,
        updated_after: Option<DateTime<Utc>>,
    ) -> BoxStream<'static, Result<Resource>>;
}
