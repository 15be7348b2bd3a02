// Allow dead code: read-back helpers are for tests and downstream tooling
#![allow(dead_code)]

//! Durable cache of remote records, one SQLite table per category.
//!
//! Each row stores the full resource envelope as JSON next to its id and
//! type tag. `last_update_time` reads the per-category high-water mark back
//! out of the stored JSON, which is what makes incremental sync resumable
//! after any interruption.

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{Category, Resource};

pub struct CacheStore {
    conn: Connection,
}

impl CacheStore {
    /// Open (or create) the cache database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create cache directory {}", parent.display())
            })?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open cache database {}", path.display()))?;

        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Create the per-category tables if absent. Safe to call on every
    /// startup.
    pub fn ensure_schema(&self) -> Result<()> {
        for category in Category::ALL {
            self.conn
                .execute_batch(&format!(
                    "CREATE TABLE IF NOT EXISTS {}(
                        id INTEGER,
                        object TEXT NOT NULL,
                        data JSON NOT NULL,
                        PRIMARY KEY(id)
                    );",
                    category.table()
                ))
                .with_context(|| format!("Failed to create table {}", category.table()))?;
        }
        Ok(())
    }

    /// Most recent `data_updated_at` among the stored records of a category,
    /// or `None` when the category is empty.
    ///
    /// Full-category scan by design: the dataset is one user's history,
    /// bounded and small.
    pub fn last_update_time(&self, category: Category) -> Result<Option<DateTime<Utc>>> {
        let sql = format!(
            "SELECT max(json_extract(data, '$.data_updated_at')) FROM {}",
            category.table()
        );
        let raw: Option<String> = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .with_context(|| {
                format!("Failed to query last update time for {}", category.table())
            })?;

        match raw {
            Some(ts) => {
                let parsed = DateTime::parse_from_rfc3339(&ts).with_context(|| {
                    format!(
                        "Stored timestamp {:?} in {} is not RFC 3339",
                        ts,
                        category.table()
                    )
                })?;
                Ok(Some(parsed.with_timezone(&Utc)))
            }
            None => Ok(None),
        }
    }

    /// Insert or fully replace each record, keyed by id, in one transaction.
    ///
    /// Atomic as a batch: either every record persists or none does.
    /// Idempotent under retry because it is a pure overwrite. Returns the
    /// number of records written.
    pub fn upsert_many(&mut self, category: Category, records: &[Resource]) -> Result<usize> {
        let tx = self
            .conn
            .transaction()
            .context("Failed to begin upsert transaction")?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR REPLACE INTO {}(id, object, data) VALUES (?1, ?2, ?3)",
                category.table()
            ))?;
            for record in records {
                let data = serde_json::to_string(record).with_context(|| {
                    format!(
                        "Failed to serialize record {} for {}",
                        record.id,
                        category.table()
                    )
                })?;
                stmt.execute(params![record.id, record.object, data])
                    .with_context(|| {
                        format!("Failed to upsert record {} into {}", record.id, category.table())
                    })?;
            }
        }
        tx.commit()
            .with_context(|| format!("Failed to commit upsert batch for {}", category.table()))?;

        debug!(category = %category, records = records.len(), "Committed upsert batch");
        Ok(records.len())
    }

    /// Number of records stored for a category
    pub fn count(&self, category: Category) -> Result<u64> {
        let sql = format!("SELECT count(*) FROM {}", category.table());
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .with_context(|| format!("Failed to count records in {}", category.table()))?;
        Ok(count as u64)
    }

    /// Stored (object, data) for a record id, or `None` if absent
    pub fn get(&self, category: Category, id: i64) -> Result<Option<(String, String)>> {
        let sql = format!("SELECT object, data FROM {} WHERE id = ?1", category.table());
        self.conn
            .query_row(&sql, params![id], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()
            .with_context(|| format!("Failed to read record {} from {}", id, category.table()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> CacheStore {
        let store = CacheStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store
    }

    fn resource(id: i64, object: &str, updated_at: &str, data: serde_json::Value) -> Resource {
        Resource {
            id,
            object: object.to_string(),
            url: format!("https://api.wanikani.com/v2/subjects/{id}"),
            data_updated_at: DateTime::parse_from_rfc3339(updated_at)
                .unwrap()
                .with_timezone(&Utc),
            data,
        }
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let mut store = store();
        store.ensure_schema().unwrap();
        store.ensure_schema().unwrap();

        let written = store
            .upsert_many(
                Category::Subjects,
                &[resource(1, "kanji", "2023-05-01T12:00:00.000000Z", json!({}))],
            )
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(store.count(Category::Subjects).unwrap(), 1);
    }

    #[test]
    fn test_empty_category_has_no_last_update_time() {
        let store = store();
        for category in Category::ALL {
            assert!(store.last_update_time(category).unwrap().is_none());
        }
    }

    #[test]
    fn test_last_update_time_is_max_over_stored_records() {
        let mut store = store();
        store
            .upsert_many(
                Category::Reviews,
                &[
                    resource(1, "review", "2023-05-01T12:00:00.000000Z", json!({})),
                    resource(2, "review", "2023-05-03T08:30:00.123456Z", json!({})),
                    resource(3, "review", "2023-05-02T09:15:00.000000Z", json!({})),
                ],
            )
            .unwrap();

        let last = store.last_update_time(Category::Reviews).unwrap().unwrap();
        assert_eq!(last.to_rfc3339(), "2023-05-03T08:30:00.123456+00:00");

        // Other categories stay independent
        assert!(store.last_update_time(Category::Subjects).unwrap().is_none());
    }

    #[test]
    fn test_upsert_replaces_existing_record_entirely() {
        let mut store = store();
        store
            .upsert_many(
                Category::Subjects,
                &[resource(
                    7,
                    "radical",
                    "2023-05-01T12:00:00.000000Z",
                    json!({"characters": "一", "level": 1}),
                )],
            )
            .unwrap();

        // Same id, different tag and payload: the old fields must not survive
        store
            .upsert_many(
                Category::Subjects,
                &[resource(
                    7,
                    "kanji",
                    "2023-05-02T12:00:00.000000Z",
                    json!({"meaning": "one"}),
                )],
            )
            .unwrap();

        assert_eq!(store.count(Category::Subjects).unwrap(), 1);
        let (object, data) = store.get(Category::Subjects, 7).unwrap().unwrap();
        assert_eq!(object, "kanji");

        let value: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(value["data"]["meaning"], "one");
        assert!(value["data"].get("characters").is_none());
        assert!(value["data"].get("level").is_none());
    }

    #[test]
    fn test_upsert_batch_is_rerunnable() {
        let mut store = store();
        let batch = vec![
            resource(1, "review", "2023-05-01T12:00:00.000000Z", json!({"srs": 4})),
            resource(2, "review", "2023-05-01T13:00:00.000000Z", json!({"srs": 5})),
        ];

        store.upsert_many(Category::Reviews, &batch).unwrap();
        let first = store.get(Category::Reviews, 1).unwrap().unwrap();

        store.upsert_many(Category::Reviews, &batch).unwrap();
        let second = store.get(Category::Reviews, 1).unwrap().unwrap();

        assert_eq!(store.count(Category::Reviews).unwrap(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_get_missing_record_returns_none() {
        let store = store();
        assert!(store.get(Category::Assignments, 42).unwrap().is_none());
    }

    #[test]
    fn test_unparseable_stored_timestamp_is_an_error() {
        let store = store();
        store
            .conn
            .execute(
                "INSERT INTO reviews(id, object, data) VALUES (1, 'review', ?1)",
                params![r#"{"data_updated_at": "not a timestamp"}"#],
            )
            .unwrap();

        assert!(store.last_update_time(Category::Reviews).is_err());
    }
}
