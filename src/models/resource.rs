//! Wire types for the WaniKani v2 API.
//!
//! A collection endpoint returns pages of resource envelopes. The envelope
//! fields are typed; the inner `data` payload stays schemaless because this
//! tool mirrors records, it does not define the remote schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single remote record: id, type tag, and the full payload document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: i64,
    pub object: String,
    pub url: String,
    #[serde(with = "rfc3339_micros")]
    pub data_updated_at: DateTime<Utc>,
    pub data: Value,
}

/// Pagination block of a collection response. The client follows `next_url`
/// until it is absent.
#[derive(Debug, Clone, Deserialize)]
pub struct Pages {
    pub next_url: Option<String>,
}

/// One page of a collection response.
#[derive(Debug, Deserialize)]
pub struct Collection {
    pub pages: Pages,
    pub total_count: u64,
    pub data: Vec<Resource>,
}

/// Timestamps with fixed microsecond precision, matching the remote's own
/// format. The cache store compares these values as text inside SQLite, so
/// the textual form must sort in timestamp order, which requires one
/// consistent precision.
mod rfc3339_micros {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ASSIGNMENT_JSON: &str = r#"{
        "id": 80463006,
        "object": "assignment",
        "url": "https://api.wanikani.com/v2/assignments/80463006",
        "data_updated_at": "2017-10-30T01:51:10.438432Z",
        "data": {
            "created_at": "2017-09-05T23:38:10.695133Z",
            "subject_id": 8761,
            "subject_type": "radical",
            "srs_stage": 8,
            "unlocked_at": "2017-09-05T23:38:10.695133Z",
            "passed_at": "2017-09-07T17:47:42.689905Z",
            "burned_at": null,
            "available_at": "2018-02-27T00:00:00.000000Z",
            "resurrected_at": null
        }
    }"#;

    #[test]
    fn test_resource_deserializes_envelope() {
        let resource: Resource = serde_json::from_str(ASSIGNMENT_JSON).unwrap();
        assert_eq!(resource.id, 80463006);
        assert_eq!(resource.object, "assignment");
        assert_eq!(
            resource.data_updated_at.to_rfc3339(),
            "2017-10-30T01:51:10.438432+00:00"
        );
        assert_eq!(resource.data["subject_id"], 8761);
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let resource: Resource = serde_json::from_str(ASSIGNMENT_JSON).unwrap();
        let first = serde_json::to_string(&resource).unwrap();
        let second = serde_json::to_string(&resource).unwrap();
        assert_eq!(first, second);

        let reparsed: Resource = serde_json::from_str(&first).unwrap();
        assert_eq!(reparsed, resource);
    }

    #[test]
    fn test_timestamp_keeps_microsecond_precision() {
        // A whole-second timestamp must still serialize with six fractional
        // digits, or SQLite's textual max() would order it incorrectly
        // against sub-second neighbors.
        let mut resource: Resource = serde_json::from_str(ASSIGNMENT_JSON).unwrap();
        resource.data_updated_at = DateTime::parse_from_rfc3339("2017-10-30T01:51:11Z")
            .unwrap()
            .with_timezone(&Utc);
        let json = serde_json::to_string(&resource).unwrap();
        assert!(json.contains(r#""data_updated_at":"2017-10-30T01:51:11.000000Z""#));
    }

    #[test]
    fn test_collection_page_parses_next_url() {
        let json = format!(
            r#"{{
                "object": "collection",
                "url": "https://api.wanikani.com/v2/assignments",
                "pages": {{
                    "per_page": 500,
                    "next_url": "https://api.wanikani.com/v2/assignments?page_after_id=80469434",
                    "previous_url": null
                }},
                "total_count": 1600,
                "data_updated_at": "2017-11-29T19:37:03.571377Z",
                "data": [{ASSIGNMENT_JSON}]
            }}"#
        );
        let page: Collection = serde_json::from_str(&json).unwrap();
        assert_eq!(page.total_count, 1600);
        assert_eq!(page.data.len(), 1);
        assert!(page.pages.next_url.unwrap().contains("page_after_id"));
    }

    #[test]
    fn test_collection_last_page_has_no_next_url() {
        let json = r#"{
            "pages": { "per_page": 500, "next_url": null, "previous_url": null },
            "total_count": 0,
            "data": []
        }"#;
        let page: Collection = serde_json::from_str(json).unwrap();
        assert!(page.pages.next_url.is_none());
        assert!(page.data.is_empty());
    }
}
