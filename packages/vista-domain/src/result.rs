//! Search results: the raw form returned by the indexer and the enriched form returned to callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field name of the facet listing the caller's own collections.
pub const COLLECTION_FACET: &str = "collection";

/// Job handle returned by a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTicket {
	pub id: String,
}

/// Completed search as returned by the indexer. This is what the result cache stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerResult {
	pub entries: Vec<RawEntry>,
	pub aggregate: Vec<RawAggregation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEntry {
	pub id: String,
	pub meta: Value,
	pub origin: Value,
	pub classifier: Value,
	pub feature: Value,
	pub coordinates: Vec<f64>,
	pub distance: Option<f64>,
	pub cluster: Option<i64>,
	pub padded: bool,
	pub collection: Option<RawCollection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCollection {
	pub id: String,
	pub name: String,
	pub is_public: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAggregation {
	pub field_name: String,
	pub entries: Vec<RawBucket>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawBucket {
	pub key: String,
	pub int_val: i64,
}

/// Client-facing result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
	pub entries: Vec<ResultEntry>,
	pub aggregations: Vec<Aggregation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
	pub id: String,
	pub meta: Value,
	pub origin: Value,
	pub classifier: Value,
	pub feature: Value,
	pub coordinates: Vec<f64>,
	pub distance: Option<f64>,
	pub cluster: Option<i64>,
	pub padded: bool,
	pub collection: Option<EntryCollection>,
	pub path: String,
	pub preview: String,
	pub user: UserAnnotation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryCollection {
	pub id: String,
	pub name: String,
	pub is_public: bool,
	/// The caller owns this collection.
	pub user: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnnotation {
	pub bookmarked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
	pub field: String,
	pub entries: Vec<AggregationBucket>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationBucket {
	pub name: String,
	pub count: i64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub hash_id: Option<String>,
}
impl From<RawAggregation> for Aggregation {
	fn from(raw: RawAggregation) -> Self {
		Self {
			field: raw.field_name,
			entries: raw
				.entries
				.into_iter()
				.map(|bucket| AggregationBucket {
					name: bucket.key,
					count: bucket.int_val,
					hash_id: None,
				})
				.collect(),
		}
	}
}

/// Single entry returned by an id lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDetail {
	pub id: String,
	pub meta: Value,
	#[serde(default, skip_serializing_if = "Value::is_null")]
	pub origin: Value,
	#[serde(default, skip_serializing_if = "Value::is_null")]
	pub classifier: Value,
	#[serde(default, skip_serializing_if = "Value::is_null")]
	pub feature: Value,
	pub path: String,
	pub preview: String,
}
