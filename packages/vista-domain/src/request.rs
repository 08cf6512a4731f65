//! Caller-facing search request.
//!
//! Every field is optional. A field, list element, or map value that does not match its expected
//! shape is dropped instead of failing the whole request, so a client sending a half-filled form
//! still gets a search over whatever it did specify.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::{Number, Value};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
	#[serde(deserialize_with = "lenient_filters")]
	pub filters: BTreeMap<String, Vec<FilterValue>>,
	#[serde(deserialize_with = "lenient_list")]
	pub full_text: Vec<String>,
	#[serde(deserialize_with = "lenient_list")]
	pub date_range: Vec<Number>,
	#[serde(deserialize_with = "lenient_list")]
	pub aggregate: Vec<String>,
	#[serde(deserialize_with = "lenient_list")]
	pub query: Vec<QueryTerm>,
	#[serde(deserialize_with = "lenient")]
	pub settings: Settings,
	#[serde(deserialize_with = "lenient_list")]
	pub ids: Vec<String>,
	#[serde(deserialize_with = "lenient")]
	pub random: Option<Scalar>,
	#[serde(deserialize_with = "lenient")]
	pub bookmarks: bool,
	#[serde(deserialize_with = "lenient")]
	pub job_id: Option<String>,
}
impl SearchRequest {
	/// The job id when this request polls an earlier submission.
	pub fn poll_job_id(&self) -> Option<&str> {
		self.job_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
	}
}

/// A string or number as sent by a loosely typed client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
	Text(String),
	Integer(i64),
	Float(f64),
}
impl Scalar {
	/// Text form used on the wire. Floats keep their fractional part (`1.0`, not `1`).
	pub fn to_wire_string(&self) -> String {
		match self {
			Self::Text(text) => text.clone(),
			Self::Integer(value) => value.to_string(),
			Self::Float(value) => match Number::from_f64(*value) {
				Some(number) => number.to_string(),
				None => value.to_string(),
			},
		}
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
	Plain(Scalar),
	Structured(StructuredFilter),
}
impl FilterValue {
	pub fn name(&self) -> Option<String> {
		match self {
			Self::Plain(scalar) => Some(scalar.to_wire_string()),
			Self::Structured(filter) => filter.name.as_ref().map(Scalar::to_wire_string),
		}
	}

	pub fn positive(&self) -> bool {
		match self {
			Self::Plain(_) => true,
			Self::Structured(filter) => filter.positive.unwrap_or(true),
		}
	}

	/// Collection id carried by a structured `collection` filter.
	pub fn collection_id(&self) -> Option<&str> {
		match self {
			Self::Plain(_) => None,
			Self::Structured(filter) => filter.hash_id.as_deref().filter(|id| !id.is_empty()),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StructuredFilter {
	#[serde(deserialize_with = "lenient")]
	pub name: Option<Scalar>,
	#[serde(deserialize_with = "lenient")]
	pub positive: Option<bool>,
	#[serde(deserialize_with = "lenient")]
	pub hash_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
	/// `txt`: text-to-image similarity.
	Text,
	/// `idx`: image-to-image similarity against an indexed or uploaded image.
	Image,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct QueryTerm {
	#[serde(rename = "type", deserialize_with = "lenient")]
	pub kind: Option<String>,
	#[serde(deserialize_with = "lenient")]
	pub value: Option<String>,
	#[serde(deserialize_with = "lenient")]
	pub positive: Option<bool>,
	#[serde(deserialize_with = "lenient")]
	pub weights: Option<BTreeMap<String, f64>>,
	#[serde(deserialize_with = "lenient")]
	pub roi: Option<Roi>,
}
impl QueryTerm {
	pub fn kind(&self) -> Option<QueryKind> {
		match self.kind.as_deref()? {
			"txt" => Some(QueryKind::Text),
			"idx" => Some(QueryKind::Image),
			_ => None,
		}
	}

	pub fn value(&self) -> Option<&str> {
		self.value.as_deref().filter(|value| !value.is_empty())
	}
}

/// Region of interest inside a reference image.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, Deserialize)]
pub struct Roi {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
	#[serde(deserialize_with = "lenient")]
	pub layout: Option<Layout>,
	#[serde(deserialize_with = "lenient")]
	pub cluster: Option<Cluster>,
	#[serde(deserialize_with = "lenient")]
	pub weights: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Layout {
	#[serde(rename = "viewType", deserialize_with = "lenient")]
	pub view_type: Option<String>,
	#[serde(rename = "viewGrid", deserialize_with = "lenient")]
	pub view_grid: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Cluster {
	#[serde(rename = "type", deserialize_with = "lenient")]
	pub kind: Option<String>,
	#[serde(deserialize_with = "lenient")]
	pub n: Option<i64>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: DeserializeOwned + Default,
{
	let value = Value::deserialize(deserializer)?;

	Ok(T::deserialize(value).unwrap_or_default())
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
	D: Deserializer<'de>,
	T: DeserializeOwned,
{
	let value = Value::deserialize(deserializer)?;

	Ok(parse_list(value))
}

fn lenient_filters<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<FilterValue>>, D::Error>
where
	D: Deserializer<'de>,
{
	let Value::Object(map) = Value::deserialize(deserializer)? else {
		return Ok(BTreeMap::new());
	};

	Ok(map.into_iter().map(|(field, values)| (field, parse_list(values))).collect())
}

/// Accepts a single value or an array, keeping only the elements that parse.
fn parse_list<T>(value: Value) -> Vec<T>
where
	T: DeserializeOwned,
{
	match value {
		Value::Null => Vec::new(),
		Value::Array(items) =>
			items.into_iter().filter_map(|item| T::deserialize(item).ok()).collect(),
		other => T::deserialize(other).ok().into_iter().collect(),
	}
}
