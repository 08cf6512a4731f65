//! Wire form of a compiled search, as submitted to the indexer.
//!
//! Field declaration order is the serialization order and therefore part of the fingerprint.
//! Reordering fields or variants invalidates every cached result.

use serde::{Deserialize, Serialize};

use crate::request::Roi;

pub const YEAR_MIN_FIELD: &str = "meta.year_min";
pub const YEAR_MAX_FIELD: &str = "meta.year_max";
pub const GRID_METHOD_OPTION: &str = "grid_method";
pub const GRID_METHOD_SCIPY: &str = "scipy";
pub const CLUSTER_COUNT_OPTION: &str = "k";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledQuery {
	pub terms: Vec<Term>,
	pub aggregate: Option<AggregateSpec>,
	pub ordering: ResultOrder,
	pub clustering: Option<ClusteringSpec>,
	pub projection: Option<ProjectionSpec>,
	pub ids: Vec<String>,
	pub collections: Vec<String>,
	pub include_default_collection: bool,
}
impl CompiledQuery {
	pub fn has_similarity_terms(&self) -> bool {
		self.terms.iter().any(Term::is_similarity)
	}
}
impl Default for CompiledQuery {
	fn default() -> Self {
		Self {
			terms: Vec::new(),
			aggregate: None,
			ordering: ResultOrder::Default,
			clustering: None,
			projection: None,
			ids: Vec::new(),
			collections: Vec::new(),
			include_default_collection: true,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Term {
	Text(TextTerm),
	Number(NumberTerm),
	ImageText(ImageTextTerm),
	Feature(FeatureTerm),
}
impl Term {
	pub fn is_similarity(&self) -> bool {
		matches!(self, Self::ImageText(_) | Self::Feature(_))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Flag {
	Must,
	Should,
	Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relation {
	Eq,
	Greater,
	GreaterEq,
	Less,
	LessEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Polarity {
	Positive,
	Negative,
}
impl Polarity {
	pub fn from_positive(positive: bool) -> Self {
		if positive { Self::Positive } else { Self::Negative }
	}
}

/// Field match. `field: None` matches any text field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextTerm {
	pub field: Option<String>,
	pub query: String,
	pub flag: Flag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberTerm {
	pub field: String,
	pub value: i64,
	pub relation: Relation,
	pub flag: Flag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageTextTerm {
	pub query: String,
	pub plugins: Vec<PluginWeight>,
	pub polarity: Polarity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTerm {
	pub image: ImageQuery,
	pub plugins: Vec<PluginWeight>,
	pub polarity: Polarity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageQuery {
	pub source: ImageSource,
	pub roi: Option<Roi>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageSource {
	/// An image the indexer already holds.
	Id { id: String },
	/// Base64-encoded image bytes.
	Encoded { data: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginWeight {
	pub name: String,
	pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSpec {
	pub fields: Vec<String>,
	pub size: u32,
	pub use_query: bool,
}

/// Result ordering. Exactly one mode is active per query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResultOrder {
	Default,
	RandomSeeded { seed: String },
	Similarity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusteringSpec {
	pub mode: ClusteringMode,
	pub options: Vec<QueryOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusteringMode {
	Kmeans,
	Agglomerative,
	GaussianMixture,
}
impl ClusteringMode {
	/// Unknown or missing names fall back to k-means.
	pub fn from_name(name: Option<&str>) -> Self {
		match name.map(str::trim) {
			Some("agglomerative") => Self::Agglomerative,
			Some("gaussian-mixture" | "gaussian_mixture" | "gm") => Self::GaussianMixture,
			_ => Self::Kmeans,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionSpec {
	pub mode: ProjectionMode,
	pub options: Vec<QueryOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionMode {
	Umap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOption {
	pub key: String,
	pub value: OptionValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionValue {
	Int(i64),
	String(String),
}
