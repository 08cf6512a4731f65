use std::collections::{BTreeMap, HashMap};

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::{
	query::{
		AggregateSpec, CLUSTER_COUNT_OPTION, ClusteringMode, ClusteringSpec, CompiledQuery,
		FeatureTerm, Flag, GRID_METHOD_OPTION, GRID_METHOD_SCIPY, ImageQuery, ImageSource,
		ImageTextTerm, NumberTerm, OptionValue, PluginWeight, Polarity, ProjectionMode,
		ProjectionSpec, QueryOption, Relation, ResultOrder, Term, TextTerm, YEAR_MAX_FIELD,
		YEAR_MIN_FIELD,
	},
	request::{QueryKind, QueryTerm, SearchRequest, Settings},
};

/// Filter key whose structured values scope the search to collections.
pub const COLLECTION_FILTER: &str = "collection";

/// Scope derived from the caller rather than from the request body.
#[derive(Debug, Clone, Default)]
pub struct CallerScope {
	/// Collections searched alongside the default collection when the request names none.
	pub collection_ids: Vec<String>,
	/// Id allow-list, e.g. the caller's bookmarks.
	pub ids: Vec<String>,
}

/// Reference image that an `idx` query term needs loaded before compiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRequest {
	pub image_id: String,
	/// The public media copy is only read when a region of interest was requested.
	pub wants_public: bool,
}

/// Bytes loaded for reference images, keyed by image id.
#[derive(Debug, Clone, Default)]
pub struct ReferenceImages {
	private: HashMap<String, Vec<u8>>,
	public: HashMap<String, Vec<u8>>,
}
impl ReferenceImages {
	pub fn insert_private(&mut self, image_id: impl Into<String>, bytes: Vec<u8>) {
		self.private.insert(image_id.into(), bytes);
	}

	pub fn insert_public(&mut self, image_id: impl Into<String>, bytes: Vec<u8>) {
		self.public.insert(image_id.into(), bytes);
	}

	fn resolve(&self, image_id: &str, has_roi: bool) -> ImageSource {
		if let Some(bytes) = self.private.get(image_id) {
			return ImageSource::Encoded { data: STANDARD.encode(bytes) };
		}
		if has_roi && let Some(bytes) = self.public.get(image_id) {
			return ImageSource::Encoded { data: STANDARD.encode(bytes) };
		}

		ImageSource::Id { id: image_id.to_string() }
	}
}

/// Turns a [`SearchRequest`] into the canonical [`CompiledQuery`].
///
/// Compilation is pure and total: unusable parts of the request are skipped, never reported.
#[derive(Debug, Clone)]
pub struct QueryCompiler {
	default_plugin: String,
	aggregate_size: u32,
}
impl QueryCompiler {
	pub fn new(default_plugin: impl Into<String>, aggregate_size: u32) -> Self {
		Self { default_plugin: default_plugin.into(), aggregate_size }
	}

	pub fn from_config(cfg: &vista_config::Search) -> Self {
		Self::new(cfg.default_plugin.clone(), cfg.aggregate_size)
	}

	/// Reference images that [`Self::compile`] would like to embed, in query order.
	pub fn reference_requests(request: &SearchRequest) -> Vec<ReferenceRequest> {
		let mut out: Vec<ReferenceRequest> = Vec::new();

		for term in &request.query {
			if term.kind() != Some(QueryKind::Image) {
				continue;
			}

			let Some(image_id) = term.value() else {
				continue;
			};
			let wants_public = term.roi.is_some();

			match out.iter_mut().find(|existing| existing.image_id == image_id) {
				Some(existing) => existing.wants_public |= wants_public,
				None => out.push(ReferenceRequest { image_id: image_id.to_string(), wants_public }),
			}
		}

		out
	}

	pub fn compile(
		&self,
		request: &SearchRequest,
		scope: &CallerScope,
		images: &ReferenceImages,
	) -> CompiledQuery {
		let mut query = CompiledQuery::default();
		let explicit_collections = compile_filters(&request.filters, &mut query.terms);

		if !explicit_collections.is_empty() {
			query.collections = explicit_collections;
			query.include_default_collection = false;
		} else if !scope.collection_ids.is_empty() {
			query.collections = dedup(scope.collection_ids.iter().cloned());
		}

		for text in request.full_text.iter().filter(|text| !text.is_empty()) {
			query.terms.push(Term::Text(TextTerm {
				field: None,
				query: text.clone(),
				flag: Flag::Should,
			}));
		}

		compile_date_range(&request.date_range, &mut query.terms);

		let fields: Vec<String> =
			request.aggregate.iter().filter(|field| !field.is_empty()).cloned().collect();

		if !fields.is_empty() {
			query.aggregate =
				Some(AggregateSpec { fields, size: self.aggregate_size, use_query: true });
		}

		query.ids = dedup(scope.ids.iter().chain(request.ids.iter()).cloned());

		let default_plugins = self.default_plugins(&request.settings);

		for term in &request.query {
			if let Some(compiled) = compile_similarity(term, &default_plugins, images) {
				query.terms.push(compiled);
				query.ordering = ResultOrder::Similarity;
			}
		}

		if query.ordering != ResultOrder::Similarity
			&& let Some(seed) = request.random.as_ref()
		{
			query.ordering = ResultOrder::RandomSeeded { seed: seed.to_wire_string() };
		}

		query.projection = compile_projection(&request.settings);
		query.clustering = compile_clustering(&request.settings);

		query
	}

	fn default_plugins(&self, settings: &Settings) -> Vec<PluginWeight> {
		match settings.weights.as_ref().filter(|weights| !weights.is_empty()) {
			Some(weights) => plugin_weights(weights),
			None => vec![PluginWeight { name: self.default_plugin.clone(), weight: 1.0 }],
		}
	}
}

/// Emits text terms and returns the explicit collection scope, in first-seen order.
fn compile_filters(
	filters: &BTreeMap<String, Vec<crate::request::FilterValue>>,
	terms: &mut Vec<Term>,
) -> Vec<String> {
	let mut collections = Vec::new();

	for (field, values) in filters {
		for value in values {
			if field == COLLECTION_FILTER
				&& let Some(collection_id) = value.collection_id()
			{
				if !collections.iter().any(|existing: &String| existing == collection_id) {
					collections.push(collection_id.to_string());
				}

				continue;
			}

			let Some(name) = value.name() else {
				continue;
			};
			let flag = if value.positive() { Flag::Should } else { Flag::Not };

			terms.push(Term::Text(TextTerm { field: Some(field.clone()), query: name, flag }));
		}
	}

	collections
}

fn compile_date_range(values: &[serde_json::Number], terms: &mut Vec<Term>) {
	let years: Vec<i64> = values
		.iter()
		.filter_map(|number| number.as_i64().or_else(|| number.as_f64().map(|value| value as i64)))
		.collect();
	let (Some(min), Some(max)) = (years.iter().min(), years.iter().max()) else {
		return;
	};

	if years.len() > 1 {
		terms.push(Term::Number(NumberTerm {
			field: YEAR_MAX_FIELD.to_string(),
			value: *max,
			relation: Relation::LessEq,
			flag: Flag::Must,
		}));
	}

	terms.push(Term::Number(NumberTerm {
		field: YEAR_MIN_FIELD.to_string(),
		value: *min,
		relation: Relation::GreaterEq,
		flag: Flag::Must,
	}));
}

fn compile_similarity(
	term: &QueryTerm,
	default_plugins: &[PluginWeight],
	images: &ReferenceImages,
) -> Option<Term> {
	let kind = term.kind()?;
	let value = term.value()?;
	let plugins = match term.weights.as_ref().filter(|weights| !weights.is_empty()) {
		Some(weights) => plugin_weights(weights),
		None => default_plugins.to_vec(),
	};
	let polarity = Polarity::from_positive(term.positive.unwrap_or(true));

	Some(match kind {
		QueryKind::Text =>
			Term::ImageText(ImageTextTerm { query: value.to_string(), plugins, polarity }),
		QueryKind::Image => Term::Feature(FeatureTerm {
			image: ImageQuery { source: images.resolve(value, term.roi.is_some()), roi: term.roi },
			plugins,
			polarity,
		}),
	})
}

fn compile_projection(settings: &Settings) -> Option<ProjectionSpec> {
	let layout = settings.layout.as_ref()?;

	if layout.view_type.as_deref() != Some("umap") {
		return None;
	}

	let grid_method = if layout.view_grid { GRID_METHOD_SCIPY } else { "" };

	Some(ProjectionSpec {
		mode: ProjectionMode::Umap,
		options: vec![QueryOption {
			key: GRID_METHOD_OPTION.to_string(),
			value: OptionValue::String(grid_method.to_string()),
		}],
	})
}

fn compile_clustering(settings: &Settings) -> Option<ClusteringSpec> {
	let cluster = settings.cluster.as_ref()?;
	let n = cluster.n.filter(|n| *n > 1)?;

	Some(ClusteringSpec {
		mode: ClusteringMode::from_name(cluster.kind.as_deref()),
		options: vec![QueryOption {
			key: CLUSTER_COUNT_OPTION.to_string(),
			value: OptionValue::Int(n),
		}],
	})
}

fn plugin_weights(weights: &BTreeMap<String, f64>) -> Vec<PluginWeight> {
	weights
		.iter()
		.filter(|(_, weight)| weight.is_finite())
		.map(|(name, weight)| PluginWeight { name: name.to_lowercase(), weight: *weight })
		.collect()
}

fn dedup(values: impl Iterator<Item = String>) -> Vec<String> {
	let mut out: Vec<String> = Vec::new();

	for value in values {
		if !value.is_empty() && !out.contains(&value) {
			out.push(value);
		}
	}

	out
}
