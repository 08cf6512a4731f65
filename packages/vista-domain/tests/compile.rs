use serde_json::json;

use vista_domain::{
	CallerScope, QueryCompiler, ReferenceImages, ReferenceRequest, SearchRequest,
	fingerprint::{canonical_bytes, fingerprint},
	query::{
		ClusteringMode, CompiledQuery, Flag, ImageSource, OptionValue, Polarity, ProjectionMode,
		Relation, ResultOrder, Term, YEAR_MAX_FIELD, YEAR_MIN_FIELD,
	},
};

fn compiler() -> QueryCompiler {
	QueryCompiler::new("clip_embedding_feature", 250)
}

fn request(value: serde_json::Value) -> SearchRequest {
	serde_json::from_value(value).expect("Request should parse.")
}

fn compile(value: serde_json::Value) -> CompiledQuery {
	compiler().compile(&request(value), &CallerScope::default(), &ReferenceImages::default())
}

#[test]
fn same_request_compiles_to_identical_bytes() {
	let body = json!({
		"filters": { "meta.artist": ["Monet", { "name": "Manet", "positive": false }] },
		"full_text": ["water lilies"],
		"date_range": [1900, 1950],
		"query": [{ "type": "txt", "value": "garden", "weights": { "CLIP": 0.5 } }],
		"settings": { "cluster": { "type": "kmeans", "n": 4 } },
	});
	let first = canonical_bytes(&compile(body.clone())).expect("serialize");
	let second = canonical_bytes(&compile(body)).expect("serialize");

	assert_eq!(first, second);
}

#[test]
fn similarity_terms_override_random_ordering() {
	let query = compile(json!({
		"random": 42,
		"query": [{ "type": "txt", "value": "a boat" }],
	}));

	assert_eq!(query.ordering, ResultOrder::Similarity);
	assert!(query.has_similarity_terms());
}

#[test]
fn random_alone_seeds_ordering_with_stringified_value() {
	assert_eq!(compile(json!({ "random": 42 })).ordering, ResultOrder::RandomSeeded {
		seed: "42".to_string()
	});
	assert_eq!(compile(json!({ "random": "abc" })).ordering, ResultOrder::RandomSeeded {
		seed: "abc".to_string()
	});
	assert_eq!(compile(json!({ "random": 0.5 })).ordering, ResultOrder::RandomSeeded {
		seed: "0.5".to_string()
	});
	assert_eq!(compile(json!({})).ordering, ResultOrder::Default);
}

#[test]
fn date_range_emits_upper_bound_first() {
	let query = compile(json!({ "date_range": [1900, 1950] }));

	let [Term::Number(upper), Term::Number(lower)] = query.terms.as_slice() else {
		panic!("Expected two numeric terms, got {:?}.", query.terms);
	};

	assert_eq!(upper.field, YEAR_MAX_FIELD);
	assert_eq!(upper.value, 1950);
	assert_eq!(upper.relation, Relation::LessEq);
	assert_eq!(upper.flag, Flag::Must);
	assert_eq!(lower.field, YEAR_MIN_FIELD);
	assert_eq!(lower.value, 1900);
	assert_eq!(lower.relation, Relation::GreaterEq);
	assert_eq!(lower.flag, Flag::Must);
}

#[test]
fn single_date_emits_only_lower_bound() {
	let query = compile(json!({ "date_range": [1900] }));

	let [Term::Number(lower)] = query.terms.as_slice() else {
		panic!("Expected one numeric term, got {:?}.", query.terms);
	};

	assert_eq!(lower.field, YEAR_MIN_FIELD);
	assert_eq!(lower.value, 1900);
}

#[test]
fn explicit_collection_filter_replaces_default_scope() {
	let scope = CallerScope { collection_ids: vec!["mine".to_string()], ids: Vec::new() };
	let query = compiler().compile(
		&request(json!({ "filters": { "collection": [{ "hash_id": "abc" }] } })),
		&scope,
		&ReferenceImages::default(),
	);

	assert_eq!(query.collections, vec!["abc".to_string()]);
	assert!(!query.include_default_collection);
	assert!(query.terms.is_empty());
}

#[test]
fn caller_collections_are_searched_with_the_default_collection() {
	let scope = CallerScope {
		collection_ids: vec!["mine".to_string(), "mine".to_string()],
		ids: Vec::new(),
	};
	let query =
		compiler().compile(&request(json!({})), &scope, &ReferenceImages::default());

	assert_eq!(query.collections, vec!["mine".to_string()]);
	assert!(query.include_default_collection);
}

#[test]
fn filter_polarity_maps_to_flags() {
	let query = compile(json!({
		"filters": { "meta.artist": ["Monet", { "name": "Manet", "positive": false }] },
		"full_text": ["bridge"],
	}));
	let flags: Vec<(Option<String>, String, Flag)> = query
		.terms
		.iter()
		.filter_map(|term| match term {
			Term::Text(text) => Some((text.field.clone(), text.query.clone(), text.flag)),
			_ => None,
		})
		.collect();

	assert_eq!(flags, vec![
		(Some("meta.artist".to_string()), "Monet".to_string(), Flag::Should),
		(Some("meta.artist".to_string()), "Manet".to_string(), Flag::Not),
		(None, "bridge".to_string(), Flag::Should),
	]);
}

#[test]
fn caller_ids_are_extended_with_request_ids() {
	let scope = CallerScope { collection_ids: Vec::new(), ids: vec!["b1".to_string()] };
	let query = compiler().compile(
		&request(json!({ "ids": ["r1", "b1"] })),
		&scope,
		&ReferenceImages::default(),
	);

	assert_eq!(query.ids, vec!["b1".to_string(), "r1".to_string()]);
	assert!(compile(json!({})).ids.is_empty());
}

#[test]
fn aggregate_fields_keep_input_order_and_size() {
	let query = compile(json!({ "aggregate": ["meta.artist", "origin.name"] }));
	let aggregate = query.aggregate.expect("Aggregation should be requested.");

	assert_eq!(aggregate.fields, vec!["meta.artist".to_string(), "origin.name".to_string()]);
	assert_eq!(aggregate.size, 250);
	assert!(aggregate.use_query);
}

#[test]
fn image_terms_prefer_private_bytes() {
	let body = request(json!({
		"query": [
			{ "type": "idx", "value": "up1" },
			{ "type": "idx", "value": "pub1", "roi": { "x": 0.1, "y": 0.1, "width": 0.5, "height": 0.5 } },
			{ "type": "idx", "value": "pub2" },
		],
	}));
	let mut images = ReferenceImages::default();

	images.insert_private("up1", vec![1, 2, 3]);
	images.insert_public("pub1", vec![4, 5]);
	images.insert_public("pub2", vec![6]);

	let query = compiler().compile(&body, &CallerScope::default(), &images);
	let sources: Vec<ImageSource> = query
		.terms
		.iter()
		.filter_map(|term| match term {
			Term::Feature(feature) => Some(feature.image.source.clone()),
			_ => None,
		})
		.collect();

	assert_eq!(sources, vec![
		ImageSource::Encoded { data: "AQID".to_string() },
		ImageSource::Encoded { data: "BAU=".to_string() },
		ImageSource::Id { id: "pub2".to_string() },
	]);
	assert_eq!(query.ordering, ResultOrder::Similarity);
}

#[test]
fn reference_requests_ask_for_public_bytes_only_with_roi() {
	let body = request(json!({
		"query": [
			{ "type": "txt", "value": "tree" },
			{ "type": "idx", "value": "a" },
			{ "type": "idx", "value": "b", "roi": { "x": 0, "y": 0, "width": 1, "height": 1 } },
			{ "type": "idx", "value": "a", "roi": { "x": 0, "y": 0, "width": 1, "height": 1 } },
		],
	}));

	assert_eq!(QueryCompiler::reference_requests(&body), vec![
		ReferenceRequest { image_id: "a".to_string(), wants_public: true },
		ReferenceRequest { image_id: "b".to_string(), wants_public: true },
	]);
}

#[test]
fn weights_resolve_per_term_then_per_request_then_default() {
	let query = compile(json!({
		"settings": { "weights": { "Color": 0.3 } },
		"query": [
			{ "type": "txt", "value": "tree", "positive": false },
			{ "type": "txt", "value": "river", "weights": { "CLIP": 0.8 } },
		],
	}));
	let plugins: Vec<(Vec<(String, f64)>, Polarity)> = query
		.terms
		.iter()
		.filter_map(|term| match term {
			Term::ImageText(text) => Some((
				text.plugins.iter().map(|p| (p.name.clone(), p.weight)).collect(),
				text.polarity,
			)),
			_ => None,
		})
		.collect();

	assert_eq!(plugins, vec![
		(vec![("color".to_string(), 0.3)], Polarity::Negative),
		(vec![("clip".to_string(), 0.8)], Polarity::Positive),
	]);

	let defaulted = compile(json!({ "query": [{ "type": "txt", "value": "tree" }] }));
	let Some(Term::ImageText(text)) = defaulted.terms.first() else {
		panic!("Expected a text similarity term.");
	};

	assert_eq!(text.plugins.len(), 1);
	assert_eq!(text.plugins[0].name, "clip_embedding_feature");
	assert_eq!(text.plugins[0].weight, 1.0);
}

#[test]
fn layout_and_cluster_settings() {
	let query = compile(json!({
		"settings": {
			"layout": { "viewType": "umap", "viewGrid": true },
			"cluster": { "type": "agglomerative", "n": 5 },
		},
	}));
	let projection = query.projection.expect("Projection should be set.");
	let clustering = query.clustering.expect("Clustering should be set.");

	assert_eq!(projection.mode, ProjectionMode::Umap);
	assert_eq!(projection.options[0].value, OptionValue::String("scipy".to_string()));
	assert_eq!(clustering.mode, ClusteringMode::Agglomerative);
	assert_eq!(clustering.options[0].value, OptionValue::Int(5));

	let flat = compile(json!({
		"settings": { "layout": { "viewType": "umap" }, "cluster": { "n": 1 } },
	}));

	assert_eq!(
		flat.projection.expect("Projection should be set.").options[0].value,
		OptionValue::String(String::new())
	);
	assert!(flat.clustering.is_none());
	assert!(compile(json!({ "settings": { "layout": { "viewType": "grid" } } })).projection.is_none());
}

#[test]
fn job_id_marks_a_poll_request() {
	let polled = request(json!({ "job_id": " job-1 ", "full_text": ["ignored"] }));

	assert_eq!(polled.poll_job_id(), Some("job-1"));
	assert_eq!(request(json!({ "full_text": ["fresh"] })).poll_job_id(), None);
}

#[test]
fn cluster_type_names() {
	let mode = |kind: serde_json::Value| {
		compile(json!({ "settings": { "cluster": { "type": kind, "n": 3 } } }))
			.clustering
			.expect("Clustering should be set.")
			.mode
	};

	assert_eq!(mode(json!("kmeans")), ClusteringMode::Kmeans);
	assert_eq!(mode(json!("agglomerative")), ClusteringMode::Agglomerative);
	assert_eq!(mode(json!("gaussian-mixture")), ClusteringMode::GaussianMixture);
	assert_eq!(mode(json!("gm")), ClusteringMode::GaussianMixture);
	assert_eq!(mode(json!("spectral")), ClusteringMode::Kmeans);
	assert_eq!(mode(serde_json::Value::Null), ClusteringMode::Kmeans);
}

#[test]
fn fingerprints_separate_different_queries() {
	let a = fingerprint(&compile(json!({ "full_text": ["a"] }))).expect("serialize");
	let b = fingerprint(&compile(json!({ "full_text": ["b"] }))).expect("serialize");
	let a_again = fingerprint(&compile(json!({ "full_text": ["a"] }))).expect("serialize");

	assert_ne!(a, b);
	assert_eq!(a, a_again);
}
