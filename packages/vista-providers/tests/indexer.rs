use std::{
	net::SocketAddr,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};

use axum::{
	Json, Router,
	extract::State,
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	routing::post,
};
use serde_json::{Map, Value, json};
use tokio::net::TcpListener;

use vista_config::{Indexer, IndexerRetry};
use vista_domain::CompiledQuery;
use vista_providers::{Error, IndexerClient};

#[derive(Clone, Default)]
struct FakeIndexer {
	submits: Arc<AtomicUsize>,
	polls: Arc<AtomicUsize>,
	gets: Arc<AtomicUsize>,
}

async fn search(
	State(state): State<FakeIndexer>,
	headers: HeaderMap,
	Json(body): Json<Value>,
) -> Response {
	state.submits.fetch_add(1, Ordering::SeqCst);

	if headers.get("x-tenant").and_then(|value| value.to_str().ok()) != Some("museum") {
		return StatusCode::UNAUTHORIZED.into_response();
	}
	if body.get("terms").is_none() {
		return StatusCode::BAD_REQUEST.into_response();
	}

	Json(json!({ "id": "job-1" })).into_response()
}

async fn list_search_result(State(state): State<FakeIndexer>, Json(body): Json<Value>) -> Response {
	let call = state.polls.fetch_add(1, Ordering::SeqCst);

	match body.get("id").and_then(Value::as_str) {
		Some("running") => StatusCode::PRECONDITION_FAILED.into_response(),
		Some("flaky") if call < 2 => StatusCode::SERVICE_UNAVAILABLE.into_response(),
		Some("flaky") => Json(json!({
			"entries": [{ "id": "abcd01", "distance": 0.25, "collection": { "id": "c1", "name": "Mine", "is_public": false } }],
			"aggregate": [{ "field_name": "meta.artist", "entries": [{ "key": "Monet", "int_val": 2 }] }],
		}))
		.into_response(),
		_ => (StatusCode::INTERNAL_SERVER_ERROR, "index corrupted").into_response(),
	}
}

async fn get(State(state): State<FakeIndexer>, Json(body): Json<Value>) -> Response {
	state.gets.fetch_add(1, Ordering::SeqCst);

	match body.get("id").and_then(Value::as_str) {
		Some("abcd01") => Json(json!({ "id": "abcd01", "meta": [] })).into_response(),
		_ => StatusCode::NOT_FOUND.into_response(),
	}
}

async fn spawn_indexer(state: FakeIndexer) -> SocketAddr {
	let app = Router::new()
		.route("/rpc/search", post(search))
		.route("/rpc/list_search_result", post(list_search_result))
		.route("/rpc/get", post(get))
		.with_state(state);
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind fake indexer.");
	let addr = listener.local_addr().expect("Listener should have an address.");

	tokio::spawn(async move {
		let _ = axum::serve(listener, app).await;
	});

	addr
}

fn client_for(addr: SocketAddr) -> IndexerClient {
	let mut default_headers = Map::new();

	default_headers.insert("x-tenant".to_string(), Value::from("museum"));

	let cfg = Indexer {
		api_base: format!("http://{addr}"),
		timeout_ms: 5_000,
		default_headers,
		retry: IndexerRetry { max_attempts: 4, initial_backoff_ms: 1, max_backoff_ms: 4 },
	};

	IndexerClient::new(&cfg).expect("Failed to build indexer client.")
}

#[tokio::test]
async fn submit_sends_default_headers_and_returns_job() {
	let state = FakeIndexer::default();
	let client = client_for(spawn_indexer(state.clone()).await);
	let ticket = client.submit(&CompiledQuery::default()).await.expect("Submit should succeed.");

	assert_eq!(ticket.id, "job-1");
	assert_eq!(state.submits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn still_running_is_reported_without_retrying() {
	let state = FakeIndexer::default();
	let client = client_for(spawn_indexer(state.clone()).await);
	let err = client.poll_job("running").await.expect_err("Job should still be running.");

	assert!(matches!(err, Error::StillRunning));
	assert_eq!(state.polls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unavailable_polls_are_retried_until_done() {
	let state = FakeIndexer::default();
	let client = client_for(spawn_indexer(state.clone()).await);
	let result = client.poll_job("flaky").await.expect("Third poll should succeed.");

	assert_eq!(state.polls.load(Ordering::SeqCst), 3);
	assert_eq!(result.entries.len(), 1);
	assert_eq!(result.entries[0].distance, Some(0.25));
	assert_eq!(result.aggregate[0].entries[0].int_val, 2);
}

#[tokio::test]
async fn server_errors_are_rejections() {
	let state = FakeIndexer::default();
	let client = client_for(spawn_indexer(state.clone()).await);
	let err = client.poll_job("broken").await.expect_err("Poll should fail.");

	assert!(matches!(err, Error::Rejected { status: 500, .. }), "Unexpected error: {err}");
	assert_eq!(state.polls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_entries_are_none() {
	let state = FakeIndexer::default();
	let client = client_for(spawn_indexer(state.clone()).await);

	assert!(client.get_entry("missing").await.expect("Lookup should succeed.").is_none());

	let entry = client.get_entry("abcd01").await.expect("Lookup should succeed.");

	assert_eq!(entry.map(|entry| entry.id), Some("abcd01".to_string()));
}

#[tokio::test]
async fn unreachable_indexer_is_unavailable() {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind.");
	let addr = listener.local_addr().expect("Listener should have an address.");

	drop(listener);

	let err = client_for(addr).submit(&CompiledQuery::default()).await.expect_err("No server.");

	assert!(err.is_transient(), "Unexpected error: {err}");
}
