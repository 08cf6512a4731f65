use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub indexer: Indexer,
	pub search: Search,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub media: Media,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// Filesystem roots and public URL prefixes for image files.
#[derive(Debug, Clone, Deserialize)]
pub struct Media {
	/// Indexed media served to everyone.
	pub media_root: PathBuf,
	/// Private staging area for uploaded query images.
	pub upload_root: PathBuf,
	pub media_url: String,
	pub upload_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Indexer {
	pub api_base: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	#[serde(default)]
	pub retry: IndexerRetry,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexerRetry {
	pub max_attempts: u32,
	pub initial_backoff_ms: u64,
	pub max_backoff_ms: u64,
}
impl Default for IndexerRetry {
	fn default() -> Self {
		Self { max_attempts: 4, initial_backoff_ms: 100, max_backoff_ms: 1_600 }
	}
}

#[derive(Debug, Deserialize)]
pub struct Search {
	#[serde(default = "default_plugin")]
	pub default_plugin: String,
	#[serde(default = "default_aggregate_size")]
	pub aggregate_size: u32,
	pub cache: SearchCache,
}

#[derive(Debug, Deserialize)]
pub struct SearchCache {
	pub enabled: bool,
	pub result_ttl_secs: i64,
	pub job_link_ttl_secs: i64,
	pub max_payload_bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
	/// Header carrying the caller id set by the authenticating proxy.
	#[serde(default = "default_caller_header")]
	pub caller_header: String,
}

fn default_plugin() -> String {
	"clip_embedding_feature".to_string()
}

fn default_aggregate_size() -> u32 {
	250
}

fn default_caller_header() -> String {
	"x-vista-caller".to_string()
}
