use std::time::Duration;

use reqwest::{
	Client, StatusCode,
	header::{HeaderMap, HeaderName},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{
	Error, Result,
	retry::{self, RetryPolicy},
};
use vista_domain::{
	CompiledQuery,
	result::{IndexerResult, JobTicket, RawEntry},
};

const SEARCH_PATH: &str = "/rpc/search";
const LIST_SEARCH_RESULT_PATH: &str = "/rpc/list_search_result";
const GET_PATH: &str = "/rpc/get";

#[derive(Serialize)]
struct JobRequest<'a> {
	id: &'a str,
}

/// JSON-over-HTTP client for the remote indexer.
///
/// Holds one connection pool for the whole process. Clone it rather than building another.
#[derive(Debug, Clone)]
pub struct IndexerClient {
	http: Client,
	api_base: String,
	retry: RetryPolicy,
}
impl IndexerClient {
	pub fn new(cfg: &vista_config::Indexer) -> Result<Self> {
		let http = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(default_headers(&cfg.default_headers)?)
			.build()
			.map_err(|err| Error::InvalidConfig {
				message: format!("Failed to build indexer client: {err}."),
			})?;

		Ok(Self { http, api_base: cfg.api_base.clone(), retry: RetryPolicy::from(&cfg.retry) })
	}

	pub fn retry_policy(&self) -> &RetryPolicy {
		&self.retry
	}

	/// Submits a compiled query and returns the job handle.
	pub async fn submit(&self, query: &CompiledQuery) -> Result<JobTicket> {
		retry::retry(&self.retry, "submit", || self.post(SEARCH_PATH, query)).await
	}

	/// Fetches a job result. [`Error::StillRunning`] means the job has not finished.
	pub async fn poll_job(&self, job_id: &str) -> Result<IndexerResult> {
		let body = JobRequest { id: job_id };

		retry::retry(&self.retry, "poll_job", || self.post(LIST_SEARCH_RESULT_PATH, &body)).await
	}

	/// Looks up one indexed entry. Returns `None` when the indexer does not know the id.
	pub async fn get_entry(&self, image_id: &str) -> Result<Option<RawEntry>> {
		let body = JobRequest { id: image_id };

		match retry::retry(&self.retry, "get_entry", || self.post(GET_PATH, &body)).await {
			Ok(entry) => Ok(Some(entry)),
			Err(Error::Rejected { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() =>
				Ok(None),
			Err(err) => Err(err),
		}
	}

	async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
	where
		B: Serialize + ?Sized,
		T: DeserializeOwned,
	{
		let url = format!("{}{}", self.api_base, path);
		let res = self.http.post(url).json(body).send().await?;
		let status = res.status();

		if !status.is_success() {
			let text = res.text().await.unwrap_or_default();

			return Err(Error::from_status(status, text));
		}

		Ok(res.json().await?)
	}
}

fn default_headers(default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: format!("Default header {key} must be a string."),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}
