//! Two-phase search: submit a compiled query, then poll its job until the indexer finishes.

use serde::Serialize;

use vista_domain::{
	CallerScope, Fingerprint, QueryCompiler, ReferenceImages, SearchRequest, fingerprint,
	result::{IndexerResult, SearchResult},
};

use crate::{CallerContext, Error, Result, VistaService};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SearchOutcome {
	/// Submitted or still running. Poll again with the same job id.
	Pending { job_id: String },
	Done(SearchResult),
	/// The indexer failed the job or stayed unreachable. The caller decides whether to poll again.
	Failed { job_id: String, error: String },
}

impl VistaService {
	/// Submits a new search, or polls an earlier one when `request.job_id` is set.
	pub async fn search(
		&self,
		request: &SearchRequest,
		caller: &CallerContext,
	) -> Result<SearchOutcome> {
		if let Some(job_id) = request.poll_job_id() {
			return self.poll(job_id, caller).await;
		}
		if request.bookmarks && !caller.is_authenticated() {
			return Err(Error::NotAuthenticated);
		}

		let scope = self.caller_scope(request, caller).await?;
		let images = self.load_reference_images(request).await;
		let query = self.compiler.compile(request, &scope, &images);
		let fingerprint = fingerprint(&query).map_err(|err| Error::InvalidRequest {
			message: format!("Failed to encode compiled query: {err}."),
		})?;

		if let Some(cached) = self.cache_get(&fingerprint).await {
			return Ok(SearchOutcome::Done(self.enrich(cached, caller).await?));
		}

		let ticket = self.backends.indexer.submit(&query).await?;

		tracing::info!(
			fingerprint_prefix = fingerprint.prefix(),
			job_id = ticket.id.as_str(),
			"Search submitted."
		);

		self.cache_link(&ticket.id, &fingerprint).await;

		Ok(SearchOutcome::Pending { job_id: ticket.id })
	}

	async fn poll(&self, job_id: &str, caller: &CallerContext) -> Result<SearchOutcome> {
		let result = match self.backends.indexer.poll_job(job_id).await {
			Ok(result) => result,
			Err(vista_providers::Error::StillRunning) => {
				tracing::debug!(job_id, "Search job is still running.");

				return Ok(SearchOutcome::Pending { job_id: job_id.to_string() });
			},
			Err(err) => {
				if err.is_transient() {
					tracing::warn!(job_id, error = %err, "Search poll failed after retries.");
				} else {
					tracing::error!(job_id, error = %err, "Search job failed.");
				}

				return Ok(SearchOutcome::Failed {
					job_id: job_id.to_string(),
					error: err.to_string(),
				});
			},
		};

		if let Some(fingerprint) = self.cache_resolve(job_id).await {
			self.cache_put(&fingerprint, &result).await;
		}

		Ok(SearchOutcome::Done(self.enrich(result, caller).await?))
	}

	async fn caller_scope(
		&self,
		request: &SearchRequest,
		caller: &CallerContext,
	) -> Result<CallerScope> {
		let mut scope = CallerScope { collection_ids: caller.collection_ids(), ids: Vec::new() };

		if request.bookmarks
			&& let Some(caller_id) = caller.caller_id.as_deref()
		{
			scope.ids = self.backends.bookmarks.list_bookmarked_ids(caller_id).await?;
		}

		Ok(scope)
	}

	/// Loads bytes for image similarity terms. Unreadable images fall back to an id reference.
	async fn load_reference_images(&self, request: &SearchRequest) -> ReferenceImages {
		let mut images = ReferenceImages::default();

		for reference in QueryCompiler::reference_requests(request) {
			let image_id = reference.image_id.as_str();

			match self.backends.images.read_private(image_id).await {
				Ok(Some(bytes)) => {
					images.insert_private(image_id, bytes);

					continue;
				},
				Ok(None) => {},
				Err(err) => {
					tracing::warn!(
						image_id,
						error = %err,
						"Failed to read uploaded reference image."
					);
				},
			}

			if !reference.wants_public {
				continue;
			}

			match self.backends.images.read_public(image_id).await {
				Ok(Some(bytes)) => images.insert_public(image_id, bytes),
				Ok(None) => {},
				Err(err) => {
					tracing::warn!(
						image_id,
						error = %err,
						"Failed to read indexed reference image."
					);
				},
			}
		}

		images
	}

	async fn cache_get(&self, fingerprint: &Fingerprint) -> Option<IndexerResult> {
		if !self.cfg.search.cache.enabled {
			return None;
		}

		match self.backends.cache.get(fingerprint).await {
			Ok(Some(result)) => {
				tracing::info!(
					fingerprint_prefix = fingerprint.prefix(),
					hit = true,
					entry_count = result.entries.len(),
					"Search cache hit."
				);

				Some(result)
			},
			Ok(None) => {
				tracing::info!(
					fingerprint_prefix = fingerprint.prefix(),
					hit = false,
					"Search cache miss."
				);

				None
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					fingerprint_prefix = fingerprint.prefix(),
					"Search cache read failed."
				);

				None
			},
		}
	}

	async fn cache_put(&self, fingerprint: &Fingerprint, result: &IndexerResult) {
		if !self.cfg.search.cache.enabled {
			return;
		}

		match self.backends.cache.put(fingerprint, result).await {
			Ok(Some(payload_size)) => {
				tracing::info!(
					fingerprint_prefix = fingerprint.prefix(),
					payload_size,
					"Search cache stored."
				);
			},
			Ok(None) => {
				tracing::warn!(
					fingerprint_prefix = fingerprint.prefix(),
					"Search cache payload skipped due to size."
				);
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					fingerprint_prefix = fingerprint.prefix(),
					"Search cache write failed."
				);
			},
		}
	}

	async fn cache_link(&self, job_id: &str, fingerprint: &Fingerprint) {
		if !self.cfg.search.cache.enabled {
			return;
		}
		if let Err(err) = self.backends.cache.link_job(job_id, fingerprint).await {
			tracing::warn!(
				error = %err,
				job_id,
				fingerprint_prefix = fingerprint.prefix(),
				"Search job link write failed."
			);
		}
	}

	async fn cache_resolve(&self, job_id: &str) -> Option<Fingerprint> {
		if !self.cfg.search.cache.enabled {
			return None;
		}

		match self.backends.cache.resolve_job(job_id).await {
			Ok(fingerprint) => fingerprint,
			Err(err) => {
				tracing::warn!(error = %err, job_id, "Search job link read failed.");

				None
			},
		}
	}
}
