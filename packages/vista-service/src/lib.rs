pub mod caller;
pub mod enrich;
pub mod entry;
pub mod search;

mod error;

pub use caller::CallerContext;
pub use entry::GetRequest;
pub use error::{Error, Result};
pub use search::SearchOutcome;

use std::{collections::HashSet, future::Future, pin::Pin, sync::Arc};

use color_eyre::eyre;
use serde_json::Value;
use time::{Duration, OffsetDateTime};

use vista_config::Config;
use vista_domain::{
	CompiledQuery, Fingerprint, QueryCompiler,
	media::MediaUrls,
	result::{IndexerResult, JobTicket, RawEntry},
};
use vista_providers::IndexerClient;
use vista_storage::{
	db::Db,
	media::MediaStore,
	models::{OwnedCollection, UploadedImage},
	queries,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Remote indexer reached over RPC.
pub trait IndexerRpc
where
	Self: Send + Sync,
{
	fn submit<'a>(
		&'a self,
		query: &'a CompiledQuery,
	) -> BoxFuture<'a, vista_providers::Result<JobTicket>>;

	fn poll_job<'a>(
		&'a self,
		job_id: &'a str,
	) -> BoxFuture<'a, vista_providers::Result<IndexerResult>>;

	fn get_entry<'a>(
		&'a self,
		image_id: &'a str,
	) -> BoxFuture<'a, vista_providers::Result<Option<RawEntry>>>;
}

/// Completed results keyed by fingerprint, plus the job-id to fingerprint index.
pub trait ResultCache
where
	Self: Send + Sync,
{
	fn get<'a>(
		&'a self,
		fingerprint: &'a Fingerprint,
	) -> BoxFuture<'a, color_eyre::Result<Option<IndexerResult>>>;

	/// Returns the stored payload size, or `None` when the payload was too large to keep.
	fn put<'a>(
		&'a self,
		fingerprint: &'a Fingerprint,
		result: &'a IndexerResult,
	) -> BoxFuture<'a, color_eyre::Result<Option<usize>>>;

	fn link_job<'a>(
		&'a self,
		job_id: &'a str,
		fingerprint: &'a Fingerprint,
	) -> BoxFuture<'a, color_eyre::Result<()>>;

	fn resolve_job<'a>(
		&'a self,
		job_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<Fingerprint>>>;
}

pub trait BookmarkStore
where
	Self: Send + Sync,
{
	fn list_bookmarked_ids<'a>(
		&'a self,
		caller_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<String>>>;

	/// Subset of `image_ids` the caller bookmarked. One call per result set.
	fn bookmark_status<'a>(
		&'a self,
		caller_id: &'a str,
		image_ids: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<HashSet<String>>>;
}

pub trait CollectionStore
where
	Self: Send + Sync,
{
	fn list_owned_collections<'a>(
		&'a self,
		caller_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<OwnedCollection>>>;

	fn find_uploaded_image<'a>(
		&'a self,
		hash_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<UploadedImage>>>;
}

/// Image bytes for similarity queries by id.
pub trait ReferenceImageSource
where
	Self: Send + Sync,
{
	fn read_private<'a>(
		&'a self,
		image_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<Vec<u8>>>>;

	fn read_public<'a>(
		&'a self,
		image_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<Vec<u8>>>>;
}

#[derive(Clone)]
pub struct Backends {
	pub indexer: Arc<dyn IndexerRpc>,
	pub cache: Arc<dyn ResultCache>,
	pub bookmarks: Arc<dyn BookmarkStore>,
	pub collections: Arc<dyn CollectionStore>,
	pub images: Arc<dyn ReferenceImageSource>,
}
impl Backends {
	pub fn new(
		indexer: Arc<dyn IndexerRpc>,
		cache: Arc<dyn ResultCache>,
		bookmarks: Arc<dyn BookmarkStore>,
		collections: Arc<dyn CollectionStore>,
		images: Arc<dyn ReferenceImageSource>,
	) -> Self {
		Self { indexer, cache, bookmarks, collections, images }
	}

	/// Postgres-backed stores, the HTTP indexer client, and the on-disk media store.
	pub fn from_config(cfg: &Config, db: Db) -> Result<Self> {
		let indexer = Arc::new(IndexerClient::new(&cfg.indexer)?);
		let pg = Arc::new(PgBackend::new(db, &cfg.search.cache));
		let images = Arc::new(MediaStore::from_config(&cfg.storage.media));

		Ok(Self::new(indexer, pg.clone(), pg.clone(), pg, images))
	}
}

pub struct VistaService {
	pub cfg: Config,
	pub backends: Backends,
	compiler: QueryCompiler,
	urls: MediaUrls,
}
impl VistaService {
	pub fn new(cfg: Config, backends: Backends) -> Self {
		let compiler = QueryCompiler::from_config(&cfg.search);
		let urls = MediaUrls::from_config(&cfg.storage.media);

		Self { cfg, backends, compiler, urls }
	}

	pub fn urls(&self) -> &MediaUrls {
		&self.urls
	}
}

/// Result cache, bookmarks, and collections on Postgres.
pub struct PgBackend {
	db: Db,
	result_ttl: Duration,
	job_link_ttl: Duration,
	max_payload_bytes: Option<u64>,
}
impl PgBackend {
	pub fn new(db: Db, cfg: &vista_config::SearchCache) -> Self {
		Self {
			db,
			result_ttl: Duration::seconds(cfg.result_ttl_secs),
			job_link_ttl: Duration::seconds(cfg.job_link_ttl_secs),
			max_payload_bytes: cfg.max_payload_bytes,
		}
	}
}

fn expires_at(now: OffsetDateTime, ttl: Duration) -> color_eyre::Result<OffsetDateTime> {
	now.checked_add(ttl)
		.ok_or_else(|| eyre::eyre!("Cache TTL of {ttl} overflows the expiry timestamp."))
}

impl ResultCache for PgBackend {
	fn get<'a>(
		&'a self,
		fingerprint: &'a Fingerprint,
	) -> BoxFuture<'a, color_eyre::Result<Option<IndexerResult>>> {
		Box::pin(async move {
			let now = OffsetDateTime::now_utc();
			let Some(payload) =
				queries::get_cached_result(&self.db, fingerprint.as_str(), now).await?
			else {
				return Ok(None);
			};

			Ok(Some(serde_json::from_value(payload)?))
		})
	}

	fn put<'a>(
		&'a self,
		fingerprint: &'a Fingerprint,
		result: &'a IndexerResult,
	) -> BoxFuture<'a, color_eyre::Result<Option<usize>>> {
		Box::pin(async move {
			let now = OffsetDateTime::now_utc();
			let payload: Value = serde_json::to_value(result)?;
			let stored = queries::put_cached_result(
				&self.db,
				fingerprint.as_str(),
				&payload,
				now,
				expires_at(now, self.result_ttl)?,
				self.max_payload_bytes,
			)
			.await?;

			Ok(stored)
		})
	}

	fn link_job<'a>(
		&'a self,
		job_id: &'a str,
		fingerprint: &'a Fingerprint,
	) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(async move {
			let now = OffsetDateTime::now_utc();

			let expiry = expires_at(now, self.job_link_ttl)?;

			queries::link_job(&self.db, job_id, fingerprint.as_str(), now, expiry).await?;

			Ok(())
		})
	}

	fn resolve_job<'a>(
		&'a self,
		job_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<Fingerprint>>> {
		Box::pin(async move {
			let now = OffsetDateTime::now_utc();
			let fingerprint = queries::resolve_job(&self.db, job_id, now).await?;

			Ok(fingerprint.map(Fingerprint::from_hex))
		})
	}
}

impl BookmarkStore for PgBackend {
	fn list_bookmarked_ids<'a>(
		&'a self,
		caller_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<String>>> {
		Box::pin(async move { Ok(queries::list_bookmarked_ids(&self.db, caller_id).await?) })
	}

	fn bookmark_status<'a>(
		&'a self,
		caller_id: &'a str,
		image_ids: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<HashSet<String>>> {
		Box::pin(async move { Ok(queries::bookmark_status(&self.db, caller_id, image_ids).await?) })
	}
}

impl CollectionStore for PgBackend {
	fn list_owned_collections<'a>(
		&'a self,
		caller_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<OwnedCollection>>> {
		Box::pin(async move { Ok(queries::list_owned_collections(&self.db, caller_id).await?) })
	}

	fn find_uploaded_image<'a>(
		&'a self,
		hash_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<UploadedImage>>> {
		Box::pin(async move { Ok(queries::find_uploaded_image(&self.db, hash_id).await?) })
	}
}

impl IndexerRpc for IndexerClient {
	fn submit<'a>(
		&'a self,
		query: &'a CompiledQuery,
	) -> BoxFuture<'a, vista_providers::Result<JobTicket>> {
		Box::pin(IndexerClient::submit(self, query))
	}

	fn poll_job<'a>(
		&'a self,
		job_id: &'a str,
	) -> BoxFuture<'a, vista_providers::Result<IndexerResult>> {
		Box::pin(IndexerClient::poll_job(self, job_id))
	}

	fn get_entry<'a>(
		&'a self,
		image_id: &'a str,
	) -> BoxFuture<'a, vista_providers::Result<Option<RawEntry>>> {
		Box::pin(IndexerClient::get_entry(self, image_id))
	}
}

impl ReferenceImageSource for MediaStore {
	fn read_private<'a>(
		&'a self,
		image_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<Vec<u8>>>> {
		Box::pin(async move { Ok(MediaStore::read_private(self, image_id).await?) })
	}

	fn read_public<'a>(
		&'a self,
		image_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<Vec<u8>>>> {
		Box::pin(async move { Ok(MediaStore::read_public(self, image_id).await?) })
	}
}
