use std::collections::HashSet;

use serde_json::Value;
use time::OffsetDateTime;

use crate::{
	Result,
	db::Db,
	models::{OwnedCollection, UploadedImage},
};

/// Returns the cached payload when present and not expired, bumping its hit counter.
pub async fn get_cached_result(
	db: &Db,
	fingerprint: &str,
	now: OffsetDateTime,
) -> Result<Option<Value>> {
	let payload: Option<Value> = sqlx::query_scalar(
		"\
UPDATE search_result_cache
SET last_accessed_at = $2, hit_count = hit_count + 1
WHERE fingerprint = $1 AND expires_at > $2
RETURNING payload",
	)
	.bind(fingerprint)
	.bind(now)
	.fetch_optional(&db.pool)
	.await?;

	Ok(payload)
}

/// Upserts a cached payload. Returns the stored size, or `None` when the payload exceeds the limit.
pub async fn put_cached_result(
	db: &Db,
	fingerprint: &str,
	payload: &Value,
	now: OffsetDateTime,
	expires_at: OffsetDateTime,
	max_payload_bytes: Option<u64>,
) -> Result<Option<usize>> {
	let payload_size = serde_json::to_vec(payload)?.len();

	if let Some(max) = max_payload_bytes
		&& payload_size as u64 > max
	{
		return Ok(None);
	}

	sqlx::query(
		"\
INSERT INTO search_result_cache (
	fingerprint,
	payload,
	created_at,
	last_accessed_at,
	expires_at,
	hit_count
)
VALUES ($1, $2, $3, $3, $4, 0)
ON CONFLICT (fingerprint) DO UPDATE
SET
	payload = EXCLUDED.payload,
	last_accessed_at = EXCLUDED.last_accessed_at,
	expires_at = EXCLUDED.expires_at,
	hit_count = 0",
	)
	.bind(fingerprint)
	.bind(payload)
	.bind(now)
	.bind(expires_at)
	.execute(&db.pool)
	.await?;

	Ok(Some(payload_size))
}

pub async fn link_job(
	db: &Db,
	job_id: &str,
	fingerprint: &str,
	now: OffsetDateTime,
	expires_at: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO search_job_links (job_id, fingerprint, created_at, expires_at)
VALUES ($1, $2, $3, $4)
ON CONFLICT (job_id) DO UPDATE
SET fingerprint = EXCLUDED.fingerprint, expires_at = EXCLUDED.expires_at",
	)
	.bind(job_id)
	.bind(fingerprint)
	.bind(now)
	.bind(expires_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn resolve_job(db: &Db, job_id: &str, now: OffsetDateTime) -> Result<Option<String>> {
	let fingerprint: Option<String> = sqlx::query_scalar(
		"SELECT fingerprint FROM search_job_links WHERE job_id = $1 AND expires_at > $2",
	)
	.bind(job_id)
	.bind(now)
	.fetch_optional(&db.pool)
	.await?;

	Ok(fingerprint)
}

/// Deletes expired cache rows and job links. Returns the number of rows removed.
pub async fn purge_expired(db: &Db, now: OffsetDateTime) -> Result<u64> {
	let mut tx = db.pool.begin().await?;
	let cache = sqlx::query("DELETE FROM search_result_cache WHERE expires_at <= $1")
		.bind(now)
		.execute(&mut *tx)
		.await?;
	let links = sqlx::query("DELETE FROM search_job_links WHERE expires_at <= $1")
		.bind(now)
		.execute(&mut *tx)
		.await?;

	tx.commit().await?;

	Ok(cache.rows_affected() + links.rows_affected())
}

pub async fn list_bookmarked_ids(db: &Db, owner_id: &str) -> Result<Vec<String>> {
	let ids: Vec<String> = sqlx::query_scalar(
		"SELECT image_id FROM bookmarks WHERE owner_id = $1 ORDER BY created_at, image_id",
	)
	.bind(owner_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(ids)
}

/// Subset of `image_ids` bookmarked by `owner_id`, in one round trip.
pub async fn bookmark_status(
	db: &Db,
	owner_id: &str,
	image_ids: &[String],
) -> Result<HashSet<String>> {
	if image_ids.is_empty() {
		return Ok(HashSet::new());
	}

	let ids: Vec<String> = sqlx::query_scalar(
		"SELECT image_id FROM bookmarks WHERE owner_id = $1 AND image_id = ANY($2)",
	)
	.bind(owner_id)
	.bind(image_ids)
	.fetch_all(&db.pool)
	.await?;

	Ok(ids.into_iter().collect())
}

pub async fn list_owned_collections(db: &Db, owner_id: &str) -> Result<Vec<OwnedCollection>> {
	let rows: Vec<OwnedCollection> = sqlx::query_as(
		"\
SELECT c.hash_id, c.name, count(ci.hash_id) AS image_count
FROM collections c
LEFT JOIN collection_images ci ON ci.collection_id = c.collection_id
WHERE c.owner_id = $1
GROUP BY c.collection_id, c.hash_id, c.name, c.created_at
ORDER BY c.created_at, c.hash_id",
	)
	.bind(owner_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn find_uploaded_image(db: &Db, hash_id: &str) -> Result<Option<UploadedImage>> {
	let row: Option<UploadedImage> = sqlx::query_as(
		"SELECT hash_id, name, owner_id, created_at FROM uploaded_images WHERE hash_id = $1",
	)
	.bind(hash_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(row)
}
