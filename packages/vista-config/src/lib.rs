mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Indexer, IndexerRetry, Media, Postgres, Search, SearchCache, Security, Service, Storage,
};

use std::{fs, path::Path};

/// Upper bound for cache TTLs: ten years.
pub const MAX_CACHE_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	for (label, value) in [
		("storage.media.media_url", &cfg.storage.media.media_url),
		("storage.media.upload_url", &cfg.storage.media.upload_url),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.indexer.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "indexer.api_base must be non-empty.".to_string(),
		});
	}
	if cfg.indexer.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "indexer.timeout_ms must be greater than zero.".to_string(),
		});
	}

	let retry = &cfg.indexer.retry;

	if retry.max_attempts == 0 {
		return Err(Error::Validation {
			message: "indexer.retry.max_attempts must be greater than zero.".to_string(),
		});
	}
	if retry.initial_backoff_ms == 0 {
		return Err(Error::Validation {
			message: "indexer.retry.initial_backoff_ms must be greater than zero.".to_string(),
		});
	}
	if retry.max_backoff_ms < retry.initial_backoff_ms {
		return Err(Error::Validation {
			message: "indexer.retry.max_backoff_ms must be at least indexer.retry.initial_backoff_ms."
				.to_string(),
		});
	}

	for (key, value) in &cfg.indexer.default_headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!("indexer.default_headers.{key} must be a string."),
			});
		}
	}

	if cfg.search.default_plugin.trim().is_empty() {
		return Err(Error::Validation {
			message: "search.default_plugin must be non-empty.".to_string(),
		});
	}
	if cfg.search.aggregate_size == 0 {
		return Err(Error::Validation {
			message: "search.aggregate_size must be greater than zero.".to_string(),
		});
	}
	if cfg.search.cache.enabled {
		if cfg.search.cache.result_ttl_secs <= 0 {
			return Err(Error::Validation {
				message: "search.cache.result_ttl_secs must be greater than zero.".to_string(),
			});
		}
		if cfg.search.cache.job_link_ttl_secs <= 0 {
			return Err(Error::Validation {
				message: "search.cache.job_link_ttl_secs must be greater than zero.".to_string(),
			});
		}
	}

	for (label, ttl) in [
		("search.cache.result_ttl_secs", cfg.search.cache.result_ttl_secs),
		("search.cache.job_link_ttl_secs", cfg.search.cache.job_link_ttl_secs),
	] {
		if ttl > MAX_CACHE_TTL_SECS {
			return Err(Error::Validation {
				message: format!("{label} must be at most {MAX_CACHE_TTL_SECS}."),
			});
		}
	}

	if let Some(max) = cfg.search.cache.max_payload_bytes
		&& max == 0
	{
		return Err(Error::Validation {
			message: "search.cache.max_payload_bytes must be greater than zero.".to_string(),
		});
	}

	let header = cfg.security.caller_header.as_str();

	if header.is_empty()
		|| !header.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
	{
		return Err(Error::Validation {
			message: "security.caller_header must be a valid HTTP header name.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.service.log_level = cfg.service.log_level.trim().to_string();
	cfg.indexer.api_base = cfg.indexer.api_base.trim().trim_end_matches('/').to_string();
	cfg.security.caller_header = cfg.security.caller_header.trim().to_ascii_lowercase();

	for url in [&mut cfg.storage.media.media_url, &mut cfg.storage.media.upload_url] {
		*url = url.trim().to_string();

		if !url.is_empty() && !url.ends_with('/') {
			url.push('/');
		}
	}
}
