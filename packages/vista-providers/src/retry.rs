use std::{future::Future, time::Duration};

use tokio::time;

use crate::{Error, Result};

/// Bounded exponential backoff for transient indexer failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	pub max_attempts: u32,
	pub initial_backoff: Duration,
	pub max_backoff: Duration,
}
impl RetryPolicy {
	/// Sleep before retrying after `attempt` failed, counting from 1.
	pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
		let exp = attempt.saturating_sub(1).min(16);

		self.initial_backoff.saturating_mul(1 << exp).min(self.max_backoff)
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self::from(&vista_config::IndexerRetry::default())
	}
}
impl From<&vista_config::IndexerRetry> for RetryPolicy {
	fn from(cfg: &vista_config::IndexerRetry) -> Self {
		Self {
			max_attempts: cfg.max_attempts.max(1),
			initial_backoff: Duration::from_millis(cfg.initial_backoff_ms),
			max_backoff: Duration::from_millis(cfg.max_backoff_ms),
		}
	}
}

/// Runs `call` until it succeeds, fails with a non-transient error, or runs out of attempts.
///
/// Exhaustion returns the last transient error.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, operation: &'static str, mut call: F) -> Result<T>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let mut attempt = 1;

	loop {
		let err: Error = match call().await {
			Ok(value) => return Ok(value),
			Err(err) => err,
		};

		if !err.is_transient() || attempt >= policy.max_attempts {
			return Err(err);
		}

		let backoff = policy.backoff_for_attempt(attempt);

		tracing::warn!(
			operation,
			attempt,
			backoff_ms = backoff.as_millis() as u64,
			error = %err,
			"Indexer call failed. Retrying."
		);

		time::sleep(backoff).await;

		attempt += 1;
	}
}
