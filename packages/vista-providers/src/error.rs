use reqwest::StatusCode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Connect failures, timeouts, and gateway statuses. Worth retrying.
	#[error("Indexer is unavailable: {message}")]
	Unavailable { message: String },
	/// The polled job has not finished yet.
	#[error("Search job is still running.")]
	StillRunning,
	#[error("Indexer rejected the request with status {status}: {message}")]
	Rejected { status: u16, message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
}
impl Error {
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::Unavailable { .. })
	}

	/// Classifies a non-success HTTP status.
	pub fn from_status(status: StatusCode, body: String) -> Self {
		match status {
			StatusCode::PRECONDITION_FAILED => Self::StillRunning,
			StatusCode::BAD_GATEWAY
			| StatusCode::SERVICE_UNAVAILABLE
			| StatusCode::GATEWAY_TIMEOUT => Self::Unavailable {
				message: format!("status {status}"),
			},
			_ => Self::Rejected { status: status.as_u16(), message: body },
		}
	}
}
impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		if err.is_decode() {
			return Self::InvalidResponse {
				message: format!("Failed to decode indexer response: {err}."),
			};
		}
		if let Some(status) = err.status() {
			return Self::from_status(status, err.to_string());
		}
		if err.is_builder() {
			return Self::InvalidConfig { message: err.to_string() };
		}

		Self::Unavailable { message: err.to_string() }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn statuses_are_classified() {
		assert!(matches!(
			Error::from_status(StatusCode::PRECONDITION_FAILED, String::new()),
			Error::StillRunning
		));
		assert!(Error::from_status(StatusCode::SERVICE_UNAVAILABLE, String::new()).is_transient());
		assert!(Error::from_status(StatusCode::GATEWAY_TIMEOUT, String::new()).is_transient());

		let rejected = Error::from_status(StatusCode::BAD_REQUEST, "bad term".to_string());

		assert!(!rejected.is_transient());
		assert!(matches!(rejected, Error::Rejected { status: 400, .. }));
		assert!(!Error::StillRunning.is_transient());
	}
}
