pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Authentication is required for this request.")]
	NotAuthenticated,
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Indexer error: {message}")]
	Indexer { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<vista_providers::Error> for Error {
	fn from(err: vista_providers::Error) -> Self {
		Self::Indexer { message: err.to_string() }
	}
}
impl From<vista_storage::Error> for Error {
	fn from(err: vista_storage::Error) -> Self {
		match err {
			vista_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			other => Self::Storage { message: other.to_string() },
		}
	}
}
impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
