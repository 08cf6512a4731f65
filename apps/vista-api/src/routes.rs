use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use vista_domain::{SearchRequest, result::EntryDetail};
use vista_service::{CallerContext, Error as ServiceError, GetRequest, SearchOutcome};

/// Every request body wraps its payload in `{"params": ...}`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
	pub params: T,
}

#[derive(Debug, Serialize)]
pub struct GetResponse {
	pub entry: EntryDetail,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/search", post(search))
		.route("/v1/get", post(get_entry))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	headers: HeaderMap,
	payload: Result<Json<Envelope<SearchRequest>>, JsonRejection>,
) -> Result<Response, ApiError> {
	let Json(envelope) = payload?;
	let caller = resolve_caller(&state, &headers).await?;
	let outcome = state.service.search(&envelope.params, &caller).await?;
	let status = match outcome {
		SearchOutcome::Failed { .. } => StatusCode::BAD_GATEWAY,
		_ => StatusCode::OK,
	};

	Ok((status, Json(outcome)).into_response())
}

async fn get_entry(
	State(state): State<AppState>,
	payload: Result<Json<Envelope<GetRequest>>, JsonRejection>,
) -> Result<Json<GetResponse>, ApiError> {
	let Json(envelope) = payload?;
	let entry = state.service.get(&envelope.params).await?;

	Ok(Json(GetResponse { entry }))
}

async fn resolve_caller(state: &AppState, headers: &HeaderMap) -> Result<CallerContext, ApiError> {
	let header = state.service.cfg.security.caller_header.as_str();
	let caller_id = headers.get(header).and_then(|value| value.to_str().ok());

	Ok(state.service.resolve_caller(caller_id).await?)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
		Self { status, error_code, message: message.into() }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let message = err.to_string();

		match err {
			ServiceError::NotAuthenticated =>
				Self::new(StatusCode::UNAUTHORIZED, "not_authenticated", message),
			ServiceError::InvalidRequest { .. } =>
				Self::new(StatusCode::BAD_REQUEST, "invalid_request", message),
			ServiceError::NotFound { .. } =>
				Self::new(StatusCode::NOT_FOUND, "unknown_resource", message),
			ServiceError::Indexer { .. } =>
				Self::new(StatusCode::BAD_GATEWAY, "indexer_unavailable", message),
			ServiceError::Storage { .. } => {
				tracing::error!(error = %message, "Request failed on storage.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", message)
			},
		}
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		Self::new(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text())
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code.to_string(), message: self.message };

		(self.status, Json(body)).into_response()
	}
}
