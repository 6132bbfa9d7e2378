//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use herd_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] CoreError),

  #[error("bad request: {0}")]
  BadRequest(String),
}

impl ApiError {
  fn status(&self) -> StatusCode {
    let ApiError::Core(e) = self else {
      return StatusCode::BAD_REQUEST;
    };
    match e {
      e if e.is_not_found() => StatusCode::NOT_FOUND,
      CoreError::DuplicateTag(_)
      | CoreError::PartialEligibility { .. }
      | CoreError::EstablishmentNotEmpty(_) => StatusCode::CONFLICT,
      e if e.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
      CoreError::NoEligibleTargets(_) => StatusCode::UNPROCESSABLE_ENTITY,
      CoreError::ConfirmationRequired(_) => StatusCode::PRECONDITION_REQUIRED,
      CoreError::UnknownEventType(_) => StatusCode::BAD_REQUEST,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(error = %self, "request failed");
    }
    let body = match &self {
      ApiError::Core(CoreError::PartialEligibility { eligible, excluded }) => json!({
        "error": self.to_string(),
        "eligible": eligible,
        "excluded": excluded,
      }),
      _ => json!({ "error": self.to_string() }),
    };
    (status, Json(body)).into_response()
  }
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;
