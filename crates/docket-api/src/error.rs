//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Wrap a data-service failure, keeping its meaning over the wire.
  ///
  /// Domain errors may sit anywhere in the source chain (the SQLite store
  /// wraps them in its own error type), so this walks the chain looking
  /// for one: missing rows map to 404, rejected input to 400, everything
  /// else to 500.
  pub fn from_service<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    match classify(&err) {
      Some(mapped) => mapped,
      None => ApiError::Store(Box::new(err)),
    }
  }
}

fn classify(err: &(dyn std::error::Error + 'static)) -> Option<ApiError> {
  let mut cursor = Some(err);
  while let Some(e) = cursor {
    if let Some(core) = e.downcast_ref::<docket_core::Error>() {
      use docket_core::Error as Core;
      return match core {
        Core::ProfileNotFound(_)
        | Core::SubmissionNotFound(_)
        | Core::NoticeNotFound(_)
        | Core::NotOnRoster(_) => Some(ApiError::NotFound(core.to_string())),
        Core::Roll(_)
        | Core::MissingField(_)
        | Core::EmptyTeam
        | Core::DisallowedWord { .. } => {
          Some(ApiError::BadRequest(core.to_string()))
        }
        Core::Serialization(_) => None,
      };
    }
    cursor = e.source();
  }
  None
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => {
        (StatusCode::UNAUTHORIZED, "unauthorized".to_string())
      }
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if matches!(self, ApiError::Unauthorized) {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    res
  }
}
