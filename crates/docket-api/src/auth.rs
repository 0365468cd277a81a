//! Bearer service-key extractor.
//!
//! The row service is machine-to-machine: every caller holds the one
//! deployment-wide service key. Students and admins are authenticated by
//! the session layer on the client side, never by HTTP credentials.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use docket_core::service::DataService;

use crate::{AppState, error::ApiError};

/// The key accepted as valid for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub service_key: String,
}

/// Zero-size marker: present in the handler means the request carried the
/// service key.
pub struct Authenticated;

/// Verify the `Authorization: Bearer <key>` header directly.
pub fn verify_auth(
  headers: &HeaderMap,
  config: &AuthConfig,
) -> Result<(), ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let key = header_val
    .strip_prefix("Bearer ")
    .ok_or(ApiError::Unauthorized)?;

  if key != config.service_key {
    return Err(ApiError::Unauthorized);
  }

  Ok(())
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: DataService + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_auth(&parts.headers, &state.auth)?;
    Ok(Authenticated)
  }
}
