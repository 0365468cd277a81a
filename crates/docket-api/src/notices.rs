//! Handlers for `/rows/notices` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/rows/notices` | Optional `roll` → that student's view |
//! | `POST` | `/rows/notices` | Body: [`NewNotice`]; returns 201 + stored row |
//! | `POST` | `/rows/notices/:id/read` | Mark read |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use docket_core::{
  notice::{NewNotice, Notice},
  roll::RollNumber,
  service::DataService,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// If set, return the student view: every broadcast plus the rows
  /// addressed to this roll number. Otherwise every notice (admin view).
  pub roll: Option<RollNumber>,
}

/// `GET /rows/notices[?roll=D234105]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Notice>>, ApiError>
where
  S: DataService + Clone + 'static,
{
  let rows = match params.roll {
    Some(roll) => state.store.notices_for(roll).await,
    None => state.store.list_notices().await,
  }
  .map_err(ApiError::from_service)?;
  Ok(Json(rows))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /rows/notices` — post a broadcast or targeted notice; returns
/// 201 + the stored row.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Json(body): Json<NewNotice>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DataService + Clone + 'static,
{
  let stored = state
    .store
    .post_notice(body)
    .await
    .map_err(ApiError::from_service)?;
  Ok((StatusCode::CREATED, Json(stored)))
}

// ─── Mark read ────────────────────────────────────────────────────────────────

/// `POST /rows/notices/:id/read`
pub async fn mark_read<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Notice>, ApiError>
where
  S: DataService + Clone + 'static,
{
  let notice = state
    .store
    .mark_notice_read(id)
    .await
    .map_err(ApiError::from_service)?;
  Ok(Json(notice))
}
