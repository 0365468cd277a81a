//! Handlers for `/rows/submissions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/rows/submissions` | Optional `roll` or `status` filter |
//! | `POST` | `/rows/submissions` | Body: [`NewSubmission`]; returns 201 + stored row |
//! | `POST` | `/rows/submissions/:id/review` | Body: [`ReviewBody`] |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use docket_core::{
  roll::RollNumber,
  service::DataService,
  submission::{NewSubmission, Submission, SubmissionStatus},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Restrict to one student's submissions.
  pub roll:   Option<RollNumber>,
  /// Restrict to one review status. Ignored when `roll` is given.
  pub status: Option<SubmissionStatus>,
}

/// `GET /rows/submissions[?roll=D234105][?status=pending]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Submission>>, ApiError>
where
  S: DataService + Clone + 'static,
{
  let rows = match params.roll {
    Some(roll) => state.store.submissions_for(roll).await,
    None => state.store.list_submissions(params.status).await,
  }
  .map_err(ApiError::from_service)?;
  Ok(Json(rows))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /rows/submissions` — validate and store a proposal with `Pending`
/// status; returns 201 + the stored row.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Json(body): Json<NewSubmission>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DataService + Clone + 'static,
{
  let stored = state
    .store
    .submit(body)
    .await
    .map_err(ApiError::from_service)?;
  Ok((StatusCode::CREATED, Json(stored)))
}

// ─── Review ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /rows/submissions/:id/review`.
#[derive(Debug, Deserialize)]
pub struct ReviewBody {
  pub status:  SubmissionStatus,
  pub remarks: Option<String>,
}

/// `POST /rows/submissions/:id/review` — record the admin decision. A
/// later review overwrites an earlier one.
pub async fn review<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<ReviewBody>,
) -> Result<Json<Submission>, ApiError>
where
  S: DataService + Clone + 'static,
{
  let reviewed = state
    .store
    .review_submission(id, body.status, body.remarks)
    .await
    .map_err(ApiError::from_service)?;
  Ok(Json(reviewed))
}
