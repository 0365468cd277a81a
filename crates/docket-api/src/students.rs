//! Handlers for `/rows/students` (managed roster) endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/rows/students` | Whole roster |
//! | `PUT`    | `/rows/students` | Body: [`NewManagedStudent`]; add or overwrite |
//! | `DELETE` | `/rows/students/:roll` | Remove a roster entry |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use docket_core::{
  roll::RollNumber,
  service::DataService,
  student::{ManagedStudent, NewManagedStudent},
};

use crate::{AppState, auth::Authenticated, error::ApiError};

/// `GET /rows/students`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
) -> Result<Json<Vec<ManagedStudent>>, ApiError>
where
  S: DataService + Clone + 'static,
{
  let roster = state
    .store
    .list_managed_students()
    .await
    .map_err(ApiError::from_service)?;
  Ok(Json(roster))
}

/// `PUT /rows/students` — add a roster entry, or overwrite the entry with
/// the same roll number.
pub async fn put_one<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Json(body): Json<NewManagedStudent>,
) -> Result<Json<ManagedStudent>, ApiError>
where
  S: DataService + Clone + 'static,
{
  let entry = state
    .store
    .put_managed_student(body)
    .await
    .map_err(ApiError::from_service)?;
  Ok(Json(entry))
}

/// `DELETE /rows/students/:roll`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(roll): Path<RollNumber>,
) -> Result<StatusCode, ApiError>
where
  S: DataService + Clone + 'static,
{
  state
    .store
    .remove_managed_student(roll)
    .await
    .map_err(ApiError::from_service)?;
  Ok(StatusCode::NO_CONTENT)
}
