//! Handlers for `/rows/profiles` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/rows/profiles` | Optional `from`/`to` roll range |
//! | `PUT`    | `/rows/profiles` | Body: [`ProfileUpdate`]; creates or updates |
//! | `GET`    | `/rows/profiles/:roll` | Single profile |
//! | `DELETE` | `/rows/profiles/:roll` | Cascades to the student's rows |
//! | `POST`   | `/rows/profiles/:roll/bind` | Body: [`BindBody`]; returns [`BindOutcome`] |
//! | `POST`   | `/rows/profiles/:roll/unbind` | Admin device reset |
//! | `PUT`    | `/rows/profiles/:roll/suspended` | Body: `{"suspended":true}` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use docket_core::{
  profile::{BindOutcome, DeviceToken, Profile, ProfileUpdate},
  roll::{RollNumber, RollRange},
  service::DataService,
};
use serde::Deserialize;

use crate::{AppState, auth::Authenticated, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Lower bound of an inclusive roll-number range filter.
  pub from: Option<RollNumber>,
  /// Upper bound; must be given together with `from`.
  pub to:   Option<RollNumber>,
}

/// `GET /rows/profiles[?from=D234101&to=D234120]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Profile>>, ApiError>
where
  S: DataService + Clone + 'static,
{
  let range = match (params.from, params.to) {
    (Some(from), Some(to)) => Some(RollRange { from, to }),
    (None, None) => None,
    _ => {
      return Err(ApiError::BadRequest(
        "from and to must be given together".to_string(),
      ));
    }
  };
  let profiles = state
    .store
    .list_profiles(range)
    .await
    .map_err(ApiError::from_service)?;
  Ok(Json(profiles))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /rows/profiles/:roll`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(roll): Path<RollNumber>,
) -> Result<Json<Profile>, ApiError>
where
  S: DataService + Clone + 'static,
{
  let profile = state
    .store
    .get_profile(roll)
    .await
    .map_err(ApiError::from_service)?
    .ok_or_else(|| ApiError::NotFound(format!("no profile for {roll}")))?;
  Ok(Json(profile))
}

// ─── Upsert ───────────────────────────────────────────────────────────────────

/// `PUT /rows/profiles` — create the row or update its editable fields,
/// as one atomic step. Returns the stored profile.
pub async fn upsert<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Json(body): Json<ProfileUpdate>,
) -> Result<Json<Profile>, ApiError>
where
  S: DataService + Clone + 'static,
{
  let profile = state
    .store
    .upsert_profile(body)
    .await
    .map_err(ApiError::from_service)?;
  Ok(Json(profile))
}

// ─── Device binding ───────────────────────────────────────────────────────────

/// JSON body accepted by `POST /rows/profiles/:roll/bind`.
#[derive(Debug, Deserialize)]
pub struct BindBody {
  pub device_token: DeviceToken,
  pub seen_from:    Option<String>,
}

/// `POST /rows/profiles/:roll/bind` — atomic create-or-bind device check.
///
/// Always 200: a denied device is a regular answer carried in the
/// [`BindOutcome`], not a transport failure.
pub async fn bind<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(roll): Path<RollNumber>,
  Json(body): Json<BindBody>,
) -> Result<Json<BindOutcome>, ApiError>
where
  S: DataService + Clone + 'static,
{
  let outcome = state
    .store
    .bind_device(roll, body.device_token, body.seen_from)
    .await
    .map_err(ApiError::from_service)?;
  Ok(Json(outcome))
}

/// `POST /rows/profiles/:roll/unbind` — clear the stored device binding so
/// the next login re-binds.
pub async fn unbind<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(roll): Path<RollNumber>,
) -> Result<Json<Profile>, ApiError>
where
  S: DataService + Clone + 'static,
{
  let profile = state
    .store
    .unbind_device(roll)
    .await
    .map_err(ApiError::from_service)?;
  Ok(Json(profile))
}

// ─── Suspension ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SuspendBody {
  pub suspended: bool,
}

/// `PUT /rows/profiles/:roll/suspended`
pub async fn set_suspended<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(roll): Path<RollNumber>,
  Json(body): Json<SuspendBody>,
) -> Result<Json<Profile>, ApiError>
where
  S: DataService + Clone + 'static,
{
  let profile = state
    .store
    .set_suspended(roll, body.suspended)
    .await
    .map_err(ApiError::from_service)?;
  Ok(Json(profile))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /rows/profiles/:roll` — delete the profile and everything
/// hanging off it.
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(roll): Path<RollNumber>,
) -> Result<StatusCode, ApiError>
where
  S: DataService + Clone + 'static,
{
  state
    .store
    .delete_profile(roll)
    .await
    .map_err(ApiError::from_service)?;
  Ok(StatusCode::NO_CONTENT)
}
