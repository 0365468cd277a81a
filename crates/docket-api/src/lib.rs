//! JSON row service for the docket portal.
//!
//! Exposes an axum [`Router`] backed by any [`DataService`], guarded by a
//! static service key. Endpoints under `/rows` mirror the trait
//! one-to-one; `GET /changes` streams the change feed as server-sent
//! events.

pub mod auth;
pub mod changes;
pub mod error;
pub mod notices;
pub mod profiles;
pub mod students;
pub mod submissions;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use docket_core::service::DataService;
use serde::Deserialize;

use auth::AuthConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` plus the
/// `DOCKET_` environment overlay.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:        String,
  pub port:        u16,
  pub store_path:  PathBuf,
  pub service_key: String,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: DataService> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the row service.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: DataService + Clone + 'static,
{
  Router::new()
    // Profiles
    .route(
      "/rows/profiles",
      get(profiles::list::<S>).put(profiles::upsert::<S>),
    )
    .route(
      "/rows/profiles/{roll}",
      get(profiles::get_one::<S>).delete(profiles::delete_one::<S>),
    )
    .route("/rows/profiles/{roll}/bind", post(profiles::bind::<S>))
    .route("/rows/profiles/{roll}/unbind", post(profiles::unbind::<S>))
    .route(
      "/rows/profiles/{roll}/suspended",
      put(profiles::set_suspended::<S>),
    )
    // Submissions
    .route(
      "/rows/submissions",
      get(submissions::list::<S>).post(submissions::create::<S>),
    )
    .route(
      "/rows/submissions/{id}/review",
      post(submissions::review::<S>),
    )
    // Notices
    .route(
      "/rows/notices",
      get(notices::list::<S>).post(notices::create::<S>),
    )
    .route("/rows/notices/{id}/read", post(notices::mark_read::<S>))
    // Managed roster
    .route(
      "/rows/students",
      get(students::list::<S>).put(students::put_one::<S>),
    )
    .route("/rows/students/{roll}", delete(students::remove::<S>))
    // Change feed
    .route("/changes", get(changes::feed::<S>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use docket_core::{
    profile::Profile,
    roll::RollNumber,
    service::DataService as _,
    submission::{Submission, SubmissionStatus},
  };
  use docket_store_sqlite::SqliteStore;
  use futures_util::StreamExt as _;
  use serde_json::json;
  use tower::ServiceExt as _;
  use uuid::Uuid;

  const KEY: &str = "test-service-key";

  fn roll(s: &str) -> RollNumber { RollNumber::parse(s).unwrap() }

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState {
      store: Arc::new(store),
      auth:  Arc::new(AuthConfig { service_key: KEY.to_string() }),
    }
  }

  async fn oneshot_json(
    state: AppState<SqliteStore>,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::AUTHORIZATION, format!("Bearer {KEY}"));
    let body = match body {
      Some(value) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(value.to_string())
      }
      None => Body::empty(),
    };
    let req = builder.body(body).unwrap();
    router(state).oneshot(req).await.unwrap()
  }

  async fn json_body<T: serde::de::DeserializeOwned>(
    resp: axum::response::Response,
  ) -> T {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn proposal(roll: &str, title: &str) -> serde_json::Value {
    json!({
      "roll_number": roll,
      "student_name": "Aisha Khan",
      "title": title,
      "description": "An offline attendance tracker for lab sessions",
      "technologies": ["Rust", "SQLite"],
      "team_members": ["Aisha Khan", "Burhan Shaikh"],
    })
  }

  // ── Auth ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn requests_without_the_key_are_rejected() {
    let state = make_state().await;
    let req = Request::builder()
      .method("GET")
      .uri("/rows/profiles")
      .body(Body::empty())
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let challenge = resp.headers().get(header::WWW_AUTHENTICATE).unwrap();
    assert_eq!(challenge.to_str().unwrap(), "Bearer");
  }

  // ── Profiles ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn upsert_then_get_returns_the_profile() {
    let state = make_state().await;
    let body = json!({
      "roll_number": "D234105",
      "student_name": "Aisha Khan",
      "department": "Computer",
    });
    let resp =
      oneshot_json(state.clone(), "PUT", "/rows/profiles", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp =
      oneshot_json(state, "GET", "/rows/profiles/D234105", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let profile: Profile = json_body(resp).await;
    assert_eq!(profile.roll_number, roll("D234105"));
    assert_eq!(profile.student_name.as_deref(), Some("Aisha Khan"));
  }

  #[tokio::test]
  async fn missing_profile_is_404() {
    let state = make_state().await;
    let resp = oneshot_json(state, "GET", "/rows/profiles/D234160", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn malformed_roll_in_the_path_is_400() {
    let state = make_state().await;
    let resp = oneshot_json(state, "GET", "/rows/profiles/X999", None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn second_device_gets_a_mismatch_not_an_error() {
    let state = make_state().await;
    let resp = oneshot_json(
      state.clone(),
      "POST",
      "/rows/profiles/D234105/bind",
      Some(json!({ "device_token": "device-a" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let outcome: serde_json::Value = json_body(resp).await;
    assert_eq!(outcome["outcome"], "bound");
    assert_eq!(outcome["newly_bound"], true);

    let resp = oneshot_json(
      state.clone(),
      "POST",
      "/rows/profiles/D234105/bind",
      Some(json!({ "device_token": "device-b" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let outcome: serde_json::Value = json_body(resp).await;
    assert_eq!(outcome["outcome"], "mismatch");

    // The stored binding survives the denied attempt.
    let resp =
      oneshot_json(state, "GET", "/rows/profiles/D234105", None).await;
    let profile: Profile = json_body(resp).await;
    assert_eq!(profile.device_token.unwrap().as_str(), "device-a");
  }

  #[tokio::test]
  async fn unbind_clears_the_stored_token() {
    let state = make_state().await;
    oneshot_json(
      state.clone(),
      "POST",
      "/rows/profiles/D234105/bind",
      Some(json!({ "device_token": "device-a" })),
    )
    .await;

    let resp = oneshot_json(
      state,
      "POST",
      "/rows/profiles/D234105/unbind",
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let profile: Profile = json_body(resp).await;
    assert!(profile.device_token.is_none());
  }

  #[tokio::test]
  async fn suspended_flag_round_trips() {
    let state = make_state().await;
    oneshot_json(
      state.clone(),
      "PUT",
      "/rows/profiles",
      Some(json!({ "roll_number": "D234105" })),
    )
    .await;

    let resp = oneshot_json(
      state,
      "PUT",
      "/rows/profiles/D234105/suspended",
      Some(json!({ "suspended": true })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let profile: Profile = json_body(resp).await;
    assert!(profile.suspended);
  }

  // ── Submissions ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn submitting_without_a_profile_is_404() {
    let state = make_state().await;
    let resp = oneshot_json(
      state,
      "POST",
      "/rows/submissions",
      Some(proposal("D234110", "Smart parking")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn invalid_submission_is_400() {
    let state = make_state().await;
    oneshot_json(
      state.clone(),
      "PUT",
      "/rows/profiles",
      Some(json!({ "roll_number": "D234105" })),
    )
    .await;

    let resp = oneshot_json(
      state,
      "POST",
      "/rows/submissions",
      Some(proposal("D234105", "   ")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn review_updates_status_and_filters_apply() {
    let state = make_state().await;
    oneshot_json(
      state.clone(),
      "PUT",
      "/rows/profiles",
      Some(json!({ "roll_number": "D234105" })),
    )
    .await;

    let resp = oneshot_json(
      state.clone(),
      "POST",
      "/rows/submissions",
      Some(proposal("D234105", "Smart parking")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let first: Submission = json_body(resp).await;
    assert_eq!(first.status, SubmissionStatus::Pending);

    oneshot_json(
      state.clone(),
      "POST",
      "/rows/submissions",
      Some(proposal("D234105", "Hostel mess feedback")),
    )
    .await;

    let resp = oneshot_json(
      state.clone(),
      "POST",
      &format!("/rows/submissions/{}/review", first.submission_id),
      Some(json!({ "status": "approved", "remarks": "Go ahead" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let reviewed: Submission = json_body(resp).await;
    assert_eq!(reviewed.status, SubmissionStatus::Approved);
    assert_eq!(reviewed.remarks.as_deref(), Some("Go ahead"));

    let resp = oneshot_json(
      state.clone(),
      "GET",
      "/rows/submissions?status=approved",
      None,
    )
    .await;
    let approved: Vec<Submission> = json_body(resp).await;
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].submission_id, first.submission_id);

    let resp = oneshot_json(
      state,
      "GET",
      "/rows/submissions?roll=D234105",
      None,
    )
    .await;
    let mine: Vec<Submission> = json_body(resp).await;
    assert_eq!(mine.len(), 2);
  }

  #[tokio::test]
  async fn reviewing_a_missing_submission_is_404() {
    let state = make_state().await;
    let resp = oneshot_json(
      state,
      "POST",
      &format!("/rows/submissions/{}/review", Uuid::new_v4()),
      Some(json!({ "status": "rejected" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Notices ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn student_notice_view_filters_by_scope() {
    let state = make_state().await;
    let admin = "husna.kazi@theemcoe.org";
    for scope in [
      json!({ "kind": "broadcast" }),
      json!({ "kind": "student", "roll": "D234105" }),
      json!({ "kind": "student", "roll": "D234106" }),
    ] {
      let resp = oneshot_json(
        state.clone(),
        "POST",
        "/rows/notices",
        Some(json!({
          "title": "Review schedule",
          "message": "Phase one reviews start Monday",
          "scope": scope,
          "posted_by": admin,
        })),
      )
      .await;
      assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = oneshot_json(
      state.clone(),
      "GET",
      "/rows/notices?roll=D234105",
      None,
    )
    .await;
    let visible: Vec<serde_json::Value> = json_body(resp).await;
    assert_eq!(visible.len(), 2);

    let resp = oneshot_json(state, "GET", "/rows/notices", None).await;
    let all: Vec<serde_json::Value> = json_body(resp).await;
    assert_eq!(all.len(), 3);
  }

  #[tokio::test]
  async fn marking_a_notice_read_round_trips() {
    let state = make_state().await;
    let resp = oneshot_json(
      state.clone(),
      "POST",
      "/rows/notices",
      Some(json!({
        "title": "Resubmit",
        "message": "Your abstract needs a cost estimate",
        "scope": { "kind": "student", "roll": "D234105" },
        "posted_by": "husna.kazi@theemcoe.org",
      })),
    )
    .await;
    let posted: serde_json::Value = json_body(resp).await;
    let id = posted["notice_id"].as_str().unwrap();

    let resp = oneshot_json(
      state,
      "POST",
      &format!("/rows/notices/{id}/read"),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let marked: serde_json::Value = json_body(resp).await;
    assert_eq!(marked["read"], true);
  }

  // ── Managed roster ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn roster_put_list_remove() {
    let state = make_state().await;
    let resp = oneshot_json(
      state.clone(),
      "PUT",
      "/rows/students",
      Some(json!({
        "roll_number": "D234105",
        "student_name": "Aisha Khan",
        "added_by": "husna.kazi@theemcoe.org",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = oneshot_json(state.clone(), "GET", "/rows/students", None).await;
    let roster: Vec<serde_json::Value> = json_body(resp).await;
    assert_eq!(roster.len(), 1);

    let resp = oneshot_json(
      state.clone(),
      "DELETE",
      "/rows/students/D234105",
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = oneshot_json(
      state,
      "DELETE",
      "/rows/students/D234105",
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Change feed ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn change_feed_streams_committed_writes() {
    let state = make_state().await;
    let resp = oneshot_json(state.clone(), "GET", "/changes", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers().get(header::CONTENT_TYPE).unwrap();
    assert!(
      content_type.to_str().unwrap().starts_with("text/event-stream"),
      "content type: {content_type:?}"
    );

    state
      .store
      .upsert_profile(docket_core::profile::ProfileUpdate::empty(roll(
        "D234105",
      )))
      .await
      .unwrap();

    let mut frames = resp.into_body().into_data_stream();
    let first = tokio::time::timeout(
      std::time::Duration::from_secs(1),
      frames.next(),
    )
    .await
    .expect("no SSE frame within 1s")
    .expect("feed closed")
    .unwrap();
    let text = String::from_utf8(first.to_vec()).unwrap();
    assert!(text.contains("event: profile"), "frame: {text}");
    assert!(text.contains("\"kind\":\"insert\""), "frame: {text}");
    assert!(text.contains("D234105"), "frame: {text}");
  }
}
