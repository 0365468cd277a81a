//! HTTP implementation of [`DataService`] against the docket row service.
//!
//! [`ServiceClient`] speaks the JSON API one-to-one, so portal code
//! written against the trait runs unchanged over the wire. The change
//! feed is consumed from `GET /changes` by a background task and
//! republished locally; [`subscribe`](DataService::subscribe) hands out
//! receivers on that local feed.

mod error;
mod feed;
pub mod sse;

pub use error::{Error, Result};

use std::{sync::Arc, time::Duration};

use docket_core::{
  notice::{NewNotice, Notice},
  profile::{BindOutcome, DeviceToken, Profile, ProfileUpdate},
  roll::{RollNumber, RollRange},
  service::{CHANGE_BUFFER, ChangeEvent, ChangeStream, DataService},
  student::{ManagedStudent, NewManagedStudent},
  submission::{NewSubmission, Submission, SubmissionStatus},
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use uuid::Uuid;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Connection settings for the row service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
  pub base_url:    String,
  pub service_key: String,
}

// ─── Client ───────────────────────────────────────────────────────────────────

/// Async HTTP implementation of [`DataService`].
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based and all
/// clones share one change-feed task, which stops when the last clone is
/// dropped.
#[derive(Clone)]
pub struct ServiceClient {
  client:  Client,
  config:  ClientConfig,
  changes: broadcast::Sender<ChangeEvent>,
  _feed:   Arc<FeedGuard>,
}

/// Aborts the feed task when the last client clone goes away.
struct FeedGuard(tokio::task::JoinHandle<()>);

impl Drop for FeedGuard {
  fn drop(&mut self) { self.0.abort(); }
}

impl ServiceClient {
  /// Build a client and start its background change-feed task.
  ///
  /// Must be called from within a tokio runtime.
  pub fn connect(config: ClientConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;

    let (changes, _) = broadcast::channel(CHANGE_BUFFER);
    let feed = tokio::spawn(feed::run(config.clone(), changes.clone()));

    Ok(Self {
      client,
      config,
      changes,
      _feed: Arc::new(FeedGuard(feed)),
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{path}", self.config.base_url.trim_end_matches('/'))
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    self
      .client
      .request(method, self.url(path))
      .bearer_auth(&self.config.service_key)
  }
}

/// Convert a non-success response into [`Error::Api`], keeping the
/// server's message when the body carries one.
async fn check(resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }

  #[derive(Deserialize)]
  struct ErrorBody {
    error: String,
  }

  let message = match resp.json::<ErrorBody>().await {
    Ok(body) => body.error,
    Err(_) => status.to_string(),
  };
  Err(Error::Api { status, message })
}

// ─── DataService impl ─────────────────────────────────────────────────────────

impl DataService for ServiceClient {
  type Error = Error;

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn get_profile(&self, roll: RollNumber) -> Result<Option<Profile>> {
    let resp = self
      .request(Method::GET, &format!("/rows/profiles/{roll}"))
      .send()
      .await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    Ok(Some(check(resp).await?.json().await?))
  }

  async fn list_profiles(
    &self,
    range: Option<RollRange>,
  ) -> Result<Vec<Profile>> {
    let mut req = self.request(Method::GET, "/rows/profiles");
    if let Some(range) = range {
      req = req.query(&[
        ("from", range.from.to_string()),
        ("to", range.to.to_string()),
      ]);
    }
    let resp = check(req.send().await?).await?;
    Ok(resp.json().await?)
  }

  async fn upsert_profile(&self, update: ProfileUpdate) -> Result<Profile> {
    let resp = self
      .request(Method::PUT, "/rows/profiles")
      .json(&update)
      .send()
      .await?;
    Ok(check(resp).await?.json().await?)
  }

  async fn bind_device(
    &self,
    roll: RollNumber,
    device: DeviceToken,
    seen_from: Option<String>,
  ) -> Result<BindOutcome> {
    let resp = self
      .request(Method::POST, &format!("/rows/profiles/{roll}/bind"))
      .json(&json!({ "device_token": device, "seen_from": seen_from }))
      .send()
      .await?;
    Ok(check(resp).await?.json().await?)
  }

  async fn unbind_device(&self, roll: RollNumber) -> Result<Profile> {
    let resp = self
      .request(Method::POST, &format!("/rows/profiles/{roll}/unbind"))
      .send()
      .await?;
    Ok(check(resp).await?.json().await?)
  }

  async fn set_suspended(
    &self,
    roll: RollNumber,
    suspended: bool,
  ) -> Result<Profile> {
    let resp = self
      .request(Method::PUT, &format!("/rows/profiles/{roll}/suspended"))
      .json(&json!({ "suspended": suspended }))
      .send()
      .await?;
    Ok(check(resp).await?.json().await?)
  }

  async fn delete_profile(&self, roll: RollNumber) -> Result<()> {
    let resp = self
      .request(Method::DELETE, &format!("/rows/profiles/{roll}"))
      .send()
      .await?;
    check(resp).await?;
    Ok(())
  }

  // ── Submissions ───────────────────────────────────────────────────────────

  async fn submit(&self, input: NewSubmission) -> Result<Submission> {
    // Reject unusable input before it crosses the wire.
    input.validate()?;
    let resp = self
      .request(Method::POST, "/rows/submissions")
      .json(&input)
      .send()
      .await?;
    Ok(check(resp).await?.json().await?)
  }

  async fn submissions_for(
    &self,
    roll: RollNumber,
  ) -> Result<Vec<Submission>> {
    let resp = self
      .request(Method::GET, "/rows/submissions")
      .query(&[("roll", roll.to_string())])
      .send()
      .await?;
    Ok(check(resp).await?.json().await?)
  }

  async fn list_submissions(
    &self,
    status: Option<SubmissionStatus>,
  ) -> Result<Vec<Submission>> {
    let mut req = self.request(Method::GET, "/rows/submissions");
    if let Some(status) = status {
      req = req.query(&[("status", status.as_str())]);
    }
    let resp = check(req.send().await?).await?;
    Ok(resp.json().await?)
  }

  async fn review_submission(
    &self,
    id: Uuid,
    status: SubmissionStatus,
    remarks: Option<String>,
  ) -> Result<Submission> {
    let resp = self
      .request(Method::POST, &format!("/rows/submissions/{id}/review"))
      .json(&json!({ "status": status, "remarks": remarks }))
      .send()
      .await?;
    Ok(check(resp).await?.json().await?)
  }

  // ── Notices ───────────────────────────────────────────────────────────────

  async fn post_notice(&self, input: NewNotice) -> Result<Notice> {
    input.validate()?;
    let resp = self
      .request(Method::POST, "/rows/notices")
      .json(&input)
      .send()
      .await?;
    Ok(check(resp).await?.json().await?)
  }

  async fn notices_for(&self, roll: RollNumber) -> Result<Vec<Notice>> {
    let resp = self
      .request(Method::GET, "/rows/notices")
      .query(&[("roll", roll.to_string())])
      .send()
      .await?;
    Ok(check(resp).await?.json().await?)
  }

  async fn list_notices(&self) -> Result<Vec<Notice>> {
    let resp = self.request(Method::GET, "/rows/notices").send().await?;
    Ok(check(resp).await?.json().await?)
  }

  async fn mark_notice_read(&self, id: Uuid) -> Result<Notice> {
    let resp = self
      .request(Method::POST, &format!("/rows/notices/{id}/read"))
      .send()
      .await?;
    Ok(check(resp).await?.json().await?)
  }

  // ── Managed roster ────────────────────────────────────────────────────────

  async fn put_managed_student(
    &self,
    input: NewManagedStudent,
  ) -> Result<ManagedStudent> {
    let resp = self
      .request(Method::PUT, "/rows/students")
      .json(&input)
      .send()
      .await?;
    Ok(check(resp).await?.json().await?)
  }

  async fn list_managed_students(&self) -> Result<Vec<ManagedStudent>> {
    let resp = self.request(Method::GET, "/rows/students").send().await?;
    Ok(check(resp).await?.json().await?)
  }

  async fn remove_managed_student(&self, roll: RollNumber) -> Result<()> {
    let resp = self
      .request(Method::DELETE, &format!("/rows/students/{roll}"))
      .send()
      .await?;
    check(resp).await?;
    Ok(())
  }

  // ── Change feed ───────────────────────────────────────────────────────────

  fn subscribe(&self) -> ChangeStream {
    ChangeStream::new(self.changes.subscribe())
  }
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use docket_api::{AppState, auth::AuthConfig};
  use docket_core::service::ChangeKind;
  use docket_store_sqlite::SqliteStore;

  const KEY: &str = "test-service-key";

  fn roll(s: &str) -> RollNumber { RollNumber::parse(s).unwrap() }

  /// Serve the row API on an ephemeral port; returns its base URL.
  async fn spawn_server() -> String {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let state = AppState {
      store: Arc::new(store),
      auth:  Arc::new(AuthConfig { service_key: KEY.to_string() }),
    };
    let app = docket_api::router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
      .await
      .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
  }

  fn connect(base_url: String) -> ServiceClient {
    ServiceClient::connect(ClientConfig {
      base_url,
      service_key: KEY.to_string(),
    })
    .unwrap()
  }

  #[tokio::test]
  async fn profiles_round_trip_over_http() {
    let client = connect(spawn_server().await);

    let mut update = ProfileUpdate::empty(roll("D234105"));
    update.student_name = Some("Aisha Khan".to_string());
    let stored = client.upsert_profile(update).await.unwrap();
    assert_eq!(stored.roll_number, roll("D234105"));

    let fetched = client.get_profile(roll("D234105")).await.unwrap();
    assert_eq!(
      fetched.unwrap().student_name.as_deref(),
      Some("Aisha Khan")
    );
    assert!(client.get_profile(roll("D234106")).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn bind_denial_arrives_as_mismatch() {
    let client = connect(spawn_server().await);

    let first = client
      .bind_device(roll("D234105"), DeviceToken::new("device-a"), None)
      .await
      .unwrap();
    assert!(matches!(
      first,
      BindOutcome::Bound { newly_bound: true, .. }
    ));

    let second = client
      .bind_device(roll("D234105"), DeviceToken::new("device-b"), None)
      .await
      .unwrap();
    assert!(matches!(second, BindOutcome::Mismatch { .. }));
  }

  #[tokio::test]
  async fn validation_runs_before_any_request() {
    // Nothing listens on the discard port, so a network attempt would
    // fail as Http; the error must be the local validation one instead.
    let client = connect("http://127.0.0.1:9".to_string());

    let mut input = NewSubmission::new(
      roll("D234105"),
      "Aisha Khan",
      "Smart parking",
      "Sensors in every bay report to a shared display",
    );
    input.title = String::new();

    let err = client.submit(input).await.unwrap_err();
    assert!(matches!(
      err,
      Error::Core(docket_core::Error::MissingField("title"))
    ));
  }

  #[tokio::test]
  async fn missing_rows_surface_as_api_errors() {
    let client = connect(spawn_server().await);

    let err = client
      .review_submission(Uuid::new_v4(), SubmissionStatus::Approved, None)
      .await
      .unwrap_err();
    match err {
      Error::Api { status, message } => {
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(message.contains("not found"), "message: {message}");
      }
      other => panic!("expected Api error, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn change_feed_crosses_the_wire() {
    let client = connect(spawn_server().await);
    let mut changes = client.subscribe();

    // The feed task connects in the background; retry the write until an
    // event comes through.
    let mut received = None;
    for _ in 0..10 {
      client
        .upsert_profile(ProfileUpdate::empty(roll("D234105")))
        .await
        .unwrap();
      let next = tokio::time::timeout(
        Duration::from_millis(500),
        changes.next(),
      )
      .await;
      if let Ok(Some(event)) = next {
        received = Some(event);
        break;
      }
    }

    let event = received.expect("no change event within 5s");
    assert_eq!(event.table(), "profile");
    assert!(matches!(
      event.kind,
      ChangeKind::Insert | ChangeKind::Update
    ));
  }
}
