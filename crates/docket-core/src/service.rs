//! The `DataService` trait and the row change feed.
//!
//! The trait is implemented natively by `docket-store-sqlite` and remotely
//! by `docket-client`. Session and portal code is written once against this
//! abstraction and runs against either backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
  notice::{NewNotice, Notice},
  profile::{BindOutcome, DeviceToken, Profile, ProfileUpdate},
  roll::{RollNumber, RollRange},
  student::{ManagedStudent, NewManagedStudent},
  submission::{NewSubmission, Submission, SubmissionStatus},
};

// ─── Change feed ─────────────────────────────────────────────────────────────

/// How far a subscriber may fall behind before the feed drops its oldest
/// unseen events for that subscriber.
pub const CHANGE_BUFFER: usize = 256;

/// The kind of row mutation an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
  Insert,
  Update,
  Delete,
}

/// The mutated row, tagged by table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "table", content = "row", rename_all = "snake_case")]
pub enum RowChange {
  Profile(Profile),
  Submission(Submission),
  Notice(Notice),
  ManagedStudent(ManagedStudent),
}

impl RowChange {
  /// The table name used on the wire and in log lines.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn table(&self) -> &'static str {
    match self {
      Self::Profile(_) => "profile",
      Self::Submission(_) => "submission",
      Self::Notice(_) => "notice",
      Self::ManagedStudent(_) => "managed_student",
    }
  }
}

/// One committed row mutation, published after the write succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
  pub kind: ChangeKind,
  #[serde(flatten)]
  pub row:  RowChange,
}

impl ChangeEvent {
  pub fn table(&self) -> &'static str { self.row.table() }
}

/// A live subscription to the change feed.
///
/// Wraps a broadcast receiver. A subscriber that falls more than
/// [`CHANGE_BUFFER`] events behind silently skips the overwritten events
/// and resumes from the oldest retained one; consumers treat the feed as a
/// refresh hint, not a complete journal, so the loss is tolerable.
pub struct ChangeStream {
  rx: broadcast::Receiver<ChangeEvent>,
}

impl ChangeStream {
  pub fn new(rx: broadcast::Receiver<ChangeEvent>) -> Self { Self { rx } }

  /// The next change, or `None` once the feed is closed (every sender
  /// dropped). Lag is skipped over, never surfaced as an error.
  pub async fn next(&mut self) -> Option<ChangeEvent> {
    loop {
      match self.rx.recv().await {
        Ok(event) => return Some(event),
        Err(broadcast::error::RecvError::Lagged(_)) => continue,
        Err(broadcast::error::RecvError::Closed) => return None,
      }
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the portal's hosted row store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (tokio with `axum`).
pub trait DataService: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Profiles ──────────────────────────────────────────────────────────

  /// Fetch the profile for `roll`. Returns `None` if none exists yet.
  fn get_profile(
    &self,
    roll: RollNumber,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// List profiles ordered by roll number, optionally clamped to `range`.
  fn list_profiles(
    &self,
    range: Option<RollRange>,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;

  /// Create the profile row for a roll number, or update its editable
  /// fields if it already exists. Never touches device or suspension
  /// state.
  fn upsert_profile(
    &self,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  /// Atomically check `device` against the stored binding for `roll`,
  /// binding first-comers.
  ///
  /// At most one device ever wins the bind for a roll number: the check
  /// and the write happen in a single storage-level operation, so two
  /// racing first logins cannot both end up bound. Losers (and every
  /// later foreign device) see [`BindOutcome::Mismatch`], and the stored
  /// binding is never overwritten.
  fn bind_device(
    &self,
    roll: RollNumber,
    device: DeviceToken,
    seen_from: Option<String>,
  ) -> impl Future<Output = Result<BindOutcome, Self::Error>> + Send + '_;

  /// Clear the device binding for `roll` so the next login re-binds.
  /// Exposed to admins only; the store itself does not enforce that.
  fn unbind_device(
    &self,
    roll: RollNumber,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  /// Suspend or reinstate a student.
  fn set_suspended(
    &self,
    roll: RollNumber,
    suspended: bool,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  /// Delete a profile and everything hanging off it (submissions,
  /// targeted notices). The managed roster is left alone.
  fn delete_profile(
    &self,
    roll: RollNumber,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Submissions ───────────────────────────────────────────────────────

  /// Validate and store a new proposal with `Pending` status.
  fn submit(
    &self,
    input: NewSubmission,
  ) -> impl Future<Output = Result<Submission, Self::Error>> + Send + '_;

  /// All submissions by one student, newest first.
  fn submissions_for(
    &self,
    roll: RollNumber,
  ) -> impl Future<Output = Result<Vec<Submission>, Self::Error>> + Send + '_;

  /// All submissions, newest first, optionally filtered by status.
  fn list_submissions(
    &self,
    status: Option<SubmissionStatus>,
  ) -> impl Future<Output = Result<Vec<Submission>, Self::Error>> + Send + '_;

  /// Record the admin's decision on a submission. A later call overwrites
  /// an earlier decision.
  fn review_submission(
    &self,
    id: Uuid,
    status: SubmissionStatus,
    remarks: Option<String>,
  ) -> impl Future<Output = Result<Submission, Self::Error>> + Send + '_;

  // ── Notices ───────────────────────────────────────────────────────────

  /// Post a notice, broadcast or targeted.
  fn post_notice(
    &self,
    input: NewNotice,
  ) -> impl Future<Output = Result<Notice, Self::Error>> + Send + '_;

  /// Notices visible to `roll`: every broadcast plus the ones addressed
  /// to it, newest first.
  fn notices_for(
    &self,
    roll: RollNumber,
  ) -> impl Future<Output = Result<Vec<Notice>, Self::Error>> + Send + '_;

  /// Every notice in the store, newest first. Admin view.
  fn list_notices(
    &self,
  ) -> impl Future<Output = Result<Vec<Notice>, Self::Error>> + Send + '_;

  /// Mark a targeted notice as read.
  fn mark_notice_read(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Notice, Self::Error>> + Send + '_;

  // ── Managed roster ────────────────────────────────────────────────────

  /// Add a roster entry, or overwrite the existing entry for the same
  /// roll number.
  fn put_managed_student(
    &self,
    input: NewManagedStudent,
  ) -> impl Future<Output = Result<ManagedStudent, Self::Error>> + Send + '_;

  fn list_managed_students(
    &self,
  ) -> impl Future<Output = Result<Vec<ManagedStudent>, Self::Error>> + Send + '_;

  fn remove_managed_student(
    &self,
    roll: RollNumber,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Change feed ───────────────────────────────────────────────────────

  /// Subscribe to committed row changes. Events published before the call
  /// are not replayed.
  fn subscribe(&self) -> ChangeStream;
}
