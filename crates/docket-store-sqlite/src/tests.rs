//! Integration tests for `SqliteStore` against an in-memory database.

use std::time::Duration;

use docket_core::{
  notice::{NewNotice, NoticeScope},
  profile::{BindOutcome, DeviceToken, ProfileUpdate},
  roll::{RollNumber, RollRange},
  service::{ChangeEvent, ChangeKind, ChangeStream, DataService, RowChange},
  student::NewManagedStudent,
  submission::{NewSubmission, SubmissionStatus},
};
use tokio::time::timeout;
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn roll(s: &str) -> RollNumber {
  RollNumber::parse(s).expect("test roll number")
}

fn device(s: &str) -> DeviceToken { DeviceToken::new(s) }

fn proposal(r: RollNumber) -> NewSubmission {
  NewSubmission::new(
    r,
    "Asha Verma",
    "Hostel laundry queue tracker",
    "Machine sensors publish availability to a shared display.",
  )
}

// ─── Device binding ──────────────────────────────────────────────────────────

#[tokio::test]
async fn first_bind_creates_profile_and_binds() {
  let s = store().await;

  let outcome = s
    .bind_device(roll("D234105"), device("dev-a"), Some("lab-3".into()))
    .await
    .unwrap();

  match outcome {
    BindOutcome::Bound { profile, newly_bound } => {
      assert!(newly_bound);
      assert_eq!(profile.roll_number, roll("D234105"));
      assert_eq!(profile.device_token, Some(device("dev-a")));
      assert!(profile.device_bound_at.is_some());
      assert_eq!(profile.last_seen_from.as_deref(), Some("lab-3"));
    }
    BindOutcome::Mismatch { .. } => panic!("expected a fresh bind"),
  }

  let fetched = s.get_profile(roll("D234105")).await.unwrap().unwrap();
  assert_eq!(fetched.device_token, Some(device("dev-a")));
}

#[tokio::test]
async fn rebinding_the_same_device_is_allowed() {
  let s = store().await;
  s.bind_device(roll("D234105"), device("dev-a"), None)
    .await
    .unwrap();

  let outcome = s
    .bind_device(roll("D234105"), device("dev-a"), Some("home".into()))
    .await
    .unwrap();

  match outcome {
    BindOutcome::Bound { profile, newly_bound } => {
      assert!(!newly_bound);
      assert_eq!(profile.last_seen_from.as_deref(), Some("home"));
    }
    BindOutcome::Mismatch { .. } => panic!("same device must match"),
  }
}

#[tokio::test]
async fn foreign_device_sees_mismatch_and_binding_survives() {
  let s = store().await;
  s.bind_device(roll("D234105"), device("dev-a"), None)
    .await
    .unwrap();

  let outcome = s
    .bind_device(roll("D234105"), device("dev-b"), None)
    .await
    .unwrap();
  match outcome {
    BindOutcome::Mismatch { bound_at, .. } => assert!(bound_at.is_some()),
    BindOutcome::Bound { .. } => panic!("foreign device must not bind"),
  }

  // The stored binding is untouched.
  let profile = s.get_profile(roll("D234105")).await.unwrap().unwrap();
  assert_eq!(profile.device_token, Some(device("dev-a")));
}

#[tokio::test]
async fn racing_first_logins_bind_exactly_once() {
  let s = store().await;

  let (a, b) = tokio::join!(
    s.bind_device(roll("D234110"), device("dev-a"), None),
    s.bind_device(roll("D234110"), device("dev-b"), None),
  );
  let (a, b) = (a.unwrap(), b.unwrap());

  let bound = [&a, &b].iter().filter(|o| o.is_bound()).count();
  assert_eq!(bound, 1, "exactly one racer may win the bind");

  // The stored token belongs to the winner.
  let profile = s.get_profile(roll("D234110")).await.unwrap().unwrap();
  let winner = match (&a, &b) {
    (BindOutcome::Bound { .. }, _) => device("dev-a"),
    _ => device("dev-b"),
  };
  assert_eq!(profile.device_token, Some(winner));
}

#[tokio::test]
async fn unbind_allows_a_new_device_to_bind() {
  let s = store().await;
  s.bind_device(roll("D234105"), device("dev-a"), None)
    .await
    .unwrap();

  let profile = s.unbind_device(roll("D234105")).await.unwrap();
  assert!(profile.device_token.is_none());
  assert!(profile.device_bound_at.is_none());

  let outcome = s
    .bind_device(roll("D234105"), device("dev-b"), None)
    .await
    .unwrap();
  assert!(matches!(
    outcome,
    BindOutcome::Bound { newly_bound: true, .. }
  ));
}

#[tokio::test]
async fn unbind_unknown_roll_errors() {
  let s = store().await;
  let err = s.unbind_device(roll("D234160")).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(docket_core::Error::ProfileNotFound(_))
  ));
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_creates_then_updates() {
  let s = store().await;

  let mut update = ProfileUpdate::empty(roll("D234106"));
  update.student_name = Some("Ravi Patil".into());
  let created = s.upsert_profile(update).await.unwrap();
  assert_eq!(created.student_name.as_deref(), Some("Ravi Patil"));
  assert_eq!(created.created_at, created.updated_at);

  let mut update = ProfileUpdate::empty(roll("D234106"));
  update.email = Some("ravi@example.edu".into());
  let updated = s.upsert_profile(update).await.unwrap();

  // Earlier fields survive an update that does not mention them.
  assert_eq!(updated.student_name.as_deref(), Some("Ravi Patil"));
  assert_eq!(updated.email.as_deref(), Some("ravi@example.edu"));
  assert_eq!(updated.profile_id, created.profile_id);
}

#[tokio::test]
async fn upsert_never_touches_the_device_binding() {
  let s = store().await;
  s.bind_device(roll("D234107"), device("dev-a"), None)
    .await
    .unwrap();

  let mut update = ProfileUpdate::empty(roll("D234107"));
  update.phone = Some("9800000000".into());
  let profile = s.upsert_profile(update).await.unwrap();

  assert_eq!(profile.device_token, Some(device("dev-a")));
  assert!(profile.device_bound_at.is_some());
}

#[tokio::test]
async fn list_profiles_honours_the_roll_range() {
  let s = store().await;
  for r in ["D234101", "D234105", "D234110", "D234120"] {
    s.upsert_profile(ProfileUpdate::empty(roll(r))).await.unwrap();
  }

  let all = s.list_profiles(None).await.unwrap();
  assert_eq!(all.len(), 4);

  let range = RollRange { from: roll("D234105"), to: roll("D234110") };
  let window = s.list_profiles(Some(range)).await.unwrap();
  let rolls: Vec<String> =
    window.iter().map(|p| p.roll_number.to_string()).collect();
  assert_eq!(rolls, ["D234105", "D234110"]);
}

#[tokio::test]
async fn suspension_round_trips() {
  let s = store().await;
  s.upsert_profile(ProfileUpdate::empty(roll("D234108")))
    .await
    .unwrap();

  let suspended = s.set_suspended(roll("D234108"), true).await.unwrap();
  assert!(suspended.suspended);

  let reinstated = s.set_suspended(roll("D234108"), false).await.unwrap();
  assert!(!reinstated.suspended);
}

#[tokio::test]
async fn delete_profile_takes_submissions_and_targeted_notices() {
  let s = store().await;
  let r = roll("D234109");
  s.bind_device(r, device("dev-a"), None).await.unwrap();
  s.submit(proposal(r)).await.unwrap();
  s.post_notice(NewNotice::for_student(r, "Fee due", "Pay up.", "admin"))
    .await
    .unwrap();
  s.post_notice(NewNotice::broadcast("Holiday", "Campus shut.", "admin"))
    .await
    .unwrap();

  s.delete_profile(r).await.unwrap();

  assert!(s.get_profile(r).await.unwrap().is_none());
  assert!(s.submissions_for(r).await.unwrap().is_empty());

  // Broadcasts survive; the targeted notice is gone.
  let remaining = s.list_notices().await.unwrap();
  assert_eq!(remaining.len(), 1);
  assert_eq!(remaining[0].scope, NoticeScope::Broadcast);
}

// ─── Submissions ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_requires_a_profile() {
  let s = store().await;
  let err = s.submit(proposal(roll("D234111"))).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(docket_core::Error::ProfileNotFound(_))
  ));
}

#[tokio::test]
async fn submissions_start_pending() {
  let s = store().await;
  let r = roll("D234112");
  s.bind_device(r, device("dev-a"), None).await.unwrap();

  let mut input = proposal(r);
  input.technologies = vec!["esp32".into(), "mqtt".into()];
  input.team_members = vec!["Asha Verma".into(), "Ravi Patil".into()];
  let submission = s.submit(input).await.unwrap();

  assert_eq!(submission.status, SubmissionStatus::Pending);
  assert_eq!(submission.team_size, 2);

  let listed = s.submissions_for(r).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0], submission);
}

#[tokio::test]
async fn submit_rejects_disallowed_language() {
  let s = store().await;
  let r = roll("D234113");
  s.bind_device(r, device("dev-a"), None).await.unwrap();

  let mut input = proposal(r);
  input.description = "An app to grade this rubbish canteen.".into();
  let err = s.submit(input).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(docket_core::Error::DisallowedWord { .. })
  ));
}

#[tokio::test]
async fn review_sets_status_and_remarks() {
  let s = store().await;
  let r = roll("D234114");
  s.bind_device(r, device("dev-a"), None).await.unwrap();
  let submission = s.submit(proposal(r)).await.unwrap();

  let reviewed = s
    .review_submission(
      submission.submission_id,
      SubmissionStatus::Approved,
      Some("Budget looks fine.".into()),
    )
    .await
    .unwrap();
  assert_eq!(reviewed.status, SubmissionStatus::Approved);
  assert_eq!(reviewed.remarks.as_deref(), Some("Budget looks fine."));

  // A later decision overwrites the earlier one.
  let reversed = s
    .review_submission(
      submission.submission_id,
      SubmissionStatus::Rejected,
      Some("Duplicate of an approved project.".into()),
    )
    .await
    .unwrap();
  assert_eq!(reversed.status, SubmissionStatus::Rejected);

  let pending = s
    .list_submissions(Some(SubmissionStatus::Pending))
    .await
    .unwrap();
  assert!(pending.is_empty());

  let rejected = s
    .list_submissions(Some(SubmissionStatus::Rejected))
    .await
    .unwrap();
  assert_eq!(rejected.len(), 1);
}

#[tokio::test]
async fn review_missing_submission_errors() {
  let s = store().await;
  let err = s
    .review_submission(Uuid::new_v4(), SubmissionStatus::Approved, None)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(docket_core::Error::SubmissionNotFound(_))
  ));
}

// ─── Notices ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn notice_visibility_follows_scope() {
  let s = store().await;
  let mine = roll("D234115");
  let theirs = roll("D234116");

  s.post_notice(NewNotice::broadcast("Holiday", "Campus shut.", "admin"))
    .await
    .unwrap();
  s.post_notice(NewNotice::for_student(mine, "Viva", "Friday 10am.", "admin"))
    .await
    .unwrap();
  s.post_notice(NewNotice::for_student(theirs, "Viva", "Friday 2pm.", "admin"))
    .await
    .unwrap();

  let visible = s.notices_for(mine).await.unwrap();
  assert_eq!(visible.len(), 2);
  assert!(visible.iter().all(|n| n.scope.applies_to(mine)));

  let everything = s.list_notices().await.unwrap();
  assert_eq!(everything.len(), 3);
}

#[tokio::test]
async fn mark_notice_read_flips_the_flag() {
  let s = store().await;
  let r = roll("D234117");
  let notice = s
    .post_notice(NewNotice::for_student(r, "Viva", "Friday 10am.", "admin"))
    .await
    .unwrap();
  assert!(!notice.read);

  let read = s.mark_notice_read(notice.notice_id).await.unwrap();
  assert!(read.read);

  let err = s.mark_notice_read(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(docket_core::Error::NoticeNotFound(_))
  ));
}

// ─── Managed roster ──────────────────────────────────────────────────────────

#[tokio::test]
async fn roster_put_list_remove() {
  let s = store().await;

  let mut entry = NewManagedStudent::new(roll("D234118"), "admin");
  entry.student_name = Some("Meera Shah".into());
  s.put_managed_student(entry).await.unwrap();

  // Putting the same roll again overwrites the entry.
  let mut entry = NewManagedStudent::new(roll("D234118"), "admin");
  entry.department = Some("EXTC".into());
  let updated = s.put_managed_student(entry).await.unwrap();
  assert_eq!(updated.department.as_deref(), Some("EXTC"));
  assert!(updated.student_name.is_none());

  let all = s.list_managed_students().await.unwrap();
  assert_eq!(all.len(), 1);

  s.remove_managed_student(roll("D234118")).await.unwrap();
  assert!(s.list_managed_students().await.unwrap().is_empty());

  let err = s.remove_managed_student(roll("D234118")).await.unwrap_err();
  assert!(matches!(err, Error::Core(docket_core::Error::NotOnRoster(_))));
}

// ─── Change feed ─────────────────────────────────────────────────────────────

async fn next_event(feed: &mut ChangeStream) -> ChangeEvent {
  timeout(Duration::from_secs(1), feed.next())
    .await
    .expect("change event within a second")
    .expect("feed still open")
}

#[tokio::test]
async fn committed_writes_reach_subscribers() {
  let s = store().await;
  let mut feed = s.subscribe();

  let r = roll("D234119");
  s.bind_device(r, device("dev-a"), None).await.unwrap();
  let event = next_event(&mut feed).await;
  assert_eq!(event.kind, ChangeKind::Insert);
  assert!(matches!(event.row, RowChange::Profile(_)));

  s.submit(proposal(r)).await.unwrap();
  let event = next_event(&mut feed).await;
  assert_eq!(event.kind, ChangeKind::Insert);
  assert_eq!(event.table(), "submission");
}

#[tokio::test]
async fn subscribers_only_see_events_after_joining() {
  let s = store().await;
  s.bind_device(roll("D234120"), device("dev-a"), None)
    .await
    .unwrap();

  let mut feed = s.subscribe();
  s.post_notice(NewNotice::broadcast("Holiday", "Campus shut.", "admin"))
    .await
    .unwrap();

  let event = next_event(&mut feed).await;
  assert_eq!(event.table(), "notice");
}

#[tokio::test]
async fn deleting_a_profile_publishes_the_cascade() {
  let s = store().await;
  let r = roll("D234121");
  s.bind_device(r, device("dev-a"), None).await.unwrap();
  s.submit(proposal(r)).await.unwrap();
  s.post_notice(NewNotice::for_student(r, "Viva", "Friday.", "admin"))
    .await
    .unwrap();

  let mut feed = s.subscribe();
  s.delete_profile(r).await.unwrap();

  let tables: Vec<&'static str> = vec![
    next_event(&mut feed).await.table(),
    next_event(&mut feed).await.table(),
    next_event(&mut feed).await.table(),
  ];
  assert_eq!(tables, ["submission", "notice", "profile"]);
}

#[tokio::test]
async fn rejected_writes_publish_nothing() {
  let s = store().await;
  let mut feed = s.subscribe();

  // No profile yet, so this write fails and must stay silent.
  s.submit(proposal(roll("D234122"))).await.unwrap_err();

  let quiet = timeout(Duration::from_millis(200), feed.next()).await;
  assert!(quiet.is_err(), "no event may be published for a failed write");
}
