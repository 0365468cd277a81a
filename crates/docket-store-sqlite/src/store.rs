//! [`SqliteStore`] — the SQLite implementation of [`DataService`].

use std::path::Path;

use chrono::Utc;
use docket_core::{
  moderation,
  notice::{NewNotice, Notice},
  profile::{BindOutcome, DeviceToken, Profile, ProfileUpdate},
  roll::{RollNumber, RollRange},
  service::{
    CHANGE_BUFFER, ChangeEvent, ChangeKind, ChangeStream, DataService,
    RowChange,
  },
  student::{ManagedStudent, NewManagedStudent},
  submission::{NewSubmission, Submission, SubmissionStatus},
};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawManagedStudent, RawNotice, RawProfile, RawSubmission, decode_dt,
    encode_dt, encode_list, encode_roll, encode_scope, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Docket row store backed by a single SQLite file.
///
/// Cloning is cheap — the connection is reference-counted and all clones
/// share one change feed.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  changes: broadcast::Sender<ChangeEvent>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;

    let (changes, _) = broadcast::channel(CHANGE_BUFFER);
    Ok(Self { conn, changes })
  }

  /// Publish a committed change. `send` errs only when nobody is
  /// subscribed, in which case there is nothing to deliver.
  fn publish(&self, kind: ChangeKind, row: RowChange) {
    let _ = self.changes.send(ChangeEvent { kind, row });
  }
}

/// What the bind transaction decided, before column decoding.
enum RawBind {
  Bound { row: RawProfile, newly_bound: bool },
  Mismatch {
    bound_at:  Option<String>,
    seen_from: Option<String>,
  },
}

// ─── DataService impl ────────────────────────────────────────────────────────

impl DataService for SqliteStore {
  type Error = Error;

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn get_profile(&self, roll: RollNumber) -> Result<Option<Profile>> {
    let roll_str = encode_roll(roll);

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM profiles WHERE roll_number = ?1",
                RawProfile::COLUMNS
              ),
              rusqlite::params![roll_str],
              RawProfile::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn list_profiles(
    &self,
    range: Option<RollRange>,
  ) -> Result<Vec<Profile>> {
    let bounds = range.map(|r| (encode_roll(r.from), encode_roll(r.to)));

    let raws: Vec<RawProfile> = self
      .conn
      .call(move |conn| {
        let rows = if let Some((from, to)) = bounds {
          let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM profiles
             WHERE roll_number BETWEEN ?1 AND ?2
             ORDER BY roll_number",
            RawProfile::COLUMNS
          ))?;
          stmt
            .query_map(rusqlite::params![from, to], RawProfile::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM profiles ORDER BY roll_number",
            RawProfile::COLUMNS
          ))?;
          stmt
            .query_map([], RawProfile::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  async fn upsert_profile(&self, update: ProfileUpdate) -> Result<Profile> {
    let new_id_str = encode_uuid(Uuid::new_v4());
    let roll_str = encode_roll(update.roll_number);
    let now_str = encode_dt(Utc::now());
    let ProfileUpdate {
      student_name,
      department,
      email,
      phone,
      photo_ref,
      ..
    } = update;

    let raw: RawProfile = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO profiles (profile_id, roll_number, student_name,
               department, email, phone, photo_ref, suspended, created_at,
               updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?8)
             ON CONFLICT(roll_number) DO UPDATE SET
               student_name = COALESCE(excluded.student_name, profiles.student_name),
               department   = COALESCE(excluded.department,   profiles.department),
               email        = COALESCE(excluded.email,        profiles.email),
               phone        = COALESCE(excluded.phone,        profiles.phone),
               photo_ref    = COALESCE(excluded.photo_ref,    profiles.photo_ref),
               updated_at   = excluded.updated_at
             RETURNING {}",
            RawProfile::COLUMNS
          ),
          rusqlite::params![
            new_id_str,
            roll_str,
            student_name,
            department,
            email,
            phone,
            photo_ref,
            now_str,
          ],
          RawProfile::from_row,
        )?)
      })
      .await?;

    // A freshly inserted row has identical timestamps; an update does not.
    let kind = if raw.created_at == raw.updated_at {
      ChangeKind::Insert
    } else {
      ChangeKind::Update
    };

    let profile = raw.into_profile()?;
    self.publish(kind, RowChange::Profile(profile.clone()));
    Ok(profile)
  }

  async fn bind_device(
    &self,
    roll: RollNumber,
    device: DeviceToken,
    seen_from: Option<String>,
  ) -> Result<BindOutcome> {
    let roll_str = encode_roll(roll);
    let token_str = device.as_str().to_owned();
    let new_id_str = encode_uuid(Uuid::new_v4());
    let now_str = encode_dt(Utc::now());

    // The whole check-and-bind runs inside one IMMEDIATE transaction, so
    // two racing first logins serialise and exactly one of them binds.
    let raw: RawBind = self
      .conn
      .call(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<(Option<String>, Option<String>, Option<String>)> =
          tx.query_row(
            "SELECT device_token, device_bound_at, last_seen_from
             FROM profiles WHERE roll_number = ?1",
            rusqlite::params![roll_str],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
          )
          .optional()?;

        let outcome = match existing {
          // First contact: the profile row appears bound to this device.
          None => {
            let row = tx.query_row(
              &format!(
                "INSERT INTO profiles (profile_id, roll_number, device_token,
                   device_bound_at, last_seen_from, suspended, created_at,
                   updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?4, ?4)
                 RETURNING {}",
                RawProfile::COLUMNS
              ),
              rusqlite::params![
                new_id_str, roll_str, token_str, now_str, seen_from
              ],
              RawProfile::from_row,
            )?;
            RawBind::Bound { row, newly_bound: true }
          }
          // Row exists but was never bound: first writer wins, right here.
          Some((None, _, _)) => {
            let row = tx.query_row(
              &format!(
                "UPDATE profiles
                 SET device_token = ?2, device_bound_at = ?3,
                     last_seen_from = ?4, updated_at = ?3
                 WHERE roll_number = ?1
                 RETURNING {}",
                RawProfile::COLUMNS
              ),
              rusqlite::params![roll_str, token_str, now_str, seen_from],
              RawProfile::from_row,
            )?;
            RawBind::Bound { row, newly_bound: true }
          }
          // Same device as before: refresh the sighting only.
          Some((Some(stored), _, _)) if stored == token_str => {
            let row = tx.query_row(
              &format!(
                "UPDATE profiles SET last_seen_from = ?2, updated_at = ?3
                 WHERE roll_number = ?1
                 RETURNING {}",
                RawProfile::COLUMNS
              ),
              rusqlite::params![roll_str, seen_from, now_str],
              RawProfile::from_row,
            )?;
            RawBind::Bound { row, newly_bound: false }
          }
          // Foreign device: report, never overwrite.
          Some((Some(_), bound_at, last_seen)) => {
            RawBind::Mismatch { bound_at, seen_from: last_seen }
          }
        };

        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    match raw {
      RawBind::Bound { row, newly_bound } => {
        let kind = if row.created_at == row.updated_at {
          ChangeKind::Insert
        } else {
          ChangeKind::Update
        };
        let profile = row.into_profile()?;
        self.publish(kind, RowChange::Profile(profile.clone()));
        Ok(BindOutcome::Bound { profile, newly_bound })
      }
      RawBind::Mismatch { bound_at, seen_from } => Ok(BindOutcome::Mismatch {
        bound_at:       bound_at.as_deref().map(decode_dt).transpose()?,
        last_seen_from: seen_from,
      }),
    }
  }

  async fn unbind_device(&self, roll: RollNumber) -> Result<Profile> {
    let roll_str = encode_roll(roll);
    let now_str = encode_dt(Utc::now());

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "UPDATE profiles
                 SET device_token = NULL, device_bound_at = NULL,
                     updated_at = ?2
                 WHERE roll_number = ?1
                 RETURNING {}",
                RawProfile::COLUMNS
              ),
              rusqlite::params![roll_str, now_str],
              RawProfile::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    match raw {
      Some(raw) => {
        let profile = raw.into_profile()?;
        self.publish(ChangeKind::Update, RowChange::Profile(profile.clone()));
        Ok(profile)
      }
      None => Err(Error::Core(docket_core::Error::ProfileNotFound(roll))),
    }
  }

  async fn set_suspended(
    &self,
    roll: RollNumber,
    suspended: bool,
  ) -> Result<Profile> {
    let roll_str = encode_roll(roll);
    let now_str = encode_dt(Utc::now());

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "UPDATE profiles SET suspended = ?2, updated_at = ?3
                 WHERE roll_number = ?1
                 RETURNING {}",
                RawProfile::COLUMNS
              ),
              rusqlite::params![roll_str, suspended, now_str],
              RawProfile::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    match raw {
      Some(raw) => {
        let profile = raw.into_profile()?;
        self.publish(ChangeKind::Update, RowChange::Profile(profile.clone()));
        Ok(profile)
      }
      None => Err(Error::Core(docket_core::Error::ProfileNotFound(roll))),
    }
  }

  async fn delete_profile(&self, roll: RollNumber) -> Result<()> {
    let roll_str = encode_roll(roll);

    type Deleted = (RawProfile, Vec<RawSubmission>, Vec<RawNotice>);
    let raw: Option<Deleted> = self
      .conn
      .call(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let profile = tx
          .query_row(
            &format!(
              "SELECT {} FROM profiles WHERE roll_number = ?1",
              RawProfile::COLUMNS
            ),
            rusqlite::params![roll_str],
            RawProfile::from_row,
          )
          .optional()?;

        let profile = match profile {
          Some(p) => p,
          None => return Ok(None),
        };

        let submissions = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {} FROM submissions WHERE roll_number = ?1",
            RawSubmission::COLUMNS
          ))?;
          stmt
            .query_map(rusqlite::params![roll_str], RawSubmission::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        let notices = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {} FROM notices
             WHERE scope = 'student' AND roll_number = ?1",
            RawNotice::COLUMNS
          ))?;
          stmt
            .query_map(rusqlite::params![roll_str], RawNotice::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        tx.execute(
          "DELETE FROM notices WHERE scope = 'student' AND roll_number = ?1",
          rusqlite::params![roll_str],
        )?;
        // Submissions go with the profile via ON DELETE CASCADE.
        tx.execute(
          "DELETE FROM profiles WHERE roll_number = ?1",
          rusqlite::params![roll_str],
        )?;

        tx.commit()?;
        Ok(Some((profile, submissions, notices)))
      })
      .await?;

    let (profile, submissions, notices) = match raw {
      Some(deleted) => deleted,
      None => {
        return Err(Error::Core(docket_core::Error::ProfileNotFound(roll)));
      }
    };

    for raw_sub in submissions {
      self.publish(
        ChangeKind::Delete,
        RowChange::Submission(raw_sub.into_submission()?),
      );
    }
    for raw_notice in notices {
      self.publish(
        ChangeKind::Delete,
        RowChange::Notice(raw_notice.into_notice()?),
      );
    }
    self.publish(
      ChangeKind::Delete,
      RowChange::Profile(profile.into_profile()?),
    );
    Ok(())
  }

  // ── Submissions ───────────────────────────────────────────────────────────

  async fn submit(&self, input: NewSubmission) -> Result<Submission> {
    input.validate().map_err(Error::Core)?;

    let roll = input.roll_number;
    let submission = Submission {
      submission_id:  Uuid::new_v4(),
      roll_number:    input.roll_number,
      team_size:      input.team_members.len() as u32,
      student_name:   input.student_name,
      title:          input.title,
      description:    input.description,
      technologies:   input.technologies,
      team_members:   input.team_members,
      estimated_cost: input.estimated_cost,
      requirements:   input.requirements,
      status:         SubmissionStatus::Pending,
      remarks:        None,
      submitted_at:   Utc::now(),
    };

    let id_str = encode_uuid(submission.submission_id);
    let roll_str = encode_roll(roll);
    let student_name = submission.student_name.clone();
    let title = submission.title.clone();
    let description = submission.description.clone();
    let tech_str = encode_list(&submission.technologies)?;
    let members_str = encode_list(&submission.team_members)?;
    let team_size = submission.team_size as i64;
    let cost = submission.estimated_cost;
    let requirements = submission.requirements.clone();
    let status_str = submission.status.as_str();
    let at_str = encode_dt(submission.submitted_at);

    let profile_exists: bool = self
      .conn
      .call(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM profiles WHERE roll_number = ?1",
            rusqlite::params![roll_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if exists {
          tx.execute(
            "INSERT INTO submissions (
               submission_id, roll_number, student_name, title, description,
               technologies, team_members, team_size, estimated_cost,
               requirements, status, remarks, submitted_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, NULL, ?12)",
            rusqlite::params![
              id_str,
              roll_str,
              student_name,
              title,
              description,
              tech_str,
              members_str,
              team_size,
              cost,
              requirements,
              status_str,
              at_str,
            ],
          )?;
        }

        tx.commit()?;
        Ok(exists)
      })
      .await?;

    if !profile_exists {
      return Err(Error::Core(docket_core::Error::ProfileNotFound(roll)));
    }

    self.publish(
      ChangeKind::Insert,
      RowChange::Submission(submission.clone()),
    );
    Ok(submission)
  }

  async fn submissions_for(&self, roll: RollNumber) -> Result<Vec<Submission>> {
    let roll_str = encode_roll(roll);

    let raws: Vec<RawSubmission> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM submissions
           WHERE roll_number = ?1
           ORDER BY submitted_at DESC",
          RawSubmission::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![roll_str], RawSubmission::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubmission::into_submission).collect()
  }

  async fn list_submissions(
    &self,
    status: Option<SubmissionStatus>,
  ) -> Result<Vec<Submission>> {
    let status_str = status.map(|s| s.as_str());

    let raws: Vec<RawSubmission> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(status) = status_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM submissions
             WHERE status = ?1
             ORDER BY submitted_at DESC",
            RawSubmission::COLUMNS
          ))?;
          stmt
            .query_map(rusqlite::params![status], RawSubmission::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM submissions ORDER BY submitted_at DESC",
            RawSubmission::COLUMNS
          ))?;
          stmt
            .query_map([], RawSubmission::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubmission::into_submission).collect()
  }

  async fn review_submission(
    &self,
    id: Uuid,
    status: SubmissionStatus,
    remarks: Option<String>,
  ) -> Result<Submission> {
    if let Some(text) = &remarks {
      moderation::check("remarks", text).map_err(Error::Core)?;
    }

    let id_str = encode_uuid(id);
    let status_str = status.as_str();

    let raw: Option<RawSubmission> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "UPDATE submissions SET status = ?2, remarks = ?3
                 WHERE submission_id = ?1
                 RETURNING {}",
                RawSubmission::COLUMNS
              ),
              rusqlite::params![id_str, status_str, remarks],
              RawSubmission::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    match raw {
      Some(raw) => {
        let submission = raw.into_submission()?;
        self.publish(
          ChangeKind::Update,
          RowChange::Submission(submission.clone()),
        );
        Ok(submission)
      }
      None => Err(Error::Core(docket_core::Error::SubmissionNotFound(id))),
    }
  }

  // ── Notices ───────────────────────────────────────────────────────────────

  async fn post_notice(&self, input: NewNotice) -> Result<Notice> {
    input.validate().map_err(Error::Core)?;

    let notice = Notice {
      notice_id:  Uuid::new_v4(),
      title:      input.title,
      message:    input.message,
      scope:      input.scope,
      read:       false,
      posted_by:  input.posted_by,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(notice.notice_id);
    let title = notice.title.clone();
    let message = notice.message.clone();
    let (scope_str, roll_str) = encode_scope(notice.scope);
    let posted_by = notice.posted_by.clone();
    let at_str = encode_dt(notice.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notices (
             notice_id, title, message, scope, roll_number, read, posted_by,
             created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7)",
          rusqlite::params![
            id_str, title, message, scope_str, roll_str, posted_by, at_str
          ],
        )?;
        Ok(())
      })
      .await?;

    self.publish(ChangeKind::Insert, RowChange::Notice(notice.clone()));
    Ok(notice)
  }

  async fn notices_for(&self, roll: RollNumber) -> Result<Vec<Notice>> {
    let roll_str = encode_roll(roll);

    let raws: Vec<RawNotice> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM notices
           WHERE scope = 'broadcast'
              OR (scope = 'student' AND roll_number = ?1)
           ORDER BY created_at DESC",
          RawNotice::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![roll_str], RawNotice::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotice::into_notice).collect()
  }

  async fn list_notices(&self) -> Result<Vec<Notice>> {
    let raws: Vec<RawNotice> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM notices ORDER BY created_at DESC",
          RawNotice::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawNotice::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotice::into_notice).collect()
  }

  async fn mark_notice_read(&self, id: Uuid) -> Result<Notice> {
    let id_str = encode_uuid(id);

    let raw: Option<RawNotice> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "UPDATE notices SET read = 1 WHERE notice_id = ?1
                 RETURNING {}",
                RawNotice::COLUMNS
              ),
              rusqlite::params![id_str],
              RawNotice::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    match raw {
      Some(raw) => {
        let notice = raw.into_notice()?;
        self.publish(ChangeKind::Update, RowChange::Notice(notice.clone()));
        Ok(notice)
      }
      None => Err(Error::Core(docket_core::Error::NoticeNotFound(id))),
    }
  }

  // ── Managed roster ────────────────────────────────────────────────────────

  async fn put_managed_student(
    &self,
    input: NewManagedStudent,
  ) -> Result<ManagedStudent> {
    let roll_str = encode_roll(input.roll_number);
    let student_name = input.student_name;
    let department = input.department;
    let added_by = input.added_by;
    let at_str = encode_dt(Utc::now());

    let (raw, existed): (RawManagedStudent, bool) = self
      .conn
      .call(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existed: bool = tx
          .query_row(
            "SELECT 1 FROM managed_students WHERE roll_number = ?1",
            rusqlite::params![roll_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        let row = tx.query_row(
          &format!(
            "INSERT INTO managed_students (
               roll_number, student_name, department, added_by, added_at
             ) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(roll_number) DO UPDATE SET
               student_name = excluded.student_name,
               department   = excluded.department,
               added_by     = excluded.added_by,
               added_at     = excluded.added_at
             RETURNING {}",
            RawManagedStudent::COLUMNS
          ),
          rusqlite::params![
            roll_str, student_name, department, added_by, at_str
          ],
          RawManagedStudent::from_row,
        )?;

        tx.commit()?;
        Ok((row, existed))
      })
      .await?;

    let kind = if existed { ChangeKind::Update } else { ChangeKind::Insert };
    let entry = raw.into_managed_student()?;
    self.publish(kind, RowChange::ManagedStudent(entry.clone()));
    Ok(entry)
  }

  async fn list_managed_students(&self) -> Result<Vec<ManagedStudent>> {
    let raws: Vec<RawManagedStudent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM managed_students ORDER BY roll_number",
          RawManagedStudent::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawManagedStudent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawManagedStudent::into_managed_student)
      .collect()
  }

  async fn remove_managed_student(&self, roll: RollNumber) -> Result<()> {
    let roll_str = encode_roll(roll);

    let raw: Option<RawManagedStudent> = self
      .conn
      .call(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let row = tx
          .query_row(
            &format!(
              "SELECT {} FROM managed_students WHERE roll_number = ?1",
              RawManagedStudent::COLUMNS
            ),
            rusqlite::params![roll_str],
            RawManagedStudent::from_row,
          )
          .optional()?;

        if row.is_some() {
          tx.execute(
            "DELETE FROM managed_students WHERE roll_number = ?1",
            rusqlite::params![roll_str],
          )?;
        }

        tx.commit()?;
        Ok(row)
      })
      .await?;

    match raw {
      Some(raw) => {
        self.publish(
          ChangeKind::Delete,
          RowChange::ManagedStudent(raw.into_managed_student()?),
        );
        Ok(())
      }
      None => Err(Error::Core(docket_core::Error::NotOnRoster(roll))),
    }
  }

  // ── Change feed ───────────────────────────────────────────────────────────

  fn subscribe(&self) -> ChangeStream {
    ChangeStream::new(self.changes.subscribe())
  }
}
