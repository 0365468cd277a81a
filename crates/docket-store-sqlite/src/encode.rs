//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. String-list fields
//! (technologies, team members) are stored as compact JSON arrays. UUIDs are
//! stored as hyphenated lowercase strings; roll numbers in canonical
//! `D`-prefixed form, which sorts numerically because the digits are
//! zero-padded.

use chrono::{DateTime, Utc};
use docket_core::{
  notice::{Notice, NoticeScope},
  profile::{DeviceToken, Profile},
  roll::RollNumber,
  student::ManagedStudent,
  submission::{Submission, SubmissionStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("bad timestamp: {e}")))
}

// ─── RollNumber ──────────────────────────────────────────────────────────────

pub fn encode_roll(roll: RollNumber) -> String { roll.to_string() }

pub fn decode_roll(s: &str) -> Result<RollNumber> {
  RollNumber::parse(s).map_err(|e| Error::Core(e.into()))
}

// ─── SubmissionStatus ────────────────────────────────────────────────────────

pub fn decode_status(s: &str) -> Result<SubmissionStatus> {
  match s {
    "pending" => Ok(SubmissionStatus::Pending),
    "approved" => Ok(SubmissionStatus::Approved),
    "rejected" => Ok(SubmissionStatus::Rejected),
    other => Err(Error::Decode(format!("unknown status: {other:?}"))),
  }
}

// ─── NoticeScope ─────────────────────────────────────────────────────────────

/// Split a scope into its `scope` and `roll_number` column values.
pub fn encode_scope(scope: NoticeScope) -> (&'static str, Option<String>) {
  match scope {
    NoticeScope::Broadcast => ("broadcast", None),
    NoticeScope::Student(roll) => ("student", Some(encode_roll(roll))),
  }
}

pub fn decode_scope(scope: &str, roll: Option<&str>) -> Result<NoticeScope> {
  match scope {
    "broadcast" => Ok(NoticeScope::Broadcast),
    "student" => {
      let roll = roll
        .ok_or_else(|| Error::Decode("student notice without roll".into()))?;
      Ok(NoticeScope::Student(decode_roll(roll)?))
    }
    other => Err(Error::Decode(format!("unknown notice scope: {other:?}"))),
  }
}

// ─── String lists ────────────────────────────────────────────────────────────

pub fn encode_list(items: &[String]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

pub fn decode_list(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `profiles` row.
pub struct RawProfile {
  pub profile_id:      String,
  pub roll_number:     String,
  pub student_name:    Option<String>,
  pub department:      Option<String>,
  pub email:           Option<String>,
  pub phone:           Option<String>,
  pub photo_ref:       Option<String>,
  pub device_token:    Option<String>,
  pub device_bound_at: Option<String>,
  pub last_seen_from:  Option<String>,
  pub suspended:       bool,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawProfile {
  /// The `profiles` column list every SELECT and RETURNING clause uses,
  /// in the order [`RawProfile::from_row`] expects.
  pub const COLUMNS: &'static str = "profile_id, roll_number, student_name, \
     department, email, phone, photo_ref, device_token, device_bound_at, \
     last_seen_from, suspended, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      profile_id:      row.get(0)?,
      roll_number:     row.get(1)?,
      student_name:    row.get(2)?,
      department:      row.get(3)?,
      email:           row.get(4)?,
      phone:           row.get(5)?,
      photo_ref:       row.get(6)?,
      device_token:    row.get(7)?,
      device_bound_at: row.get(8)?,
      last_seen_from:  row.get(9)?,
      suspended:       row.get(10)?,
      created_at:      row.get(11)?,
      updated_at:      row.get(12)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      profile_id:      decode_uuid(&self.profile_id)?,
      roll_number:     decode_roll(&self.roll_number)?,
      student_name:    self.student_name,
      department:      self.department,
      email:           self.email,
      phone:           self.phone,
      photo_ref:       self.photo_ref,
      device_token:    self.device_token.map(DeviceToken::new),
      device_bound_at: self
        .device_bound_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      last_seen_from:  self.last_seen_from,
      suspended:       self.suspended,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `submissions` row.
pub struct RawSubmission {
  pub submission_id:  String,
  pub roll_number:    String,
  pub student_name:   String,
  pub title:          String,
  pub description:    String,
  pub technologies:   String,
  pub team_members:   String,
  pub team_size:      i64,
  pub estimated_cost: Option<f64>,
  pub requirements:   Option<String>,
  pub status:         String,
  pub remarks:        Option<String>,
  pub submitted_at:   String,
}

impl RawSubmission {
  pub const COLUMNS: &'static str = "submission_id, roll_number, \
     student_name, title, description, technologies, team_members, \
     team_size, estimated_cost, requirements, status, remarks, submitted_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      submission_id:  row.get(0)?,
      roll_number:    row.get(1)?,
      student_name:   row.get(2)?,
      title:          row.get(3)?,
      description:    row.get(4)?,
      technologies:   row.get(5)?,
      team_members:   row.get(6)?,
      team_size:      row.get(7)?,
      estimated_cost: row.get(8)?,
      requirements:   row.get(9)?,
      status:         row.get(10)?,
      remarks:        row.get(11)?,
      submitted_at:   row.get(12)?,
    })
  }

  pub fn into_submission(self) -> Result<Submission> {
    Ok(Submission {
      submission_id:  decode_uuid(&self.submission_id)?,
      roll_number:    decode_roll(&self.roll_number)?,
      student_name:   self.student_name,
      title:          self.title,
      description:    self.description,
      technologies:   decode_list(&self.technologies)?,
      team_members:   decode_list(&self.team_members)?,
      team_size:      self.team_size as u32,
      estimated_cost: self.estimated_cost,
      requirements:   self.requirements,
      status:         decode_status(&self.status)?,
      remarks:        self.remarks,
      submitted_at:   decode_dt(&self.submitted_at)?,
    })
  }
}

/// Raw strings read directly from a `notices` row.
pub struct RawNotice {
  pub notice_id:   String,
  pub title:       String,
  pub message:     String,
  pub scope:       String,
  pub roll_number: Option<String>,
  pub read:        bool,
  pub posted_by:   String,
  pub created_at:  String,
}

impl RawNotice {
  pub const COLUMNS: &'static str =
    "notice_id, title, message, scope, roll_number, read, posted_by, \
     created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notice_id:   row.get(0)?,
      title:       row.get(1)?,
      message:     row.get(2)?,
      scope:       row.get(3)?,
      roll_number: row.get(4)?,
      read:        row.get(5)?,
      posted_by:   row.get(6)?,
      created_at:  row.get(7)?,
    })
  }

  pub fn into_notice(self) -> Result<Notice> {
    Ok(Notice {
      notice_id:  decode_uuid(&self.notice_id)?,
      title:      self.title,
      message:    self.message,
      scope:      decode_scope(&self.scope, self.roll_number.as_deref())?,
      read:       self.read,
      posted_by:  self.posted_by,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `managed_students` row.
pub struct RawManagedStudent {
  pub roll_number:  String,
  pub student_name: Option<String>,
  pub department:   Option<String>,
  pub added_by:     String,
  pub added_at:     String,
}

impl RawManagedStudent {
  pub const COLUMNS: &'static str =
    "roll_number, student_name, department, added_by, added_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      roll_number:  row.get(0)?,
      student_name: row.get(1)?,
      department:   row.get(2)?,
      added_by:     row.get(3)?,
      added_at:     row.get(4)?,
    })
  }

  pub fn into_managed_student(self) -> Result<ManagedStudent> {
    Ok(ManagedStudent {
      roll_number:  decode_roll(&self.roll_number)?,
      student_name: self.student_name,
      department:   self.department,
      added_by:     self.added_by,
      added_at:     decode_dt(&self.added_at)?,
    })
  }
}
