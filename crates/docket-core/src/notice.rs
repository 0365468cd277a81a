//! Notices — announcements from the admin to students.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, error::Error, moderation, roll::RollNumber};

/// Who a notice is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "roll", rename_all = "lowercase")]
pub enum NoticeScope {
  /// Visible to every signed-in student.
  Broadcast,
  /// Visible only to one roll number.
  Student(RollNumber),
}

impl NoticeScope {
  /// Whether a student with `roll` should see a notice with this scope.
  pub fn applies_to(&self, roll: RollNumber) -> bool {
    match self {
      Self::Broadcast => true,
      Self::Student(target) => *target == roll,
    }
  }
}

/// An announcement row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
  pub notice_id:  Uuid,
  pub title:      String,
  pub message:    String,
  pub scope:      NoticeScope,
  /// Whether the addressee has opened the notice. Only meaningful for
  /// [`NoticeScope::Student`] notices; broadcasts stay `false`.
  pub read:       bool,
  pub posted_by:  String,
  pub created_at: DateTime<Utc>,
}

/// Input to [`post_notice`](crate::service::DataService::post_notice).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotice {
  pub title:     String,
  pub message:   String,
  pub scope:     NoticeScope,
  pub posted_by: String,
}

impl NewNotice {
  pub fn broadcast(
    title: impl Into<String>,
    message: impl Into<String>,
    posted_by: impl Into<String>,
  ) -> Self {
    Self {
      title:     title.into(),
      message:   message.into(),
      scope:     NoticeScope::Broadcast,
      posted_by: posted_by.into(),
    }
  }

  pub fn for_student(
    roll: RollNumber,
    title: impl Into<String>,
    message: impl Into<String>,
    posted_by: impl Into<String>,
  ) -> Self {
    Self {
      title:     title.into(),
      message:   message.into(),
      scope:     NoticeScope::Student(roll),
      posted_by: posted_by.into(),
    }
  }

  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::MissingField("title"));
    }
    if self.message.trim().is_empty() {
      return Err(Error::MissingField("message"));
    }
    moderation::check("title", &self.title)?;
    moderation::check("message", &self.message)?;
    Ok(())
  }
}
