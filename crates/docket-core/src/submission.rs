//! Project-proposal submissions and their review lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, error::Error, moderation, roll::RollNumber};

/// Review status of a submission. Every submission starts `Pending`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
}

impl SubmissionStatus {
  /// The discriminant string stored in the `status` column.
  /// Must match the `rename_all = "lowercase"` serde tags above.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Approved => "approved",
      Self::Rejected => "rejected",
    }
  }

  pub fn is_reviewed(&self) -> bool { !matches!(self, Self::Pending) }
}

/// A submitted project proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
  pub submission_id:  Uuid,
  pub roll_number:    RollNumber,
  pub student_name:   String,
  pub title:          String,
  pub description:    String,
  /// Technologies the team intends to use, free-form.
  pub technologies:   Vec<String>,
  /// Every team member's name, submitter included.
  pub team_members:   Vec<String>,
  /// Denormalised `team_members.len()`, kept for listings.
  pub team_size:      u32,
  pub estimated_cost: Option<f64>,
  /// Special hardware or lab requirements, if any.
  pub requirements:   Option<String>,
  pub status:         SubmissionStatus,
  /// Reviewer remarks; set when the submission is approved or rejected.
  pub remarks:        Option<String>,
  pub submitted_at:   DateTime<Utc>,
}

/// Input to [`submit`](crate::service::DataService::submit).
/// `submission_id`, `status`, and `submitted_at` are set by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubmission {
  pub roll_number:    RollNumber,
  pub student_name:   String,
  pub title:          String,
  pub description:    String,
  pub technologies:   Vec<String>,
  pub team_members:   Vec<String>,
  pub estimated_cost: Option<f64>,
  pub requirements:   Option<String>,
}

impl NewSubmission {
  /// Convenience constructor; the submitter is the sole team member.
  pub fn new(
    roll: RollNumber,
    student_name: impl Into<String>,
    title: impl Into<String>,
    description: impl Into<String>,
  ) -> Self {
    let student_name = student_name.into();
    Self {
      roll_number: roll,
      team_members: vec![student_name.clone()],
      student_name,
      title: title.into(),
      description: description.into(),
      technologies: Vec::new(),
      estimated_cost: None,
      requirements: None,
    }
  }

  /// Reject obviously unusable input before it reaches the store: blank
  /// required fields, an empty team, or disallowed language.
  pub fn validate(&self) -> Result<()> {
    if self.student_name.trim().is_empty() {
      return Err(Error::MissingField("student_name"));
    }
    if self.title.trim().is_empty() {
      return Err(Error::MissingField("title"));
    }
    if self.description.trim().is_empty() {
      return Err(Error::MissingField("description"));
    }
    if self.team_members.iter().all(|member| member.trim().is_empty()) {
      return Err(Error::EmptyTeam);
    }

    moderation::check("title", &self.title)?;
    moderation::check("description", &self.description)?;
    Ok(())
  }
}
