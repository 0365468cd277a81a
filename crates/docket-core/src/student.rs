//! The admin-managed student roster.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::roll::RollNumber;

/// A roster entry. Having one does not create a profile; it records that
/// the admin expects this roll number to enrol, plus whatever the admin
/// already knows about them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedStudent {
  pub roll_number:  RollNumber,
  pub student_name: Option<String>,
  pub department:   Option<String>,
  pub added_by:     String,
  pub added_at:     DateTime<Utc>,
}

/// Input to
/// [`put_managed_student`](crate::service::DataService::put_managed_student).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewManagedStudent {
  pub roll_number:  RollNumber,
  pub student_name: Option<String>,
  pub department:   Option<String>,
  pub added_by:     String,
}

impl NewManagedStudent {
  pub fn new(roll: RollNumber, added_by: impl Into<String>) -> Self {
    Self {
      roll_number:  roll,
      student_name: None,
      department:   None,
      added_by:     added_by.into(),
    }
  }
}
