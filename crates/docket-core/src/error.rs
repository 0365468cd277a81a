//! Error types for `docket-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::roll::{RollError, RollNumber};

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Roll(#[from] RollError),

  #[error("no profile for {0}")]
  ProfileNotFound(RollNumber),

  #[error("submission not found: {0}")]
  SubmissionNotFound(Uuid),

  #[error("notice not found: {0}")]
  NoticeNotFound(Uuid),

  #[error("{0} is not on the managed roster")]
  NotOnRoster(RollNumber),

  #[error("required field missing or blank: {0}")]
  MissingField(&'static str),

  #[error("team member list is empty")]
  EmptyTeam,

  #[error("{field} contains disallowed language ({word:?})")]
  DisallowedWord {
    field: &'static str,
    word:  &'static str,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
