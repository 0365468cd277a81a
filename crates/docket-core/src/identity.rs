//! Signed-in identity — the payload the session store persists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  profile::{DeviceToken, Profile},
  roll::RollNumber,
};

/// Who is signed in.
///
/// The `role` tag is the discriminant. A stored record with an unrecognised
/// tag, or one missing the variant's identifying field (`roll` / `email`),
/// fails deserialisation and is treated as corrupt by the session store;
/// the optional student fields merely default to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Identity {
  Student {
    roll:         RollNumber,
    #[serde(default)]
    department:   Option<String>,
    #[serde(default)]
    profile_id:   Option<Uuid>,
    /// Fingerprint of the device this session was signed in from.
    #[serde(default)]
    device_token: Option<DeviceToken>,
    signed_in_at: DateTime<Utc>,
  },
  Admin {
    email:        String,
    signed_in_at: DateTime<Utc>,
  },
}

impl Identity {
  /// Build a student identity from a freshly bound profile.
  pub fn student(profile: &Profile, device: DeviceToken) -> Self {
    Self::Student {
      roll:         profile.roll_number,
      department:   profile.department.clone(),
      profile_id:   Some(profile.profile_id),
      device_token: Some(device),
      signed_in_at: Utc::now(),
    }
  }

  pub fn admin(email: impl Into<String>) -> Self {
    Self::Admin { email: email.into(), signed_in_at: Utc::now() }
  }

  pub fn is_admin(&self) -> bool { matches!(self, Self::Admin { .. }) }

  /// The roll number, for student identities.
  pub fn roll(&self) -> Option<RollNumber> {
    match self {
      Self::Student { roll, .. } => Some(*roll),
      Self::Admin { .. } => None,
    }
  }

  pub fn signed_in_at(&self) -> DateTime<Utc> {
    match self {
      Self::Student { signed_in_at, .. } | Self::Admin { signed_in_at, .. } => {
        *signed_in_at
      }
    }
  }

  /// Short human-readable label for log lines and the portal status bar.
  pub fn label(&self) -> String {
    match self {
      Self::Student { roll, .. } => roll.to_string(),
      Self::Admin { email, .. } => email.clone(),
    }
  }
}
