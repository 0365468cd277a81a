//! Student profiles and device binding.
//!
//! A profile is the one mutable row the portal keeps per roll number. The
//! editable contact fields are updated through
//! [`upsert_profile`](crate::service::DataService::upsert_profile); the
//! device binding and suspension flag are managed exclusively by their own
//! operations and never accepted from profile edits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roll::RollNumber;

// ─── Device token ────────────────────────────────────────────────────────────

/// An opaque device fingerprint.
///
/// Tokens are only ever compared for exact equality; nothing in the portal
/// parses one. They identify an installation, not a person, and carry no
/// cryptographic weight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceToken(String);

impl DeviceToken {
  pub fn new(token: impl Into<String>) -> Self { Self(token.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl std::fmt::Display for DeviceToken {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// A student's profile row. Exactly one per roll number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
  pub profile_id:      Uuid,
  pub roll_number:     RollNumber,
  pub student_name:    Option<String>,
  pub department:      Option<String>,
  pub email:           Option<String>,
  pub phone:           Option<String>,
  /// Reference to an externally hosted photo; no binary data in the store.
  pub photo_ref:       Option<String>,
  /// The device this roll number is bound to, if any. Set at most once by
  /// [`bind_device`](crate::service::DataService::bind_device); cleared only
  /// by an admin reset.
  pub device_token:    Option<DeviceToken>,
  pub device_bound_at: Option<DateTime<Utc>>,
  /// Free-text descriptor of where the profile last signed in from
  /// (hostname, address). Informational only.
  pub last_seen_from:  Option<String>,
  pub suspended:       bool,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

/// Input to [`upsert_profile`](crate::service::DataService::upsert_profile).
/// Device and suspension state are managed by the store and not accepted
/// here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdate {
  pub roll_number:  RollNumber,
  pub student_name: Option<String>,
  pub department:   Option<String>,
  pub email:        Option<String>,
  pub phone:        Option<String>,
  pub photo_ref:    Option<String>,
}

impl ProfileUpdate {
  /// An update that changes nothing; upserting it just ensures the row
  /// exists.
  pub fn empty(roll: RollNumber) -> Self {
    Self {
      roll_number:  roll,
      student_name: None,
      department:   None,
      email:        None,
      phone:        None,
      photo_ref:    None,
    }
  }
}

// ─── Bind outcome ────────────────────────────────────────────────────────────

/// Result of a device-binding check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BindOutcome {
  /// The device matches the stored binding, or the roll number was unbound
  /// and is now bound to this device. Carries the post-bind profile.
  Bound {
    profile:     Profile,
    /// `true` when this very call performed the first bind.
    newly_bound: bool,
  },
  /// The roll number is already bound to a different device. The stored
  /// binding is untouched.
  Mismatch {
    bound_at:       Option<DateTime<Utc>>,
    last_seen_from: Option<String>,
  },
}

impl BindOutcome {
  pub fn is_bound(&self) -> bool { matches!(self, Self::Bound { .. }) }
}
