//! Error taxonomy for the login and session flows.
//!
//! Four failure classes, each with its own recovery story: validation
//! (user corrects the input and retries), access denial (an admin must
//! intervene out of band), service trouble (the user re-triggers the
//! operation; nothing is retried automatically), and session
//! persistence. Storage corruption is deliberately *not* here — the
//! store treats a malformed payload as "signed out" and never surfaces
//! it.

use chrono::{DateTime, Utc};
use docket_core::roll::RollError;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything a login or session operation can fail with.
#[derive(Debug, Error)]
pub enum Error {
  /// The roll number failed format or range validation. Raised before
  /// anything leaves the process.
  #[error(transparent)]
  Roll(#[from] RollError),

  /// The roll number is already bound to a different device.
  ///
  /// Carries whatever the service knows about the holder so the user
  /// can recognise their own other machine.
  #[error("This roll number is registered to another device")]
  DeviceMismatch {
    bound_at:       Option<DateTime<Utc>>,
    last_seen_from: Option<String>,
  },

  /// The profile is suspended; sign-in is refused until an admin lifts
  /// the flag.
  #[error("This account is suspended")]
  Suspended,

  /// Wrong email or wrong password — deliberately indistinguishable.
  #[error("Invalid admin credentials")]
  BadAdminCredentials,

  /// Neither session slot took the write.
  #[error("could not persist the session")]
  Session,

  /// The data service failed or was unreachable. Local state is left
  /// untouched.
  #[error("service error: {0}")]
  Service(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// The notification the portal shows for this failure.
  ///
  /// Validation problems come back verbatim as warnings; denials come
  /// back verbatim as errors. Service and persistence failures get a
  /// fixed message — the underlying detail goes to the log, not the
  /// status bar.
  pub fn toast(&self) -> Toast {
    match self {
      Self::Roll(roll) => Toast::warning(roll.to_string()),
      Self::DeviceMismatch { bound_at, last_seen_from } => {
        let mut details = Vec::new();
        if let Some(at) = bound_at {
          details.push(format!("registered {}", at.format("%Y-%m-%d %H:%M")));
        }
        if let Some(from) = last_seen_from {
          details.push(format!("last seen from {from}"));
        }
        let mut message = self.to_string();
        if !details.is_empty() {
          message.push_str(&format!(" ({})", details.join(", ")));
        }
        Toast::error(message)
      }
      Self::Suspended | Self::BadAdminCredentials => {
        Toast::error(self.to_string())
      }
      Self::Session => {
        Toast::error("Could not save your session on this device")
      }
      Self::Service(_) => {
        Toast::error("Service unavailable. Nothing was changed; try again.")
      }
    }
  }
}

// ─── Toasts ──────────────────────────────────────────────────────────────────

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
  Info,
  Warning,
  Error,
}

/// A user-facing notification.
///
/// The portal renders these in its status bar. Every failure in this
/// crate converts to one; nothing panics or exits instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
  pub level:   ToastLevel,
  pub message: String,
}

impl Toast {
  pub fn info(message: impl Into<String>) -> Self {
    Self { level: ToastLevel::Info, message: message.into() }
  }

  pub fn warning(message: impl Into<String>) -> Self {
    Self { level: ToastLevel::Warning, message: message.into() }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self { level: ToastLevel::Error, message: message.into() }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn admin_denial_is_generic() {
    assert_eq!(
      Error::BadAdminCredentials.to_string(),
      "Invalid admin credentials"
    );
  }

  #[test]
  fn mismatch_toast_names_the_holding_device() {
    let err = Error::DeviceMismatch {
      bound_at:       Some(Utc.with_ymd_and_hms(2026, 2, 3, 10, 11, 0).unwrap()),
      last_seen_from: Some("10.4.22.17".into()),
    };
    let toast = err.toast();
    assert_eq!(toast.level, ToastLevel::Error);
    assert!(toast.message.contains("registered 2026-02-03 10:11"));
    assert!(toast.message.contains("last seen from 10.4.22.17"));
  }

  #[test]
  fn mismatch_toast_without_details_stays_clean() {
    let err =
      Error::DeviceMismatch { bound_at: None, last_seen_from: None };
    assert_eq!(
      err.toast().message,
      "This roll number is registered to another device"
    );
  }

  #[test]
  fn service_toast_does_not_leak_the_cause() {
    let inner = std::io::Error::other("ECONNREFUSED");
    let toast = Error::Service(Box::new(inner)).toast();
    assert!(!toast.message.contains("ECONNREFUSED"));
  }

  #[test]
  fn roll_problems_are_warnings() {
    let toast = Error::Roll(RollError::Malformed).toast();
    assert_eq!(toast.level, ToastLevel::Warning);
  }
}
