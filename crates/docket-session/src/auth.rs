//! Sign-in and sign-out flows.
//!
//! [`AuthFlow`] sits between the portal UI and a [`DataService`]: it
//! validates input locally, performs the device-binding handshake, and
//! persists the resulting identity into the session store. Every
//! failure comes back as a [`crate::Error`] for the caller to toast;
//! nothing here panics or exits.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use docket_core::{
  identity::Identity,
  profile::{BindOutcome, DeviceToken},
  roll::RollNumber,
  service::DataService,
};

use crate::{Error, Result, device::observed_address, store::SessionStore};

/// The one admin credential pair accepted per deployment.
#[derive(Clone)]
pub struct AdminConfig {
  pub email:         String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Drives sign-in and sign-out against a data service and a session
/// store.
pub struct AuthFlow<S> {
  service: S,
  session: Arc<SessionStore>,
  device:  DeviceToken,
  admin:   AdminConfig,
}

impl<S: DataService> AuthFlow<S> {
  pub fn new(
    service: S,
    session: Arc<SessionStore>,
    device: DeviceToken,
    admin: AdminConfig,
  ) -> Self {
    Self { service, session, device, admin }
  }

  /// The fingerprint this flow signs students in with.
  pub fn device(&self) -> &DeviceToken { &self.device }

  /// Student sign-in: validate the roll number, bind the device, check
  /// suspension, persist. Idempotent once a device holds the binding.
  ///
  /// A malformed or out-of-range roll number fails before anything
  /// leaves the process. A denial leaves the session store untouched.
  pub async fn login_student(&self, raw_roll: &str) -> Result<Identity> {
    let roll = RollNumber::parse(raw_roll)?;

    let outcome = self
      .service
      .bind_device(roll, self.device.clone(), observed_address())
      .await
      .map_err(|e| Error::Service(Box::new(e)))?;

    let profile = match outcome {
      BindOutcome::Bound { profile, newly_bound } => {
        if newly_bound {
          tracing::info!(%roll, "device bound on first sign-in");
        }
        profile
      }
      BindOutcome::Mismatch { bound_at, last_seen_from } => {
        tracing::warn!(%roll, "sign-in denied: device mismatch");
        return Err(Error::DeviceMismatch { bound_at, last_seen_from });
      }
    };

    if profile.suspended {
      tracing::warn!(%roll, "sign-in denied: account suspended");
      return Err(Error::Suspended);
    }

    let identity = Identity::student(&profile, self.device.clone());
    self.session.persist(&identity)?;
    Ok(identity)
  }

  /// Admin sign-in: exact email match plus argon2 verification. Which
  /// half failed is never revealed.
  pub fn login_admin(&self, email: &str, password: &str) -> Result<Identity> {
    if email.trim() != self.admin.email {
      return Err(Error::BadAdminCredentials);
    }

    let parsed_hash = PasswordHash::new(&self.admin.password_hash)
      .map_err(|_| Error::BadAdminCredentials)?;
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed_hash)
      .map_err(|_| Error::BadAdminCredentials)?;

    let identity = Identity::admin(self.admin.email.clone());
    self.session.persist(&identity)?;
    tracing::info!("admin signed in");
    Ok(identity)
  }

  /// Sign out. Clears the session; server-side state (the device
  /// binding included) is untouched.
  pub fn logout(&self) { self.session.invalidate(); }
}
