//! Device fingerprinting.
//!
//! Each roll number is bound to the first device it signs in from. The
//! fingerprint is a SHA-256 over stable, locally observable machine and
//! account traits — deterministic on one installation, but neither
//! globally unique nor secret. It identifies a device well enough to
//! enforce one-device sign-ins, nothing more.

use std::net::UdpSocket;

use docket_core::profile::DeviceToken;
use sha2::{Digest, Sha256};

/// The traits folded into a fingerprint.
///
/// Everything is read once at startup; an unreadable trait contributes
/// its absence, and the fixed field order keeps tokens stable across
/// runs either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceGlimpse {
  pub machine_id: Option<String>,
  pub hostname:   Option<String>,
  pub account:    Option<String>,
  pub os:         String,
  pub arch:       String,
  pub locale:     Option<String>,
}

impl DeviceGlimpse {
  /// Collect traits from the running system.
  pub fn capture() -> Self {
    Self {
      machine_id: read_first(&["/etc/machine-id", "/var/lib/dbus/machine-id"]),
      hostname:   read_first(&["/etc/hostname"])
        .or_else(|| env_nonempty(&["HOSTNAME", "COMPUTERNAME"])),
      account:    env_nonempty(&["USER", "USERNAME"]),
      os:         std::env::consts::OS.to_string(),
      arch:       std::env::consts::ARCH.to_string(),
      locale:     env_nonempty(&["LC_ALL", "LANG"]),
    }
  }

  /// Fold the traits into the stable token for this device.
  pub fn token(&self) -> DeviceToken {
    let parts = [
      self.machine_id.as_deref(),
      self.hostname.as_deref(),
      self.account.as_deref(),
      Some(self.os.as_str()),
      Some(self.arch.as_str()),
      self.locale.as_deref(),
    ];
    let mut hasher = Sha256::new();
    for part in parts {
      hasher.update(part.unwrap_or("-").as_bytes());
      // Unit separator keeps adjacent traits from running together.
      hasher.update([0x1f]);
    }
    DeviceToken::new(hex::encode(hasher.finalize()))
  }
}

/// Best-effort local address, reported to the service as
/// `last_seen_from` so a denied student can recognise their other
/// machine.
///
/// Connecting a UDP socket sends nothing; it only makes the OS pick the
/// outbound interface, whose address is the one we want.
pub fn observed_address() -> Option<String> {
  let socket = UdpSocket::bind(("0.0.0.0", 0)).ok()?;
  socket.connect(("8.8.8.8", 80)).ok()?;
  Some(socket.local_addr().ok()?.ip().to_string())
}

fn read_first(paths: &[&str]) -> Option<String> {
  paths.iter().find_map(|path| {
    std::fs::read_to_string(path)
      .ok()
      .map(|contents| contents.trim().to_string())
      .filter(|contents| !contents.is_empty())
  })
}

fn env_nonempty(keys: &[&str]) -> Option<String> {
  keys
    .iter()
    .find_map(|key| std::env::var(key).ok().filter(|value| !value.is_empty()))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn glimpse() -> DeviceGlimpse {
    DeviceGlimpse {
      machine_id: Some("3f9a61d2b4c84c6f9d2e7a1b5c3d8e0f".into()),
      hostname:   Some("lab-07".into()),
      account:    Some("aisha".into()),
      os:         "linux".into(),
      arch:       "x86_64".into(),
      locale:     Some("en_IN.UTF-8".into()),
    }
  }

  #[test]
  fn tokens_are_deterministic() {
    assert_eq!(glimpse().token(), glimpse().token());
  }

  #[test]
  fn any_trait_change_changes_the_token() {
    let mut other = glimpse();
    other.hostname = Some("lab-08".into());
    assert_ne!(glimpse().token(), other.token());
  }

  #[test]
  fn missing_traits_still_hash_stably() {
    let mut sparse = glimpse();
    sparse.machine_id = None;
    sparse.locale = None;
    assert_eq!(sparse.token(), sparse.clone().token());
    assert_ne!(sparse.token(), glimpse().token());
  }

  #[test]
  fn the_token_is_lowercase_hex() {
    let token = glimpse().token();
    assert_eq!(token.as_str().len(), 64);
    assert!(token.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(token.as_str(), token.as_str().to_lowercase());
  }

  #[test]
  fn capture_never_panics() {
    // Whatever this host looks like, a token comes out.
    let token = DeviceGlimpse::capture().token();
    assert_eq!(token.as_str().len(), 64);
  }
}
