//! [`SessionStore`] — owns the persisted identity and tells watchers
//! when it changes.

use std::{path::PathBuf, sync::Arc, time::Duration};

use docket_core::identity::Identity;
use tokio::sync::watch;

use crate::{
  Error, Result,
  slots::{FileSlot, MemorySlot, SlotPair},
};

/// One logical identity, replicated across a slot pair.
///
/// All mutation goes through this type, so within a process the slot
/// contents and the watch value always move together, in call order.
/// Other processes only show up through [`refresh`](Self::refresh).
pub struct SessionStore {
  slots:   SlotPair,
  current: watch::Sender<Option<Identity>>,
}

impl SessionStore {
  /// Wrap a slot pair, loading whatever identity it already holds.
  pub fn new(slots: SlotPair) -> Self {
    let (current, _) = watch::channel(None);
    let store = Self { slots, current };
    let initial = store.read_identity();
    store.current.send_replace(initial);
    store
  }

  /// The conventional layout: `session.json` under `state_dir` as the
  /// durable slot, process memory as the backup.
  pub fn open(state_dir: impl Into<PathBuf>) -> Self {
    let path = state_dir.into().join("session.json");
    Self::new(SlotPair::new(FileSlot::new(path), MemorySlot::new()))
  }

  /// Serialize `identity` into both slots and notify watchers.
  pub fn persist(&self, identity: &Identity) -> Result<()> {
    let payload =
      serde_json::to_string(identity).map_err(|_| Error::Session)?;
    if !self.slots.save(&payload) {
      return Err(Error::Session);
    }
    tracing::info!(who = %identity.label(), "session persisted");
    self.current.send_replace(Some(identity.clone()));
    Ok(())
  }

  /// The identity the slots currently hold, if any.
  ///
  /// A malformed payload — unknown role tag, missing identifying
  /// field, roll number outside the cohort — reads as "signed out":
  /// both slots are cleared and `None` comes back. Never an error.
  pub fn current_identity(&self) -> Option<Identity> { self.read_identity() }

  /// True when the stored identity is an admin.
  pub fn is_admin(&self) -> bool {
    self.current.borrow().as_ref().is_some_and(Identity::is_admin)
  }

  /// Empty both slots and notify watchers that nobody is signed in.
  pub fn invalidate(&self) {
    self.slots.clear();
    tracing::info!("session cleared");
    self.current.send_replace(None);
  }

  /// Re-read the slots, publishing only if the identity changed.
  /// Cheap enough to call every time the portal regains focus.
  pub fn refresh(&self) {
    let fresh = self.read_identity();
    self.current.send_if_modified(|current| {
      if *current == fresh {
        false
      } else {
        *current = fresh;
        true
      }
    });
  }

  /// Watch the identity as it changes. The receiver starts out holding
  /// the value at subscription time.
  pub fn watch(&self) -> watch::Receiver<Option<Identity>> {
    self.current.subscribe()
  }

  /// Poll the slots every `interval` for changes made outside this
  /// process. The task ends when the store is dropped.
  pub fn spawn_refresh_task(
    self: &Arc<Self>,
    interval: Duration,
  ) -> tokio::task::JoinHandle<()> {
    let store = Arc::downgrade(self);
    tokio::spawn(async move {
      let mut ticker = tokio::time::interval(interval);
      ticker.tick().await; // the first tick fires immediately
      loop {
        ticker.tick().await;
        match store.upgrade() {
          Some(store) => store.refresh(),
          None => return,
        }
      }
    })
  }

  fn read_identity(&self) -> Option<Identity> {
    let payload = self.slots.read_repair()?;
    match serde_json::from_str(&payload) {
      Ok(identity) => Some(identity),
      Err(error) => {
        // Corruption is a silent sign-out, not a user-visible failure.
        tracing::warn!(%error, "discarding malformed session payload");
        self.slots.clear();
        None
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use docket_core::profile::DeviceToken;

  use super::*;

  fn student() -> Identity {
    let raw = r#"{
      "role": "student",
      "roll": "D234105",
      "department": "Computer Engineering",
      "signed_in_at": "2026-06-01T09:30:00Z"
    }"#;
    serde_json::from_str(raw).unwrap()
  }

  fn store_in(dir: &tempfile::TempDir) -> SessionStore {
    SessionStore::open(dir.path())
  }

  #[test]
  fn persist_then_current_returns_the_same_identity() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let identity = student();

    store.persist(&identity).unwrap();
    assert_eq!(store.current_identity(), Some(identity));
  }

  #[test]
  fn the_backup_restores_a_cleared_durable_slot() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let identity = student();
    store.persist(&identity).unwrap();

    let path = dir.path().join("session.json");
    fs::remove_file(&path).unwrap();

    assert_eq!(store.current_identity(), Some(identity));
    // Read-repair rewrote the file.
    assert!(path.exists());
  }

  #[test]
  fn invalidate_empties_both_slots() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.persist(&student()).unwrap();

    store.invalidate();
    assert_eq!(store.current_identity(), None);
    assert!(!dir.path().join("session.json").exists());

    // A fresh store over the same directory sees nothing either.
    assert_eq!(store_in(&dir).current_identity(), None);
  }

  #[test]
  fn malformed_payloads_read_as_signed_out() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    fs::write(&path, r#"{"role":"superuser","email":"x@example.edu"}"#)
      .unwrap();

    let store = store_in(&dir);
    assert_eq!(store.current_identity(), None);
    // The corrupt payload was discarded, not left to fail again.
    assert!(!path.exists());
  }

  #[test]
  fn out_of_range_roll_in_storage_is_corruption_too() {
    let dir = tempfile::tempdir().unwrap();
    let raw = r#"{
      "role": "student",
      "roll": "D233999",
      "signed_in_at": "2026-06-01T09:30:00Z"
    }"#;
    fs::write(dir.path().join("session.json"), raw).unwrap();

    assert_eq!(store_in(&dir).current_identity(), None);
  }

  #[test]
  fn a_store_picks_up_the_identity_it_was_opened_over() {
    let dir = tempfile::tempdir().unwrap();
    let identity = Identity::Student {
      roll:         "D234110".parse().unwrap(),
      department:   None,
      profile_id:   None,
      device_token: Some(DeviceToken::new("device-a")),
      signed_in_at: "2026-06-01T09:30:00Z".parse().unwrap(),
    };
    store_in(&dir).persist(&identity).unwrap();

    assert_eq!(store_in(&dir).current_identity(), Some(identity));
  }

  #[tokio::test]
  async fn watchers_follow_persist_and_invalidate() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let mut rx = store.watch();
    assert_eq!(*rx.borrow_and_update(), None);

    let identity = student();
    store.persist(&identity).unwrap();
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), Some(identity));

    store.invalidate();
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), None);
  }

  #[test]
  fn refresh_publishes_external_changes_only() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.persist(&student()).unwrap();

    let mut rx = store.watch();
    rx.borrow_and_update();

    // Nothing changed underneath us: no wakeup.
    store.refresh();
    assert!(!rx.has_changed().unwrap());

    // Another process signs in as someone else.
    let other = Identity::admin("husna.kazi@theemcoe.org");
    let payload = serde_json::to_string(&other).unwrap();
    fs::write(dir.path().join("session.json"), payload).unwrap();

    store.refresh();
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), Some(other));
  }
}
