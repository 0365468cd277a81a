//! Storage slots — two physical homes for one logical session payload.
//!
//! The durable slot is a file under the portal's state directory; the
//! backup is process memory. Writes go to both, reads prefer the
//! durable slot and repair it from the backup when it comes up empty.
//! Slot operations never error: a failed write is reported as `false`
//! and logged, and the caller decides whether that matters.

use std::{
  fs, io,
  path::PathBuf,
  sync::Mutex,
};

/// One physical home for the serialized session payload.
pub trait SessionSlot: Send + Sync {
  /// The stored payload, if the slot holds one.
  fn load(&self) -> Option<String>;
  /// Store `payload`. False when the slot could not take the write.
  fn save(&self, payload: &str) -> bool;
  /// Forget whatever is stored.
  fn clear(&self);
}

// ─── File slot ───────────────────────────────────────────────────────────────

/// Durable slot backed by a single file.
#[derive(Debug)]
pub struct FileSlot {
  path: PathBuf,
}

impl FileSlot {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }
}

impl SessionSlot for FileSlot {
  fn load(&self) -> Option<String> {
    let contents = fs::read_to_string(&self.path).ok()?;
    if contents.trim().is_empty() { None } else { Some(contents) }
  }

  fn save(&self, payload: &str) -> bool {
    if let Some(parent) = self.path.parent()
      && let Err(error) = fs::create_dir_all(parent)
    {
      tracing::warn!(
        %error,
        path = %self.path.display(),
        "could not create session directory"
      );
      return false;
    }
    match fs::write(&self.path, payload) {
      Ok(()) => true,
      Err(error) => {
        tracing::warn!(
          %error,
          path = %self.path.display(),
          "could not write session file"
        );
        false
      }
    }
  }

  fn clear(&self) {
    if let Err(error) = fs::remove_file(&self.path)
      && error.kind() != io::ErrorKind::NotFound
    {
      tracing::warn!(
        %error,
        path = %self.path.display(),
        "could not clear session file"
      );
    }
  }
}

// ─── Memory slot ─────────────────────────────────────────────────────────────

/// Backup slot held in process memory. Survives loss of the session
/// file while the process lives, and nothing beyond that.
#[derive(Debug, Default)]
pub struct MemorySlot {
  value: Mutex<Option<String>>,
}

impl MemorySlot {
  pub fn new() -> Self { Self::default() }
}

impl SessionSlot for MemorySlot {
  fn load(&self) -> Option<String> {
    // A poisoned lock reads as an empty slot.
    self.value.lock().ok()?.clone()
  }

  fn save(&self, payload: &str) -> bool {
    match self.value.lock() {
      Ok(mut guard) => {
        *guard = Some(payload.to_string());
        true
      }
      Err(_) => false,
    }
  }

  fn clear(&self) {
    if let Ok(mut guard) = self.value.lock() {
      *guard = None;
    }
  }
}

// ─── Slot pair ───────────────────────────────────────────────────────────────

/// The replicated pair: a durable primary and a volatile backup.
pub struct SlotPair {
  primary: Box<dyn SessionSlot>,
  backup:  Box<dyn SessionSlot>,
}

impl SlotPair {
  pub fn new(
    primary: impl SessionSlot + 'static,
    backup: impl SessionSlot + 'static,
  ) -> Self {
    Self { primary: Box::new(primary), backup: Box::new(backup) }
  }

  /// The single read path. The primary wins when it holds a value;
  /// otherwise the backup's value is returned and written back into
  /// the primary so the next read is durable again.
  pub fn read_repair(&self) -> Option<String> {
    if let Some(payload) = self.primary.load() {
      return Some(payload);
    }
    let payload = self.backup.load()?;
    if self.primary.save(&payload) {
      tracing::info!("session slot repaired from backup");
    }
    Some(payload)
  }

  /// Write `payload` to both slots. True when at least one slot took
  /// it; a session that only reached the backup lasts until the
  /// process exits, which is logged.
  pub fn save(&self, payload: &str) -> bool {
    let primary = self.primary.save(payload);
    let backup = self.backup.save(payload);
    if !primary && backup {
      tracing::warn!("session saved to the backup slot only");
    }
    primary || backup
  }

  /// Empty both slots.
  pub fn clear(&self) {
    self.primary.clear();
    self.backup.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn file_slot_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let slot = FileSlot::new(dir.path().join("session.json"));
    assert_eq!(slot.load(), None);
    assert!(slot.save("{\"role\":\"admin\"}"));
    assert_eq!(slot.load().as_deref(), Some("{\"role\":\"admin\"}"));
    slot.clear();
    assert_eq!(slot.load(), None);
    // Clearing an already-empty slot is fine.
    slot.clear();
  }

  #[test]
  fn blank_files_read_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    fs::write(&path, "  \n").unwrap();
    assert_eq!(FileSlot::new(path).load(), None);
  }

  #[test]
  fn missing_parent_directories_are_created() {
    let dir = tempfile::tempdir().unwrap();
    let slot = FileSlot::new(dir.path().join("state/docket/session.json"));
    assert!(slot.save("payload"));
    assert_eq!(slot.load().as_deref(), Some("payload"));
  }

  #[test]
  fn memory_slot_round_trips() {
    let slot = MemorySlot::new();
    assert_eq!(slot.load(), None);
    assert!(slot.save("payload"));
    assert_eq!(slot.load().as_deref(), Some("payload"));
    slot.clear();
    assert_eq!(slot.load(), None);
  }

  #[test]
  fn read_repair_refills_a_cleared_primary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let pair = SlotPair::new(FileSlot::new(path.clone()), MemorySlot::new());

    assert!(pair.save("payload"));
    fs::remove_file(&path).unwrap();

    assert_eq!(pair.read_repair().as_deref(), Some("payload"));
    // The repair rewrote the file, not just the returned value.
    assert_eq!(fs::read_to_string(&path).unwrap(), "payload");
  }

  #[test]
  fn the_primary_wins_when_both_slots_hold_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let pair = SlotPair::new(FileSlot::new(path.clone()), MemorySlot::new());

    pair.save("stale");
    fs::write(&path, "fresh").unwrap();
    assert_eq!(pair.read_repair().as_deref(), Some("fresh"));
  }

  #[test]
  fn save_fails_only_when_both_slots_refuse() {
    let dir = tempfile::tempdir().unwrap();
    // A file where the parent directory should be makes the file slot
    // unwritable.
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();
    let broken = || FileSlot::new(blocker.join("session.json"));

    let half = SlotPair::new(broken(), MemorySlot::new());
    assert!(half.save("payload"));
    assert_eq!(half.read_repair().as_deref(), Some("payload"));

    let none = SlotPair::new(broken(), broken());
    assert!(!none.save("payload"));
  }

  #[test]
  fn clear_empties_both_slots() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let pair = SlotPair::new(FileSlot::new(path.clone()), MemorySlot::new());

    pair.save("payload");
    pair.clear();
    assert!(!path.exists());
    assert_eq!(pair.read_repair(), None);
  }
}
