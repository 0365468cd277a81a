//! Intake moderation — a plain substring scan over user-entered text.
//!
//! Deliberately a tripwire, not a language model: the scan is
//! case-insensitive and matches anywhere in the text, so hits embedded in
//! longer words are flagged too. The list errs on the side of short.

use crate::error::Error;

/// Words that block a submission outright.
const DISALLOWED: &[&str] = &[
  "stupid", "idiot", "nonsense", "rubbish", "useless", "worthless", "dumb",
  "garbage", "trash", "fraud", "scam", "cheat", "fake", "bloody", "damn",
  "shut up", "fool", "moron", "pathetic",
];

/// Return the first disallowed word found in `text`, if any.
pub fn find_disallowed(text: &str) -> Option<&'static str> {
  let lowered = text.to_lowercase();
  DISALLOWED.iter().copied().find(|word| lowered.contains(word))
}

/// Validate one named field, mapping a hit to [`Error::DisallowedWord`].
pub fn check(field: &'static str, text: &str) -> crate::Result<()> {
  match find_disallowed(text) {
    Some(word) => Err(Error::DisallowedWord { field, word }),
    None => Ok(()),
  }
}
