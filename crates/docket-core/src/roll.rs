//! Roll numbers — the primary student identifier.
//!
//! A roll number is the letter `D` followed by six digits, and the numeric
//! part must fall inside the admitted cohort range. Parsing is forgiving
//! about case and surrounding whitespace; the canonical form is always
//! upper-case.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a raw string failed to parse as a [`RollNumber`].
///
/// The `Display` strings double as user-facing form feedback, so they are
/// worded as instructions rather than diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RollError {
  #[error("Roll number must be the letter D followed by 6 digits")]
  Malformed,

  #[error(
    "Roll number must be between D{} and D{}",
    RollNumber::MIN,
    RollNumber::MAX
  )]
  OutOfRange,
}

/// A validated roll number in canonical form.
///
/// Internally just the numeric part; `Display` re-attaches the `D` prefix
/// and zero-pads, so ordering and equality are numeric. Serialises as the
/// canonical string (`"D234105"`) and re-validates on deserialisation, so a
/// `RollNumber` obtained from any source is well-formed.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct RollNumber(u32);

impl RollNumber {
  /// Smallest admissible numeric part.
  pub const MIN: u32 = 234_101;
  /// Largest admissible numeric part.
  pub const MAX: u32 = 234_160;

  /// Parse and canonicalise a raw roll number.
  ///
  /// Surrounding whitespace is ignored and a lower-case `d` prefix is
  /// accepted, so `" d234105 "` parses to `D234105`.
  pub fn parse(raw: &str) -> Result<Self, RollError> {
    let digits = raw
      .trim()
      .strip_prefix(['D', 'd'])
      .ok_or(RollError::Malformed)?;

    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_digit()) {
      return Err(RollError::Malformed);
    }

    let numeric: u32 = digits.parse().map_err(|_| RollError::Malformed)?;
    if !(Self::MIN..=Self::MAX).contains(&numeric) {
      return Err(RollError::OutOfRange);
    }

    Ok(Self(numeric))
  }

  /// The numeric part, e.g. `234105` for `D234105`.
  pub fn numeric(&self) -> u32 { self.0 }
}

impl fmt::Display for RollNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "D{:06}", self.0)
  }
}

impl FromStr for RollNumber {
  type Err = RollError;

  fn from_str(s: &str) -> Result<Self, Self::Err> { Self::parse(s) }
}

impl TryFrom<String> for RollNumber {
  type Error = RollError;

  fn try_from(s: String) -> Result<Self, Self::Error> { Self::parse(&s) }
}

impl From<RollNumber> for String {
  fn from(roll: RollNumber) -> String { roll.to_string() }
}

/// An inclusive roll-number range, used to scope admin listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollRange {
  pub from: RollNumber,
  pub to:   RollNumber,
}

impl RollRange {
  /// The whole admissible cohort.
  pub fn cohort() -> Self {
    Self {
      from: RollNumber(RollNumber::MIN),
      to:   RollNumber(RollNumber::MAX),
    }
  }

  pub fn contains(&self, roll: RollNumber) -> bool {
    (self.from..=self.to).contains(&roll)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn canonical_roll_parses() {
    let roll = RollNumber::parse("D234105").unwrap();
    assert_eq!(roll.to_string(), "D234105");
    assert_eq!(roll.numeric(), 234_105);
  }

  #[test]
  fn lowercase_and_whitespace_are_normalised() {
    let roll = RollNumber::parse("  d234160\n").unwrap();
    assert_eq!(roll.to_string(), "D234160");
  }

  #[test]
  fn range_endpoints_are_inclusive() {
    assert!(RollNumber::parse("D234101").is_ok());
    assert!(RollNumber::parse("D234160").is_ok());
  }

  #[test]
  fn out_of_range_uses_the_exact_feedback_string() {
    let err = RollNumber::parse("D234161").unwrap_err();
    assert_eq!(err, RollError::OutOfRange);
    assert_eq!(
      err.to_string(),
      "Roll number must be between D234101 and D234160"
    );

    assert_eq!(
      RollNumber::parse("D234100").unwrap_err(),
      RollError::OutOfRange
    );
  }

  #[test]
  fn malformed_inputs_are_rejected() {
    for raw in ["", "234105", "D23410", "D2341050", "Dabcdef", "E234105"] {
      assert_eq!(RollNumber::parse(raw).unwrap_err(), RollError::Malformed);
    }
  }

  #[test]
  fn serde_rejects_tampered_strings() {
    let roll: RollNumber = serde_json::from_str("\"d234110\"").unwrap();
    assert_eq!(serde_json::to_string(&roll).unwrap(), "\"D234110\"");

    assert!(serde_json::from_str::<RollNumber>("\"D999999\"").is_err());
  }

  #[test]
  fn roll_range_contains_is_inclusive() {
    let range = RollRange {
      from: RollNumber::parse("D234110").unwrap(),
      to:   RollNumber::parse("D234120").unwrap(),
    };
    assert!(range.contains(RollNumber::parse("D234110").unwrap()));
    assert!(range.contains(RollNumber::parse("D234120").unwrap()));
    assert!(!range.contains(RollNumber::parse("D234121").unwrap()));
  }
}
