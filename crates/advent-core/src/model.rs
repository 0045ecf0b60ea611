//! Core data model: puzzle identity, parts, and guess records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

use crate::classify::Verdict;

/// Puzzle part. The site calls these "level 1" and "level 2" on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Part {
    A,
    B,
}

impl Part {
    /// Wire value used in the answer POST form.
    pub fn level(&self) -> u8 {
        match self {
            Part::A => 1,
            Part::B => 2,
        }
    }

    pub fn parse(s: &str) -> Option<Part> {
        match s.trim().to_lowercase().as_str() {
            "a" | "1" => Some(Part::A),
            "b" | "2" => Some(Part::B),
            _ => None,
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::A => write!(f, "a"),
            Part::B => write!(f, "b"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("year {0} is before the first event (2015)")]
    YearOutOfRange(u16),

    #[error("day {0} is outside 1..=25")]
    DayOutOfRange(u8),
}

/// Immutable address of one puzzle-answer slot: (year, day, part, user).
///
/// `user` is an opaque token digest produced by [`user_id`]; two sessions for
/// the same account share it, so their ledgers merge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PuzzleId {
    pub year: u16,
    pub day: u8,
    pub part: Part,
    pub user: String,
}

impl PuzzleId {
    pub fn new(year: u16, day: u8, part: Part, user: impl Into<String>) -> Result<Self, IdentityError> {
        if year < 2015 {
            return Err(IdentityError::YearOutOfRange(year));
        }
        if day == 0 || day > 25 {
            return Err(IdentityError::DayOutOfRange(day));
        }
        Ok(Self {
            year,
            day,
            part,
            user: user.into(),
        })
    }

    /// Same puzzle, other part. Input and prose are shared across parts.
    pub fn sibling(&self, part: Part) -> PuzzleId {
        PuzzleId {
            part,
            ..self.clone()
        }
    }
}

impl fmt::Display for PuzzleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:02}{} ({})", self.year, self.day, self.part, self.user)
    }
}

/// Stable, opaque, loggable identifier for a session token.
pub fn user_id(session_token: &str) -> String {
    let hash = Sha256::digest(session_token.trim().as_bytes());
    hex::encode(hash)[..10].to_string()
}

/// One submitted guess and its classified verdict. Append-only per identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessRecord {
    pub value: String,
    pub verdict: Verdict,
    pub raw_message: String,
    pub submitted_at: DateTime<Utc>,
}

/// Canonical form used for equality and duplicate interception: surrounding
/// whitespace is not significant.
pub fn canonicalize(value: &str) -> String {
    value.trim().to_string()
}

/// Integer reading of a canonicalized value, when the whole string parses.
/// Bound arithmetic only applies to values where this is `Some`.
pub fn as_numeric(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

/// Equality under canonicalization: integer semantics when both sides parse,
/// exact string comparison otherwise.
pub fn values_equal(a: &str, b: &str) -> bool {
    match (as_numeric(a), as_numeric(b)) {
        (Some(x), Some(y)) => x == y,
        _ => canonicalize(a) == canonicalize(b),
    }
}

/// Storage key for a value: the `i64` rendering when it parses as an
/// integer (so "042" and "42" collide), the trimmed string otherwise.
pub fn canonical_key(value: &str) -> String {
    match as_numeric(value) {
        Some(n) => n.to_string(),
        None => canonicalize(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn puzzle_id_validates_ranges() {
        assert!(PuzzleId::new(2015, 1, Part::A, "u").is_ok());
        assert!(PuzzleId::new(2025, 25, Part::B, "u").is_ok());
        assert_eq!(
            PuzzleId::new(2014, 1, Part::A, "u"),
            Err(IdentityError::YearOutOfRange(2014))
        );
        assert_eq!(
            PuzzleId::new(2020, 0, Part::A, "u"),
            Err(IdentityError::DayOutOfRange(0))
        );
        assert_eq!(
            PuzzleId::new(2020, 26, Part::A, "u"),
            Err(IdentityError::DayOutOfRange(26))
        );
    }

    #[test]
    fn user_id_is_stable_and_short() {
        let a = user_id("53616c7465645f5f");
        let b = user_id("  53616c7465645f5f  ");
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        assert_ne!(a, user_id("other-token"));
    }

    #[test]
    fn canonicalization_trims_whitespace_only() {
        assert_eq!(canonicalize("  1300 \n"), "1300");
        assert_eq!(canonicalize("a b"), "a b");
    }

    #[test]
    fn canonical_key_collapses_integer_forms() {
        assert_eq!(canonical_key("042"), "42");
        assert_eq!(canonical_key(" -7 "), "-7");
        assert_eq!(canonical_key(" abc "), "abc");
    }

    #[test]
    fn values_compare_as_integers_when_both_parse() {
        assert!(values_equal("042", "42"));
        assert!(values_equal(" 42", "42 "));
        assert!(!values_equal("42", "43"));
        // Mixed domains fall back to exact string equality
        assert!(!values_equal("042", "4x2"));
        assert!(values_equal("abc ", " abc"));
    }
}
