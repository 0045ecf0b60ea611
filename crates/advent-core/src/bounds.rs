//! Feasibility bounds derived from directional verdicts.
//!
//! A "too low" guess raises the exclusive lower bound, a "too high" guess
//! lowers the exclusive upper bound. Bounds only ever tighten. Values that do
//! not parse as integers are bound-exempt.

use crate::classify::Verdict;
use crate::model::{as_numeric, GuessRecord};
use std::fmt;

/// Open-interval constraint on the true numeric answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    /// Highest value classified "too low".
    pub lower_exclusive: Option<i64>,
    /// Lowest value classified "too high".
    pub upper_exclusive: Option<i64>,
}

/// Which side of the window a candidate value fell on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundViolation {
    /// `value <= lower_exclusive`: a guess at least this large was too low.
    AtOrBelowLower { bound: i64 },
    /// `value >= upper_exclusive`: a guess at most this large was too high.
    AtOrAboveUpper { bound: i64 },
}

impl fmt::Display for BoundViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundViolation::AtOrBelowLower { bound } => {
                write!(f, "at or below known-too-low bound {}", bound)
            }
            BoundViolation::AtOrAboveUpper { bound } => {
                write!(f, "at or above known-too-high bound {}", bound)
            }
        }
    }
}

impl Bounds {
    /// Fold an identity's guess history into its feasibility window.
    /// Pure function of the ledger; recomputed on each read.
    pub fn derive(records: &[GuessRecord]) -> Bounds {
        let mut bounds = Bounds::default();
        for rec in records {
            let Some(n) = as_numeric(&rec.value) else {
                continue;
            };
            match rec.verdict {
                Verdict::TooLow => {
                    bounds.lower_exclusive = Some(bounds.lower_exclusive.map_or(n, |l| l.max(n)));
                }
                Verdict::TooHigh => {
                    bounds.upper_exclusive = Some(bounds.upper_exclusive.map_or(n, |u| u.min(n)));
                }
                _ => {}
            }
        }
        bounds
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower_exclusive.is_none() && self.upper_exclusive.is_none()
    }

    /// True iff the value is non-numeric, bounds are unset, or the integer
    /// lies strictly inside the open interval.
    pub fn is_feasible(&self, value: &str) -> bool {
        self.violation(value).is_none()
    }

    /// Name the violated bound for a candidate value, if any.
    pub fn violation(&self, value: &str) -> Option<BoundViolation> {
        let n = as_numeric(value)?;
        if let Some(l) = self.lower_exclusive {
            if n <= l {
                return Some(BoundViolation::AtOrBelowLower { bound: l });
            }
        }
        if let Some(u) = self.upper_exclusive {
            if n >= u {
                return Some(BoundViolation::AtOrAboveUpper { bound: u });
            }
        }
        None
    }
}
