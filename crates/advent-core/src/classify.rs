//! Response classifier: raw server reply text -> structured verdict.
//!
//! Matching is substring-based on stable phrases so minor wording changes on
//! the server side don't break classification. Unrecognized text is a hard
//! error, never a guess: misreading a reply as "correct" or "safe to retry"
//! is worse than failing.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

/// Backoff to report when the server asks us to wait but gives no duration.
pub const DEFAULT_BACKOFF_SECS: u64 = 300;

/// Classified outcome of a submission response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Correct,
    /// Wrong, and the guess exceeds the true answer. Numeric domains only.
    TooHigh,
    /// Wrong, and the guess is below the true answer. Numeric domains only.
    TooLow,
    /// Wrong with no directional hint.
    Incorrect,
    /// The part was already solved, independent of the guessed value.
    AlreadyComplete,
    /// Server-signaled backoff; the guess was never judged.
    RateLimited { wait_secs: u64 },
}

impl Verdict {
    /// Stable code used in persisted rows.
    pub fn code(&self) -> &'static str {
        match self {
            Verdict::Correct => "correct",
            Verdict::TooHigh => "too_high",
            Verdict::TooLow => "too_low",
            Verdict::Incorrect => "incorrect",
            Verdict::AlreadyComplete => "already_complete",
            Verdict::RateLimited { .. } => "rate_limited",
        }
    }

    pub fn parse_code(code: &str) -> Option<Verdict> {
        match code {
            "correct" => Some(Verdict::Correct),
            "too_high" => Some(Verdict::TooHigh),
            "too_low" => Some(Verdict::TooLow),
            "incorrect" => Some(Verdict::Incorrect),
            "already_complete" => Some(Verdict::AlreadyComplete),
            "rate_limited" => Some(Verdict::RateLimited {
                wait_secs: DEFAULT_BACKOFF_SECS,
            }),
            _ => None,
        }
    }

    /// True for verdicts that represent a judged guess and belong in the
    /// ledger. Rate limits and already-complete replies never judged the
    /// submitted value.
    pub fn is_recordable(&self) -> bool {
        matches!(
            self,
            Verdict::Correct | Verdict::TooHigh | Verdict::TooLow | Verdict::Incorrect
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("unrecognized server response: {0:?}")]
    Unrecognized(String),
}

/// Classify raw response text into exactly one verdict.
///
/// Directional phrases win over the generic wrong-answer phrase: the server
/// says "That's not the right answer; your answer is too high", and the
/// direction is the informative half.
pub fn classify(raw: &str) -> Result<Verdict, ClassifyError> {
    let msg = raw.to_lowercase();

    if msg.contains("that's the right answer") || msg.contains("you got the right answer") {
        return Ok(Verdict::Correct);
    }
    if msg.contains("too high") {
        return Ok(Verdict::TooHigh);
    }
    if msg.contains("too low") {
        return Ok(Verdict::TooLow);
    }
    if msg.contains("not the right answer") {
        return Ok(Verdict::Incorrect);
    }
    if msg.contains("already complete") || msg.contains("solving the right level") {
        return Ok(Verdict::AlreadyComplete);
    }
    if msg.contains("answer too recently") || msg.contains("left to wait") {
        return Ok(Verdict::RateLimited {
            wait_secs: extract_wait_secs(&msg).unwrap_or(DEFAULT_BACKOFF_SECS),
        });
    }

    Err(ClassifyError::Unrecognized(truncate(raw, 200)))
}

/// Pull "you have 4m 16s left to wait" out of a rate-limit reply.
fn extract_wait_secs(msg: &str) -> Option<u64> {
    static WAIT_RE: OnceLock<Regex> = OnceLock::new();
    let re = WAIT_RE.get_or_init(|| {
        Regex::new(r"(?:(\d+)\s*m\s+)?(\d+)\s*s\b").expect("wait pattern is valid")
    });
    let caps = re.captures(msg)?;
    let minutes: u64 = caps
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    let seconds: u64 = caps.get(2)?.as_str().parse().ok()?;
    Some(minutes * 60 + seconds)
}

fn truncate(s: &str, maxlen: usize) -> String {
    if s.len() <= maxlen {
        return s.to_string();
    }
    let mut end = maxlen;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{} ... ({} bytes)", &s[..end], s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_correct() {
        assert_eq!(
            classify("That's the right answer! You are one gold star closer."),
            Ok(Verdict::Correct)
        );
    }

    #[test]
    fn classifies_directional_over_generic_wrong() {
        assert_eq!(
            classify("That's not the right answer; your answer is too high."),
            Ok(Verdict::TooHigh)
        );
        assert_eq!(
            classify("That's not the right answer; your answer is too low."),
            Ok(Verdict::TooLow)
        );
    }

    #[test]
    fn classifies_plain_incorrect() {
        assert_eq!(
            classify("That's not the right answer. Please wait one minute before trying again."),
            Ok(Verdict::Incorrect)
        );
    }

    #[test]
    fn classifies_already_complete() {
        assert_eq!(
            classify("You don't seem to be solving the right level. Did you already complete it?"),
            Ok(Verdict::AlreadyComplete)
        );
    }

    #[test]
    fn classifies_rate_limit_with_seconds() {
        assert_eq!(
            classify("You gave an answer too recently; you have 45s left to wait."),
            Ok(Verdict::RateLimited { wait_secs: 45 })
        );
    }

    #[test]
    fn classifies_rate_limit_with_minutes_and_seconds() {
        assert_eq!(
            classify("You gave an answer too recently; you have 2m 30s left to wait."),
            Ok(Verdict::RateLimited { wait_secs: 150 })
        );
    }

    #[test]
    fn rate_limit_without_duration_uses_default() {
        assert_eq!(
            classify("You gave an answer too recently."),
            Ok(Verdict::RateLimited {
                wait_secs: DEFAULT_BACKOFF_SECS
            })
        );
    }

    #[test]
    fn unrecognized_text_is_a_hard_error_never_correct() {
        let err = classify("<html>503 service unavailable</html>").unwrap_err();
        assert!(matches!(err, ClassifyError::Unrecognized(_)));
        assert!(classify("").is_err());
    }

    #[test]
    fn verdict_codes_round_trip() {
        for v in [
            Verdict::Correct,
            Verdict::TooHigh,
            Verdict::TooLow,
            Verdict::Incorrect,
            Verdict::AlreadyComplete,
        ] {
            assert_eq!(Verdict::parse_code(v.code()), Some(v));
        }
        assert_eq!(Verdict::parse_code("no_such_code"), None);
    }
}
