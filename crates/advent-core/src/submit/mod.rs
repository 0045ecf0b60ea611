//! Submission controller: the answer-submission state machine.
//!
//! Per attempt: `START -> LOCAL_CHECK -> {SHORT_CIRCUIT | NETWORK_SUBMIT}
//! -> CLASSIFY -> PERSIST -> DONE`. Local state (known answer, guess
//! history, feasibility bounds) is consulted before the network is ever
//! touched, so a known-bad or provably-impossible guess is rejected without
//! a request. A per-identity lock is held across the whole sequence.

use crate::bounds::BoundViolation;
use crate::cache::{CacheError, PuzzleCache};
use crate::classify::{classify, ClassifyError, Verdict};
use crate::ledger::{GuessLedger, LedgerError};
use crate::model::{Part, PuzzleId};
use crate::prose;
use crate::transport::{Transport, TransportError};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Where a rejection was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionSource {
    /// The server judged this guess just now.
    Network,
    /// Replayed from the ledger; the network was not contacted.
    Cache,
    /// Ruled out by bound inference; the network was not contacted.
    Bounds,
}

impl fmt::Display for RejectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionSource::Network => write!(f, "network"),
            RejectionSource::Cache => write!(f, "cache"),
            RejectionSource::Bounds => write!(f, "bound-inference"),
        }
    }
}

/// User-facing result of a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The server accepted the answer.
    Accepted { value: String },
    /// The part is solved; no submission was attempted. `answer` is `None`
    /// only when the server reported the part complete but the posted
    /// answer could not be recovered from the prose.
    AlreadySolved { answer: Option<String> },
    /// The guess is wrong (or provably wrong). `source` says who decided.
    Rejected {
        verdict: Verdict,
        message: String,
        source: RejectionSource,
    },
    /// Server-signaled backoff; nothing was recorded.
    RateLimited { wait: Duration },
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("cannot submit an empty answer")]
    EmptyValue,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Unrecognized(#[from] ClassifyError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

pub struct SubmitController {
    ledger: GuessLedger,
    cache: PuzzleCache,
    transport: Arc<dyn Transport>,
    /// One async lock per identity, held across LOCAL_CHECK..PERSIST so two
    /// callers can't both pass LOCAL_CHECK and double-submit.
    locks: Mutex<HashMap<PuzzleId, Arc<tokio::sync::Mutex<()>>>>,
}

impl SubmitController {
    pub fn new(ledger: GuessLedger, cache: PuzzleCache, transport: Arc<dyn Transport>) -> Self {
        Self {
            ledger,
            cache,
            transport,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn ledger(&self) -> &GuessLedger {
        &self.ledger
    }

    fn identity_lock(&self, id: &PuzzleId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks.entry(id.clone()).or_default().clone()
    }

    /// Submit a candidate answer for one puzzle identity.
    pub async fn submit(&self, id: &PuzzleId, value: &str) -> Result<Outcome, SubmitError> {
        if value.trim().is_empty() {
            return Err(SubmitError::EmptyValue);
        }

        let lock = self.identity_lock(id);
        let _guard = lock.lock().await;

        // LOCAL_CHECK
        if let Some(answer) = self.ledger.correct_answer(id)? {
            tracing::debug!(%id, "already solved, skipping submission");
            return Ok(Outcome::AlreadySolved {
                answer: Some(answer),
            });
        }
        if let Some(prior) = self.ledger.lookup(id, value)? {
            tracing::debug!(%id, value, "verdict served from guess history");
            return Ok(Outcome::Rejected {
                verdict: prior.verdict,
                message: prior.raw_message,
                source: RejectionSource::Cache,
            });
        }
        let bounds = self.ledger.bounds(id)?;
        if let Some(violation) = bounds.violation(value) {
            tracing::debug!(%id, value, %violation, "guess ruled out by bounds");
            return Ok(Outcome::Rejected {
                verdict: direction_of(&violation),
                message: format!("guaranteed incorrect, not submitted: value is {}", violation),
                source: RejectionSource::Bounds,
            });
        }

        // NETWORK_SUBMIT: the only state that performs I/O. Transport
        // failures surface as-is and mutate nothing.
        let raw = self.transport.post_answer(id, value).await?;

        // CLASSIFY: unrecognized text is an error, not a verdict.
        let verdict = classify(&raw)?;

        // PERSIST
        match verdict {
            Verdict::Correct => {
                self.ledger.mark_correct(id, value)?;
                self.ledger.record(id, value, verdict, &raw)?;
                Ok(Outcome::Accepted {
                    value: crate::model::canonical_key(value),
                })
            }
            Verdict::TooHigh | Verdict::TooLow | Verdict::Incorrect => {
                self.ledger.record(id, value, verdict, &raw)?;
                Ok(Outcome::Rejected {
                    verdict,
                    message: raw,
                    source: RejectionSource::Network,
                })
            }
            Verdict::AlreadyComplete => {
                // The value was never judged; do not record a guess. Recover
                // the posted answer from the prose when the page shows it.
                let answer = self.discover_posted_answer(id).await?;
                if let Some(answer) = &answer {
                    self.ledger.mark_correct(id, answer)?;
                }
                Ok(Outcome::AlreadySolved { answer })
            }
            Verdict::RateLimited { wait_secs } => Ok(Outcome::RateLimited {
                wait: Duration::from_secs(wait_secs),
            }),
        }
    }

    /// Re-fetch the prose and pull "Your puzzle answer was X" for this part.
    async fn discover_posted_answer(&self, id: &PuzzleId) -> Result<Option<String>, SubmitError> {
        let html = self
            .cache
            .refresh_prose(id, self.transport.as_ref())
            .await?;
        let answers = prose::posted_answers(&html);
        let index = match id.part {
            Part::A => 0,
            Part::B => 1,
        };
        Ok(answers.get(index).cloned())
    }
}

fn direction_of(violation: &BoundViolation) -> Verdict {
    match violation {
        BoundViolation::AtOrBelowLower { .. } => Verdict::TooLow,
        BoundViolation::AtOrAboveUpper { .. } => Verdict::TooHigh,
    }
}
