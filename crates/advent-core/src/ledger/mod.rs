//! GuessLedger: SQLite-backed, append-only guess history per puzzle identity.
//!
//! The ledger is the only defense against re-submitting a guess the server
//! has already judged, so every write commits before the call returns:
//! `synchronous=FULL`, explicit transactions, no buffering.

pub mod schema;

use crate::bounds::Bounds;
use crate::classify::Verdict;
use crate::model::{canonical_key, GuessRecord, PuzzleId};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use schema::LEDGER_SCHEMA;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("guess {value:?} already recorded for {id}")]
    DuplicateGuess { id: String, value: String },

    #[error("conflicting correct answer for {id}: stored {existing:?}, refusing to overwrite with {new:?}")]
    AnswerConflict {
        id: String,
        existing: String,
        new: String,
    },

    #[error("verdict {0:?} does not represent a judged guess")]
    UnrecordableVerdict(&'static str),

    #[error("database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for LedgerError {
    fn from(e: rusqlite::Error) -> Self {
        LedgerError::Database(e.to_string())
    }
}

/// SQLite-backed guess ledger. Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct GuessLedger {
    conn: Arc<Mutex<Connection>>,
}

impl GuessLedger {
    /// Open a file-backed ledger, creating the schema if needed.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let conn = Connection::open(path)?;
        Self::init_connection(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory ledger (for testing).
    pub fn memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_connection(conn: &Connection) -> Result<(), LedgerError> {
        // WAL is a no-op for in-memory DBs; FULL sync makes commits durable
        // before control returns to the caller. Racing writers wait on the
        // busy handler instead of failing fast.
        let _ = conn.execute("PRAGMA journal_mode = WAL", []);
        conn.execute("PRAGMA synchronous = FULL", [])?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(LEDGER_SCHEMA)?;
        Ok(())
    }

    /// Append a guess record. Fails with `DuplicateGuess` if the
    /// canonicalized value already has a record for this identity; callers
    /// are expected to `lookup` first and treat this as a logic error.
    pub fn record(
        &self,
        id: &PuzzleId,
        value: &str,
        verdict: Verdict,
        raw_message: &str,
    ) -> Result<GuessRecord, LedgerError> {
        if !verdict.is_recordable() {
            return Err(LedgerError::UnrecordableVerdict(verdict.code()));
        }
        let key = canonical_key(value);
        let conn = self.conn.lock().unwrap();

        // BEGIN IMMEDIATE acquires the write lock up front so the
        // check-then-insert below is atomic across connections.
        conn.execute("BEGIN IMMEDIATE", [])?;
        let result = Self::record_inner(&conn, id, &key, verdict, raw_message);
        match &result {
            Ok(_) => {
                conn.execute("COMMIT", [])?;
            }
            Err(_) => {
                let _ = conn.execute("ROLLBACK", []);
            }
        }
        result
    }

    fn record_inner(
        conn: &Connection,
        id: &PuzzleId,
        key: &str,
        verdict: Verdict,
        raw_message: &str,
    ) -> Result<GuessRecord, LedgerError> {
        let submitted_at = Utc::now();
        let inserted = conn.execute(
            r#"
            INSERT INTO guesses (year, day, part, user, value, verdict, raw_message, submitted_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(year, day, part, user, value) DO NOTHING
            "#,
            params![
                id.year,
                id.day,
                id.part.to_string(),
                id.user,
                key,
                verdict.code(),
                raw_message,
                submitted_at.to_rfc3339(),
            ],
        )?;
        if inserted == 0 {
            return Err(LedgerError::DuplicateGuess {
                id: id.to_string(),
                value: key.to_string(),
            });
        }
        tracing::debug!(%id, value = %key, verdict = verdict.code(), "recorded guess");
        Ok(GuessRecord {
            value: key.to_string(),
            verdict,
            raw_message: raw_message.to_string(),
            submitted_at,
        })
    }

    /// The existing record for this canonicalized value, if any.
    pub fn lookup(&self, id: &PuzzleId, value: &str) -> Result<Option<GuessRecord>, LedgerError> {
        let key = canonical_key(value);
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                r#"
                SELECT value, verdict, raw_message, submitted_at FROM guesses
                WHERE year = ?1 AND day = ?2 AND part = ?3 AND user = ?4 AND value = ?5
                "#,
                params![id.year, id.day, id.part.to_string(), id.user, key],
                row_to_record,
            )
            .optional()?;
        Ok(row)
    }

    /// Insertion-ordered guess history for one identity.
    pub fn guesses(&self, id: &PuzzleId) -> Result<Vec<GuessRecord>, LedgerError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT value, verdict, raw_message, submitted_at FROM guesses
            WHERE year = ?1 AND day = ?2 AND part = ?3 AND user = ?4
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(
            params![id.year, id.day, id.part.to_string(), id.user],
            row_to_record,
        )?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    /// Feasibility window derived from this identity's directional verdicts.
    pub fn bounds(&self, id: &PuzzleId) -> Result<Bounds, LedgerError> {
        Ok(Bounds::derive(&self.guesses(id)?))
    }

    /// Set the identity's correct answer. Idempotent for the same value;
    /// a different stored answer is a data-integrity violation and aborts.
    pub fn mark_correct(&self, id: &PuzzleId, value: &str) -> Result<(), LedgerError> {
        let key = canonical_key(value);
        let conn = self.conn.lock().unwrap();

        conn.execute("BEGIN IMMEDIATE", [])?;
        let result = Self::mark_correct_inner(&conn, id, &key);
        match &result {
            Ok(_) => {
                conn.execute("COMMIT", [])?;
            }
            Err(_) => {
                let _ = conn.execute("ROLLBACK", []);
            }
        }
        result
    }

    fn mark_correct_inner(conn: &Connection, id: &PuzzleId, key: &str) -> Result<(), LedgerError> {
        let existing: Option<String> = conn
            .query_row(
                "SELECT value FROM answers WHERE year = ?1 AND day = ?2 AND part = ?3 AND user = ?4",
                params![id.year, id.day, id.part.to_string(), id.user],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(existing) = existing {
            if existing == key {
                return Ok(());
            }
            return Err(LedgerError::AnswerConflict {
                id: id.to_string(),
                existing,
                new: key.to_string(),
            });
        }

        conn.execute(
            r#"
            INSERT INTO answers (year, day, part, user, value, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                id.year,
                id.day,
                id.part.to_string(),
                id.user,
                key,
                Utc::now().to_rfc3339(),
            ],
        )?;
        tracing::info!(%id, answer = %key, "recorded correct answer");
        Ok(())
    }

    /// The stored correct answer, if known.
    pub fn correct_answer(&self, id: &PuzzleId) -> Result<Option<String>, LedgerError> {
        let conn = self.conn.lock().unwrap();
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM answers WHERE year = ?1 AND day = ?2 AND part = ?3 AND user = ?4",
                params![id.year, id.day, id.part.to_string(), id.user],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<GuessRecord> {
    let verdict_code: String = row.get(1)?;
    let submitted_at: String = row.get(3)?;
    Ok(GuessRecord {
        value: row.get(0)?,
        verdict: Verdict::parse_code(&verdict_code).unwrap_or(Verdict::Incorrect),
        raw_message: row.get(2)?,
        submitted_at: DateTime::parse_from_rfc3339(&submitted_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Part;

    fn id() -> PuzzleId {
        PuzzleId::new(2015, 24, Part::A, "u1").unwrap()
    }

    // === Record / lookup ===

    #[test]
    fn record_then_lookup_round_trips() {
        let ledger = GuessLedger::memory().unwrap();
        ledger
            .record(&id(), "1300", Verdict::TooHigh, "too high")
            .unwrap();

        let rec = ledger.lookup(&id(), "1300").unwrap().unwrap();
        assert_eq!(rec.value, "1300");
        assert_eq!(rec.verdict, Verdict::TooHigh);
        assert_eq!(rec.raw_message, "too high");
    }

    #[test]
    fn lookup_uses_canonicalized_values() {
        let ledger = GuessLedger::memory().unwrap();
        ledger
            .record(&id(), " 42 ", Verdict::Incorrect, "wrong")
            .unwrap();

        assert!(ledger.lookup(&id(), "42").unwrap().is_some());
        assert!(ledger.lookup(&id(), "042").unwrap().is_some());
        assert!(ledger.lookup(&id(), "43").unwrap().is_none());
    }

    #[test]
    fn duplicate_record_is_rejected() {
        let ledger = GuessLedger::memory().unwrap();
        ledger
            .record(&id(), "42", Verdict::Incorrect, "wrong")
            .unwrap();

        let err = ledger
            .record(&id(), "  42", Verdict::Incorrect, "wrong again")
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateGuess { value, .. } if value == "42"));

        // History still holds exactly one record
        assert_eq!(ledger.guesses(&id()).unwrap().len(), 1);
    }

    #[test]
    fn records_are_scoped_to_identity() {
        let ledger = GuessLedger::memory().unwrap();
        let other_part = id().sibling(Part::B);
        let other_user = PuzzleId::new(2015, 24, Part::A, "u2").unwrap();

        ledger
            .record(&id(), "42", Verdict::Incorrect, "wrong")
            .unwrap();

        assert!(ledger.lookup(&other_part, "42").unwrap().is_none());
        assert!(ledger.lookup(&other_user, "42").unwrap().is_none());
    }

    #[test]
    fn guesses_preserve_insertion_order() {
        let ledger = GuessLedger::memory().unwrap();
        for (v, verdict) in [
            ("10", Verdict::TooLow),
            ("30", Verdict::TooHigh),
            ("20", Verdict::Incorrect),
        ] {
            ledger.record(&id(), v, verdict, "msg").unwrap();
        }
        let values: Vec<String> = ledger
            .guesses(&id())
            .unwrap()
            .into_iter()
            .map(|r| r.value)
            .collect();
        assert_eq!(values, ["10", "30", "20"]);
    }

    #[test]
    fn rate_limited_verdicts_are_not_recordable() {
        let ledger = GuessLedger::memory().unwrap();
        let err = ledger
            .record(
                &id(),
                "5",
                Verdict::RateLimited { wait_secs: 45 },
                "too recently",
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnrecordableVerdict(_)));
        assert!(ledger.guesses(&id()).unwrap().is_empty());
    }

    // === Correct answers ===

    #[test]
    fn mark_correct_round_trips_and_is_idempotent() {
        let ledger = GuessLedger::memory().unwrap();
        assert_eq!(ledger.correct_answer(&id()).unwrap(), None);

        ledger.mark_correct(&id(), "42").unwrap();
        ledger.mark_correct(&id(), " 42 ").unwrap();
        assert_eq!(ledger.correct_answer(&id()).unwrap(), Some("42".into()));
    }

    #[test]
    fn conflicting_answer_aborts_instead_of_overwriting() {
        let ledger = GuessLedger::memory().unwrap();
        ledger.mark_correct(&id(), "42").unwrap();

        let err = ledger.mark_correct(&id(), "43").unwrap_err();
        assert!(matches!(
            err,
            LedgerError::AnswerConflict { existing, new, .. }
                if existing == "42" && new == "43"
        ));
        assert_eq!(ledger.correct_answer(&id()).unwrap(), Some("42".into()));
    }

    // === Bounds derivation ===

    #[test]
    fn bounds_reflect_directional_history() {
        let ledger = GuessLedger::memory().unwrap();
        ledger
            .record(&id(), "100", Verdict::TooLow, "too low")
            .unwrap();
        ledger
            .record(&id(), "1300", Verdict::TooHigh, "too high")
            .unwrap();

        let bounds = ledger.bounds(&id()).unwrap();
        assert_eq!(bounds.lower_exclusive, Some(100));
        assert_eq!(bounds.upper_exclusive, Some(1300));
        assert!(bounds.is_feasible("500"));
        assert!(!bounds.is_feasible("1400"));
    }
}
