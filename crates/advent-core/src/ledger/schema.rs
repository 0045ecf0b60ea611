//! SQLite schema for the guess ledger.
//!
//! Tables:
//! - `guesses`: Append-only history of submitted guesses and their verdicts
//! - `answers`: At most one correct answer per puzzle identity

/// DDL for the guess ledger tables.
pub const LEDGER_SCHEMA: &str = r#"
-- Guess history (append-only, immutable)
CREATE TABLE IF NOT EXISTS guesses (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    year         INTEGER NOT NULL,
    day          INTEGER NOT NULL,
    part         TEXT NOT NULL,
    user         TEXT NOT NULL,
    value        TEXT NOT NULL,
    verdict      TEXT NOT NULL,
    raw_message  TEXT NOT NULL,
    submitted_at TEXT NOT NULL,
    UNIQUE(year, day, part, user, value)
);

-- Correct answers (immutable once written)
CREATE TABLE IF NOT EXISTS answers (
    year        INTEGER NOT NULL,
    day         INTEGER NOT NULL,
    part        TEXT NOT NULL,
    user        TEXT NOT NULL,
    value       TEXT NOT NULL,
    recorded_at TEXT NOT NULL,
    PRIMARY KEY (year, day, part, user)
);

CREATE INDEX IF NOT EXISTS idx_guesses_identity
    ON guesses(year, day, part, user);
"#;
