//! PuzzleCache: durable store of fetched puzzle inputs and prose pages.
//!
//! Keyed by (year, day, user): both parts of a day share one input and one
//! prose page. Each artifact is fetched from the network at most once, except
//! prose for a half-solved puzzle, which is refreshed when the cached copy
//! predates part B.

use crate::model::PuzzleId;
use crate::transport::{Transport, TransportError};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// DDL for the puzzle artifact cache.
pub const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS inputs (
    year       INTEGER NOT NULL,
    day        INTEGER NOT NULL,
    user       TEXT NOT NULL,
    data       TEXT NOT NULL,
    fetched_at TEXT NOT NULL,
    PRIMARY KEY (year, day, user)
);

CREATE TABLE IF NOT EXISTS prose (
    year       INTEGER NOT NULL,
    day        INTEGER NOT NULL,
    user       TEXT NOT NULL,
    html       TEXT NOT NULL,
    fetched_at TEXT NOT NULL,
    PRIMARY KEY (year, day, user)
);
"#;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("database error: {0}")]
    Database(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<rusqlite::Error> for CacheError {
    fn from(e: rusqlite::Error) -> Self {
        CacheError::Database(e.to_string())
    }
}

#[derive(Clone)]
pub struct PuzzleCache {
    conn: Arc<Mutex<Connection>>,
}

impl PuzzleCache {
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        let conn = Connection::open(path)?;
        Self::init_connection(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_connection(conn: &Connection) -> Result<(), CacheError> {
        let _ = conn.execute("PRAGMA journal_mode = WAL", []);
        conn.execute_batch(CACHE_SCHEMA)?;
        Ok(())
    }

    pub fn get_input(&self, id: &PuzzleId) -> Result<Option<String>, CacheError> {
        self.get("inputs", "data", id)
    }

    pub fn put_input(&self, id: &PuzzleId, data: &str) -> Result<(), CacheError> {
        self.put("inputs", "data", id, data)
    }

    pub fn get_prose(&self, id: &PuzzleId) -> Result<Option<String>, CacheError> {
        self.get("prose", "html", id)
    }

    pub fn put_prose(&self, id: &PuzzleId, html: &str) -> Result<(), CacheError> {
        self.put("prose", "html", id, html)
    }

    /// Cached input, or fetch-then-store. At most one network call per
    /// (year, day, user) for the lifetime of the cache.
    pub async fn fetch_input(
        &self,
        id: &PuzzleId,
        transport: &dyn Transport,
    ) -> Result<String, CacheError> {
        if let Some(data) = self.get_input(id)? {
            tracing::debug!(%id, "input served from cache");
            return Ok(data);
        }
        let data = transport.fetch_input(id).await?;
        self.put_input(id, &data)?;
        Ok(data)
    }

    /// Cached prose, or fetch-then-store. A cached page without a part-B
    /// article is stale once the caller is working on part B, so it is
    /// re-fetched in that case.
    pub async fn fetch_prose(
        &self,
        id: &PuzzleId,
        transport: &dyn Transport,
    ) -> Result<String, CacheError> {
        if let Some(html) = self.get_prose(id)? {
            let stale_for_part_b =
                id.part == crate::model::Part::B && crate::prose::articles(&html).len() < 2;
            if !stale_for_part_b {
                tracing::debug!(%id, "prose served from cache");
                return Ok(html);
            }
        }
        self.refresh_prose(id, transport).await
    }

    /// Unconditionally re-fetch and store the prose page.
    pub async fn refresh_prose(
        &self,
        id: &PuzzleId,
        transport: &dyn Transport,
    ) -> Result<String, CacheError> {
        let html = transport.fetch_prose(id).await?;
        self.put_prose(id, &html)?;
        Ok(html)
    }

    fn get(&self, table: &str, column: &str, id: &PuzzleId) -> Result<Option<String>, CacheError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {column} FROM {table} WHERE year = ?1 AND day = ?2 AND user = ?3"
        );
        let row = conn
            .query_row(&sql, params![id.year, id.day, id.user], |row| row.get(0))
            .optional()?;
        Ok(row)
    }

    fn put(
        &self,
        table: &str,
        column: &str,
        id: &PuzzleId,
        value: &str,
    ) -> Result<(), CacheError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            r#"
            INSERT INTO {table} (year, day, user, {column}, fetched_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(year, day, user) DO UPDATE SET
                {column} = excluded.{column},
                fetched_at = excluded.fetched_at
            "#
        );
        conn.execute(
            &sql,
            params![id.year, id.day, id.user, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Part;

    fn id() -> PuzzleId {
        PuzzleId::new(2020, 3, Part::A, "u1").unwrap()
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(CACHE_SCHEMA).unwrap();
        conn.execute_batch(CACHE_SCHEMA).unwrap();
    }

    #[test]
    fn input_round_trips_and_is_part_independent() {
        let cache = PuzzleCache::memory().unwrap();
        assert_eq!(cache.get_input(&id()).unwrap(), None);

        cache.put_input(&id(), "1\n2\n3\n").unwrap();
        assert_eq!(cache.get_input(&id()).unwrap().as_deref(), Some("1\n2\n3\n"));
        assert_eq!(
            cache.get_input(&id().sibling(Part::B)).unwrap().as_deref(),
            Some("1\n2\n3\n")
        );
    }

    #[test]
    fn prose_overwrite_replaces_cached_copy() {
        let cache = PuzzleCache::memory().unwrap();
        cache.put_prose(&id(), "<article>v1</article>").unwrap();
        cache.put_prose(&id(), "<article>v2</article>").unwrap();
        assert_eq!(
            cache.get_prose(&id()).unwrap().as_deref(),
            Some("<article>v2</article>")
        );
    }
}
