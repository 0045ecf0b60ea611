//! Identity resolution: turn explicit arguments and process environment into
//! an immutable [`PuzzleId`]. No hidden globals; everything the controller
//! sees is resolved here, once, up front.

use crate::model::{user_id, Part, PuzzleId};
use anyhow::{bail, Context};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

pub const SESSION_ENV: &str = "AOC_SESSION";
pub const YEAR_ENV: &str = "AOC_YEAR";
pub const DAY_ENV: &str = "AOC_DAY";

/// A resolved session: the raw token (for the transport) and the opaque user
/// id derived from it (for identities and logs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: String,
}

impl Session {
    pub fn from_token(token: impl Into<String>) -> Session {
        let token = token.into().trim().to_string();
        let user = user_id(&token);
        Session { token, user }
    }
}

/// Explicit argument, else environment, else error with the fix spelled out.
pub fn resolve_session(explicit: Option<String>) -> anyhow::Result<Session> {
    let token = match explicit {
        Some(t) if !t.trim().is_empty() => t,
        _ => std::env::var(SESSION_ENV).unwrap_or_default(),
    };
    if token.trim().is_empty() {
        bail!(
            "no session token: pass --session or set {} to your site session cookie",
            SESSION_ENV
        );
    }
    Ok(Session::from_token(token))
}

/// Resolve (year, day) from explicit arguments, environment overrides, or,
/// during the event, today's date. Outside December both must be given.
pub fn resolve_puzzle_date(year: Option<u16>, day: Option<u8>) -> anyhow::Result<(u16, u8)> {
    let year = match year.or_else(|| env_parse(YEAR_ENV)) {
        Some(y) => y,
        None => default_year().context("no year given and none inferable")?,
    };
    let day = match day.or_else(|| env_parse(DAY_ENV)) {
        Some(d) => d,
        None => default_day(year).context("no day given and none inferable")?,
    };
    Ok((year, day))
}

pub fn resolve_identity(
    year: Option<u16>,
    day: Option<u8>,
    part: Part,
    session: &Session,
) -> anyhow::Result<PuzzleId> {
    let (year, day) = resolve_puzzle_date(year, day)?;
    Ok(PuzzleId::new(year, day, part, session.user.clone())?)
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.trim().parse().ok()
}

/// The most recent event year: the current year during December, else the
/// previous one.
fn default_year() -> Option<u16> {
    let now = Utc::now();
    let year = now.year() as u16;
    if now.month() == 12 {
        Some(year)
    } else {
        Some(year - 1)
    }
}

/// Today's puzzle day, only well-defined while the event is running.
fn default_day(year: u16) -> Option<u8> {
    let now = Utc::now();
    if now.year() as u16 == year && now.month() == 12 && now.day() <= 25 {
        Some(now.day() as u8)
    } else {
        None
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TokensFile {
    Named(BTreeMap<String, String>),
    List(Vec<String>),
}

/// Load extra session tokens for multi-account benchmarking. Accepts a JSON
/// object (name -> token) or a bare JSON list of tokens.
pub fn load_tokens(path: &Path) -> anyhow::Result<Vec<Session>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read tokens file {}", path.display()))?;
    let parsed: TokensFile = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse tokens file {}", path.display()))?;
    let tokens = match parsed {
        TokensFile::Named(map) => map.into_values().collect(),
        TokensFile::List(list) => list,
    };
    Ok(tokens.into_iter().map(Session::from_token).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn session_from_token_derives_user_id() {
        let s = Session::from_token(" tok-123 ");
        assert_eq!(s.token, "tok-123");
        assert_eq!(s.user, user_id("tok-123"));
    }

    #[test]
    fn explicit_date_wins() {
        let (year, day) = resolve_puzzle_date(Some(2017), Some(9)).unwrap();
        assert_eq!((year, day), (2017, 9));
    }

    #[test]
    fn tokens_file_accepts_map_or_list() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, r#"{{"main": "tok-a", "alt": "tok-b"}}"#).unwrap();
        let sessions = load_tokens(f.path()).unwrap();
        assert_eq!(sessions.len(), 2);

        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, r#"["tok-a", "tok-b", "tok-c"]"#).unwrap();
        assert_eq!(load_tokens(f.path()).unwrap().len(), 3);
    }

    #[test]
    fn tokens_file_errors_are_contextual() {
        let err = load_tokens(Path::new("/definitely/missing.json")).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}
