use super::{Transport, TransportError};
use crate::model::{user_id, PuzzleId};
use crate::prose;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://adventofcode.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Identify ourselves to the site operator, per their automation guidance.
const USER_AGENT: &str = concat!(
    "advent/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/advent-rs/advent)"
);

/// Live transport. Holds one session cookie per known user id and picks the
/// credential from the identity on every call, so one client can serve
/// many accounts.
pub struct HttpTransport {
    base_url: String,
    /// user id -> session token
    sessions: HashMap<String, String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(session_token: &str) -> Result<Self, TransportError> {
        Self::with_base_url(session_token, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Explicit base URL and timeout, used by tests against a local server.
    pub fn with_base_url(
        session_token: &str,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;
        let mut transport = Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sessions: HashMap::new(),
            timeout,
            client,
        };
        transport.add_session(session_token);
        Ok(transport)
    }

    /// Register another account's session token; returns its opaque user id.
    pub fn add_session(&mut self, session_token: &str) -> String {
        let token = session_token.trim().to_string();
        let user = user_id(&token);
        self.sessions.insert(user.clone(), token);
        user
    }

    fn day_url(&self, id: &PuzzleId, suffix: &str) -> String {
        format!("{}/{}/day/{}{}", self.base_url, id.year, id.day, suffix)
    }

    fn cookie_for(&self, id: &PuzzleId) -> Result<String, TransportError> {
        let token = self
            .sessions
            .get(&id.user)
            .ok_or_else(|| TransportError::NoCredentials {
                user: id.user.clone(),
            })?;
        Ok(format!("session={}", token))
    }

    fn map_err(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Http(e.to_string())
        }
    }

    async fn get_text(&self, id: &PuzzleId, url: &str) -> Result<String, TransportError> {
        tracing::debug!(%url, "GET");
        let resp = self
            .client
            .get(url)
            .header("Cookie", self.cookie_for(id)?)
            .send()
            .await
            .map_err(|e| self.map_err(e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
                url: url.to_string(),
            });
        }
        resp.text().await.map_err(|e| self.map_err(e))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_answer(&self, id: &PuzzleId, value: &str) -> Result<String, TransportError> {
        let url = self.day_url(id, "/answer");
        tracing::debug!(%url, %id, "POST answer");
        let resp = self
            .client
            .post(&url)
            .header("Cookie", self.cookie_for(id)?)
            .form(&[
                ("level", id.part.level().to_string()),
                ("answer", value.to_string()),
            ])
            .send()
            .await
            .map_err(|e| self.map_err(e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
                url,
            });
        }
        let body = resp.text().await.map_err(|e| self.map_err(e))?;
        // The verdict sentence lives in the reply's <article>; classification
        // works on its text, not on raw markup.
        Ok(prose::article_text(&body).unwrap_or(body))
    }

    async fn fetch_prose(&self, id: &PuzzleId) -> Result<String, TransportError> {
        self.get_text(id, &self.day_url(id, "")).await
    }

    async fn fetch_input(&self, id: &PuzzleId) -> Result<String, TransportError> {
        self.get_text(id, &self.day_url(id, "/input")).await
    }
}
