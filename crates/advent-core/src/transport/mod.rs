//! Transport: the only component that touches the network.
//!
//! Everything above it consumes the [`Transport`] trait, so tests swap in a
//! scripted double and never open a socket.

use crate::model::PuzzleId;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub mod http;

pub use http::HttpTransport;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP status {code} from {url}")]
    Status { code: u16, url: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Http(String),

    #[error("no session credential registered for user {user}")]
    NoCredentials { user: String },
}

/// Server endpoints needed by the core. Credentials and URL construction are
/// the implementation's responsibility.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST the candidate answer; returns the server's reply as plain text.
    async fn post_answer(&self, id: &PuzzleId, value: &str) -> Result<String, TransportError>;

    /// Fetch the puzzle page html (prose). Part-independent.
    async fn fetch_prose(&self, id: &PuzzleId) -> Result<String, TransportError>;

    /// Fetch the account's input data for the puzzle.
    async fn fetch_input(&self, id: &PuzzleId) -> Result<String, TransportError>;
}
