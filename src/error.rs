//! Error Handling
//!
//! Error type definitions used in filabel

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error types for filabel
#[derive(Error, Debug)]
pub enum Error {
    #[error("authentication failed: could not resolve the token's user")]
    Auth,

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("page fetch failed: {url} returned HTTP {status}")]
    PageFetch { url: String, status: u16 },

    #[error("label update failed: {url} returned HTTP {status}")]
    LabelUpdate { url: String, status: u16 },

    #[error("malformed pagination link: {0}")]
    PageLink(String),

    #[error("invalid reposlug: {0} (expected 'owner/name')")]
    InvalidReposlug(String),

    #[error("invalid glob pattern '{pattern}' for label '{label}': {source}")]
    Pattern {
        label: String,
        pattern: String,
        source: glob::PatternError,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config(message.into())
    }
}
