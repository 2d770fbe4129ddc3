//! GitHub API error type.
//!
//! A deliberately flat error: every failed call carries a message with
//! owner/repo and issue context plus the underlying octocrab error. There is
//! no retry layer; callers decide whether a failure is fatal (listing) or
//! skippable (a single mutation).

use std::fmt;

use thiserror::Error;

/// A failed GitHub API call.
#[derive(Debug, Error)]
pub struct ApiError {
    /// Human-readable description including repo/issue context.
    pub message: String,

    /// The underlying octocrab error, if the failure came from the API.
    #[source]
    pub source: Option<Box<octocrab::Error>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {}", self.message, source),
            None => write!(f, "{}", self.message),
        }
    }
}

impl ApiError {
    /// Wraps an octocrab error with call-site context.
    pub fn api(message: impl Into<String>, source: octocrab::Error) -> Self {
        ApiError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// An error with no underlying API failure (e.g. a malformed response).
    pub fn other(message: impl Into<String>) -> Self {
        ApiError {
            message: message.into(),
            source: None,
        }
    }
}
