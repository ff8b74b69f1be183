//! Source adapters: one per external job site.
//!
//! Every adapter implements [`ResumeSource`]: translate a [`SearchQuery`] into the
//! site's native filters, fetch the documents, normalize them into [`ResumeRecord`]s.
//! Adapters share no mutable state; the search pipeline holds them as
//! `Arc<dyn ResumeSource>` and polls them concurrently.

pub mod http;
pub mod robota;
pub mod work_ua;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ResumeRecord, SearchQuery};

pub use robota::RobotaSource;
pub use work_ua::WorkUaSource;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{source_name}: authentication failed: {message}")]
    AuthenticationFailure {
        source_name: String,
        message: String,
    },

    #[error("{source_name}: source unavailable: {message}")]
    SourceUnavailable {
        source_name: String,
        message: String,
    },

    #[error("{source_name}: parse error: {message}")]
    Parse {
        source_name: String,
        message: String,
    },
}

impl SourceError {
    pub fn unavailable(source_name: &str, message: impl Into<String>) -> Self {
        SourceError::SourceUnavailable {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    pub fn parse(source_name: &str, message: impl Into<String>) -> Self {
        SourceError::Parse {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    pub fn authentication(source_name: &str, message: impl Into<String>) -> Self {
        SourceError::AuthenticationFailure {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    /// Maps a transport-level failure (connect, timeout, body read) to `SourceUnavailable`.
    pub fn from_transport(source_name: &str, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else {
            err.to_string()
        };
        Self::unavailable(source_name, message)
    }

    /// Short machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            SourceError::AuthenticationFailure { .. } => "AUTHENTICATION_FAILURE",
            SourceError::SourceUnavailable { .. } => "SOURCE_UNAVAILABLE",
            SourceError::Parse { .. } => "PARSE_ERROR",
        }
    }
}

/// Shared capability of every job-site adapter.
#[async_trait]
pub trait ResumeSource: Send + Sync {
    /// Stable identifier used in logs and failure reports.
    fn name(&self) -> &str;

    async fn search(&self, query: &SearchQuery) -> Result<Vec<ResumeRecord>, SourceError>;
}
