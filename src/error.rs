//! Error types for the modifier pipeline.
//!
//! # Design Decisions
//! - Registration errors are returned synchronously and leave the chain untouched
//! - Rewrite errors are fail-fast: the first failure aborts the response phase
//! - Closing a body means dropping it, so there is no separate close error

use axum::http::uri::InvalidUri;

/// Boxed error returned by caller-supplied response hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while registering a modifier.
#[derive(Debug, thiserror::Error)]
pub enum ModifierError {
    /// The `matching_path` is not a valid regular expression.
    #[error("invalid matching path {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised during the response phase.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// Reading the backend body failed or exceeded the buffer limit.
    #[error("failed to buffer response body: {0}")]
    BodyRead(#[source] axum::Error),

    /// A response hook signalled failure.
    #[error("response modifier for {pattern:?} failed: {source}")]
    Modifier {
        pattern: String,
        #[source]
        source: BoxError,
    },
}

impl RewriteError {
    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            RewriteError::BodyRead(_) => "body_read",
            RewriteError::Modifier { .. } => "modifier",
        }
    }
}

/// The backend base URL cannot be used as a forwarding target.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("invalid backend URL: {0}")]
    Parse(#[from] url::ParseError),

    #[error("unsupported backend scheme {0:?} (only http is supported)")]
    UnsupportedScheme(String),

    #[error("backend URL has no host")]
    MissingHost,

    #[error("invalid backend authority: {0}")]
    Authority(#[from] InvalidUri),
}

/// Errors raised while assembling the proxy from configuration.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Modifier(#[from] crate::modifier::DeclarativeError),
}
