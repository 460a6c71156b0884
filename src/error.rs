//! Failure taxonomy for the retrieval pipeline.
//!
//! Every failure a sub-query can hit is one of the [`RetrievalError`]
//! variants. The pipeline never propagates them to the caller as errors;
//! the formatter renders them into text. Keeping them typed lets tests and
//! logs see *why* a sub-query failed.

use thiserror::Error;

/// Fixed text returned for an empty or whitespace-only query.
pub const EMPTY_QUERY_MESSAGE: &str = "Error: Empty query. Please retry with specific search \
keywords (e.g. \"Python list comprehension\" or \"headlight replacement\").";

/// Placeholder used when the catalog titles themselves cannot be listed.
pub const UNABLE_TO_LIST: &str = "Unable to list (catalog unavailable).";

/// A single HTTP call against the archive server failed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("server returned HTTP {0}")]
    Status(u16),
    #[error("failed to read response body: {0}")]
    Body(String),
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Timeouts and connection failures are worth retrying later.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Timeout(_) | FetchError::Connect(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            FetchError::Body(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Other(e.to_string())
        }
    }
}

/// Catalog resolution did not yield an archive identifier.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResolveError {
    /// No catalog entry title contains the requested name.
    #[error("no archive matches '{0}'")]
    NotFound(String),
    #[error("catalog unavailable: {0}")]
    Unavailable(#[from] FetchError),
    #[error("catalog feed could not be parsed: {0}")]
    Malformed(String),
}

/// Catalog titles available on the server, or why they could not be listed.
#[derive(Debug, Clone, PartialEq)]
pub enum AvailableArchives {
    Titles(Vec<String>),
    Unlisted,
}

impl std::fmt::Display for AvailableArchives {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AvailableArchives::Titles(titles) if titles.is_empty() => write!(f, "none"),
            AvailableArchives::Titles(titles) => write!(f, "{}", titles.join(", ")),
            AvailableArchives::Unlisted => write!(f, "{}", UNABLE_TO_LIST),
        }
    }
}

/// Why a sub-query produced no article.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RetrievalError {
    #[error("{}", EMPTY_QUERY_MESSAGE)]
    EmptyQuery,

    #[error("Error: No matching ZIM found for '{context}'. Available: {available}")]
    ArchiveNotFound {
        context: String,
        available: AvailableArchives,
    },

    #[error("No articles found for '{query}' in {archive}.")]
    NoResultsFound { query: String, archive: String },

    #[error("Network error processing '{query}': {detail}")]
    TransientNetworkFailure { query: String, detail: String },

    #[error("System Error processing '{query}': {message}")]
    UnexpectedFailure { query: String, message: String },
}

impl RetrievalError {
    /// Stable machine-readable tag for logs and tool responses.
    pub fn kind(&self) -> &'static str {
        match self {
            RetrievalError::EmptyQuery => "empty_query",
            RetrievalError::ArchiveNotFound { .. } => "archive_not_found",
            RetrievalError::NoResultsFound { .. } => "no_results",
            RetrievalError::TransientNetworkFailure { .. } => "network",
            RetrievalError::UnexpectedFailure { .. } => "unexpected",
        }
    }

    /// Classify a failed HTTP call made while serving `query`.
    pub fn from_fetch(query: &str, err: FetchError) -> Self {
        if err.is_transient() {
            RetrievalError::TransientNetworkFailure {
                query: query.to_string(),
                detail: err.to_string(),
            }
        } else {
            RetrievalError::UnexpectedFailure {
                query: query.to_string(),
                message: err.to_string(),
            }
        }
    }
}
