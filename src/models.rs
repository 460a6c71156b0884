//! Core data types that flow through the retrieval pipeline.
//!
//! Every value here lives for the duration of one sub-query: nothing is
//! cached between calls, so catalog changes on the server are always seen.

use serde::Serialize;
use std::fmt;

/// Opaque identifier naming one archive on the server
/// (e.g. `ifixit_en_all_2025-01`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ArchiveId(String);

impl ArchiveId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One `<entry>` of the catalog feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub title: String,
    /// Raw `href` of the entry's `text/html` content link.
    #[serde(skip)]
    pub content_link: Option<String>,
    /// `None` when there is no content link or it names no archive.
    pub id: Option<ArchiveId>,
}

/// A filtered, scored search-result link.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub score: f64,
    pub href: String,
}

/// Sanitized article text ready for formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub archive: ArchiveId,
    pub link: String,
    pub text: String,
    pub truncated: bool,
}

/// Outcome of one sub-query, tagged with the query that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    pub query: String,
    pub outcome: Result<Article, crate::error::RetrievalError>,
}

impl RetrievalResult {
    pub fn archive(&self) -> Option<&ArchiveId> {
        self.outcome.as_ref().ok().map(|a| &a.archive)
    }
}
