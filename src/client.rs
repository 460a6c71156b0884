//! HTTP transport to the archive server.
//!
//! The pipeline talks to the server only through [`ArchiveClient`], so the
//! ranking and formatting logic can be exercised against an in-memory fake.
//! [`HttpArchiveClient`] is the production implementation: a blocking
//! `reqwest` client with a per-request timeout.

use std::time::Duration;

use crate::error::FetchError;

/// A fetched response: status code plus decoded body text.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Synchronous access to the archive server.
pub trait ArchiveClient: Send + Sync {
    /// Base address every relative path is joined onto.
    fn base_url(&self) -> &str;

    /// `GET` a path (or absolute URL) with URL-encoded query parameters.
    ///
    /// Non-success statuses are returned as a [`Page`], not an error;
    /// callers decide what a status means for them.
    fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Page, FetchError>;
}

/// Join `path` onto `base`. Absolute `http(s)://` targets pass through.
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Blocking `reqwest` implementation of [`ArchiveClient`].
///
/// Must not be created or dropped on an async runtime thread; the server
/// builds one inside `spawn_blocking`.
pub struct HttpArchiveClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpArchiveClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("civlib/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Other(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

impl ArchiveClient for HttpArchiveClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Page, FetchError> {
        let url = join_url(&self.base_url, path);
        tracing::trace!(url = %url, ?query, "GET");

        let mut builder = self.client.get(&url).timeout(timeout);
        if !query.is_empty() {
            builder = builder.query(query);
        }

        let resp = builder.send()?;
        let status = resp.status().as_u16();
        let body = resp.text()?;
        Ok(Page { status, body })
    }
}
