//! The retrieval pipeline.
//!
//! One sub-query runs strictly in sequence:
//!
//! ```text
//! route(context) → resolve archive → search & rank → fetch & clean
//! ```
//!
//! A query string may hold several sub-queries separated by `;`. Each runs
//! the full pipeline independently; a failure in one never aborts the
//! others. Nothing is shared or cached between sub-queries, so every one
//! re-reads the catalog.
//!
//! [`Library::search_knowledge_base`] is the operation exposed to agents.
//! It always returns text: article content on success, an explanation
//! otherwise.

use anyhow::{Context, Result};

use crate::catalog::Catalog;
use crate::client::{ArchiveClient, HttpArchiveClient};
use crate::config::{Config, TimeoutConfig};
use crate::error::{RetrievalError, EMPTY_QUERY_MESSAGE};
use crate::extract::fetch_article;
use crate::format::format_all;
use crate::models::{Article, RetrievalResult};
use crate::rank::Ranker;
use crate::router::{resolve_context, DEFAULT_CONTEXT};
use crate::search::search_and_rank;

/// Non-empty, trimmed `;`-separated parts of `query`.
pub fn split_sub_queries(query: &str) -> Vec<&str> {
    query
        .split(';')
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .collect()
}

/// Blank contexts mean general knowledge. Anything else is kept verbatim.
pub fn normalize_context(context: &str) -> &str {
    if context.trim().is_empty() {
        DEFAULT_CONTEXT
    } else {
        context
    }
}

/// Retrieval front-end over one archive server.
pub struct Library {
    client: Box<dyn ArchiveClient>,
    timeouts: TimeoutConfig,
    max_chars: usize,
    ranker: Ranker,
}

impl Library {
    pub fn new(client: Box<dyn ArchiveClient>, config: &Config) -> Self {
        Self {
            client,
            timeouts: config.timeouts.clone(),
            max_chars: config.retrieval.max_chars,
            ranker: Ranker::default(),
        }
    }

    /// A library talking HTTP to `[library].host`.
    ///
    /// Blocking: do not call from an async task without `spawn_blocking`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = HttpArchiveClient::new(config.library.host.clone())
            .with_context(|| format!("Failed to build HTTP client for {}", config.library.host))?;
        Ok(Self::new(Box::new(client), config))
    }

    /// Replace the scoring rule set.
    pub fn with_ranker(mut self, ranker: Ranker) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn client(&self) -> &dyn ArchiveClient {
        self.client.as_ref()
    }

    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(self.client.as_ref(), self.timeouts.catalog())
    }

    /// Run the pipeline for a single sub-query.
    pub fn retrieve(&self, query: &str, context: &str) -> RetrievalResult {
        let context = normalize_context(context);
        let outcome = self.run_pipeline(query, context);
        if let Err(e) = &outcome {
            tracing::info!(query, context, kind = e.kind(), error = %e, "sub-query failed");
        }
        RetrievalResult {
            query: query.to_string(),
            outcome,
        }
    }

    /// Run every sub-query of `query` in order.
    pub fn retrieve_all(
        &self,
        query: &str,
        context: &str,
    ) -> Result<Vec<RetrievalResult>, RetrievalError> {
        let sub_queries = split_sub_queries(query);
        if sub_queries.is_empty() {
            return Err(RetrievalError::EmptyQuery);
        }
        Ok(sub_queries
            .into_iter()
            .map(|q| self.retrieve(q, context))
            .collect())
    }

    /// Search the offline library and return formatted text.
    ///
    /// Never fails: an empty query yields a fixed instruction to retry with
    /// specific keywords, and per-sub-query failures are rendered inline.
    pub fn search_knowledge_base(&self, query: &str, context: &str) -> String {
        match self.retrieve_all(query, context) {
            Ok(results) => format_all(&results),
            Err(_) => EMPTY_QUERY_MESSAGE.to_string(),
        }
    }

    fn run_pipeline(&self, query: &str, context: &str) -> Result<Article, RetrievalError> {
        let routed = resolve_context(&self.catalog(), context)?;
        if routed.fell_back {
            tracing::debug!(context, archive = %routed.archive, "using fallback archive");
        }

        let best = search_and_rank(
            self.client.as_ref(),
            &self.ranker,
            &routed.archive,
            query,
            context,
            self.timeouts.search(),
        )?;

        fetch_article(
            self.client.as_ref(),
            &routed.archive,
            &best.href,
            query,
            self.max_chars,
            self.timeouts.fetch(),
        )
    }
}
