//! Full-text search against one archive, followed by re-ranking.
//!
//! The server's `/search` endpoint returns an HTML results page. Its raw
//! ordering is not trusted: every anchor on the page goes through
//! [`Ranker`], which drops navigation noise and scores what remains.

use scraper::{Html, Selector};
use std::time::Duration;

use crate::client::ArchiveClient;
use crate::error::RetrievalError;
use crate::models::{ArchiveId, Candidate};
use crate::rank::Ranker;

/// Search endpoint on the archive server.
pub const SEARCH_PATH: &str = "/search";

/// Every `href` of every `<a>` on the page, in document order.
pub fn extract_links(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let sel = match Selector::parse("a[href]") {
        Ok(sel) => sel,
        Err(_) => return Vec::new(),
    };
    doc.select(&sel)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Search `archive` for `query` and return the best-ranked link.
pub fn search_and_rank(
    client: &dyn ArchiveClient,
    ranker: &Ranker,
    archive: &ArchiveId,
    query: &str,
    context: &str,
    timeout: Duration,
) -> Result<Candidate, RetrievalError> {
    tracing::debug!(query, archive = %archive, "searching");

    let page = client
        .get(
            SEARCH_PATH,
            &[("content", archive.as_str()), ("pattern", query)],
            timeout,
        )
        .map_err(|e| RetrievalError::from_fetch(query, e))?;
    if !page.is_success() {
        tracing::warn!(status = page.status, archive = %archive, "search returned non-success status");
    }

    let links = extract_links(&page.body);
    let best = ranker.best(links.iter().map(String::as_str), archive, query, context);

    match best {
        Some(candidate) => {
            tracing::debug!(href = %candidate.href, score = candidate.score, "selected candidate");
            Ok(candidate)
        }
        None => Err(RetrievalError::NoResultsFound {
            query: query.to_string(),
            archive: archive.to_string(),
        }),
    }
}
