//! Article fetching and HTML-to-prose extraction.
//!
//! Pages are stripped of non-prose markup (scripts, styles, navigation,
//! headers, footers, forms) before their text nodes are collected. The
//! result is bounded in characters to keep payloads inside a language
//! model's context budget.

use scraper::{Html, Selector};
use std::time::Duration;

use crate::client::{join_url, ArchiveClient};
use crate::error::RetrievalError;
use crate::models::{Article, ArchiveId};

/// Elements removed, with their subtrees, before text extraction.
pub const STRIPPED_ELEMENTS: &[&str] = &["script", "style", "nav", "footer", "header", "form"];

/// Appended to text cut at the character bound.
pub const TRUNCATION_MARKER: &str = "...";

/// Visible prose of an HTML document.
///
/// Text nodes are trimmed, empty ones dropped, and the rest joined with
/// single spaces.
pub fn html_to_text(html: &str) -> String {
    let mut doc = Html::parse_document(html);

    if let Ok(sel) = Selector::parse(&STRIPPED_ELEMENTS.join(", ")) {
        let stripped: Vec<_> = doc.select(&sel).map(|el| el.id()).collect();
        for id in stripped {
            if let Some(mut node) = doc.tree.get_mut(id) {
                node.detach();
            }
        }
    }

    doc.root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cut `text` to at most `max_chars` characters.
///
/// Returns the (possibly marked) text and whether it was cut. Text within
/// the bound is returned unchanged, without a marker.
pub fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => (format!("{}{}", &text[..cut], TRUNCATION_MARKER), true),
        None => (text.to_string(), false),
    }
}

/// Fetch `link` from the archive server and reduce it to bounded prose.
pub fn fetch_article(
    client: &dyn ArchiveClient,
    archive: &ArchiveId,
    link: &str,
    query: &str,
    max_chars: usize,
    timeout: Duration,
) -> Result<Article, RetrievalError> {
    let url = join_url(client.base_url(), link);
    tracing::debug!(url = %url, "fetching article");

    let page = client
        .get(&url, &[], timeout)
        .map_err(|e| RetrievalError::from_fetch(query, e))?;
    if !page.is_success() {
        return Err(RetrievalError::UnexpectedFailure {
            query: query.to_string(),
            message: format!("HTTP {} fetching {}", page.status, url),
        });
    }

    let (text, truncated) = truncate_chars(&html_to_text(&page.body), max_chars);
    if truncated {
        tracing::debug!(url = %url, max_chars, "article truncated");
    }

    Ok(Article {
        archive: archive.clone(),
        link: link.to_string(),
        text,
        truncated,
    })
}
