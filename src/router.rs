//! Topic routing: caller context → catalog keyword → archive identifier.
//!
//! Known contexts map through a closed table; anything else is used as the
//! catalog keyword verbatim, so callers can probe ad-hoc topics
//! (`context = "chemistry"`). When the routed keyword resolves to nothing,
//! routing retries once with [`FALLBACK_KEYWORD`].

use crate::catalog::Catalog;
use crate::error::{AvailableArchives, ResolveError, RetrievalError};
use crate::models::ArchiveId;

/// Context → catalog title keyword.
pub const TOPIC_KEYWORDS: &[(&str, &str)] = &[
    ("general", "wikipedia"),
    ("code", "stack overflow"),
    ("repair", "ifixit"),
    ("medical", "medical"),
    ("linux", "arch"),
    ("science", "phet"),
    ("books", "gutenberg"),
];

/// Keyword retried when the routed keyword resolves to nothing.
pub const FALLBACK_KEYWORD: &str = "wikipedia";

/// Context assumed when the caller supplies none.
pub const DEFAULT_CONTEXT: &str = "general";

/// Map a context tag to its catalog keyword. Unknown tags pass through.
pub fn route(context: &str) -> &str {
    TOPIC_KEYWORDS
        .iter()
        .find(|(tag, _)| *tag == context)
        .map(|(_, keyword)| *keyword)
        .unwrap_or(context)
}

/// An archive picked for a context, and whether it came from the fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct Routed {
    pub archive: ArchiveId,
    pub keyword: String,
    pub fell_back: bool,
}

/// Route `context` and resolve it against the catalog.
///
/// The fallback fires only when the routed keyword is not already
/// [`FALLBACK_KEYWORD`]. When nothing resolves, the error carries a
/// best-effort listing of catalog titles.
pub fn resolve_context(catalog: &Catalog<'_>, context: &str) -> Result<Routed, RetrievalError> {
    let keyword = route(context);

    match catalog.resolve(keyword) {
        Ok(archive) => {
            return Ok(Routed {
                archive,
                keyword: keyword.to_string(),
                fell_back: false,
            })
        }
        Err(e) => log_resolve_failure(keyword, &e),
    }

    if keyword != FALLBACK_KEYWORD {
        tracing::info!(
            keyword,
            fallback = FALLBACK_KEYWORD,
            "no archive for keyword, falling back"
        );
        match catalog.resolve(FALLBACK_KEYWORD) {
            Ok(archive) => {
                return Ok(Routed {
                    archive,
                    keyword: FALLBACK_KEYWORD.to_string(),
                    fell_back: true,
                })
            }
            Err(e) => log_resolve_failure(FALLBACK_KEYWORD, &e),
        }
    }

    let available = match catalog.titles() {
        Ok(titles) => AvailableArchives::Titles(titles),
        Err(e) => {
            tracing::warn!(error = %e, "unable to list catalog titles");
            AvailableArchives::Unlisted
        }
    };

    Err(RetrievalError::ArchiveNotFound {
        context: context.to_string(),
        available,
    })
}

fn log_resolve_failure(keyword: &str, err: &ResolveError) {
    match err {
        ResolveError::NotFound(_) => tracing::debug!(keyword, "no catalog entry matches"),
        other => tracing::warn!(keyword, error = %other, "catalog lookup failed"),
    }
}
