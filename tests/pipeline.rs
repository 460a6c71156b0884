//! End-to-end retrieval pipeline tests against an in-memory archive server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use civ_library::client::{ArchiveClient, Page};
use civ_library::config::Config;
use civ_library::error::{FetchError, RetrievalError, EMPTY_QUERY_MESSAGE, UNABLE_TO_LIST};
use civ_library::format::BLOCK_DIVIDER;
use civ_library::retrieve::Library;

const BASE: &str = "http://fake-library:8080";

/// Serves canned pages keyed by `path?k=v&k=v`; unknown routes fail to connect.
#[derive(Clone, Default)]
struct FakeServer {
    routes: HashMap<String, Page>,
    failures: HashMap<String, FetchError>,
    calls: Arc<Mutex<Vec<(String, Duration)>>>,
}

impl FakeServer {
    fn page(mut self, key: &str, body: &str) -> Self {
        self.routes.insert(
            key.to_string(),
            Page {
                status: 200,
                body: body.to_string(),
            },
        );
        self
    }

    fn status(mut self, key: &str, status: u16) -> Self {
        self.routes.insert(
            key.to_string(),
            Page {
                status,
                body: String::new(),
            },
        );
        self
    }

    fn failing(mut self, key: &str, err: FetchError) -> Self {
        self.failures.insert(key.to_string(), err);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn timeouts_for(&self, key: &str) -> Vec<Duration> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, timeout)| *timeout)
            .collect()
    }

    fn count(&self, key: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == key).count()
    }

    fn key(path: &str, query: &[(&str, &str)]) -> String {
        let path = path.strip_prefix(BASE).unwrap_or(path);
        if query.is_empty() {
            path.to_string()
        } else {
            let params: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            format!("{}?{}", path, params.join("&"))
        }
    }
}

impl ArchiveClient for FakeServer {
    fn base_url(&self) -> &str {
        BASE
    }

    fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Page, FetchError> {
        let key = Self::key(path, query);
        self.calls.lock().unwrap().push((key.clone(), timeout));
        if let Some(err) = self.failures.get(&key) {
            return Err(err.clone());
        }
        self.routes
            .get(&key)
            .cloned()
            .ok_or_else(|| FetchError::Connect(format!("no route for {}", key)))
    }
}

const CATALOG: &str = "/catalog/v2/entries";

fn feed(entries: &[(&str, &str)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><feed xmlns="http://www.w3.org/2005/Atom"><title>All zims</title>"#,
    );
    for (title, id) in entries {
        xml.push_str(&format!(
            r#"<entry><title>{}</title><link type="text/html" href="/content/{}"/></entry>"#,
            title, id
        ));
    }
    xml.push_str("</feed>");
    xml
}

fn results_page(hrefs: &[&str]) -> String {
    let items: Vec<String> = hrefs
        .iter()
        .map(|h| format!(r#"<li><a href="{}">{}</a></li>"#, h, h))
        .collect();
    format!(
        r#"<html><head><link href="/skin/style.css" rel="stylesheet"></head><body><ul>{}</ul></body></html>"#,
        items.join("")
    )
}

fn article_page(body: &str) -> String {
    format!(
        "<html><head><script>track()</script></head><body><nav>Menu</nav><p>{}</p><footer>Footer</footer></body></html>",
        body
    )
}

fn standard_catalog() -> String {
    feed(&[
        ("Wikipedia", "wikipedia_en_all_2025-12"),
        ("iFixit", "ifixit_en_all_2025-01"),
    ])
}

fn library(server: &FakeServer) -> Library {
    Library::new(Box::new(server.clone()), &Config::minimal())
}

#[test]
fn test_repair_query_selects_guide() {
    let server = FakeServer::default()
        .page(CATALOG, &standard_catalog())
        .page(
            "/search?content=ifixit_en_all_2025-01&pattern=headlight replacement",
            &results_page(&[
                "/content/ifixit_en_all_2025-01/Device/Honda_Civic",
                "/content/ifixit_en_all_2025-01/Guide/Headlight_Replacement/1234",
            ]),
        )
        .page(
            "/content/ifixit_en_all_2025-01/Guide/Headlight_Replacement/1234",
            &article_page("Remove the two bolts holding the headlight."),
        );

    let out = library(&server).search_knowledge_base("headlight replacement", "repair");

    assert_eq!(
        out,
        "### QUERY: headlight replacement\n<source id=\"ifixit_en_all_2025-01\">\nRemove the two bolts holding the headlight.\n</source>"
    );
}

#[test]
fn test_each_call_uses_its_own_timeout() {
    let search = "/search?content=wikipedia_en_all_2025-12&pattern=compass";
    let article = "/content/wikipedia_en_all_2025-12/A/Compass";
    let server = FakeServer::default()
        .page(CATALOG, &standard_catalog())
        .page(search, &results_page(&[article]))
        .page(article, &article_page("A compass shows direction."));

    let result = library(&server).retrieve("compass", "general");

    assert!(result.outcome.is_ok());
    assert_eq!(server.timeouts_for(CATALOG), vec![Duration::from_secs(2)]);
    assert_eq!(server.timeouts_for(search), vec![Duration::from_secs(5)]);
    assert_eq!(server.timeouts_for(article), vec![Duration::from_secs(10)]);
}

#[test]
fn test_custom_timeouts_reach_each_call() {
    let search = "/search?content=wikipedia_en_all_2025-12&pattern=compass";
    let article = "/content/wikipedia_en_all_2025-12/A/Compass";
    let server = FakeServer::default()
        .page(CATALOG, &standard_catalog())
        .page(search, &results_page(&[article]))
        .page(article, &article_page("A compass shows direction."));

    let mut config = Config::minimal();
    config.timeouts.catalog_secs = 3;
    config.timeouts.search_secs = 7;
    config.timeouts.fetch_secs = 11;
    let result = Library::new(Box::new(server.clone()), &config).retrieve("compass", "general");

    assert!(result.outcome.is_ok());
    assert_eq!(server.timeouts_for(CATALOG), vec![Duration::from_secs(3)]);
    assert_eq!(server.timeouts_for(search), vec![Duration::from_secs(7)]);
    assert_eq!(server.timeouts_for(article), vec![Duration::from_secs(11)]);
}

#[test]
fn test_padded_context_is_not_trimmed() {
    let server = FakeServer::default()
        .page(CATALOG, &standard_catalog())
        .page(
            "/search?content=wikipedia_en_all_2025-12&pattern=soldering",
            &results_page(&["/content/wikipedia_en_all_2025-12/A/Soldering"]),
        )
        .page(
            "/content/wikipedia_en_all_2025-12/A/Soldering",
            &article_page("Soldering joins metal items."),
        );

    // " repair " is not the `repair` tag, so iFixit is never chosen
    let out = library(&server).search_knowledge_base("soldering", " repair ");

    assert!(out.contains("<source id=\"wikipedia_en_all_2025-12\">"));
    assert_eq!(server.count(CATALOG), 2);
}

#[test]
fn test_unknown_context_falls_back_to_wikipedia() {
    let server = FakeServer::default()
        .page(CATALOG, &standard_catalog())
        .page(
            "/search?content=wikipedia_en_all_2025-12&pattern=penicillin",
            &results_page(&["/content/wikipedia_en_all_2025-12/A/Penicillin"]),
        )
        .page(
            "/content/wikipedia_en_all_2025-12/A/Penicillin",
            &article_page("Penicillins are a group of antibiotics."),
        );

    let out = library(&server).search_knowledge_base("penicillin", "medical");

    assert!(out.contains("<source id=\"wikipedia_en_all_2025-12\">"));
    assert!(out.contains("Penicillins are a group of antibiotics."));
    // routed keyword, then the fallback
    assert_eq!(server.count(CATALOG), 2);
}

#[test]
fn test_missing_archive_lists_titles() {
    let server = FakeServer::default().page(
        CATALOG,
        &feed(&[("iFixit", "ifixit_en"), ("Stack Exchange", "se_en")]),
    );

    let out = library(&server).search_knowledge_base("moby dick", "books");

    assert_eq!(
        out,
        "### QUERY: moby dick\nError: No matching ZIM found for 'books'. Available: iFixit, Stack Exchange"
    );
}

#[test]
fn test_general_context_does_not_retry_fallback() {
    let server = FakeServer::default().page(CATALOG, &feed(&[("iFixit", "ifixit_en")]));

    let result = library(&server).retrieve("rust", "general");

    assert!(matches!(
        result.outcome,
        Err(RetrievalError::ArchiveNotFound { .. })
    ));
    // one resolution attempt plus the title listing, no fallback retry
    assert_eq!(server.count(CATALOG), 2);
}

#[test]
fn test_unreachable_catalog_uses_placeholder() {
    let server = FakeServer::default();

    let out = library(&server).search_knowledge_base("anything", "code");

    assert!(out.contains("No matching ZIM found for 'code'"));
    assert!(out.ends_with(UNABLE_TO_LIST));
}

#[test]
fn test_catalog_error_status_is_not_found() {
    let server = FakeServer::default().status(CATALOG, 503);

    let result = library(&server).retrieve("anything", "general");

    match result.outcome {
        Err(RetrievalError::ArchiveNotFound { available, .. }) => {
            assert_eq!(available.to_string(), UNABLE_TO_LIST)
        }
        other => panic!("expected ArchiveNotFound, got {:?}", other),
    }
}

#[test]
fn test_empty_query_makes_no_calls() {
    let server = FakeServer::default();
    let lib = library(&server);

    assert_eq!(lib.search_knowledge_base("", "general"), EMPTY_QUERY_MESSAGE);
    assert_eq!(lib.search_knowledge_base("   \t ", "repair"), EMPTY_QUERY_MESSAGE);
    assert_eq!(lib.search_knowledge_base(" ; ; ", "repair"), EMPTY_QUERY_MESSAGE);
    assert!(server.calls().is_empty());
}

#[test]
fn test_sub_queries_fail_independently() {
    let server = FakeServer::default()
        .page(CATALOG, &standard_catalog())
        .page(
            "/search?content=wikipedia_en_all_2025-12&pattern=radio frequency",
            &results_page(&["/content/wikipedia_en_all_2025-12/A/Radio_frequency"]),
        )
        .page(
            "/content/wikipedia_en_all_2025-12/A/Radio_frequency",
            &article_page("Radio frequency is the oscillation rate."),
        )
        .page(
            "/search?content=wikipedia_en_all_2025-12&pattern=antenna types",
            &results_page(&["/content/other_archive/A/Antenna"]),
        );

    let out = library(&server).search_knowledge_base("radio frequency; antenna types", "general");

    let blocks: Vec<&str> = out.split(BLOCK_DIVIDER).collect();
    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].starts_with("### QUERY: radio frequency\n"));
    assert!(blocks[0].contains("Radio frequency is the oscillation rate."));
    assert_eq!(
        blocks[1],
        "### QUERY: antenna types\nNo articles found for 'antenna types' in wikipedia_en_all_2025-12."
    );
    // no cache between sub-queries
    assert_eq!(server.count(CATALOG), 2);
}

#[test]
fn test_long_article_truncated() {
    let long_body = "x".repeat(7000);
    let server = FakeServer::default()
        .page(CATALOG, &standard_catalog())
        .page(
            "/search?content=wikipedia_en_all_2025-12&pattern=long",
            &results_page(&["/content/wikipedia_en_all_2025-12/A/Long"]),
        )
        .page(
            "/content/wikipedia_en_all_2025-12/A/Long",
            &format!("<html><body><p>{}</p></body></html>", long_body),
        );

    let result = library(&server).retrieve("long", "general");
    let article = result.outcome.unwrap();

    assert!(article.truncated);
    assert_eq!(article.text, format!("{}...", "x".repeat(6000)));
}

#[test]
fn test_fetch_timeout_is_network_failure() {
    let server = FakeServer::default()
        .page(CATALOG, &standard_catalog())
        .page(
            "/search?content=wikipedia_en_all_2025-12&pattern=slow",
            &results_page(&["/content/wikipedia_en_all_2025-12/A/Slow"]),
        )
        .failing(
            "/content/wikipedia_en_all_2025-12/A/Slow",
            FetchError::Timeout("after 10s".to_string()),
        );

    let result = library(&server).retrieve("slow", "general");

    let err = result.outcome.unwrap_err();
    assert_eq!(err.kind(), "network");
    assert!(err.to_string().starts_with("Network error processing 'slow'"));
}

#[test]
fn test_article_http_error_is_unexpected_failure() {
    let server = FakeServer::default()
        .page(CATALOG, &standard_catalog())
        .page(
            "/search?content=wikipedia_en_all_2025-12&pattern=gone",
            &results_page(&["/content/wikipedia_en_all_2025-12/A/Gone"]),
        )
        .status("/content/wikipedia_en_all_2025-12/A/Gone", 404);

    let result = library(&server).retrieve("gone", "general");

    let err = result.outcome.unwrap_err();
    assert_eq!(err.kind(), "unexpected");
    assert!(err.to_string().contains("HTTP 404"));
}

#[test]
fn test_bare_relative_link_resolved_against_base() {
    let server = FakeServer::default()
        .page(CATALOG, &standard_catalog())
        .page(
            "/search?content=wikipedia_en_all_2025-12&pattern=tides",
            &results_page(&["content/wikipedia_en_all_2025-12/A/Tide"]),
        )
        .page(
            "/content/wikipedia_en_all_2025-12/A/Tide",
            &article_page("Tides are the rise and fall of sea levels."),
        );

    let out = library(&server).search_knowledge_base("tides", "general");

    assert!(out.contains("Tides are the rise and fall of sea levels."));
}
