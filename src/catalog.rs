//! Catalog resolution: map a partial topic name to an archive identifier.
//!
//! The archive server publishes an OPDS (Atom) feed at
//! `/catalog/v2/entries`. Each `<entry>` carries a human-readable `<title>`
//! and a `<link type="text/html" href="/content/{id}">` pointing at the
//! archive's content root:
//!
//! ```xml
//! <entry>
//!   <title>Wikipedia</title>
//!   <link type="text/html" href="/content/wikipedia_en_all_nopic_2025-12"/>
//! </entry>
//! ```
//!
//! Resolution is a case-insensitive substring match of the requested name
//! against entry titles, in feed order. The first matching entry with a
//! content link wins. The feed is fetched fresh on every call.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::time::Duration;

use crate::client::ArchiveClient;
use crate::error::{FetchError, ResolveError};
use crate::models::{ArchiveId, CatalogEntry};

/// Catalog feed endpoint on the archive server.
pub const CATALOG_PATH: &str = "/catalog/v2/entries";

/// Path marker preceding the archive identifier in content links.
pub const CONTENT_ROOT_MARKER: &str = "/content/";

/// Read-only view of the server catalog.
pub struct Catalog<'a> {
    client: &'a dyn ArchiveClient,
    timeout: Duration,
}

impl<'a> Catalog<'a> {
    pub fn new(client: &'a dyn ArchiveClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Fetch and parse every catalog entry, in feed order.
    pub fn entries(&self) -> Result<Vec<CatalogEntry>, ResolveError> {
        let page = self.client.get(CATALOG_PATH, &[], self.timeout)?;
        if !page.is_success() {
            return Err(ResolveError::Unavailable(FetchError::Status(page.status)));
        }
        parse_feed(&page.body)
    }

    /// All entry titles, in feed order.
    pub fn titles(&self) -> Result<Vec<String>, ResolveError> {
        Ok(self.entries()?.into_iter().map(|e| e.title).collect())
    }

    /// Resolve `partial_name` to the identifier of the first entry whose
    /// title contains it, ignoring case.
    pub fn resolve(&self, partial_name: &str) -> Result<ArchiveId, ResolveError> {
        tracing::debug!(name = partial_name, "resolving archive id");
        let entries = self.entries()?;
        match find_archive(&entries, partial_name) {
            Some(id) => {
                tracing::debug!(name = partial_name, id = %id, "archive resolved");
                Ok(id)
            }
            None => Err(ResolveError::NotFound(partial_name.to_string())),
        }
    }
}

/// First entry (feed order) whose title contains `partial_name`, ignoring case.
///
/// Matching entries without a content link are skipped. The first match
/// that has one decides: a link naming no archive (`/content/`) resolves to
/// `None` rather than moving on to later entries.
pub fn find_archive(entries: &[CatalogEntry], partial_name: &str) -> Option<ArchiveId> {
    let needle = partial_name.to_lowercase();
    entries
        .iter()
        .filter(|e| e.title.to_lowercase().contains(&needle))
        .find(|e| e.content_link.is_some())
        .and_then(|e| e.id.clone())
}

/// Extract the archive identifier from a content-root link.
///
/// Takes everything after the last `/content/` marker; a link without the
/// marker is used whole. An empty remainder yields `None`.
pub fn archive_id_from_href(href: &str) -> Option<ArchiveId> {
    let raw = href.rsplit(CONTENT_ROOT_MARKER).next().unwrap_or(href);
    if raw.is_empty() {
        None
    } else {
        Some(ArchiveId::new(raw))
    }
}

#[derive(Default)]
struct EntryBuilder {
    title: String,
    title_seen: bool,
    html_href: Option<String>,
}

impl EntryBuilder {
    fn consider_link(&mut self, link: &BytesStart<'_>) -> Result<(), ResolveError> {
        if self.html_href.is_some() {
            return Ok(());
        }

        let mut is_html = false;
        let mut href = None;
        for attr in link.attributes() {
            let attr = attr.map_err(|e| ResolveError::Malformed(e.to_string()))?;
            let value = attr
                .unescape_value()
                .map_err(|e| ResolveError::Malformed(e.to_string()))?;
            match attr.key.local_name().as_ref() {
                b"type" => is_html = value == "text/html",
                b"href" => href = Some(value.into_owned()),
                _ => {}
            }
        }

        if is_html {
            self.html_href = href.filter(|h| !h.is_empty());
        }
        Ok(())
    }

    fn finish(self) -> CatalogEntry {
        CatalogEntry {
            title: self.title.trim().to_string(),
            id: self.html_href.as_deref().and_then(archive_id_from_href),
            content_link: self.html_href,
        }
    }
}

/// Parse a catalog feed into entries, preserving feed order.
pub fn parse_feed(xml: &str) -> Result<Vec<CatalogEntry>, ResolveError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<EntryBuilder> = None;
    let mut in_title = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"entry" => current = Some(EntryBuilder::default()),
                b"title" => {
                    in_title = current.as_ref().is_some_and(|entry| !entry.title_seen);
                }
                b"link" => {
                    if let Some(entry) = current.as_mut() {
                        entry.consider_link(&e)?;
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"link" {
                    if let Some(entry) = current.as_mut() {
                        entry.consider_link(&e)?;
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if in_title {
                    if let Some(entry) = current.as_mut() {
                        let text = t
                            .unescape()
                            .map_err(|e| ResolveError::Malformed(e.to_string()))?;
                        entry.title.push_str(&text);
                    }
                }
            }
            Ok(Event::CData(c)) => {
                if in_title {
                    if let Some(entry) = current.as_mut() {
                        entry.title.push_str(&String::from_utf8_lossy(&c.into_inner()));
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"title" => {
                    if in_title {
                        if let Some(entry) = current.as_mut() {
                            entry.title_seen = true;
                        }
                    }
                    in_title = false;
                }
                b"entry" => {
                    if let Some(entry) = current.take() {
                        entries.push(entry.finish());
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ResolveError::Malformed(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(entries)
}
