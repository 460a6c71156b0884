//! Operator diagnostics for the archive server.
//!
//! Backs the `civlib check`, `civlib catalog`, `civlib resolve`, and
//! `civlib topics` commands.

use anyhow::Result;
use serde::Serialize;
use std::time::Duration;

use crate::client::ArchiveClient;
use crate::config::Config;
use crate::error::{FetchError, ResolveError};
use crate::models::CatalogEntry;
use crate::retrieve::Library;
use crate::router::TOPIC_KEYWORDS;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of probing the server root.
#[derive(Debug, Clone, Serialize)]
pub struct ServerStatus {
    pub url: String,
    pub status: u16,
    /// Whether the landing page looks like an archive server.
    pub recognized: bool,
}

/// `GET /` and check the landing page for an archive-server signature.
pub fn check_connection(client: &dyn ArchiveClient) -> Result<ServerStatus, FetchError> {
    let page = client.get("/", &[], CHECK_TIMEOUT)?;
    let body = page.body.to_lowercase();
    Ok(ServerStatus {
        url: client.base_url().to_string(),
        status: page.status,
        recognized: body.contains("library") || body.contains("kiwix"),
    })
}

pub fn run_check(config: &Config) -> Result<()> {
    let library = Library::from_config(config)?;
    println!("Connecting to {}...", config.library.host);

    match check_connection(library.client()) {
        Ok(status) => {
            println!("  [OK] status code: {}", status.status);
            if status.recognized {
                println!("  [OK] content looks like an archive server");
            } else {
                println!("  [WARN] content does not match the expected archive server signature");
            }
            Ok(())
        }
        Err(e) => {
            println!("  [FAIL] could not connect: {}", e);
            anyhow::bail!("archive server unreachable at {}", config.library.host)
        }
    }
}

pub fn run_catalog(config: &Config) -> Result<()> {
    let library = Library::from_config(config)?;
    let entries = library.catalog().entries()?;
    print_catalog(&entries);
    Ok(())
}

fn print_catalog(entries: &[CatalogEntry]) {
    if entries.is_empty() {
        println!("No archives in catalog.");
        return;
    }

    println!("{:<48} ARCHIVE ID", "TITLE");
    for entry in entries {
        let id = entry
            .id
            .as_ref()
            .map(|id| id.as_str())
            .unwrap_or("(no content link)");
        println!("{:<48} {}", entry.title, id);
    }
}

pub fn run_resolve(config: &Config, name: &str) -> Result<()> {
    let library = Library::from_config(config)?;
    match library.catalog().resolve(name) {
        Ok(id) => {
            println!("{}", id);
            Ok(())
        }
        Err(ResolveError::NotFound(_)) => anyhow::bail!("no archive matches '{}'", name),
        Err(e) => Err(e.into()),
    }
}

pub fn list_topics() {
    println!("{:<12} CATALOG KEYWORD", "CONTEXT");
    for (context, keyword) in TOPIC_KEYWORDS {
        println!("{:<12} {}", context, keyword);
    }
    println!("(any other context is used as the catalog keyword verbatim)");
}
