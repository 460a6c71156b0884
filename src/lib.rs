//! # Civilization Library
//!
//! Offline knowledge retrieval for AI agents.
//!
//! An agent supplies a free-text query and a coarse topic hint
//! (`general`, `code`, `repair`, ...). The library finds the matching
//! archive on a locally hosted ZIM archive server, searches it, re-ranks
//! the result links with topic-aware heuristics, fetches the winning page,
//! strips it to prose, and returns it with provenance markers.
//!
//! ## Architecture
//!
//! ```text
//!  query; query         ┌──────────┐   ┌──────────┐   ┌─────────────┐   ┌─────────┐
//!  + context ──split──▶ │  Router  │──▶│ Catalog  │──▶│ Search+Rank │──▶│ Extract │
//!                       └──────────┘   └──────────┘   └─────────────┘   └────┬────┘
//!                                                                             │
//!                           text block ◀──────────── Formatter ◀──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! civlib check                                   # is the archive server up?
//! civlib catalog                                 # list archives
//! civlib search "headlight replacement" --context repair
//! civlib serve mcp                               # expose tools over HTTP + MCP
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Core data types |
//! | [`error`] | Typed failure taxonomy |
//! | [`client`] | Archive server transport |
//! | [`catalog`] | Catalog feed parsing and archive resolution |
//! | [`router`] | Context → archive routing with fallback |
//! | [`rank`] | Link filtering and pluggable scoring rules |
//! | [`search`] | Search endpoint and result-page parsing |
//! | [`extract`] | Article fetching and HTML-to-prose extraction |
//! | [`format`] | Text packaging for language models |
//! | [`retrieve`] | The end-to-end pipeline |
//! | [`sources`] | Operator diagnostics |
//! | [`traits`] | Tool trait, built-in tools, registry |
//! | [`server`] | HTTP tool server |
//! | [`mcp`] | MCP protocol bridge |

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod format;
pub mod mcp;
pub mod models;
pub mod rank;
pub mod retrieve;
pub mod router;
pub mod search;
pub mod server;
pub mod sources;
pub mod traits;
