//! Tool extension system.
//!
//! Tools are what agents discover and call. The built-in tools wrap the
//! retrieval pipeline; custom Rust tools implement [`Tool`] and are added
//! to a [`ToolRegistry`] before the server starts.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              ToolRegistry                │
//! │  ┌──────────────────────┐ ┌───────────┐  │
//! │  │ Built-in             │ │  Custom   │  │
//! │  │ search_knowledge_base│ │  (Rust)   │  │
//! │  │ list_archives        │ │  Tools    │  │
//! │  └──────────────────────┘ └───────────┘  │
//! └──────────────┬───────────────────────────┘
//!                ▼
//!   run_server() → HTTP tools API + MCP endpoint
//! ```
//!
//! # Usage
//!
//! ```rust
//! use civ_library::traits::ToolRegistry;
//!
//! let mut tools = ToolRegistry::with_builtins();
//! // tools.register(Box::new(MyTool::new()));
//! assert_eq!(tools.len(), 2);
//! ```

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::models::CatalogEntry;
use crate::retrieve::Library;

/// A tool that agents can discover and call.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use serde_json::{json, Value};
/// use civ_library::traits::{Tool, ToolContext};
///
/// pub struct ArchiveCountTool;
///
/// #[async_trait]
/// impl Tool for ArchiveCountTool {
///     fn name(&self) -> &str { "archive_count" }
///     fn description(&self) -> &str { "Count archives served by the library" }
///
///     fn parameters_schema(&self) -> Value {
///         json!({ "type": "object", "properties": {} })
///     }
///
///     async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
///         let archives = ctx.list_archives().await?;
///         Ok(json!({ "count": archives.len() }))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Lowercase identifier with underscores; also the route segment in
    /// `POST /tools/{name}`.
    fn name(&self) -> &str;

    /// One-line description for agent discovery.
    fn description(&self) -> &str;

    /// Whether this tool ships with the crate. Defaults to `false`.
    fn is_builtin(&self) -> bool {
        false
    }

    /// JSON Schema (`type: "object"`) describing the parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool. `params` is always a JSON object.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

/// Bridge from a tool invocation to the retrieval pipeline.
///
/// Pipeline I/O is blocking, so every call runs on tokio's blocking pool.
pub struct ToolContext {
    config: Arc<Config>,
}

impl ToolContext {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the full retrieval pipeline. Always yields text.
    pub async fn search_knowledge_base(&self, query: &str, context: &str) -> Result<String> {
        let config = self.config.clone();
        let query = query.to_string();
        let context = context.to_string();

        let text = tokio::task::spawn_blocking(move || match Library::from_config(&config) {
            Ok(library) => library.search_knowledge_base(&query, &context),
            Err(e) => format!("System Error processing '{}': {:#}", query, e),
        })
        .await?;
        Ok(text)
    }

    /// Every catalog entry on the server.
    pub async fn list_archives(&self) -> Result<Vec<CatalogEntry>> {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<CatalogEntry>> {
            let library = Library::from_config(&config)?;
            Ok(library.catalog().entries()?)
        })
        .await?
    }
}

/// Built-in retrieval tool. Delegates to [`Library::search_knowledge_base`].
pub struct SearchKnowledgeBaseTool;

#[async_trait]
impl Tool for SearchKnowledgeBaseTool {
    fn name(&self) -> &str {
        "search_knowledge_base"
    }

    fn description(&self) -> &str {
        "Search the offline library (Wikipedia, Stack Overflow, iFixit, ...) and return article text"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Specific search terms (e.g. \"Python list comprehension\"). Separate multiple queries with ';' (e.g. \"radio freq; antenna types\")."
                },
                "context": {
                    "type": "string",
                    "description": "Topic hint: general (Wikipedia), code (Stack Overflow), repair (iFixit), medical, linux, science, books, or any catalog keyword.",
                    "default": "general"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = params["query"].as_str().unwrap_or("");
        let context = params["context"]
            .as_str()
            .unwrap_or(&ctx.config.retrieval.default_context);

        let text = ctx.search_knowledge_base(query, context).await?;
        Ok(serde_json::json!({ "text": text }))
    }
}

#[derive(Serialize)]
struct ArchiveInfo {
    title: String,
    id: Option<String>,
}

/// Built-in catalog listing tool.
pub struct ListArchivesTool;

#[async_trait]
impl Tool for ListArchivesTool {
    fn name(&self) -> &str {
        "list_archives"
    }

    fn description(&self) -> &str {
        "List the archives currently served by the offline library"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        let archives: Vec<ArchiveInfo> = ctx
            .list_archives()
            .await?
            .into_iter()
            .map(|e| ArchiveInfo {
                title: e.title,
                id: e.id.map(|id| id.to_string()),
            })
            .collect();
        Ok(serde_json::json!({ "archives": archives }))
    }
}

/// Registry of built-in and custom tools.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty tool registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Create a registry pre-loaded with `search_knowledge_base` and `list_archives`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SearchKnowledgeBaseTool));
        registry.register(Box::new(ListArchivesTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    /// Consume the registry, yielding its tools in registration order.
    pub fn into_tools(self) -> Vec<Box<dyn Tool>> {
        self.tools
    }

    /// Find a tool by name.
    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
