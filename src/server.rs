//! HTTP tool server.
//!
//! Exposes the tool registry to agents two ways: a plain JSON API and an
//! MCP Streamable HTTP endpoint.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/tools/list` | List all registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call any registered tool by name |
//! | `GET`  | `/health` | Health check (returns version and archive host) |
//! | `*`    | `/mcp` | MCP JSON-RPC (Streamable HTTP) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "params must be a JSON object" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `timeout` (408),
//! `tool_error` (500).
//!
//! `search_knowledge_base` itself never produces an error response: empty
//! queries and retrieval failures come back as explanatory text.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::mcp::McpBridge;
use crate::traits::{ToolContext, ToolRegistry};

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    tools: Arc<ToolRegistry>,
}

/// Start the server with the built-in tools. Runs until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    run_server_with_extensions(config, ToolRegistry::new()).await
}

/// Start the server with custom Rust tools served alongside the built-ins.
///
/// ```rust,no_run
/// use civ_library::server::run_server_with_extensions;
/// use civ_library::traits::ToolRegistry;
///
/// # async fn example(config: &civ_library::config::Config) -> anyhow::Result<()> {
/// let mut tools = ToolRegistry::new();
/// // tools.register(Box::new(MyTool::new()));
/// run_server_with_extensions(config, tools).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server_with_extensions(
    config: &Config,
    extra_tools: ToolRegistry,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let config = Arc::new(config.clone());

    let mut registry = ToolRegistry::with_builtins();
    for tool in extra_tools.into_tools() {
        if registry.find(tool.name()).is_some() {
            tracing::warn!(tool = tool.name(), "tool name already registered, skipping");
            continue;
        }
        registry.register(tool);
    }
    let tools = Arc::new(registry);

    for t in tools.tools() {
        let tag = if t.is_builtin() { "builtin" } else { "rust" };
        tracing::info!("POST /tools/{} ({}) {}", t.name(), tag, t.description());
    }

    let bridge_config = config.clone();
    let bridge_tools = tools.clone();
    let mcp_service = StreamableHttpService::new(
        move || Ok(McpBridge::new(bridge_config.clone(), bridge_tools.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/health", get(handle_health))
        .nest_service("/mcp", mcp_service)
        .layer(cors)
        .with_state(AppState { config, tools });

    println!("Tool server listening on http://{}", bind_addr);
    tracing::info!(bind = %bind_addr, "tool server starting");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

/// Map a tool failure to the closest HTTP status.
fn classify_tool_error(tool_name: &str, err: anyhow::Error) -> AppError {
    let msg = format!("{:#}", err);
    if msg.contains("timed out") {
        AppError {
            status: StatusCode::REQUEST_TIMEOUT,
            code: "timeout",
            message: format!("{}: {}", tool_name, msg),
        }
    } else if msg.contains("not found") {
        not_found(format!("{}: {}", tool_name, msg))
    } else {
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "tool_error",
            message: format!("{}: {}", tool_name, msg),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    library: String,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        library: state.config.library.host.clone(),
    })
}

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolInfo {
    name: String,
    description: String,
    builtin: bool,
    parameters: serde_json::Value,
}

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let tools = state
        .tools
        .tools()
        .iter()
        .map(|t| ToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
            builtin: t.is_builtin(),
            parameters: t.parameters_schema(),
        })
        .collect();
    Json(ToolListResponse { tools })
}

// ============ POST /tools/{name} ============

async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tool = state
        .tools
        .find(&name)
        .ok_or_else(|| not_found(format!("no tool registered with name: {}", name)))?;

    if !params.is_object() {
        return Err(bad_request("params must be a JSON object"));
    }

    let ctx = ToolContext::new(state.config.clone());
    let result = tool
        .execute(params, &ctx)
        .await
        .map_err(|e| classify_tool_error(&name, e))?;

    Ok(Json(serde_json::json!({ "result": result })))
}
