//! HTTP and WebSocket server.
//!
//! Exposes the query loop, the video summarizer and the live voice bridge
//! to browser clients.

use crate::agent::{OpenAIChatModel, QueryAgent};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::live::{GeminiLiveConnector, LiveBridge};
use crate::stats::StatsClient;
use crate::tools::ToolRegistry;
use crate::video::{GeminiVideoSummarizer, VideoSummarizer};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures::{future, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info, warn};

/// Shared application state.
pub struct AppState {
    agent: QueryAgent,
    video: Arc<dyn VideoSummarizer>,
    bridge: LiveBridge,
}

impl AppState {
    pub fn new(agent: QueryAgent, video: Arc<dyn VideoSummarizer>, bridge: LiveBridge) -> Self {
        Self {
            agent,
            video,
            bridge,
        }
    }

    /// Wire the hosted models and the stats tools from settings.
    pub fn from_settings(settings: &Settings) -> crate::Result<Self> {
        let prompts = Prompts::load(settings.prompts_dir().as_deref())?;
        let tools = Arc::new(ToolRegistry::mlb(Arc::new(StatsClient::new(&settings.stats)?)));

        let agent = QueryAgent::new(Arc::new(OpenAIChatModel::new(&settings.model)?), tools.clone())
            .with_prompts(prompts.query)
            .with_max_iterations(settings.query.max_iterations)
            .with_max_tool_result_chars(settings.query.max_tool_result_chars);

        let video = Arc::new(GeminiVideoSummarizer::new(
            &settings.video,
            &settings.model,
            &prompts.video.summary,
        )?);

        let bridge = LiveBridge::new(
            Arc::new(GeminiLiveConnector::new(&settings.live, &settings.model)?),
            tools,
            &settings.live.model,
        );

        Ok(Self::new(agent, video, bridge))
    }
}

/// Build the router over shared state.
pub fn router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/generate", get(generate))
        .route("/generateVideoSummary", get(generate_video_summary))
        .route("/ws", get(websocket))
        .layer(cors)
        .with_state(state)
}

/// CORS policy for the configured origins. `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match allowed_origins(origins) {
        Some(origins) => layer.allow_origin(AllowOrigin::list(origins)),
        None => layer.allow_origin(Any),
    }
}

/// Parsed origin list, or `None` when `*` allows every origin.
fn allowed_origins(origins: &[String]) -> Option<Vec<HeaderValue>> {
    if origins.iter().any(|o| o == "*") {
        return None;
    }

    Some(
        origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin {}", origin);
                    None
                }
            })
            .collect(),
    )
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings.model) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let state = Arc::new(AppState::from_settings(&settings)?);
    let app = router(state, cors_layer(&settings.server.cors_origins));

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Dugout Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET /health");
    Output::kv("Query", "GET /generate?query=");
    Output::kv("Video summary", "GET /generateVideoSummary?query=");
    Output::kv("Live voice", "GET /ws (WebSocket)");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct QueryParams {
    query: Option<String>,
}

impl QueryParams {
    fn query(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn generate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Response {
    let Some(query) = params.query() else {
        return error_response(StatusCode::BAD_REQUEST, "No query provided");
    };

    info!("Query: {}", query);
    match state.agent.run(query).await {
        Ok(outcome) => Json(outcome.response).into_response(),
        Err(e) => {
            error!("Query failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred while processing the query",
            )
        }
    }
}

async fn generate_video_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Response {
    let Some(uri) = params.query() else {
        return error_response(StatusCode::BAD_REQUEST, "No query provided");
    };

    info!("Summarizing video {}", uri);
    match state.video.summarize(uri).await {
        Ok(summary) => Json(SummaryResponse { summary }).into_response(),
        Err(e) => {
            error!("Video summary failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred while summarizing the video",
            )
        }
    }
}

async fn websocket(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Bridge one client socket to a live session.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = uuid::Uuid::new_v4().to_string();
    info!(connection_id = %connection_id, "WebSocket connected");

    let (sender, receiver) = socket.split();

    let frames = Box::pin(
        receiver
            .take_while(|msg| future::ready(!matches!(msg, Err(_) | Ok(Message::Close(_)))))
            .filter_map(|msg| {
                future::ready(match msg {
                    Ok(Message::Text(text)) => Some(text.as_str().to_string()),
                    Ok(Message::Binary(bytes)) => String::from_utf8(bytes.to_vec()).ok(),
                    _ => None,
                })
            }),
    );
    let replies = sender.with(|text: String| {
        future::ready(Ok::<Message, axum::Error>(Message::Text(text.into())))
    });

    if let Err(e) = state.bridge.run(frames, replies).await {
        error!(connection_id = %connection_id, "Live bridge failed: {}", e);
    }
    info!(connection_id = %connection_id, "WebSocket disconnected");
}
