//! Streaming voice bridge between a browser client and a live model.
//!
//! Each WebSocket connection opens its own live session. Two relays run
//! side by side: client media flows into the session, and model output
//! (text, audio, tool calls) flows back to the client. Tool calls are
//! answered locally through the [`ToolRegistry`](crate::tools::ToolRegistry).

mod bridge;
mod gemini;

pub use bridge::{
    answer_tool_calls, parse_client_frame, parse_setup, prepare_setup, relay_inbound,
    relay_outbound, LiveBridge,
};
pub use gemini::{parse_server_frame, GeminiLiveConnector};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// One piece of realtime media sent by the client, base64 payload included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaChunk {
    #[serde(alias = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

/// A function call requested by the live model.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub id: String,
    pub name: String,
    pub args: Value,
}

/// Answer to one function call, in the shape the model and client expect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
    pub id: String,
}

/// Output of a live session.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    Text(String),
    Audio(Vec<u8>),
    ToolCall(Vec<FunctionCall>),
    TurnComplete,
}

/// Opens live model sessions.
#[async_trait]
pub trait LiveConnector: Send + Sync {
    /// Open a session with the given setup and wait until the model accepts it.
    async fn connect(&self, setup: Value) -> Result<(Arc<dyn LiveSender>, Box<dyn LiveReceiver>)>;
}

/// Write half of a live session. Shared by both relays.
#[async_trait]
pub trait LiveSender: Send + Sync {
    async fn send_media(&self, chunk: &MediaChunk) -> Result<()>;
    async fn send_tool_responses(&self, responses: &[FunctionResponse]) -> Result<()>;
    async fn close(&self) -> Result<()>;
}

/// Read half of a live session. `None` means the session ended.
#[async_trait]
pub trait LiveReceiver: Send {
    async fn next_event(&mut self) -> Result<Option<LiveEvent>>;
}
