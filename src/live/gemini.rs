//! Gemini Live `BidiGenerateContent` session over tokio-tungstenite.

use super::{
    FunctionCall, FunctionResponse, LiveConnector, LiveEvent, LiveReceiver,
    LiveSender, MediaChunk,
};
use crate::config::{LiveSettings, ModelSettings};
use crate::error::{DugoutError, Result};
use async_trait::async_trait;
use base64::prelude::*;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, instrument};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens Gemini Live sessions with the configured key.
pub struct GeminiLiveConnector {
    endpoint: Url,
}

impl GeminiLiveConnector {
    pub fn new(live: &LiveSettings, model: &ModelSettings) -> Result<Self> {
        let api_key = model
            .api_key()
            .ok_or_else(|| DugoutError::Config(format!("{} is not set", model.api_key_env)))?;
        Self::with_endpoint(&live.ws_url, &api_key)
    }

    pub fn with_endpoint(ws_url: &str, api_key: &str) -> Result<Self> {
        let mut endpoint = Url::parse(ws_url)
            .map_err(|e| DugoutError::Config(format!("Invalid live URL {}: {}", ws_url, e)))?;
        endpoint.query_pairs_mut().append_pair("key", api_key);
        Ok(Self { endpoint })
    }
}

/// Text content of a server message. Control frames yield `None`.
fn frame_text(message: Message) -> Result<Option<String>> {
    match message {
        Message::Text(text) => Ok(Some(text)),
        Message::Binary(bytes) => String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| DugoutError::MalformedResponse(format!("Binary frame is not UTF-8: {}", e))),
        _ => Ok(None),
    }
}

#[async_trait]
impl LiveConnector for GeminiLiveConnector {
    #[instrument(skip_all)]
    async fn connect(&self, setup: Value) -> Result<(Arc<dyn LiveSender>, Box<dyn LiveReceiver>)> {
        let (stream, _) = connect_async(self.endpoint.as_str()).await?;
        let (mut write, mut read) = stream.split();

        write
            .send(Message::Text(json!({ "setup": setup }).to_string()))
            .await?;

        loop {
            let message = read
                .next()
                .await
                .ok_or_else(|| DugoutError::Live("Session closed during setup".to_string()))??;

            if let Message::Close(frame) = &message {
                return Err(DugoutError::Live(format!("Setup rejected: {:?}", frame)));
            }
            let Some(text) = frame_text(message)? else {
                continue;
            };
            let value: Value = serde_json::from_str(&text)
                .map_err(|e| DugoutError::MalformedResponse(format!("Setup reply: {}", e)))?;
            if value.get("setupComplete").is_some() {
                break;
            }
            debug!("Ignoring frame before setupComplete");
        }

        info!("Gemini live session ready");
        Ok((
            Arc::new(GeminiLiveSender {
                write: Mutex::new(write),
            }),
            Box::new(GeminiLiveReceiver {
                read,
                pending: VecDeque::new(),
            }),
        ))
    }
}

struct GeminiLiveSender {
    write: Mutex<SplitSink<WsStream, Message>>,
}

impl GeminiLiveSender {
    async fn send_json(&self, payload: Value) -> Result<()> {
        self.write
            .lock()
            .await
            .send(Message::Text(payload.to_string()))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LiveSender for GeminiLiveSender {
    async fn send_media(&self, chunk: &MediaChunk) -> Result<()> {
        self.send_json(json!({
            "realtimeInput": {
                "mediaChunks": [{ "mimeType": chunk.mime_type, "data": chunk.data }]
            }
        }))
        .await
    }

    async fn send_tool_responses(&self, responses: &[FunctionResponse]) -> Result<()> {
        self.send_json(json!({ "toolResponse": { "functionResponses": responses } }))
            .await
    }

    async fn close(&self) -> Result<()> {
        self.write.lock().await.close().await?;
        Ok(())
    }
}

struct GeminiLiveReceiver {
    read: SplitStream<WsStream>,
    pending: VecDeque<LiveEvent>,
}

#[async_trait]
impl LiveReceiver for GeminiLiveReceiver {
    async fn next_event(&mut self) -> Result<Option<LiveEvent>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }

            let Some(message) = self.read.next().await else {
                return Ok(None);
            };
            let message = message?;
            if let Message::Close(frame) = &message {
                info!("Live model closed the session: {:?}", frame);
                return Ok(None);
            }

            let Some(text) = frame_text(message)? else {
                continue;
            };
            let value: Value = serde_json::from_str(&text)
                .map_err(|e| DugoutError::MalformedResponse(format!("Live frame: {}", e)))?;
            self.pending.extend(parse_server_frame(&value)?);
        }
    }
}

/// Turn one server message into events, in the order they should reach the client.
pub fn parse_server_frame(frame: &Value) -> Result<Vec<LiveEvent>> {
    let mut events = Vec::new();

    if let Some(calls) = frame
        .pointer("/toolCall/functionCalls")
        .and_then(Value::as_array)
    {
        let calls = calls
            .iter()
            .map(|call| FunctionCall {
                id: call.get("id").and_then(Value::as_str).unwrap_or_default().to_string(),
                name: call.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                args: call
                    .get("args")
                    .cloned()
                    .unwrap_or_else(|| Value::Object(Map::new())),
            })
            .collect();
        events.push(LiveEvent::ToolCall(calls));
    }

    let Some(content) = frame.get("serverContent") else {
        return Ok(events);
    };

    if let Some(parts) = content
        .pointer("/modelTurn/parts")
        .and_then(Value::as_array)
    {
        for part in parts {
            if let Some(text) = part.get("text").and_then(Value::as_str) {
                events.push(LiveEvent::Text(text.to_string()));
            } else if let Some(data) = part.pointer("/inlineData/data").and_then(Value::as_str) {
                let bytes = BASE64_STANDARD
                    .decode(data)
                    .map_err(|e| DugoutError::MalformedResponse(format!("Inline data: {}", e)))?;
                events.push(LiveEvent::Audio(bytes));
            }
        }
    }

    if content.get("turnComplete").and_then(Value::as_bool) == Some(true) {
        events.push(LiveEvent::TurnComplete);
    }

    Ok(events)
}
