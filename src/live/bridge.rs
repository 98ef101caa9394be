//! Relays between a client socket and a live model session.

use super::{
    FunctionCall, FunctionResponse, LiveConnector, LiveEvent, LiveReceiver,
    LiveSender, MediaChunk,
};
use crate::error::{DugoutError, Result};
use crate::tools::{ToolArgs, ToolRegistry, ToolSpec};
use base64::prelude::*;
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Deserialize)]
struct ClientFrame {
    #[serde(alias = "realtimeInput")]
    realtime_input: Option<RealtimeInput>,
}

#[derive(Deserialize)]
struct RealtimeInput {
    #[serde(default, alias = "mediaChunks")]
    media_chunks: Vec<MediaChunk>,
}

/// Read the `{setup: {...}}` handshake. A frame without `setup` yields an empty config.
pub fn parse_setup(frame: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(frame)
        .map_err(|e| DugoutError::InvalidInput(format!("Setup frame is not JSON: {}", e)))?;

    match value.get("setup") {
        None | Some(Value::Null) => Ok(Value::Object(Map::new())),
        Some(setup @ Value::Object(_)) => Ok(setup.clone()),
        Some(_) => Err(DugoutError::InvalidInput(
            "Setup must be a JSON object".to_string(),
        )),
    }
}

/// Fill in the model when the client left it out and declare the tools.
pub fn prepare_setup(setup: Value, default_model: &str, tools: &[ToolSpec]) -> Value {
    let mut setup = match setup {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    setup
        .entry("model")
        .or_insert_with(|| Value::String(default_model.to_string()));
    setup.insert(
        "tools".to_string(),
        json!([{ "functionDeclarations": tools }]),
    );
    Value::Object(setup)
}

/// Extract the media chunks of one client frame.
pub fn parse_client_frame(frame: &str) -> Result<Vec<MediaChunk>> {
    let parsed: ClientFrame = serde_json::from_str(frame)
        .map_err(|e| DugoutError::InvalidInput(format!("Client frame is not valid: {}", e)))?;

    parsed
        .realtime_input
        .map(|input| input.media_chunks)
        .ok_or_else(|| DugoutError::InvalidInput("Client frame has no realtime input".to_string()))
}

/// Run every call through the registry. Unknown tools get no answer.
pub async fn answer_tool_calls(tools: &ToolRegistry, calls: &[FunctionCall]) -> Vec<FunctionResponse> {
    let mut responses = Vec::with_capacity(calls.len());

    for call in calls {
        let args = ToolArgs::from(call.args.clone());
        let response = match tools.dispatch(&call.name, &args).await {
            Ok(result) => json!({ "result": result }),
            Err(DugoutError::UnknownTool(name)) => {
                warn!("Live model requested unknown tool {}", name);
                continue;
            }
            Err(e) => {
                warn!("Tool {} failed: {}", call.name, e);
                json!({ "error": e.to_string() })
            }
        };

        responses.push(FunctionResponse {
            name: call.name.clone(),
            response,
            id: call.id.clone(),
        });
    }

    responses
}

/// Forward client media to the session until the client goes away.
pub async fn relay_inbound<S>(mut client: S, session: Arc<dyn LiveSender>) -> Result<()>
where
    S: Stream<Item = String> + Unpin,
{
    while let Some(frame) = client.next().await {
        let chunks = match parse_client_frame(&frame) {
            Ok(chunks) => chunks,
            Err(e) => {
                debug!("Skipping client frame: {}", e);
                continue;
            }
        };

        for chunk in &chunks {
            session.send_media(chunk).await?;
        }
    }

    info!("Client stopped sending");
    Ok(())
}

async fn send_to_client<K>(client: &mut K, payload: Value) -> Result<()>
where
    K: Sink<String> + Unpin,
    K::Error: std::fmt::Display,
{
    client
        .send(payload.to_string())
        .await
        .map_err(|e| DugoutError::Live(format!("Failed to send to client: {}", e)))
}

/// Forward session output to the client, answering tool calls on the way.
pub async fn relay_outbound<K>(
    mut receiver: Box<dyn LiveReceiver>,
    session: Arc<dyn LiveSender>,
    mut client: K,
    tools: Arc<ToolRegistry>,
) -> Result<()>
where
    K: Sink<String> + Unpin,
    K::Error: std::fmt::Display,
{
    while let Some(event) = receiver.next_event().await? {
        match event {
            LiveEvent::Text(text) => send_to_client(&mut client, json!({ "text": text })).await?,
            LiveEvent::Audio(bytes) => {
                send_to_client(&mut client, json!({ "audio": BASE64_STANDARD.encode(bytes) }))
                    .await?
            }
            LiveEvent::TurnComplete => info!("Turn complete"),
            LiveEvent::ToolCall(calls) => {
                info!("Live model requested {} tool call(s)", calls.len());
                let responses = answer_tool_calls(&tools, &calls).await;
                if !responses.is_empty() {
                    let batch = serde_json::to_string(&responses)?;
                    send_to_client(&mut client, json!({ "text": batch })).await?;
                }
                session.send_tool_responses(&responses).await?;
            }
        }
    }

    info!("Live session ended");
    Ok(())
}

/// Per-connection driver: handshake, open the session, run both relays.
pub struct LiveBridge {
    connector: Arc<dyn LiveConnector>,
    tools: Arc<ToolRegistry>,
    default_model: String,
}

impl LiveBridge {
    pub fn new(connector: Arc<dyn LiveConnector>, tools: Arc<ToolRegistry>, default_model: &str) -> Self {
        Self {
            connector,
            tools,
            default_model: default_model.to_string(),
        }
    }

    /// Serve one client until either side hangs up.
    pub async fn run<S, K>(&self, mut client_rx: S, client_tx: K) -> Result<()>
    where
        S: Stream<Item = String> + Unpin,
        K: Sink<String> + Unpin,
        K::Error: std::fmt::Display,
    {
        let Some(first) = client_rx.next().await else {
            debug!("Client left before setup");
            return Ok(());
        };

        let setup = prepare_setup(
            parse_setup(&first)?,
            &self.default_model,
            &self.tools.describe_all(),
        );
        let (sender, receiver) = self.connector.connect(setup).await?;
        info!("Live session open");

        let result = tokio::select! {
            r = relay_inbound(client_rx, sender.clone()) => r,
            r = relay_outbound(receiver, sender.clone(), client_tx, self.tools.clone()) => r,
        };

        if let Err(e) = &result {
            warn!("Live relay stopped: {}", e);
        }
        if let Err(e) = sender.close().await {
            debug!("Closing live session: {}", e);
        }
        info!("Live session closed");

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{string_params, ToolHandler, ToolName};
    use async_trait::async_trait;
    use futures::channel::mpsc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSender {
        media: Mutex<Vec<MediaChunk>>,
        responses: Mutex<Vec<Vec<FunctionResponse>>>,
        closed: Mutex<bool>,
    }

    #[async_trait]
    impl LiveSender for RecordingSender {
        async fn send_media(&self, chunk: &MediaChunk) -> Result<()> {
            self.media.lock().unwrap().push(chunk.clone());
            Ok(())
        }

        async fn send_tool_responses(&self, responses: &[FunctionResponse]) -> Result<()> {
            self.responses.lock().unwrap().push(responses.to_vec());
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    /// Yields scripted events; stays open while its channel sender lives.
    struct ScriptedReceiver(tokio::sync::mpsc::UnboundedReceiver<LiveEvent>);

    #[async_trait]
    impl LiveReceiver for ScriptedReceiver {
        async fn next_event(&mut self) -> Result<Option<LiveEvent>> {
            Ok(self.0.recv().await)
        }
    }

    struct MockConnector {
        sender: Arc<RecordingSender>,
        receiver: Mutex<Option<ScriptedReceiver>>,
        setups: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl LiveConnector for MockConnector {
        async fn connect(&self, setup: Value) -> Result<(Arc<dyn LiveSender>, Box<dyn LiveReceiver>)> {
            self.setups.lock().unwrap().push(setup);
            let receiver = self
                .receiver
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| DugoutError::Live("already connected".to_string()))?;
            Ok((self.sender.clone(), Box::new(receiver)))
        }
    }

    struct RosterTool;

    #[async_trait]
    impl ToolHandler for RosterTool {
        async fn call(&self, args: &ToolArgs) -> Result<Value> {
            Ok(json!({ "teamId": args.require("team_id")? }))
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(
            ToolName::GetRoster,
            "Roster",
            string_params(&[("team_id", "Team id")]),
            Arc::new(RosterTool),
        );
        Arc::new(registry)
    }

    fn call(id: &str, name: &str, args: Value) -> FunctionCall {
        FunctionCall {
            id: id.to_string(),
            name: name.to_string(),
            args,
        }
    }

    #[test]
    fn test_parse_setup() {
        let setup = parse_setup(r#"{"setup": {"generationConfig": {"responseModalities": ["AUDIO"]}}}"#)
            .unwrap();
        assert_eq!(setup["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(parse_setup("{}").unwrap(), json!({}));
        assert!(parse_setup(r#"{"setup": 3}"#).is_err());
        assert!(parse_setup("hello").is_err());
    }

    #[test]
    fn test_prepare_setup_injects_tools_and_model() {
        let specs = registry().describe_all();
        let setup = prepare_setup(json!({ "tools": "client value" }), "models/live", &specs);
        assert_eq!(setup["model"], "models/live");
        assert_eq!(
            setup["tools"][0]["functionDeclarations"][0]["name"],
            "get_roster"
        );

        let setup = prepare_setup(json!({ "model": "models/custom" }), "models/live", &specs);
        assert_eq!(setup["model"], "models/custom");
    }

    #[test]
    fn test_parse_client_frame() {
        let chunks = parse_client_frame(
            r#"{"realtime_input": {"media_chunks": [
                {"mime_type": "audio/pcm", "data": "AAAA"},
                {"mime_type": "image/jpeg", "data": "/9j/"}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].mime_type, "image/jpeg");

        assert!(parse_client_frame(r#"{"client_content": {}}"#).is_err());
        assert!(parse_client_frame("not json").is_err());
    }

    #[tokio::test]
    async fn test_answer_tool_calls() {
        let responses = answer_tool_calls(
            &registry(),
            &[
                call("a", "get_roster", json!({ "team_id": "147" })),
                call("b", "get_weather", json!({})),
                call("c", "get_roster", json!({})),
            ],
        )
        .await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].response, json!({ "result": { "teamId": "147" } }));
        assert_eq!(responses[0].id, "a");
        assert!(responses[1].response["error"]
            .as_str()
            .unwrap()
            .contains("team_id"));
    }

    #[tokio::test]
    async fn test_outbound_relay() {
        let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
        for event in [
            LiveEvent::Text("Judge is up.".to_string()),
            LiveEvent::Audio(vec![1, 2, 3]),
            LiveEvent::ToolCall(vec![call("a", "get_roster", json!({ "team_id": "147" }))]),
            LiveEvent::TurnComplete,
        ] {
            events_tx.send(event).unwrap();
        }
        drop(events_tx);

        let sender = Arc::new(RecordingSender::default());
        let (client_tx, client_rx) = mpsc::unbounded::<String>();

        relay_outbound(
            Box::new(ScriptedReceiver(events_rx)),
            sender.clone(),
            client_tx,
            registry(),
        )
        .await
        .unwrap();

        let sent: Vec<Value> = client_rx
            .collect::<Vec<_>>()
            .await
            .iter()
            .map(|s| serde_json::from_str(s).unwrap())
            .collect();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0], json!({ "text": "Judge is up." }));
        assert_eq!(sent[1], json!({ "audio": "AQID" }));

        let batch: Value = serde_json::from_str(sent[2]["text"].as_str().unwrap()).unwrap();
        assert_eq!(
            batch,
            json!([{ "name": "get_roster", "response": { "result": { "teamId": "147" } }, "id": "a" }])
        );
        assert_eq!(sender.responses.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bridge_forwards_media_and_closes() {
        let (_events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
        let sender = Arc::new(RecordingSender::default());
        let connector = Arc::new(MockConnector {
            sender: sender.clone(),
            receiver: Mutex::new(Some(ScriptedReceiver(events_rx))),
            setups: Mutex::new(Vec::new()),
        });
        let bridge = LiveBridge::new(connector.clone(), registry(), "models/live");

        let (frames_tx, frames_rx) = mpsc::unbounded::<String>();
        for frame in [
            r#"{"setup": {}}"#,
            "garbage",
            r#"{"realtime_input": {"media_chunks": [{"mime_type": "audio/pcm", "data": "AAAA"}]}}"#,
        ] {
            frames_tx.unbounded_send(frame.to_string()).unwrap();
        }
        drop(frames_tx);
        let (client_tx, _client_rx) = mpsc::unbounded::<String>();

        bridge.run(frames_rx, client_tx).await.unwrap();

        let setups = connector.setups.lock().unwrap();
        assert_eq!(setups[0]["model"], "models/live");
        assert_eq!(sender.media.lock().unwrap().len(), 1);
        assert_eq!(sender.media.lock().unwrap()[0].data, "AAAA");
        assert!(*sender.closed.lock().unwrap());
    }

    #[tokio::test]
    async fn test_bridge_without_setup() {
        let connector = Arc::new(MockConnector {
            sender: Arc::new(RecordingSender::default()),
            receiver: Mutex::new(None),
            setups: Mutex::new(Vec::new()),
        });
        let bridge = LiveBridge::new(connector.clone(), registry(), "models/live");
        let (frames_tx, frames_rx) = mpsc::unbounded::<String>();
        drop(frames_tx);
        let (client_tx, _client_rx) = mpsc::unbounded::<String>();

        bridge.run(frames_rx, client_tx).await.unwrap();
        assert!(connector.setups.lock().unwrap().is_empty());
    }
}
