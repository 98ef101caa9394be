//! Conversational model abstraction and its OpenAI-compatible implementation.

use crate::config::ModelSettings;
use crate::error::{DugoutError, Result};
use crate::openai::create_client;
use crate::tools::ToolSpec;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestToolMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionToolType,
    CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    User(String),
    Model(String),
    ToolRequest(Vec<ToolInvocation>),
    ToolResponse {
        call_id: String,
        name: String,
        content: String,
    },
}

/// What the model answered to the latest turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    ToolCalls(Vec<ToolInvocation>),
    Text(String),
}

/// A hosted conversational model: turns in, text or tool calls out.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn reply(&self, turns: &[Turn], tools: &[ToolSpec]) -> Result<ModelReply>;
}

/// Chat model reached through an OpenAI-compatible chat completions API.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    /// Create a model client from settings. Fails when the API key is missing.
    pub fn new(settings: &ModelSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            model: settings.chat_model.clone(),
            temperature: settings.temperature,
        })
    }

    fn to_messages(turns: &[Turn]) -> Result<Vec<ChatCompletionRequestMessage>> {
        turns
            .iter()
            .map(|turn| {
                let message: ChatCompletionRequestMessage = match turn {
                    Turn::User(text) => ChatCompletionRequestUserMessageArgs::default()
                        .content(text.clone())
                        .build()
                        .map_err(|e| DugoutError::Model(e.to_string()))?
                        .into(),
                    Turn::Model(text) => ChatCompletionRequestAssistantMessageArgs::default()
                        .content(text.clone())
                        .build()
                        .map_err(|e| DugoutError::Model(e.to_string()))?
                        .into(),
                    Turn::ToolRequest(calls) => ChatCompletionRequestAssistantMessageArgs::default()
                        .tool_calls(
                            calls
                                .iter()
                                .map(|call| ChatCompletionMessageToolCall {
                                    id: call.id.clone(),
                                    r#type: ChatCompletionToolType::Function,
                                    function: FunctionCall {
                                        name: call.name.clone(),
                                        arguments: call.arguments.to_string(),
                                    },
                                })
                                .collect::<Vec<_>>(),
                        )
                        .build()
                        .map_err(|e| DugoutError::Model(e.to_string()))?
                        .into(),
                    Turn::ToolResponse {
                        call_id, content, ..
                    } => ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(call_id.clone())
                        .content(content.clone())
                        .build()
                        .map_err(|e| DugoutError::Model(e.to_string()))?
                        .into(),
                };
                Ok(message)
            })
            .collect()
    }

    fn to_tools(tools: &[ToolSpec]) -> Vec<ChatCompletionTool> {
        tools
            .iter()
            .map(|spec| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: spec.name.clone(),
                    description: Some(spec.description.clone()),
                    parameters: Some(spec.parameters.clone()),
                    strict: None,
                },
            })
            .collect()
    }
}

/// Parse the JSON argument string of a tool call. Blank means no arguments.
pub(crate) fn parse_arguments(raw: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(raw)
        .map_err(|e| DugoutError::Model(format!("Invalid tool arguments: {}", e)))
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, turns, tools), fields(turns = turns.len()))]
    async fn reply(&self, turns: &[Turn], tools: &[ToolSpec]) -> Result<ModelReply> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .temperature(self.temperature)
            .messages(Self::to_messages(turns)?);
        if !tools.is_empty() {
            builder.tools(Self::to_tools(tools));
        }
        let request = builder
            .build()
            .map_err(|e| DugoutError::Model(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| DugoutError::Model(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DugoutError::Model("No response from model".to_string()))?;

        match choice.message.tool_calls {
            Some(calls) if !calls.is_empty() => {
                debug!("Model requested {} tool call(s)", calls.len());
                let invocations = calls
                    .into_iter()
                    .map(|call| {
                        Ok(ToolInvocation {
                            id: if call.id.is_empty() {
                                uuid::Uuid::new_v4().to_string()
                            } else {
                                call.id
                            },
                            arguments: parse_arguments(&call.function.arguments)?,
                            name: call.function.name,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(ModelReply::ToolCalls(invocations))
            }
            _ => Ok(ModelReply::Text(choice.message.content.unwrap_or_default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_arguments() {
        assert_eq!(
            parse_arguments(r#"{"team_id": "147", "season": "2024"}"#).unwrap(),
            json!({ "team_id": "147", "season": "2024" })
        );
        assert_eq!(parse_arguments("  ").unwrap(), json!({}));
        assert!(parse_arguments("{not json").is_err());
    }

    #[test]
    fn test_conversation_maps_to_messages() {
        let turns = vec![
            Turn::User("Who is on the Yankees roster?".to_string()),
            Turn::ToolRequest(vec![ToolInvocation {
                id: "call_1".to_string(),
                name: "get_roster".to_string(),
                arguments: json!({ "team_id": "147" }),
            }]),
            Turn::ToolResponse {
                call_id: "call_1".to_string(),
                name: "get_roster".to_string(),
                content: "{}".to_string(),
            },
            Turn::Model("26 players.".to_string()),
        ];

        let messages = OpenAIChatModel::to_messages(&turns).unwrap();
        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::Tool(_)));
    }

    #[test]
    fn test_tool_specs_map_to_functions() {
        let specs = vec![ToolSpec {
            name: "get_roster".to_string(),
            description: "Roster".to_string(),
            parameters: json!({ "type": "object" }),
        }];
        let tools = OpenAIChatModel::to_tools(&specs);
        assert_eq!(tools[0].function.name, "get_roster");
        assert_eq!(tools[0].function.description.as_deref(), Some("Roster"));
    }
}
