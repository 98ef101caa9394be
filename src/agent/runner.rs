//! Query runner with tool calling loop.

use super::model::{ChatModel, ModelReply, ToolInvocation, Turn};
use super::response::{clean_summary, merge_response, truncate_chars};
use crate::config::{QueryPrompts, QuerySettings};
use crate::error::{DugoutError, Result};
use crate::tools::{ToolArgs, ToolRegistry};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Resolves one text query into tool calls and a summarized answer.
pub struct QueryAgent {
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    prompts: QueryPrompts,
    max_iterations: usize,
    max_tool_result_chars: usize,
}

impl QueryAgent {
    /// Create a new agent over the given model and tool registry.
    pub fn new(model: Arc<dyn ChatModel>, tools: Arc<ToolRegistry>) -> Self {
        let limits = QuerySettings::default();
        Self {
            model,
            tools,
            prompts: QueryPrompts::default(),
            max_iterations: limits.max_iterations,
            max_tool_result_chars: limits.max_tool_result_chars,
        }
    }

    /// Set the prompts used to frame every query.
    pub fn with_prompts(mut self, prompts: QueryPrompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the character budget for each tool result sent back to the model.
    pub fn with_max_tool_result_chars(mut self, max: usize) -> Self {
        self.max_tool_result_chars = max;
        self
    }

    /// Run one query in a fresh conversation.
    pub async fn run(&self, query: &str) -> Result<QueryResponse> {
        let mut turns = vec![Turn::User(self.prompts.render(query))];
        let specs = self.tools.describe_all();

        let mut iterations = 0;
        let mut tool_calls = Vec::new();
        let mut last_result: Option<Value> = None;

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(DugoutError::Agent(format!(
                    "Query exceeded maximum iterations ({})",
                    self.max_iterations
                )));
            }

            debug!("Query iteration {}", iterations);

            let calls = match self.model.reply(&turns, &specs).await? {
                ModelReply::Text(text) => {
                    let summary = clean_summary(&text);
                    return Ok(QueryResponse {
                        response: merge_response(last_result.as_ref(), &summary),
                        summary,
                        tool_calls,
                        iterations,
                    });
                }
                ModelReply::ToolCalls(calls) => calls,
            };

            turns.push(Turn::ToolRequest(calls.clone()));

            for call in calls {
                let (content, record) = self.execute_tool_call(&call).await?;
                if let Some(result) = record.result.clone() {
                    last_result = Some(result);
                }

                turns.push(Turn::ToolResponse {
                    call_id: call.id,
                    name: call.name,
                    content,
                });
                tool_calls.push(record);
            }
        }
    }

    /// Execute one call, returning the payload for the model and a record of it.
    async fn execute_tool_call(&self, call: &ToolInvocation) -> Result<(String, ToolCallRecord)> {
        info!("Model calling tool: {} with args: {}", call.name, call.arguments);

        let args = ToolArgs::from(call.arguments.clone());
        let (payload, result) = match self.tools.dispatch(&call.name, &args).await {
            Ok(value) => (value.to_string(), Some(value)),
            Err(DugoutError::UnknownTool(name)) => {
                warn!("Model requested unknown tool {}", name);
                (
                    json!({ "error": format!("Unknown tool: {}", name) }).to_string(),
                    None,
                )
            }
            Err(e @ (DugoutError::ExternalApi(_) | DugoutError::MalformedResponse(_))) => {
                warn!("Tool {} failed: {}", call.name, e);
                let report = json!({ "error": e.to_string() });
                (report.to_string(), Some(report))
            }
            Err(e) => return Err(e),
        };

        let content = truncate_chars(&payload, self.max_tool_result_chars).to_string();
        if content.len() < payload.len() {
            debug!(
                "Truncated {} result to {} characters",
                call.name, self.max_tool_result_chars
            );
        }

        Ok((
            content,
            ToolCallRecord {
                name: call.name.clone(),
                arguments: call.arguments.to_string(),
                result,
            },
        ))
    }
}

/// Outcome of a query run.
#[derive(Debug)]
pub struct QueryResponse {
    /// Last tool result merged with the summary under `"response"`.
    pub response: Value,
    /// Cleaned final text from the model.
    pub summary: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of iterations (model calls) used.
    pub iterations: usize,
}

/// Record of a tool call made during a query.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Untruncated result, `None` when the tool was unknown.
    /// A failed stats lookup is recorded as its `{"error": ...}` report.
    pub result: Option<Value>,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}
