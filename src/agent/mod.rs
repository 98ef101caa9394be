//! Request/response query loop with tool calling.
//!
//! A [`QueryAgent`] opens a fresh conversation with a [`ChatModel`] per
//! query, dispatches every tool call the model requests through the
//! [`ToolRegistry`](crate::tools::ToolRegistry), and merges the last tool
//! result with the model's closing summary.

mod model;
mod response;
mod runner;

pub use model::{ChatModel, ModelReply, OpenAIChatModel, ToolInvocation, Turn};
pub use response::{clean_summary, merge_response, truncate_chars};
pub use runner::{QueryAgent, QueryResponse, ToolCallRecord};
