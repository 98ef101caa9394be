//! Dugout - MLB tool calling for conversational models
//!
//! A server-side adapter that lets a conversational model answer questions
//! about Major League Baseball by calling the public MLB stats API, then
//! summarizing what it found.
//!
//! # Overview
//!
//! Dugout offers three entry points:
//! - `GET /generate?query=` resolves a text question into stats API tool calls
//!   and returns the last result merged with the model's summary
//! - `GET /ws` bridges a browser voice session to a live model that can call
//!   the same tools mid-conversation
//! - `GET /generateVideoSummary?query=` describes a game video by URI
//!
//! # Architecture
//!
//! - `config` - Configuration and prompt templates
//! - `stats` - MLB stats API client and response reshaping
//! - `tools` - Tool registry and the MLB tool handlers
//! - `agent` - Request/response query loop
//! - `live` - Streaming voice bridge
//! - `video` - Video summaries
//! - `cli` - Command line interface and HTTP server
//!
//! # Example
//!
//! ```rust,no_run
//! use dugout::agent::{OpenAIChatModel, QueryAgent};
//! use dugout::config::Settings;
//! use dugout::stats::StatsClient;
//! use dugout::tools::ToolRegistry;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let tools = Arc::new(ToolRegistry::mlb(Arc::new(StatsClient::new(&settings.stats)?)));
//!     let agent = QueryAgent::new(Arc::new(OpenAIChatModel::new(&settings.model)?), tools);
//!
//!     let outcome = agent.run("Who is on the Yankees roster this season?").await?;
//!     println!("{}", outcome.response);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod live;
pub mod openai;
pub mod stats;
pub mod tools;
pub mod video;

pub use error::{DugoutError, Result};
