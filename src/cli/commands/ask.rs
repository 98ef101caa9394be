//! Ask command implementation.

use crate::agent::{OpenAIChatModel, QueryAgent};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::stats::StatsClient;
use crate::tools::ToolRegistry;
use anyhow::Result;
use std::sync::Arc;

/// Run the ask command.
pub async fn run_ask(query: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings.model) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let prompts = Prompts::load(settings.prompts_dir().as_deref())?;
    let tools = Arc::new(ToolRegistry::mlb(Arc::new(StatsClient::new(&settings.stats)?)));
    let agent = QueryAgent::new(Arc::new(OpenAIChatModel::new(&settings.model)?), tools)
        .with_prompts(prompts.query)
        .with_max_iterations(settings.query.max_iterations)
        .with_max_tool_result_chars(settings.query.max_tool_result_chars);

    let spinner = Output::spinner("Asking the stats API...");

    match agent.run(query).await {
        Ok(outcome) => {
            spinner.finish_and_clear();

            println!("\n{}\n", outcome.summary);

            if !outcome.tool_calls.is_empty() {
                Output::header("Tool calls");
                for call in &outcome.tool_calls {
                    let status = match &call.result {
                        Some(result) if result.get("error").is_some() => "error",
                        Some(_) => "ok",
                        None => "unknown tool",
                    };
                    Output::kv(&call.to_string(), status);
                }
            }

            Output::header("Response");
            println!("{}", serde_json::to_string_pretty(&outcome.response)?);
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
