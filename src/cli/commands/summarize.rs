//! Summarize command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::video::{GeminiVideoSummarizer, VideoSummarizer};
use anyhow::Result;

/// Run the summarize command.
pub async fn run_summarize(uri: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Summarize, &settings.model) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let prompts = Prompts::load(settings.prompts_dir().as_deref())?;
    let summarizer =
        GeminiVideoSummarizer::new(&settings.video, &settings.model, &prompts.video.summary)?;

    let spinner = Output::spinner("Watching the video...");
    let summary = summarizer.summarize(uri).await;
    spinner.finish_and_clear();

    match summary {
        Ok(summary) => {
            println!("\n{}\n", summary);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to summarize {}: {}", uri, e));
            Err(e.into())
        }
    }
}
