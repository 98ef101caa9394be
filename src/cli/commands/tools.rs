//! Tools command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::stats::StatsClient;
use crate::tools::ToolRegistry;
use anyhow::Result;
use std::sync::Arc;

/// List every tool declaration offered to the model.
pub fn run_tools(settings: &Settings) -> Result<()> {
    preflight::check(Operation::Tools, &settings.model)?;

    let registry = ToolRegistry::mlb(Arc::new(StatsClient::new(&settings.stats)?));

    Output::header(&format!("{} tools", registry.len()));
    for spec in registry.describe_all() {
        Output::tool(&spec.name, &spec.description);
    }
    println!();

    Ok(())
}
