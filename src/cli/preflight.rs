//! Pre-flight checks before network work.
//!
//! Validates that the configured API key is available before starting
//! operations that would otherwise fail on the first model call.

use crate::config::ModelSettings;
use crate::error::{DugoutError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Serving needs the model key for every endpoint except health.
    Serve,
    /// Asking questions requires the model key.
    Ask,
    /// Video summaries require the model key.
    Summarize,
    /// Listing tools has no external requirements.
    Tools,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, model: &ModelSettings) -> Result<()> {
    match operation {
        Operation::Serve | Operation::Ask | Operation::Summarize => check_api_key(model),
        Operation::Tools => Ok(()),
    }
}

fn check_api_key(model: &ModelSettings) -> Result<()> {
    let var = &model.api_key_env;
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(DugoutError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            var, var
        ))),
        Err(_) => Err(DugoutError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}
