//! CLI command implementations.

mod ask;
mod config;
mod serve;
mod summarize;
mod tools;

pub use ask::run_ask;
pub use config::run_config;
pub use serve::{cors_layer, router, run_serve, AppState};
pub use summarize::run_summarize;
pub use tools::run_tools;
