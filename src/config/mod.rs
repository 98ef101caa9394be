//! Configuration module for Dugout.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, QueryPrompts, VideoPrompts};
pub use settings::{
    GeneralSettings, LiveSettings, ModelSettings, PromptSettings, QuerySettings, ServerSettings,
    Settings, StatsSettings, VideoSettings,
};
