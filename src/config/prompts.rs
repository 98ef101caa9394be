//! Prompt templates for Dugout.
//!
//! Prompts can be customized by placing a `prompts.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub query: QueryPrompts,
    pub video: VideoPrompts,
}

/// Prompts for the text query loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryPrompts {
    /// Appended to every user query before it reaches the model.
    pub instruction: String,
}

impl QueryPrompts {
    /// Attach the instruction to a user query.
    pub fn render(&self, query: &str) -> String {
        format!("{}\n{}", query, self.instruction)
    }
}

impl Default for QueryPrompts {
    fn default() -> Self {
        Self {
            instruction: "Provide the API response in concise, high-level summary.".to_string(),
        }
    }
}

/// Prompts for video summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoPrompts {
    pub summary: String,
}

impl Default for VideoPrompts {
    fn default() -> Self {
        Self {
            summary: "Provide a detailed description of the video and structure it in bullet points. \
Show scores and player statistics in an HTML table that can be rendered easily."
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, overriding defaults with `prompts.toml` from `custom_dir` when present.
    pub fn load(custom_dir: Option<&Path>) -> crate::error::Result<Self> {
        let Some(dir) = custom_dir else {
            return Ok(Self::default());
        };

        let path = dir.join("prompts.toml");
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_query_appends_instruction() {
        let prompts = Prompts::default();
        let rendered = prompts.query.render("Who won yesterday?");
        assert!(rendered.starts_with("Who won yesterday?\n"));
        assert!(rendered.ends_with("concise, high-level summary."));
    }

    #[test]
    fn test_custom_prompts_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("prompts.toml"),
            "[query]\ninstruction = \"Answer in one line.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(Some(dir.path())).unwrap();
        assert_eq!(prompts.query.instruction, "Answer in one line.");
        assert_eq!(prompts.video.summary, VideoPrompts::default().summary);
    }
}
