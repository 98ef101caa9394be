//! Video summaries through the Gemini `generateContent` API.

use crate::config::{ModelSettings, VideoSettings};
use crate::error::{DugoutError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};

/// MIME type declared for every summarized video.
pub const VIDEO_MIME_TYPE: &str = "video/mp4";

/// A hosted model that can describe a video by URI.
#[async_trait]
pub trait VideoSummarizer: Send + Sync {
    async fn summarize(&self, uri: &str) -> Result<String>;
}

/// Summarizer backed by a Gemini model reading the video via `fileData`.
pub struct GeminiVideoSummarizer {
    http: reqwest::Client,
    api_base: String,
    model: String,
    api_key: String,
    prompt: String,
}

impl GeminiVideoSummarizer {
    /// Create a summarizer. The API key comes from the model settings' environment variable.
    pub fn new(video: &VideoSettings, model: &ModelSettings, prompt: &str) -> Result<Self> {
        let api_key = model
            .api_key()
            .ok_or_else(|| DugoutError::Config(format!("{} is not set", model.api_key_env)))?;

        Self::with_config(
            &video.api_base,
            &video.model,
            &api_key,
            prompt,
            Duration::from_secs(model.timeout_secs),
        )
    }

    /// Create a summarizer against an explicit endpoint.
    pub fn with_config(
        api_base: &str,
        model: &str,
        api_key: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DugoutError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.trim_start_matches("models/").to_string(),
            api_key: api_key.to_string(),
            prompt: prompt.to_string(),
        })
    }

    fn request_body(&self, uri: &str) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "fileData": { "mimeType": VIDEO_MIME_TYPE, "fileUri": uri } },
                    { "text": self.prompt }
                ]
            }]
        })
    }
}

/// Concatenate the text parts of the first candidate.
fn candidate_text(body: &Value) -> Result<String> {
    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| DugoutError::MalformedResponse("No candidates in video response".to_string()))?;

    Ok(parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect())
}

#[async_trait]
impl VideoSummarizer for GeminiVideoSummarizer {
    #[instrument(skip(self))]
    async fn summarize(&self, uri: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.api_base, self.model);
        debug!("Summarizing {} with {}", uri, self.model);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request_body(uri))
            .send()
            .await
            .map_err(|e| DugoutError::ExternalApi(format!("Video model request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DugoutError::ExternalApi(format!(
                "Video model returned {}: {}",
                status, detail
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| DugoutError::MalformedResponse(format!("Video model body: {}", e)))?;

        candidate_text(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn summarizer(server: &MockServer) -> GeminiVideoSummarizer {
        GeminiVideoSummarizer::with_config(
            &format!("{}/v1beta", server.uri()),
            "models/gemini-2.0-flash-exp",
            "test-key",
            "Describe the video.",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_summarize_sends_file_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash-exp:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "fileData": { "mimeType": "video/mp4", "fileUri": "https://cdn/hr-1.mp4" } },
                        { "text": "Describe the video." }
                    ]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [
                    { "text": "* Judge homers to left.\n" },
                    { "text": "* Yankees lead 1-0." }
                ] } }]
            })))
            .mount(&server)
            .await;

        let summary = summarizer(&server)
            .summarize("https://cdn/hr-1.mp4")
            .await
            .unwrap();
        assert_eq!(summary, "* Judge homers to left.\n* Yankees lead 1-0.");
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad uri"))
            .mount(&server)
            .await;

        let err = summarizer(&server).summarize("nope").await.unwrap_err();
        assert!(matches!(err, DugoutError::ExternalApi(ref m) if m.contains("bad uri")));
    }

    #[test]
    fn test_candidate_text_missing() {
        let err = candidate_text(&json!({ "promptFeedback": {} })).unwrap_err();
        assert!(matches!(err, DugoutError::MalformedResponse(_)));
    }
}
