//! MLB stats API client and response reshaping.
//!
//! The stats API is an unversioned public service; every reshaping helper
//! here reads it defensively and substitutes sentinels for missing keys.

mod game;
mod plays;
mod season;

pub use game::{
    first_game_pk, playback_url, summarize_game, GameSummary, Highlight, Matchup, ScheduleProblem,
    TeamLine, PLAYBACK_FORMAT, UNKNOWN,
};
pub use plays::{
    highlight_video_urls, is_key_play, key_plays, pitch_metrics, summarize_play, GameInfo,
    KeyPlays, PitchMetrics, PlaySummary,
};
pub use season::{normalize_season, normalize_season_at};

use crate::config::StatsSettings;
use crate::error::{DugoutError, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Sport id of Major League Baseball in the stats API.
pub const MLB_SPORT_ID: &str = "1";

/// Hydration that embeds highlight clips in a schedule lookup.
const HIGHLIGHTS_HYDRATE: &str = "game(content(highlights(highlights)))";

/// Thin JSON client over the stats API and the fan content datasets.
#[derive(Debug, Clone)]
pub struct StatsClient {
    http: reqwest::Client,
    base_url: Url,
    datasets_url: Url,
}

impl StatsClient {
    /// Create a client from settings.
    pub fn new(settings: &StatsSettings) -> Result<Self> {
        Self::with_config(&settings.base_url, Duration::from_secs(settings.timeout_secs))?
            .with_datasets_url(&settings.datasets_url)
    }

    /// Create a client for a custom base URL and timeout.
    pub fn with_config(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = parse_base(base_url)?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DugoutError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            datasets_url: parse_base(&StatsSettings::default().datasets_url)?,
        })
    }

    /// Point dataset lookups at another folder.
    pub fn with_datasets_url(mut self, datasets_url: &str) -> Result<Self> {
        self.datasets_url = parse_base(datasets_url)?;
        Ok(self)
    }

    /// Issue a GET against `segments` (relative to the base URL) and parse the JSON body.
    ///
    /// Each segment is percent-encoded whole: a `/`, `?` or `#` inside it
    /// stays part of that segment.
    #[instrument(skip(self, query))]
    pub async fn get_json(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Value> {
        let url = join_segments(&self.base_url, segments)?;
        let body = self.get_text(url, query).await?;

        serde_json::from_str(&body).map_err(|e| {
            DugoutError::MalformedResponse(format!("{} is not JSON: {}", segments.join("/"), e))
        })
    }

    /// Fetch one fan content dataset file.
    ///
    /// The exports are newline-delimited JSON; each line becomes one element
    /// of the returned array. A file holding a JSON array is returned as is.
    #[instrument(skip(self))]
    pub async fn dataset(&self, file: &str, season: Option<&str>) -> Result<Value> {
        let url = join_segments(&self.datasets_url, &[file])?;
        let query: Vec<(&str, String)> = season
            .map(|season| ("season", season.to_string()))
            .into_iter()
            .collect();
        let body = self.get_text(url, &query).await?;

        if let Ok(records @ Value::Array(_)) = serde_json::from_str::<Value>(&body) {
            return Ok(records);
        }

        body.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| {
                    DugoutError::MalformedResponse(format!("{} has a bad record: {}", file, e))
                })
            })
            .collect::<Result<Vec<Value>>>()
            .map(Value::Array)
    }

    async fn get_text(&self, url: Url, query: &[(&str, String)]) -> Result<String> {
        debug!("GET {} {:?}", url, query);

        let response = self
            .http
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| DugoutError::ExternalApi(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DugoutError::ExternalApi(format!(
                "GET {} returned {}",
                url, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| DugoutError::ExternalApi(format!("Failed to read {}: {}", url, e)))
    }

    /// Regular-season schedule of one team on one date.
    pub async fn schedule(&self, season: i32, date: &str, team_id: &str) -> Result<Value> {
        self.get_json(
            &["v1", "schedule"],
            &[
                ("sportId", MLB_SPORT_ID.to_string()),
                ("season", season.to_string()),
                ("types", "regular".to_string()),
                ("date", date.to_string()),
                ("teamIds", team_id.to_string()),
            ],
        )
        .await
    }

    /// Schedule entry for one game, hydrated with highlight clips.
    pub async fn hydrated_schedule(&self, season: i32, date: &str, game_pk: u64) -> Result<Value> {
        self.get_json(
            &["v1", "schedule"],
            &[
                ("sportId", MLB_SPORT_ID.to_string()),
                ("season", season.to_string()),
                ("types", "regular".to_string()),
                ("date", date.to_string()),
                ("gamePk", game_pk.to_string()),
                ("hydrate", HIGHLIGHTS_HYDRATE.to_string()),
            ],
        )
        .await
    }

    /// Full live feed of one game.
    pub async fn live_feed(&self, game_pk: u64) -> Result<Value> {
        let game_pk = game_pk.to_string();
        self.get_json(&["v1.1", "game", game_pk.as_str(), "feed", "live"], &[])
            .await
    }

    /// Editorial content (highlight clips) of one game.
    pub async fn game_content(&self, game_pk: u64) -> Result<Value> {
        let game_pk = game_pk.to_string();
        self.get_json(&["v1", "game", game_pk.as_str(), "content"], &[])
            .await
    }
}

fn parse_base(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url)
        .map_err(|e| DugoutError::Config(format!("Invalid base URL {}: {}", base_url, e)))?;
    if url.cannot_be_a_base() {
        return Err(DugoutError::Config(format!("Invalid base URL {}", base_url)));
    }
    Ok(url)
}

/// Append encoded path segments to `base`. Dot and empty segments are rejected.
fn join_segments(base: &Url, segments: &[&str]) -> Result<Url> {
    if let Some(bad) = segments
        .iter()
        .find(|s| matches!(s.trim(), "" | "." | ".."))
    {
        return Err(DugoutError::InvalidToolArguments(format!(
            "'{}' is not a valid identifier",
            bad
        )));
    }

    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| DugoutError::Config(format!("Invalid base URL {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> StatsClient {
        StatsClient::with_config(&format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_schedule_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/schedule"))
            .and(query_param("season", "2024"))
            .and(query_param("teamIds", "147"))
            .and(query_param("date", "2024-07-04"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "totalGames": 0 })))
            .mount(&server)
            .await;

        let doc = client(&server).schedule(2024, "2024-07-04", "147").await.unwrap();
        assert_eq!(doc["totalGames"], json!(0));
    }

    #[tokio::test]
    async fn test_non_success_status_is_external_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1.1/game/1/feed/live"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server).live_feed(1).await.unwrap_err();
        assert!(matches!(err, DugoutError::ExternalApi(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_connection_failure_is_external_api_error() {
        let stats = StatsClient::with_config("http://127.0.0.1:1/api", Duration::from_secs(1)).unwrap();
        let err = stats.live_feed(1).await.unwrap_err();
        assert!(matches!(err, DugoutError::ExternalApi(ref m) if m.contains("failed")));
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/game/1/content"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = client(&server).game_content(1).await.unwrap_err();
        assert!(matches!(err, DugoutError::MalformedResponse(_)));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = StatsClient::with_config("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, DugoutError::Config(_)));
    }

    #[tokio::test]
    async fn test_segments_are_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client(&server)
            .get_json(&["v1", "teams", "147/../../v1/attendance?teamId=1", "roster"], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DugoutError::ExternalApi(_)));

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url.path(),
            "/api/v1/teams/147%2F..%2F..%2Fv1%2Fattendance%3FteamId=1/roster"
        );
        assert_eq!(requests[0].url.query(), None);
    }

    #[tokio::test]
    async fn test_dot_segments_are_rejected() {
        let server = MockServer::start().await;
        let err = client(&server)
            .get_json(&["v1", "teams", "..", "roster"], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DugoutError::InvalidToolArguments(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dataset_reads_json_lines() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/datasets/follows.json"))
            .and(query_param("season", "2025"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "{\"user_id\":1,\"favorite_team_id\":147}\n\n{\"user_id\":2,\"favorite_team_id\":119}\n",
            ))
            .mount(&server)
            .await;

        let stats = client(&server)
            .with_datasets_url(&format!("{}/datasets", server.uri()))
            .unwrap();
        let records = stats.dataset("follows.json", Some("2025")).await.unwrap();
        assert_eq!(
            records,
            json!([
                { "user_id": 1, "favorite_team_id": 147 },
                { "user_id": 2, "favorite_team_id": 119 }
            ])
        );
    }

    #[tokio::test]
    async fn test_dataset_bad_record_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/datasets/watch.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"slug\":\"a\"}\nnot json\n"))
            .mount(&server)
            .await;

        let stats = client(&server)
            .with_datasets_url(&format!("{}/datasets", server.uri()))
            .unwrap();
        let err = stats.dataset("watch.json", None).await.unwrap_err();
        assert!(matches!(err, DugoutError::MalformedResponse(_)));
    }
}
