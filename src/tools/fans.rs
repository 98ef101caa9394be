//! Fan content interaction datasets: follows and video watch exports.

use super::{ToolArgs, ToolHandler, ToolName, ToolRegistry};
use crate::error::Result;
use crate::stats::StatsClient;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Favorite and followed teams per user.
pub const FOLLOWS_DATASET: &str = "2025-mlb-fan-favs-follows.json";
/// Video watch export of 2024-08-27.
pub const WATCH_AUG27_DATASET: &str = "mlb-fan-content-interaction-data-000000000020.json";
/// Video watch export of 2024-09-15.
pub const WATCH_SEPT15_DATASET: &str = "mlb-fan-content-interaction-data-000000000047.json";

pub(super) fn register(registry: &mut ToolRegistry, stats: &Arc<StatsClient>) {
    registry
        .register(
            ToolName::GetMlbMostFollowedTeams,
            "Retrieves the most followed and favorite MLB teams: the favorite team id and the \
             followed team ids of each user. Resolve team names with get_mlb_teams.",
            season_param(),
            Arc::new(DatasetTool::new(stats.clone(), FOLLOWS_DATASET)),
        )
        .register(
            ToolName::GetMlbUserVideoWatch,
            "Gets what fans watched on 2024-08-27: most watched videos and headlines by team and \
             player, and the source they watched on (iOS, Android or Web).",
            season_param(),
            Arc::new(DatasetTool::new(stats.clone(), WATCH_AUG27_DATASET)),
        )
        .register(
            ToolName::GetMlbUserVideoWatchSept15,
            "Gets what fans watched on 2024-09-15: most watched videos, players and headlines, \
             and the source they watched on (iOS, Android or Web).",
            season_param(),
            Arc::new(DatasetTool::new(stats.clone(), WATCH_SEPT15_DATASET)),
        );
}

fn season_param() -> Value {
    json!({
        "type": "object",
        "properties": {
            "season": { "type": "string", "description": "Season when the data was collected" }
        }
    })
}

/// Returns the records of one dataset file.
pub struct DatasetTool {
    stats: Arc<StatsClient>,
    file: &'static str,
}

impl DatasetTool {
    pub fn new(stats: Arc<StatsClient>, file: &'static str) -> Self {
        Self { stats, file }
    }
}

#[async_trait]
impl ToolHandler for DatasetTool {
    async fn call(&self, args: &ToolArgs) -> Result<Value> {
        let season = args.get("season");
        self.stats.dataset(self.file, season.as_deref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn stats(server: &MockServer) -> Arc<StatsClient> {
        Arc::new(
            StatsClient::with_config(&format!("{}/api", server.uri()), Duration::from_secs(5))
                .unwrap()
                .with_datasets_url(&format!("{}/fans", server.uri()))
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_most_followed_teams() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/fans/{}", FOLLOWS_DATASET)))
            .and(query_param("season", "2025"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "{\"user_id\":\"u1\",\"favorite_team_id\":147,\"followed_team_ids\":[147,121]}\n",
            ))
            .mount(&server)
            .await;

        let tool = DatasetTool::new(stats(&server), FOLLOWS_DATASET);
        let records = tool
            .call(&ToolArgs::from(json!({ "season": "2025" })))
            .await
            .unwrap();
        assert_eq!(records[0]["favorite_team_id"], 147);
        assert_eq!(records[0]["followed_team_ids"], json!([147, 121]));
    }

    #[tokio::test]
    async fn test_video_watch_without_season() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/fans/{}", WATCH_SEPT15_DATASET)))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "{\"slug\":\"judge-homers\",\"source\":\"iOS\"}\n{\"slug\":\"soto-walks\",\"source\":\"Web\"}\n",
            ))
            .mount(&server)
            .await;

        let tool = DatasetTool::new(stats(&server), WATCH_SEPT15_DATASET);
        let records = tool.call(&ToolArgs::default()).await.unwrap();
        assert_eq!(records.as_array().unwrap().len(), 2);
        assert_eq!(records[1]["source"], "Web");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.query(), None);
    }
}
