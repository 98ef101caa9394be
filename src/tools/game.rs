//! Game lookups keyed by team and date: schedule first, then the game itself.

use super::{string_params, ToolArgs, ToolHandler, ToolName, ToolRegistry};
use crate::error::{DugoutError, Result};
use crate::stats::{
    first_game_pk, highlight_video_urls, key_plays, normalize_season, summarize_game, StatsClient,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

const GAME_PARAMS: [(&str, &str); 2] = [
    ("team_id", "Id of the MLB team"),
    ("gamedate", "Date the game was played, in YYYY-MM-DD format"),
];

pub(super) fn register(registry: &mut ToolRegistry, stats: &Arc<StatsClient>) {
    registry
        .register(
            ToolName::GetGameData,
            "Retrieves the result of an MLB game played by a team on a date: status, teams, score \
             and highlight clips with video URLs. Use game date in YYYY-MM-DD format.",
            string_params(&GAME_PARAMS),
            Arc::new(GameDataTool::new(stats.clone())),
        )
        .register(
            ToolName::GetMlbClutchPlays,
            "Gets the clutch plays of an MLB game: home runs, strikeouts, scoring plays and outs, \
             with batter, pitcher, pitch speed, spin rate and clip URLs. Use game date in \
             YYYY-MM-DD format.",
            string_params(&GAME_PARAMS),
            Arc::new(ClutchPlaysTool::new(stats.clone())),
        )
        .register(
            ToolName::GetCurrentPlay,
            "Gets the current (or last) play of an MLB game with full pitch-by-pitch detail. \
             Use game date in YYYY-MM-DD format.",
            string_params(&GAME_PARAMS),
            Arc::new(CurrentPlayTool::new(stats.clone())),
        )
        .register(
            ToolName::GetFindGame,
            "Finds the game a team played on a date and returns every play of it: results, \
             batters, pitchers, counts and scoring. Use game date in YYYY-MM-DD format.",
            string_params(&[
                ("season", "Season (year) the game was played in"),
                GAME_PARAMS[1],
                GAME_PARAMS[0],
            ]),
            Arc::new(FindGameTool::new(stats.clone())),
        )
        .register(
            ToolName::GetMlbSingleGameData,
            "Retrieves the full data feed of one MLB game from its gamePk: game type, teams, \
             records, players and pitch data such as start speed, breaks and spin rate.",
            string_params(&[("game_pk", "Unique id (gamePk) of the game")]),
            Arc::new(SingleGameDataTool::new(stats.clone())),
        );
}

/// Team, date and season resolved from the call arguments.
struct GameQuery {
    team_id: String,
    date: String,
    season: i32,
}

impl GameQuery {
    /// Read team and date. An explicit `season` wins over the one taken from the date.
    fn from_args(args: &ToolArgs) -> Result<Self> {
        let team_id = args.require("team_id")?;
        let date = args.require("gamedate")?;
        let season = args
            .get("season")
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| normalize_season(&date));
        Ok(Self {
            team_id,
            date,
            season,
        })
    }
}

/// Look up the team's first game on the date.
///
/// `Ok(Err(payload))` carries the structured "no game" report for the model.
async fn find_game(
    stats: &StatsClient,
    query: &GameQuery,
) -> Result<std::result::Result<u64, Value>> {
    let schedule = stats
        .schedule(query.season, &query.date, &query.team_id)
        .await?;

    Ok(first_game_pk(&schedule).map_err(|problem| {
        debug!("No game for team {} on {}: {}", query.team_id, query.date, problem);
        problem.to_json()
    }))
}

/// Score and highlights of one game.
pub struct GameDataTool {
    stats: Arc<StatsClient>,
}

impl GameDataTool {
    pub fn new(stats: Arc<StatsClient>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl ToolHandler for GameDataTool {
    async fn call(&self, args: &ToolArgs) -> Result<Value> {
        let query = GameQuery::from_args(args)?;
        let game_pk = match find_game(&self.stats, &query).await? {
            Ok(pk) => pk,
            Err(report) => return Ok(report),
        };

        let hydrated = self
            .stats
            .hydrated_schedule(query.season, &query.date, game_pk)
            .await?;

        match summarize_game(&hydrated) {
            Ok(summary) => Ok(serde_json::to_value(summary)?),
            Err(problem) => Ok(problem.to_json()),
        }
    }
}

/// Key plays of one game with their clip URLs.
pub struct ClutchPlaysTool {
    stats: Arc<StatsClient>,
}

impl ClutchPlaysTool {
    pub fn new(stats: Arc<StatsClient>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl ToolHandler for ClutchPlaysTool {
    async fn call(&self, args: &ToolArgs) -> Result<Value> {
        let query = GameQuery::from_args(args)?;
        let game_pk = match find_game(&self.stats, &query).await? {
            Ok(pk) => pk,
            Err(report) => return Ok(report),
        };

        let feed = self.stats.live_feed(game_pk).await?;
        let mut report = key_plays(game_pk, &feed);

        let content = self.stats.game_content(game_pk).await?;
        report.attach_videos(&highlight_video_urls(&content));

        Ok(serde_json::to_value(report)?)
    }
}

/// Current play of one game, as the live feed reports it.
pub struct CurrentPlayTool {
    stats: Arc<StatsClient>,
}

impl CurrentPlayTool {
    pub fn new(stats: Arc<StatsClient>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl ToolHandler for CurrentPlayTool {
    async fn call(&self, args: &ToolArgs) -> Result<Value> {
        let query = GameQuery::from_args(args)?;
        let game_pk = match find_game(&self.stats, &query).await? {
            Ok(pk) => pk,
            Err(report) => return Ok(report),
        };

        let feed = self.stats.live_feed(game_pk).await?;
        Ok(feed
            .pointer("/liveData/plays/currentPlay")
            .cloned()
            .unwrap_or_else(|| json!({ "error": "No current play in the live feed." })))
    }
}

/// Every play of the game a team played on a date.
pub struct FindGameTool {
    stats: Arc<StatsClient>,
}

impl FindGameTool {
    pub fn new(stats: Arc<StatsClient>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl ToolHandler for FindGameTool {
    async fn call(&self, args: &ToolArgs) -> Result<Value> {
        let query = GameQuery::from_args(args)?;
        let game_pk = match find_game(&self.stats, &query).await? {
            Ok(pk) => pk,
            Err(report) => return Ok(report),
        };

        let feed = self.stats.live_feed(game_pk).await?;
        feed.pointer("/liveData/plays/allPlays")
            .cloned()
            .ok_or_else(|| {
                DugoutError::MalformedResponse(format!("Feed of game {} has no allPlays", game_pk))
            })
    }
}

/// Full live feed of a game by its primary key.
pub struct SingleGameDataTool {
    stats: Arc<StatsClient>,
}

impl SingleGameDataTool {
    pub fn new(stats: Arc<StatsClient>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl ToolHandler for SingleGameDataTool {
    async fn call(&self, args: &ToolArgs) -> Result<Value> {
        let raw = args.require("game_pk")?;
        let game_pk: u64 = raw.parse().map_err(|_| {
            DugoutError::InvalidToolArguments(format!("game_pk '{}' is not a number", raw))
        })?;
        self.stats.live_feed(game_pk).await
    }
}
