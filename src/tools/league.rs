//! League, team and player lookups: one stats API call each.

use super::{string_params, ToolArgs, ToolHandler, ToolName, ToolRegistry};
use crate::error::Result;
use crate::stats::{StatsClient, MLB_SPORT_ID};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const TEAM_LOGO_URL: &str = "https://www.mlbstatic.com/team-logos";
const HEADSHOT_URL: &str = "https://securea.mlb.com/mlb/images/players/head_shot";

pub(super) fn register(registry: &mut ToolRegistry, stats: &Arc<StatsClient>) {
    registry
        .register(
            ToolName::GetMlbSeasons,
            "Provides detailed information about an MLB season: preseason, spring, regular season, \
             all-star, postseason and offseason dates, and qualifier thresholds.",
            string_params(&[("season", "Season (year) of MLB")]),
            Arc::new(SeasonsTool::new(stats.clone())),
        )
        .register(
            ToolName::GetMlbLeagues,
            "Provides detailed information about all MLB leagues playing in a season: number of \
             games, teams, wild card teams and the key dates of the season.",
            string_params(&[("season", "Season (year) the leagues are playing in")]),
            Arc::new(LeaguesTool::new(stats.clone())),
        )
        .register(
            ToolName::GetMlbTeams,
            "Retrieves all MLB teams with their ids, names, venues, leagues, divisions and logo URLs. \
             Use it to resolve a team name to a team_id.",
            json!({ "type": "object", "properties": {} }),
            Arc::new(TeamsTool::new(stats.clone())),
        )
        .register(
            ToolName::GetMlbTeamsBySeason,
            "Retrieves all MLB teams that played in a given season, with logo URLs.",
            string_params(&[("season", "Season (year) of MLB")]),
            Arc::new(TeamsBySeasonTool::new(stats.clone())),
        )
        .register(
            ToolName::GetMlbTeamsByTeamnameSeason,
            "Retrieves details of a single MLB team for a season. Resolve the team_id with \
             get_mlb_teams instead of asking the user for it.",
            string_params(&[("team_id", "Id of the MLB team"), ("season", "Season (year) of MLB")]),
            Arc::new(TeamTool::new(stats.clone())),
        )
        .register(
            ToolName::GetRoster,
            "Provides the active roster of an MLB team for a season: player names, jersey numbers, \
             positions, status and headshot URLs. Resolve the team_id with get_mlb_teams instead of \
             asking the user for it.",
            string_params(&[("team_id", "Id of the MLB team"), ("season", "Season (year) of MLB")]),
            Arc::new(RosterTool::new(stats.clone())),
        )
        .register(
            ToolName::GetStandings,
            "Provides MLB standings for a league and season: wins, losses, streaks, division and \
             league ranks, home/away and split records, runs scored and allowed.",
            string_params(&[("leagueId", "Id of the league (103 American, 104 National)"), ("season", "Season (year) of MLB")]),
            Arc::new(StandingsTool::new(stats.clone())),
        )
        .register(
            ToolName::GetMlbAttendance,
            "Provides attendance figures of an MLB team for a season: totals, home/away averages, \
             highs and lows with their dates.",
            string_params(&[("team_id", "Id of the MLB team"), ("season", "Season (year) of MLB")]),
            Arc::new(AttendanceTool::new(stats.clone())),
        )
        .register(
            ToolName::GetPlayerImage,
            "Provides the headshot image URL of an MLB player from the player's person id.",
            string_params(&[("id", "Person id of the player")]),
            Arc::new(PlayerImageTool),
        );
}

/// Season calendar lookup.
pub struct SeasonsTool {
    stats: Arc<StatsClient>,
}

impl SeasonsTool {
    pub fn new(stats: Arc<StatsClient>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl ToolHandler for SeasonsTool {
    async fn call(&self, args: &ToolArgs) -> Result<Value> {
        let season = args.require("season")?;
        self.stats
            .get_json(
                &["v1", "seasons", season.as_str()],
                &[("sportId", MLB_SPORT_ID.to_string())],
            )
            .await
    }
}

/// Leagues playing in a season.
pub struct LeaguesTool {
    stats: Arc<StatsClient>,
}

impl LeaguesTool {
    pub fn new(stats: Arc<StatsClient>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl ToolHandler for LeaguesTool {
    async fn call(&self, args: &ToolArgs) -> Result<Value> {
        let season = args.require("season")?;
        self.stats
            .get_json(
                &["v1", "league"],
                &[("sportId", MLB_SPORT_ID.to_string()), ("season", season)],
            )
            .await
    }
}

/// Every MLB team, regardless of season.
pub struct TeamsTool {
    stats: Arc<StatsClient>,
}

impl TeamsTool {
    pub fn new(stats: Arc<StatsClient>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl ToolHandler for TeamsTool {
    async fn call(&self, _args: &ToolArgs) -> Result<Value> {
        let mut teams = self
            .stats
            .get_json(&["v1", "teams"], &[("sportId", MLB_SPORT_ID.to_string())])
            .await?;
        add_team_logos(&mut teams);
        Ok(teams)
    }
}

/// MLB teams of one season.
pub struct TeamsBySeasonTool {
    stats: Arc<StatsClient>,
}

impl TeamsBySeasonTool {
    pub fn new(stats: Arc<StatsClient>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl ToolHandler for TeamsBySeasonTool {
    async fn call(&self, args: &ToolArgs) -> Result<Value> {
        let season = args.require("season")?;
        let mut teams = self
            .stats
            .get_json(
                &["v1", "teams"],
                &[("sportId", MLB_SPORT_ID.to_string()), ("season", season)],
            )
            .await?;
        add_team_logos(&mut teams);
        Ok(teams)
    }
}

/// One team in one season.
pub struct TeamTool {
    stats: Arc<StatsClient>,
}

impl TeamTool {
    pub fn new(stats: Arc<StatsClient>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl ToolHandler for TeamTool {
    async fn call(&self, args: &ToolArgs) -> Result<Value> {
        let team_id = args.require("team_id")?;
        let season = args.require("season")?;
        self.stats
            .get_json(
                &["v1", "teams", team_id.as_str()],
                &[("sportId", MLB_SPORT_ID.to_string()), ("season", season)],
            )
            .await
    }
}

/// Active roster of a team.
pub struct RosterTool {
    stats: Arc<StatsClient>,
}

impl RosterTool {
    pub fn new(stats: Arc<StatsClient>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl ToolHandler for RosterTool {
    async fn call(&self, args: &ToolArgs) -> Result<Value> {
        let team_id = args.require("team_id")?;
        let season = args.require("season")?;
        let mut roster = self
            .stats
            .get_json(
                &["v1", "teams", team_id.as_str(), "roster", "active"],
                &[("season", season)],
            )
            .await?;
        add_headshots(&mut roster);
        Ok(roster)
    }
}

/// League standings.
pub struct StandingsTool {
    stats: Arc<StatsClient>,
}

impl StandingsTool {
    pub fn new(stats: Arc<StatsClient>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl ToolHandler for StandingsTool {
    async fn call(&self, args: &ToolArgs) -> Result<Value> {
        let league_id = args.require("leagueId")?;
        let season = args.require("season")?;
        self.stats
            .get_json(
                &["v1", "standings"],
                &[("leagueId", league_id), ("season", season)],
            )
            .await
    }
}

/// Season attendance of a team.
pub struct AttendanceTool {
    stats: Arc<StatsClient>,
}

impl AttendanceTool {
    pub fn new(stats: Arc<StatsClient>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl ToolHandler for AttendanceTool {
    async fn call(&self, args: &ToolArgs) -> Result<Value> {
        let team_id = args.require("team_id")?;
        let season = args.require("season")?;
        self.stats
            .get_json(
                &["v1", "attendance"],
                &[("teamId", team_id), ("season", season)],
            )
            .await
    }
}

/// Headshot URL of a player. Pure; makes no request.
pub struct PlayerImageTool;

#[async_trait]
impl ToolHandler for PlayerImageTool {
    async fn call(&self, args: &ToolArgs) -> Result<Value> {
        let id = args.require("id")?;
        Ok(json!({
            "id": id,
            "playerurl": headshot_url(&id),
        }))
    }
}

fn headshot_url(person_id: &str) -> String {
    format!("{}/{}.jpg", HEADSHOT_URL, person_id)
}

/// Add a `teamurl` logo link to every entry of `teams[]`.
fn add_team_logos(doc: &mut Value) {
    if let Some(teams) = doc.get_mut("teams").and_then(Value::as_array_mut) {
        for team in teams {
            if let Some(id) = team.get("id").cloned() {
                team["teamurl"] = json!(format!("{}/{}.svg", TEAM_LOGO_URL, id));
            }
        }
    }
}

/// Add a `playerurl` headshot link to every entry of `roster[]`.
fn add_headshots(doc: &mut Value) {
    if let Some(roster) = doc.get_mut("roster").and_then(Value::as_array_mut) {
        for player in roster {
            if let Some(id) = player.pointer("/person/id").cloned() {
                player["playerurl"] = json!(headshot_url(&id.to_string()));
            }
        }
    }
}
