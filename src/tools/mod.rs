//! Tool registry shared by the query loop and the live bridge.
//!
//! Each tool is identified by a [`ToolName`], described by a [`ToolSpec`]
//! the model can consume, and executed by a [`ToolHandler`] bound at
//! startup. The registry is immutable once built.

mod fans;
mod game;
mod league;

pub use fans::{DatasetTool, FOLLOWS_DATASET, WATCH_AUG27_DATASET, WATCH_SEPT15_DATASET};
pub use game::{ClutchPlaysTool, CurrentPlayTool, FindGameTool, GameDataTool, SingleGameDataTool};
pub use league::{
    AttendanceTool, LeaguesTool, PlayerImageTool, RosterTool, SeasonsTool, StandingsTool,
    TeamTool, TeamsBySeasonTool, TeamsTool,
};

use crate::error::{DugoutError, Result};
use crate::stats::StatsClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Every tool the model may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    GetMlbSeasons,
    GetMlbLeagues,
    GetMlbTeams,
    GetMlbTeamsBySeason,
    GetMlbTeamsByTeamnameSeason,
    GetRoster,
    GetGameData,
    GetMlbClutchPlays,
    GetCurrentPlay,
    GetStandings,
    GetMlbAttendance,
    GetPlayerImage,
    GetFindGame,
    GetMlbSingleGameData,
    GetMlbMostFollowedTeams,
    GetMlbUserVideoWatch,
    GetMlbUserVideoWatchSept15,
}

impl ToolName {
    pub const ALL: [ToolName; 17] = [
        ToolName::GetMlbSeasons,
        ToolName::GetMlbLeagues,
        ToolName::GetMlbTeams,
        ToolName::GetMlbTeamsBySeason,
        ToolName::GetMlbTeamsByTeamnameSeason,
        ToolName::GetRoster,
        ToolName::GetGameData,
        ToolName::GetMlbClutchPlays,
        ToolName::GetCurrentPlay,
        ToolName::GetStandings,
        ToolName::GetMlbAttendance,
        ToolName::GetPlayerImage,
        ToolName::GetFindGame,
        ToolName::GetMlbSingleGameData,
        ToolName::GetMlbMostFollowedTeams,
        ToolName::GetMlbUserVideoWatch,
        ToolName::GetMlbUserVideoWatchSept15,
    ];

    /// Wire name used in function declarations.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::GetMlbSeasons => "get_mlb_seasons",
            ToolName::GetMlbLeagues => "get_mlb_leagues",
            ToolName::GetMlbTeams => "get_mlb_teams",
            ToolName::GetMlbTeamsBySeason => "get_mlb_teams_by_season",
            ToolName::GetMlbTeamsByTeamnameSeason => "get_mlb_teams_by_teamname_season",
            ToolName::GetRoster => "get_roster",
            ToolName::GetGameData => "get_game_data",
            ToolName::GetMlbClutchPlays => "get_mlb_clutch_plays",
            ToolName::GetCurrentPlay => "get_current_play",
            ToolName::GetStandings => "get_standings",
            ToolName::GetMlbAttendance => "get_mlb_attendance",
            ToolName::GetPlayerImage => "get_player_image",
            ToolName::GetFindGame => "get_find_game",
            ToolName::GetMlbSingleGameData => "get_mlb_single_game_data",
            ToolName::GetMlbMostFollowedTeams => "get_mlb_most_followed_teams",
            ToolName::GetMlbUserVideoWatch => "get_mlb_user_video_watch",
            ToolName::GetMlbUserVideoWatchSept15 => "get_mlb_user_video_watch_sept15",
        }
    }
}

impl std::str::FromStr for ToolName {
    type Err = DugoutError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| DugoutError::UnknownTool(s.to_string()))
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration of one tool as handed to the model.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Arguments supplied by the model for one tool call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    pub fn new(args: Map<String, Value>) -> Self {
        Self(args)
    }

    /// Read an argument as text. Numbers are accepted and rendered in decimal.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Read a required argument.
    pub fn require(&self, key: &str) -> Result<String> {
        self.get(key)
            .ok_or_else(|| DugoutError::InvalidToolArguments(format!("Missing '{}' argument", key)))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Value> for ToolArgs {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

/// Capability implemented by every tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool, returning its JSON result.
    async fn call(&self, args: &ToolArgs) -> Result<Value>;
}

struct Entry {
    name: ToolName,
    spec: ToolSpec,
    handler: Arc<dyn ToolHandler>,
}

/// Registry of tool declarations and their handlers.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<Entry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry of MLB stats tools.
    pub fn mlb(stats: Arc<StatsClient>) -> Self {
        let mut registry = Self::new();
        league::register(&mut registry, &stats);
        game::register(&mut registry, &stats);
        fans::register(&mut registry, &stats);
        registry
    }

    /// Add one tool. A second registration of the same name replaces the first.
    pub fn register(
        &mut self,
        name: ToolName,
        description: &str,
        parameters: Value,
        handler: Arc<dyn ToolHandler>,
    ) -> &mut Self {
        let spec = ToolSpec {
            name: name.as_str().to_string(),
            description: description.to_string(),
            parameters,
        };

        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.spec = spec;
                entry.handler = handler;
            }
            None => self.entries.push(Entry {
                name,
                spec,
                handler,
            }),
        }
        self
    }

    /// Declarations of every registered tool, in registration order.
    pub fn describe_all(&self) -> Vec<ToolSpec> {
        self.entries.iter().map(|e| e.spec.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Invoke the handler bound to `name`.
    pub async fn dispatch(&self, name: &str, args: &ToolArgs) -> Result<Value> {
        let tool: ToolName = name.parse()?;
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == tool)
            .ok_or_else(|| DugoutError::UnknownTool(name.to_string()))?;

        info!("Calling tool {} with {:?}", name, args.as_map());
        let result = entry.handler.call(args).await;
        debug!("Tool {} finished (ok = {})", name, result.is_ok());
        result
    }
}

/// JSON-schema object with the given string properties, all required.
pub(crate) fn string_params(properties: &[(&str, &str)]) -> Value {
    let props: Map<String, Value> = properties
        .iter()
        .map(|(name, description)| {
            (
                name.to_string(),
                json!({ "type": "string", "description": description }),
            )
        })
        .collect();
    let required: Vec<&str> = properties.iter().map(|(name, _)| *name).collect();

    json!({
        "type": "object",
        "properties": props,
        "required": required,
    })
}
