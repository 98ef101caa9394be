//! Schedule validation and game summary extraction.

use serde::Serialize;
use serde_json::{json, Value};

/// Playback format whose URL is reported for highlight clips.
pub const PLAYBACK_FORMAT: &str = "mp4Avc";

/// Sentinel used when the stats API omits a field.
pub const UNKNOWN: &str = "Unknown";

/// Why a schedule document did not yield a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleProblem {
    MissingTotalGames,
    NoGames,
    MissingDates,
    EmptyGames,
    MissingGameData,
}

impl ScheduleProblem {
    pub fn message(&self) -> &'static str {
        match self {
            ScheduleProblem::MissingTotalGames => "Invalid or missing 'totalGames' in API response.",
            ScheduleProblem::NoGames => "No games found for the specified date and team.",
            ScheduleProblem::MissingDates => "Invalid or missing 'dates' in API response.",
            ScheduleProblem::EmptyGames => "No games data found in API response.",
            ScheduleProblem::MissingGameData => "Invalid or missing game data in API response.",
        }
    }

    /// Render as the inline error payload handed back to the model.
    pub fn to_json(&self) -> Value {
        json!({ "error": self.message() })
    }
}

impl std::fmt::Display for ScheduleProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Validate a schedule lookup and return the first game's `gamePk`.
pub fn first_game_pk(schedule: &Value) -> std::result::Result<u64, ScheduleProblem> {
    let total_games = schedule
        .get("totalGames")
        .and_then(Value::as_u64)
        .ok_or(ScheduleProblem::MissingTotalGames)?;

    if total_games == 0 {
        return Err(ScheduleProblem::NoGames);
    }

    let games = first_date_games(schedule)?;

    games
        .first()
        .and_then(|game| game.get("gamePk"))
        .and_then(Value::as_u64)
        .ok_or(ScheduleProblem::EmptyGames)
}

fn first_date_games(schedule: &Value) -> std::result::Result<&Vec<Value>, ScheduleProblem> {
    let first_date = schedule
        .get("dates")
        .and_then(Value::as_array)
        .and_then(|dates| dates.first())
        .ok_or(ScheduleProblem::MissingDates)?;

    match first_date.get("games").and_then(Value::as_array) {
        Some(games) if !games.is_empty() => Ok(games),
        _ => Err(ScheduleProblem::EmptyGames),
    }
}

/// Compact view of one game with its highlight clips.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GameSummary {
    pub game_date: String,
    pub status: String,
    pub teams: Matchup,
    pub highlights: Vec<Highlight>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Matchup {
    pub away: TeamLine,
    pub home: TeamLine,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TeamLine {
    pub name: String,
    /// Runs scored, or the "Unknown" sentinel before the game has a score.
    pub score: Value,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Highlight {
    pub title: String,
    pub id: String,
    pub video_url: Option<String>,
}

/// Build a [`GameSummary`] from a schedule hydrated with highlight content.
pub fn summarize_game(hydrated: &Value) -> std::result::Result<GameSummary, ScheduleProblem> {
    let game = first_date_games(hydrated)
        .map_err(|_| ScheduleProblem::MissingGameData)?
        .first()
        .ok_or(ScheduleProblem::MissingGameData)?;

    let highlights = game
        .pointer("/content/highlights/highlights/items")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(extract_highlight).collect())
        .unwrap_or_default();

    Ok(GameSummary {
        game_date: text_or_unknown(game.get("gameDate")),
        status: text_or_unknown(game.pointer("/status/detailedState")),
        teams: Matchup {
            away: team_line(game, "away"),
            home: team_line(game, "home"),
        },
        highlights,
    })
}

fn team_line(game: &Value, side: &str) -> TeamLine {
    let team = game.pointer(&format!("/teams/{}", side));
    TeamLine {
        name: text_or_unknown(team.and_then(|t| t.pointer("/team/name"))),
        score: team
            .and_then(|t| t.get("score"))
            .cloned()
            .unwrap_or_else(|| Value::String(UNKNOWN.to_string())),
    }
}

fn extract_highlight(item: &Value) -> Highlight {
    Highlight {
        title: text_or_unknown(item.get("headline")),
        id: text_or_unknown(item.get("id")),
        video_url: playback_url(item),
    }
}

/// URL of the playback whose name matches [`PLAYBACK_FORMAT`].
pub fn playback_url(item: &Value) -> Option<String> {
    item.get("playbacks")?
        .as_array()?
        .iter()
        .find(|p| p.get("name").and_then(Value::as_str) == Some(PLAYBACK_FORMAT))
        .and_then(|p| p.get("url"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Render a JSON scalar as text, defaulting to the "Unknown" sentinel.
pub(crate) fn text_or_unknown(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(total: Value, dates: Value) -> Value {
        json!({ "totalGames": total, "dates": dates })
    }

    #[test]
    fn test_first_game_pk() {
        let doc = schedule(
            json!(2),
            json!([{ "games": [{ "gamePk": 745123 }, { "gamePk": 745124 }] }]),
        );
        assert_eq!(first_game_pk(&doc), Ok(745123));
    }

    #[test]
    fn test_zero_games_is_reported_not_raised() {
        let doc = schedule(json!(0), json!([]));
        let problem = first_game_pk(&doc).unwrap_err();
        assert_eq!(problem, ScheduleProblem::NoGames);
        assert_eq!(
            problem.to_json(),
            json!({ "error": "No games found for the specified date and team." })
        );
    }

    #[test]
    fn test_schedule_preconditions() {
        assert_eq!(
            first_game_pk(&json!({ "dates": [] })),
            Err(ScheduleProblem::MissingTotalGames)
        );
        assert_eq!(
            first_game_pk(&schedule(Value::Null, json!([]))),
            Err(ScheduleProblem::MissingTotalGames)
        );
        assert_eq!(
            first_game_pk(&schedule(json!(1), json!([]))),
            Err(ScheduleProblem::MissingDates)
        );
        assert_eq!(
            first_game_pk(&schedule(json!(1), json!([{ "games": [] }]))),
            Err(ScheduleProblem::EmptyGames)
        );
    }

    #[test]
    fn test_summarize_game_with_highlights() {
        let doc = json!({
            "dates": [{
                "games": [{
                    "gameDate": "2024-07-04T17:05:00Z",
                    "status": { "detailedState": "Final" },
                    "teams": {
                        "away": { "team": { "name": "Boston Red Sox" }, "score": 3 },
                        "home": { "team": { "name": "New York Yankees" }, "score": 5 }
                    },
                    "content": { "highlights": { "highlights": { "items": [
                        {
                            "headline": "Judge homers",
                            "id": "clip-1",
                            "playbacks": [
                                { "name": "highBit", "url": "https://cdn/judge-high.m3u8" },
                                { "name": "mp4Avc", "url": "https://cdn/judge.mp4" }
                            ]
                        },
                        {
                            "headline": "Final out",
                            "id": "clip-2",
                            "playbacks": [{ "name": "hlsCloud", "url": "https://cdn/out.m3u8" }]
                        }
                    ] } } }
                }]
            }]
        });

        let summary = summarize_game(&doc).unwrap();
        assert_eq!(summary.status, "Final");
        assert_eq!(summary.teams.home.name, "New York Yankees");
        assert_eq!(summary.teams.away.score, json!(3));
        assert_eq!(summary.highlights.len(), 2);
        assert_eq!(
            summary.highlights[0].video_url.as_deref(),
            Some("https://cdn/judge.mp4")
        );
        assert_eq!(summary.highlights[1].video_url, None);
    }

    #[test]
    fn test_missing_fields_default_to_sentinels() {
        let doc = json!({ "dates": [{ "games": [{ "gamePk": 1 }] }] });
        let summary = summarize_game(&doc).unwrap();
        assert_eq!(summary.game_date, UNKNOWN);
        assert_eq!(summary.status, UNKNOWN);
        assert_eq!(summary.teams.away.name, UNKNOWN);
        assert_eq!(summary.teams.home.score, json!(UNKNOWN));
        assert!(summary.highlights.is_empty());

        let rendered = serde_json::to_value(&summary).unwrap();
        assert_eq!(rendered["highlights"], json!([]));
    }

    #[test]
    fn test_summarize_game_without_games() {
        assert_eq!(
            summarize_game(&json!({ "dates": [] })),
            Err(ScheduleProblem::MissingGameData)
        );
    }

    #[test]
    fn test_null_video_url_serializes_as_null() {
        let highlight = extract_highlight(&json!({ "headline": "x", "id": "y", "playbacks": [] }));
        let rendered = serde_json::to_value(&highlight).unwrap();
        assert_eq!(rendered["video_url"], Value::Null);
    }
}
