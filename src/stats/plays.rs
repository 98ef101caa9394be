//! Key-play extraction from the live game feed.

use super::game::{playback_url, text_or_unknown, UNKNOWN};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Events that always count as key plays.
const KEY_EVENTS: [&str; 2] = ["Home Run", "Strikeout"];

/// Summary of one notable play.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlaySummary {
    pub play_id: String,
    pub inning: Value,
    pub is_top_inning: bool,
    pub event: String,
    pub description: String,
    pub is_scoring_play: bool,
    pub batter: String,
    pub pitcher: String,
    pub pitch_data: PitchMetrics,
    /// Filled in from the game content lookup; empty when no clip matched.
    pub video_url: String,
}

/// Pitch metrics of a play's final pitch. Serializes to `{}` when absent.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PitchMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spin_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch_type: Option<String>,
}

impl PitchMetrics {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Scoreboard header for a key-plays report.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GameInfo {
    #[serde(rename = "gamePk")]
    pub game_pk: u64,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Value,
    pub away_score: Value,
}

/// Key plays of one game.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KeyPlays {
    pub game_info: GameInfo,
    pub key_plays: Vec<PlaySummary>,
}

fn play_event(play: &Value) -> &str {
    play.pointer("/result/event")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn flag(value: Option<&Value>) -> bool {
    value.and_then(Value::as_bool).unwrap_or(false)
}

/// Home runs, strikeouts, scoring plays and any event mentioning an out.
pub fn is_key_play(play: &Value) -> bool {
    let event = play_event(play);
    KEY_EVENTS.contains(&event)
        || flag(play.pointer("/about/isScoringPlay"))
        || event.to_lowercase().contains("out")
}

/// Reduce one play record to a [`PlaySummary`].
pub fn summarize_play(play: &Value) -> PlaySummary {
    let last_event = play
        .get("playEvents")
        .and_then(Value::as_array)
        .and_then(|events| events.last());

    PlaySummary {
        play_id: last_event
            .and_then(|e| e.get("playId"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        inning: play
            .pointer("/about/inning")
            .cloned()
            .unwrap_or_else(|| Value::String(UNKNOWN.to_string())),
        is_top_inning: flag(play.pointer("/about/isTopInning")),
        event: text_or_unknown(play.pointer("/result/event")),
        description: text_or_unknown(play.pointer("/result/description")),
        is_scoring_play: flag(play.pointer("/about/isScoringPlay")),
        batter: text_or_unknown(play.pointer("/matchup/batter/fullName")),
        pitcher: text_or_unknown(play.pointer("/matchup/pitcher/fullName")),
        pitch_data: last_event.map(pitch_metrics).unwrap_or_default(),
        video_url: String::new(),
    }
}

/// Pitch speed, spin and type from a single play event.
pub fn pitch_metrics(event: &Value) -> PitchMetrics {
    let Some(pitch) = event.get("pitchData") else {
        return PitchMetrics::default();
    };

    PitchMetrics {
        start_speed: pitch.get("startSpeed").and_then(Value::as_f64),
        end_speed: pitch.get("endSpeed").and_then(Value::as_f64),
        spin_rate: pitch.pointer("/breaks/spinRate").and_then(Value::as_f64),
        pitch_type: event
            .pointer("/details/type/description")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// Extract the key plays and scoreboard from a live game feed.
pub fn key_plays(game_pk: u64, feed: &Value) -> KeyPlays {
    let key_plays = feed
        .pointer("/liveData/plays/allPlays")
        .and_then(Value::as_array)
        .map(|plays| {
            plays
                .iter()
                .filter(|play| is_key_play(play))
                .map(summarize_play)
                .collect()
        })
        .unwrap_or_default();

    KeyPlays {
        game_info: GameInfo {
            game_pk,
            home_team: text_or_unknown(feed.pointer("/gameData/teams/home/name")),
            away_team: text_or_unknown(feed.pointer("/gameData/teams/away/name")),
            home_score: runs(feed, "home"),
            away_score: runs(feed, "away"),
        },
        key_plays,
    }
}

fn runs(feed: &Value, side: &str) -> Value {
    feed.pointer(&format!("/liveData/linescore/teams/{}/runs", side))
        .cloned()
        .unwrap_or_else(|| Value::String(UNKNOWN.to_string()))
}

/// Map highlight `guid` to its MP4 URL from a game content document.
pub fn highlight_video_urls(content: &Value) -> HashMap<String, String> {
    content
        .pointer("/highlights/highlights/items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let guid = item.get("guid").and_then(Value::as_str)?;
                    if guid.is_empty() {
                        return None;
                    }
                    Some((guid.to_string(), playback_url(item)?))
                })
                .collect()
        })
        .unwrap_or_default()
}

impl KeyPlays {
    /// Attach clip URLs to the plays whose id matches a highlight guid.
    pub fn attach_videos(&mut self, urls: &HashMap<String, String>) {
        for play in &mut self.key_plays {
            play.video_url = urls.get(&play.play_id).cloned().unwrap_or_default();
        }
    }
}
