//! MLB Stats API — response typy.
//!
//! Payloady jsou velké a volně verzované: co čteme, je Option nebo default,
//! zbytek JSONu ignorujeme.

use serde::Deserialize;

// ── /api/v1/schedule ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleResponse {
    #[serde(default)]
    pub dates: Vec<ScheduleDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleDate {
    #[serde(default)]
    pub date:  String,   // "YYYY-MM-DD"
    #[serde(default)]
    pub games: Vec<ScheduleGame>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleGame {
    pub game_pk: u64,
    #[serde(default)]
    pub status:  GameStatus,
    #[serde(default)]
    pub teams:   GameTeams,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatus {
    /// "Preview" | "Live" | "Final"
    pub abstract_game_state: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GameTeams {
    #[serde(default)]
    pub home: TeamSide,
    #[serde(default)]
    pub away: TeamSide,
}

#[derive(Debug, Default, Deserialize)]
pub struct TeamSide {
    #[serde(default)]
    pub team: Team,
}

#[derive(Debug, Default, Deserialize)]
pub struct Team {
    pub name: Option<String>,
}

impl ScheduleGame {
    pub fn is_final(&self) -> bool {
        self.status.abstract_game_state.as_deref() == Some("Final")
    }
}

// ── /api/v1.1/game/{gamePk}/feed/live ────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveFeedResponse {
    pub live_data: Option<LiveData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LiveData {
    pub plays: Option<PlayCollection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayCollection {
    pub all_plays: Option<Vec<Play>>,
}

impl LiveFeedResponse {
    /// `liveData.plays.allPlays`, or nothing if any part of the path is missing.
    pub fn into_plays(self) -> Vec<Play> {
        self.live_data
            .and_then(|d| d.plays)
            .and_then(|p| p.all_plays)
            .unwrap_or_default()
    }
}

/// One plate appearance as reported by the live feed. Read-only.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Play {
    pub play_id: Option<String>,
    #[serde(default)]
    pub result:  PlayResult,
    #[serde(default)]
    pub about:   PlayAbout,
    pub matchup: Option<Matchup>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayResult {
    pub description: Option<String>,
    /// Event-type label, e.g. "Field Error", "Strikeout", "Single"
    pub event:       Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayAbout {
    pub at_bat_index: Option<u32>,
    pub inning:       Option<u32>,
    pub start_time:   Option<String>,   // RFC 3339, UTC
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Matchup {
    pub batter: Option<Person>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub full_name: Option<String>,
}

impl Play {
    pub fn batter_name(&self) -> Option<&str> {
        self.matchup
            .as_ref()
            .and_then(|m| m.batter.as_ref())
            .and_then(|b| b.full_name.as_deref())
    }
}
