//! Klasifikace — je play reportovatelný error?

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::debug;

use crate::schedule::GameRef;
use crate::types::Play;

pub const UNKNOWN_BATTER: &str = "Unknown";
const UNKNOWN_TIME: &str = "--";

/// A reportable play, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub event_id:    String,
    pub inning:      u32,
    pub description: String,
    pub game_label:  String,
    pub time_of_day: String,
    pub batter_name: String,
}

/// Case-insensitive substring match on description or event label. Loose on
/// purpose: upstream phrasing varies ("Field Error", "throwing error by ...").
pub fn is_reportable(play: &Play) -> bool {
    let hit = |s: &Option<String>| {
        s.as_deref()
            .map(|v| v.to_lowercase().contains("error"))
            .unwrap_or(false)
    };
    hit(&play.result.description) || hit(&play.result.event)
}

/// Identity used for de-duplication. Falls back to the at-bat index when the
/// feed does not carry a play id.
pub fn event_id(play: &Play, game: &GameRef) -> Option<String> {
    if let Some(id) = play.play_id.as_deref().filter(|s| !s.is_empty()) {
        return Some(id.to_string());
    }
    play.about.at_bat_index.map(|idx| format!("{}-{}", game.id, idx))
}

pub fn classify(play: &Play, game: &GameRef) -> Option<ErrorEvent> {
    classify_in(play, game, &Local)
}

/// Same as [`classify`], with the display time rendered in `tz`.
pub fn classify_in<Tz>(play: &Play, game: &GameRef, tz: &Tz) -> Option<ErrorEvent>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if !is_reportable(play) {
        return None;
    }

    let Some(event_id) = event_id(play, game) else {
        debug!("game {}: error play without identity, skipped", game.id);
        return None;
    };

    Some(ErrorEvent {
        event_id,
        inning:      play.about.inning.unwrap_or(0),
        description: play.result.description.clone().unwrap_or_default(),
        game_label:  game.label(),
        time_of_day: time_of_day(play.about.start_time.as_deref(), tz),
        batter_name: play.batter_name().unwrap_or(UNKNOWN_BATTER).to_string(),
    })
}

/// Every reportable play of one game, in play order.
pub fn classify_all(plays: &[Play], game: &GameRef) -> Vec<ErrorEvent> {
    plays.iter().filter_map(|p| classify(p, game)).collect()
}

fn time_of_day<Tz>(raw: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(tz).format("%-I:%M:%S %p").to_string())
        .unwrap_or_else(|| UNKNOWN_TIME.to_string())
}
