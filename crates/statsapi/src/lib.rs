/// MLB Error Tracker — Stats API
///
/// Endpointy (bez auth):
///   GET https://statsapi.mlb.com/api/v1/schedule?sportId=1&date=YYYY-MM-DD
///   GET https://statsapi.mlb.com/api/v1.1/game/{gamePk}/feed/live
///
/// Výpadek nebo rozbitý payload = prázdný výsledek + API_STATUS do logu.

pub mod classifier;
pub mod client;
pub mod game_feed;
pub mod schedule;
mod status;
pub mod types;

pub use classifier::{classify, classify_all, is_reportable, ErrorEvent, UNKNOWN_BATTER};
pub use client::{StatsApiClient, StatsFeed, DEFAULT_BASE_URL, MLB_SPORT_ID};
pub use game_feed::{plays_for_game, try_plays_for_game};
pub use schedule::{games_for_day, select_games, try_games_for_day, GameRef, StatusFilter};
pub use types::{LiveFeedResponse, Play, ScheduleResponse};
