//! Schedule — které zápasy daného dne patří do okna.

use anyhow::Result;
use chrono::NaiveDate;
use logger::EventLogger;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::client::StatsFeed;
use crate::status::log_api_status;
use crate::types::{ScheduleGame, ScheduleResponse};

/// One contest, as seen for the duration of a single cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRef {
    pub id:        u64,
    pub home_team: String,
    pub away_team: String,
}

impl GameRef {
    /// "<away> @ <home>"
    pub fn label(&self) -> String {
        format!("{} @ {}", self.away_team, self.home_team)
    }
}

/// Which games of a day a window keeps polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    /// Drop games whose abstract state is already "Final".
    ExcludeFinal,
    /// Every game of the day, finished or not.
    IncludeAll,
}

impl StatusFilter {
    fn keeps(self, game: &ScheduleGame) -> bool {
        match self {
            StatusFilter::ExcludeFinal => !game.is_final(),
            StatusFilter::IncludeAll => true,
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exclude_final" | "live" => Ok(StatusFilter::ExcludeFinal),
            "all" | "include_all" => Ok(StatusFilter::IncludeAll),
            other => anyhow::bail!("unknown status filter '{other}' (expected exclude_final|all)"),
        }
    }
}

/// Pick the games listed for `date` and apply `filter`.
pub fn select_games(schedule: ScheduleResponse, date: NaiveDate, filter: StatusFilter) -> Vec<GameRef> {
    let wanted = date.format("%Y-%m-%d").to_string();
    let mut dates = schedule.dates;

    // Bez záznamu pro daný den = žádné zápasy
    let Some(idx) = dates.iter().position(|d| d.date == wanted) else {
        return vec![];
    };

    dates.swap_remove(idx)
        .games
        .into_iter()
        .filter(|g| filter.keeps(g))
        .map(|g| GameRef {
            id:        g.game_pk,
            home_team: g.teams.home.team.name.unwrap_or_else(|| "Home".to_string()),
            away_team: g.teams.away.team.name.unwrap_or_else(|| "Away".to_string()),
        })
        .collect()
}

pub async fn try_games_for_day<F: StatsFeed + ?Sized>(
    feed: &F,
    date: NaiveDate,
    filter: StatusFilter,
) -> Result<Vec<GameRef>> {
    let schedule = feed.schedule(date).await?;
    Ok(select_games(schedule, date, filter))
}

/// Games for `date`; any upstream failure counts as an empty day.
pub async fn games_for_day<F: StatsFeed + ?Sized>(
    feed: &F,
    date: NaiveDate,
    filter: StatusFilter,
    logger: Option<&EventLogger>,
) -> Vec<GameRef> {
    match try_games_for_day(feed, date, filter).await {
        Ok(games) => {
            log_api_status(logger, "schedule", date.to_string(), Ok(games.len()));
            games
        }
        Err(e) => {
            warn!("schedule {date} failed: {e:#}");
            log_api_status(logger, "schedule", date.to_string(), Err(format!("{e:#}")));
            vec![]
        }
    }
}
