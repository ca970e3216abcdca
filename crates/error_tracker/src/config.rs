//! Konfigurace z env proměnných (po `dotenv`).

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use statsapi::{StatusFilter, DEFAULT_BASE_URL, MLB_SPORT_ID};
use std::path::PathBuf;
use std::str::FromStr;

use crate::accumulator::DEFAULT_MAX_TRACKED;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_WINDOWS: &str = "live:0:exclude_final,yesterday:-1:all";
/// Oldest day a window may look at.
pub const MAX_LOOKBACK_DAYS: i64 = 7;

/// A named scope of games: a day relative to today plus a status policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    pub name:       String,
    pub day_offset: i64,
    pub filter:     StatusFilter,
}

impl WindowSpec {
    pub fn new(name: impl Into<String>, day_offset: i64, filter: StatusFilter) -> Self {
        Self { name: name.into(), day_offset, filter }
    }

    /// Today's games that are not over yet.
    pub fn live() -> Self {
        Self::new("live", 0, StatusFilter::ExcludeFinal)
    }

    /// All of yesterday's games; catches errors the feed records after the fact.
    pub fn yesterday() -> Self {
        Self::new("yesterday", -1, StatusFilter::IncludeAll)
    }

    pub fn date_for(&self, today: NaiveDate) -> NaiveDate {
        today + Duration::days(self.day_offset)
    }
}

/// `name:offset[:filter]`, e.g. `live:0:exclude_final` or `yesterday:-1`.
impl FromStr for WindowSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(':').map(str::trim).collect();
        if parts.len() < 2 || parts.len() > 3 || parts[0].is_empty() {
            anyhow::bail!("bad window spec '{s}' (expected name:offset[:filter])");
        }

        let day_offset: i64 = parts[1]
            .parse()
            .with_context(|| format!("bad day offset in window spec '{s}'"))?;
        if !(-MAX_LOOKBACK_DAYS..=0).contains(&day_offset) {
            anyhow::bail!("day offset {day_offset} out of range -{MAX_LOOKBACK_DAYS}..=0 in '{s}'");
        }

        let filter = match parts.get(2) {
            Some(f) => f.parse()?,
            None if day_offset == 0 => StatusFilter::ExcludeFinal,
            None => StatusFilter::IncludeAll,
        };

        Ok(Self::new(parts[0], day_offset, filter))
    }
}

pub fn parse_windows(raw: &str) -> Result<Vec<WindowSpec>> {
    let mut windows: Vec<WindowSpec> = Vec::new();
    for part in raw.split(',').filter(|p| !p.trim().is_empty()) {
        let spec: WindowSpec = part.parse()?;
        if windows.iter().any(|w| w.name == spec.name) {
            anyhow::bail!("duplicate window name '{}'", spec.name);
        }
        windows.push(spec);
    }
    Ok(windows)
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub poll_interval_secs: u64,
    pub windows:            Vec<WindowSpec>,
    pub max_tracked:        usize,
    pub base_url:           String,
    pub sport_id:           u32,
    pub log_dir:            Option<PathBuf>,
    pub ntfy_topic:         Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            windows:            vec![WindowSpec::live(), WindowSpec::yesterday()],
            max_tracked:        DEFAULT_MAX_TRACKED,
            base_url:           DEFAULT_BASE_URL.to_string(),
            sport_id:           MLB_SPORT_ID,
            log_dir:            Some(PathBuf::from("logs")),
            ntfy_topic:         None,
        }
    }
}

impl TrackerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Numeric values that fail to parse fall back to defaults; a bad window
    /// list is an error since it would silently change what gets tracked.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let poll_interval_secs = get("TRACKER_POLL_INTERVAL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.poll_interval_secs);

        let windows = parse_windows(&get("TRACKER_WINDOWS").unwrap_or_else(|| DEFAULT_WINDOWS.to_string()))
            .context("TRACKER_WINDOWS")?;

        let max_tracked = get("TRACKER_MAX_TRACKED")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.max_tracked);

        let base_url = get("STATSAPI_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.base_url);

        let sport_id = get("STATSAPI_SPORT_ID")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults.sport_id);

        let log_dir = match get("TRACKER_LOG_DIR") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(PathBuf::from(v)),
            None => defaults.log_dir,
        };

        let ntfy_topic = get("NTFY_TOPIC").filter(|v| !v.trim().is_empty());

        Ok(Self {
            poll_interval_secs,
            windows,
            max_tracked,
            base_url,
            sport_id,
            log_dir,
            ntfy_topic,
        })
    }
}
