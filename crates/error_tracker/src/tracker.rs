//! Orchestrátor cyklu.
//!
//! Cyklus: schedule → live feed pro každý zápas → klasifikace → dedup per okno →
//! snapshot. Veškeré I/O proběhne dřív, než se sáhne na stav okna, takže
//! cyklus zrušený v půlce nechá session beze změny.

use chrono::{DateTime, Local, NaiveDate};
use futures_util::future::join_all;
use logger::{CycleHeartbeatEvent, ErrorDetectedEvent, EventLogger, now_iso};
use serde::Serialize;
use statsapi::{classify_all, games_for_day, plays_for_game, ErrorEvent, GameRef, StatsFeed};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::accumulator::{Accumulator, TrackingWindow};
use crate::config::{TrackerConfig, WindowSpec};

// ── Published state ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct WindowSnapshot {
    pub name:   String,
    pub events: Vec<ErrorEvent>,   // newest first
}

/// What the presentation layer sees after every cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSnapshot {
    pub windows:      Vec<WindowSnapshot>,
    /// `None` until the first cycle that reached upstream.
    pub last_updated: Option<DateTime<Local>>,
}

impl SessionSnapshot {
    pub fn window(&self, name: &str) -> Option<&WindowSnapshot> {
        self.windows.iter().find(|w| w.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct WindowReport {
    pub window:         String,
    pub date:           NaiveDate,
    pub games:          usize,
    pub fetch_attempts: usize,
    pub admitted:       Vec<ErrorEvent>,
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub windows:      Vec<WindowReport>,
    pub last_updated: Option<DateTime<Local>>,
}

impl CycleReport {
    pub fn new_errors(&self) -> usize {
        self.windows.iter().map(|w| w.admitted.len()).sum()
    }

    pub fn games_polled(&self) -> usize {
        self.windows.iter().map(|w| w.games).sum()
    }
}

// ── Fetch phase ──────────────────────────────────────────────────────────────

struct WindowBatch {
    date:           NaiveDate,
    games:          usize,
    fetch_attempts: usize,
    candidates:     Vec<ErrorEvent>,
}

async fn game_errors<F: StatsFeed + ?Sized>(
    feed: &F,
    logger: Option<&EventLogger>,
    game: &GameRef,
) -> Vec<ErrorEvent> {
    let plays = plays_for_game(feed, game.id, logger).await;
    let found = classify_all(&plays, game);
    debug!(game = game.id, plays = plays.len(), errors = found.len(), "{}", game.label());
    found
}

/// Schedule plus every game's plays for one window. Upstream failures already
/// came back as zero games / zero plays.
async fn collect_window<F: StatsFeed + ?Sized>(
    feed: &F,
    logger: Option<&EventLogger>,
    spec: &WindowSpec,
    today: NaiveDate,
) -> WindowBatch {
    let date = spec.date_for(today);
    let games = games_for_day(feed, date, spec.filter, logger).await;

    // Games run concurrently; join_all keeps results in game order
    let fetches: Vec<_> = games.iter().map(|game| game_errors(feed, logger, game)).collect();
    let per_game = join_all(fetches).await;

    WindowBatch {
        date,
        games: games.len(),
        fetch_attempts: 1 + games.len(),
        candidates: per_game.into_iter().flatten().collect(),
    }
}

// ── Orchestrator ─────────────────────────────────────────────────────────────

pub struct ErrorTracker<F> {
    feed:               F,
    windows:            Vec<WindowSpec>,
    accumulator:        Accumulator,
    last_updated:       Option<DateTime<Local>>,
    logger:             Option<EventLogger>,
    ntfy_topic:         Option<String>,
    poll_interval_secs: u64,
    snapshot_tx:        watch::Sender<SessionSnapshot>,
}

impl<F: StatsFeed> ErrorTracker<F> {
    pub fn new(feed: F, windows: Vec<WindowSpec>, max_tracked: usize) -> Self {
        let mut accumulator = Accumulator::new(max_tracked);
        for w in &windows {
            accumulator.ensure_window(&w.name);
        }
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::default());

        let tracker = Self {
            feed,
            windows,
            accumulator,
            last_updated: None,
            logger: None,
            ntfy_topic: None,
            poll_interval_secs: 0,
            snapshot_tx,
        };
        tracker.snapshot_tx.send_replace(tracker.snapshot());
        tracker
    }

    pub fn from_config(feed: F, cfg: &TrackerConfig) -> Self {
        let mut tracker = Self::new(feed, cfg.windows.clone(), cfg.max_tracked);
        tracker.poll_interval_secs = cfg.poll_interval_secs;
        tracker.logger = cfg.log_dir.as_ref().map(EventLogger::new);
        tracker.ntfy_topic = cfg.ntfy_topic.clone();
        tracker
    }

    pub fn with_event_log(mut self, logger: EventLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn window(&self, name: &str) -> Option<&TrackingWindow> {
        self.accumulator.window(name)
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            windows: self
                .windows
                .iter()
                .map(|w| WindowSnapshot {
                    name: w.name.clone(),
                    events: self
                        .accumulator
                        .window(&w.name)
                        .map(|tw| tw.events().cloned().collect())
                        .unwrap_or_default(),
                })
                .collect(),
            last_updated: self.last_updated,
        }
    }

    pub async fn run_cycle(&mut self) -> CycleReport {
        let today = Local::now().date_naive();
        self.run_cycle_on(today).await
    }

    /// One full cycle with `today` as the reference day for window offsets.
    pub async fn run_cycle_on(&mut self, today: NaiveDate) -> CycleReport {
        let batches = {
            let feed = &self.feed;
            let logger = self.logger.as_ref();
            let fetches: Vec<_> = self
                .windows
                .iter()
                .map(|w| collect_window(feed, logger, w, today))
                .collect();
            join_all(fetches).await
        };

        // Od teď žádné await — stav se mění najednou
        let mut reports = Vec::with_capacity(batches.len());
        let mut fetched = false;

        for (spec, batch) in self.windows.iter().zip(batches) {
            fetched |= batch.fetch_attempts > 0;
            let admitted = self.accumulator.admit(&spec.name, batch.candidates);

            for ev in &admitted {
                info!(
                    window = %spec.name,
                    inning = ev.inning,
                    batter = %ev.batter_name,
                    "{} — {}",
                    ev.game_label, ev.description
                );
                if let Some(logger) = &self.logger {
                    let _ = logger.log(&ErrorDetectedEvent {
                        ts: now_iso(),
                        event: "ERROR_DETECTED",
                        window: spec.name.clone(),
                        event_id: ev.event_id.clone(),
                        game: ev.game_label.clone(),
                        inning: ev.inning,
                        batter: ev.batter_name.clone(),
                        description: ev.description.clone(),
                    });
                }
                if let Some(topic) = self.ntfy_topic.clone() {
                    let title = format!("Error: {}", ev.game_label);
                    let msg = format!("Inning {} — {} (batter: {})", ev.inning, ev.description, ev.batter_name);
                    tokio::spawn(async move { logger::send_ntfy_alert(&topic, &msg, &title).await });
                }
            }

            reports.push(WindowReport {
                window: spec.name.clone(),
                date: batch.date,
                games: batch.games,
                fetch_attempts: batch.fetch_attempts,
                admitted,
            });
        }

        // "Checked, nothing new" still counts as an update
        if fetched {
            self.last_updated = Some(Local::now());
        }

        let report = CycleReport { windows: reports, last_updated: self.last_updated };

        if let Some(logger) = &self.logger {
            let _ = logger.log(&CycleHeartbeatEvent {
                ts: now_iso(),
                event: "CYCLE_HEARTBEAT",
                poll_interval_secs: self.poll_interval_secs,
                windows: self.windows.len(),
                games_polled: report.games_polled(),
                new_errors: report.new_errors(),
                tracked_errors: self.accumulator.total_tracked(),
            });
        }

        self.snapshot_tx.send_replace(self.snapshot());
        report
    }
}
