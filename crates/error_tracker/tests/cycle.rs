//! End-to-end cycles against an in-memory feed.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use error_tracker::{spawn_poller, ErrorTracker, WindowSpec, DEFAULT_MAX_TRACKED};
use serde_json::json;
use statsapi::{LiveFeedResponse, ScheduleResponse, StatsFeed, StatusFilter};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Default)]
struct FakeFeed {
    /// (gamePk, abstractGameState)
    games:          Mutex<Vec<(u64, &'static str)>>,
    plays:          Mutex<HashMap<u64, Vec<serde_json::Value>>>,
    broken_games:   Mutex<HashSet<u64>>,
    schedule_down:  AtomicBool,
    schedule_calls: AtomicUsize,
    feed_calls:     AtomicUsize,
    /// live_feed parks until `release` while set
    hold_feed:      AtomicBool,
    feed_entered:   Notify,
    release:        Notify,
}

impl FakeFeed {
    fn set_games(&self, games: &[(u64, &'static str)]) {
        *self.games.lock().unwrap() = games.to_vec();
    }

    fn set_plays(&self, game: u64, plays: Vec<serde_json::Value>) {
        self.plays.lock().unwrap().insert(game, plays);
    }
}

#[async_trait]
impl StatsFeed for FakeFeed {
    async fn schedule(&self, date: NaiveDate) -> Result<ScheduleResponse> {
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);
        if self.schedule_down.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }
        let games: Vec<_> = self.games.lock().unwrap().iter().map(|(pk, state)| json!({
            "gamePk": pk,
            "status": { "abstractGameState": state },
            "teams": {
                "home": { "team": { "name": format!("Home {pk}") } },
                "away": { "team": { "name": format!("Away {pk}") } }
            }
        })).collect();
        Ok(serde_json::from_value(json!({
            "dates": [{ "date": date.format("%Y-%m-%d").to_string(), "games": games }]
        }))?)
    }

    async fn live_feed(&self, game_id: u64) -> Result<LiveFeedResponse> {
        self.feed_calls.fetch_add(1, Ordering::SeqCst);
        if self.hold_feed.load(Ordering::SeqCst) {
            self.feed_entered.notify_one();
            self.release.notified().await;
        }
        if self.broken_games.lock().unwrap().contains(&game_id) {
            anyhow::bail!("HTTP 503");
        }
        let plays = self.plays.lock().unwrap().get(&game_id).cloned().unwrap_or_default();
        Ok(serde_json::from_value(json!({ "liveData": { "plays": { "allPlays": plays } } }))?)
    }
}

fn error_play(id: &str, desc: &str) -> serde_json::Value {
    json!({
        "playId": id,
        "result": { "event": "Field Error", "description": desc },
        "about": { "atBatIndex": 0, "inning": 3, "startTime": "2024-06-01T23:10:05.000Z" },
        "matchup": { "batter": { "fullName": "Mookie Betts" } }
    })
}

fn clean_play(id: &str) -> serde_json::Value {
    json!({
        "playId": id,
        "result": { "event": "Strikeout", "description": "Freddie Freeman strikes out swinging." },
        "about": { "atBatIndex": 1, "inning": 3 }
    })
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn live_ids<F: StatsFeed>(tracker: &ErrorTracker<F>, window: &str) -> Vec<String> {
    tracker
        .window(window)
        .unwrap()
        .events()
        .map(|e| e.event_id.clone())
        .collect()
}

fn live_only(feed: Arc<FakeFeed>) -> ErrorTracker<Arc<FakeFeed>> {
    ErrorTracker::new(feed, vec![WindowSpec::live()], DEFAULT_MAX_TRACKED)
}

#[tokio::test]
async fn new_errors_are_prepended_and_never_repeated() {
    let feed = Arc::new(FakeFeed::default());
    feed.set_games(&[(1, "Live")]);
    feed.set_plays(1, vec![error_play("P1", "Throwing error by SS"), clean_play("P2")]);

    let mut tracker = live_only(feed.clone());
    let r1 = tracker.run_cycle_on(day()).await;
    assert_eq!(r1.new_errors(), 1);
    assert_eq!(live_ids(&tracker, "live"), vec!["P1"]);

    feed.set_plays(1, vec![error_play("P1", "Throwing error by SS"), error_play("P3", "Fielding error by 2B")]);
    let r2 = tracker.run_cycle_on(day()).await;
    assert_eq!(r2.new_errors(), 1);
    assert_eq!(r2.windows[0].admitted[0].event_id, "P3");
    assert_eq!(live_ids(&tracker, "live"), vec!["P3", "P1"]);

    let r3 = tracker.run_cycle_on(day()).await;
    assert_eq!(r3.new_errors(), 0);
    assert_eq!(live_ids(&tracker, "live"), vec!["P3", "P1"]);
}

#[tokio::test]
async fn batch_keeps_game_then_play_order_ahead_of_older_events() {
    let feed = Arc::new(FakeFeed::default());
    feed.set_games(&[(1, "Live")]);
    feed.set_plays(1, vec![error_play("OLD", "error")]);

    let mut tracker = live_only(feed.clone());
    tracker.run_cycle_on(day()).await;

    feed.set_games(&[(1, "Live"), (2, "Live")]);
    feed.set_plays(1, vec![error_play("OLD", "error"), error_play("G1-E", "error")]);
    feed.set_plays(2, vec![error_play("G2-E", "error")]);
    let report = tracker.run_cycle_on(day()).await;

    let admitted: Vec<_> = report.windows[0].admitted.iter().map(|e| e.event_id.as_str()).collect();
    assert_eq!(admitted, vec!["G1-E", "G2-E"]);
    assert_eq!(live_ids(&tracker, "live"), vec!["G1-E", "G2-E", "OLD"]);
}

#[tokio::test]
async fn classified_fields_reach_the_window() {
    let feed = Arc::new(FakeFeed::default());
    feed.set_games(&[(7, "Live")]);
    let mut no_batter = error_play("P9", "Fielding error by 3B");
    no_batter.as_object_mut().unwrap().remove("matchup");
    feed.set_plays(7, vec![no_batter]);

    let mut tracker = live_only(feed);
    tracker.run_cycle_on(day()).await;

    let ev = tracker.window("live").unwrap().events().next().cloned().unwrap();
    assert_eq!(ev.game_label, "Away 7 @ Home 7");
    assert_eq!(ev.inning, 3);
    assert_eq!(ev.batter_name, "Unknown");
    assert_eq!(ev.description, "Fielding error by 3B");
}

#[tokio::test]
async fn last_updated_refreshes_without_new_errors() {
    let feed = Arc::new(FakeFeed::default());
    feed.set_games(&[(1, "Live")]);
    feed.set_plays(1, vec![clean_play("P2")]);

    let mut tracker = live_only(feed);
    assert!(tracker.last_updated().is_none());

    let r1 = tracker.run_cycle_on(day()).await;
    assert_eq!(r1.new_errors(), 0);
    let first = tracker.last_updated().expect("updated after a checked cycle");

    tracker.run_cycle_on(day()).await;
    assert!(tracker.last_updated().unwrap() >= first);
}

#[tokio::test]
async fn no_windows_means_never_updated() {
    let feed = Arc::new(FakeFeed::default());
    let mut tracker = ErrorTracker::new(feed.clone(), vec![], DEFAULT_MAX_TRACKED);
    tracker.run_cycle_on(day()).await;
    assert!(tracker.last_updated().is_none());
    assert_eq!(feed.schedule_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn upstream_failures_degrade_to_empty() {
    let feed = Arc::new(FakeFeed::default());
    feed.set_games(&[(1, "Live"), (2, "Live")]);
    feed.set_plays(1, vec![error_play("A", "error")]);
    feed.set_plays(2, vec![error_play("B", "error")]);
    feed.broken_games.lock().unwrap().insert(1);

    let mut tracker = live_only(feed.clone());
    tracker.run_cycle_on(day()).await;
    assert_eq!(live_ids(&tracker, "live"), vec!["B"]);

    // Recovered game is picked up next cycle
    feed.broken_games.lock().unwrap().clear();
    feed.schedule_down.store(false, Ordering::SeqCst);
    tracker.run_cycle_on(day()).await;
    assert_eq!(live_ids(&tracker, "live"), vec!["A", "B"]);

    feed.schedule_down.store(true, Ordering::SeqCst);
    let report = tracker.run_cycle_on(day()).await;
    assert_eq!(report.games_polled(), 0);
    assert_eq!(live_ids(&tracker, "live"), vec!["A", "B"]);
    assert!(tracker.last_updated().is_some());
}

#[tokio::test]
async fn final_games_only_reach_the_historical_window() {
    let feed = Arc::new(FakeFeed::default());
    feed.set_games(&[(1, "Final"), (2, "Live")]);
    feed.set_plays(1, vec![error_play("F", "error")]);
    feed.set_plays(2, vec![error_play("L", "error")]);

    let mut tracker = ErrorTracker::new(
        feed,
        vec![WindowSpec::live(), WindowSpec::yesterday()],
        DEFAULT_MAX_TRACKED,
    );
    let report = tracker.run_cycle_on(day()).await;

    assert_eq!(live_ids(&tracker, "live"), vec!["L"]);
    assert_eq!(live_ids(&tracker, "yesterday"), vec!["F", "L"]);
    assert_eq!(report.windows[1].date, NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
}

#[tokio::test]
async fn windows_keep_separate_identities() {
    let feed = Arc::new(FakeFeed::default());
    feed.set_games(&[(1, "Live")]);
    feed.set_plays(1, vec![error_play("X", "error")]);

    let mut tracker = ErrorTracker::new(
        feed,
        vec![WindowSpec::live(), WindowSpec::new("also_today", 0, StatusFilter::IncludeAll)],
        DEFAULT_MAX_TRACKED,
    );
    let report = tracker.run_cycle_on(day()).await;

    assert_eq!(report.windows[0].admitted.len(), 1);
    assert_eq!(report.windows[1].admitted.len(), 1);
    assert!(tracker.window("live").unwrap().contains("X"));
    assert!(tracker.window("also_today").unwrap().contains("X"));
}

#[tokio::test]
async fn snapshot_is_published_after_each_cycle() {
    let feed = Arc::new(FakeFeed::default());
    feed.set_games(&[(1, "Live")]);
    feed.set_plays(1, vec![error_play("P1", "error")]);

    let mut tracker = live_only(feed);
    let mut rx = tracker.subscribe();
    assert!(rx.borrow().last_updated.is_none());
    assert!(rx.borrow().window("live").unwrap().events.is_empty());

    tracker.run_cycle_on(day()).await;
    assert!(rx.has_changed().unwrap());
    let snap = rx.borrow_and_update().clone();
    assert!(snap.last_updated.is_some());
    assert_eq!(snap.window("live").unwrap().events[0].event_id, "P1");
}

#[tokio::test]
async fn event_log_records_detected_errors() {
    let dir = tempfile::tempdir().unwrap();
    let feed = Arc::new(FakeFeed::default());
    feed.set_games(&[(1, "Live")]);
    feed.set_plays(1, vec![error_play("P1", "error")]);

    let mut tracker = live_only(feed).with_event_log(logger::EventLogger::new(dir.path()));
    tracker.run_cycle_on(day()).await;

    let date = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let raw = std::fs::read_to_string(dir.path().join(format!("{date}.jsonl"))).unwrap();
    let kinds: Vec<String> = raw
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["event"].as_str().unwrap().to_string())
        .collect();

    assert!(kinds.contains(&"ERROR_DETECTED".to_string()));
    assert!(kinds.contains(&"API_STATUS".to_string()));
    assert_eq!(kinds.last().map(String::as_str), Some("CYCLE_HEARTBEAT"));
}

#[tokio::test]
async fn poller_runs_first_cycle_immediately_and_stops_on_cancel() {
    let feed = Arc::new(FakeFeed::default());
    feed.set_games(&[(1, "Live")]);
    feed.set_plays(1, vec![error_play("P1", "error")]);

    let handle = spawn_poller(live_only(feed.clone()), Duration::from_secs(3600));
    let mut rx = handle.subscribe();

    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("first cycle should not wait for the period")
        .unwrap();
    assert_eq!(rx.borrow().window("live").unwrap().events.len(), 1);

    handle.shutdown().await;
    let calls = feed.schedule_calls.load(Ordering::SeqCst);
    assert_eq!(calls, 1);
}

#[tokio::test]
async fn cycle_cancelled_mid_flight_publishes_nothing() {
    let feed = Arc::new(FakeFeed::default());
    feed.set_games(&[(1, "Live")]);
    feed.set_plays(1, vec![error_play("P1", "error")]);
    feed.hold_feed.store(true, Ordering::SeqCst);

    let handle = spawn_poller(live_only(feed.clone()), Duration::from_secs(3600));
    let mut rx = handle.subscribe();

    tokio::time::timeout(Duration::from_secs(5), feed.feed_entered.notified())
        .await
        .expect("first cycle should reach the live feed");

    handle.shutdown().await;
    // Letting the parked fetch finish now must not matter
    feed.release.notify_waiters();

    assert!(rx.changed().await.is_err(), "no snapshot after teardown");
    let snap = rx.borrow().clone();
    assert!(snap.last_updated.is_none());
    assert!(snap.window("live").unwrap().events.is_empty());
    assert_eq!(feed.schedule_calls.load(Ordering::SeqCst), 1);
    assert_eq!(feed.feed_calls.load(Ordering::SeqCst), 1);
}
