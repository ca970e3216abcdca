/// MLB Error Tracker — Logger
/// JSONL event stream, NTFY alerts

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

pub struct EventLogger {
    log_dir: PathBuf,
}

impl EventLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        fs::create_dir_all(&dir).ok();
        Self { log_dir: dir }
    }

    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let date  = Utc::now().format("%Y-%m-%d").to_string();
        let path  = self.log_dir.join(format!("{date}.jsonl"));
        let line  = serde_json::to_string(event)?;
        let mut f = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ── Event typy ────────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct ErrorDetectedEvent {
    pub ts:          String,
    pub event:       &'static str,   // "ERROR_DETECTED"
    pub window:      String,
    pub event_id:    String,
    pub game:        String,         // "<away> @ <home>"
    pub inning:      u32,
    pub batter:      String,
    pub description: String,
}

#[derive(Serialize, Debug)]
pub struct ApiStatusEvent {
    pub ts:           String,
    pub event:        &'static str,  // "API_STATUS"
    pub source:       String,        // "schedule" | "live_feed"
    pub scope:        String,        // date or gamePk
    pub ok:           bool,
    pub message:      String,
    pub items_logged: usize,
}

#[derive(Serialize, Debug)]
pub struct CycleHeartbeatEvent {
    pub ts:                 String,
    pub event:              &'static str, // "CYCLE_HEARTBEAT"
    pub poll_interval_secs: u64,
    pub windows:            usize,
    pub games_polled:       usize,
    pub new_errors:         usize,
    pub tracked_errors:     usize,
}

/// Pošli čitelný push alert
pub async fn send_ntfy_alert(topic: &str, msg: &str, title: &str) {
    let client = reqwest::Client::new();
    match client
        .post(format!("https://ntfy.sh/{topic}"))
        .header("Title", title)
        .header("Priority", "default")
        .header("Tags", "baseball")
        .body(msg.to_string())
        .send()
        .await
    {
        Ok(_)  => tracing::info!("NTFY sent: {}", title),
        Err(e) => tracing::warn!("NTFY failed: {}", e),
    }
}
