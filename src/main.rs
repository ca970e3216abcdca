/// MLB Error Tracker — live error-play observer
///
/// Co dělá:
///   1. Každých 30s polluje MLB Stats API (schedule + live feed každého zápasu)
///   2. Hledá playe s "error" v popisu nebo typu eventu
///   3. Každý error ukáže jen jednou za běh (dedup per okno: live / yesterday)
///   4. Loguje do ./logs/*.jsonl, volitelně NTFY push
///
/// Spuštění:
///   cargo run --bin error-tracker

use anyhow::{Context, Result};
use dotenv::dotenv;
use error_tracker::{spawn_poller, ErrorTracker, SessionSnapshot, TrackerConfig};
use statsapi::StatsApiClient;
use std::collections::HashMap;
use std::env;
use std::fs::File;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    info!("=== MLB Error Tracker ===");

    // Single instance lock
    let lock_file_path = env::temp_dir().join("mlb_error_tracker.lock");
    let lock_file = match File::create(&lock_file_path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to create lock file at {:?}: {}", lock_file_path, e);
            return Ok(());
        }
    };

    let mut lock = fd_lock::RwLock::new(lock_file);
    let _write_guard = match lock.try_write() {
        Ok(guard) => {
            info!("Acquired single-instance lock.");
            guard
        }
        Err(_) => {
            warn!("Another instance of error-tracker is already running! Exiting.");
            return Ok(());
        }
    };

    let cfg = TrackerConfig::from_env().context("invalid configuration")?;
    info!("Poll interval: {}s", cfg.poll_interval_secs);
    for w in &cfg.windows {
        info!("Window '{}': day offset {}, filter {:?}", w.name, w.day_offset, w.filter);
    }
    match &cfg.log_dir {
        Some(dir) => info!("Logs: {}", dir.display()),
        None => info!("Logs: disabled"),
    }

    let client = StatsApiClient::new(cfg.base_url.clone(), cfg.sport_id)?;
    let tracker = ErrorTracker::from_config(client, &cfg);
    let poller = spawn_poller(tracker, Duration::from_secs(cfg.poll_interval_secs));
    let mut snapshots = poller.subscribe();

    // Hlava seznamu z posledního výpisu, per okno
    let mut last_head: HashMap<String, String> = HashMap::new();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C — stopping poller");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    warn!("poller exited unexpectedly");
                    break;
                }
                let snap = snapshots.borrow_and_update().clone();
                render(&snap, &mut last_head);
            }
        }
    }

    poller.shutdown().await;
    Ok(())
}

fn render(snap: &SessionSnapshot, last_head: &mut HashMap<String, String>) {
    for window in &snap.windows {
        let prev = last_head.get(&window.name);
        let fresh: Vec<_> = window
            .events
            .iter()
            .take_while(|ev| Some(&ev.event_id) != prev)
            .collect();

        for ev in fresh.iter().rev() {
            println!(
                "[{}] {} | {} | inning {} | batter: {}\n    {}",
                window.name, ev.game_label, ev.time_of_day, ev.inning, ev.batter_name, ev.description
            );
        }
        if let Some(head) = window.events.first() {
            last_head.insert(window.name.clone(), head.event_id.clone());
        }
    }

    match snap.last_updated {
        Some(ts) => {
            let total: usize = snap.windows.iter().map(|w| w.events.len()).sum();
            if total == 0 {
                println!("Last checked at {} — no errors yet today.", ts.format("%-I:%M:%S %p"));
            } else {
                println!("Last checked at {} — {} errors tracked.", ts.format("%-I:%M:%S %p"), total);
            }
        }
        None => println!("Waiting for first check..."),
    }
}
