//! Poller — pevná kadence pro [`ErrorTracker`].
//!
//! První cyklus hned po startu. Cykly se nepřekrývají: další tick se čeká až
//! po dokončení cyklu, zpožděné ticky se posouvají (ne dohánějí).

use statsapi::StatsFeed;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::tracker::{ErrorTracker, SessionSnapshot};

pub struct PollerHandle {
    shutdown:  Arc<Notify>,
    snapshots: watch::Receiver<SessionSnapshot>,
    task:      Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Stop the timer. A cycle in flight is dropped and never published.
    pub fn cancel(&self) {
        self.shutdown.notify_one();
    }

    /// Cancel and wait for the polling task to exit.
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.shutdown.notify_one();
        }
    }
}

pub fn spawn_poller<F>(mut tracker: ErrorTracker<F>, period: Duration) -> PollerHandle
where
    F: StatsFeed + 'static,
{
    let shutdown = Arc::new(Notify::new());
    let snapshots = tracker.subscribe();
    let stop = shutdown.clone();
    let period = period.max(Duration::from_millis(1));

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycle_no: u64 = 0;

        loop {
            tokio::select! {
                _ = stop.notified() => break,
                _ = ticker.tick() => {}
            }

            cycle_no += 1;
            tokio::select! {
                _ = stop.notified() => {
                    info!("poller cancelled during cycle #{cycle_no}, results discarded");
                    break;
                }
                report = tracker.run_cycle() => {
                    info!(
                        "Cycle #{} done: {} games, {} new errors",
                        cycle_no,
                        report.games_polled(),
                        report.new_errors()
                    );
                }
            }
        }
        info!("poller stopped after {cycle_no} cycles");
    });

    PollerHandle {
        shutdown,
        snapshots,
        task: Some(task),
    }
}
