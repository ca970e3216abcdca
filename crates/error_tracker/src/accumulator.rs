//! Deduplicating Accumulator — okno = identity set + seznam eventů (nejnovější první).
//!
//! Set a seznam se mění vždy spolu: id je v seznamu právě když je v setu.
//! Z paměti vypadne jen id, které upstream už nehlásí (hra zmizela z okna).

use statsapi::ErrorEvent;
use std::collections::{HashMap, HashSet, VecDeque};

/// Default per-window retention. A day of MLB games produces a handful of
/// errors, so this only matters for sessions left running for weeks.
pub const DEFAULT_MAX_TRACKED: usize = 5000;

/// Cycles an id must be missing from the window's candidates before it may be
/// evicted. Covers a game whose feed fails for a few cycles in a row.
pub const EVICT_AFTER_MISSED_CYCLES: u64 = 20;

#[derive(Debug, Clone)]
pub struct TrackingWindow {
    /// event_id → last cycle the id was among the candidates
    seen:        HashMap<String, u64>,
    events:      VecDeque<ErrorEvent>,
    max_tracked: usize, // 0 = unbounded
    grace:       u64,
    cycle:       u64,
}

impl TrackingWindow {
    pub fn new(max_tracked: usize) -> Self {
        Self::with_retention(max_tracked, EVICT_AFTER_MISSED_CYCLES)
    }

    pub fn with_retention(max_tracked: usize, grace_cycles: u64) -> Self {
        Self {
            seen: HashMap::new(),
            events: VecDeque::new(),
            max_tracked,
            grace: grace_cycles.max(1),
            cycle: 0,
        }
    }

    /// One call per cycle with every candidate of the window. Admits the ones
    /// not seen before, in discovery order, ahead of everything already
    /// tracked, and returns them.
    pub fn admit(&mut self, batch: Vec<ErrorEvent>) -> Vec<ErrorEvent> {
        self.cycle += 1;
        let cycle = self.cycle;

        let mut fresh = Vec::new();
        for ev in batch {
            if self.seen.insert(ev.event_id.clone(), cycle).is_none() {
                fresh.push(ev);
            }
        }

        // Prepend as one block, keeping the batch's own order
        for ev in fresh.iter().rev() {
            self.events.push_front(ev.clone());
        }
        self.evict_stale();
        fresh
    }

    /// Over capacity: drop the oldest events upstream stopped reporting. Ids
    /// still reported stay even if that keeps the window above the cap.
    fn evict_stale(&mut self) {
        if self.max_tracked == 0 || self.events.len() <= self.max_tracked {
            return;
        }
        let mut excess = self.events.len() - self.max_tracked;
        let mut stale: HashSet<String> = HashSet::new();

        for ev in self.events.iter().rev() {
            if excess == 0 {
                break;
            }
            let last_seen = self.seen.get(&ev.event_id).copied().unwrap_or(0);
            if self.cycle - last_seen >= self.grace {
                stale.insert(ev.event_id.clone());
                excess -= 1;
            }
        }

        if stale.is_empty() {
            return;
        }
        self.events.retain(|ev| !stale.contains(&ev.event_id));
        for id in &stale {
            self.seen.remove(id);
        }
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.seen.contains_key(event_id)
    }

    /// Newest first.
    pub fn events(&self) -> impl Iterator<Item = &ErrorEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for TrackingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TRACKED)
    }
}

/// Tracking windows keyed by name. Windows never share identities.
#[derive(Debug, Clone)]
pub struct Accumulator {
    windows:     HashMap<String, TrackingWindow>,
    max_tracked: usize,
}

impl Accumulator {
    pub fn new(max_tracked: usize) -> Self {
        Self {
            windows: HashMap::new(),
            max_tracked,
        }
    }

    pub fn ensure_window(&mut self, name: &str) -> &mut TrackingWindow {
        let max = self.max_tracked;
        self.windows
            .entry(name.to_string())
            .or_insert_with(|| TrackingWindow::new(max))
    }

    pub fn admit(&mut self, window: &str, batch: Vec<ErrorEvent>) -> Vec<ErrorEvent> {
        self.ensure_window(window).admit(batch)
    }

    pub fn window(&self, name: &str) -> Option<&TrackingWindow> {
        self.windows.get(name)
    }

    pub fn total_tracked(&self) -> usize {
        self.windows.values().map(TrackingWindow::len).sum()
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TRACKED)
    }
}
