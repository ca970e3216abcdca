/// MLB Error Tracker — polling and de-duplication engine
///
/// Každý cyklus:
///   1. schedule pro každé okno (live = dnes bez Final, yesterday = včera vše)
///   2. live feed pro každý zápas, klasifikace error playů
///   3. dedup per okno, nové eventy na začátek seznamu
///   4. publikace snapshotu + last_updated

pub mod accumulator;
pub mod config;
pub mod poller;
pub mod tracker;

pub use accumulator::{Accumulator, TrackingWindow, DEFAULT_MAX_TRACKED};
pub use config::{parse_windows, TrackerConfig, WindowSpec};
pub use poller::{spawn_poller, PollerHandle};
pub use tracker::{CycleReport, ErrorTracker, SessionSnapshot, WindowReport, WindowSnapshot};
