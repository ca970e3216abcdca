//! Live feed — všechny dosud zapsané playe jednoho zápasu.

use anyhow::Result;
use logger::EventLogger;
use tracing::warn;

use crate::client::StatsFeed;
use crate::status::log_api_status;
use crate::types::Play;

pub async fn try_plays_for_game<F: StatsFeed + ?Sized>(feed: &F, game_id: u64) -> Result<Vec<Play>> {
    Ok(feed.live_feed(game_id).await?.into_plays())
}

/// Ordered play list for `game_id`. No retry here: a failed fetch is just
/// zero plays this cycle and gets picked up again next cycle.
pub async fn plays_for_game<F: StatsFeed + ?Sized>(
    feed: &F,
    game_id: u64,
    logger: Option<&EventLogger>,
) -> Vec<Play> {
    match try_plays_for_game(feed, game_id).await {
        Ok(plays) => {
            log_api_status(logger, "live_feed", game_id.to_string(), Ok(plays.len()));
            plays
        }
        Err(e) => {
            warn!(game = game_id, "live feed failed: {e:#}");
            log_api_status(logger, "live_feed", game_id.to_string(), Err(format!("{e:#}")));
            vec![]
        }
    }
}
