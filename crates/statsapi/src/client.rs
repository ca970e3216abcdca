//! HTTP klient pro statsapi.mlb.com.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::types::{LiveFeedResponse, ScheduleResponse};

pub const DEFAULT_BASE_URL: &str = "https://statsapi.mlb.com";
pub const MLB_SPORT_ID: u32 = 1;

/// Raw upstream access. Errors here are transport or shape failures; the
/// fetchers decide how to degrade.
#[async_trait]
pub trait StatsFeed: Send + Sync {
    async fn schedule(&self, date: NaiveDate) -> Result<ScheduleResponse>;
    async fn live_feed(&self, game_id: u64) -> Result<LiveFeedResponse>;
}

#[async_trait]
impl<T: StatsFeed + ?Sized> StatsFeed for Arc<T> {
    async fn schedule(&self, date: NaiveDate) -> Result<ScheduleResponse> {
        (**self).schedule(date).await
    }

    async fn live_feed(&self, game_id: u64) -> Result<LiveFeedResponse> {
        (**self).live_feed(game_id).await
    }
}

pub struct StatsApiClient {
    client:   reqwest::Client,
    base_url: String,
    sport_id: u32,
}

impl StatsApiClient {
    pub fn new(base_url: impl Into<String>, sport_id: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("mlb-error-tracker/0.1")
            .build()
            .context("Failed to build statsapi HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sport_id,
        })
    }

    pub fn schedule_url(&self, date: NaiveDate) -> String {
        format!(
            "{}/api/v1/schedule?sportId={}&date={}",
            self.base_url,
            self.sport_id,
            date.format("%Y-%m-%d")
        )
    }

    pub fn live_feed_url(&self, game_id: u64) -> String {
        format!("{}/api/v1.1/game/{}/feed/live", self.base_url, game_id)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {url}");
        let resp = self.client.get(url)
            .header("Accept", "application/json")
            .send().await
            .with_context(|| format!("statsapi request failed: {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("statsapi HTTP {status} for {url}");
        }

        let raw = resp.text().await.context("statsapi body read failed")?;
        serde_json::from_str(&raw).context("statsapi JSON parse failed")
    }
}

#[async_trait]
impl StatsFeed for StatsApiClient {
    async fn schedule(&self, date: NaiveDate) -> Result<ScheduleResponse> {
        self.get_json(&self.schedule_url(date)).await
    }

    async fn live_feed(&self, game_id: u64) -> Result<LiveFeedResponse> {
        self.get_json(&self.live_feed_url(game_id)).await
    }
}
