// src/pipeline/schedule.rs

//! Fixed-interval crawl loop.

use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::notify::FanOut;
use crate::pipeline::crawl::run_cycle;
use crate::services::AnnounceCrawler;

/// Run crawl cycles forever, one per `interval`.
///
/// A failed cycle is logged and the next tick starts from scratch; this never returns.
pub async fn run_scheduler(crawler: &AnnounceCrawler, fan_out: Option<&FanOut>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log::info!("Polling every {:?}", interval);
    loop {
        ticker.tick().await;
        if let Err(e) = run_cycle(crawler, fan_out).await {
            log::error!("Crawl cycle failed: {}", e);
        }
    }
}
