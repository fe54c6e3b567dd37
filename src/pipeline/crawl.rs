// src/pipeline/crawl.rs

//! One crawl cycle: scrape new announcements, then hand each to the fan-out.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::Announcement;
use crate::notify::FanOut;
use crate::services::AnnounceCrawler;

/// Summary of a crawl cycle.
#[derive(Debug, Clone)]
pub struct CycleStats {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub announcement_count: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Run one cycle.
///
/// Announcements are broadcast one at a time in discovery order. Delivery
/// failures only show up in the stats and logs; crawl errors are returned.
pub async fn run_cycle(
    crawler: &AnnounceCrawler,
    fan_out: Option<&FanOut>,
) -> Result<(Vec<Announcement>, CycleStats)> {
    let start_time = Utc::now();
    let announces = crawler.fetch_new().await?;

    let mut stats = CycleStats {
        start_time,
        end_time: start_time,
        announcement_count: announces.len(),
        delivered: 0,
        failed: 0,
    };

    for announce in &announces {
        log::info!("New announcement: {}", announce.url);
        match fan_out {
            Some(fan_out) => {
                let report = fan_out.broadcast(&announce.to_string()).await;
                stats.delivered += report.delivered;
                stats.failed += report.failed;
            }
            None => log::debug!("No chat transport, {} not forwarded", announce.url),
        }
    }

    stats.end_time = Utc::now();
    if stats.announcement_count > 0 {
        log::info!(
            "Cycle done: {} new, {} sent, {} failed in {}ms",
            stats.announcement_count,
            stats.delivered,
            stats.failed,
            (stats.end_time - stats.start_time).num_milliseconds()
        );
    } else {
        log::debug!("Cycle done: nothing new");
    }

    Ok((announces, stats))
}
