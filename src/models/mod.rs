// src/models/mod.rs

//! Domain models for the crawler application.

mod announce;
mod config;

// Re-export all public types
pub use announce::{Announcement, GeneralInfo, Lot, OrganizerContact};
pub use config::{
    Config, CrawlerConfig, LedgerConfig, NotifyConfig, ScheduleConfig, SourceConfig,
};
