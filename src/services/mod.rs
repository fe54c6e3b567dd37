//! Service layer for the crawler application.
//!
//! This module contains the business logic for:
//! - Announcement discovery and scraping (`AnnounceCrawler`)
//! - Header and lot field extraction (`extract`)

mod announces;
pub mod extract;

pub use announces::AnnounceCrawler;
