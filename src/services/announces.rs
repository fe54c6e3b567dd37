// src/services/announces.rs

//! Announcement crawler service.
//!
//! One call to [`AnnounceCrawler::fetch_new`] is one crawl cycle: read the
//! search results, keep the links the ledger has not seen, then scrape each
//! of them in order. The first failure aborts the whole cycle.

use std::sync::Arc;

use regex::Regex;
use scraper::Html;

use crate::error::Result;
use crate::models::{Announcement, Lot, SourceConfig};
use crate::services::extract::{apply_header_fields, extract_announce_links, extract_lots};
use crate::storage::LedgerStore;
use crate::utils::http::PageSource;

/// Service for discovering and scraping new announcements.
pub struct AnnounceCrawler {
    source: SourceConfig,
    link_pattern: Regex,
    pages: Arc<dyn PageSource>,
    ledger: Arc<dyn LedgerStore>,
}

impl AnnounceCrawler {
    /// Create a crawler over the given page source and ledger.
    pub fn new(
        source: SourceConfig,
        pages: Arc<dyn PageSource>,
        ledger: Arc<dyn LedgerStore>,
    ) -> Result<Self> {
        let link_pattern = Regex::new(&source.detail_pattern)?;
        Ok(Self {
            source,
            link_pattern,
            pages,
            ledger,
        })
    }

    /// Run one crawl cycle and return announcements not seen before, in search order.
    ///
    /// Links are marked seen before their pages are scraped. If a later fetch
    /// fails the error is returned and those marks stay in place.
    pub async fn fetch_new(&self) -> Result<Vec<Announcement>> {
        let links = self.fetch_links().await?;
        let fresh = self.extract_new(links).await?;
        log::debug!("{} new announcement link(s)", fresh.len());

        let mut announces = Vec::with_capacity(fresh.len());
        for link in fresh {
            let mut announce = self.fetch_announce(&link).await?;
            announce.lots = self.fetch_lots(&link).await?;
            log::info!(
                "Scraped {} ({} lot(s))",
                announce.url,
                announce.lots.len()
            );
            announces.push(announce);
        }
        Ok(announces)
    }

    /// Announcement links on the search-results page, in page order.
    async fn fetch_links(&self) -> Result<Vec<String>> {
        let url = self.source.search_url()?;
        let html = self.pages.fetch(&url).await?;
        let document = Html::parse_document(&html);
        let links = extract_announce_links(&document, &self.link_pattern);
        log::debug!("Search page {} lists {} link(s)", url, links.len());
        Ok(links)
    }

    /// Keep links the ledger has not seen, storing each as it is kept.
    ///
    /// A link repeated on the same page is stored on its first occurrence
    /// and therefore skipped on the next.
    async fn extract_new(&self, links: Vec<String>) -> Result<Vec<String>> {
        let mut fresh = Vec::new();
        for link in links {
            if !self.ledger.exists(&link).await? {
                self.ledger.store(&link).await?;
                fresh.push(link);
            }
        }
        Ok(fresh)
    }

    /// Fetch an announcement page and fill its header fields.
    async fn fetch_announce(&self, link: &str) -> Result<Announcement> {
        let url = self.source.detail_url(link);
        let html = self.pages.fetch(&url).await?;
        let document = Html::parse_document(&html);

        let mut announce = Announcement::new(url);
        apply_header_fields(&document, &mut announce);
        Ok(announce)
    }

    /// Fetch the lots tab of an announcement.
    async fn fetch_lots(&self, link: &str) -> Result<Vec<Lot>> {
        let html = self.pages.fetch(&self.source.lots_url(link)).await?;
        let document = Html::parse_document(&html);
        Ok(extract_lots(&document))
    }
}
