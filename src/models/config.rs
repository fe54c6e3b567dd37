//! Application configuration structures.

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client behavior
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Source site layout
    #[serde(default)]
    pub source: SourceConfig,

    /// Polling schedule
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Dedup ledger backing
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Chat notification settings
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Write configuration as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.source.detail_pattern.trim().is_empty() {
            return Err(AppError::validation("source.detail_pattern is empty"));
        }
        if self.schedule.interval_secs == 0 {
            return Err(AppError::validation("schedule.interval_secs must be > 0"));
        }
        if self.notify.send_timeout_secs == 0 {
            return Err(AppError::validation("notify.send_timeout_secs must be > 0"));
        }
        if self.notify.token_env.trim().is_empty() {
            return Err(AppError::validation("notify.token_env is empty"));
        }
        Regex::new(&self.source.detail_pattern)?;
        self.source.search_url()?;
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Skip TLS certificate verification (the source site's chain does not validate)
    #[serde(default = "defaults::accept_invalid_certs")]
    pub accept_invalid_certs: bool,

    /// Extra attempts after a transport failure; status errors are never retried
    #[serde(default)]
    pub max_retries: u32,

    /// Delay between retry attempts in milliseconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            accept_invalid_certs: defaults::accept_invalid_certs(),
            max_retries: 0,
            retry_delay_ms: defaults::retry_delay(),
        }
    }
}

/// Where announcements live on the source site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Scheme and host, no trailing slash
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Path of the lot search page
    #[serde(default = "defaults::search_path")]
    pub search_path: String,

    /// Value of the `filter[name]` query parameter
    #[serde(default = "defaults::search_filter")]
    pub search_filter: String,

    /// Regex an `href` must match to count as an announcement link
    #[serde(default = "defaults::detail_pattern")]
    pub detail_pattern: String,

    /// Suffix appended to an announcement link to reach its lots tab
    #[serde(default = "defaults::lots_tab")]
    pub lots_tab: String,
}

impl SourceConfig {
    /// Full search-results URL with the name filter applied.
    pub fn search_url(&self) -> Result<String> {
        let mut url = Url::parse(&self.base_url)?.join(&self.search_path)?;
        url.query_pairs_mut()
            .append_pair("filter[name]", &self.search_filter);
        Ok(url.to_string())
    }

    /// Announcement page URL for a link path taken from the search results.
    pub fn detail_url(&self, link: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), link)
    }

    /// Lots tab URL for a link path taken from the search results.
    pub fn lots_url(&self, link: &str) -> String {
        format!("{}{}", self.detail_url(link), self.lots_tab)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            search_path: defaults::search_path(),
            search_filter: defaults::search_filter(),
            detail_pattern: defaults::detail_pattern(),
            lots_tab: defaults::lots_tab(),
        }
    }
}

/// Polling schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between crawl cycles
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
        }
    }
}

/// Dedup ledger backing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// JSON file to persist seen links in; in-memory only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Chat notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Environment variable holding the bot token
    #[serde(default = "defaults::token_env")]
    pub token_env: String,

    /// Bot API endpoint
    #[serde(default = "defaults::api_url")]
    pub api_url: String,

    /// Upper bound for a single message send
    #[serde(default = "defaults::send_timeout")]
    pub send_timeout_secs: u64,

    /// Long-poll timeout for incoming updates
    #[serde(default = "defaults::poll_timeout")]
    pub poll_timeout_secs: u64,

    /// Cap for the listener's reconnect backoff
    #[serde(default = "defaults::max_backoff")]
    pub max_backoff_secs: u64,

    /// Reply sent to a chat when it registers
    #[serde(default = "defaults::welcome_message")]
    pub welcome_message: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            token_env: defaults::token_env(),
            api_url: defaults::api_url(),
            send_timeout_secs: defaults::send_timeout(),
            poll_timeout_secs: defaults::poll_timeout(),
            max_backoff_secs: defaults::max_backoff(),
            welcome_message: defaults::welcome_message(),
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; zakup-crawler/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn accept_invalid_certs() -> bool {
        true
    }
    pub fn retry_delay() -> u64 {
        1000
    }

    // Source defaults
    pub fn base_url() -> String {
        "https://www.goszakup.gov.kz".into()
    }
    pub fn search_path() -> String {
        "/ru/search/lots".into()
    }
    pub fn search_filter() -> String {
        "ноутбук".into()
    }
    pub fn detail_pattern() -> String {
        "announce/index".into()
    }
    pub fn lots_tab() -> String {
        "?tab=lots".into()
    }

    // Schedule defaults
    pub fn interval() -> u64 {
        60
    }

    // Notify defaults
    pub fn token_env() -> String {
        "TELEGRAM_BOT_TOKEN".into()
    }
    pub fn api_url() -> String {
        "https://api.telegram.org".into()
    }
    pub fn send_timeout() -> u64 {
        10
    }
    pub fn poll_timeout() -> u64 {
        60
    }
    pub fn max_backoff() -> u64 {
        60
    }
    pub fn welcome_message() -> String {
        "I will notify you of new announces".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.schedule.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_pattern() {
        let mut config = Config::default();
        config.source.detail_pattern = "announce/(".to_string();
        assert!(matches!(config.validate(), Err(AppError::Pattern(_))));
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.source.base_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(AppError::Url(_))));
    }

    #[test]
    fn test_source_urls() {
        let source = SourceConfig::default();
        let search = source.search_url().unwrap();
        assert!(search.starts_with("https://www.goszakup.gov.kz/ru/search/lots?filter"));

        let parsed = Url::parse(&search).unwrap();
        let filter: Vec<_> = parsed.query_pairs().collect();
        assert_eq!(filter[0].0, "filter[name]");
        assert_eq!(filter[0].1, "ноутбук");

        assert_eq!(
            source.detail_url("/ru/announce/index/123"),
            "https://www.goszakup.gov.kz/ru/announce/index/123"
        );
        assert_eq!(
            source.lots_url("/ru/announce/index/123"),
            "https://www.goszakup.gov.kz/ru/announce/index/123?tab=lots"
        );
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let source = SourceConfig {
            base_url: "https://www.goszakup.gov.kz/".to_string(),
            ..SourceConfig::default()
        };
        assert_eq!(
            source.detail_url("/ru/announce/index/123"),
            "https://www.goszakup.gov.kz/ru/announce/index/123"
        );
        assert_eq!(
            source.lots_url("/ru/announce/index/123"),
            "https://www.goszakup.gov.kz/ru/announce/index/123?tab=lots"
        );
        assert!(
            source
                .search_url()
                .unwrap()
                .starts_with("https://www.goszakup.gov.kz/ru/search/lots?")
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [schedule]
            interval_secs = 300

            [ledger]
            path = "seen.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.schedule.interval_secs, 300);
        assert_eq!(config.ledger.path.as_deref(), Some("seen.json"));
        assert_eq!(config.source.lots_tab, "?tab=lots");
        assert!(config.crawler.accept_invalid_certs);
        assert_eq!(config.crawler.max_retries, 0);
    }
}
