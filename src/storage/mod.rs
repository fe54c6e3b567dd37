//! Dedup ledger of announcement links already processed.
//!
//! A link, once stored, is never emitted again. Entries do not expire.
//!
//! - [`MemoryLedger`]: process lifetime only
//! - [`LocalLedger`]: same contract, mirrored to a JSON file
//!
//! ## File Layout
//!
//! ```text
//! seen.json
//! {
//!   "updated_at": "2026-10-16T09:00:00Z",
//!   "count": 2,
//!   "links": ["/ru/announce/index/1", "/ru/announce/index/2"]
//! }
//! ```

pub mod local;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::LedgerConfig;

// Re-export for convenience
pub use local::LocalLedger;
pub use memory::MemoryLedger;

/// Trait for dedup ledger backends.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Whether the key has been stored before.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Mark the key as seen.
    async fn store(&self, key: &str) -> Result<()>;
}

/// Build the ledger selected by configuration.
pub async fn open_ledger(config: &LedgerConfig) -> Result<Arc<dyn LedgerStore>> {
    match &config.path {
        Some(path) => {
            let ledger = LocalLedger::open(path).await?;
            log::info!(
                "Ledger: {} known links loaded from {}",
                ledger.len().await,
                path
            );
            let ledger: Arc<dyn LedgerStore> = Arc::new(ledger);
            Ok(ledger)
        }
        None => {
            log::info!("Ledger: in-memory, starts empty");
            let ledger: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());
            Ok(ledger)
        }
    }
}
