//! Pipeline entry points for crawler operations.
//!
//! - `run_cycle`: one crawl followed by fan-out of the new announcements
//! - `run_scheduler`: `run_cycle` on a fixed interval, forever

pub mod crawl;
pub mod schedule;

pub use crawl::{CycleStats, run_cycle};
pub use schedule::run_scheduler;
