//! # rss-dl
//!
//! Idempotent download tracker for torrent files referenced by RSS feeds.
//!
//! rss-dl deliberately does not poll or parse feeds — that part is far more
//! flexible when the embedding application owns it. What it does own is the
//! hard part of running against the same feeds over and over: a persistent
//! ledger of every URL ever seen, a content-derived duplicate check against
//! the local filesystem, and exclusive-create materialization, composed so
//! that crashes, re-runs, and concurrent workers never corrupt the ledger or
//! download the same torrent twice.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Claim once** - A single atomic ledger insert is the only mutual
//!   exclusion; safe across independent processes sharing one ledger
//! - **Outcomes, not exceptions** - "already claimed" and "lost the write
//!   race" are values, not errors; only a broken ledger aborts a run
//!
//! ## Quick Start
//!
//! ```no_run
//! use rss_dl::{Config, HttpFetcher, Outcome, RssDownloader, RunReport};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.download.target_dir = Some("/watch/torrents".into());
//!     config.dedup.search_dirs = vec!["/data/incomplete".into(), "/data/complete".into()];
//!
//!     let downloader = RssDownloader::new(config).await?;
//!     let fetcher = HttpFetcher::new(Duration::from_secs(30))?;
//!     let mut report = RunReport::new();
//!
//!     // URLs come from the embedding application's feed poller
//!     for url in ["http://tracker/a.torrent", "http://tracker/b.torrent"] {
//!         let outcome = downloader.process(url, &fetcher).await?;
//!         report.record(url, &outcome);
//!     }
//!
//!     downloader.finish(&report, None).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Ledger persistence layer
pub mod db;
/// On-disk duplicate detection
pub mod duplicates;
/// Error types
pub mod error;
/// Fetch collaborator (URL to raw torrent bytes)
pub mod fetch;
/// Decision engine
pub mod processor;
/// Run reporting and notification delivery
pub mod report;
/// Exclusive artifact materialization
pub mod store;
/// Torrent metadata decoding
pub mod torrent;

// Re-export commonly used types
pub use config::{Config, ConfigOverrides, WebhookConfig};
pub use db::{Database, LedgerEntry};
pub use duplicates::DuplicateChecker;
pub use error::{DatabaseError, Error, Result};
pub use fetch::{HttpFetcher, TorrentFetcher};
pub use processor::{Outcome, RssDownloader};
pub use report::{Notifier, RunReport, WebhookNotifier};
pub use store::{Materializer, StoreOutcome};
