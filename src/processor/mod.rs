//! Decision engine: orchestrates ledger, duplicate check, and materializer
//!
//! For each URL the engine decides exactly one of: download it, skip it as a
//! duplicate, or skip it as already attempted — and drives the ledger
//! transitions accordingly. The claim insert is the only concurrency
//! primitive; everything after a won claim runs strictly sequentially.

use crate::config::Config;
use crate::db::{Database, LedgerEntry};
use crate::duplicates::DuplicateChecker;
use crate::fetch::TorrentFetcher;
use crate::report::{Notifier, RunReport};
use crate::store::{Materializer, StoreOutcome};
use crate::{Error, Result, torrent};

/// Outcome of processing one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The torrent file was fetched and written to the target directory
    Downloaded {
        /// Content identifier extracted from the torrent metadata
        content_id: String,
    },
    /// The content already exists on disk (or lost the exclusive-write
    /// race); the URL was marked finished without a download
    Duplicate {
        /// Content identifier extracted from the torrent metadata
        content_id: String,
    },
    /// The URL reached a terminal state in a prior run; nothing was done
    AlreadyProcessed,
    /// The URL was claimed by a prior attempt that never finished
    ///
    /// Deliberately distinct from [`Outcome::AlreadyProcessed`]: an
    /// in-flight or failed attempt is recoverable and must not be
    /// reported as terminal. Complete it with [`RssDownloader::retry`]
    /// or abandon it with [`RssDownloader::skip`].
    Pending,
    /// Fetching or decoding the torrent failed; the ledger entry stays
    /// claimed-but-unfinished so the URL can be retried
    FetchFailed {
        /// Human-readable failure description for the run report
        reason: String,
    },
}

/// Tracks processed torrent URLs and materializes new torrent files
///
/// All state lives in the configuration value passed to [`new`] and in the
/// shared ledger database; independent processes pointed at the same ledger
/// and filesystem coexist safely.
///
/// [`new`]: RssDownloader::new
pub struct RssDownloader {
    pub(crate) db: Database,
    duplicates: DuplicateChecker,
    materializer: Materializer,
}

impl RssDownloader {
    /// Create a downloader from a resolved configuration
    ///
    /// Opens (and if needed creates) the ledger database, creates the target
    /// directory, and emits the dedup-disabled warning when no search
    /// directories are configured. Fails fast when `download.target_dir` is
    /// unset — without it no artifact could ever be materialized.
    pub async fn new(config: Config) -> Result<Self> {
        let target_dir = config.download.target_dir.clone().ok_or_else(|| Error::Config {
            message: "target_dir must be configured before processing".to_string(),
            key: Some("download.target_dir".to_string()),
        })?;

        let materializer = Materializer::new(target_dir).await?;
        let duplicates = DuplicateChecker::new(config.dedup.search_dirs.clone());
        let db = Database::new(&config.persistence.ledger_path).await?;

        Ok(Self {
            db,
            duplicates,
            materializer,
        })
    }

    /// Access the underlying ledger
    ///
    /// Useful for inspecting claimed-but-unfinished entries left behind by
    /// interrupted runs.
    pub fn ledger(&self) -> &Database {
        &self.db
    }

    /// Process one torrent URL end to end
    ///
    /// 1. Atomically claim the URL; a lost claim short-circuits to
    ///    [`Outcome::AlreadyProcessed`] (terminal row) or
    ///    [`Outcome::Pending`] (unfinished row) without fetching anything.
    /// 2. Fetch the payload through `fetcher`; failures leave the row
    ///    claimed-but-unfinished and yield [`Outcome::FetchFailed`].
    /// 3. Decode the content identifier from the torrent metadata.
    /// 4. Check the search directories; a hit finishes the row as a
    ///    duplicate.
    /// 5. Materialize exclusively; losing the write race is also a
    ///    duplicate, a won write records the resolved download.
    ///
    /// Only ledger failures propagate as errors; everything else is an
    /// [`Outcome`].
    pub async fn process(&self, url: &str, fetcher: &dyn TorrentFetcher) -> Result<Outcome> {
        if !self.db.claim(url).await? {
            // Lost the claim: distinguish terminal rows from attempts that
            // were interrupted between claim and resolution.
            let finished = self
                .db
                .get_entry(url)
                .await?
                .map(|entry| entry.is_finished())
                .unwrap_or(true);

            if finished {
                tracing::debug!(url = %url, "URL already processed");
                return Ok(Outcome::AlreadyProcessed);
            }

            tracing::debug!(url = %url, "URL claimed by an unfinished prior attempt");
            return Ok(Outcome::Pending);
        }

        self.resolve(url, fetcher).await
    }

    /// Re-run the fetch/resolve pipeline for a claimed-but-unfinished URL
    ///
    /// Completes entries left behind by fetch failures or interrupted runs.
    /// Already-finished URLs return [`Outcome::AlreadyProcessed`]; URLs that
    /// were never claimed are a caller error.
    pub async fn retry(&self, url: &str, fetcher: &dyn TorrentFetcher) -> Result<Outcome> {
        let entry = self.db.get_entry(url).await?.ok_or_else(|| {
            Error::Database(crate::error::DatabaseError::NotFound(format!(
                "No ledger entry for URL: {}",
                url
            )))
        })?;

        if entry.is_finished() {
            return Ok(Outcome::AlreadyProcessed);
        }

        self.resolve(url, fetcher).await
    }

    /// Mark a URL as processed without ever fetching it
    ///
    /// Inserts a finished row directly when the URL was never claimed.
    pub async fn skip(&self, url: &str) -> Result<()> {
        tracing::debug!(url = %url, "Force-skipping URL");
        self.db.mark_finished(url).await
    }

    /// List claimed-but-unfinished ledger entries, oldest first
    pub async fn unfinished(&self) -> Result<Vec<LedgerEntry>> {
        self.db.unfinished().await
    }

    /// Close the ledger and deliver the run report
    ///
    /// An empty report skips notification entirely. Delivery failures are
    /// logged and never affect committed ledger state.
    pub async fn finish(self, report: &RunReport, notifier: Option<&dyn Notifier>) -> Result<()> {
        self.db.close().await;

        if let Some(body) = report.render()
            && let Some(notifier) = notifier
            && let Err(e) = notifier.notify(&body).await
        {
            tracing::warn!(error = %e, "Run report could not be delivered");
        }

        Ok(())
    }

    /// Steps 2–5: fetch, decode, dedup-check, materialize, record
    async fn resolve(&self, url: &str, fetcher: &dyn TorrentFetcher) -> Result<Outcome> {
        let payload = match fetcher.fetch(url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Fetch failed");
                return Ok(Outcome::FetchFailed {
                    reason: e.to_string(),
                });
            }
        };

        let content_id = match torrent::extract_name(&payload) {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Torrent decode failed");
                return Ok(Outcome::FetchFailed {
                    reason: e.to_string(),
                });
            }
        };

        if self.duplicates.is_duplicate(&content_id) {
            self.db.mark_finished(url).await?;
            tracing::debug!(url = %url, content_id = %content_id, "Skipped as on-disk duplicate");
            return Ok(Outcome::Duplicate { content_id });
        }

        match self.materializer.store_exclusive(&content_id, &payload).await? {
            StoreOutcome::AlreadyExists(path) => {
                self.db.mark_finished(url).await?;
                tracing::debug!(
                    url = %url,
                    path = %path.display(),
                    "Torrent file already materialized"
                );
                Ok(Outcome::Duplicate { content_id })
            }
            StoreOutcome::Written(path) => {
                if self.db.mark_resolved(url, &content_id).await? {
                    tracing::info!(
                        url = %url,
                        content_id = %content_id,
                        path = %path.display(),
                        "Torrent file downloaded"
                    );
                    Ok(Outcome::Downloaded { content_id })
                } else {
                    // The content name was registered under a different URL
                    // between our dedup check and the ledger update.
                    self.db.mark_finished(url).await?;
                    tracing::debug!(
                        url = %url,
                        content_id = %content_id,
                        "Content already registered under another URL"
                    );
                    Ok(Outcome::Duplicate { content_id })
                }
            }
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
