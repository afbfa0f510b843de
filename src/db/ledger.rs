//! Ledger state transitions: claim, mark-finished, mark-resolved.
//!
//! A uniqueness violation on [`Database::claim`] is not an error. It is the
//! expected signal "already processed or in-flight" and is converted into a
//! boolean result; only unexpected database failures propagate.

use crate::error::DatabaseError;
use crate::{Error, Result};

use super::{Database, LedgerEntry};

impl Database {
    /// Atomically claim a URL for processing
    ///
    /// Inserts a new ledger row with the URL itself as a placeholder path
    /// (the path column is UNIQUE, so the row needs a provisional unique
    /// value until resolution). Returns `true` if the insert won, `false`
    /// if the URL was already claimed by a prior or concurrent call.
    ///
    /// This is the single test-and-set primitive that makes processing
    /// idempotent across runs and safe when independent worker processes
    /// share the same ledger: SQLite enforces the primary key inside one
    /// transaction, so two concurrent claims can never both succeed.
    pub async fn claim(&self, url: &str) -> Result<bool> {
        let result = sqlx::query("INSERT INTO dls (url, path) VALUES (?, ?)")
            .bind(url)
            .bind(url)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Ok(false),
            Err(e) => Err(Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to claim URL: {}",
                e
            )))),
        }
    }

    /// Mark a URL as finished without recording a download
    ///
    /// Sets `finished=1` for an existing row. If no row exists for the URL,
    /// inserts one directly in the finished state, which covers callers
    /// that want to mark a URL as done without ever attempting a fetch.
    pub async fn mark_finished(&self, url: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO dls (url, path, finished) VALUES (?, ?, 1)
            ON CONFLICT(url) DO UPDATE SET finished = 1
            "#,
        )
        .bind(url)
        .bind(url)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            // The placeholder path can collide with a path registered under
            // a different URL; the row for this URL may still be updatable.
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                sqlx::query("UPDATE dls SET finished = 1 WHERE url = ?")
                    .bind(url)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| {
                        Error::Database(DatabaseError::QueryFailed(format!(
                            "Failed to mark URL finished: {}",
                            e
                        )))
                    })?;
                Ok(())
            }
            Err(e) => Err(Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to mark URL finished: {}",
                e
            )))),
        }
    }

    /// Record a successful download for a claimed URL
    ///
    /// Replaces the placeholder path with the resolved content name and sets
    /// `downloaded=1, finished=1`. Returns `false` when the resolved path is
    /// already registered under a different URL (the UNIQUE constraint on
    /// `path` fired); the caller should treat that as a duplicate, not a
    /// failure.
    pub async fn mark_resolved(&self, url: &str, path: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE dls SET path = ?, downloaded = 1, finished = 1
            WHERE url = ?
            "#,
        )
        .bind(path)
        .bind(url)
        .execute(&self.pool)
        .await;

        match result {
            Ok(r) if r.rows_affected() > 0 => Ok(true),
            Ok(_) => Err(Error::Database(DatabaseError::NotFound(format!(
                "No ledger entry for URL: {}",
                url
            )))),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Ok(false),
            Err(e) => Err(Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to mark URL resolved: {}",
                e
            )))),
        }
    }

    /// Fetch the ledger entry for a URL, if any
    pub async fn get_entry(&self, url: &str) -> Result<Option<LedgerEntry>> {
        let row = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT url, timestamp, path, downloaded, finished
            FROM dls
            WHERE url = ?
            LIMIT 1
            "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to fetch ledger entry: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// List claimed-but-unfinished entries, oldest first
    ///
    /// These are URLs whose processing was interrupted between claim and
    /// resolution (fetch failure, crash). They are never retried or expired
    /// automatically; this query exists so callers can inspect and retry
    /// them explicitly.
    pub async fn unfinished(&self) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT url, timestamp, path, downloaded, finished
            FROM dls
            WHERE finished = 0
            ORDER BY timestamp ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list unfinished entries: {}",
                e
            )))
        })?;

        Ok(rows)
    }
}
