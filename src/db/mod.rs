//! Ledger persistence layer for rss-dl
//!
//! A single SQLite table (`dls`) records every torrent URL ever seen and its
//! resolution state. The two uniqueness constraints carry the whole design:
//! `url` is the primary key (claiming a URL is an INSERT that either wins or
//! loses), and `path` is UNIQUE (two URLs can never register the same
//! resolved content).
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`ledger`] — Claim / mark-finished / mark-resolved state transitions

use sqlx::{FromRow, sqlite::SqlitePool};

mod ledger;
mod migrations;

/// Ledger record from database
///
/// Rows are append-only with respect to `url` and `timestamp`. Only `path`,
/// `downloaded`, and `finished` are mutated after insertion, and only
/// monotonically: the booleans go false to true, and `path` is rewritten
/// once from its placeholder (the URL itself) to the resolved content name.
#[derive(Debug, Clone, FromRow)]
pub struct LedgerEntry {
    /// Torrent URL, primary key; immutable once created
    pub url: String,
    /// Unix timestamp of insertion, set once by the database
    pub timestamp: i64,
    /// Resolved content name, or the URL itself while still unresolved
    pub path: String,
    /// 1 when the torrent file's bytes were actually written to disk
    pub downloaded: i64,
    /// 1 when no further action on this URL will ever be taken
    pub finished: i64,
}

impl LedgerEntry {
    /// Whether the torrent file was written to disk
    pub fn is_downloaded(&self) -> bool {
        self.downloaded != 0
    }

    /// Whether this URL is in a terminal state
    pub fn is_finished(&self) -> bool {
        self.finished != 0
    }
}

/// Ledger database handle for rss-dl
pub struct Database {
    pool: SqlitePool,
}
