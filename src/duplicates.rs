//! On-disk duplicate detection
//!
//! Checks whether the content a torrent describes already exists under any
//! of the configured search directories (typically the incomplete and
//! complete download roots of the torrent client).

use std::path::PathBuf;

/// Checks content identifiers against a configured set of local directories
///
/// The existence check is inherently racy with respect to concurrent
/// filesystem mutation (time-of-check to time-of-use): content can appear or
/// vanish between the check and the materializer's exclusive write. That
/// race is an accepted, documented trade-off — the exclusive-create write in
/// the materializer and the ledger's path uniqueness backstop it.
pub struct DuplicateChecker {
    search_dirs: Vec<PathBuf>,
}

impl DuplicateChecker {
    /// Create a checker over an ordered list of search directories
    ///
    /// An empty list disables duplicate checking entirely: every query
    /// returns `false`. That configuration is allowed but warned about
    /// exactly once here, so an operator who forgot to configure
    /// `search_dirs` finds out at startup rather than from a disk full of
    /// re-downloaded content.
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        if search_dirs.is_empty() {
            tracing::warn!(
                "No duplicate-check directories configured; duplicate checking is disabled for this run"
            );
        }

        Self { search_dirs }
    }

    /// Whether duplicate checking is active
    pub fn is_enabled(&self) -> bool {
        !self.search_dirs.is_empty()
    }

    /// Check whether `content_id` already exists under any search directory
    ///
    /// Directories are checked in configuration order; the first hit wins.
    /// With no directories configured this always returns `false`.
    pub fn is_duplicate(&self, content_id: &str) -> bool {
        for dir in &self.search_dirs {
            let candidate = dir.join(content_id);
            if candidate.exists() {
                tracing::debug!(
                    content_id = %content_id,
                    dir = %dir.display(),
                    "Content already present on disk"
                );
                return true;
            }
        }

        false
    }
}
