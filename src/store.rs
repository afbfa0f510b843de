//! Artifact materialization: exclusive writes of torrent files to disk
//!
//! Two worker processes racing on the same artifact must not both "win".
//! The write uses exclusive create (`O_CREAT | O_EXCL` semantics), so the
//! filesystem itself arbitrates the race; losing it is an expected outcome,
//! not an error.

use crate::{Error, Result};
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Suffix appended to every materialized torrent file
const TORRENT_SUFFIX: &str = ".torrent";

/// Outcome of an exclusive store attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    /// The file was created and the payload written
    Written(PathBuf),
    /// The target already existed; another process or a prior run
    /// materialized this artifact first
    AlreadyExists(PathBuf),
}

/// Writes torrent payloads into the target directory with exclusive create
pub struct Materializer {
    target_dir: PathBuf,
    sanitize: Regex,
}

impl Materializer {
    /// Create a materializer writing into `target_dir`
    ///
    /// The directory is created if missing so the first run against a fresh
    /// configuration doesn't fail on the first artifact.
    pub async fn new(target_dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&target_dir).await?;

        let sanitize = Regex::new(r"[^\w.\-]").map_err(|e| Error::Config {
            message: format!("Failed to compile filename sanitizer: {}", e),
            key: None,
        })?;

        Ok(Self {
            target_dir,
            sanitize,
        })
    }

    /// The directory artifacts are written into
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Produce a filesystem-safe filename stem from a content identifier
    ///
    /// Every character outside `[\w.\-]` is replaced one-for-one with an
    /// underscore, so path separators and shell metacharacters in a torrent
    /// name can never escape the target directory.
    pub fn sanitize_stem(&self, content_id: &str) -> String {
        self.sanitize.replace_all(content_id, "_").into_owned()
    }

    /// The full target path a content identifier materializes to
    pub fn target_path(&self, content_id: &str) -> PathBuf {
        self.target_dir
            .join(format!("{}{}", self.sanitize_stem(content_id), TORRENT_SUFFIX))
    }

    /// Write `bytes` to the sanitized target path in exclusive-create mode
    ///
    /// Returns [`StoreOutcome::AlreadyExists`] instead of failing when the
    /// target is already present, whether from a prior run or a concurrent
    /// worker that won the race. Any other I/O failure propagates.
    pub async fn store_exclusive(&self, content_id: &str, bytes: &[u8]) -> Result<StoreOutcome> {
        let path = self.target_path(content_id);

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;

        let mut file = match file {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Ok(StoreOutcome::AlreadyExists(path));
            }
            Err(e) => return Err(Error::Io(e)),
        };

        file.write_all(bytes).await?;
        file.flush().await?;

        Ok(StoreOutcome::Written(path))
    }
}
